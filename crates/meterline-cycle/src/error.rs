//! # Cycle Error Types
//!
//! Error types for the billing cycle layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cycle Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Engine      │  │       Usage             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Core(..)       │  │  UnassignableEvent      │ │
//! │  │  UnknownTimezone│  │  (wraps         │  │                         │ │
//! │  │  ConfigLoad/Save│  │   CoreError)    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use meterline_core::CoreError;
use thiserror::Error;

/// Result type alias for cycle operations.
pub type CycleResult<T> = Result<T, CycleError>;

/// Errors raised by schedules, taggers and configuration.
#[derive(Debug, Error)]
pub enum CycleError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A config value failed validation.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Customer time zone is not a known IANA name.
    #[error("Unknown time zone: '{0}'")]
    UnknownTimezone(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Period arithmetic failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Usage Errors
    // =========================================================================
    /// A usage event could not be placed into any billing period.
    #[error("Usage event {event_id} could not be assigned to a period: {source}")]
    UnassignableEvent {
        event_id: String,
        #[source]
        source: CoreError,
    },
}

impl CycleError {
    /// Returns true if the underlying cause is bad caller input.
    pub fn is_validation(&self) -> bool {
        match self {
            CycleError::Core(err) | CycleError::UnassignableEvent { source: err, .. } => {
                err.is_validation()
            }
            CycleError::InvalidConfig(_) | CycleError::UnknownTimezone(_) => true,
            CycleError::ConfigLoadFailed(_) | CycleError::ConfigSaveFailed(_) => false,
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for CycleError {
    fn from(err: std::io::Error) -> Self {
        CycleError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CycleError {
    fn from(err: toml::de::Error) -> Self {
        CycleError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CycleError {
    fn from(err: toml::ser::Error) -> Self {
        CycleError::ConfigSaveFailed(err.to_string())
    }
}

impl From<meterline_core::ValidationError> for CycleError {
    fn from(err: meterline_core::ValidationError) -> Self {
        CycleError::Core(CoreError::Validation(err))
    }
}
