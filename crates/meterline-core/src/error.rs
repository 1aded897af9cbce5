//! # Error Types
//!
//! Domain-specific error types for meterline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meterline-core errors (this file)                                     │
//! │  ├── CoreError        - Engine failures (search exhausted, range)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  meterline-cycle errors (separate crate)                               │
//! │  └── CycleError       - Config + wrapped CoreError                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CycleError → caller service       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, value, search state)
//! 3. Errors are enum variants, never String
//! 4. Nothing here is logged; every error is returned to the caller

use chrono::{DateTime, TimeZone};
use serde_json::{json, Value};
use thiserror::Error;

/// RFC 3339 rendering for any zone, keeping the local offset.
pub(crate) fn stamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.fixed_offset().to_rfc3339()
}

// =============================================================================
// Core Error
// =============================================================================

/// Engine errors.
///
/// Everything except [`CoreError::Validation`] signals an internal problem:
/// period boundaries that don't line up, or dates chrono cannot represent.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The bounded period walk ran out of iterations.
    ///
    /// ## When This Occurs
    /// - Event lies more than the iteration cap's worth of periods away
    /// - Period boundaries stopped advancing (corrupt anchor/unit data)
    ///
    /// ## Diagnosis
    /// ```text
    /// event:  2024-09-14T10:00:00Z
    /// last:   [2024-04-10, 2024-04-11)   period: DAILY x1
    ///      │
    ///      ▼
    /// 100 daily periods walked from the subscription start, event not reached
    /// ```
    #[error(
        "No billing period found for event {event} after {iterations} iterations \
         (last period {period_start}..{period_end}, anchor {anchor}, unit {unit}, period {period})"
    )]
    PeriodSearchExhausted {
        event: String,
        period_start: String,
        period_end: String,
        anchor: String,
        unit: i32,
        period: String,
        iterations: usize,
    },

    /// The period walked from the subscription start overlaps the supplied
    /// current period.
    ///
    /// The caller's `current_period_start`/`current_period_end` were not
    /// produced by the same anchor/unit/period triple as the walk.
    #[error(
        "Period boundaries are inconsistent: walked period ends at {walked_to}, \
         after current period start {current_period_start}"
    )]
    InconsistentPeriodBounds {
        walked_to: String,
        current_period_start: String,
    },

    /// A computed calendar date is outside chrono's representable range.
    #[error("Date out of range while computing {operation}")]
    DateOutOfRange { operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true if the caller supplied bad input (as opposed to an
    /// internal failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    /// Structured details for error reporting.
    ///
    /// ## Example
    /// ```rust
    /// use meterline_core::error::CoreError;
    ///
    /// let err = CoreError::DateOutOfRange { operation: "next_billing_date".into() };
    /// assert_eq!(err.details()["operation"], "next_billing_date");
    /// ```
    pub fn details(&self) -> Value {
        match self {
            CoreError::PeriodSearchExhausted {
                event,
                period_start,
                period_end,
                anchor,
                unit,
                period,
                iterations,
            } => json!({
                "event_timestamp": event,
                "period_start": period_start,
                "period_end": period_end,
                "billing_anchor": anchor,
                "unit": unit,
                "period": period,
                "iterations": iterations,
            }),
            CoreError::InconsistentPeriodBounds {
                walked_to,
                current_period_start,
            } => json!({
                "walked_to": walked_to,
                "current_period_start": current_period_start,
            }),
            CoreError::DateOutOfRange { operation } => json!({ "operation": operation }),
            CoreError::Validation(err) => err.details(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any period arithmetic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Value must be positive (e.g. a period unit of 0).
    #[error("{field} must be positive, got {value}")]
    MustBePositive { field: String, value: i64 },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. a malformed YYYYMMDD integer).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}, got '{value}'")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// A usage event is timestamped before its subscription started.
    #[error("Event at {event} precedes subscription start {subscription_start}")]
    EventBeforeSubscription {
        event: String,
        subscription_start: String,
    },

    /// A period's start is not strictly before its end.
    #[error("Period start {start} must be before period end {end}")]
    InvalidPeriodBounds { start: String, end: String },
}

impl ValidationError {
    /// Structured details for error reporting.
    pub fn details(&self) -> Value {
        match self {
            ValidationError::MustBePositive { field, value } => {
                json!({ "field": field, "provided_value": value })
            }
            ValidationError::OutOfRange { field, min, max } => {
                json!({ "field": field, "min": min, "max": max })
            }
            ValidationError::InvalidFormat { field, reason } => {
                json!({ "field": field, "reason": reason })
            }
            ValidationError::NotAllowed {
                field,
                value,
                allowed,
            } => json!({
                "field": field,
                "provided_value": value,
                "allowed_values": allowed,
            }),
            ValidationError::EventBeforeSubscription {
                event,
                subscription_start,
            } => json!({
                "event_timestamp": event,
                "subscription_start": subscription_start,
            }),
            ValidationError::InvalidPeriodBounds { start, end } => {
                json!({ "period_start": start, "period_end": end })
            }
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "unit".to_string(),
            value: 0,
        };
        assert_eq!(err.to_string(), "unit must be positive, got 0");

        let err = CoreError::DateOutOfRange {
            operation: "add_clamped_date".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Date out of range while computing add_clamped_date"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "unit".to_string(),
            value: -1,
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_validation());
    }

    #[test]
    fn test_search_exhausted_details() {
        let err = CoreError::PeriodSearchExhausted {
            event: "2024-09-14T10:00:00+00:00".to_string(),
            period_start: "2024-04-10T00:00:00+00:00".to_string(),
            period_end: "2024-04-11T00:00:00+00:00".to_string(),
            anchor: "2024-01-01T00:00:00+00:00".to_string(),
            unit: 1,
            period: "DAILY".to_string(),
            iterations: 100,
        };
        assert!(!err.is_validation());

        let details = err.details();
        assert_eq!(details["iterations"], 100);
        assert_eq!(details["period"], "DAILY");
        assert_eq!(details["period_end"], "2024-04-11T00:00:00+00:00");
    }

    #[test]
    fn test_not_allowed_details_list_values() {
        let err = ValidationError::NotAllowed {
            field: "billing_period".to_string(),
            value: "FORTNIGHTLY".to_string(),
            allowed: vec!["DAILY".to_string(), "WEEKLY".to_string()],
        };
        let details = CoreError::from(err).details();
        assert_eq!(details["provided_value"], "FORTNIGHTLY");
        assert_eq!(details["allowed_values"][1], "WEEKLY");
    }
}
