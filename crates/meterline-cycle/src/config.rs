//! # Engine Configuration
//!
//! Defaults the cycle layer applies when a subscription or batch does not
//! say otherwise.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     METERLINE_BILLING_CYCLE=calendar                                   │
//! │     METERLINE_CUSTOMER_TIMEZONE=America/New_York                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/meterline/engine.toml (Linux)                            │
//! │     ~/Library/Application Support/io.meterline.meterline/engine.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     anniversary billing, 1 period per unit, skip unassignable usage    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [billing]
//! default_cycle = "anniversary"   # anniversary | calendar
//! default_period_count = 1
//! max_catch_up_periods = 120
//!
//! [usage]
//! on_unassignable = "skip"        # skip | fail
//!
//! [proration]
//! strategy = "day_based"          # day_based | second_based
//! customer_timezone = "UTC"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use meterline_core::{BillingCycle, ProrationStrategy, DEFAULT_MAX_CATCH_UP_PERIODS};

use crate::error::{CycleError, CycleResult};

// =============================================================================
// Unassignable Usage Policy
// =============================================================================

/// What the usage tagger does with an event no period can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignablePolicy {
    /// Log a warning, report the event as skipped, keep going.
    #[default]
    Skip,

    /// Abort the batch with the first unassignable event.
    Fail,
}

impl std::fmt::Display for UnassignablePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnassignablePolicy::Skip => write!(f, "skip"),
            UnassignablePolicy::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for UnassignablePolicy {
    type Err = CycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" | "continue" => Ok(UnassignablePolicy::Skip),
            "fail" | "abort" => Ok(UnassignablePolicy::Fail),
            other => Err(CycleError::InvalidConfig(format!(
                "Unknown unassignable policy: '{}'. Valid options: skip, fail",
                other
            ))),
        }
    }
}

// =============================================================================
// Billing Settings
// =============================================================================

/// Defaults for new subscriptions and renewal runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Anniversary or calendar-aligned boundaries.
    #[serde(default)]
    pub default_cycle: BillingCycle,

    /// Periods per billing unit ("every N months").
    #[serde(default = "default_period_count")]
    pub default_period_count: i32,

    /// Upper bound on periods a single catch-up run may generate.
    #[serde(default = "default_max_catch_up_periods")]
    pub max_catch_up_periods: u32,
}

fn default_period_count() -> i32 {
    1
}

fn default_max_catch_up_periods() -> u32 {
    DEFAULT_MAX_CATCH_UP_PERIODS
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            default_cycle: BillingCycle::default(),
            default_period_count: default_period_count(),
            max_catch_up_periods: default_max_catch_up_periods(),
        }
    }
}

// =============================================================================
// Usage Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSettings {
    #[serde(default)]
    pub on_unassignable: UnassignablePolicy,
}

// =============================================================================
// Proration Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProrationSettings {
    #[serde(default)]
    pub strategy: ProrationStrategy,

    /// IANA zone used to count calendar days, e.g. "Europe/Berlin".
    #[serde(default = "default_customer_timezone")]
    pub customer_timezone: String,
}

fn default_customer_timezone() -> String {
    "UTC".to_string()
}

impl Default for ProrationSettings {
    fn default() -> Self {
        ProrationSettings {
            strategy: ProrationStrategy::default(),
            customer_timezone: default_customer_timezone(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub billing: BillingSettings,

    #[serde(default)]
    pub usage: UsageSettings,

    #[serde(default)]
    pub proration: ProrationSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CycleResult<Self> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::load`] with a custom environment lookup.
    pub fn load_with_env<F>(config_path: Option<PathBuf>, env: F) -> CycleResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(env);
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CycleResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CycleError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CycleError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| CycleError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CycleResult<()> {
        if self.billing.default_period_count <= 0 {
            return Err(CycleError::InvalidConfig(format!(
                "default_period_count must be greater than 0, got {}",
                self.billing.default_period_count
            )));
        }

        if self.billing.max_catch_up_periods == 0 {
            return Err(CycleError::InvalidConfig(
                "max_catch_up_periods must be greater than 0".into(),
            ));
        }

        self.customer_tz()?;

        Ok(())
    }

    /// The parsed customer time zone.
    pub fn customer_tz(&self) -> CycleResult<chrono_tz::Tz> {
        self.proration
            .customer_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| CycleError::UnknownTimezone(self.proration.customer_timezone.clone()))
    }

    fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cycle) = env("METERLINE_BILLING_CYCLE") {
            match cycle.parse() {
                Ok(parsed) => {
                    debug!(cycle = %cycle, "Overriding billing cycle from environment");
                    self.billing.default_cycle = parsed;
                }
                Err(_) => warn!(cycle = %cycle, "Unknown billing cycle in environment"),
            }
        }

        if let Some(count) = env("METERLINE_PERIOD_COUNT") {
            match count.parse::<i32>() {
                Ok(n) => {
                    debug!(count = n, "Overriding period count from environment");
                    self.billing.default_period_count = n;
                }
                Err(_) => warn!(count = %count, "Period count in environment is not a number"),
            }
        }

        if let Some(limit) = env("METERLINE_MAX_CATCH_UP_PERIODS") {
            match limit.parse::<u32>() {
                Ok(n) => {
                    debug!(limit = n, "Overriding catch-up limit from environment");
                    self.billing.max_catch_up_periods = n;
                }
                Err(_) => warn!(limit = %limit, "Catch-up limit in environment is not a number"),
            }
        }

        if let Some(policy) = env("METERLINE_ON_UNASSIGNABLE") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding unassignable policy from environment");
                    self.usage.on_unassignable = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown unassignable policy in environment"),
            }
        }

        if let Some(strategy) = env("METERLINE_PRORATION_STRATEGY") {
            match strategy.parse() {
                Ok(parsed) => {
                    debug!(strategy = %strategy, "Overriding proration strategy from environment");
                    self.proration.strategy = parsed;
                }
                Err(_) => warn!(strategy = %strategy, "Unknown proration strategy in environment"),
            }
        }

        if let Some(tz) = env("METERLINE_CUSTOMER_TIMEZONE") {
            debug!(timezone = %tz, "Overriding customer timezone from environment");
            self.proration.customer_timezone = tz;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "meterline", "meterline")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }
}
