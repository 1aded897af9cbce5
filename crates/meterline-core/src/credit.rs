//! # Credit Grant Expiry
//!
//! When granted credits stop being spendable.
//!
//! ```text
//! NEVER          → no expiry date
//! DURATION(n, u) → granted_at + n units (clamped: Jan 31 + 1 MONTH = Feb 29)
//! BILLING_CYCLE  → end of the subscription's current period
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calendar::add_clamped_date;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::validate_positive_count;

// =============================================================================
// Duration Unit
// =============================================================================

/// Unit of a duration-based expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpiryDurationUnit {
    Day,
    Week,
    Month,
    Year,
}

impl ExpiryDurationUnit {
    pub const ALL: [ExpiryDurationUnit; 4] = [
        ExpiryDurationUnit::Day,
        ExpiryDurationUnit::Week,
        ExpiryDurationUnit::Month,
        ExpiryDurationUnit::Year,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpiryDurationUnit::Day => "DAY",
            ExpiryDurationUnit::Week => "WEEK",
            ExpiryDurationUnit::Month => "MONTH",
            ExpiryDurationUnit::Year => "YEAR",
        }
    }
}

impl fmt::Display for ExpiryDurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryDurationUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAY" => Ok(ExpiryDurationUnit::Day),
            "WEEK" => Ok(ExpiryDurationUnit::Week),
            "MONTH" => Ok(ExpiryDurationUnit::Month),
            "YEAR" => Ok(ExpiryDurationUnit::Year),
            _ => Err(ValidationError::NotAllowed {
                field: "expiry_duration_unit".to_string(),
                value: s.to_string(),
                allowed: ExpiryDurationUnit::ALL.iter().map(|u| u.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Expiry Policy
// =============================================================================

/// Expiry policy attached to a credit grant.
///
/// ## Wire Format
/// ```json
/// { "type": "NEVER" }
/// { "type": "DURATION", "count": 30, "unit": "DAY" }
/// { "type": "BILLING_CYCLE" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditGrantExpiry {
    #[default]
    Never,
    Duration {
        count: i32,
        unit: ExpiryDurationUnit,
    },
    BillingCycle,
}

impl CreditGrantExpiry {
    /// Checks that a duration is positive.
    pub fn validate(&self) -> CoreResult<()> {
        if let CreditGrantExpiry::Duration { count, .. } = self {
            validate_positive_count("expiry duration", *count)?;
        }
        Ok(())
    }

    /// Computes the expiry of a grant issued at `granted_at`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use meterline_core::credit::{CreditGrantExpiry, ExpiryDurationUnit};
    ///
    /// let granted = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
    /// let period_end = Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();
    ///
    /// let expiry = CreditGrantExpiry::Duration { count: 1, unit: ExpiryDurationUnit::Month };
    /// assert_eq!(
    ///     expiry.expiry_date(&granted, &period_end).unwrap(),
    ///     Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
    /// );
    /// assert_eq!(CreditGrantExpiry::Never.expiry_date(&granted, &period_end).unwrap(), None);
    /// ```
    pub fn expiry_date<Tz: TimeZone>(
        &self,
        granted_at: &DateTime<Tz>,
        current_period_end: &DateTime<Tz>,
    ) -> CoreResult<Option<DateTime<Tz>>> {
        self.validate()?;

        let (count, unit) = match *self {
            CreditGrantExpiry::Never => return Ok(None),
            CreditGrantExpiry::BillingCycle => return Ok(Some(current_period_end.clone())),
            CreditGrantExpiry::Duration { count, unit } => (count, unit),
        };

        let expiry = match unit {
            ExpiryDurationUnit::Day => add_clamped_date(granted_at, 0, 0, i64::from(count)),
            ExpiryDurationUnit::Week => add_clamped_date(granted_at, 0, 0, i64::from(count) * 7),
            ExpiryDurationUnit::Month => add_clamped_date(granted_at, 0, count, 0),
            ExpiryDurationUnit::Year => add_clamped_date(granted_at, count, 0, 0),
        };

        expiry.map(Some).ok_or_else(|| CoreError::DateOutOfRange {
            operation: format!("credit expiry ({count} {unit})"),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
