//! # Proration
//!
//! How much of a billing period is left at a given instant, as an exact
//! integer ratio.
//!
//! ## Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period: Jan 1 ─────────────────────────────── Jan 31   (customer tz)   │
//! │  change:                  Jan 21                                        │
//! │                                                                         │
//! │  day_based     remaining = days(Jan 21 → Jan 31) + 1 = 11               │
//! │                total     = days(Jan 1  → Jan 31) + 1 = 31   → 11/31     │
//! │                                                                         │
//! │  second_based  remaining = seconds(change → end)                        │
//! │                total     = seconds(start  → end)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Day counts use calendar dates in the customer's zone, so a 23-hour DST
//! day still counts as one day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::types::PeriodRange;

// =============================================================================
// Strategy
// =============================================================================

/// How the proration coefficient is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProrationStrategy {
    #[default]
    DayBased,
    SecondBased,
}

impl fmt::Display for ProrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProrationStrategy::DayBased => write!(f, "day_based"),
            ProrationStrategy::SecondBased => write!(f, "second_based"),
        }
    }
}

impl FromStr for ProrationStrategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day_based" => Ok(ProrationStrategy::DayBased),
            "second_based" => Ok(ProrationStrategy::SecondBased),
            _ => Err(ValidationError::NotAllowed {
                field: "proration_strategy".to_string(),
                value: s.to_string(),
                allowed: vec!["day_based".to_string(), "second_based".to_string()],
            }),
        }
    }
}

// =============================================================================
// Coefficient
// =============================================================================

/// `remaining / total`, kept as integers.
///
/// ## Invariants
/// - `total > 0`
/// - `remaining >= 0`
///
/// `remaining` may exceed `total` when the proration instant precedes the
/// period start; capping is the caller's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProrationCoefficient {
    remaining: i64,
    total: i64,
}

impl ProrationCoefficient {
    /// Builds a coefficient, clamping a negative `remaining` to zero.
    pub fn new(remaining: i64, total: i64) -> CoreResult<Self> {
        if total <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "proration total".to_string(),
                value: total,
            }
            .into());
        }
        Ok(ProrationCoefficient {
            remaining: remaining.max(0),
            total,
        })
    }

    /// The coefficient of an untouched period.
    pub const fn full() -> Self {
        ProrationCoefficient {
            remaining: 1,
            total: 1,
        }
    }

    #[inline]
    pub const fn remaining(&self) -> i64 {
        self.remaining
    }

    #[inline]
    pub const fn total(&self) -> i64 {
        self.total
    }

    pub const fn is_zero(&self) -> bool {
        self.remaining == 0
    }

    pub const fn is_full(&self) -> bool {
        self.remaining >= self.total
    }

    /// Lossy view for display and logging only.
    pub fn as_f64(&self) -> f64 {
        self.remaining as f64 / self.total as f64
    }
}

impl fmt::Display for ProrationCoefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remaining, self.total)
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// Computes the share of `period` left at `proration_date`.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use meterline_core::proration::{proration_coefficient, ProrationStrategy};
/// use meterline_core::types::PeriodRange;
///
/// let period = PeriodRange::new(
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
/// )
/// .unwrap();
/// let change = Utc.with_ymd_and_hms(2024, 1, 21, 15, 0, 0).unwrap();
///
/// let coefficient =
///     proration_coefficient(&period, &change, ProrationStrategy::DayBased, &Utc).unwrap();
/// assert_eq!(coefficient.to_string(), "11/31");
/// ```
pub fn proration_coefficient<Tz: TimeZone, C: TimeZone>(
    period: &PeriodRange<Tz>,
    proration_date: &DateTime<Tz>,
    strategy: ProrationStrategy,
    customer_tz: &C,
) -> CoreResult<ProrationCoefficient> {
    let start = period.start().with_timezone(customer_tz);
    let end = period.end().with_timezone(customer_tz);
    let at = proration_date.with_timezone(customer_tz);

    match strategy {
        ProrationStrategy::SecondBased => {
            let total = (end.clone() - start).num_seconds();
            let remaining = (end - at).num_seconds();
            ProrationCoefficient::new(remaining, total)
        }
        ProrationStrategy::DayBased => {
            let total = calendar_days_between(&start, &end) + 1;
            let remaining = calendar_days_between(&at, &end) + 1;
            ProrationCoefficient::new(remaining, total)
        }
    }
}

// Whole calendar days from `from` to `to` by local date, zero if `to` is not later.
fn calendar_days_between<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> i64 {
    let days = to
        .date_naive()
        .signed_duration_since(from.date_naive())
        .num_days();
    days.max(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Tokyo;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn january() -> PeriodRange<Utc> {
        PeriodRange::new(utc(2024, 1, 1), utc(2024, 1, 31)).unwrap()
    }

    #[test]
    fn test_day_based_counts_both_ends() {
        let got =
            proration_coefficient(&january(), &utc(2024, 1, 1), ProrationStrategy::DayBased, &Utc)
                .unwrap();
        assert_eq!((got.remaining(), got.total()), (31, 31));
        assert!(got.is_full());

        let got =
            proration_coefficient(&january(), &utc(2024, 1, 31), ProrationStrategy::DayBased, &Utc)
                .unwrap();
        assert_eq!((got.remaining(), got.total()), (1, 31));
    }

    #[test]
    fn test_day_based_after_period_end_keeps_one_day() {
        let got =
            proration_coefficient(&january(), &utc(2024, 2, 10), ProrationStrategy::DayBased, &Utc)
                .unwrap();
        assert_eq!(got.remaining(), 1);
    }

    #[test]
    fn test_day_based_uses_customer_dates() {
        // 2024-01-10 20:00 UTC is already the 11th in Tokyo.
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();
        let got = proration_coefficient(&january(), &at, ProrationStrategy::DayBased, &Tokyo)
            .unwrap();
        assert_eq!((got.remaining(), got.total()), (21, 31));

        let got =
            proration_coefficient(&january(), &at, ProrationStrategy::DayBased, &Utc).unwrap();
        assert_eq!(got.remaining(), 22);
    }

    #[test]
    fn test_day_based_ignores_dst_hour() {
        // March 2024 in New York has a 23-hour day on the 10th.
        let start = New_York.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = New_York.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let period = PeriodRange::new(start, end).unwrap();
        let at = New_York.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();

        let got = proration_coefficient(&period, &at, ProrationStrategy::DayBased, &New_York)
            .unwrap();
        assert_eq!((got.remaining(), got.total()), (21, 31));
    }

    #[test]
    fn test_second_based() {
        let period = PeriodRange::new(utc(2024, 1, 1), utc(2024, 1, 2)).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap();
        let got = proration_coefficient(&period, &at, ProrationStrategy::SecondBased, &Utc)
            .unwrap();
        assert_eq!((got.remaining(), got.total()), (21_600, 86_400));
        assert!((got.as_f64() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_second_based_clamps_negative_remaining() {
        let period = PeriodRange::new(utc(2024, 1, 1), utc(2024, 1, 2)).unwrap();
        let got =
            proration_coefficient(&period, &utc(2024, 1, 5), ProrationStrategy::SecondBased, &Utc)
                .unwrap();
        assert!(got.is_zero());
    }

    #[test]
    fn test_coefficient_rejects_non_positive_total() {
        assert!(ProrationCoefficient::new(1, 0).unwrap_err().is_validation());
        assert!(ProrationCoefficient::new(1, -3).is_err());
        assert_eq!(ProrationCoefficient::new(-4, 10).unwrap().remaining(), 0);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "second_based".parse::<ProrationStrategy>().unwrap(),
            ProrationStrategy::SecondBased
        );
        assert!("hourly".parse::<ProrationStrategy>().is_err());
        assert_eq!(ProrationStrategy::default().to_string(), "day_based");
    }
}
