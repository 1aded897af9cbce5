//! # Domain Types
//!
//! Value types shared by every period calculation.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │  BillingPeriod  │   │ CreditGrantPeriod│   │  BillingCycle   │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  DAILY          │   │  DAILY           │   │  anniversary    │      │
//! │  │  WEEKLY         │   │  WEEKLY          │   │  calendar       │      │
//! │  │  MONTHLY        │   │  MONTHLY         │   └─────────────────┘      │
//! │  │  QUARTERLY      │   │  QUARTERLY       │                            │
//! │  │  HALF_YEARLY    │   │  HALFYEARLY      │                            │
//! │  │  ANNUAL         │   │  YEARLY          │                            │
//! │  └────────┬────────┘   └────────┬─────────┘                            │
//! │           └──────────┬──────────┘                                       │
//! │                      ▼                                                  │
//! │             ┌─────────────────┐      ┌─────────────────┐               │
//! │             │   PeriodStep    │      │  PeriodRange    │               │
//! │             │  Days / Weeks / │      │  [start, end)   │──► PeriodId   │
//! │             │  Months(n)/Years│      │                 │   (epoch ms)  │
//! │             └─────────────────┘      └─────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closed Enums
//! Period kinds are Rust enums, so an "unknown period type" can only enter
//! through parsing. `FromStr` is the single place that rejects it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{stamp, CoreResult, ValidationError};
use crate::validation::validate_period_bounds;

// =============================================================================
// Billing Period
// =============================================================================

/// How often a subscription is invoiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Annual,
}

impl BillingPeriod {
    /// Every billing period, in ascending length.
    pub const ALL: [BillingPeriod; 6] = [
        BillingPeriod::Daily,
        BillingPeriod::Weekly,
        BillingPeriod::Monthly,
        BillingPeriod::Quarterly,
        BillingPeriod::HalfYearly,
        BillingPeriod::Annual,
    ];

    /// Wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Daily => "DAILY",
            BillingPeriod::Weekly => "WEEKLY",
            BillingPeriod::Monthly => "MONTHLY",
            BillingPeriod::Quarterly => "QUARTERLY",
            BillingPeriod::HalfYearly => "HALF_YEARLY",
            BillingPeriod::Annual => "ANNUAL",
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAILY" => Ok(BillingPeriod::Daily),
            "WEEKLY" => Ok(BillingPeriod::Weekly),
            "MONTHLY" => Ok(BillingPeriod::Monthly),
            "QUARTERLY" | "QUARTER" => Ok(BillingPeriod::Quarterly),
            "HALF_YEARLY" | "HALF_YEAR" => Ok(BillingPeriod::HalfYearly),
            "ANNUAL" | "YEARLY" => Ok(BillingPeriod::Annual),
            _ => Err(ValidationError::NotAllowed {
                field: "billing_period".to_string(),
                value: s.to_string(),
                allowed: BillingPeriod::ALL.iter().map(|p| p.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Credit Grant Period
// =============================================================================

/// Cadence of a recurring credit grant.
///
/// Independent of the subscription's own [`BillingPeriod`]: a monthly
/// subscription can carry a weekly grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum CreditGrantPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl CreditGrantPeriod {
    pub const ALL: [CreditGrantPeriod; 6] = [
        CreditGrantPeriod::Daily,
        CreditGrantPeriod::Weekly,
        CreditGrantPeriod::Monthly,
        CreditGrantPeriod::Quarterly,
        CreditGrantPeriod::HalfYearly,
        CreditGrantPeriod::Yearly,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            CreditGrantPeriod::Daily => "DAILY",
            CreditGrantPeriod::Weekly => "WEEKLY",
            CreditGrantPeriod::Monthly => "MONTHLY",
            CreditGrantPeriod::Quarterly => "QUARTERLY",
            CreditGrantPeriod::HalfYearly => "HALFYEARLY",
            CreditGrantPeriod::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for CreditGrantPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditGrantPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAILY" => Ok(CreditGrantPeriod::Daily),
            "WEEKLY" => Ok(CreditGrantPeriod::Weekly),
            "MONTHLY" => Ok(CreditGrantPeriod::Monthly),
            "QUARTERLY" => Ok(CreditGrantPeriod::Quarterly),
            "HALFYEARLY" => Ok(CreditGrantPeriod::HalfYearly),
            "YEARLY" => Ok(CreditGrantPeriod::Yearly),
            _ => Err(ValidationError::NotAllowed {
                field: "credit_grant_period".to_string(),
                value: s.to_string(),
                allowed: CreditGrantPeriod::ALL.iter().map(|p| p.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Billing Cycle
// =============================================================================

/// Where period boundaries fall.
///
/// ```text
/// anniversary: start 2024-01-15 10:30 → boundaries on the 15th at 10:30
/// calendar:    start 2024-01-15 10:30 → boundaries on the 1st at 00:00
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Anchored to the subscription's own start date and time.
    #[default]
    Anniversary,
    /// Anchored to calendar boundaries (1st of month, Monday, Jan 1).
    Calendar,
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingCycle::Anniversary => write!(f, "anniversary"),
            BillingCycle::Calendar => write!(f, "calendar"),
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anniversary" => Ok(BillingCycle::Anniversary),
            "calendar" => Ok(BillingCycle::Calendar),
            _ => Err(ValidationError::NotAllowed {
                field: "billing_cycle".to_string(),
                value: s.to_string(),
                allowed: vec!["anniversary".to_string(), "calendar".to_string()],
            }),
        }
    }
}

// =============================================================================
// Period Step
// =============================================================================

/// The calendar movement one unit of a period makes.
///
/// Both [`BillingPeriod`] and [`CreditGrantPeriod`] reduce to this, so the
/// advancement algorithm exists exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodStep {
    Days,
    Weeks,
    /// Months per unit: 1 (monthly), 3 (quarterly), 6 (half-yearly).
    /// Must be positive.
    Months(i32),
    Years,
}

impl From<BillingPeriod> for PeriodStep {
    fn from(period: BillingPeriod) -> Self {
        match period {
            BillingPeriod::Daily => PeriodStep::Days,
            BillingPeriod::Weekly => PeriodStep::Weeks,
            BillingPeriod::Monthly => PeriodStep::Months(1),
            BillingPeriod::Quarterly => PeriodStep::Months(3),
            BillingPeriod::HalfYearly => PeriodStep::Months(6),
            BillingPeriod::Annual => PeriodStep::Years,
        }
    }
}

impl From<CreditGrantPeriod> for PeriodStep {
    fn from(period: CreditGrantPeriod) -> Self {
        match period {
            CreditGrantPeriod::Daily => PeriodStep::Days,
            CreditGrantPeriod::Weekly => PeriodStep::Weeks,
            CreditGrantPeriod::Monthly => PeriodStep::Months(1),
            CreditGrantPeriod::Quarterly => PeriodStep::Months(3),
            CreditGrantPeriod::HalfYearly => PeriodStep::Months(6),
            CreditGrantPeriod::Yearly => PeriodStep::Years,
        }
    }
}

// =============================================================================
// Period ID
// =============================================================================

/// Stable identifier of a billing period: its start in epoch milliseconds.
///
/// ## Why Epoch Millis?
/// The analytics store groups usage rows by `period_id` (a `uint64`
/// column). Millisecond starts are sortable, zone-independent and identical
/// no matter which node computed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodId(u64);

impl PeriodId {
    /// Derives the ID from a period start.
    ///
    /// Starts before 1970-01-01 cannot be stored as `u64` and are rejected.
    pub fn from_start<Tz: TimeZone>(start: &DateTime<Tz>) -> CoreResult<Self> {
        let millis = start.timestamp_millis();
        let millis = u64::try_from(millis).map_err(|_| ValidationError::OutOfRange {
            field: "period_start".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
        Ok(PeriodId(millis))
    }

    /// Wraps a raw stored value.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        PeriodId(millis)
    }

    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// The period start this ID encodes, in UTC.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Period Range
// =============================================================================

/// A billing period `[start, end)`.
///
/// ## Invariant
/// `start < end`, checked on construction. Membership is half-open: an
/// instant equal to `end` belongs to the next period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRange<Tz: TimeZone> {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl<Tz: TimeZone> PeriodRange<Tz> {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> CoreResult<Self> {
        validate_period_bounds(&start, &end)?;
        Ok(PeriodRange { start, end })
    }

    #[inline]
    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    #[inline]
    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    /// Half-open membership check.
    pub fn contains<Tz2: TimeZone>(&self, instant: &DateTime<Tz2>) -> bool {
        self.start <= *instant && *instant < self.end
    }

    /// Elapsed time between start and end.
    pub fn duration(&self) -> TimeDelta {
        self.end.clone().signed_duration_since(self.start.clone())
    }

    /// The period's stable identifier.
    pub fn id(&self) -> CoreResult<PeriodId> {
        PeriodId::from_start(&self.start)
    }

    pub fn into_parts(self) -> (DateTime<Tz>, DateTime<Tz>) {
        (self.start, self.end)
    }
}

/// Renders as `start..end` in RFC 3339.
impl<Tz: TimeZone> fmt::Display for PeriodRange<Tz> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", stamp(&self.start), stamp(&self.end))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
