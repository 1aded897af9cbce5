//! # Money Module
//!
//! Integer amounts in a currency's minor unit, and how proration applies
//! to them.
//!
//! ## Why Ratios, Not Floats?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FLOAT COEFFICIENT                                                      │
//! │    30.00 × (11 / 31) = 10.645161290...  → rounding depends on the       │
//! │    float's last bits, and differs between languages                     │
//! │                                                                         │
//! │  INTEGER RATIO (this module)                                            │
//! │    3000 × 11 = 33000,  33000 / 31 = 1064 r 16                           │
//! │    16 × 2 > 31 → round up → 1065 minor units, on every machine          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use meterline_core::money::Money;
//! use meterline_core::proration::ProrationCoefficient;
//!
//! let plan = Money::from_minor(3000);
//! let share = ProrationCoefficient::new(11, 31).unwrap();
//! assert_eq!(plan.prorate(share).unwrap(), Money::from_minor(1065));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::proration::ProrationCoefficient;

/// Minor units per major unit for two-decimal currencies.
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the currency's smallest unit (cents for USD).
///
/// Signed: credits for unused time are negative line amounts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Scales the amount by a proration coefficient.
    ///
    /// ## Rounding
    /// Round half to even on the exact quotient:
    /// ```text
    /// 250 × 1/100 = 2.5  → 2
    /// 350 × 1/100 = 3.5  → 4
    /// -250 × 1/100 = -2.5 → -2
    /// ```
    ///
    /// ## Errors
    /// `OutOfRange` if the prorated amount no longer fits in `i64`.
    pub fn prorate(&self, coefficient: ProrationCoefficient) -> CoreResult<Money> {
        let numerator = i128::from(self.0) * i128::from(coefficient.remaining());
        let denominator = i128::from(coefficient.total());

        let rounded = round_half_even(numerator, denominator);
        let minor = i64::try_from(rounded).map_err(|_| ValidationError::OutOfRange {
            field: "prorated amount".to_string(),
            min: i64::MIN,
            max: i64::MAX,
        })?;

        Ok(Money(minor))
    }

    /// The credit for unused time: the negated prorated amount.
    pub fn unused_credit(&self, coefficient: ProrationCoefficient) -> CoreResult<Money> {
        Ok(-self.prorate(coefficient)?)
    }
}

// `denominator` is positive; ProrationCoefficient guarantees it.
fn round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator.div_euclid(denominator);
    let twice_remainder = numerator.rem_euclid(denominator) * 2;

    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `major.minor`, e.g. `10.65` or `-3.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_PER_MAJOR.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / per_major, abs % per_major)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
