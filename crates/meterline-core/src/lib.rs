//! # meterline-core: Billing Period Date Engine
//!
//! Pure calendar arithmetic for subscription billing: where periods begin
//! and end, which period a usage event belongs to, and how much of a
//! period remains.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Meterline Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Renewal service / usage pipeline / grant scheduler        │   │
//! │  │                   (outside this workspace)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     meterline-cycle: schedules, tagging, config, tracing        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ meterline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │ calendar │  │  period  │  │ resolver │  │  proration   │   │   │
//! │  │   │ clamping │  │ advance  │  │ period   │  │  coefficient │   │   │
//! │  │   │ YYYYMMDD │  │ anchors  │  │ lookup   │  │  money       │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOGGING • NO SHARED STATE • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`calendar`] - Clamped date addition, leap years, YYYYMMDD parsing
//! - [`period`] - Next billing / credit grant dates, calendar anchors
//! - [`resolver`] - Which period an event falls into
//! - [`credit`] - Credit grant expiry policies
//! - [`proration`] - Remaining-share coefficients
//! - [`money`] - Integer money and prorated amounts
//! - [`types`] - Period enums, ranges, IDs
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output, safe from any thread
//! 2. **Zone Preserving**: arithmetic runs on the input's local wall clock
//! 3. **Bounded Search**: period walks are loops with an iteration cap
//! 4. **Explicit Errors**: every failure is a typed error, never a panic
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use meterline_core::{calculate_period_id, next_billing_date, BillingPeriod};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let end = next_billing_date(&start, &start, 1, BillingPeriod::Monthly, None).unwrap();
//! assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
//!
//! let event = Utc.with_ymd_and_hms(2024, 1, 20, 8, 0, 0).unwrap();
//! let id = calculate_period_id(&event, &start, &start, &end, &start, 1, BillingPeriod::Monthly)
//!     .unwrap();
//! assert_eq!(id.as_millis(), 1_704_067_200_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod credit;
pub mod error;
pub mod money;
pub mod period;
pub mod proration;
pub mod resolver;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calendar::{add_clamped_date, parse_yyyymmdd};
pub use credit::{CreditGrantExpiry, ExpiryDurationUnit};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::{
    calendar_billing_anchor, calendar_period_floor, next_billing_date, next_credit_grant_date,
};
pub use proration::{proration_coefficient, ProrationCoefficient, ProrationStrategy};
pub use resolver::{calculate_period_id, resolve_period, MAX_PERIOD_SEARCH_ITERATIONS};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default cap on periods generated by one catch-up run.
///
/// Ten years of monthly periods; a subscription further behind than that
/// needs manual attention.
pub const DEFAULT_MAX_CATCH_UP_PERIODS: u32 = 120;
