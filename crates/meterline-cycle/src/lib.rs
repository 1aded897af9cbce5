//! # meterline-cycle: Subscription Billing Cycles
//!
//! The stateful layer over `meterline-core`: one schedule per subscription,
//! renewal catch-up, usage tagging and credit grant listing, plus the
//! engine configuration and logging around them.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Cycle Layer                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 SubscriptionSchedule (per subscription)          │  │
//! │  │                                                                  │  │
//! │  │  anchor • current period • renewal catch-up • realignment        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  UsageTagger   │  │ CreditGrant    │  │  initial_proration     │    │
//! │  │                │  │ Schedule       │  │                        │    │
//! │  │ event → period │  │ grant dates    │  │ partial first calendar │    │
//! │  │ skip | fail    │  │ + expiries     │  │ period coefficient     │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  EngineConfig: TOML file + METERLINE_* env overrides                    │
//! │  tracing: debug per period, info per run, warn on skips and caps        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`schedule`] - `SubscriptionSchedule` and renewal
//! - [`usage`] - Usage event tagging
//! - [`grants`] - Recurring credit grant listing
//! - [`config`] - Engine defaults (cycle, count, caps, proration)
//! - [`error`] - Cycle error types
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use meterline_core::BillingPeriod;
//! use meterline_cycle::{EngineConfig, SubscriptionSchedule, UsageEvent, UsageTagger};
//!
//! let config = EngineConfig::default();
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let mut schedule =
//!     SubscriptionSchedule::from_config("sub_1", start, None, BillingPeriod::Monthly, &config)
//!         .unwrap();
//!
//! let outcome = schedule
//!     .renew_through(&Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap())
//!     .unwrap();
//! assert_eq!(outcome.renewed(), 2);
//!
//! let events = vec![UsageEvent::new("evt_1", Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap())];
//! let report = UsageTagger::new(&schedule, config.usage.on_unassignable)
//!     .tag(events)
//!     .unwrap();
//! assert!(report.skipped.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod grants;
pub mod schedule;
pub mod usage;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{
    BillingSettings, EngineConfig, ProrationSettings, UnassignablePolicy, UsageSettings,
};
pub use error::{CycleError, CycleResult};
pub use grants::{CreditGrantSchedule, GrantRun, ScheduledGrant};
pub use schedule::{RenewalOutcome, SubscriptionSchedule};
pub use usage::{TaggedEvent, TaggingReport, UsageEvent, UsageTagger};
