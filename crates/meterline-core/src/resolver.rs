//! # Period Resolver
//!
//! Finds the billing period an arbitrary usage event belongs to.
//!
//! ## Search Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sub start          current period              event?                  │
//! │     │                ┌──────────┐                                       │
//! │     ▼                │          │                                       │
//! │  ───┼────┼────┼──────┼──────────┼────┼────┼─────────────────────────►   │
//! │     │                │          │                                       │
//! │     └── past walk ──►│ fast path│◄── future walk starts at current end  │
//! │       (from sub      │  (O(1))  │                                       │
//! │        start)        └──────────┘                                       │
//! │                                                                         │
//! │  Both walks are loops capped at MAX_PERIOD_SEARCH_ITERATIONS.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Interval Semantics
//! Every period is `[start, end)`. An event exactly on a boundary belongs
//! to the period that starts there, in all three branches.

use chrono::{DateTime, TimeZone};

use crate::error::{stamp, CoreError, CoreResult};
use crate::period::next_billing_date;
use crate::types::{BillingPeriod, PeriodId, PeriodRange};
use crate::validation::{validate_event_not_before_start, validate_period_unit};

/// Upper bound on periods walked while resolving one event.
pub const MAX_PERIOD_SEARCH_ITERATIONS: usize = 100;

/// How successive periods are generated during a walk.
struct Cadence<'a, A: TimeZone> {
    anchor: &'a DateTime<A>,
    unit: i32,
    period: BillingPeriod,
}

impl<A: TimeZone> Clone for Cadence<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: TimeZone> Copy for Cadence<'_, A> {}

// =============================================================================
// Public API
// =============================================================================

/// Resolves the period containing `event`.
///
/// ## Preconditions
/// - `unit > 0`
/// - `event >= subscription_start`
/// - `current_period_start < current_period_end`
///
/// ## Errors
/// - `Validation(..)` when a precondition fails
/// - `InconsistentPeriodBounds` when the period walked from the subscription
///   start overlaps the supplied current period
/// - `PeriodSearchExhausted` after [`MAX_PERIOD_SEARCH_ITERATIONS`] periods
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use meterline_core::resolver::resolve_period;
/// use meterline_core::types::BillingPeriod;
///
/// let jan_1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let mar_1 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
/// let apr_1 = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
/// let event = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
///
/// let range = resolve_period(&event, &jan_1, &mar_1, &apr_1, &jan_1, 1, BillingPeriod::Monthly)
///     .unwrap();
/// assert_eq!(*range.start(), jan_1);
/// assert_eq!(*range.end(), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
/// ```
pub fn resolve_period<Tz: TimeZone, A: TimeZone>(
    event: &DateTime<Tz>,
    subscription_start: &DateTime<Tz>,
    current_period_start: &DateTime<Tz>,
    current_period_end: &DateTime<Tz>,
    billing_anchor: &DateTime<A>,
    unit: i32,
    period: BillingPeriod,
) -> CoreResult<PeriodRange<Tz>> {
    validate_period_unit(unit)?;
    validate_event_not_before_start(event, subscription_start)?;
    let current = PeriodRange::new(current_period_start.clone(), current_period_end.clone())?;

    if current.contains(event) {
        return Ok(current);
    }

    let cadence = Cadence {
        anchor: billing_anchor,
        unit,
        period,
    };

    if event < current_period_start {
        walk_from_subscription_start(event, subscription_start, current_period_start, cadence)
    } else {
        walk_forward(event, current_period_end, cadence)
    }
}

/// Resolves the period containing `event` and returns its [`PeriodId`].
///
/// This is the value the usage pipeline writes to the `period_id` column.
pub fn calculate_period_id<Tz: TimeZone, A: TimeZone>(
    event: &DateTime<Tz>,
    subscription_start: &DateTime<Tz>,
    current_period_start: &DateTime<Tz>,
    current_period_end: &DateTime<Tz>,
    billing_anchor: &DateTime<A>,
    unit: i32,
    period: BillingPeriod,
) -> CoreResult<PeriodId> {
    resolve_period(
        event,
        subscription_start,
        current_period_start,
        current_period_end,
        billing_anchor,
        unit,
        period,
    )?
    .id()
}

// =============================================================================
// Walks
// =============================================================================

fn walk_from_subscription_start<Tz: TimeZone, A: TimeZone>(
    event: &DateTime<Tz>,
    subscription_start: &DateTime<Tz>,
    current_period_start: &DateTime<Tz>,
    cadence: Cadence<'_, A>,
) -> CoreResult<PeriodRange<Tz>> {
    let mut period_start = subscription_start.clone();
    let mut last: Option<PeriodRange<Tz>> = None;

    for _ in 0..MAX_PERIOD_SEARCH_ITERATIONS {
        let range = next_range(period_start, cadence)?;
        if range.contains(event) {
            // The walked period must end at or before the caller's current
            // period; overlapping it means the two were built differently.
            if range.end() > current_period_start {
                return Err(CoreError::InconsistentPeriodBounds {
                    walked_to: stamp(range.end()),
                    current_period_start: stamp(current_period_start),
                });
            }
            return Ok(range);
        }
        period_start = range.end().clone();
        last = Some(range);
    }

    Err(exhausted(event, last.as_ref(), cadence))
}

fn walk_forward<Tz: TimeZone, A: TimeZone>(
    event: &DateTime<Tz>,
    current_period_end: &DateTime<Tz>,
    cadence: Cadence<'_, A>,
) -> CoreResult<PeriodRange<Tz>> {
    let mut period_start = current_period_end.clone();
    let mut last: Option<PeriodRange<Tz>> = None;

    for _ in 0..MAX_PERIOD_SEARCH_ITERATIONS {
        let range = next_range(period_start, cadence)?;
        if range.contains(event) {
            return Ok(range);
        }
        period_start = range.end().clone();
        last = Some(range);
    }

    Err(exhausted(event, last.as_ref(), cadence))
}

fn next_range<Tz: TimeZone, A: TimeZone>(
    start: DateTime<Tz>,
    cadence: Cadence<'_, A>,
) -> CoreResult<PeriodRange<Tz>> {
    let end = next_billing_date(&start, cadence.anchor, cadence.unit, cadence.period, None)?;
    PeriodRange::new(start, end)
}

fn exhausted<Tz: TimeZone, A: TimeZone>(
    event: &DateTime<Tz>,
    last: Option<&PeriodRange<Tz>>,
    cadence: Cadence<'_, A>,
) -> CoreError {
    let (period_start, period_end) = last
        .map(|range| (stamp(range.start()), stamp(range.end())))
        .unwrap_or_default();

    CoreError::PeriodSearchExhausted {
        event: stamp(event),
        period_start,
        period_end,
        anchor: stamp(cadence.anchor),
        unit: cadence.unit,
        period: cadence.period.to_string(),
        iterations: MAX_PERIOD_SEARCH_ITERATIONS,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::Utc;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn monthly(event: DateTime<Utc>) -> CoreResult<PeriodRange<Utc>> {
        let jan_1 = utc(2024, 1, 1);
        resolve_period(
            &event,
            &jan_1,
            &utc(2024, 3, 1),
            &utc(2024, 4, 1),
            &jan_1,
            1,
            BillingPeriod::Monthly,
        )
    }

    #[test]
    fn test_event_in_current_period() {
        let range = monthly(utc(2024, 3, 20)).unwrap();
        assert_eq!(*range.start(), utc(2024, 3, 1));
        assert_eq!(*range.end(), utc(2024, 4, 1));
    }

    #[test]
    fn test_past_event_resolves_to_its_own_period() {
        let range = monthly(utc(2024, 1, 15)).unwrap();
        assert_eq!(*range.start(), utc(2024, 1, 1));
        assert_eq!(*range.end(), utc(2024, 2, 1));

        let range = monthly(utc(2024, 2, 1)).unwrap();
        assert_eq!(*range.start(), utc(2024, 2, 1));
    }

    #[test]
    fn test_event_on_current_end_belongs_to_next_period() {
        let range = monthly(utc(2024, 4, 1)).unwrap();
        assert_eq!(*range.start(), utc(2024, 4, 1));
        assert_eq!(*range.end(), utc(2024, 5, 1));
    }

    #[test]
    fn test_future_event_walks_forward() {
        let range = monthly(utc(2024, 8, 31)).unwrap();
        assert_eq!(*range.start(), utc(2024, 8, 1));
        assert_eq!(*range.end(), utc(2024, 9, 1));
    }

    #[test]
    fn test_event_on_subscription_start() {
        let range = monthly(utc(2024, 1, 1)).unwrap();
        assert_eq!(*range.start(), utc(2024, 1, 1));
    }

    #[test]
    fn test_event_before_subscription_is_rejected() {
        let err = monthly(utc(2023, 12, 31)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EventBeforeSubscription { .. })
        ));
    }

    #[test]
    fn test_invalid_current_bounds_are_rejected() {
        let jan_1 = utc(2024, 1, 1);
        let err = resolve_period(
            &utc(2024, 1, 10),
            &jan_1,
            &utc(2024, 3, 1),
            &utc(2024, 3, 1),
            &jan_1,
            1,
            BillingPeriod::Monthly,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidPeriodBounds { .. })
        ));
    }

    #[test]
    fn test_non_positive_unit_is_rejected() {
        let jan_1 = utc(2024, 1, 1);
        let err = resolve_period(
            &jan_1,
            &jan_1,
            &jan_1,
            &utc(2024, 2, 1),
            &jan_1,
            0,
            BillingPeriod::Monthly,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_future_search_exhausts() {
        let jan_1 = utc(2024, 1, 1);
        // Sep 14 is far more than 100 daily periods past the current one.
        let err = resolve_period(
            &utc(2024, 9, 14),
            &jan_1,
            &jan_1,
            &utc(2024, 1, 2),
            &jan_1,
            1,
            BillingPeriod::Daily,
        )
        .unwrap_err();

        match err {
            CoreError::PeriodSearchExhausted {
                iterations,
                period,
                unit,
                period_end,
                ..
            } => {
                assert_eq!(iterations, MAX_PERIOD_SEARCH_ITERATIONS);
                assert_eq!(period, "DAILY");
                assert_eq!(unit, 1);
                assert_eq!(period_end, "2024-04-11T00:00:00+00:00");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_past_search_exhausts() {
        let jan_1 = utc(2024, 1, 1);
        let err = resolve_period(
            &utc(2024, 6, 1),
            &jan_1,
            &utc(2024, 12, 1),
            &utc(2024, 12, 2),
            &jan_1,
            1,
            BillingPeriod::Daily,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::PeriodSearchExhausted { .. }));
    }

    #[test]
    fn test_overlapping_current_period_is_inconsistent() {
        // Monthly periods from Jan 1 run [Jan 1, Feb 1), but the caller
        // claims the current period started Jan 20.
        let jan_1 = utc(2024, 1, 1);
        let err = resolve_period(
            &utc(2024, 1, 10),
            &jan_1,
            &utc(2024, 1, 20),
            &utc(2024, 2, 20),
            &jan_1,
            1,
            BillingPeriod::Monthly,
        )
        .unwrap_err();

        match err {
            CoreError::InconsistentPeriodBounds {
                walked_to,
                current_period_start,
            } => {
                assert_eq!(walked_to, "2024-02-01T00:00:00+00:00");
                assert_eq!(current_period_start, "2024-01-20T00:00:00+00:00");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_past_walk_ending_on_current_start_is_consistent() {
        let jan_1 = utc(2024, 1, 1);
        let range = resolve_period(
            &utc(2024, 1, 31),
            &jan_1,
            &utc(2024, 2, 1),
            &utc(2024, 3, 1),
            &jan_1,
            1,
            BillingPeriod::Monthly,
        )
        .unwrap();
        assert_eq!(*range.end(), utc(2024, 2, 1));
    }

    #[test]
    fn test_calculate_period_id() {
        let jan_1 = utc(2024, 1, 1);
        let id = calculate_period_id(
            &utc(2024, 1, 15),
            &jan_1,
            &utc(2024, 3, 1),
            &utc(2024, 4, 1),
            &jan_1,
            1,
            BillingPeriod::Monthly,
        )
        .unwrap();
        assert_eq!(id.as_millis(), 1_704_067_200_000);
    }

    #[test]
    fn test_weekly_resolution_with_anchor_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let current_start = Utc.with_ymd_and_hms(2024, 1, 29, 9, 0, 0).unwrap();
        let current_end = Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap();

        let event = Utc.with_ymd_and_hms(2024, 1, 22, 9, 0, 0).unwrap();
        let range = resolve_period(
            &event,
            &start,
            &current_start,
            &current_end,
            &start,
            1,
            BillingPeriod::Weekly,
        )
        .unwrap();
        assert_eq!(*range.start(), event);
        assert_eq!(*range.end(), current_start);
    }
}
