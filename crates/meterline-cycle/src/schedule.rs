//! # Subscription Schedule
//!
//! One subscription's billing cadence and the period it is currently in.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Schedule Lifecycle                                  │
//! │                                                                         │
//! │  initialize(start, end, cycle, period, count)                           │
//! │      │   anchor = start                  (anniversary)                  │
//! │      │   anchor = next calendar boundary (calendar)                     │
//! │      ▼                                                                  │
//! │  current = [start, next_billing_date(start, anchor, count, period))     │
//! │      │                                                                  │
//! │      ├──► renew_through(now)     one period per elapsed boundary        │
//! │      │                           stops at the subscription end          │
//! │      │                           stops at max_catch_up_periods          │
//! │      │                                                                  │
//! │      ├──► realign_to_calendar()  anniversary → calendar, keeps start    │
//! │      │                                                                  │
//! │      └──► period_containing(e)   which period a usage event belongs to  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The anchor is stored with a fixed offset. Only its local date and clock
//! fields matter, so a calendar anchor (UTC midnight) lands every boundary
//! on local midnight in the subscription's zone.
//!
//! ## Realignment Keeps History
//! ```text
//! start Jan 15 ─── anniversary (anchor Jan 15) ───┬── calendar (anchor Feb 1) ──►
//!   [Jan 15, Feb 15) [Feb 15, Mar 15)             │ [Mar 15, Apr 1) [Apr 1, May 1)
//!                                              cutover Mar 15
//! ```
//! Instants before a cutover resolve against the cadence retired there.

use chrono::{DateTime, FixedOffset, TimeZone};
use tracing::{debug, info, warn};

use meterline_core::validation::validate_event_not_before_start;
use meterline_core::{
    calendar_billing_anchor, calendar_period_floor, next_billing_date, proration_coefficient,
    resolve_period, BillingCycle, BillingPeriod, PeriodId, PeriodRange, ProrationCoefficient,
    ProrationStrategy, DEFAULT_MAX_CATCH_UP_PERIODS,
};

use crate::config::EngineConfig;
use crate::error::CycleResult;

// =============================================================================
// Renewal Outcome
// =============================================================================

/// What one call to [`SubscriptionSchedule::renew_through`] produced.
#[derive(Debug, Clone)]
pub struct RenewalOutcome<Tz: TimeZone> {
    /// Newly opened periods, oldest first. The last one is now current.
    pub periods: Vec<PeriodRange<Tz>>,

    /// The current period ends at the subscription end date.
    pub reached_subscription_end: bool,

    /// Renewal stopped at the catch-up cap with boundaries still elapsed.
    pub limit_reached: bool,
}

impl<Tz: TimeZone> RenewalOutcome<Tz> {
    pub fn renewed(&self) -> usize {
        self.periods.len()
    }
}

// =============================================================================
// Retired Cadence
// =============================================================================

/// A cadence replaced by a realignment.
///
/// Its periods tile `[from, last_period.start())`; the cutover to the next
/// cadence is `last_period.start()`.
#[derive(Debug, Clone)]
struct RetiredCadence<Tz: TimeZone> {
    from: DateTime<Tz>,
    cycle: BillingCycle,
    anchor: DateTime<FixedOffset>,
    last_period: PeriodRange<Tz>,
}

// =============================================================================
// Subscription Schedule
// =============================================================================

/// Billing cadence of a single subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionSchedule<Tz: TimeZone> {
    subscription_id: String,
    start: DateTime<Tz>,
    end: Option<DateTime<Tz>>,
    cycle: BillingCycle,
    period: BillingPeriod,
    unit: i32,
    anchor: DateTime<FixedOffset>,
    current: PeriodRange<Tz>,
    max_catch_up_periods: u32,
    /// Where the live cadence began.
    cadence_start: DateTime<Tz>,
    /// Oldest first.
    retired: Vec<RetiredCadence<Tz>>,
}

impl<Tz: TimeZone> SubscriptionSchedule<Tz> {
    /// Seeds a schedule at the subscription start.
    ///
    /// A `count` of 0 bills every single period.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use meterline_cycle::SubscriptionSchedule;
    /// use meterline_core::{BillingCycle, BillingPeriod};
    ///
    /// let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    /// let schedule = SubscriptionSchedule::initialize(
    ///     "sub_1",
    ///     start,
    ///     None,
    ///     BillingCycle::Calendar,
    ///     BillingPeriod::Monthly,
    ///     1,
    /// )
    /// .unwrap();
    /// assert_eq!(
    ///     *schedule.current_period().end(),
    ///     Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    /// );
    /// ```
    pub fn initialize(
        subscription_id: impl Into<String>,
        start: DateTime<Tz>,
        end: Option<DateTime<Tz>>,
        cycle: BillingCycle,
        period: BillingPeriod,
        count: i32,
    ) -> CycleResult<Self> {
        let subscription_id = subscription_id.into();
        let unit = if count == 0 { 1 } else { count };
        let anchor = billing_anchor(&start, cycle, period)?;

        let first_end = next_billing_date(&start, &anchor, unit, period, end.as_ref())?;
        let current = PeriodRange::new(start.clone(), first_end)?;

        debug!(
            subscription_id = %subscription_id,
            %cycle,
            %period,
            unit,
            current_period = %current,
            "Initialized subscription schedule"
        );

        Ok(SubscriptionSchedule {
            subscription_id,
            cadence_start: start.clone(),
            retired: Vec::new(),
            start,
            end,
            cycle,
            period,
            unit,
            anchor,
            current,
            max_catch_up_periods: DEFAULT_MAX_CATCH_UP_PERIODS,
        })
    }

    /// Seeds a schedule using the engine defaults for cycle, count and cap.
    pub fn from_config(
        subscription_id: impl Into<String>,
        start: DateTime<Tz>,
        end: Option<DateTime<Tz>>,
        period: BillingPeriod,
        config: &EngineConfig,
    ) -> CycleResult<Self> {
        let schedule = Self::initialize(
            subscription_id,
            start,
            end,
            config.billing.default_cycle,
            period,
            config.billing.default_period_count,
        )?;
        Ok(schedule.with_catch_up_limit(config.billing.max_catch_up_periods))
    }

    /// Overrides how many periods a single renewal run may open.
    pub fn with_catch_up_limit(mut self, limit: u32) -> Self {
        self.max_catch_up_periods = limit;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> Option<&DateTime<Tz>> {
        self.end.as_ref()
    }

    pub fn cycle(&self) -> BillingCycle {
        self.cycle
    }

    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    pub fn unit(&self) -> i32 {
        self.unit
    }

    pub fn anchor(&self) -> &DateTime<FixedOffset> {
        &self.anchor
    }

    pub fn current_period(&self) -> &PeriodRange<Tz> {
        &self.current
    }

    pub fn max_catch_up_periods(&self) -> u32 {
        self.max_catch_up_periods
    }

    /// Start of the cadence in force now: the subscription start, or the
    /// cutover of the latest realignment.
    pub fn cadence_start(&self) -> &DateTime<Tz> {
        &self.cadence_start
    }

    // =========================================================================
    // Renewal
    // =========================================================================

    /// Opens every period whose start has passed by `now`.
    ///
    /// A period ending exactly at `now` is over, so the next one opens.
    ///
    /// ```text
    /// current [Jan 31, Feb 29)   now = May 15
    ///   → [Feb 29, Mar 31) → [Mar 31, Apr 30) → [Apr 30, May 31)   current
    /// ```
    ///
    /// If an error interrupts the run, `current_period` is left untouched.
    pub fn renew_through(&mut self, now: &DateTime<Tz>) -> CycleResult<RenewalOutcome<Tz>> {
        let mut current = self.current.clone();
        let mut periods = Vec::new();
        let mut renewed: u32 = 0;
        let mut limit_reached = false;

        while current.end() <= now {
            if self.ends_at(current.end()) {
                break;
            }
            if renewed >= self.max_catch_up_periods {
                limit_reached = true;
                warn!(
                    subscription_id = %self.subscription_id,
                    limit = self.max_catch_up_periods,
                    current_period = %current,
                    "Renewal stopped at catch-up limit"
                );
                break;
            }

            current = match self.next_period(&current)? {
                Some(next) => next,
                None => break,
            };
            renewed += 1;

            debug!(
                subscription_id = %self.subscription_id,
                period = %current,
                "Opened billing period"
            );
            periods.push(current.clone());
        }

        let reached_subscription_end = self.ends_at(current.end());
        if reached_subscription_end {
            info!(
                subscription_id = %self.subscription_id,
                current_period = %current,
                "Subscription end reached"
            );
        }
        if renewed > 0 {
            info!(
                subscription_id = %self.subscription_id,
                renewed,
                current_period = %current,
                "Renewed subscription"
            );
        }

        self.current = current;
        Ok(RenewalOutcome {
            periods,
            reached_subscription_end,
            limit_reached,
        })
    }

    /// The period that follows `after`, or `None` once the subscription has
    /// ended.
    ///
    /// The anchor is the one in force at `after.end()`. A period of a
    /// retired cadence never runs past that cadence's cutover.
    pub fn next_period(&self, after: &PeriodRange<Tz>) -> CycleResult<Option<PeriodRange<Tz>>> {
        let start = after.end().clone();
        if self.ends_at(&start) {
            return Ok(None);
        }

        let (anchor, cutover) = match self.retired_at(&start) {
            Some(retired) => (&retired.anchor, Some(retired.last_period.start())),
            None => (&self.anchor, None),
        };

        let mut end = next_billing_date(&start, anchor, self.unit, self.period, self.end.as_ref())?;
        if let Some(cutover) = cutover {
            if end > *cutover {
                end = cutover.clone();
            }
        }
        Ok(Some(PeriodRange::new(start, end)?))
    }

    fn ends_at(&self, instant: &DateTime<Tz>) -> bool {
        self.end.as_ref().is_some_and(|end| instant >= end)
    }

    // Retired cadence covering `instant`; `None` means the live one.
    fn retired_at(&self, instant: &DateTime<Tz>) -> Option<&RetiredCadence<Tz>> {
        if *instant >= self.cadence_start {
            return None;
        }
        self.retired.iter().rev().find(|retired| *instant >= retired.from)
    }

    // =========================================================================
    // Calendar Realignment
    // =========================================================================

    /// Moves the schedule onto calendar billing.
    ///
    /// The anchor is recomputed from the subscription start. The current
    /// period keeps its start and now ends at the next boundary of the new
    /// anchor:
    /// ```text
    /// anniversary, start Jan 15, current [Mar 15, Apr 15)
    ///   anchor Feb 1 → next_billing_date(Mar 15, Feb 1) = Apr 1
    ///   current [Mar 15, Apr 1)
    /// ```
    ///
    /// The current period start becomes the cutover. Periods already billed
    /// before it keep their bounds in [`Self::period_containing`].
    pub fn realign_to_calendar(&mut self) -> CycleResult<()> {
        let anchor = billing_anchor(&self.start, BillingCycle::Calendar, self.period)?;
        if self.cycle == BillingCycle::Calendar && anchor == self.anchor {
            debug!(
                subscription_id = %self.subscription_id,
                "Subscription already on calendar billing"
            );
            return Ok(());
        }
        let current_start = self.current.start().clone();

        // Same rule renewal and lookup apply from the cutover on.
        let boundary =
            next_billing_date(&current_start, &anchor, self.unit, self.period, self.end.as_ref())?;
        let current = PeriodRange::new(current_start.clone(), boundary)?;
        info!(
            subscription_id = %self.subscription_id,
            previous_cycle = %self.cycle,
            current_period = %current,
            "Realigned subscription to calendar billing"
        );

        if self.cadence_start < current_start {
            self.retired.push(RetiredCadence {
                from: self.cadence_start.clone(),
                cycle: self.cycle,
                anchor: self.anchor,
                last_period: self.current.clone(),
            });
        }
        self.cadence_start = current_start;
        self.cycle = BillingCycle::Calendar;
        self.anchor = anchor;
        self.current = current;
        Ok(())
    }

    // =========================================================================
    // Period Lookup
    // =========================================================================

    /// The billing period `event` falls into.
    ///
    /// Events before a realignment cutover resolve against the cadence that
    /// was billed at the time.
    pub fn period_containing(&self, event: &DateTime<Tz>) -> CycleResult<PeriodRange<Tz>> {
        validate_event_not_before_start(event, &self.start)?;

        let range = match self.retired_at(event) {
            Some(retired) => resolve_period(
                event,
                &retired.from,
                retired.last_period.start(),
                retired.last_period.end(),
                &retired.anchor,
                self.unit,
                self.period,
            )?,
            None => resolve_period(
                event,
                &self.cadence_start,
                self.current.start(),
                self.current.end(),
                &self.anchor,
                self.unit,
                self.period,
            )?,
        };
        Ok(range)
    }

    /// The [`PeriodId`] of the period `event` falls into.
    pub fn period_id_for(&self, event: &DateTime<Tz>) -> CycleResult<PeriodId> {
        Ok(self.period_containing(event)?.id()?)
    }

    // =========================================================================
    // First Period Proration
    // =========================================================================

    /// Share of a full calendar period covered by the first, partial one.
    ///
    /// The full period runs from the calendar boundary at or before the
    /// start to the end of the first period. Subscriptions that started on
    /// anniversary billing have no partial first period and return `None`,
    /// even after a realignment.
    pub fn initial_proration<C: TimeZone>(
        &self,
        strategy: ProrationStrategy,
        customer_tz: &C,
    ) -> CycleResult<Option<ProrationCoefficient>> {
        let (cycle, anchor) = match self.retired.first() {
            Some(first) => (first.cycle, &first.anchor),
            None => (self.cycle, &self.anchor),
        };
        if cycle == BillingCycle::Anniversary {
            return Ok(None);
        }

        let floor = calendar_period_floor(&self.start, self.period)?;
        let tz = self.start.timezone();
        let floor = tz
            .from_local_datetime(&floor.naive_utc())
            .earliest()
            .unwrap_or_else(|| floor.with_timezone(&tz));

        let first_end =
            next_billing_date(&self.start, anchor, self.unit, self.period, self.end.as_ref())?;
        let full = PeriodRange::new(floor, first_end)?;

        let coefficient = proration_coefficient(&full, &self.start, strategy, customer_tz)?;
        debug!(
            subscription_id = %self.subscription_id,
            %strategy,
            %coefficient,
            "Computed first period proration"
        );
        Ok(Some(coefficient))
    }
}

fn billing_anchor<Tz: TimeZone>(
    start: &DateTime<Tz>,
    cycle: BillingCycle,
    period: BillingPeriod,
) -> CycleResult<DateTime<FixedOffset>> {
    match cycle {
        BillingCycle::Anniversary => Ok(start.fixed_offset()),
        BillingCycle::Calendar => Ok(calendar_billing_anchor(start, period)?.fixed_offset()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
