//! # Credit Grant Scheduling
//!
//! Lists the disbursements a recurring credit grant owes up to a point in
//! time, each with its expiry.
//!
//! ```text
//! anchor Jan 31, MONTHLY, stop Apr 15, now May 1
//!
//!   Jan 31 ✓   Feb 29 ✓   Mar 31 ✓   Apr 30 ✗ (not before stop)
//! ```

use chrono::{DateTime, TimeZone};
use tracing::{debug, warn};

use meterline_core::validation::validate_period_unit;
use meterline_core::{
    next_credit_grant_date, CreditGrantExpiry, CreditGrantPeriod, PeriodRange,
    DEFAULT_MAX_CATCH_UP_PERIODS,
};

use crate::error::{CycleError, CycleResult};
use crate::schedule::SubscriptionSchedule;

/// One disbursement of a recurring grant.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledGrant<Tz: TimeZone> {
    pub granted_at: DateTime<Tz>,

    /// `None` for grants that never expire.
    pub expires_at: Option<DateTime<Tz>>,
}

/// Grants produced by one [`CreditGrantSchedule::grants_through`] run.
#[derive(Debug, Clone)]
pub struct GrantRun<Tz: TimeZone> {
    pub grants: Vec<ScheduledGrant<Tz>>,

    /// Listing stopped at the catch-up cap with grants still owed.
    pub limit_reached: bool,
}

/// Cadence and expiry of a recurring credit grant.
#[derive(Debug, Clone)]
pub struct CreditGrantSchedule<Tz: TimeZone> {
    grant_id: String,
    anchor: DateTime<Tz>,
    period: CreditGrantPeriod,
    unit: i32,
    expiry: CreditGrantExpiry,
    stop: Option<DateTime<Tz>>,
    billing: Option<SubscriptionSchedule<Tz>>,
    max_grants: u32,
}

impl<Tz: TimeZone> CreditGrantSchedule<Tz> {
    /// A grant with its own anchor and no subscription attached.
    ///
    /// ## Errors
    /// - `unit <= 0` or a non-positive expiry duration
    /// - `BillingCycle` expiry, which needs [`Self::for_subscription`]
    pub fn new(
        grant_id: impl Into<String>,
        anchor: DateTime<Tz>,
        period: CreditGrantPeriod,
        unit: i32,
        expiry: CreditGrantExpiry,
    ) -> CycleResult<Self> {
        if expiry == CreditGrantExpiry::BillingCycle {
            return Err(CycleError::InvalidConfig(
                "BILLING_CYCLE expiry requires a subscription schedule".to_string(),
            ));
        }
        Self::build(grant_id.into(), anchor, period, unit, expiry, None, None)
    }

    /// A grant anchored at the subscription start and stopped at its end.
    pub fn for_subscription(
        grant_id: impl Into<String>,
        subscription: &SubscriptionSchedule<Tz>,
        period: CreditGrantPeriod,
        unit: i32,
        expiry: CreditGrantExpiry,
    ) -> CycleResult<Self> {
        let schedule = Self::build(
            grant_id.into(),
            subscription.start().clone(),
            period,
            unit,
            expiry,
            subscription.end().cloned(),
            Some(subscription.clone()),
        )?;
        Ok(schedule.with_catch_up_limit(subscription.max_catch_up_periods()))
    }

    fn build(
        grant_id: String,
        anchor: DateTime<Tz>,
        period: CreditGrantPeriod,
        unit: i32,
        expiry: CreditGrantExpiry,
        stop: Option<DateTime<Tz>>,
        billing: Option<SubscriptionSchedule<Tz>>,
    ) -> CycleResult<Self> {
        validate_period_unit(unit)?;
        expiry.validate()?;

        Ok(CreditGrantSchedule {
            grant_id,
            anchor,
            period,
            unit,
            expiry,
            stop,
            billing,
            max_grants: DEFAULT_MAX_CATCH_UP_PERIODS,
        })
    }

    /// No grant is issued at or after `stop`.
    pub fn until(mut self, stop: DateTime<Tz>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_catch_up_limit(mut self, limit: u32) -> Self {
        self.max_grants = limit;
        self
    }

    pub fn grant_id(&self) -> &str {
        &self.grant_id
    }

    pub fn anchor(&self) -> &DateTime<Tz> {
        &self.anchor
    }

    pub fn expiry(&self) -> CreditGrantExpiry {
        self.expiry
    }

    /// Every grant date from the anchor up to and including `now`.
    ///
    /// `BILLING_CYCLE` expiries step one billing period cursor forward
    /// alongside the grant dates.
    pub fn grants_through(&self, now: &DateTime<Tz>) -> CycleResult<GrantRun<Tz>> {
        let mut grants = Vec::new();
        let mut issued: u32 = 0;
        let mut limit_reached = false;
        let mut at = self.anchor.clone();
        let mut billing_cursor: Option<PeriodRange<Tz>> = None;

        while at <= *now && self.before_stop(&at) {
            if issued >= self.max_grants {
                limit_reached = true;
                warn!(
                    grant_id = %self.grant_id,
                    limit = self.max_grants,
                    "Credit grant listing stopped at catch-up limit"
                );
                break;
            }

            let expires_at = self.expiry_for(&at, &mut billing_cursor)?;
            grants.push(ScheduledGrant {
                granted_at: at.clone(),
                expires_at,
            });
            issued += 1;

            at = next_credit_grant_date(&at, &self.anchor, self.unit, self.period)?;
        }

        debug!(
            grant_id = %self.grant_id,
            period = %self.period,
            issued,
            "Listed credit grants"
        );
        Ok(GrantRun {
            grants,
            limit_reached,
        })
    }

    fn before_stop(&self, at: &DateTime<Tz>) -> bool {
        self.stop.as_ref().map_or(true, |stop| at < stop)
    }

    fn expiry_for(
        &self,
        granted_at: &DateTime<Tz>,
        billing_cursor: &mut Option<PeriodRange<Tz>>,
    ) -> CycleResult<Option<DateTime<Tz>>> {
        let period_end = match (&self.expiry, &self.billing) {
            (CreditGrantExpiry::BillingCycle, Some(billing)) => {
                billing_period_end(billing, billing_cursor, granted_at)?
            }
            (CreditGrantExpiry::BillingCycle, None) => {
                return Err(CycleError::InvalidConfig(
                    "BILLING_CYCLE expiry requires a subscription schedule".to_string(),
                ));
            }
            // Only BILLING_CYCLE reads the period end.
            _ => granted_at.clone(),
        };
        Ok(self.expiry.expiry_date(granted_at, &period_end)?)
    }
}

// End of the billing period holding `at`. Calls must come with `at` non-decreasing.
fn billing_period_end<Tz: TimeZone>(
    billing: &SubscriptionSchedule<Tz>,
    cursor: &mut Option<PeriodRange<Tz>>,
    at: &DateTime<Tz>,
) -> CycleResult<DateTime<Tz>> {
    let mut period = match cursor.take() {
        Some(period) => period,
        None => billing.period_containing(at)?,
    };
    while period.end() <= at {
        match billing.next_period(&period)? {
            Some(next) => period = next,
            None => break,
        }
    }

    let end = period.end().clone();
    *cursor = Some(period);
    Ok(end)
}

// =============================================================================
// Unit Tests
// =============================================================================
