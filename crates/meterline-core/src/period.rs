//! # Period Advancement
//!
//! Computes where the next billing (or credit grant) period begins.
//!
//! ## Where Boundaries Come From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Next Period Start                                   │
//! │                                                                         │
//! │   current period start ──► year / month / weekday to move FROM          │
//! │   anchor               ──► day-of-month, month, weekday, clock to LAND  │
//! │   unit × PeriodStep    ──► how far to move                              │
//! │                                                                         │
//! │   DAILY      start + unit days            (clock from start)            │
//! │   WEEKLY     → anchor weekday, unit weeks (clock from anchor)           │
//! │   MONTHLY    start.month + unit           day = anchor.day, clamped     │
//! │   QUARTERLY  start.month + unit × 3       day = anchor.day, clamped     │
//! │   HALF_YEARLY start.month + unit × 6      day = anchor.day, clamped     │
//! │   ANNUAL     start.year + unit            month/day = anchor's, clamped │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The anchor day is clamped fresh on every call. An anchor on the 31st
//! lands on Feb 29, then Mar 31, then Apr 30: short months never drag the
//! anchor down permanently.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::calendar::{add_clamped_date, add_days, at_local, clamped_date, shift_year_month};
use crate::error::{CoreError, CoreResult};
use crate::types::{BillingPeriod, CreditGrantPeriod, PeriodStep};
use crate::validation::{validate_period_unit, validate_positive_count};

// =============================================================================
// Generic Advancer
// =============================================================================

/// Advances `start` by `unit` steps, landing on the anchor's boundary.
///
/// The result lives in `start`'s zone. The anchor may live in any zone: only
/// its local date fields and local clock time are read.
///
/// ## Errors
/// - `Validation(MustBePositive)` when `unit <= 0` or a month step is not positive
/// - `DateOutOfRange` when the result cannot be represented
pub fn advance_period<Tz: TimeZone, A: TimeZone>(
    start: &DateTime<Tz>,
    anchor: &DateTime<A>,
    unit: i32,
    step: PeriodStep,
) -> CoreResult<DateTime<Tz>> {
    validate_period_unit(unit)?;
    if let PeriodStep::Months(per_unit) = step {
        validate_positive_count("months per step", per_unit)?;
    }

    let local = start.naive_local();
    let anchor_local = anchor.naive_local();
    let anchor_clock = anchor_local.time();
    let zone = start.timezone();

    let next = match step {
        PeriodStep::Days => add_clamped_date(start, 0, 0, i64::from(unit)),
        PeriodStep::Weeks => {
            let days = weekly_days_to_add(local.date(), anchor_local.date(), unit);
            add_days(local.date(), days).and_then(|date| at_local(&zone, date, anchor_clock))
        }
        PeriodStep::Months(per_unit) => unit
            .checked_mul(per_unit)
            .and_then(|months| shift_year_month(local.year(), local.month(), months))
            .and_then(|(year, month)| clamped_date(year, month, anchor_local.day()))
            .and_then(|date| at_local(&zone, date, anchor_clock)),
        PeriodStep::Years => local
            .year()
            .checked_add(unit)
            // Month forced to the anchor's; Feb 29 clamps to Feb 28 off leap years.
            .and_then(|year| clamped_date(year, anchor_local.month(), anchor_local.day()))
            .and_then(|date| at_local(&zone, date, anchor_clock)),
    };

    next.ok_or_else(|| CoreError::DateOutOfRange {
        operation: format!("advance_period({step:?} x {unit})"),
    })
}

/// Forward distance to the anchor's weekday plus the remaining whole weeks.
///
/// Same weekday means a full `unit` weeks, never zero.
fn weekly_days_to_add(current: NaiveDate, anchor: NaiveDate, unit: i32) -> i64 {
    let from = current.weekday().num_days_from_monday();
    let to = anchor.weekday().num_days_from_monday();
    let forward = (to + 7 - from) % 7;

    if forward == 0 {
        i64::from(unit) * 7
    } else {
        i64::from(forward) + i64::from(unit - 1) * 7
    }
}

// =============================================================================
// Billing Periods
// =============================================================================

/// Computes the start of the next billing period.
///
/// ## Subscription End Cliff
/// ```text
/// start Jan 15, monthly, end Feb 1
///      │
///      ▼
/// natural next = Feb 15 > end  →  returns Feb 1 (period truncated)
/// ```
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use meterline_core::period::next_billing_date;
/// use meterline_core::types::BillingPeriod;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
/// let next = next_billing_date(&start, &start, 1, BillingPeriod::Monthly, None).unwrap();
/// assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
/// ```
pub fn next_billing_date<Tz: TimeZone, A: TimeZone>(
    current_period_start: &DateTime<Tz>,
    billing_anchor: &DateTime<A>,
    unit: i32,
    period: BillingPeriod,
    subscription_end: Option<&DateTime<Tz>>,
) -> CoreResult<DateTime<Tz>> {
    let next = advance_period(
        current_period_start,
        billing_anchor,
        unit,
        PeriodStep::from(period),
    )?;

    match subscription_end {
        Some(end) if next > *end => Ok(end.clone()),
        _ => Ok(next),
    }
}

// =============================================================================
// Credit Grants
// =============================================================================

/// Computes the next disbursement date of a recurring credit grant.
///
/// Same boundary rules as [`next_billing_date`]. Grants are never truncated
/// here; the grant scheduler decides what happens past a subscription end.
pub fn next_credit_grant_date<Tz: TimeZone, A: TimeZone>(
    current_period_start: &DateTime<Tz>,
    credit_grant_anchor: &DateTime<A>,
    unit: i32,
    period: CreditGrantPeriod,
) -> CoreResult<DateTime<Tz>> {
    advance_period(
        current_period_start,
        credit_grant_anchor,
        unit,
        PeriodStep::from(period),
    )
}

// =============================================================================
// Calendar Anchors
// =============================================================================

/// The first calendar boundary strictly after `start`, at 00:00 UTC.
///
/// ```text
/// DAILY        next midnight
/// WEEKLY       next Monday (a Monday start moves a full week)
/// MONTHLY      1st of next month
/// QUARTERLY    1st of next Jan / Apr / Jul / Oct
/// HALF_YEARLY  1st of next Jan / Jul
/// ANNUAL       Jan 1 of next year
/// ```
///
/// Date fields are read from `start`'s local wall clock.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use meterline_core::period::calendar_billing_anchor;
/// use meterline_core::types::BillingPeriod;
///
/// let start = Utc.with_ymd_and_hms(2024, 2, 15, 9, 30, 0).unwrap();
/// let anchor = calendar_billing_anchor(&start, BillingPeriod::Quarterly).unwrap();
/// assert_eq!(anchor, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
/// ```
pub fn calendar_billing_anchor<Tz: TimeZone>(
    start: &DateTime<Tz>,
    period: BillingPeriod,
) -> CoreResult<DateTime<Utc>> {
    let date = start.naive_local().date();

    let boundary = match period {
        BillingPeriod::Daily => add_days(date, 1),
        BillingPeriod::Weekly => {
            let to_monday = 7 - i64::from(date.weekday().num_days_from_monday());
            add_days(date, to_monday)
        }
        BillingPeriod::Monthly => next_month_boundary(date, 1),
        BillingPeriod::Quarterly => next_month_boundary(date, 3),
        BillingPeriod::HalfYearly => next_month_boundary(date, 6),
        BillingPeriod::Annual => date
            .year()
            .checked_add(1)
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
    };

    boundary
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| CoreError::DateOutOfRange {
            operation: format!("calendar_billing_anchor({period})"),
        })
}

// 1st of the next month whose index is a multiple of `block` (Jan-based).
fn next_month_boundary(date: NaiveDate, block: u32) -> Option<NaiveDate> {
    let block_start = (date.month0() / block) * block;
    let months_ahead = i32::try_from(block_start + block - date.month0()).ok()?;
    let (year, month) = shift_year_month(date.year(), date.month(), months_ahead)?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// The calendar boundary at or before `start`, at 00:00 UTC.
///
/// Together with [`calendar_billing_anchor`] it brackets the calendar
/// period `start` falls in:
/// ```text
/// start Feb 15, QUARTERLY   →   floor Jan 1   anchor Apr 1
/// start Apr 1,  QUARTERLY   →   floor Apr 1   anchor Jul 1
/// ```
///
/// Date fields are read from `start`'s local wall clock, as for the anchor.
pub fn calendar_period_floor<Tz: TimeZone>(
    start: &DateTime<Tz>,
    period: BillingPeriod,
) -> CoreResult<DateTime<Utc>> {
    let date = start.naive_local().date();

    let boundary = match period {
        BillingPeriod::Daily => Some(date),
        BillingPeriod::Weekly => {
            add_days(date, -i64::from(date.weekday().num_days_from_monday()))
        }
        BillingPeriod::Monthly => month_block_start(date, 1),
        BillingPeriod::Quarterly => month_block_start(date, 3),
        BillingPeriod::HalfYearly => month_block_start(date, 6),
        BillingPeriod::Annual => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };

    boundary
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| CoreError::DateOutOfRange {
            operation: format!("calendar_period_floor({period})"),
        })
}

fn month_block_start(date: NaiveDate, block: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), (date.month0() / block) * block + 1, 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Weekday};
    use chrono_tz::America::New_York;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn utc_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    // -------------------------------------------------------------------------
    // next_billing_date
    // -------------------------------------------------------------------------

    #[test]
    fn test_monthly_clamps_to_leap_february() {
        let start = utc(2024, 1, 31);
        let got = next_billing_date(&start, &start, 1, BillingPeriod::Monthly, None).unwrap();
        assert_eq!(got, utc(2024, 2, 29));
    }

    #[test]
    fn test_monthly_anchor_day_does_not_drift() {
        let anchor = utc(2024, 1, 31);
        let mut start = anchor;
        let mut seen = Vec::new();
        for _ in 0..4 {
            start = next_billing_date(&start, &anchor, 1, BillingPeriod::Monthly, None).unwrap();
            seen.push(start.day());
        }
        // Feb 29, Mar 31, Apr 30, May 31
        assert_eq!(seen, vec![29, 31, 30, 31]);
    }

    #[test]
    fn test_monthly_clock_comes_from_anchor() {
        let start = utc(2024, 3, 1);
        let anchor = utc_hms(2024, 1, 15, 10, 30, 0);
        let got = next_billing_date(&start, &anchor, 1, BillingPeriod::Monthly, None).unwrap();
        assert_eq!(got, utc_hms(2024, 4, 15, 10, 30, 0));
    }

    #[test]
    fn test_quarterly_and_half_yearly_month_deltas() {
        let start = utc(2024, 11, 30);
        let got = next_billing_date(&start, &start, 1, BillingPeriod::Quarterly, None).unwrap();
        assert_eq!(got, utc(2025, 2, 28));

        let got = next_billing_date(&start, &start, 1, BillingPeriod::HalfYearly, None).unwrap();
        assert_eq!(got, utc(2025, 5, 30));

        let got = next_billing_date(&start, &start, 2, BillingPeriod::HalfYearly, None).unwrap();
        assert_eq!(got, utc(2025, 11, 30));
    }

    #[test]
    fn test_annual_leap_day_clamps() {
        let leap = utc(2024, 2, 29);
        let got = next_billing_date(&leap, &leap, 1, BillingPeriod::Annual, None).unwrap();
        assert_eq!(got, utc(2025, 2, 28));

        let got = next_billing_date(&leap, &leap, 4, BillingPeriod::Annual, None).unwrap();
        assert_eq!(got, utc(2028, 2, 29));
    }

    #[test]
    fn test_annual_forces_anchor_month() {
        // A truncated or migrated start in June still lands on the anchor's month.
        let start = utc(2024, 6, 30);
        let anchor = utc_hms(2023, 3, 15, 8, 0, 0);
        let got = next_billing_date(&start, &anchor, 1, BillingPeriod::Annual, None).unwrap();
        assert_eq!(got, utc_hms(2025, 3, 15, 8, 0, 0));
    }

    #[test]
    fn test_daily_keeps_start_clock() {
        let start = utc_hms(2024, 2, 28, 18, 45, 0);
        let anchor = utc(2024, 1, 1);
        let got = next_billing_date(&start, &anchor, 2, BillingPeriod::Daily, None).unwrap();
        assert_eq!(got, utc_hms(2024, 3, 1, 18, 45, 0));
    }

    #[test]
    fn test_weekly_same_weekday_advances_full_weeks() {
        let monday = utc_hms(2024, 1, 15, 12, 0, 0);
        assert_eq!(monday.weekday(), Weekday::Mon);

        let got = next_billing_date(&monday, &monday, 1, BillingPeriod::Weekly, None).unwrap();
        assert_eq!(got, utc_hms(2024, 1, 22, 12, 0, 0));

        let got = next_billing_date(&monday, &monday, 3, BillingPeriod::Weekly, None).unwrap();
        assert_eq!(got, utc_hms(2024, 2, 5, 12, 0, 0));
    }

    #[test]
    fn test_weekly_moves_to_anchor_weekday() {
        let wednesday = utc_hms(2024, 1, 17, 15, 0, 0);
        let monday_anchor = utc(2024, 1, 1);

        let got =
            next_billing_date(&wednesday, &monday_anchor, 1, BillingPeriod::Weekly, None).unwrap();
        assert_eq!(got, utc(2024, 1, 22));

        let got =
            next_billing_date(&wednesday, &monday_anchor, 2, BillingPeriod::Weekly, None).unwrap();
        assert_eq!(got, utc(2024, 1, 29));
    }

    #[test]
    fn test_rejects_non_positive_unit_for_every_period() {
        let start = utc(2024, 1, 1);
        for period in BillingPeriod::ALL {
            for unit in [0, -1] {
                let err = next_billing_date(&start, &start, unit, period, None).unwrap_err();
                assert!(err.is_validation(), "{period} x {unit}");
            }
        }
        for period in CreditGrantPeriod::ALL {
            assert!(next_credit_grant_date(&start, &start, 0, period).is_err());
        }
    }

    #[test]
    fn test_rejects_non_positive_month_step() {
        let start = utc(2024, 1, 15);
        for per_unit in [0, -1, -6] {
            let err = advance_period(&start, &start, 1, PeriodStep::Months(per_unit)).unwrap_err();
            assert!(err.is_validation(), "Months({per_unit})");
        }
        assert_eq!(
            advance_period(&start, &start, 2, PeriodStep::Months(3)).unwrap(),
            utc(2024, 7, 15)
        );
    }

    #[test]
    fn test_subscription_end_cliff() {
        let start = utc_hms(2024, 1, 15, 12, 0, 0);
        let cases = [
            (BillingPeriod::Monthly, 1, None, utc_hms(2024, 2, 15, 12, 0, 0)),
            (
                BillingPeriod::Monthly,
                1,
                Some(utc(2024, 3, 1)),
                utc_hms(2024, 2, 15, 12, 0, 0),
            ),
            (BillingPeriod::Monthly, 1, Some(utc(2024, 2, 1)), utc(2024, 2, 1)),
            (
                BillingPeriod::Annual,
                1,
                Some(utc_hms(2024, 6, 30, 23, 59, 59)),
                utc_hms(2024, 6, 30, 23, 59, 59),
            ),
            (
                BillingPeriod::Weekly,
                1,
                Some(utc_hms(2024, 1, 18, 10, 0, 0)),
                utc_hms(2024, 1, 18, 10, 0, 0),
            ),
            (
                BillingPeriod::Daily,
                3,
                Some(utc_hms(2024, 1, 17, 6, 0, 0)),
                utc_hms(2024, 1, 17, 6, 0, 0),
            ),
        ];

        for (period, unit, end, want) in cases {
            let got = next_billing_date(&start, &start, unit, period, end.as_ref()).unwrap();
            assert_eq!(got, want, "{period} x {unit} end {end:?}");
        }
    }

    #[test]
    fn test_end_equal_to_next_is_not_a_cliff() {
        let start = utc(2024, 1, 15);
        let end = utc(2024, 2, 15);
        let got = next_billing_date(&start, &start, 1, BillingPeriod::Monthly, Some(&end)).unwrap();
        assert_eq!(got, end);
    }

    #[test]
    fn test_result_stays_in_start_zone() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let start = ist.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let got = next_billing_date(&start, &start, 1, BillingPeriod::Monthly, None).unwrap();
        assert_eq!(got.offset(), start.offset());
        assert_eq!((got.month(), got.day(), got.hour()), (2, 29, 9));
    }

    #[test]
    fn test_weekly_keeps_anchor_clock_across_dst() {
        // US clocks spring forward on 2024-03-10.
        let start = New_York.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let got = next_billing_date(&start, &start, 1, BillingPeriod::Weekly, None).unwrap();
        assert_eq!((got.day(), got.hour()), (11, 9));
        assert_eq!((got - start).num_hours(), 167);
    }

    // -------------------------------------------------------------------------
    // next_credit_grant_date
    // -------------------------------------------------------------------------

    #[test]
    fn test_credit_grant_matches_billing_rules() {
        let pairs = [
            (CreditGrantPeriod::Daily, BillingPeriod::Daily),
            (CreditGrantPeriod::Weekly, BillingPeriod::Weekly),
            (CreditGrantPeriod::Monthly, BillingPeriod::Monthly),
            (CreditGrantPeriod::Quarterly, BillingPeriod::Quarterly),
            (CreditGrantPeriod::HalfYearly, BillingPeriod::HalfYearly),
            (CreditGrantPeriod::Yearly, BillingPeriod::Annual),
        ];
        let start = utc_hms(2024, 2, 29, 6, 0, 0);
        let anchor = utc_hms(2023, 8, 31, 6, 0, 0);

        for (grant, billing) in pairs {
            let via_grant = next_credit_grant_date(&start, &anchor, 2, grant).unwrap();
            let via_billing = next_billing_date(&start, &anchor, 2, billing, None).unwrap();
            assert_eq!(via_grant, via_billing, "{grant}");
        }
    }

    #[test]
    fn test_credit_grant_leap_day() {
        let leap = utc(2024, 2, 29);
        let got = next_credit_grant_date(&leap, &leap, 1, CreditGrantPeriod::Yearly).unwrap();
        assert_eq!(got, utc(2025, 2, 28));
    }

    // -------------------------------------------------------------------------
    // calendar_billing_anchor
    // -------------------------------------------------------------------------

    #[test]
    fn test_calendar_anchor_table() {
        let cases = [
            (utc_hms(2024, 3, 10, 15, 30, 0), BillingPeriod::Daily, utc(2024, 3, 11)),
            (utc_hms(2024, 3, 6, 12, 0, 0), BillingPeriod::Weekly, utc(2024, 3, 11)),
            (utc_hms(2024, 3, 10, 8, 0, 0), BillingPeriod::Weekly, utc(2024, 3, 11)),
            (utc(2024, 1, 15), BillingPeriod::Monthly, utc(2024, 2, 1)),
            (utc(2024, 2, 10), BillingPeriod::Monthly, utc(2024, 3, 1)),
            (utc(2023, 2, 10), BillingPeriod::Monthly, utc(2023, 3, 1)),
            (utc(2025, 5, 1), BillingPeriod::Monthly, utc(2025, 6, 1)),
            (utc(2024, 12, 31), BillingPeriod::Monthly, utc(2025, 1, 1)),
            (utc(2024, 2, 15), BillingPeriod::Quarterly, utc(2024, 4, 1)),
            (utc(2024, 5, 10), BillingPeriod::Quarterly, utc(2024, 7, 1)),
            (utc(2024, 11, 2), BillingPeriod::Quarterly, utc(2025, 1, 1)),
            (utc(2024, 3, 20), BillingPeriod::HalfYearly, utc(2024, 7, 1)),
            (utc(2024, 10, 5), BillingPeriod::HalfYearly, utc(2025, 1, 1)),
            (utc(2024, 5, 10), BillingPeriod::Annual, utc(2025, 1, 1)),
        ];

        for (start, period, want) in cases {
            assert_eq!(
                calendar_billing_anchor(&start, period).unwrap(),
                want,
                "{period} from {start}"
            );
        }
    }

    #[test]
    fn test_calendar_anchor_monday_moves_a_full_week() {
        let monday = utc(2024, 3, 11);
        let got = calendar_billing_anchor(&monday, BillingPeriod::Weekly).unwrap();
        assert_eq!(got, utc(2024, 3, 18));
    }

    #[test]
    fn test_calendar_anchor_on_boundary_is_strictly_forward() {
        let first = utc(2024, 4, 1);
        assert_eq!(
            calendar_billing_anchor(&first, BillingPeriod::Quarterly).unwrap(),
            utc(2024, 7, 1)
        );
        assert_eq!(
            calendar_billing_anchor(&utc(2024, 1, 1), BillingPeriod::Annual).unwrap(),
            utc(2025, 1, 1)
        );
    }

    #[test]
    fn test_calendar_anchor_reads_local_date() {
        // 23:30 on Jan 31 in New York is already Feb 1 in UTC.
        let start = New_York.with_ymd_and_hms(2024, 1, 31, 23, 30, 0).unwrap();
        let got = calendar_billing_anchor(&start, BillingPeriod::Monthly).unwrap();
        assert_eq!(got, utc(2024, 2, 1));
    }

    #[test]
    fn test_calendar_period_floor_table() {
        let cases = [
            (utc_hms(2024, 3, 10, 15, 30, 0), BillingPeriod::Daily, utc(2024, 3, 10)),
            (utc_hms(2024, 3, 13, 12, 0, 0), BillingPeriod::Weekly, utc(2024, 3, 11)),
            (utc(2024, 3, 11), BillingPeriod::Weekly, utc(2024, 3, 11)),
            (utc(2024, 1, 15), BillingPeriod::Monthly, utc(2024, 1, 1)),
            (utc(2024, 2, 15), BillingPeriod::Quarterly, utc(2024, 1, 1)),
            (utc(2024, 4, 1), BillingPeriod::Quarterly, utc(2024, 4, 1)),
            (utc(2024, 11, 2), BillingPeriod::Quarterly, utc(2024, 10, 1)),
            (utc(2024, 10, 5), BillingPeriod::HalfYearly, utc(2024, 7, 1)),
            (utc(2024, 5, 10), BillingPeriod::Annual, utc(2024, 1, 1)),
        ];

        for (start, period, want) in cases {
            assert_eq!(
                calendar_period_floor(&start, period).unwrap(),
                want,
                "{period} from {start}"
            );
        }
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        (2000i32..=2040, 1u32..=12, 1u32..=31, 0u32..24, 0u32..60).prop_map(
            |(year, month, day, hour, minute)| {
                let date = clamped_date(year, month, day).unwrap();
                date.and_hms_opt(hour, minute, 0).unwrap().and_utc()
            },
        )
    }

    fn period_strategy() -> impl Strategy<Value = BillingPeriod> {
        prop::sample::select(BillingPeriod::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_monthly_preserves_anchor_day(
            start in instant_strategy(),
            anchor in instant_strategy(),
            unit in 1i32..=24,
        ) {
            let next =
                next_billing_date(&start, &anchor, unit, BillingPeriod::Monthly, None).unwrap();
            let month_len = crate::calendar::days_in_month(next.year(), next.month());
            let expected = anchor.day().min(month_len);
            prop_assert_eq!(next.day(), expected);
            prop_assert_eq!(next.time(), anchor.time());
        }

        #[test]
        fn prop_next_date_is_deterministic(
            start in instant_strategy(),
            anchor in instant_strategy(),
            unit in 1i32..=12,
            period in period_strategy(),
        ) {
            let first = next_billing_date(&start, &anchor, unit, period, None).unwrap();
            let second = next_billing_date(&start, &anchor, unit, period, None).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_weekly_lands_on_anchor_weekday_and_moves_forward(
            start in instant_strategy(),
            anchor in instant_strategy(),
            unit in 1i32..=8,
        ) {
            let next =
                next_billing_date(&start, &anchor, unit, BillingPeriod::Weekly, None).unwrap();
            prop_assert_eq!(next.weekday(), anchor.weekday());
            prop_assert!(next.date_naive() > start.date_naive());
            let moved = (next.date_naive() - start.date_naive()).num_days();
            prop_assert!(moved <= i64::from(unit) * 7);
        }

        #[test]
        fn prop_calendar_anchor_is_strictly_after_start(
            start in instant_strategy(),
            period in period_strategy(),
        ) {
            let anchor = calendar_billing_anchor(&start, period).unwrap();
            prop_assert!(anchor > start);
            prop_assert_eq!(anchor.time(), NaiveTime::MIN);
        }

        #[test]
        fn prop_calendar_floor_is_at_most_start_and_before_anchor(
            start in instant_strategy(),
            period in period_strategy(),
        ) {
            let floor = calendar_period_floor(&start, period).unwrap();
            let anchor = calendar_billing_anchor(&start, period).unwrap();
            prop_assert!(floor <= start);
            prop_assert!(floor < anchor);
        }
    }
}
