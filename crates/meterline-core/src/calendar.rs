//! # Calendar Arithmetic
//!
//! Month/day clamping primitives the period engine is built on.
//!
//! ## The Month-End Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NAIVE MONTH ADDITION                                                   │
//! │                                                                         │
//! │    Jan 31 + 1 month = "Feb 31"  → normalizes to Mar 2/3  ❌ WRONG!      │
//! │                                                                         │
//! │  CLAMPED MONTH ADDITION (this module)                                   │
//! │                                                                         │
//! │    Jan 31 + 1 month → Feb 31 invalid → clamp → Feb 29 (2024)  ✅        │
//! │    Dec 31 + 2 month → Feb 31 invalid → clamp → Feb 28 (2025)  ✅        │
//! │    Feb 29 + 1 year  → Feb 29 invalid → clamp → Feb 28 (2025)  ✅        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Zone Handling
//! All arithmetic happens on the **local** wall clock of the input's zone
//! and the result is re-attached to that same zone. Adding one day across a
//! DST change therefore keeps 09:00 at 09:00, not 08:00 or 10:00.

use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc,
};

use crate::error::{CoreResult, ValidationError};

// =============================================================================
// Month Facts
// =============================================================================

/// Gregorian leap year check.
///
/// ## Example
/// ```rust
/// use meterline_core::calendar::is_leap_year;
///
/// assert!(is_leap_year(2024));
/// assert!(!is_leap_year(2025));
/// assert!(!is_leap_year(1900));
/// assert!(is_leap_year(2000));
/// ```
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`.
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        // Callers normalize first; treat anything else as the shortest month.
        _ => 28,
    }
}

/// Carries a month offset into the year: `(2024, 11) + 3 → (2025, 2)`.
pub(crate) fn shift_year_month(year: i32, month: u32, months: i32) -> Option<(i32, u32)> {
    let total = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(months);
    let new_year = i32::try_from(total.div_euclid(12)).ok()?;
    let new_month = u32::try_from(total.rem_euclid(12) + 1).ok()?;
    Some((new_year, new_month))
}

/// Builds a date with `day` clamped to the last valid day of the month.
pub(crate) fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

/// Adds a signed number of calendar days.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

// =============================================================================
// Zone Re-attachment
// =============================================================================

/// Attaches a local wall-clock date and time to `tz`.
///
/// ## DST Transitions
/// ```text
/// Ambiguous (fall back, 01:30 happens twice) → earliest instant
/// Gap       (spring forward, 02:30 never exists) → pushed past the gap
/// ```
pub(crate) fn at_local<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    time: NaiveTime,
) -> Option<DateTime<Tz>> {
    let local = date.and_time(time);
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => shift_past_gap(tz, local),
    }
}

// Gaps are at most an hour in every zone chrono-tz ships with.
fn shift_past_gap<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
    tz.from_local_datetime(&shifted).earliest()
}

// =============================================================================
// Clamped Date Addition
// =============================================================================

/// Adds years, months and days to a timestamp, clamping the day-of-month.
///
/// ## Order of Operations
/// 1. Years and months are added together, carrying months into the year
/// 2. The starting day is clamped to the last day of the target month
/// 3. `days` is added to the clamped date as plain calendar days
///
/// Clock time (down to the nanosecond) and zone are preserved.
///
/// ## Returns
/// `None` only when the result falls outside chrono's representable range.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use meterline_core::calendar::add_clamped_date;
///
/// let jan_31 = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
/// let got = add_clamped_date(&jan_31, 0, 1, 0).unwrap();
/// assert_eq!(got, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
/// ```
///
/// ## Limitation
/// Negative offsets work but are not used by the period engine; large
/// negative day counts are not a supported use.
pub fn add_clamped_date<Tz: TimeZone>(
    date: &DateTime<Tz>,
    years: i32,
    months: i32,
    days: i64,
) -> Option<DateTime<Tz>> {
    let local = date.naive_local();
    let total_months = years.checked_mul(12)?.checked_add(months)?;
    let (year, month) = shift_year_month(local.year(), local.month(), total_months)?;
    let target = clamped_date(year, month, local.day())?;
    let target = add_days(target, days)?;
    at_local(&date.timezone(), target, local.time())
}

// =============================================================================
// Integer Dates
// =============================================================================

/// Parses a `YYYYMMDD` integer into midnight UTC.
///
/// ## Normalization
/// Out-of-range month and day components roll over instead of failing:
/// ```text
/// 20251301 → 2026-01-01   (month 13)
/// 20250230 → 2025-03-02   (Feb 30)
/// 20250100 → 2024-12-31   (day 0)
/// ```
///
/// ## Errors
/// Negative values are rejected with `InvalidFormat`.
///
/// ## Example
/// ```rust
/// use meterline_core::calendar::parse_yyyymmdd;
///
/// let date = parse_yyyymmdd(Some(20240229)).unwrap().unwrap();
/// assert_eq!(date.to_rfc3339(), "2024-02-29T00:00:00+00:00");
/// assert!(parse_yyyymmdd(None).unwrap().is_none());
/// ```
pub fn parse_yyyymmdd(value: Option<i64>) -> CoreResult<Option<DateTime<Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };

    if value < 0 {
        return Err(ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: format!("expected a non-negative YYYYMMDD integer, got {value}"),
        }
        .into());
    }

    let out_of_range = || ValidationError::OutOfRange {
        field: "date".to_string(),
        min: 0,
        max: 99_991_231,
    };

    let year = i32::try_from(value / 10_000).map_err(|_| out_of_range())?;
    let month = ((value / 100) % 100) as i32;
    let day = value % 100;

    // Month 0 and 13+ carry into the year; day 0 and overflow carry into the month.
    let (year, month) = shift_year_month(year, 1, month - 1).ok_or_else(out_of_range)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let date = add_days(first, day - 1).ok_or_else(out_of_range)?;

    Ok(Some(date.and_time(NaiveTime::MIN).and_utc()))
}

// =============================================================================
// Unit Tests
// =============================================================================
