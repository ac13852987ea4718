//! Calendar-date plumbing.
//!
//! Dates in this system are calendar days with no time component. The store
//! persists them as epoch-day integers (days since 1970-01-01, nullable),
//! and reminders fire at the start of the given day in the local timezone.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone};

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i64 = 719_163;

/// Encode a calendar date as days since the Unix epoch.
pub fn to_epoch_day(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_CE_DAYS
}

/// Decode an epoch-day value back into a calendar date.
///
/// Returns None for values outside chrono's representable range.
pub fn from_epoch_day(day: i64) -> Option<NaiveDate> {
    let ce_days = day.checked_add(UNIX_EPOCH_CE_DAYS)?;
    let ce_days = i32::try_from(ce_days).ok()?;
    NaiveDate::from_num_days_from_ce_opt(ce_days)
}

/// The instant a reminder for `date` fires: local midnight of that day.
///
/// On the rare DST transition where local midnight does not exist or is
/// ambiguous, the earliest valid interpretation wins.
pub fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(instant) => instant,
        // Midnight skipped by a DST jump; fall forward with the offset.
        None => Local
            .from_local_datetime(&(midnight + chrono::Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&midnight)),
    }
}
