//! Time utilities for playtimed
//!
//! Session accounting works on wall-clock epoch milliseconds; the daily
//! reset works on the host-local calendar. Both read the clock through
//! [`now`] so a debug build can be pinned to an arbitrary date.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PLAYTIME_MOCK_TIME` environment variable can be set
//! to override the system time. The mock clock keeps ticking at real speed
//! from the given instant, which makes it easy to watch a reset fire by
//! starting a few seconds before midnight.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 23:59:30`)
//!
//! Example:
//! ```bash
//! PLAYTIME_MOCK_TIME="2025-12-25 23:59:30" cargo run -p playtimed
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PLAYTIME_MOCK_TIME";

/// Format of the persisted date tag (`date` key in the store)
pub const DATE_TAG_FORMAT: &str = "%Y-%m-%d";

/// Smallest delay ever handed to a one-shot timer
pub const MIN_TIMER_DELAY: Duration = Duration::from_millis(1);

const MILLIS_PER_MINUTE: u64 = 60 * 1000;

/// Offset between mock time and real time, computed once per process.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S")
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = "%Y-%m-%d %H:%M:%S",
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.signed_duration_since(chrono::Local::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Milliseconds since the Unix epoch for a wall-clock instant.
pub fn epoch_millis<Tz: TimeZone>(dt: &DateTime<Tz>) -> i64 {
    dt.timestamp_millis()
}

/// Calendar date tag used for the stored reset date, e.g. `2025-12-25`.
pub fn date_tag(date: NaiveDate) -> String {
    date.format(DATE_TAG_FORMAT).to_string()
}

/// The first instant of `date` in `tz`.
///
/// Midnight does not exist on days where a DST jump happens at 00:00; in
/// that case the earliest valid local time of the day is returned.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let mut naive = date.and_time(NaiveTime::MIN);
    for _ in 0..(24 * 4) {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return dt;
        }
        naive = naive + chrono::Duration::minutes(15);
    }
    tz.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The next local midnight strictly after `now`.
pub fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    match now.date_naive().succ_opt() {
        Some(tomorrow) => start_of_day(tomorrow, &now.timezone()),
        None => now.clone() + chrono::Duration::days(1),
    }
}

/// Delay from `now` until the next local midnight, never below
/// [`MIN_TIMER_DELAY`].
///
/// Recomputed from the calendar every time, so a 23h or 25h day around a
/// DST change yields the right delay.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let until = next_midnight(now) - now.clone();
    until.to_std().unwrap_or(Duration::ZERO).max(MIN_TIMER_DELAY)
}

/// Whole minutes in a millisecond count; partial minutes are dropped.
pub fn millis_to_minutes(millis: u64) -> u64 {
    millis / MILLIS_PER_MINUTE
}

/// Format accumulated playtime as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_playtime(millis: u64) -> String {
    let total_secs = millis / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
