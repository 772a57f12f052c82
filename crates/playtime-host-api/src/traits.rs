//! Host adapter traits

use chrono::{DateTime, Local, NaiveDate};
use std::time::Duration;

use crate::{TimerId, TimerKind};

/// Source of wall-clock time in the host's local timezone
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64 {
        playtime_util::epoch_millis(&self.now())
    }

    /// Today's local calendar date
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Delay until the next local midnight, at least one millisecond
    fn until_next_midnight(&self) -> Duration {
        playtime_util::duration_until_next_midnight(&self.now())
    }
}

/// Timer primitive of the host.
///
/// Firings are not delivered as callbacks: the host hands a
/// [`TimerFired`](crate::TimerFired) back to the core through the same
/// loop that delivers user events, so timers never interleave with them.
pub trait Scheduler: Send + Sync {
    /// Fire once after `delay`
    fn schedule_once(&self, delay: Duration, kind: TimerKind) -> TimerId;

    /// Fire after `initial_delay`, then every `period`
    fn schedule_repeating(
        &self,
        initial_delay: Duration,
        period: Duration,
        kind: TimerKind,
    ) -> TimerId;

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);
}
