//! Hand-driven clock and scheduler for testing

use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{Clock, Scheduler, TimerFired, TimerId, TimerKind};

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + chrono::Duration::from_std(by).unwrap();
    }

    /// Move backwards, as a wall-clock adjustment would
    pub fn rewind(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now - chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// A timer as recorded by [`ManualScheduler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub id: TimerId,
    pub kind: TimerKind,
    pub delay: Duration,
    pub period: Option<Duration>,
}

/// Scheduler that records timers and fires them only on request
#[derive(Default)]
pub struct ManualScheduler {
    next_id: AtomicU64,
    timers: Mutex<Vec<ScheduledTimer>>,
    cancelled: Mutex<Vec<TimerId>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&self, delay: Duration, period: Option<Duration>, kind: TimerKind) -> TimerId {
        let id = TimerId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.timers.lock().unwrap().push(ScheduledTimer {
            id,
            kind,
            delay,
            period,
        });
        id
    }

    /// Timers armed and not yet fired (one-shot) or cancelled
    pub fn active(&self) -> Vec<ScheduledTimer> {
        self.timers.lock().unwrap().clone()
    }

    /// First active timer of the given kind
    pub fn find(&self, kind: TimerKind) -> Option<ScheduledTimer> {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.kind == kind)
            .cloned()
    }

    /// Number of active timers of the given kind
    pub fn count(&self, kind: TimerKind) -> usize {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.kind == kind)
            .count()
    }

    /// Ids passed to `cancel`, in order
    pub fn cancelled(&self) -> Vec<TimerId> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Fire a timer. One-shot timers are removed; repeating ones stay armed.
    pub fn fire(&self, id: TimerId) -> Option<TimerFired> {
        let mut timers = self.timers.lock().unwrap();
        let pos = timers.iter().position(|t| t.id == id)?;
        let timer = if timers[pos].period.is_some() {
            timers[pos].clone()
        } else {
            timers.remove(pos)
        };
        Some(TimerFired {
            id: timer.id,
            kind: timer.kind,
        })
    }

    /// Fire the first active timer of the given kind
    pub fn fire_kind(&self, kind: TimerKind) -> Option<TimerFired> {
        let id = self.find(kind)?.id;
        self.fire(id)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, kind: TimerKind) -> TimerId {
        self.arm(delay, None, kind)
    }

    fn schedule_repeating(
        &self,
        initial_delay: Duration,
        period: Duration,
        kind: TimerKind,
    ) -> TimerId {
        self.arm(initial_delay, Some(period), kind)
    }

    fn cancel(&self, id: TimerId) {
        self.timers.lock().unwrap().retain(|t| t.id != id);
        self.cancelled.lock().unwrap().push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use playtime_util::UserId;

    #[test]
    fn test_manual_clock_advances() {
        let start = Local.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::from_millis(125_000));
        assert_eq!(clock.now_millis() - start.timestamp_millis(), 125_000);
    }

    #[test]
    fn test_manual_clock_midnight_delay() {
        let clock = ManualClock::new(Local.with_ymd_and_hms(2025, 6, 15, 23, 0, 0).unwrap());
        assert_eq!(clock.until_next_midnight(), Duration::from_secs(3600));
    }

    #[test]
    fn test_one_shot_is_removed_when_fired() {
        let scheduler = ManualScheduler::new();
        let id = scheduler.schedule_once(Duration::from_secs(1), TimerKind::DailyReset);

        let fired = scheduler.fire(id).unwrap();
        assert_eq!(fired.kind, TimerKind::DailyReset);
        assert!(scheduler.fire(id).is_none());
    }

    #[test]
    fn test_repeating_stays_armed() {
        let scheduler = ManualScheduler::new();
        let period = Duration::from_secs(60);
        let id = scheduler.schedule_repeating(period, period, TimerKind::PeriodicCheck);

        assert!(scheduler.fire(id).is_some());
        assert!(scheduler.fire(id).is_some());
        assert_eq!(scheduler.count(TimerKind::PeriodicCheck), 1);
    }

    #[test]
    fn test_cancel_disarms() {
        let scheduler = ManualScheduler::new();
        let user = UserId::new();
        let id = scheduler.schedule_once(Duration::from_secs(1), TimerKind::JoinCheck(user));

        scheduler.cancel(id);

        assert!(scheduler.find(TimerKind::JoinCheck(user)).is_none());
        assert_eq!(scheduler.cancelled(), vec![id]);
    }
}
