//! Tokio-backed timers

use playtime_host_api::{Scheduler, TimerFired, TimerId, TimerKind};
use playtime_util::MIN_TIMER_DELAY;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

type TaskMap = HashMap<TimerId, JoinHandle<()>>;

/// Scheduler that sleeps on the tokio runtime and sends each firing down a
/// channel for the service loop to pick up.
///
/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    next_id: AtomicU64,
    tasks: Arc<Mutex<TaskMap>>,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl TokioScheduler {
    /// Create the scheduler and the receiving end of its firings
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Timers armed and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }

    fn next_id(&self) -> TimerId {
        TimerId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

// A panicking timer task cannot leave the map half-updated
fn lock(tasks: &Mutex<TaskMap>) -> MutexGuard<'_, TaskMap> {
    tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, kind: TimerKind) -> TimerId {
        let id = self.next_id();
        let delay = delay.max(MIN_TIMER_DELAY);
        let tx = self.fired_tx.clone();
        let tasks = self.tasks.clone();

        // Held across the spawn so the task cannot remove itself before
        // it has been inserted
        let mut map = lock(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            lock(&tasks).remove(&id);
            trace!(timer = %id, ?kind, "Timer fired");
            let _ = tx.send(TimerFired { id, kind });
        });
        map.insert(id, handle);

        debug!(timer = %id, ?kind, delay_ms = delay.as_millis() as u64, "One-shot timer armed");
        id
    }

    fn schedule_repeating(
        &self,
        initial_delay: Duration,
        period: Duration,
        kind: TimerKind,
    ) -> TimerId {
        let id = self.next_id();
        let period = period.max(MIN_TIMER_DELAY);
        let start = Instant::now() + initial_delay.max(MIN_TIMER_DELAY);
        let tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(TimerFired { id, kind }).is_err() {
                    break;
                }
            }
        });
        lock(&self.tasks).insert(id, handle);

        debug!(timer = %id, ?kind, period_secs = period.as_secs(), "Repeating timer armed");
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = lock(&self.tasks).remove(&id) {
            handle.abort();
            debug!(timer = %id, "Timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in lock(&self.tasks).drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_one_shot_fires_once() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let id = scheduler.schedule_once(Duration::from_millis(10), TimerKind::DailyReset);

        let fired = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(fired, TimerFired { id, kind: TimerKind::DailyReset });

        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_timer_never_fires() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let id = scheduler.schedule_once(Duration::from_millis(50), TimerKind::PeriodicCheck);
        scheduler.cancel(id);
        scheduler.cancel(id);

        assert!(timeout(Duration::from_millis(150), rx.recv()).await.is_err());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_repeating_keeps_firing_until_cancelled() {
        let (scheduler, mut rx) = TokioScheduler::new();
        let id = scheduler.schedule_repeating(
            Duration::from_millis(5),
            Duration::from_millis(10),
            TimerKind::PeriodicCheck,
        );

        for _ in 0..3 {
            let fired = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
            assert_eq!(fired.id, id);
        }
        assert_eq!(scheduler.pending(), 1);

        scheduler.cancel(id);
        // Drain anything sent before the abort landed
        while let Ok(Some(_)) = timeout(Duration::from_millis(30), rx.recv()).await {}
        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (scheduler, _rx) = TokioScheduler::new();
        let a = scheduler.schedule_once(Duration::from_secs(60), TimerKind::DailyReset);
        let b = scheduler.schedule_once(Duration::from_secs(60), TimerKind::DailyReset);
        assert_ne!(a, b);
        assert_eq!(scheduler.pending(), 2);
    }
}
