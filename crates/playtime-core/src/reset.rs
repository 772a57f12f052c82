//! Daily reset state machine
//!
//! ```text
//! Idle --start--> [Resetting] --> Armed --timer--> Resetting --> Armed ...
//!                                   \--stop--> Stopped
//! ```
//!
//! Startup goes through `Resetting` only when the stored date differs from
//! today, so any number of missed midnights collapse into one reset.

use playtime_host_api::{Clock, Scheduler, TimerFired, TimerId, TimerKind};
use playtime_store::CounterStore;
use playtime_util::date_tag;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::CoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    /// Not started yet
    Idle,
    /// Waiting for the next local midnight
    Armed { timer: TimerId, delay: Duration },
    /// Zeroing counters; never observable between calls
    Resetting,
    /// Timer cancelled on shutdown
    Stopped,
}

pub struct ResetManager {
    counters: CounterStore,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    state: ResetState,
}

impl ResetManager {
    pub fn new(counters: CounterStore, clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            counters,
            clock,
            scheduler,
            state: ResetState::Idle,
        }
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    /// Whether `timer` is the one this manager is waiting on
    pub fn owns(&self, timer: TimerId) -> bool {
        matches!(self.state, ResetState::Armed { timer: armed, .. } if armed == timer)
    }

    /// Catch up on missed midnights, then arm the timer
    pub fn start(&mut self) -> Option<CoreEvent> {
        if self.state != ResetState::Idle {
            warn!(state = ?self.state, "Reset manager already started");
            return None;
        }

        let event = self.reset_if_due();
        self.arm();
        event
    }

    /// Handle a timer firing. Stale or foreign timers are ignored.
    pub fn on_timer_fired(&mut self, fired: TimerFired) -> Option<CoreEvent> {
        if !self.owns(fired.id) {
            debug!(timer = %fired.id, state = ?self.state, "Ignoring stale reset timer");
            return None;
        }

        let event = self.reset_if_due();
        self.arm();
        event
    }

    /// Cancel the pending timer. Idempotent.
    pub fn stop(&mut self) {
        if let ResetState::Armed { timer, .. } = self.state {
            self.scheduler.cancel(timer);
            debug!(timer = %timer, "Reset timer cancelled");
        }
        self.state = ResetState::Stopped;
    }

    fn reset_if_due(&mut self) -> Option<CoreEvent> {
        let today = date_tag(self.clock.today());

        let stored = match self.counters.get_stored_date_tag() {
            Ok(stored) => stored,
            Err(e) => {
                // Unreadable date: treat as today rather than wiping counters
                warn!(error = %e, "Failed to read stored date");
                Some(today.clone())
            }
        };

        if stored.as_deref() == Some(today.as_str()) {
            // A timer can fire a hair before midnight
            debug!(date = %today, "Date unchanged, no reset");
            return None;
        }

        self.perform_reset(today, stored)
    }

    fn perform_reset(&mut self, today: String, previous: Option<String>) -> Option<CoreEvent> {
        self.state = ResetState::Resetting;

        let players_reset = match self.counters.reset_all_daily() {
            Ok(n) => n,
            Err(e) => {
                // Leave the stored date alone so the next cycle retries
                error!(error = %e, "Failed to reset daily counters");
                return None;
            }
        };

        if let Err(e) = self
            .counters
            .set_stored_date_tag(&today)
            .and_then(|_| self.counters.flush())
        {
            error!(error = %e, "Failed to persist daily reset");
        }

        info!(
            date = %today,
            previous = previous.as_deref().unwrap_or("none"),
            players_reset,
            "Daily playtime reset"
        );

        Some(CoreEvent::DailyReset {
            date: today,
            players_reset,
        })
    }

    /// Delay is recomputed every cycle so DST changes never accumulate
    fn arm(&mut self) {
        let delay = self.clock.until_next_midnight();
        let timer = self.scheduler.schedule_once(delay, TimerKind::DailyReset);
        self.state = ResetState::Armed { timer, delay };
        info!(timer = %timer, delay_secs = delay.as_secs(), "Daily reset armed");
    }
}
