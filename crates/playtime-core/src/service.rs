//! The playtime service
//!
//! One owned instance holds every piece of mutable state. The host calls
//! into it one event at a time, so nothing here needs a lock.

use playtime_config::LimitSettings;
use playtime_host_api::{Clock, Scheduler, TimerFired, TimerId, TimerKind};
use playtime_store::{CounterStore, KeyValueStore};
use playtime_util::{date_tag, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{CoreEvent, LimitEnforcer, ResetManager, ResetState, SessionLedger};

pub struct PlaytimeService {
    pub(crate) limits: LimitSettings,
    pub(crate) counters: CounterStore,
    pub(crate) ledger: SessionLedger,
    pub(crate) enforcer: LimitEnforcer,
    reset: ResetManager,
    pub(crate) clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    periodic_timer: Option<TimerId>,
    join_checks: HashMap<TimerId, UserId>,
}

impl PlaytimeService {
    pub fn new(
        limits: LimitSettings,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let counters = CounterStore::new(store);
        let reset = ResetManager::new(counters.clone(), clock.clone(), scheduler.clone());

        Self {
            limits,
            enforcer: LimitEnforcer::new(counters.clone()),
            counters,
            ledger: SessionLedger::new(),
            reset,
            clock,
            scheduler,
            periodic_timer: None,
            join_checks: HashMap::new(),
        }
    }

    /// Seed a fresh store, catch up on a missed reset, arm the timers
    pub fn start(&mut self) -> Vec<CoreEvent> {
        let today = date_tag(self.clock.today());
        if let Err(e) = self
            .counters
            .seed_defaults(&today, self.limits.default_max_daily_minutes)
        {
            warn!(error = %e, "Failed to seed store defaults");
        }

        let events: Vec<CoreEvent> = self.reset.start().into_iter().collect();

        let interval = self.limits.check_interval;
        self.periodic_timer = Some(self.scheduler.schedule_repeating(
            interval,
            interval,
            TimerKind::PeriodicCheck,
        ));

        info!(
            date = %today,
            check_interval_secs = interval.as_secs(),
            max_daily_minutes = self.counters.get_cap().unwrap_or(0),
            "Playtime service started"
        );

        events
    }

    /// User joined. A repeat without a leave in between restarts the meter.
    pub fn on_became_active(&mut self, user: UserId, display_name: &str) {
        let now_ms = self.clock.now_millis();
        self.ledger.begin(user, display_name, now_ms);

        self.cancel_join_check(user);
        let timer = self
            .scheduler
            .schedule_once(self.limits.join_check_delay, TimerKind::JoinCheck(user));
        self.join_checks.insert(timer, user);

        info!(user = %user, name = %display_name, "Session started");
    }

    /// User left. Safe to call for users that were never active.
    pub fn on_became_inactive(&mut self, user: UserId) {
        self.cancel_join_check(user);

        let now_ms = self.clock.now_millis();
        match self.ledger.end(user, now_ms) {
            Some(delta) => {
                self.enforcer.credit(user, &delta);
                info!(user = %user, delta_ms = delta.millis, "Session ended");
            }
            None => debug!(user = %user, "Became inactive without an active session"),
        }
    }

    /// Handle a timer handed back by the host
    pub fn on_timer(&mut self, fired: TimerFired) -> Vec<CoreEvent> {
        match fired.kind {
            TimerKind::DailyReset => {
                if !self.reset.owns(fired.id) {
                    debug!(timer = %fired.id, "Ignoring stale reset timer");
                    return Vec::new();
                }
                // Time before midnight belongs to the day being reset
                self.flush_active_sessions();
                self.reset.on_timer_fired(fired).into_iter().collect()
            }
            TimerKind::PeriodicCheck => {
                if self.periodic_timer != Some(fired.id) {
                    debug!(timer = %fired.id, "Ignoring stale periodic timer");
                    return Vec::new();
                }
                self.check_all()
            }
            TimerKind::JoinCheck(user) => {
                if self.join_checks.remove(&fired.id) != Some(user) {
                    debug!(timer = %fired.id, user = %user, "Ignoring stale join check");
                    return Vec::new();
                }
                let now_ms = self.clock.now_millis();
                self.enforcer
                    .check(&mut self.ledger, user, now_ms)
                    .into_iter()
                    .collect()
            }
        }
    }

    /// Credit every active session, then cancel all timers
    pub fn shutdown(&mut self) {
        let now_ms = self.clock.now_millis();
        let ended = self.ledger.end_all(now_ms);
        for (user, delta) in &ended {
            self.enforcer.credit(*user, delta);
        }
        if let Err(e) = self.counters.flush() {
            error!(error = %e, "Final flush failed");
        }

        if let Some(timer) = self.periodic_timer.take() {
            self.scheduler.cancel(timer);
        }
        for (timer, _) in self.join_checks.drain() {
            self.scheduler.cancel(timer);
        }
        self.reset.stop();

        info!(sessions_flushed = ended.len(), "Playtime service stopped");
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    pub fn reset_state(&self) -> ResetState {
        self.reset.state()
    }

    /// Whether the backing store can still persist writes
    pub fn is_healthy(&self) -> bool {
        self.counters.is_healthy()
    }

    /// Periodic check over every active user, in id order
    fn check_all(&mut self) -> Vec<CoreEvent> {
        let now_ms = self.clock.now_millis();
        let mut users = self.ledger.active_users();
        users.sort();

        debug!(active = users.len(), "Periodic limit check");
        users
            .into_iter()
            .filter_map(|user| self.enforcer.check(&mut self.ledger, user, now_ms))
            .collect()
    }

    fn flush_active_sessions(&mut self) {
        let now_ms = self.clock.now_millis();
        for user in self.ledger.active_users() {
            self.refresh(user, now_ms);
        }
    }

    /// Credit the user's metered time so far without ending the session
    pub(crate) fn refresh(&mut self, user: UserId, now_ms: i64) {
        if let Some(delta) = self.ledger.flush_and_restart(user, now_ms) {
            self.enforcer.credit(user, &delta);
        }
    }

    fn cancel_join_check(&mut self, user: UserId) {
        let stale: Vec<TimerId> = self
            .join_checks
            .iter()
            .filter(|(_, u)| **u == user)
            .map(|(t, _)| *t)
            .collect();
        for timer in stale {
            self.join_checks.remove(&timer);
            self.scheduler.cancel(timer);
        }
    }
}
