//! Daily cap enforcement

use playtime_store::CounterStore;
use playtime_util::{millis_to_minutes, UserId};
use tracing::{debug, info, warn};

use crate::{CoreEvent, SessionDelta, SessionLedger};

/// Moves metered time into the counter store and compares the result
/// against the daily cap.
///
/// The enforcer only reports; ending the session is the host's job, and
/// the host's following "became inactive" finds nothing left to credit.
pub struct LimitEnforcer {
    counters: CounterStore,
}

impl LimitEnforcer {
    pub fn new(counters: CounterStore) -> Self {
        Self { counters }
    }

    /// Roll `user`'s meter into the store, then check the cap.
    ///
    /// Does nothing for a user without an active session.
    pub fn check(&self, ledger: &mut SessionLedger, user: UserId, now_ms: i64) -> Option<CoreEvent> {
        let delta = ledger.flush_and_restart(user, now_ms)?;
        self.credit(user, &delta);

        let (daily_millis, cap) = match (self.counters.get_daily(user), self.counters.get_cap()) {
            (Ok(daily), Ok(cap)) => (daily, cap),
            (Err(e), _) | (_, Err(e)) => {
                warn!(user = %user, error = %e, "Failed to read counters for limit check");
                return None;
            }
        };

        let daily_minutes = millis_to_minutes(daily_millis);
        if cap == 0 || daily_minutes < cap {
            debug!(user = %user, daily_minutes, max_daily_minutes = cap, "Within daily limit");
            return None;
        }

        info!(user = %user, daily_minutes, max_daily_minutes = cap, "Daily limit exceeded");
        Some(CoreEvent::LimitExceeded {
            user,
            display_name: delta.display_name,
            max_daily_minutes: cap,
            daily_minutes,
            message: CoreEvent::limit_message(cap),
        })
    }

    /// Add a delta to the durable counters and flush.
    ///
    /// Failures are logged and the delta is lost; the meter has already
    /// moved on by the time this runs.
    pub fn credit(&self, user: UserId, delta: &SessionDelta) {
        let result = self
            .counters
            .add_delta(user, &delta.display_name, delta.millis)
            .and_then(|_| self.counters.flush());

        if let Err(e) = result {
            warn!(
                user = %user,
                delta_ms = delta.millis,
                error = %e,
                "Failed to persist playtime, increment may be lost"
            );
        }
    }
}
