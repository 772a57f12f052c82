//! In-memory ledger of active sessions

use playtime_util::UserId;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct LedgerEntry {
    started_at_ms: i64,
    display_name: String,
}

/// Playtime taken off the meter of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDelta {
    pub millis: u64,
    /// Name the user had when the session began
    pub display_name: String,
}

/// Active user -> session start, in epoch milliseconds.
///
/// Holds no durable state. Everything here is lost on a crash, and a
/// fresh ledger is empty.
#[derive(Debug, Default)]
pub struct SessionLedger {
    active: HashMap<UserId, LedgerEntry>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the meter for `user`.
    ///
    /// A second call without an `end` in between overwrites the start
    /// rather than stacking a second session.
    pub fn begin(&mut self, user: UserId, display_name: &str, now_ms: i64) {
        let previous = self.active.insert(
            user,
            LedgerEntry {
                started_at_ms: now_ms,
                display_name: display_name.to_string(),
            },
        );

        if let Some(previous) = previous {
            debug!(
                user = %user,
                dropped_ms = now_ms.saturating_sub(previous.started_at_ms),
                "Session restarted without end"
            );
        }
    }

    /// Stop the meter. `None` if the user had no active session.
    pub fn end(&mut self, user: UserId, now_ms: i64) -> Option<SessionDelta> {
        let entry = self.active.remove(&user)?;
        Some(SessionDelta {
            millis: elapsed_millis(user, entry.started_at_ms, now_ms),
            display_name: entry.display_name,
        })
    }

    /// Take the elapsed time off the meter and keep the session running
    /// from `now_ms`. `None` (and no new session) if the user is inactive.
    pub fn flush_and_restart(&mut self, user: UserId, now_ms: i64) -> Option<SessionDelta> {
        let entry = self.active.get_mut(&user)?;
        let millis = elapsed_millis(user, entry.started_at_ms, now_ms);
        entry.started_at_ms = now_ms;
        Some(SessionDelta {
            millis,
            display_name: entry.display_name.clone(),
        })
    }

    /// End every session, as for a clean shutdown
    pub fn end_all(&mut self, now_ms: i64) -> Vec<(UserId, SessionDelta)> {
        let mut users = self.active_users();
        users.sort();
        users
            .into_iter()
            .filter_map(|user| self.end(user, now_ms).map(|delta| (user, delta)))
            .collect()
    }

    pub fn is_active(&self, user: UserId) -> bool {
        self.active.contains_key(&user)
    }

    /// Users with a running meter, in no particular order
    pub fn active_users(&self) -> Vec<UserId> {
        self.active.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Wall-clock steps backwards clamp to zero
fn elapsed_millis(user: UserId, started_at_ms: i64, now_ms: i64) -> u64 {
    let elapsed = now_ms.saturating_sub(started_at_ms);
    if elapsed < 0 {
        warn!(user = %user, elapsed_ms = elapsed, "Clock went backwards, crediting nothing");
        return 0;
    }
    elapsed as u64
}
