//! Per-user playtime counters and global limit state

use playtime_util::UserId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{players_prefix, KeyValueStore, StoreKey, StoreResult, StoredValue};

/// Durable counters for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    pub daily_millis: u64,
    pub total_millis: u64,
    pub display_name: Option<String>,
}

/// Typed access to the counter layout on top of a [`KeyValueStore`].
///
/// Missing keys read as their documented defaults: 0 for counters, 0
/// (unlimited) for the cap, `None` for the stored date.
#[derive(Clone)]
pub struct CounterStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CounterStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn get_u64(&self, key: StoreKey) -> StoreResult<u64> {
        Ok(self
            .kv
            .get(&key.path())?
            .and_then(|v| v.as_u64())
            .unwrap_or(0))
    }

    fn set(&self, key: StoreKey, value: impl Into<StoredValue>) -> StoreResult<()> {
        self.kv.set(&key.path(), value.into())
    }

    /// Credit `delta_millis` to both the daily and total counters and record
    /// the user's current display name. Does not flush.
    pub fn add_delta(&self, user: UserId, name: &str, delta_millis: u64) -> StoreResult<PlayerRecord> {
        let daily = self.get_daily(user)?.saturating_add(delta_millis);
        let total = self.get_total(user)?.saturating_add(delta_millis);

        self.set(StoreKey::daily(user), daily)?;
        self.set(StoreKey::total(user), total)?;
        self.set(StoreKey::name(user), name)?;

        debug!(user = %user, delta_ms = delta_millis, daily_ms = daily, total_ms = total, "Playtime credited");

        Ok(PlayerRecord {
            daily_millis: daily,
            total_millis: total,
            display_name: Some(name.to_string()),
        })
    }

    pub fn get_daily(&self, user: UserId) -> StoreResult<u64> {
        self.get_u64(StoreKey::daily(user))
    }

    pub fn get_total(&self, user: UserId) -> StoreResult<u64> {
        self.get_u64(StoreKey::total(user))
    }

    pub fn get_name(&self, user: UserId) -> StoreResult<Option<String>> {
        Ok(self
            .kv
            .get(&StoreKey::name(user).path())?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    pub fn record(&self, user: UserId) -> StoreResult<PlayerRecord> {
        Ok(PlayerRecord {
            daily_millis: self.get_daily(user)?,
            total_millis: self.get_total(user)?,
            display_name: self.get_name(user)?,
        })
    }

    /// Every user with at least one stored field
    pub fn known_users(&self) -> StoreResult<Vec<UserId>> {
        let users: BTreeSet<UserId> = self
            .kv
            .keys_with_prefix(&players_prefix())?
            .iter()
            .filter_map(|path| match StoreKey::parse(path) {
                Some(StoreKey::Player(user, _)) => Some(user),
                _ => {
                    debug!(key = %path, "Ignoring unrecognised player key");
                    None
                }
            })
            .collect();
        Ok(users.into_iter().collect())
    }

    /// Zero the daily counter of every known user. Totals are untouched.
    /// Returns how many users were reset. Does not flush.
    pub fn reset_all_daily(&self) -> StoreResult<usize> {
        let users = self.known_users()?;
        for user in &users {
            self.set(StoreKey::daily(*user), 0u64)?;
        }
        Ok(users.len())
    }

    /// Daily cap in minutes, 0 meaning disabled
    pub fn get_cap(&self) -> StoreResult<u64> {
        self.get_u64(StoreKey::MaxDailyMinutes)
    }

    /// Persist a new daily cap and flush right away
    pub fn set_cap(&self, minutes: u64) -> StoreResult<()> {
        self.set(StoreKey::MaxDailyMinutes, minutes)?;
        self.flush()?;
        info!(max_daily_minutes = minutes, "Daily cap updated");
        Ok(())
    }

    /// Date tag of the last performed reset
    pub fn get_stored_date_tag(&self) -> StoreResult<Option<String>> {
        Ok(self
            .kv
            .get(&StoreKey::Date.path())?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    pub fn set_stored_date_tag(&self, tag: &str) -> StoreResult<()> {
        self.set(StoreKey::Date, tag)
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.kv.flush()
    }

    /// Case-insensitive lookup by last known display name.
    ///
    /// Linear scan over every known user; first match in key order wins.
    pub fn find_user_by_name(&self, name: &str) -> StoreResult<Option<UserId>> {
        let wanted = name.to_lowercase();
        for user in self.known_users()? {
            if let Some(stored) = self.get_name(user)?
                && stored.to_lowercase() == wanted
            {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Write the global keys a fresh store lacks, then flush.
    ///
    /// Existing values are never overwritten.
    pub fn seed_defaults(&self, today_tag: &str, default_cap_minutes: u64) -> StoreResult<()> {
        if self.kv.get(&StoreKey::Date.path())?.is_none() {
            self.set_stored_date_tag(today_tag)?;
            info!(date = %today_tag, "Seeded stored date");
        }
        if self.kv.get(&StoreKey::MaxDailyMinutes.path())?.is_none() {
            self.set(StoreKey::MaxDailyMinutes, default_cap_minutes)?;
            info!(max_daily_minutes = default_cap_minutes, "Seeded daily cap");
        }
        self.flush()
    }

    pub fn is_healthy(&self) -> bool {
        self.kv.is_healthy()
    }
}
