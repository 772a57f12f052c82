//! Key layout of the counter store
//!
//! ```text
//! date                         "2025-12-25"   last date a reset ran for
//! maxDailyPlaytimeMinutes      60             0 = unlimited
//! players.<UserId>.daily       125000         ms played since last reset
//! players.<UserId>.total       987000         ms played ever
//! players.<UserId>.name        "Steve"        last known display name
//! ```

use playtime_util::UserId;

/// Top-level section holding one subsection per user
pub const PLAYERS_SECTION: &str = "players";

const DATE_KEY: &str = "date";
const MAX_DAILY_MINUTES_KEY: &str = "maxDailyPlaytimeMinutes";

/// Per-user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Daily,
    Total,
    Name,
}

impl PlayerField {
    fn as_str(self) -> &'static str {
        match self {
            PlayerField::Daily => "daily",
            PlayerField::Total => "total",
            PlayerField::Name => "name",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(PlayerField::Daily),
            "total" => Some(PlayerField::Total),
            "name" => Some(PlayerField::Name),
            _ => None,
        }
    }
}

/// Typed store key; the only place raw paths are built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Date,
    MaxDailyMinutes,
    Player(UserId, PlayerField),
}

impl StoreKey {
    pub fn daily(user: UserId) -> Self {
        StoreKey::Player(user, PlayerField::Daily)
    }

    pub fn total(user: UserId) -> Self {
        StoreKey::Player(user, PlayerField::Total)
    }

    pub fn name(user: UserId) -> Self {
        StoreKey::Player(user, PlayerField::Name)
    }

    pub fn path(&self) -> String {
        match self {
            StoreKey::Date => DATE_KEY.to_string(),
            StoreKey::MaxDailyMinutes => MAX_DAILY_MINUTES_KEY.to_string(),
            StoreKey::Player(user, field) => {
                format!("{}.{}.{}", PLAYERS_SECTION, user, field.as_str())
            }
        }
    }

    /// Inverse of [`StoreKey::path`]. Unknown or malformed paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        match path {
            DATE_KEY => return Some(StoreKey::Date),
            MAX_DAILY_MINUTES_KEY => return Some(StoreKey::MaxDailyMinutes),
            _ => {}
        }

        let rest = path.strip_prefix(PLAYERS_SECTION)?.strip_prefix('.')?;
        let (user, field) = rest.rsplit_once('.')?;
        Some(StoreKey::Player(user.parse().ok()?, PlayerField::parse(field)?))
    }
}

/// Prefix matching every per-user key
pub fn players_prefix() -> String {
    format!("{}.", PLAYERS_SECTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_key_paths() {
        assert_eq!(StoreKey::Date.path(), "date");
        assert_eq!(StoreKey::MaxDailyMinutes.path(), "maxDailyPlaytimeMinutes");
    }

    #[test]
    fn test_player_key_paths() {
        let user: UserId = "0f8fad5b-d9cb-469f-a165-70867728950e".parse().unwrap();
        assert_eq!(
            StoreKey::daily(user).path(),
            "players.0f8fad5b-d9cb-469f-a165-70867728950e.daily"
        );
        assert_eq!(
            StoreKey::name(user).path(),
            "players.0f8fad5b-d9cb-469f-a165-70867728950e.name"
        );
    }

    #[test]
    fn test_parse_inverts_path() {
        let user = UserId::new();
        for key in [
            StoreKey::Date,
            StoreKey::MaxDailyMinutes,
            StoreKey::daily(user),
            StoreKey::total(user),
            StoreKey::name(user),
        ] {
            assert_eq!(StoreKey::parse(&key.path()), Some(key));
        }
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert_eq!(StoreKey::parse("players"), None);
        assert_eq!(StoreKey::parse("players.not-a-uuid.daily"), None);
        assert_eq!(
            StoreKey::parse("players.0f8fad5b-d9cb-469f-a165-70867728950e.weekly"),
            None
        );
        assert_eq!(StoreKey::parse("playersX.0f8fad5b-d9cb-469f-a165-70867728950e.daily"), None);
    }
}
