//! Core events emitted by the service

use playtime_util::UserId;

/// Events emitted by the service for the host to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// User is at or over the daily cap; the host should end their session
    LimitExceeded {
        user: UserId,
        display_name: String,
        max_daily_minutes: u64,
        daily_minutes: u64,
        message: String,
    },

    /// Daily counters were zeroed for `date`
    DailyReset { date: String, players_reset: usize },
}

impl CoreEvent {
    pub fn limit_message(max_daily_minutes: u64) -> String {
        format!(
            "You have reached your daily playtime limit of {} minutes.",
            max_daily_minutes
        )
    }
}
