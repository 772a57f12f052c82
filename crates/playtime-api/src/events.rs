//! Messages exchanged with the host, one JSON object per line

use chrono::{DateTime, Local};
use playtime_util::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Sender, API_VERSION};

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed host message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Empty line")]
    Empty,
}

/// Everything the host tells playtimed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// User joined / became active. May arrive twice for one session.
    BecameActive { user: UserId, name: String },

    /// User left / became inactive. May arrive without a matching join.
    BecameInactive { user: UserId },

    /// Chat command addressed to playtimed
    Command {
        sender: Sender,
        label: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Host is shutting down; flush and exit
    Shutdown,
}

impl HostMessage {
    pub fn from_line(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_str(line)?)
    }
}

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: playtime_util::now(),
            payload,
        }
    }

    /// Serialize as a single NDJSON line (no trailing newline)
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// All possible events from playtimed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// The host should end the user's session with `message`
    LimitExceeded {
        user: UserId,
        max_daily_minutes: u64,
        daily_minutes: u64,
        message: String,
    },

    /// Lines to show to the command sender
    CommandReply { sender: Sender, lines: Vec<String> },

    /// Daily counters were zeroed
    DailyReset { date: String, players_reset: usize },
}
