//! Chat command types for playtimed

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A recognised playtime command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// `/playtime` - the sender's own playtime
    ShowOwnPlaytime,

    /// `/playtime <name>` - another user's playtime
    ShowPlaytime { name: String },

    /// `/playLimit set <minutes>` - change the daily cap
    SetDailyLimit { minutes: String },

    /// Known label, wrong arguments
    Usage { usage: String },
}

const PLAYTIME_USAGE: &str = "/playtime [player]";
const LIMIT_USAGE: &str = "/playLimit set <minutes>";

impl Command {
    /// Parse a chat command label and its arguments.
    ///
    /// Labels are case-insensitive and accept the short aliases `pt` and
    /// `pl`. Returns `None` for labels that are not ours.
    pub fn parse<S: AsRef<str>>(label: &str, args: &[S]) -> Option<Self> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();

        if label.eq_ignore_ascii_case("playtime") || label.eq_ignore_ascii_case("pt") {
            return Some(match args.as_slice() {
                [] => Command::ShowOwnPlaytime,
                [name] => Command::ShowPlaytime {
                    name: name.to_string(),
                },
                _ => Command::Usage {
                    usage: PLAYTIME_USAGE.into(),
                },
            });
        }

        if label.eq_ignore_ascii_case("playlimit") || label.eq_ignore_ascii_case("pl") {
            return Some(match args.as_slice() {
                [action, minutes] if action.eq_ignore_ascii_case("set") => {
                    Command::SetDailyLimit {
                        minutes: minutes.to_string(),
                    }
                }
                _ => Command::Usage {
                    usage: LIMIT_USAGE.into(),
                },
            });
        }

        None
    }
}

/// Rejected cap value; the message is shown to the sender verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitInputError {
    #[error("Please enter a valid number of minutes.")]
    NotANumber,

    #[error("Time limit cannot be negative.")]
    Negative,
}

/// Parse a cap argument in whole minutes; `0` disables the cap
pub fn parse_limit_minutes(raw: &str) -> Result<u64, LimitInputError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| LimitInputError::NotANumber)?;
    u64::try_from(value).map_err(|_| LimitInputError::Negative)
}
