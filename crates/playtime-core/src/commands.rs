//! Chat command handling

use playtime_api::{parse_limit_minutes, Command, Permissions, Sender};
use playtime_store::PlayerRecord;
use playtime_util::{format_playtime, UserId};
use tracing::{debug, error, info, warn};

use crate::PlaytimeService;

const PLAYERS_ONLY: &str = "This command can only be used by players.";
const NO_PERMISSION_OTHERS: &str = "You don't have permission to check others' playtime.";
const NO_PERMISSION_LIMIT: &str = "You don't have permission to change the daily playtime limit.";
const PLAYER_NOT_FOUND: &str = "Player not found.";

impl PlaytimeService {
    /// Run a chat command and return the reply lines.
    ///
    /// `None` means the label is not a playtime command.
    pub fn handle_command<S: AsRef<str>>(
        &mut self,
        sender: &Sender,
        label: &str,
        args: &[S],
    ) -> Option<Vec<String>> {
        let command = Command::parse(label, args)?;
        debug!(?command, "Handling command");

        Some(match command {
            Command::ShowOwnPlaytime => self.show_own_playtime(sender),
            Command::ShowPlaytime { name } => self.show_playtime(sender, &name),
            Command::SetDailyLimit { minutes } => self.set_daily_limit(sender, &minutes),
            Command::Usage { usage } => vec![format!("Usage: {}", usage)],
        })
    }

    fn show_own_playtime(&mut self, sender: &Sender) -> Vec<String> {
        let Some(user) = sender.user() else {
            return vec![PLAYERS_ONLY.into()];
        };

        self.refresh(user, self.clock.now_millis());
        let record = self.read_record(user);

        let mut lines = vec!["Your playtime:".to_string()];
        lines.extend(playtime_lines(&record));
        lines
    }

    fn show_playtime(&mut self, sender: &Sender, name: &str) -> Vec<String> {
        if !sender.has(Permissions::VIEW_OTHERS) {
            return vec![NO_PERMISSION_OTHERS.into()];
        }

        let target = match self.counters.find_user_by_name(name) {
            Ok(Some(user)) => user,
            Ok(None) => return vec![PLAYER_NOT_FOUND.into()],
            Err(e) => {
                warn!(name = %name, error = %e, "Player lookup failed");
                return vec![PLAYER_NOT_FOUND.into()];
            }
        };

        self.refresh(target, self.clock.now_millis());
        let record = self.read_record(target);
        let shown = record.display_name.as_deref().unwrap_or(name);

        let mut lines = vec![format!("{}'s playtime:", shown)];
        lines.extend(playtime_lines(&record));
        lines
    }

    fn set_daily_limit(&mut self, sender: &Sender, raw: &str) -> Vec<String> {
        if !sender.has(Permissions::SET_LIMIT) {
            return vec![NO_PERMISSION_LIMIT.into()];
        }

        let minutes = match parse_limit_minutes(raw) {
            Ok(minutes) => minutes,
            Err(e) => return vec![e.to_string()],
        };

        if let Err(e) = self.counters.set_cap(minutes) {
            error!(max_daily_minutes = minutes, error = %e, "Failed to save daily cap");
            return vec!["Failed to save the daily playtime limit.".into()];
        }
        info!(max_daily_minutes = minutes, sender = ?sender, "Daily cap changed by command");

        if minutes == 0 {
            vec!["Daily playtime limit disabled.".into()]
        } else {
            vec![format!("Daily playtime limit set to {} minutes.", minutes)]
        }
    }

    /// Unreadable counters show as zero
    fn read_record(&self, user: UserId) -> PlayerRecord {
        self.counters.record(user).unwrap_or_else(|e| {
            warn!(user = %user, error = %e, "Failed to read playtime");
            PlayerRecord::default()
        })
    }
}

fn playtime_lines(record: &PlayerRecord) -> [String; 2] {
    [
        format!("Today: {}", format_playtime(record.daily_millis)),
        format!("Total: {}", format_playtime(record.total_millis)),
    ]
}
