//! Shared types for the playtimed API

use bitflags::bitflags;
use playtime_util::UserId;
use serde::{Deserialize, Serialize};

/// Permission node for viewing another user's playtime
pub const PERMISSION_OTHERS: &str = "playtime.others";

/// Permission node for changing the daily cap
pub const PERMISSION_ADMIN: &str = "playtime.admin";

bitflags! {
    /// Permissions relevant to playtime commands
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u8 {
        const VIEW_OTHERS = 1 << 0;
        const SET_LIMIT = 1 << 1;
    }
}

impl Permissions {
    /// Map host permission nodes to flags; unknown nodes are ignored
    pub fn from_nodes<S: AsRef<str>>(nodes: &[S]) -> Self {
        nodes.iter().fold(Permissions::empty(), |acc, node| {
            match node.as_ref() {
                PERMISSION_OTHERS => acc | Permissions::VIEW_OTHERS,
                PERMISSION_ADMIN => acc | Permissions::SET_LIMIT,
                _ => acc,
            }
        })
    }
}

/// Who issued a chat command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sender {
    /// Server console; holds every permission
    Console,
    /// An in-game user
    Player {
        user: UserId,
        name: String,
        /// Permission nodes granted by the host, e.g. `playtime.admin`
        #[serde(default)]
        permissions: Vec<String>,
    },
}

impl Sender {
    pub fn permissions(&self) -> Permissions {
        match self {
            Sender::Console => Permissions::all(),
            Sender::Player { permissions, .. } => Permissions::from_nodes(permissions),
        }
    }

    pub fn has(&self, permission: Permissions) -> bool {
        self.permissions().contains(permission)
    }

    pub fn user(&self) -> Option<UserId> {
        match self {
            Sender::Console => None,
            Sender::Player { user, .. } => Some(*user),
        }
    }
}
