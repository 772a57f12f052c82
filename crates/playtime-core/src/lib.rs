//! Session accounting and daily reset for playtimed
//!
//! This crate is the heart of playtimed, containing:
//! - The session ledger (active user -> meter start)
//! - The daily reset state machine (Idle -> Armed -> Resetting -> Armed ... -> Stopped)
//! - Daily cap enforcement
//! - Chat command handling
//! - [`PlaytimeService`], the single owner tying them together
//!
//! Nothing here blocks or spawns. Time comes from an injected
//! [`Clock`](playtime_host_api::Clock) and timers come back as
//! [`TimerFired`](playtime_host_api::TimerFired) values through
//! [`PlaytimeService::on_timer`].

mod commands;
mod enforcer;
mod events;
mod ledger;
mod reset;
mod service;

pub use enforcer::*;
pub use events::*;
pub use ledger::*;
pub use reset::*;
pub use service::*;
