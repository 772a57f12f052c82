//! Host bridge protocol for playtimed
//!
//! This crate defines the line-oriented contract between playtimed and the
//! host that owns the user lifecycle:
//! - Host messages (became active / became inactive / chat command)
//! - Chat command parsing
//! - Events (limit exceeded, command replies, daily reset)
//! - Versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
