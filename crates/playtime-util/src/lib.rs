//! Shared utilities for playtimed
//!
//! This crate provides:
//! - ID types (UserId)
//! - Time utilities (mock-aware wall clock, local midnight, playtime formatting)
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
