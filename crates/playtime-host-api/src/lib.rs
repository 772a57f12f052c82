//! Host adapter trait interfaces for playtimed
//!
//! This crate defines the clock and timer seams between the playtime core
//! and whatever drives it. It contains no runtime code itself; the tokio
//! implementation lives in `playtime-host-tokio`, and a hand-driven clock
//! and scheduler for tests live in [`mock`](crate::ManualScheduler).

mod mock;
mod timer;
mod traits;

pub use mock::*;
pub use timer::*;
pub use traits::*;
