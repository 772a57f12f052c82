//! Tokio host adapter for playtimed
//!
//! Provides:
//! - [`SystemClock`], the host-local wall clock
//! - [`TokioScheduler`], timers whose firings come back over a channel
//! - [`HostReader`] / [`EventWriter`], the NDJSON host bridge

mod bridge;
mod clock;
mod scheduler;

pub use bridge::*;
pub use clock::*;
pub use scheduler::*;
