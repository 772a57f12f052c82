//! Wall clock

use chrono::{DateTime, Local};
use playtime_host_api::Clock;

/// Host-local wall clock. Honours `PLAYTIME_MOCK_TIME` in debug builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        playtime_util::now()
    }
}
