use std::sync::Mutex;

use chrono::Duration;
use models::DateTimeWithTimeZone;

/// Source of "now" for deadline checks and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTimeWithTimeZone;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTimeWithTimeZone { models::utc_now() }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTimeWithTimeZone>,
}

impl ManualClock {
    pub fn new(start: DateTimeWithTimeZone) -> Self { Self { now: Mutex::new(start) } }

    pub fn starting_now() -> Self { Self::new(models::utc_now()) }

    pub fn set(&self, t: DateTimeWithTimeZone) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = t;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTimeWithTimeZone {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}
