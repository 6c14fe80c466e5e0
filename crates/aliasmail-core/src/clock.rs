//! Wall-clock access.

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Current time (epoch millis).
    fn now_millis(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Current system time in epoch millis.
#[must_use]
pub fn now_millis() -> i64 {
    SystemClock.now_millis()
}
