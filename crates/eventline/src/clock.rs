use chrono::Utc;

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64,
{
    fn now_millis(&self) -> i64 {
        self()
    }
}
