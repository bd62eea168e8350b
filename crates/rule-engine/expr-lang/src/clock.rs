//! Injectable time source for `now()`.
//!
//! The engine itself never calls `chrono::Utc::now()` directly; it always
//! goes through a `Clock` passed in by the caller, so tests can pin time
//! (§9 "Source-language global state / in-process singletons").

pub trait Clock {
    fn now_iso8601(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_iso8601(&self) -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn now_iso8601(&self) -> String {
        self.0.clone()
    }
}
