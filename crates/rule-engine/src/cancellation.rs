//! Cooperative cancellation checked between rules, never mid-rule (§5, §9).

/// Checked once before each rule application. The default `NeverCancelled`
/// means "run to completion"; a caller wanting to interrupt a long run
/// (e.g. a CLI handling Ctrl-C) supplies its own flag-backed implementation.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationToken for std::sync::atomic::AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(std::sync::atomic::Ordering::Relaxed)
    }
}
