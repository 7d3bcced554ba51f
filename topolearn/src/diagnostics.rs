//! One-time warnings for conditions that are recoverable but worth a
//! developer's attention once per instance (§7 `IndexOutOfRange`,
//! `DegenerateVpSplit`).

use std::sync::atomic::{AtomicBool, Ordering};

/// A warning that fires at most once, then goes silent for the life of the
/// flag it is given.
pub struct WarnOnce(AtomicBool);

impl WarnOnce {
    /// A fresh, unfired flag
    pub const fn new() -> WarnOnce {
        WarnOnce(AtomicBool::new(false))
    }

    /// Print `message` to stderr the first time this is called; a no-op on
    /// every call after that
    pub fn warn(&self, message: &str) {
        if !self.0.swap(true, Ordering::Relaxed) {
            eprintln!("{}", message);
        }
    }
}

impl Default for WarnOnce {
    fn default() -> Self {
        WarnOnce::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_once() {
        let w = WarnOnce::new();
        assert!(!w.0.load(Ordering::Relaxed));
        w.warn("first");
        assert!(w.0.load(Ordering::Relaxed));
        w.warn("second");
    }
}
