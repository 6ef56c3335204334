use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// "At least one occurrence since the last check."
///
/// Raised by exactly one domain, consumed by a single reader through
/// [`EdgeFlag::take`]. Raising an already-raised flag is a no-op, so the flag
/// never counts, and a raise between two checks is never lost.
#[derive(Debug, Default)]
pub struct EdgeFlag {
    raised: AtomicBool,
}

impl EdgeFlag {
    pub fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Convenience for the common case of a flag shared between two owners
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Check-and-clear. Returns true if the flag was raised since the last call.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// Look without clearing (status reporting only)
    pub fn peek(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
