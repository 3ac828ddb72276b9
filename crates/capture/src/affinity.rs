//! Render-thread ownership check.
//!
//! GPU handles are only meaningful on the thread that owns the graphics
//! context. Using them elsewhere is undefined driver behavior rather than
//! a clean error, so every GPU-touching call checks first.

use framelight_core::error::CaptureError;
use std::thread::{self, ThreadId};

/// Records the thread that owns a graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    owner: ThreadId,
}

impl ThreadAffinity {
    /// Binds to the calling thread.
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    /// Returns `true` when called from the owning thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Fails with `WrongThread` unless called from the owning thread.
    pub fn check(&self, operation: &'static str) -> Result<(), CaptureError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(CaptureError::WrongThread { operation })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_thread_passes() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_current());
        affinity.check("update").unwrap();
    }

    #[test]
    fn other_thread_is_rejected() {
        let affinity = ThreadAffinity::current();
        let result = thread::spawn(move || affinity.check("setup")).join().unwrap();
        assert!(matches!(
            result,
            Err(CaptureError::WrongThread { operation: "setup" })
        ));
    }
}
