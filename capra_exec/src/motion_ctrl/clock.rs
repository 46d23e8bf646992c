//! Pacing and cancellation of drives

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc
    },
    thread,
    time::Duration
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of the waits between drive ticks.
pub trait Clock {
    /// Block the calling thread for the given duration.
    fn sleep(&self, duration: Duration);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Clock backed by the operating system.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

/// A flag which stops a running drive when set.
///
/// Clones share the same flag, so one clone can be handed to a signal handler or another thread
/// while the controller keeps the other.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst)
    }
}
