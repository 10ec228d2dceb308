//! Explicit time source for the logger and other components that want to
//! stamp entries with the current round's game time.
//!
//! The source model stamped log lines via a global `gameEngine` reference;
//! here the dependency is passed in explicitly (REDESIGN FLAGS item).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait TimeSource: Send + Sync {
    /// Milliseconds since the current round started, or since process start
    /// while no round is active.
    fn now_ms(&self) -> u64;
}

/// A `TimeSource` backed by an atomic counter the engine advances each tick.
/// Cheap to clone (shares the counter) and trivial to drive from tests.
#[derive(Clone, Default)]
pub struct TickClock {
    ms: Arc<AtomicU64>,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.ms.store(ms, Ordering::Relaxed);
    }

    pub fn advance(&self, delta_ms: u64) -> u64 {
        self.ms.fetch_add(delta_ms, Ordering::Relaxed) + delta_ms
    }
}

impl TimeSource for TickClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::Relaxed)
    }
}
