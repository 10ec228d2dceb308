//! Between-round ready tracking with a debounced ready-enable delay.
//!
//! Distinct from `ConnectionManager`'s lobby-scoped ready tracking: this one
//! covers both the round-ended and match-finished screens, which share the
//! same "wait a beat, then accept readies" behavior and don't need the
//! lobby's reconnect-grace bookkeeping.

use protocol::PlayerId;
use std::collections::HashMap;

pub const DEFAULT_READY_DELAY_MS: u64 = 2_000;

#[derive(Default)]
pub struct ReadyStateManager {
    ready: HashMap<PlayerId, bool>,
    delay_until: Option<u64>,
}

impl ReadyStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the post-round-end window during which ready input is
    /// rejected. `test_mode` collapses the delay to 0 so integration tests
    /// don't have to simulate wall-clock waits.
    pub fn start_ready_delay(&mut self, now: u64, delay_ms: u64, test_mode: bool) {
        self.ready.clear();
        self.delay_until = Some(if test_mode { now } else { now + delay_ms });
    }

    pub fn is_delay_active(&self, now: u64) -> bool {
        self.delay_until.map(|until| now < until).unwrap_or(false)
    }

    /// Returns `true` if the ready was accepted (emits `player:ready`);
    /// `false` during the delay window, a no-op per the gateway's failure
    /// semantics.
    pub fn set_ready(&mut self, player_id: PlayerId, now: u64) -> bool {
        if self.is_delay_active(now) {
            return false;
        }
        self.ready.insert(player_id, true);
        true
    }

    pub fn is_ready(&self, player_id: PlayerId) -> bool {
        self.ready.get(&player_id).copied().unwrap_or(false)
    }

    pub fn ready_count(&self, connected: &[PlayerId]) -> (u32, u32) {
        let ready = connected.iter().filter(|id| self.is_ready(**id)).count() as u32;
        (ready, connected.len() as u32)
    }

    pub fn all_ready(&self, connected: &[PlayerId]) -> bool {
        !connected.is_empty() && connected.iter().all(|id| self.is_ready(*id))
    }

    pub fn reset(&mut self) {
        self.ready.clear();
        self.delay_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_rejected_during_delay_then_accepted() {
        let mut mgr = ReadyStateManager::new();
        mgr.start_ready_delay(0, DEFAULT_READY_DELAY_MS, false);
        let player = PlayerId::new();

        assert!(!mgr.set_ready(player, 1_000));
        assert!(!mgr.is_ready(player));

        assert!(mgr.set_ready(player, 2_500));
        assert!(mgr.is_ready(player));
    }

    #[test]
    fn test_mode_collapses_delay_to_zero() {
        let mut mgr = ReadyStateManager::new();
        mgr.start_ready_delay(1_000, DEFAULT_READY_DELAY_MS, true);
        assert!(!mgr.is_delay_active(1_000));
    }
}
