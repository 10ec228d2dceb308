//! Per-mode lifecycle of in-round "mode events" (e.g. a speed-shift window
//! that globally alters movement sensitivity for a time).

use serde_json::Value;

/// One dynamic, in-round condition. `shouldActivate`/`shouldDeactivate` are
/// pure predicates over game time so the manager stays a plain value type,
/// easy to drive from tests without mocking a clock.
pub trait GameEvent: Send {
    fn event_type(&self) -> &'static str;
    fn should_activate(&self, game_time: u64) -> bool;
    fn on_start(&mut self, game_time: u64) -> Value;
    fn on_tick(&mut self, game_time: u64);
    fn should_deactivate(&self, game_time: u64) -> bool;
    fn on_end(&mut self, game_time: u64) -> Value;
}

/// Speed-shift: every `period_ms`, for `window_ms`, movement sensitivity
/// roughly doubles (exposed as a multiplier clients can render).
pub struct SpeedShiftEvent {
    period_ms: u64,
    window_ms: u64,
    active: bool,
}

impl SpeedShiftEvent {
    pub fn new(period_ms: u64, window_ms: u64) -> Self {
        Self { period_ms, window_ms, active: false }
    }

    fn in_window(&self, game_time: u64) -> bool {
        game_time % self.period_ms < self.window_ms
    }
}

impl GameEvent for SpeedShiftEvent {
    fn event_type(&self) -> &'static str {
        "speed-shift"
    }

    fn should_activate(&self, game_time: u64) -> bool {
        !self.active && self.in_window(game_time) && game_time >= self.period_ms
    }

    fn on_start(&mut self, _game_time: u64) -> Value {
        self.active = true;
        serde_json::json!({ "sensitivityMultiplier": 2.0 })
    }

    fn on_tick(&mut self, _game_time: u64) {}

    fn should_deactivate(&self, game_time: u64) -> bool {
        self.active && !self.in_window(game_time)
    }

    fn on_end(&mut self, _game_time: u64) -> Value {
        self.active = false;
        serde_json::json!({ "sensitivityMultiplier": 1.0 })
    }
}

pub struct ModeEventFired {
    pub event_type: &'static str,
    pub phase: &'static str,
    pub data: Value,
}

#[derive(Default)]
pub struct GameEventManager {
    events: Vec<Box<dyn GameEvent>>,
}

impl GameEventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event: Box<dyn GameEvent>) {
        self.events.push(event);
    }

    /// Ticks every registered event, returning any start/end transitions
    /// that happened this call, in registration order.
    pub fn tick(&mut self, game_time: u64) -> Vec<ModeEventFired> {
        let mut fired = Vec::new();
        for event in self.events.iter_mut() {
            if event.should_activate(game_time) {
                fired.push(ModeEventFired {
                    event_type: event.event_type(),
                    phase: "start",
                    data: event.on_start(game_time),
                });
            }
            event.on_tick(game_time);
            if event.should_deactivate(game_time) {
                fired.push(ModeEventFired {
                    event_type: event.event_type(),
                    phase: "end",
                    data: event.on_end(game_time),
                });
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_shift_activates_and_deactivates_on_schedule() {
        let mut mgr = GameEventManager::new();
        mgr.register(Box::new(SpeedShiftEvent::new(10_000, 2_000)));

        assert!(mgr.tick(9_999).is_empty());
        let fired = mgr.tick(10_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].phase, "start");

        assert!(mgr.tick(11_000).is_empty());
        let fired = mgr.tick(12_000);
        assert_eq!(fired[0].phase, "end");
    }
}
