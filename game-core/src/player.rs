//! Per-player runtime state: health, status effects, movement damage,
//! death/respawn, disconnect grace.

use crate::role::{RoleAction, RoleKind, RoleRuntimeState};
use crate::status_effect::{StatusEffect, StatusEffectKind, StatusEffectPayload, StatusEffectRegistry};
use protocol::{PlayerId, PlayerSnapshot};

pub const DEATH_THRESHOLD: f32 = 100.0;
pub const GRACE_PERIOD_MS: u64 = 10_000;

/// Per-role overrides of movement sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub danger_threshold: f32,
    pub damage_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            danger_threshold: 0.6,
            damage_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathOutcome {
    Died,
    Vetoed,
}

pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub number: u32,
    pub socket_id: Option<String>,
    pub is_bot: bool,

    pub role: RoleKind,
    pub role_state: RoleRuntimeState,

    pub is_alive: bool,
    pub accumulated_damage: f32,
    pub toughness: f32,

    pub points: i32,
    pub total_points: i32,
    pub death_count: u32,

    pub status_effects: Vec<StatusEffect>,

    pub disconnected_at: Option<u64>,
    pub is_ready: bool,

    pub movement_config: MovementConfig,

    last_intensity: f32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, number: u32, is_bot: bool) -> Self {
        Self {
            id,
            name,
            number,
            socket_id: None,
            is_bot,
            role: RoleKind::Civilian,
            role_state: RoleRuntimeState::default(),
            is_alive: true,
            accumulated_damage: 0.0,
            toughness: 1.0,
            points: 0,
            total_points: 0,
            death_count: 0,
            status_effects: Vec::new(),
            disconnected_at: None,
            is_ready: false,
            movement_config: MovementConfig::default(),
            last_intensity: 0.0,
        }
    }

    /// Resets round-scoped state ahead of a new round, preserving identity
    /// and `total_points`.
    pub fn reset_for_round(&mut self, role: RoleKind) {
        self.role = role;
        self.role_state = RoleRuntimeState::default();
        self.is_alive = true;
        self.accumulated_damage = 0.0;
        self.points = 0;
        self.death_count = 0;
        self.status_effects.clear();
        self.last_intensity = 0.0;
    }

    pub fn has_effect(&self, kind: StatusEffectKind) -> bool {
        self.status_effects.iter().any(|e| e.kind == kind)
    }

    /// Highest priority first. The policy for duplicate kinds is "latest
    /// replaces earliest", enforced in `apply_effect`, not here.
    pub fn sorted_effects(&self) -> Vec<&StatusEffect> {
        let mut effects: Vec<&StatusEffect> = self.status_effects.iter().collect();
        effects.sort_by(|a, b| b.priority.cmp(&a.priority));
        effects
    }

    pub fn apply_effect(
        &mut self,
        registry: &StatusEffectRegistry,
        kind: StatusEffectKind,
        game_time: u64,
        duration: Option<u64>,
        payload: StatusEffectPayload,
    ) {
        self.status_effects.retain(|e| e.kind != kind);
        self.status_effects
            .push(StatusEffect::new(registry, kind, game_time, duration, payload));
    }

    pub fn clear_effect(&mut self, kind: StatusEffectKind) {
        self.status_effects.retain(|e| e.kind != kind);
    }

    /// Accepts a normalized accelerometer sample; buffered until the next
    /// `on_tick`, matching the ~10Hz sample rate against the 100ms tick.
    pub fn update_movement(&mut self, intensity: f32) {
        self.last_intensity = intensity.clamp(0.0, 1.0);
    }

    /// Runs the assigned role's round-start hook (e.g. the Assassin picking
    /// a target from `other_players`) and applies whatever actions it
    /// returns.
    pub fn on_round_start(
        &mut self,
        registry: &StatusEffectRegistry,
        role_hooks: &dyn crate::role::RoleHooks,
        other_players: &[PlayerId],
        game_time: u64,
    ) {
        for action in role_hooks.on_round_start(&mut self.role_state, game_time, other_players) {
            self.apply_role_action(registry, action, game_time);
        }
    }

    /// Runs effect expiry, regen, and movement damage for one tick. Returns
    /// `Some(DeathOutcome::Died)` the instant this call causes a death, so
    /// the caller (GameEngine) can emit `player:death` and run mode hooks.
    pub fn on_tick(
        &mut self,
        registry: &StatusEffectRegistry,
        role_hooks: &dyn crate::role::RoleHooks,
        game_time: u64,
        delta_time_ms: u64,
    ) -> Option<DeathOutcome> {
        if !self.is_alive {
            return None;
        }

        self.status_effects.retain(|e| !e.is_expired(game_time));

        for action in role_hooks.on_tick(&mut self.role_state, game_time) {
            if matches!(action, RoleAction::Kill) && self.is_alive {
                self.is_alive = false;
                self.death_count += 1;
                for follow_up in role_hooks.on_any_death(&mut self.role_state, true, self.role, game_time) {
                    self.apply_role_action(registry, follow_up, game_time);
                }
                return Some(DeathOutcome::Died);
            }
            self.apply_role_action(registry, action, game_time);
        }

        let winner = self.sorted_effects().first().map(|e| registry.meta(e.kind));
        if let Some(meta) = winner {
            if meta.ignores_movement {
                return None;
            }
        }

        if self.has_effect(StatusEffectKind::Regenerating) {
            self.accumulated_damage = (self.accumulated_damage - 2.0).max(0.0);
        }

        let blocks_damage = winner.map(|m| m.blocks_damage).unwrap_or(false);
        let multiplier = winner.map(|m| m.damage_multiplier).unwrap_or(1.0);

        if !blocks_damage && self.last_intensity > self.movement_config.danger_threshold {
            let excess = self.last_intensity - self.movement_config.danger_threshold;
            let delta_seconds = delta_time_ms as f32 / 1000.0;
            let damage = excess * self.movement_config.damage_multiplier * multiplier * self.toughness.recip() * 40.0 * delta_seconds * 10.0;
            self.accumulated_damage += damage;
        }

        if self.accumulated_damage >= DEATH_THRESHOLD && self.is_alive {
            if role_hooks.before_death(&mut self.role_state, game_time) {
                self.accumulated_damage = DEATH_THRESHOLD - 1.0;
                return Some(DeathOutcome::Vetoed);
            }
            self.is_alive = false;
            self.death_count += 1;
            for action in role_hooks.on_any_death(&mut self.role_state, true, self.role, game_time) {
                self.apply_role_action(registry, action, game_time);
            }
            return Some(DeathOutcome::Died);
        }
        None
    }

    /// Notifies this (still-living) player's role hooks that some other
    /// player died, for effects like BeastHunter's bonus.
    pub fn notify_other_death(
        &mut self,
        registry: &StatusEffectRegistry,
        role_hooks: &dyn crate::role::RoleHooks,
        victim_role: RoleKind,
        game_time: u64,
    ) -> i32 {
        let mut bonus = 0;
        for action in role_hooks.on_any_death(&mut self.role_state, false, victim_role, game_time) {
            if let RoleAction::BonusPoints(points) = action {
                bonus += points;
            } else {
                self.apply_role_action(registry, action, game_time);
            }
        }
        bonus
    }

    fn apply_role_action(&mut self, registry: &StatusEffectRegistry, action: RoleAction, game_time: u64) {
        match action {
            RoleAction::ApplyEffect { kind, duration, payload } => {
                self.apply_effect(registry, kind, game_time, duration, payload)
            }
            RoleAction::ClearEffect(kind) => self.clear_effect(kind),
            RoleAction::Kill => {
                if self.is_alive {
                    self.is_alive = false;
                    self.death_count += 1;
                }
            }
            RoleAction::BonusPoints(points) => self.points += points,
        }
    }

    pub fn set_disconnected(&mut self, game_time: u64) {
        self.disconnected_at = Some(game_time);
    }

    pub fn clear_disconnected(&mut self) {
        self.disconnected_at = None;
    }

    pub fn is_disconnected_beyond_grace(&self, now: u64) -> bool {
        self.disconnected_at
            .map(|at| now.saturating_sub(at) >= GRACE_PERIOD_MS)
            .unwrap_or(false)
    }

    /// Dead OR disconnected beyond grace, per the glossary's "effectively out".
    pub fn is_effectively_out(&self, now: u64) -> bool {
        !self.is_alive || self.is_disconnected_beyond_grace(now)
    }

    pub fn grace_time_remaining(&self, now: u64) -> Option<u64> {
        self.disconnected_at
            .map(|at| GRACE_PERIOD_MS.saturating_sub(now.saturating_sub(at)))
    }

    pub fn snapshot(&self, now: u64) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            number: self.number,
            is_alive: self.is_alive,
            damage: self.accumulated_damage,
            points: self.points,
            toughness: self.toughness,
            death_count: self.death_count,
            is_disconnected: self.disconnected_at.is_some(),
            grace_time_remaining: self.grace_time_remaining(now),
            status_effects: self.status_effects.iter().map(|e| e.kind.wire_name().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleRegistry;

    #[test]
    fn accumulated_damage_past_threshold_kills() {
        let registry = StatusEffectRegistry::new();
        let roles = RoleRegistry::new();
        let mut player = Player::new(PlayerId::new(), "A".into(), 1, false);
        player.update_movement(1.0);
        for t in 0..50 {
            player.on_tick(&registry, roles.hooks(RoleKind::Civilian), t * 100, 100);
        }
        assert!(!player.is_alive);
    }

    #[test]
    fn invulnerability_blocks_all_damage() {
        let registry = StatusEffectRegistry::new();
        let roles = RoleRegistry::new();
        let mut player = Player::new(PlayerId::new(), "A".into(), 1, false);
        player.apply_effect(&registry, StatusEffectKind::Invulnerability, 0, Some(5_000), StatusEffectPayload::default());
        player.update_movement(1.0);
        for t in 0..40 {
            player.on_tick(&registry, roles.hooks(RoleKind::Civilian), t * 100, 100);
        }
        assert!(player.is_alive);
    }

    #[test]
    fn role_kill_action_surfaces_as_a_death() {
        let registry = StatusEffectRegistry::new();
        let roles = RoleRegistry::new();
        let hooks = roles.hooks(RoleKind::Vampire);
        let mut player = Player::new(PlayerId::new(), "V".into(), 1, false);
        player.reset_for_round(RoleKind::Vampire);

        assert!(player.on_tick(&registry, hooks, 30_000, 100).is_none());
        assert!(player.is_alive);

        let outcome = player.on_tick(&registry, hooks, 35_000, 100);
        assert_eq!(outcome, Some(DeathOutcome::Died));
        assert!(!player.is_alive);
        assert_eq!(player.death_count, 1);
    }

    #[test]
    fn grace_window_reported_correctly() {
        let mut player = Player::new(PlayerId::new(), "A".into(), 1, false);
        player.set_disconnected(1_000);
        assert!(!player.is_disconnected_beyond_grace(10_999));
        assert!(player.is_disconnected_beyond_grace(11_000));
    }
}
