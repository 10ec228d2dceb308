//! Time-bounded, priority-ordered modifiers on a player.
//!
//! Concrete effects are a fixed, enumerated set rather than an open class
//! hierarchy — the engine calls `registry.meta(kind)` to look up behaviour
//! instead of dispatching through a dynamic name, per the "class inheritance
//! for roles and status effects" redesign note.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectKind {
    Invulnerability,
    Bloodlust,
    Toughened,
    Stunned,
    Regenerating,
    Berserker,
}

impl StatusEffectKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            StatusEffectKind::Invulnerability => "invulnerability",
            StatusEffectKind::Bloodlust => "bloodlust",
            StatusEffectKind::Toughened => "toughened",
            StatusEffectKind::Stunned => "stunned",
            StatusEffectKind::Regenerating => "regenerating",
            StatusEffectKind::Berserker => "berserker",
        }
    }
}

/// Static behaviour table entry for one effect kind.
#[derive(Debug, Clone, Copy)]
pub struct StatusEffectMeta {
    pub priority: i32,
    pub display_name: &'static str,
    /// When present (highest-priority wins among simultaneous effects), no
    /// movement damage is applied at all.
    pub blocks_damage: bool,
    /// Movement samples are ignored entirely while present.
    pub ignores_movement: bool,
    /// Multiplies incoming movement damage (Toughened < 1.0, Berserker inverts
    /// the usual direction and instead amplifies damage the player *deals*,
    /// tracked by the mode rather than here).
    pub damage_multiplier: f32,
}

/// Holds the fixed set of effect classes keyed by kind.
pub struct StatusEffectRegistry {
    metas: HashMap<StatusEffectKind, StatusEffectMeta>,
}

impl Default for StatusEffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEffectRegistry {
    pub fn new() -> Self {
        let mut metas = HashMap::new();
        metas.insert(
            StatusEffectKind::Invulnerability,
            StatusEffectMeta {
                priority: 100,
                display_name: "Invulnerable",
                blocks_damage: true,
                ignores_movement: false,
                damage_multiplier: 0.0,
            },
        );
        metas.insert(
            StatusEffectKind::Stunned,
            StatusEffectMeta {
                priority: 90,
                display_name: "Stunned",
                blocks_damage: false,
                ignores_movement: true,
                damage_multiplier: 1.0,
            },
        );
        metas.insert(
            StatusEffectKind::Toughened,
            StatusEffectMeta {
                priority: 50,
                display_name: "Toughened",
                blocks_damage: false,
                ignores_movement: false,
                damage_multiplier: 0.5,
            },
        );
        metas.insert(
            StatusEffectKind::Berserker,
            StatusEffectMeta {
                priority: 40,
                display_name: "Berserker",
                blocks_damage: false,
                ignores_movement: false,
                damage_multiplier: 1.5,
            },
        );
        metas.insert(
            StatusEffectKind::Bloodlust,
            StatusEffectMeta {
                priority: 30,
                display_name: "Bloodlust",
                blocks_damage: false,
                ignores_movement: false,
                damage_multiplier: 1.0,
            },
        );
        metas.insert(
            StatusEffectKind::Regenerating,
            StatusEffectMeta {
                priority: 10,
                display_name: "Regenerating",
                blocks_damage: false,
                ignores_movement: false,
                damage_multiplier: 1.0,
            },
        );
        Self { metas }
    }

    pub fn meta(&self, kind: StatusEffectKind) -> StatusEffectMeta {
        self.metas[&kind]
    }
}

/// Effect-specific data that doesn't belong in the shared metadata table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEffectPayload {
    /// Regenerating: health healed per tick.
    pub regen_per_tick: f32,
}

/// A live effect instance on a player.
#[derive(Debug, Clone)]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    pub priority: i32,
    pub applied_at: u64,
    pub duration: Option<u64>,
    pub payload: StatusEffectPayload,
}

impl StatusEffect {
    pub fn new(
        registry: &StatusEffectRegistry,
        kind: StatusEffectKind,
        applied_at: u64,
        duration: Option<u64>,
        payload: StatusEffectPayload,
    ) -> Self {
        Self {
            kind,
            priority: registry.meta(kind).priority,
            applied_at,
            duration,
            payload,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.duration
            .map(|d| self.applied_at + d <= now)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_at_applied_plus_duration() {
        let reg = StatusEffectRegistry::new();
        let e = StatusEffect::new(
            &reg,
            StatusEffectKind::Stunned,
            1_000,
            Some(500),
            StatusEffectPayload::default(),
        );
        assert!(!e.is_expired(1_499));
        assert!(e.is_expired(1_500));
    }

    #[test]
    fn indefinite_duration_never_expires() {
        let reg = StatusEffectRegistry::new();
        let e = StatusEffect::new(
            &reg,
            StatusEffectKind::Regenerating,
            0,
            None,
            StatusEffectPayload::default(),
        );
        assert!(!e.is_expired(u64::MAX));
    }
}
