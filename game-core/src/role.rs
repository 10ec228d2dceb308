//! Named behaviour packages attached to a player for one round.
//!
//! Like `StatusEffectRegistry`, roles are a fixed enumerated set with a
//! behaviour table rather than a class hierarchy: the engine calls
//! `hooks[role_kind].on_tick(...)` and applies whatever `RoleAction`s come
//! back, instead of dispatching through a dynamically named subclass.

use crate::status_effect::{StatusEffectKind, StatusEffectPayload};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Civilian,
    Vampire,
    Angel,
    Beast,
    BeastHunter,
    Assassin,
}

#[derive(Debug, Clone, Copy)]
pub struct RoleMeta {
    pub priority: i32,
    pub display_name: &'static str,
    pub description: &'static str,
    pub difficulty: &'static str,
}

/// Mutable per-player role bookkeeping the engine threads through hook calls.
/// Lives on `Player`, reset fresh every round by `assign_roles_for_round`.
#[derive(Debug, Clone, Default)]
pub struct RoleRuntimeState {
    pub bloodlust_active: bool,
    pub bloodlust_started_at: Option<u64>,
    pub death_seen_since_bloodlust: bool,
    pub invulnerability_used: bool,
    pub target: Option<protocol::PlayerId>,
}

/// A side effect a role hook wants applied to its own player. The engine
/// (not the role) is the one that actually mutates `Player`/emits events.
#[derive(Debug, Clone)]
pub enum RoleAction {
    ApplyEffect {
        kind: StatusEffectKind,
        duration: Option<u64>,
        payload: StatusEffectPayload,
    },
    ClearEffect(StatusEffectKind),
    Kill,
    BonusPoints(i32),
}

pub trait RoleHooks: Send + Sync {
    fn meta(&self) -> RoleMeta;

    /// `other_players` excludes the hook's own player; used by roles that
    /// assign a per-round target (e.g. Assassin).
    fn on_round_start(&self, _state: &mut RoleRuntimeState, _game_time: u64, _other_players: &[protocol::PlayerId]) -> Vec<RoleAction> {
        Vec::new()
    }

    fn on_tick(&self, _state: &mut RoleRuntimeState, _game_time: u64) -> Vec<RoleAction> {
        Vec::new()
    }

    /// Called once when accumulated damage first crosses the death
    /// threshold. Returning `true` vetoes the death (consumes the veto).
    fn before_death(&self, _state: &mut RoleRuntimeState, _game_time: u64) -> bool {
        false
    }

    /// Called for every living role-holder whenever any player dies,
    /// including themself (`victim_is_self`).
    fn on_any_death(
        &self,
        _state: &mut RoleRuntimeState,
        _victim_is_self: bool,
        _victim_role: RoleKind,
        _game_time: u64,
    ) -> Vec<RoleAction> {
        Vec::new()
    }
}

struct Civilian;
impl RoleHooks for Civilian {
    fn meta(&self) -> RoleMeta {
        RoleMeta {
            priority: 0,
            display_name: "Civilian",
            description: "No special ability.",
            difficulty: "easy",
        }
    }
}

/// Every 30s of round time, enters bloodlust for 5s. If no player dies while
/// bloodlust is active, the vampire self-destructs.
struct Vampire;
const VAMPIRE_CYCLE_MS: u64 = 30_000;
const VAMPIRE_WINDOW_MS: u64 = 5_000;
impl RoleHooks for Vampire {
    fn meta(&self) -> RoleMeta {
        RoleMeta {
            priority: 50,
            display_name: "Vampire",
            description: "Every 30s enters bloodlust; must cause a death within 5s or perish.",
            difficulty: "hard",
        }
    }

    fn on_tick(&self, state: &mut RoleRuntimeState, game_time: u64) -> Vec<RoleAction> {
        let mut actions = Vec::new();
        if !state.bloodlust_active {
            let cycle_start = (game_time / VAMPIRE_CYCLE_MS) * VAMPIRE_CYCLE_MS;
            if game_time >= cycle_start && game_time - cycle_start < 50 && game_time >= VAMPIRE_CYCLE_MS {
                state.bloodlust_active = true;
                state.bloodlust_started_at = Some(game_time);
                state.death_seen_since_bloodlust = false;
                actions.push(RoleAction::ApplyEffect {
                    kind: StatusEffectKind::Bloodlust,
                    duration: Some(VAMPIRE_WINDOW_MS),
                    payload: StatusEffectPayload::default(),
                });
            }
        } else if let Some(started) = state.bloodlust_started_at {
            if game_time - started >= VAMPIRE_WINDOW_MS {
                if !state.death_seen_since_bloodlust {
                    actions.push(RoleAction::Kill);
                }
                state.bloodlust_active = false;
                state.bloodlust_started_at = None;
            }
        }
        actions
    }

    fn on_any_death(
        &self,
        state: &mut RoleRuntimeState,
        victim_is_self: bool,
        _victim_role: RoleKind,
        _game_time: u64,
    ) -> Vec<RoleAction> {
        if state.bloodlust_active && !victim_is_self {
            state.death_seen_since_bloodlust = true;
        }
        Vec::new()
    }
}

/// Consumes the first death that would kill it as an invulnerability window
/// instead.
struct Angel;
impl RoleHooks for Angel {
    fn meta(&self) -> RoleMeta {
        RoleMeta {
            priority: 40,
            display_name: "Angel",
            description: "Survives the first killing blow of the round.",
            difficulty: "medium",
        }
    }

    fn before_death(&self, state: &mut RoleRuntimeState, _game_time: u64) -> bool {
        if state.invulnerability_used {
            false
        } else {
            state.invulnerability_used = true;
            true
        }
    }
}

struct Beast;
impl RoleHooks for Beast {
    fn meta(&self) -> RoleMeta {
        RoleMeta {
            priority: 20,
            display_name: "Beast",
            description: "A hunted target worth bonus points when killed.",
            difficulty: "easy",
        }
    }
}

/// Earns bonus points when the Beast dies.
struct BeastHunter;
impl RoleHooks for BeastHunter {
    fn meta(&self) -> RoleMeta {
        RoleMeta {
            priority: 30,
            display_name: "Beast Hunter",
            description: "Earns bonus points for killing the Beast.",
            difficulty: "medium",
        }
    }

    fn on_any_death(
        &self,
        _state: &mut RoleRuntimeState,
        victim_is_self: bool,
        victim_role: RoleKind,
        _game_time: u64,
    ) -> Vec<RoleAction> {
        if !victim_is_self && victim_role == RoleKind::Beast {
            vec![RoleAction::BonusPoints(2)]
        } else {
            Vec::new()
        }
    }
}

/// Assigned a random target among the other living players at round start,
/// recorded on `RoleRuntimeState::target` and surfaced to the client via
/// `role:assigned`'s `target_number`/`target_name` fields.
struct Assassin;
impl RoleHooks for Assassin {
    fn meta(&self) -> RoleMeta {
        RoleMeta {
            priority: 30,
            display_name: "Assassin",
            description: "Has a single assigned target for the round.",
            difficulty: "hard",
        }
    }

    fn on_round_start(&self, state: &mut RoleRuntimeState, _game_time: u64, other_players: &[protocol::PlayerId]) -> Vec<RoleAction> {
        state.target = other_players.choose(&mut rand::thread_rng()).copied();
        Vec::new()
    }
}

/// Holds the fixed set of role classes keyed by kind, plus themed pools.
pub struct RoleRegistry {
    hooks: HashMap<RoleKind, Box<dyn RoleHooks>>,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleRegistry {
    pub fn new() -> Self {
        let mut hooks: HashMap<RoleKind, Box<dyn RoleHooks>> = HashMap::new();
        hooks.insert(RoleKind::Civilian, Box::new(Civilian));
        hooks.insert(RoleKind::Vampire, Box::new(Vampire));
        hooks.insert(RoleKind::Angel, Box::new(Angel));
        hooks.insert(RoleKind::Beast, Box::new(Beast));
        hooks.insert(RoleKind::BeastHunter, Box::new(BeastHunter));
        hooks.insert(RoleKind::Assassin, Box::new(Assassin));
        Self { hooks }
    }

    pub fn hooks(&self, kind: RoleKind) -> &dyn RoleHooks {
        self.hooks[&kind].as_ref()
    }

    /// Themed role pools used by the role-based game mode.
    pub fn theme_pool(&self, theme: &str) -> Vec<RoleKind> {
        match theme {
            "halloween" => vec![RoleKind::Vampire, RoleKind::Angel, RoleKind::Civilian],
            "mafia" => vec![RoleKind::Assassin, RoleKind::Civilian, RoleKind::Civilian],
            "fantasy" => vec![RoleKind::BeastHunter, RoleKind::Beast, RoleKind::Civilian],
            "sci-fi" => vec![RoleKind::Assassin, RoleKind::Vampire, RoleKind::Civilian],
            _ => vec![RoleKind::Civilian, RoleKind::Vampire, RoleKind::Angel],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vampire_self_destructs_without_a_death() {
        let vampire = Vampire;
        let mut state = RoleRuntimeState::default();
        let actions = vampire.on_tick(&mut state, VAMPIRE_CYCLE_MS);
        assert!(state.bloodlust_active);
        assert!(matches!(actions.first(), Some(RoleAction::ApplyEffect { .. })));

        let actions = vampire.on_tick(&mut state, VAMPIRE_CYCLE_MS + VAMPIRE_WINDOW_MS);
        assert!(matches!(actions.first(), Some(RoleAction::Kill)));
    }

    #[test]
    fn vampire_survives_if_a_death_happens_during_bloodlust() {
        let vampire = Vampire;
        let mut state = RoleRuntimeState::default();
        vampire.on_tick(&mut state, VAMPIRE_CYCLE_MS);
        vampire.on_any_death(&mut state, false, RoleKind::Civilian, VAMPIRE_CYCLE_MS + 1_000);
        let actions = vampire.on_tick(&mut state, VAMPIRE_CYCLE_MS + VAMPIRE_WINDOW_MS);
        assert!(actions.is_empty());
    }

    #[test]
    fn angel_vetoes_exactly_once() {
        let angel = Angel;
        let mut state = RoleRuntimeState::default();
        assert!(angel.before_death(&mut state, 0));
        assert!(!angel.before_death(&mut state, 0));
    }

    #[test]
    fn assassin_targets_one_of_the_other_players() {
        let assassin = Assassin;
        let mut state = RoleRuntimeState::default();
        let others = vec![protocol::PlayerId::new(), protocol::PlayerId::new()];
        assassin.on_round_start(&mut state, 0, &others);
        assert!(state.target.is_some());
        assert!(others.contains(&state.target.unwrap()));
    }

    #[test]
    fn assassin_has_no_target_when_alone() {
        let assassin = Assassin;
        let mut state = RoleRuntimeState::default();
        assassin.on_round_start(&mut state, 0, &[]);
        assert!(state.target.is_none());
    }
}
