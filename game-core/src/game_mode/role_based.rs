//! Role-driven mode: roles hook into death and tick events; win condition
//! still resolves to last-alive, same as classic, since the source leaves
//! "game over" semantics for role modes unspecified beyond the role pool.

use super::{GameMode, ModeContext, RoundEndOutcome, WinCondition};
use crate::role::{RoleKind, RoleRegistry};

pub struct RoleBasedMode {
    round_count: u32,
    theme: String,
}

impl RoleBasedMode {
    pub fn new(round_count: u32, theme: impl Into<String>) -> Self {
        Self {
            round_count: round_count.max(1),
            theme: theme.into(),
        }
    }
}

impl GameMode for RoleBasedMode {
    fn key(&self) -> &'static str {
        "role-based"
    }

    fn display_name(&self) -> &'static str {
        "Role Based"
    }

    fn description(&self) -> &'static str {
        "Themed roles with unique hooks; last alive wins the round."
    }

    fn use_roles(&self) -> bool {
        true
    }

    fn round_count(&self) -> Option<u32> {
        Some(self.round_count)
    }

    fn round_duration_ms(&self) -> Option<u64> {
        None
    }

    fn role_pool(&self, registry: &RoleRegistry) -> Vec<RoleKind> {
        registry.theme_pool(&self.theme)
    }

    fn check_win_condition(&mut self, ctx: &ModeContext, current_round: u32, game_time: u64) -> WinCondition {
        let remaining = ctx.players.iter().filter(|p| !p.is_effectively_out(game_time)).count();
        let round_ended = remaining <= 1;
        WinCondition {
            round_ended,
            game_ended: round_ended && current_round >= self.round_count,
        }
    }

    fn on_round_end(&mut self, ctx: &ModeContext, current_round: u32) -> RoundEndOutcome {
        let winner = ctx.players.iter().find(|p| p.is_alive);
        let deltas = ctx
            .players
            .iter()
            .map(|p| (p.id, if Some(p.id) == winner.map(|w| w.id) { 1 } else { 0 }))
            .collect();
        RoundEndOutcome {
            score_deltas: deltas,
            winner_id: winner.map(|w| w.id),
            game_ended: current_round >= self.round_count,
        }
    }
}
