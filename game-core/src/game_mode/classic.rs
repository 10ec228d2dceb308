//! Last-alive mode: no roles, round ends when at most one player remains
//! effectively in play.

use super::{GameMode, ModeContext, RoundEndOutcome, WinCondition};
use crate::role::RoleKind;
use protocol::PlayerId;

pub struct ClassicMode {
    round_count: u32,
}

impl ClassicMode {
    pub fn new(round_count: u32) -> Self {
        Self { round_count: round_count.max(1) }
    }
}

impl GameMode for ClassicMode {
    fn key(&self) -> &'static str {
        "classic"
    }

    fn display_name(&self) -> &'static str {
        "Classic"
    }

    fn description(&self) -> &'static str {
        "Last player standing wins each round."
    }

    fn use_roles(&self) -> bool {
        false
    }

    fn round_count(&self) -> Option<u32> {
        Some(self.round_count)
    }

    fn round_duration_ms(&self) -> Option<u64> {
        None
    }

    fn role_pool(&self, _registry: &crate::role::RoleRegistry) -> Vec<RoleKind> {
        Vec::new()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use crate::team_manager::TeamManager;

    #[test]
    fn round_ends_at_one_survivor() {
        let mut mode = ClassicMode::new(3);
        let mut a = Player::new(PlayerId::new(), "A".into(), 1, false);
        let mut b = Player::new(PlayerId::new(), "B".into(), 2, false);
        b.is_alive = false;
        a.is_alive = true;
        let team_manager = TeamManager::new(2);
        let players = vec![a, b];
        let ctx = ModeContext { players: &players, team_manager: &team_manager };
        let result = mode.check_win_condition(&ctx, 1, 5_000);
        assert!(result.round_ended);
        assert!(!result.game_ended);
    }
}
