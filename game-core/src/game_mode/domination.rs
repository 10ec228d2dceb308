//! Territorial team mode: no round limit, game ends the instant a team
//! reaches the target score.

use super::{GameMode, ModeContext, ModeOutEvent, RoundEndOutcome, WinCondition};
use crate::base_manager::BaseManager;
use crate::role::RoleKind;
use protocol::TeamId;

pub struct DominationMode {
    target_score: u32,
    control_interval_ms: u64,
    base_manager: BaseManager,
    queued_events: Vec<ModeOutEvent>,
    winner: Option<TeamId>,
}

impl DominationMode {
    pub fn new(target_score: u32, control_interval_ms: u64) -> Self {
        Self {
            target_score,
            control_interval_ms,
            base_manager: BaseManager::new(),
            queued_events: Vec::new(),
            winner: None,
        }
    }
}

impl GameMode for DominationMode {
    fn key(&self) -> &'static str {
        "domination"
    }

    fn display_name(&self) -> &'static str {
        "Domination"
    }

    fn description(&self) -> &'static str {
        "Hold bases to score; first team to the target wins."
    }

    fn use_roles(&self) -> bool {
        false
    }

    fn round_count(&self) -> Option<u32> {
        None
    }

    fn round_duration_ms(&self) -> Option<u64> {
        None
    }

    fn role_pool(&self, _registry: &crate::role::RoleRegistry) -> Vec<RoleKind> {
        Vec::new()
    }

    fn on_tick(&mut self, _ctx: &ModeContext, game_time: u64) {
        for (base_id, team_id) in self.base_manager.tick(game_time, self.control_interval_ms) {
            let total = self.base_manager.team_points(team_id);
            self.queued_events.push(ModeOutEvent::BasePoint { base_id, team_id, total });
            if self.winner.is_none() && total >= self.target_score {
                self.winner = Some(team_id);
                self.queued_events.push(ModeOutEvent::DominationWin { team_id, total });
            }
        }
    }

    fn check_win_condition(&mut self, _ctx: &ModeContext, _current_round: u32, _game_time: u64) -> WinCondition {
        WinCondition {
            round_ended: self.winner.is_some(),
            game_ended: self.winner.is_some(),
        }
    }

    fn on_round_end(&mut self, ctx: &ModeContext, _current_round: u32) -> RoundEndOutcome {
        let deltas = ctx
            .players
            .iter()
            .map(|p| {
                let team_points = ctx
                    .team_manager
                    .team_of(p.id)
                    .map(|team| self.base_manager.team_points(team) as i32)
                    .unwrap_or(0);
                (p.id, team_points)
            })
            .collect();
        let winner_id = self
            .winner
            .and_then(|team| ctx.players.iter().find(|p| ctx.team_manager.team_of(p.id) == Some(team)))
            .map(|p| p.id);
        RoundEndOutcome {
            score_deltas: deltas,
            winner_id,
            game_ended: true,
        }
    }

    fn drain_events(&mut self) -> Vec<ModeOutEvent> {
        std::mem::take(&mut self.queued_events)
    }

    fn base_manager_mut(&mut self) -> Option<&mut BaseManager> {
        Some(&mut self.base_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use crate::team_manager::TeamManager;
    use protocol::PlayerId;

    #[test]
    fn game_ends_when_target_reached() {
        let mut mode = DominationMode::new(2, 1_000);
        let base = mode.base_manager.register("s1".into(), 0);
        mode.base_manager.tap(base, 0, 0);

        let players = vec![Player::new(PlayerId::new(), "A".into(), 1, false)];
        let teams = TeamManager::new(2);
        let ctx = ModeContext { players: &players, team_manager: &teams };

        mode.on_tick(&ctx, 1_000);
        assert!(!mode.check_win_condition(&ctx, 1, 1_000).game_ended);
        mode.on_tick(&ctx, 2_000);
        assert!(mode.check_win_condition(&ctx, 1, 2_000).game_ended);
    }
}
