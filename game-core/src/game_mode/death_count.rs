//! Timed mode: players respawn after dying; fewer deaths ranks higher.

use super::{rank_by_fewest_deaths, GameMode, ModeContext, RoundEndOutcome, WinCondition};
use crate::role::RoleKind;
use protocol::PlayerId;

pub struct DeathCountMode {
    round_count: u32,
    round_duration_ms: u64,
    respawn_delay_ms: u64,
    pending_respawns: Vec<(PlayerId, u64)>,
}

impl DeathCountMode {
    pub fn new(round_count: u32, round_duration_secs: u32, respawn_delay_secs: u32) -> Self {
        Self {
            round_count: round_count.max(1),
            round_duration_ms: (round_duration_secs.clamp(60, 180) as u64) * 1_000,
            respawn_delay_ms: (respawn_delay_secs as u64) * 1_000,
            pending_respawns: Vec::new(),
        }
    }

    /// Called by the engine right after a death is applied to a player in
    /// this mode, so the respawn clock starts.
    pub fn schedule_respawn(&mut self, player_id: PlayerId, game_time: u64) {
        self.pending_respawns.push((player_id, game_time + self.respawn_delay_ms));
    }
}

impl GameMode for DeathCountMode {
    fn key(&self) -> &'static str {
        "death-count"
    }

    fn display_name(&self) -> &'static str {
        "Death Count"
    }

    fn description(&self) -> &'static str {
        "Timed round; fewest deaths wins."
    }

    fn use_roles(&self) -> bool {
        false
    }

    fn round_count(&self) -> Option<u32> {
        Some(self.round_count)
    }

    fn round_duration_ms(&self) -> Option<u64> {
        Some(self.round_duration_ms)
    }

    fn role_pool(&self, _registry: &crate::role::RoleRegistry) -> Vec<RoleKind> {
        Vec::new()
    }

    fn on_player_death(&mut self, _ctx: &ModeContext, player_id: PlayerId, game_time: u64) {
        self.schedule_respawn(player_id, game_time);
    }

    fn due_respawns(&mut self, game_time: u64) -> Vec<PlayerId> {
        let (due, pending): (Vec<_>, Vec<_>) = self.pending_respawns.drain(..).partition(|(_, at)| *at <= game_time);
        self.pending_respawns = pending;
        due.into_iter().map(|(id, _)| id).collect()
    }

    fn check_win_condition(&mut self, _ctx: &ModeContext, current_round: u32, game_time: u64) -> WinCondition {
        let round_ended = game_time >= self.round_duration_ms;
        WinCondition {
            round_ended,
            game_ended: round_ended && current_round >= self.round_count,
        }
    }

    fn on_round_end(&mut self, ctx: &ModeContext, current_round: u32) -> RoundEndOutcome {
        self.pending_respawns.clear();
        let deltas = rank_by_fewest_deaths(ctx.players);
        let winner = deltas.iter().max_by_key(|(_, score)| *score).map(|(id, _)| *id);
        RoundEndOutcome {
            score_deltas: deltas,
            winner_id: winner,
            game_ended: current_round >= self.round_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawn_fires_only_after_delay() {
        let mut mode = DeathCountMode::new(1, 60, 5);
        let player = PlayerId::new();
        mode.schedule_respawn(player, 1_000);
        assert!(mode.due_respawns(5_999).is_empty());
        assert_eq!(mode.due_respawns(6_000), vec![player]);
    }

    #[test]
    fn round_ends_when_duration_elapses() {
        let mut mode = DeathCountMode::new(1, 60, 5);
        let team_manager = crate::team_manager::TeamManager::new(2);
        let players = Vec::new();
        let ctx = ModeContext { players: &players, team_manager: &team_manager };
        assert!(!mode.check_win_condition(&ctx, 1, 59_999).round_ended);
        assert!(mode.check_win_condition(&ctx, 1, 60_000).round_ended);
    }
}
