//! Strategy per game variant: win condition, score calculation, role pool,
//! round duration, per-tick behaviour.
//!
//! All variants implement the same `GameMode` trait — construct, arrival
//! hook, per-tick hook, drained outward events — rather than an open class
//! hierarchy dispatched by name.

mod classic;
mod death_count;
mod domination;
mod role_based;

pub use classic::ClassicMode;
pub use death_count::DeathCountMode;
pub use domination::DominationMode;
pub use role_based::RoleBasedMode;

use crate::base_manager::BaseManager;
use crate::player::Player;
use crate::role::RoleKind;
use crate::team_manager::TeamManager;
use protocol::PlayerId;

#[derive(Debug, Clone, Copy, Default)]
pub struct WinCondition {
    pub round_ended: bool,
    pub game_ended: bool,
}

/// What `onRoundEnd` distributed: the score a round contributed to each
/// player's `points`/`totalPoints`, plus the round's winner if any. The
/// engine (not the mode) applies these deltas, so the "no points created or
/// destroyed elsewhere" invariant has one enforcement point.
#[derive(Debug, Clone, Default)]
pub struct RoundEndOutcome {
    pub score_deltas: Vec<(PlayerId, i32)>,
    pub winner_id: Option<PlayerId>,
    pub game_ended: bool,
}

/// Out-of-band notifications a mode wants emitted that don't fit the
/// engine's own per-tick event set (base captures, domination win, …).
#[derive(Debug, Clone)]
pub enum ModeOutEvent {
    BaseCaptured { base_id: protocol::BaseId, base_number: u32, team_id: protocol::TeamId },
    BasePoint { base_id: protocol::BaseId, team_id: protocol::TeamId, total: u32 },
    DominationWin { team_id: protocol::TeamId, total: u32 },
}

/// Read-only view handed to most hooks; mode-owned managers (team/base) are
/// borrowed mutably only where a hook needs to mutate them.
pub struct ModeContext<'a> {
    pub players: &'a [Player],
    pub team_manager: &'a TeamManager,
}

pub trait GameMode: Send {
    fn key(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn use_roles(&self) -> bool;
    fn round_count(&self) -> Option<u32>;
    fn round_duration_ms(&self) -> Option<u64>;
    fn role_pool(&self, registry: &crate::role::RoleRegistry) -> Vec<RoleKind>;

    fn on_mode_selected(&mut self) {}
    fn on_round_start(&mut self, _ctx: &ModeContext, _round_number: u32) {}
    fn on_tick(&mut self, _ctx: &ModeContext, _game_time: u64) {}
    fn on_player_move(&mut self, _ctx: &ModeContext, _player_id: PlayerId) {}
    fn on_player_death(&mut self, _ctx: &ModeContext, _player_id: PlayerId, _game_time: u64) {}

    fn check_win_condition(&mut self, ctx: &ModeContext, current_round: u32, game_time: u64) -> WinCondition;
    fn on_round_end(&mut self, ctx: &ModeContext, current_round: u32) -> RoundEndOutcome;
    fn on_game_end(&mut self, _ctx: &ModeContext) {}

    /// Player ids due to respawn this tick (death-count mode only).
    fn due_respawns(&mut self, _game_time: u64) -> Vec<PlayerId> {
        Vec::new()
    }

    /// Drains any queued out-of-band notifications (domination base events).
    fn drain_events(&mut self) -> Vec<ModeOutEvent> {
        Vec::new()
    }

    /// Base manager for modes that register physical base devices.
    fn base_manager_mut(&mut self) -> Option<&mut BaseManager> {
        None
    }
}

/// Ranks players by ascending death count (fewer deaths = better rank) and
/// assigns `len - rank` points to each, used by classic and death-count.
pub(crate) fn rank_by_fewest_deaths(players: &[Player]) -> Vec<(PlayerId, i32)> {
    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by_key(|p| p.death_count);
    let n = ranked.len() as i32;
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p.id, n - i as i32))
        .collect()
}

/// Static catalogue for `GET /api/game/modes`; throwaway instances are
/// enough since `key`/`display_name`/`description` don't depend on settings.
pub fn available_modes() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        {
            let m = ClassicMode::new(1);
            (m.key(), m.display_name(), m.description())
        },
        {
            let m = DeathCountMode::new(1, 90, 5);
            (m.key(), m.display_name(), m.description())
        },
        {
            let m = RoleBasedMode::new(1, "standard");
            (m.key(), m.display_name(), m.description())
        },
        {
            let m = DominationMode::new(10, 5_000);
            (m.key(), m.display_name(), m.description())
        },
    ]
}

/// Builds a boxed mode from its wire key and the currently persisted
/// settings; the single place that knows how a `SettingsPatch`'s fields map
/// onto each mode's constructor.
pub fn build_mode(
    key: &str,
    theme: &str,
    settings: &crate::settings::Settings,
) -> Result<Box<dyn GameMode>, crate::error::EngineError> {
    match key {
        "classic" => Ok(Box::new(ClassicMode::new(settings.round_count))),
        "death-count" => Ok(Box::new(DeathCountMode::new(
            settings.round_count,
            settings.round_duration_secs,
            settings.death_count_respawn_secs,
        ))),
        "role-based" => Ok(Box::new(RoleBasedMode::new(settings.round_count, theme))),
        "domination" => Ok(Box::new(DominationMode::new(
            settings.domination_point_target,
            settings.domination_control_interval_ms as u64,
        ))),
        other => Err(crate::error::EngineError::UnknownMode(other.to_string())),
    }
}
