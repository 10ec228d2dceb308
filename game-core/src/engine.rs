//! Central orchestrator: owns the tick loop, state machine, players, and
//! delegation to the mode/managers.
//!
//! Deliberately synchronous and free of any async runtime dependency — the
//! `server` crate drives it from a single dedicated task via
//! `tokio::time::interval`, funneling every external mutation through an
//! `EngineCommand` channel into that task. That keeps this module trivially
//! unit-testable: a test calls `tick()` directly with an explicit
//! `delta_ms`, taking its step explicitly instead of reading a clock.

use crate::countdown::CountdownManager;
use crate::game_event_manager::{GameEventManager, SpeedShiftEvent};
use crate::game_mode::{GameMode, ModeContext, ModeOutEvent};
use crate::player::{DeathOutcome, Player};
use crate::ready_state::{ReadyStateManager, DEFAULT_READY_DELAY_MS};
use crate::role::RoleRegistry;
use crate::status_effect::StatusEffectRegistry;
use crate::team_manager::TeamManager;
use crate::EngineError;
use protocol::{PlayerId, PlayerSnapshot, ScoreLine, ServerMessage, TeamId};
use std::sync::Arc;

pub const DEFAULT_TICK_RATE_MS: u64 = 100;
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

/// Every round, a speed-shift window doubles movement sensitivity for
/// `SPEED_SHIFT_WINDOW_MS` out of every `SPEED_SHIFT_PERIOD_MS`.
const SPEED_SHIFT_PERIOD_MS: u64 = 45_000;
const SPEED_SHIFT_WINDOW_MS: u64 = 8_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Waiting,
    PreGame,
    Countdown,
    Active,
    RoundEnded,
    Finished,
}

impl GameState {
    pub fn wire_name(self) -> &'static str {
        match self {
            GameState::Waiting => "waiting",
            GameState::PreGame => "pre-game",
            GameState::Countdown => "countdown",
            GameState::Active => "active",
            GameState::RoundEnded => "round-ended",
            GameState::Finished => "finished",
        }
    }
}

pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub number: u32,
    pub is_bot: bool,
}

pub struct GameEngine {
    state: GameState,
    players: Vec<Player>,
    current_round: u32,
    game_time: u64,
    tick_rate_ms: u64,
    test_mode: bool,

    mode: Option<Box<dyn GameMode>>,
    last_mode_key: Option<String>,
    last_final_scores: Vec<ScoreLine>,

    team_manager: TeamManager,
    role_registry: Arc<RoleRegistry>,
    status_registry: Arc<StatusEffectRegistry>,
    event_manager: GameEventManager,
    ready_state: ReadyStateManager,
    countdown: CountdownManager,
    countdown_duration_secs: u32,
    countdown_accum_ms: u64,
}

impl GameEngine {
    pub fn new(
        role_registry: Arc<RoleRegistry>,
        status_registry: Arc<StatusEffectRegistry>,
        team_count: u8,
        tick_rate_ms: u64,
        test_mode: bool,
    ) -> Self {
        Self {
            state: GameState::Waiting,
            players: Vec::new(),
            current_round: 0,
            game_time: 0,
            tick_rate_ms,
            test_mode,
            mode: None,
            last_mode_key: None,
            last_final_scores: Vec::new(),
            team_manager: TeamManager::new(team_count),
            role_registry,
            status_registry,
            event_manager: GameEventManager::new(),
            ready_state: ReadyStateManager::new(),
            countdown: CountdownManager::new(DEFAULT_COUNTDOWN_SECS),
            countdown_duration_secs: DEFAULT_COUNTDOWN_SECS,
            countdown_accum_ms: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn game_time(&self) -> u64 {
        self.game_time
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn team_manager(&self) -> &TeamManager {
        &self.team_manager
    }

    pub fn team_count(&self) -> u8 {
        self.team_manager.teams().len() as u8
    }

    /// Assigns a freshly joined player to whichever team is currently
    /// smallest. No-op (returns the existing assignment) if already on a team.
    pub fn assign_team(&mut self, player_id: PlayerId) -> TeamId {
        self.team_manager
            .team_of(player_id)
            .unwrap_or_else(|| self.team_manager.assign_balanced(player_id))
    }

    /// `player:team-switch`: cycles the player to the next team in order.
    pub fn switch_team(&mut self, player_id: PlayerId) -> TeamId {
        self.team_manager.cycle(player_id)
    }

    /// Only `Some` while the active mode registers base devices
    /// (domination); base:join/base:tap are rejected otherwise.
    pub fn base_manager_mut(&mut self) -> Option<&mut crate::base_manager::BaseManager> {
        self.mode.as_mut().and_then(|m| m.base_manager_mut())
    }

    /// `base:join`: registers a new base device with the active mode's base
    /// manager. Rejected when no domination-mode game is active.
    pub fn register_base(&mut self, socket_id: String) -> Result<(protocol::BaseId, u32), EngineError> {
        let now = self.game_time;
        let base_manager = self.base_manager_mut().ok_or(EngineError::BasesNotSupported)?;
        let id = base_manager.register(socket_id, now);
        let number = base_manager.base(id).map(|b| b.number).unwrap_or(0);
        Ok((id, number))
    }

    /// `base:tap`: cycles the base's ownership to the next team in turn
    /// order. Returns the new owning team and whether ownership changed.
    pub fn tap_base(&mut self, base_id: protocol::BaseId) -> Result<(TeamId, bool), EngineError> {
        let game_time = self.game_time;
        let team_count = self.team_count().max(1);
        let base_manager = self.base_manager_mut().ok_or(EngineError::BasesNotSupported)?;
        let current = base_manager.base(base_id).ok_or(EngineError::UnknownBase)?.owner_team;
        let next = current.map(|t| (t + 1) % team_count).unwrap_or(0);
        let changed = base_manager.tap(base_id, next, game_time);
        Ok((next, changed))
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    fn mode_context(&self) -> ModeContext<'_> {
        ModeContext { players: &self.players, team_manager: &self.team_manager }
    }

    /// `waiting --launch--> pre-game` (or straight to `countdown` if
    /// `skip_pre_game`). Caches the roster, assigns roles, emits `game:start`.
    pub fn start_game(
        &mut self,
        mode: Box<dyn GameMode>,
        roster: Vec<RosterEntry>,
        override_role_pool: Option<Vec<crate::role::RoleKind>>,
        countdown_duration_secs: u32,
        skip_pre_game: bool,
    ) -> Result<Vec<ServerMessage>, EngineError> {
        if !matches!(self.state, GameState::Waiting) {
            return Err(EngineError::InvalidState {
                op: "launch".into(),
                state: self.state.wire_name().into(),
            });
        }
        if roster.len() < 2 {
            return Err(EngineError::NotEnoughPlayers);
        }

        self.last_mode_key = Some(mode.key().to_string());
        self.countdown_duration_secs = countdown_duration_secs;
        self.players = roster
            .into_iter()
            .map(|entry| Player::new(entry.id, entry.name, entry.number, entry.is_bot))
            .collect();
        self.team_manager.shuffle(&self.players.iter().map(|p| p.id).collect::<Vec<_>>());
        self.mode = Some(mode);
        self.current_round = 1;
        self.last_final_scores.clear();

        let mut events = vec![ServerMessage::GameStart];
        events.extend(self.assign_roles_for_round(override_role_pool)?);

        if self.test_mode {
            events.extend(self.begin_active_round()?);
        } else if skip_pre_game {
            self.state = GameState::Countdown;
            self.countdown.start();
            self.countdown_accum_ms = 0;
        } else {
            self.state = GameState::PreGame;
        }
        Ok(events)
    }

    /// `assignRolesForRound`: preserves `total_points`, draws from the
    /// override pool or the mode's own pool, resets round-scoped state.
    fn assign_roles_for_round(
        &mut self,
        override_pool: Option<Vec<crate::role::RoleKind>>,
    ) -> Result<Vec<ServerMessage>, EngineError> {
        let mode = self.mode.as_ref().ok_or(EngineError::NoModeSelected)?;
        let pool = override_pool.unwrap_or_else(|| mode.role_pool(&self.role_registry));
        let use_roles = mode.use_roles() && !pool.is_empty();

        let n = self.players.len();
        let mut assigned_roles = vec![crate::role::RoleKind::Civilian; n];
        if use_roles {
            for i in 0..n {
                assigned_roles[i] = pool[i % pool.len()];
            }
        }

        let all_ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        let game_time = self.game_time;

        for (player, role) in self.players.iter_mut().zip(assigned_roles.into_iter()) {
            player.reset_for_round(role);
            if use_roles {
                let others: Vec<PlayerId> = all_ids.iter().copied().filter(|id| *id != player.id).collect();
                let hooks = self.role_registry.hooks(role);
                player.on_round_start(&self.status_registry, hooks, &others, game_time);
            }
        }

        let mut events = Vec::new();
        if use_roles {
            for i in 0..self.players.len() {
                let meta = self.role_registry.hooks(self.players[i].role).meta();
                let target = self.players[i].role_state.target;
                let (target_number, target_name) = target
                    .and_then(|tid| self.players.iter().find(|p| p.id == tid))
                    .map(|p| (Some(p.number), Some(p.name.clone())))
                    .unwrap_or((None, None));
                let player = &self.players[i];
                events.push(ServerMessage::RoleAssigned {
                    player_id: player.id,
                    name: player.name.clone(),
                    display_name: meta.display_name.to_string(),
                    description: meta.description.to_string(),
                    difficulty: meta.difficulty.to_string(),
                    target_number,
                    target_name,
                });
            }
        }
        events.push(self.tick_snapshot_event());
        Ok(events)
    }

    /// Admin force-start from `pre-game`, or the engine's own transition
    /// once every player in the lobby is ready.
    pub fn force_countdown_from_pregame(&mut self) -> Result<(), EngineError> {
        if !matches!(self.state, GameState::PreGame) {
            return Err(EngineError::InvalidState {
                op: "start-countdown".into(),
                state: self.state.wire_name().into(),
            });
        }
        self.state = GameState::Countdown;
        self.countdown = CountdownManager::new(self.countdown_duration_secs);
        self.countdown.start();
        self.countdown_accum_ms = 0;
        Ok(())
    }

    fn begin_active_round(&mut self) -> Result<Vec<ServerMessage>, EngineError> {
        self.state = GameState::Active;
        self.game_time = 0;
        self.ready_state.reset();
        self.event_manager = GameEventManager::new();
        self.event_manager.register(Box::new(SpeedShiftEvent::new(SPEED_SHIFT_PERIOD_MS, SPEED_SHIFT_WINDOW_MS)));
        let mode = self.mode.as_mut().ok_or(EngineError::NoModeSelected)?;
        let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
        mode.on_round_start(&ctx, self.current_round);
        Ok(vec![ServerMessage::RoundStart {
            round_number: self.current_round,
            total_rounds: self.mode.as_ref().and_then(|m| m.round_count()),
            game_events: Vec::new(),
        }])
    }

    /// `stop --> waiting` from any state; cleans up all engine timers.
    pub fn stop_game(&mut self) -> Vec<ServerMessage> {
        self.state = GameState::Waiting;
        self.players.clear();
        self.mode = None;
        self.current_round = 0;
        self.game_time = 0;
        self.ready_state.reset();
        vec![ServerMessage::GameStopped]
    }

    /// Fixed-rate tick. Behaviour depends on the current state; only
    /// `active` runs the full game loop, but countdown's 1Hz ticks and the
    /// round-ended ready-delay window are also driven from here so every
    /// timer lives on the same serialization surface.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<ServerMessage> {
        match self.state {
            GameState::Countdown => self.tick_countdown(delta_ms),
            GameState::Active => self.tick_active(delta_ms),
            _ => Vec::new(),
        }
    }

    fn tick_countdown(&mut self, delta_ms: u64) -> Vec<ServerMessage> {
        self.countdown_accum_ms += delta_ms;
        let mut events = Vec::new();
        while self.countdown_accum_ms >= 1_000 || self.countdown.is_finished() {
            if self.countdown.is_finished() {
                break;
            }
            self.countdown_accum_ms = self.countdown_accum_ms.saturating_sub(1_000);
            let Some(remaining) = self.countdown.advance_one_second() else {
                break;
            };
            let phase = if remaining == 0 { "go" } else { "countdown" };
            events.push(ServerMessage::GameCountdown {
                seconds_remaining: remaining,
                phase: phase.to_string(),
                round_number: self.current_round,
                total_rounds: self.mode.as_ref().and_then(|m| m.round_count()),
            });
            if remaining == 0 {
                if let Ok(round_events) = self.begin_active_round() {
                    events.extend(round_events);
                }
                break;
            }
        }
        events
    }

    fn tick_active(&mut self, delta_ms: u64) -> Vec<ServerMessage> {
        let mut events = Vec::new();
        self.game_time += delta_ms;
        let game_time = self.game_time;

        let role_registry = &self.role_registry;
        self.players.sort_by(|a, b| {
            let pa = role_registry.hooks(a.role).meta().priority;
            let pb = role_registry.hooks(b.role).meta().priority;
            pb.cmp(&pa).then(a.number.cmp(&b.number))
        });

        let mut deaths = Vec::new();
        for i in 0..self.players.len() {
            let role = self.players[i].role;
            let hooks = self.role_registry.hooks(role);
            let outcome = self.players[i].on_tick(&self.status_registry, hooks, game_time, delta_ms);
            if let Some(DeathOutcome::Died) = outcome {
                deaths.push(i);
            }
        }

        for &i in &deaths {
            let victim_id = self.players[i].id;
            let victim_number = self.players[i].number;
            let victim_name = self.players[i].name.clone();
            let victim_role = self.players[i].role;
            events.push(ServerMessage::PlayerDeath { victim_id, victim_number, victim_name, game_time });

            for other in self.players.iter_mut() {
                if other.id == victim_id || !other.is_alive {
                    continue;
                }
                let hooks = self.role_registry.hooks(other.role);
                let bonus = other.notify_other_death(&self.status_registry, hooks, victim_role, game_time);
                other.points += bonus;
            }

            if let Some(mode) = self.mode.as_mut() {
                let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
                mode.on_player_death(&ctx, victim_id, game_time);
            }
        }

        if let Some(mode) = self.mode.as_mut() {
            for player_id in mode.due_respawns(game_time) {
                if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
                    player.is_alive = true;
                    player.accumulated_damage = 0.0;
                }
            }
        }
        if let Some(mode) = self.mode.as_mut() {
            let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
            mode.on_tick(&ctx, game_time);
            for out_event in mode.drain_events() {
                events.push(mode_out_event_to_wire(out_event));
            }
        }

        for fired in self.event_manager.tick(game_time) {
            events.push(ServerMessage::ModeEvent { event_type: format!("{}:{}", fired.event_type, fired.phase), data: fired.data });
        }

        events.push(self.tick_snapshot_event());

        let win = self.mode.as_mut().map(|mode| {
            let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
            mode.check_win_condition(&ctx, self.current_round, game_time)
        });
        if let Some(win) = win {
            if win.round_ended {
                events.extend(self.end_round(win.game_ended));
            }
        }

        events
    }

    fn tick_snapshot_event(&self) -> ServerMessage {
        let now = self.game_time;
        let round_time_remaining = self.mode.as_ref().and_then(|m| m.round_duration_ms()).map(|d| d.saturating_sub(now));
        ServerMessage::GameTick {
            game_time: now,
            round_time_remaining,
            players: self.players.iter().map(|p| p.snapshot(now)).collect(),
        }
    }

    fn end_round(&mut self, mode_signals_game_end: bool) -> Vec<ServerMessage> {
        self.state = GameState::RoundEnded;
        let mut events = Vec::new();

        let outcome = {
            let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
            self.mode.as_mut().map(|m| m.on_round_end(&ctx, self.current_round))
        };

        let mut score_lines = Vec::new();
        if let Some(outcome) = &outcome {
            for (player_id, delta) in &outcome.score_deltas {
                if let Some(player) = self.player_mut(*player_id) {
                    player.points += delta;
                    player.total_points += delta;
                }
            }
            for player in &self.players {
                score_lines.push(ScoreLine {
                    player_id: player.id,
                    name: player.name.clone(),
                    points: player.points,
                    total_points: player.total_points,
                });
            }
        }

        events.push(ServerMessage::RoundEnd {
            round_number: self.current_round,
            scores: score_lines.clone(),
            winner_id: outcome.as_ref().and_then(|o| o.winner_id),
        });

        self.ready_state.start_ready_delay(self.game_time, DEFAULT_READY_DELAY_MS, self.test_mode);

        let game_ended = mode_signals_game_end || outcome.as_ref().map(|o| o.game_ended).unwrap_or(false);
        if game_ended {
            self.state = GameState::Finished;
            self.last_final_scores = score_lines.clone();
            let winner = score_lines.iter().max_by_key(|s| s.total_points).map(|s| s.player_id);
            if let Some(mode) = self.mode.as_mut() {
                let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
                mode.on_game_end(&ctx);
            }
            events.push(ServerMessage::GameEnd {
                scores: score_lines,
                winner,
                total_rounds: self.current_round,
            });
        } else if self.test_mode {
            self.current_round += 1;
            if let Ok(more) = self.assign_roles_for_round(None) {
                events.extend(more);
            }
            if let Ok(round_events) = self.begin_active_round() {
                events.extend(round_events);
            }
        }

        events
    }

    /// `round-ended --next--> countdown` (re-assign roles for the next
    /// round). Only valid in `round-ended`.
    pub fn next_round(&mut self) -> Result<Vec<ServerMessage>, EngineError> {
        if !matches!(self.state, GameState::RoundEnded) {
            return Err(EngineError::InvalidState { op: "next-round".into(), state: self.state.wire_name().into() });
        }
        self.current_round += 1;
        self.state = GameState::Countdown;
        self.countdown = CountdownManager::new(self.countdown_duration_secs);
        self.countdown.start();
        self.countdown_accum_ms = 0;
        self.assign_roles_for_round(None)
    }

    /// Auto-relaunch from `finished` with the same mode, once
    /// `ready_count.total >= 2`.
    pub fn relaunch_with_last_mode(&mut self, mode: Box<dyn GameMode>, roster: Vec<RosterEntry>) -> Result<Vec<ServerMessage>, EngineError> {
        if !matches!(self.state, GameState::Finished) {
            return Err(EngineError::InvalidState { op: "relaunch".into(), state: self.state.wire_name().into() });
        }
        self.state = GameState::Waiting;
        self.start_game(mode, roster, None, self.countdown_duration_secs, false)
    }

    pub fn last_mode_key(&self) -> Option<&str> {
        self.last_mode_key.as_deref()
    }

    pub fn last_final_scores(&self) -> &[ScoreLine] {
        &self.last_final_scores
    }

    /// Delegates to the player and to `mode.onPlayerMove`; silently drops
    /// samples for unknown or dead players.
    pub fn handle_player_movement(&mut self, player_id: PlayerId, x: f32, y: f32, z: f32) {
        if !matches!(self.state, GameState::Active) {
            return;
        }
        let intensity = (x * x + y * y + z * z).sqrt().clamp(0.0, 1.0);
        let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) else {
            return;
        };
        if !player.is_alive {
            return;
        }
        player.update_movement(intensity);
        if let Some(mode) = self.mode.as_mut() {
            let ctx = ModeContext { players: &self.players, team_manager: &self.team_manager };
            mode.on_player_move(&ctx, player_id);
        }
    }

    pub fn handle_player_ready(&mut self, player_id: PlayerId) -> bool {
        if !matches!(self.state, GameState::RoundEnded | GameState::Finished) {
            return false;
        }
        self.ready_state.set_ready(player_id, self.game_time)
    }

    pub fn ready_count(&self) -> (u32, u32) {
        let connected: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        self.ready_state.ready_count(&connected)
    }

    pub fn all_ready(&self) -> bool {
        let connected: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        self.ready_state.all_ready(&connected)
    }

    pub fn handle_player_disconnect(&mut self, player_id: PlayerId) {
        if let Some(player) = self.player_mut(player_id) {
            player.set_disconnected(self.game_time);
        }
    }

    pub fn handle_player_reconnect(&mut self, player_id: PlayerId) {
        if let Some(player) = self.player_mut(player_id) {
            player.clear_disconnected();
        }
    }

    pub fn snapshot(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(|p| p.snapshot(self.game_time)).collect()
    }
}

fn mode_out_event_to_wire(event: ModeOutEvent) -> ServerMessage {
    match event {
        ModeOutEvent::BaseCaptured { base_id, base_number, team_id } => {
            ServerMessage::BaseCaptured { base_id, base_number, team_id }
        }
        ModeOutEvent::BasePoint { base_id, team_id, total } => ServerMessage::BasePoint { base_id, team_id, total },
        ModeOutEvent::DominationWin { team_id, total } => ServerMessage::DominationWin { team_id, total },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_mode::{ClassicMode, RoleBasedMode};

    fn engine() -> GameEngine {
        GameEngine::new(Arc::new(RoleRegistry::new()), Arc::new(StatusEffectRegistry::new()), 2, DEFAULT_TICK_RATE_MS, true)
    }

    fn roster(names: &[&str]) -> Vec<RosterEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| RosterEntry { id: PlayerId::new(), name: n.to_string(), number: i as u32 + 1, is_bot: false })
            .collect()
    }

    #[test]
    fn classic_round_emits_death_then_round_end() {
        let mut e = engine();
        let r = roster(&["A", "B"]);
        let a = r[0].id;
        e.start_game(Box::new(ClassicMode::new(1)), r, None, 0, false).unwrap();
        assert_eq!(e.state(), GameState::Active);

        e.handle_player_movement(a, 1.0, 0.0, 0.0);
        let mut saw_round_end = false;
        for _ in 0..50 {
            let events = e.tick(100);
            if events.iter().any(|ev| matches!(ev, ServerMessage::RoundEnd { .. })) {
                saw_round_end = true;
                break;
            }
        }
        assert!(saw_round_end);
    }

    #[test]
    fn launch_rejects_fewer_than_two_players() {
        let mut e = engine();
        let err = e.start_game(Box::new(ClassicMode::new(1)), roster(&["A"]), None, 0, false).unwrap_err();
        assert_eq!(err, EngineError::NotEnoughPlayers);
    }

    #[test]
    fn next_round_rejected_outside_round_ended() {
        let mut e = engine();
        assert!(e.next_round().is_err());
    }

    #[test]
    fn speed_shift_mode_event_fires_during_active_round() {
        let mut e = engine();
        let r = roster(&["A", "B"]);
        e.start_game(Box::new(ClassicMode::new(1)), r, None, 0, false).unwrap();

        let mut saw_mode_event = false;
        for _ in 0..(SPEED_SHIFT_PERIOD_MS / 100 + 10) {
            let events = e.tick(100);
            if events.iter().any(|ev| matches!(ev, ServerMessage::ModeEvent { event_type, .. } if event_type == "speed-shift:start")) {
                saw_mode_event = true;
                break;
            }
        }
        assert!(saw_mode_event);
    }

    #[test]
    fn assassin_is_assigned_a_target_on_role_assignment() {
        let mut e = engine();
        let r = roster(&["A", "B", "C"]);
        let pool = vec![crate::role::RoleKind::Assassin, crate::role::RoleKind::Civilian, crate::role::RoleKind::Civilian];
        let events = e.start_game(Box::new(RoleBasedMode::new(1, "mafia")), r, Some(pool), 0, false).unwrap();

        let assigned: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                ServerMessage::RoleAssigned { display_name, target_number, target_name, .. } => Some((display_name.clone(), *target_number, target_name.clone())),
                _ => None,
            })
            .collect();
        let assassin = assigned.iter().find(|(name, _, _)| name == "Assassin").expect("assassin role assigned");
        assert!(assassin.1.is_some());
        assert!(assassin.2.is_some());
    }
}
