//! The dedicated engine task: the only place `GameEngine`, `ConnectionManager`,
//! `SettingsStore`, and `GameLog` are mutated. Every external caller reaches
//! it through an [`EngineCommand`] sent over an mpsc channel; the fixed-rate
//! tick and every command are handled on the same `tokio::select!` loop, so
//! nothing ever interleaves with the tick.
//!
//! One serialization channel feeds the whole game authority, the way a
//! single writer avoids interleaved mutation without needing a lock: a
//! fixed-interval tick and inbound commands share the same select loop and
//! fan their resulting events out to every connected socket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use game_core::connection_manager::ConnectionManager;
use game_core::engine::{DEFAULT_TICK_RATE_MS, GameEngine, GameState, RosterEntry};
use game_core::error::EngineError;
use game_core::game_mode::{self, build_mode};
use game_core::logging::{GameLog, LogLevel};
use game_core::role::RoleRegistry;
use game_core::settings::SettingsStore;
use game_core::status_effect::StatusEffectRegistry;
use game_core::time_source::TickClock;
use protocol::{BaseId, LobbyEntry, ModeInfo, PlayerId, ServerMessage, StateSnapshot};
use tokio::sync::{mpsc, RwLock};

use crate::commands::{EngineCommand, JoinOutcome, ReconnectOutcome, SocketKind};
use crate::state::SocketSender;

const HEARTBEAT_EVERY_TICKS: u64 = 300; // ~30s at the default 100ms tick rate.

pub struct EngineActorHandle {
    pub engine_tx: mpsc::Sender<EngineCommand>,
}

/// Spawns the engine task and returns a handle other tasks can send
/// commands through. `sockets` is shared with the gateway so the actor can
/// fan out events without round-tripping through another channel.
pub fn spawn(
    sockets: Arc<RwLock<HashMap<String, SocketSender>>>,
    settings_store: SettingsStore,
    dev_mode: bool,
) -> EngineActorHandle {
    let (tx, rx) = mpsc::channel(256);
    let role_registry = Arc::new(RoleRegistry::new());
    let status_registry = Arc::new(StatusEffectRegistry::new());
    let team_count = settings_store.current().team_count;
    let tick_rate_ms = DEFAULT_TICK_RATE_MS;

    let clock = TickClock::new();
    let log = GameLog::new(500, Arc::new(clock.clone()));

    let actor = EngineActor {
        engine: GameEngine::new(role_registry, status_registry, team_count, tick_rate_ms, dev_mode),
        connections: ConnectionManager::new(),
        settings: settings_store,
        log,
        clock,
        sockets,
        rx,
        dev_mode,
        tick_rate_ms,
        wall_ms: 0,
        tick_count: 0,
    };
    tokio::spawn(actor.run());
    EngineActorHandle { engine_tx: tx }
}

struct EngineActor {
    engine: GameEngine,
    connections: ConnectionManager,
    settings: SettingsStore,
    log: GameLog,
    clock: TickClock,
    sockets: Arc<RwLock<HashMap<String, SocketSender>>>,
    rx: mpsc::Receiver<EngineCommand>,
    dev_mode: bool,
    tick_rate_ms: u64,
    wall_ms: u64,
    tick_count: u64,
}

impl EngineActor {
    async fn run(mut self) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.tick_rate_ms));
        loop {
            tokio::select! {
                _ = interval.tick() => self.on_interval().await,
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn on_interval(&mut self) {
        self.wall_ms += self.tick_rate_ms;
        self.tick_count += 1;
        self.drive_bots();
        let events = self.engine.tick(self.tick_rate_ms);
        self.clock.set(self.engine.game_time());
        self.route(events).await;

        for player_id in self.connections.lobby_grace_expired_players(self.wall_ms) {
            self.connections.remove_player(player_id);
            self.log.log(LogLevel::Info, "connection", format!("lobby grace expired for {player_id:?}"));
            self.broadcast_lobby_update().await;
        }

        if self.tick_count % HEARTBEAT_EVERY_TICKS == 0 {
            for socket_id in self.connections.stale_sockets(self.wall_ms) {
                self.connections.handle_disconnect(&socket_id);
                self.sockets.write().await.remove(&socket_id);
                self.log.log(LogLevel::Warn, "connection", format!("session timed out: {socket_id}"));
            }
        }
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::PlayerJoin { player_id, socket_id, name, reply } => {
                let outcome = self.handle_join(player_id, socket_id, name);
                let _ = reply.send(outcome);
                self.broadcast_lobby_update().await;
            }
            EngineCommand::PlayerReconnect { token, socket_id, reply } => {
                let outcome = self.handle_reconnect(token, socket_id);
                let _ = reply.send(outcome);
                self.broadcast_lobby_update().await;
            }
            EngineCommand::PlayerMove { player_id, x, y, z } => {
                self.engine.handle_player_movement(player_id, x, y, z);
            }
            EngineCommand::PlayerReady { player_id } => self.handle_ready(player_id).await,
            EngineCommand::PlayerTeamSwitch { player_id } => {
                self.engine.switch_team(player_id);
            }
            EngineCommand::BaseJoin { socket_id, reply } => {
                let outcome = self.engine.register_base(socket_id);
                if let Ok((base_id, base_number)) = &outcome {
                    self.broadcast(ServerMessage::BaseRegistered { base_id: *base_id, base_number: *base_number }).await;
                }
                let _ = reply.send(outcome);
            }
            EngineCommand::BaseTap { base_id } => self.handle_base_tap(base_id).await,
            EngineCommand::SocketClosed { socket_id, kind } => self.handle_socket_closed(socket_id, kind).await,
            EngineCommand::Ping { socket_id } => self.connections.touch_activity(&socket_id, self.wall_ms),
            EngineCommand::Launch { options, reply } => self.handle_launch(options, reply).await,
            EngineCommand::NextRound { reply } => {
                let result = self.engine.next_round();
                match result {
                    Ok(events) => {
                        self.route(events).await;
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            EngineCommand::Stop { reply } => {
                let events = self.engine.stop_game();
                self.route(events).await;
                let _ = reply.send(());
            }
            EngineCommand::GetState { reply } => {
                let _ = reply.send(StateSnapshot {
                    state: self.engine.state().wire_name().to_string(),
                    current_round: self.engine.current_round(),
                    game_time: self.engine.game_time(),
                    players: self.engine.snapshot(),
                });
            }
            EngineCommand::GetLobby { reply } => {
                let _ = reply.send(self.lobby_entries());
            }
            EngineCommand::GetModes { reply } => {
                let modes = game_mode::available_modes()
                    .into_iter()
                    .map(|(key, name, description)| ModeInfo {
                        key: key.to_string(),
                        name: name.to_string(),
                        description: description.to_string(),
                    })
                    .collect();
                let _ = reply.send(modes);
            }
            EngineCommand::GetSettings { reply } => {
                let _ = reply.send(self.settings.current().clone());
            }
            EngineCommand::UpdateSettings { patch, reply } => {
                let result = self.settings.update(&patch).await;
                let _ = reply.send(result);
            }
            EngineCommand::DebugCreateBotGame { bot_count, reply } => self.handle_debug_bot_game(bot_count, reply).await,
            EngineCommand::DebugFastForward { ticks, reply } => {
                let mut events = Vec::new();
                for _ in 0..ticks {
                    events.extend(self.engine.tick(self.tick_rate_ms));
                }
                self.clock.set(self.engine.game_time());
                self.route(events).await;
                let _ = reply.send(());
            }
            EngineCommand::DebugReset { reply } => {
                let events = self.engine.stop_game();
                self.route(events).await;
                let _ = reply.send(());
            }
            EngineCommand::DebugLogs { category, min_level, limit, reply } => {
                let min_level = min_level.as_deref().and_then(parse_level);
                let entries = self.log.query(category.as_deref(), min_level, limit);
                let _ = reply.send(entries);
            }
        }
    }

    fn handle_join(&mut self, player_id: PlayerId, socket_id: String, name: String) -> Result<JoinOutcome, EngineError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 20 {
            return Err(EngineError::NameTooLong);
        }
        let result = self.connections.register(player_id, socket_id, trimmed.to_string(), true, self.wall_ms);
        let team_id = self.settings.current().teams_enabled.then(|| self.engine.assign_team(player_id));
        self.log.log(LogLevel::Info, "connection", format!("{trimmed} joined as #{}", result.number));
        Ok(JoinOutcome { token: result.token, number: result.number, team_id })
    }

    fn handle_reconnect(&mut self, token: protocol::SessionToken, socket_id: String) -> ReconnectOutcome {
        let Some(player_id) = self.connections.reconnect(token, socket_id, self.wall_ms) else {
            return ReconnectOutcome { success: false, player_id: None, number: None, name: None, team_id: None };
        };
        if matches!(self.engine.state(), GameState::Active) {
            self.engine.handle_player_reconnect(player_id);
        }
        let team_id = self.settings.current().teams_enabled.then(|| self.engine.assign_team(player_id));
        self.log.log(LogLevel::Info, "connection", format!("{player_id:?} reconnected"));
        ReconnectOutcome {
            success: true,
            player_id: Some(player_id),
            number: self.connections.number_of(player_id),
            name: self.connections.name_of(player_id).map(str::to_string),
            team_id,
        }
    }

    async fn handle_ready(&mut self, player_id: PlayerId) {
        match self.engine.state() {
            GameState::PreGame => {
                self.connections.set_player_ready(player_id, true);
                self.emit_player_ready(player_id).await;
                let (ready, total) = self.connections.ready_count();
                self.broadcast(ServerMessage::ReadyUpdate { ready, total }).await;
                if ready == total && total >= 1 {
                    let _ = self.engine.force_countdown_from_pregame();
                }
            }
            GameState::RoundEnded | GameState::Finished => {
                if !self.engine.handle_player_ready(player_id) {
                    return; // rejected by the ready-delay window; no-op per spec.
                }
                self.emit_player_ready(player_id).await;
                let (ready, total) = self.engine.ready_count();
                self.broadcast(ServerMessage::ReadyUpdate { ready, total }).await;

                if self.engine.state() == GameState::RoundEnded && self.engine.all_ready() {
                    if let Ok(events) = self.engine.next_round() {
                        self.route(events).await;
                    }
                } else if self.engine.state() == GameState::Finished
                    && self.engine.players().len() >= 2
                    && self.engine.all_ready()
                {
                    self.auto_relaunch().await;
                }
            }
            _ => {}
        }
    }

    async fn emit_player_ready(&mut self, player_id: PlayerId) {
        let name = self.connections.name_of(player_id).unwrap_or_default().to_string();
        let number = self.connections.number_of(player_id).unwrap_or(0);
        self.broadcast(ServerMessage::PlayerReady { player_id, player_name: name, player_number: number, is_ready: true }).await;
    }

    async fn auto_relaunch(&mut self) {
        let Some(mode_key) = self.engine.last_mode_key().map(str::to_string) else { return };
        let settings = self.settings.current().clone();
        let Ok(mode) = build_mode(&mode_key, &settings.theme, &settings) else { return };
        let roster = self.roster_from_connections();
        if let Ok(events) = self.engine.relaunch_with_last_mode(mode, roster) {
            self.route(events).await;
        }
    }

    async fn handle_base_tap(&mut self, base_id: BaseId) {
        match self.engine.tap_base(base_id) {
            Ok((team_id, changed)) => {
                if changed {
                    let base_number = self
                        .engine
                        .base_manager_mut()
                        .and_then(|bm| bm.base(base_id))
                        .map(|b| b.number)
                        .unwrap_or(0);
                    self.broadcast(ServerMessage::BaseCaptured { base_id, base_number, team_id }).await;
                }
            }
            Err(e) => self.log.log(LogLevel::Warn, "base", format!("base:tap rejected: {e}")),
        }
    }

    async fn handle_socket_closed(&mut self, socket_id: String, kind: SocketKind) {
        match kind {
            SocketKind::Player => {
                let Some(player_id) = self.connections.player_of_socket(&socket_id) else { return };
                if matches!(self.engine.state(), GameState::Waiting) {
                    self.connections.handle_lobby_disconnect(player_id, &socket_id, self.wall_ms);
                } else {
                    self.connections.handle_disconnect(&socket_id);
                    self.engine.handle_player_disconnect(player_id);
                }
                self.broadcast_lobby_update().await;
            }
            SocketKind::Base => {
                let is_active = matches!(self.engine.state(), GameState::Active);
                let mut disconnected = None;
                if let Some(base_manager) = self.engine.base_manager_mut() {
                    if let Some(base_id) = base_manager.base_id_for_socket(&socket_id) {
                        let base_number = base_manager.base(base_id).map(|b| b.number).unwrap_or(0);
                        if is_active {
                            base_manager.mark_disconnected(&socket_id);
                        } else {
                            base_manager.purge_outside_game(&socket_id);
                        }
                        disconnected = Some((base_id, base_number));
                    }
                }
                if let Some((base_id, base_number)) = disconnected {
                    self.broadcast(ServerMessage::BaseStatus { base_id, base_number, is_connected: false }).await;
                }
            }
        }
    }

    async fn handle_launch(&mut self, options: crate::commands::LaunchOptions, reply: tokio::sync::oneshot::Sender<Result<(), EngineError>>) {
        let settings = self.settings.current().clone();
        let mode_key = options.mode.unwrap_or_else(|| settings.game_mode.clone());
        let theme = options.theme.unwrap_or_else(|| settings.theme.clone());
        let countdown = options.countdown_duration_secs.unwrap_or(game_core::engine::DEFAULT_COUNTDOWN_SECS);

        let mode = match build_mode(&mode_key, &theme, &settings) {
            Ok(mode) => mode,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };
        let roster = self.roster_from_connections();
        match self.engine.start_game(mode, roster, None, countdown, false) {
            Ok(events) => {
                self.log.log(LogLevel::Info, "engine", format!("launched mode={mode_key}"));
                self.route(events).await;
                let _ = reply.send(Ok(()));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        }
    }

    async fn handle_debug_bot_game(&mut self, bot_count: u32, reply: tokio::sync::oneshot::Sender<Result<(), EngineError>>) {
        if !self.dev_mode {
            let _ = reply.send(Err(EngineError::InvalidState { op: "debug".into(), state: "production".into() }));
            return;
        }
        for i in 0..bot_count {
            let player_id = PlayerId::new();
            let socket_id = format!("bot-{}", player_id.0);
            self.connections.register(player_id, socket_id, format!("Bot {}", i + 1), true, self.wall_ms);
        }
        let settings = self.settings.current().clone();
        let mode = match build_mode("classic", &settings.theme, &settings) {
            Ok(mode) => mode,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };
        let mut roster = self.roster_from_connections();
        for entry in roster.iter_mut() {
            entry.is_bot = entry.name.starts_with("Bot ");
        }
        match self.engine.start_game(mode, roster, None, 0, true) {
            Ok(events) => {
                self.route(events).await;
                let _ = reply.send(Ok(()));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        }
    }

    /// Feeds synthetic motion samples to `is_bot` players once per tick so a
    /// debug-created bot game produces the same danger/scoring behavior a
    /// real phone controller would, instead of sitting idle forever.
    fn drive_bots(&mut self) {
        if !matches!(self.engine.state(), GameState::Active) {
            return;
        }
        let bot_ids: Vec<PlayerId> = self.engine.players().iter().filter(|p| p.is_bot).map(|p| p.id).collect();
        for player_id in bot_ids {
            let phase = (self.wall_ms as f64 / 400.0) + (player_id.0.as_u128() % 1000) as f64;
            let x = (phase.sin() * 0.6) as f32;
            let y = (phase.cos() * 0.6) as f32;
            let z = 0.2;
            self.engine.handle_player_movement(player_id, x, y, z);
        }
    }

    fn roster_from_connections(&self) -> Vec<RosterEntry> {
        self.connections
            .connected_player_ids()
            .into_iter()
            .map(|id| RosterEntry {
                id,
                name: self.connections.name_of(id).unwrap_or("Player").to_string(),
                number: self.connections.number_of(id).unwrap_or(0),
                is_bot: false,
            })
            .collect()
    }

    fn lobby_entries(&self) -> Vec<LobbyEntry> {
        let mut entries: Vec<LobbyEntry> = self
            .connections
            .known_player_ids()
            .into_iter()
            .map(|id| LobbyEntry {
                id,
                name: self.connections.name_of(id).unwrap_or("Player").to_string(),
                number: self.connections.number_of(id).unwrap_or(0),
                is_ready: self.connections.is_player_ready(id),
                is_connected: self.connections.is_connected(id),
            })
            .collect();
        entries.sort_by_key(|e| e.number);
        entries
    }

    async fn broadcast_lobby_update(&mut self) {
        let players = self.lobby_entries();
        self.broadcast(ServerMessage::LobbyUpdate { players }).await;
    }

    /// Routes a batch of engine-produced events: `role:assigned` goes only
    /// to the named player's current socket, everything else broadcasts.
    async fn route(&mut self, events: Vec<ServerMessage>) {
        for event in events {
            match &event {
                ServerMessage::RoleAssigned { player_id, .. } => {
                    if let Some(socket_id) = self.connections.socket_of(*player_id).map(str::to_string) {
                        self.unicast(&socket_id, event).await;
                    }
                }
                _ => self.broadcast(event).await,
            }
        }
    }

    async fn broadcast(&self, event: ServerMessage) {
        tracing::trace!(kind = event.kind(), "broadcast");
        let Ok(text) = serde_json::to_string(&event) else { return };
        let sockets = self.sockets.read().await;
        for sender in sockets.values() {
            let _ = sender.send(Message::Text(text.clone().into()));
        }
    }

    async fn unicast(&self, socket_id: &str, event: ServerMessage) {
        tracing::trace!(kind = event.kind(), socket_id, "unicast");
        let Ok(text) = serde_json::to_string(&event) else { return };
        if let Some(sender) = self.sockets.read().await.get(socket_id) {
            let _ = sender.send(Message::Text(text.into()));
        }
    }
}

fn parse_level(s: &str) -> Option<LogLevel> {
    match s {
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::LaunchOptions;
    use protocol::PlayerId;
    use tokio::sync::oneshot;

    async fn spawn_test_actor() -> mpsc::Sender<EngineCommand> {
        let path = std::env::temp_dir().join(format!("party-settings-test-{}.json", uuid::Uuid::new_v4()));
        let settings_store = SettingsStore::load(&path).await.expect("settings store loads");
        let sockets = Arc::new(RwLock::new(HashMap::new()));
        spawn(sockets, settings_store, true).engine_tx
    }

    async fn join(tx: &mpsc::Sender<EngineCommand>, name: &str) -> PlayerId {
        let player_id = PlayerId::new();
        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::PlayerJoin { player_id, socket_id: format!("sock-{player_id:?}"), name: name.to_string(), reply })
            .await
            .unwrap();
        rx.await.unwrap().expect("join should succeed");
        player_id
    }

    #[tokio::test]
    async fn join_then_get_lobby_lists_player() {
        let tx = spawn_test_actor().await;
        join(&tx, "Alice").await;

        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::GetLobby { reply }).await.unwrap();
        let lobby = rx.await.unwrap();

        assert_eq!(lobby.len(), 1);
        assert_eq!(lobby[0].name, "Alice");
    }

    #[tokio::test]
    async fn join_rejects_empty_name() {
        let tx = spawn_test_actor().await;
        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::PlayerJoin { player_id: PlayerId::new(), socket_id: "sock-1".into(), name: "   ".into(), reply })
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn launch_without_enough_players_is_rejected() {
        let tx = spawn_test_actor().await;
        join(&tx, "Solo").await;

        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::Launch { options: LaunchOptions { mode: Some("classic".into()), theme: None, countdown_duration_secs: None }, reply })
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn launch_with_two_players_starts_game_and_state_reflects_it() {
        let tx = spawn_test_actor().await;
        join(&tx, "Alice").await;
        join(&tx, "Bob").await;

        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::Launch { options: LaunchOptions { mode: Some("classic".into()), theme: None, countdown_duration_secs: None }, reply })
            .await
            .unwrap();
        rx.await.unwrap().expect("launch should succeed with two players");

        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::GetState { reply }).await.unwrap();
        let snapshot = rx.await.unwrap();
        assert_eq!(snapshot.state, "active"); // test_mode skips PreGame/Countdown.
        assert_eq!(snapshot.players.len(), 2);
    }

    #[tokio::test]
    async fn debug_bot_game_rejected_outside_dev_mode() {
        let path = std::env::temp_dir().join(format!("party-settings-test-{}.json", uuid::Uuid::new_v4()));
        let settings_store = SettingsStore::load(&path).await.unwrap();
        let sockets = Arc::new(RwLock::new(HashMap::new()));
        let tx = spawn(sockets, settings_store, false).engine_tx;

        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::DebugCreateBotGame { bot_count: 3, reply }).await.unwrap();
        assert!(rx.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn base_join_rejected_when_no_domination_game_active() {
        let tx = spawn_test_actor().await;
        let (reply, rx) = oneshot::channel();
        tx.send(EngineCommand::BaseJoin { socket_id: "base-1".into(), reply }).await.unwrap();
        assert!(rx.await.unwrap().is_err());
    }
}
