//! Wire types shared between the server and its clients.
//!
//! Every frame on the player/base WebSocket is a single JSON object tagged by
//! a `type` field; HTTP bodies use the same serde derives. This crate owns
//! the wire format exclusively — nothing outside it should construct JSON by
//! hand.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque, client-generated player identity. Stable across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

/// Opaque session token handed out on join, required to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub Uuid);

/// Identity of a registered base device (domination mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseId(pub Uuid);

/// 0..3, one of up to four teams.
pub type TeamId = u8;

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BaseId {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages accepted from player and base sockets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "player:join")]
    PlayerJoin { player_id: PlayerId, name: String },
    #[serde(rename = "player:reconnect")]
    PlayerReconnect {
        token: SessionToken,
        #[serde(default)]
        socket_id: Option<String>,
    },
    #[serde(rename = "player:move")]
    PlayerMove {
        player_id: PlayerId,
        x: f32,
        y: f32,
        z: f32,
        timestamp: u64,
        #[serde(default)]
        device_type: Option<String>,
    },
    #[serde(rename = "player:ready")]
    PlayerReady { player_id: PlayerId },
    #[serde(rename = "player:team-switch")]
    PlayerTeamSwitch { player_id: PlayerId },
    #[serde(rename = "base:join")]
    BaseJoin,
    #[serde(rename = "base:tap")]
    BaseTap { base_id: BaseId },
    #[serde(rename = "ping")]
    Ping,
}

/// A single player's snapshot as rendered in `game:tick` and `lobby:update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub number: u32,
    pub is_alive: bool,
    pub damage: f32,
    pub points: i32,
    pub toughness: f32,
    pub death_count: u32,
    pub is_disconnected: bool,
    pub grace_time_remaining: Option<u64>,
    pub status_effects: Vec<String>,
}

/// A lobby roster entry, used by `lobby:update` and `GET /api/game/lobby`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyEntry {
    pub id: PlayerId,
    pub name: String,
    pub number: u32,
    pub is_ready: bool,
    pub is_connected: bool,
}

/// A final or in-round score line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreLine {
    pub player_id: PlayerId,
    pub name: String,
    pub points: i32,
    pub total_points: i32,
}

/// Messages the gateway fans out to connected sockets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "lobby:update")]
    LobbyUpdate { players: Vec<LobbyEntry> },
    #[serde(rename = "player:joined")]
    PlayerJoined {
        success: bool,
        session_token: Option<SessionToken>,
        player_id: PlayerId,
        player_number: Option<u32>,
        name: String,
        team_id: Option<TeamId>,
    },
    #[serde(rename = "player:reconnected")]
    PlayerReconnected {
        success: bool,
        player_id: Option<PlayerId>,
        player_number: Option<u32>,
        name: Option<String>,
        team_id: Option<TeamId>,
    },
    #[serde(rename = "game:tick")]
    GameTick {
        game_time: u64,
        round_time_remaining: Option<u64>,
        players: Vec<PlayerSnapshot>,
    },
    #[serde(rename = "player:death")]
    PlayerDeath {
        victim_id: PlayerId,
        victim_number: u32,
        victim_name: String,
        game_time: u64,
    },
    #[serde(rename = "round:start")]
    RoundStart {
        round_number: u32,
        total_rounds: Option<u32>,
        game_events: Vec<String>,
    },
    #[serde(rename = "round:end")]
    RoundEnd {
        round_number: u32,
        scores: Vec<ScoreLine>,
        winner_id: Option<PlayerId>,
    },
    #[serde(rename = "game:start")]
    GameStart,
    #[serde(rename = "game:end")]
    GameEnd {
        scores: Vec<ScoreLine>,
        winner: Option<PlayerId>,
        total_rounds: u32,
    },
    #[serde(rename = "game:countdown")]
    GameCountdown {
        seconds_remaining: u32,
        phase: String,
        round_number: u32,
        total_rounds: Option<u32>,
    },
    #[serde(rename = "game:stopped")]
    GameStopped,
    #[serde(rename = "ready:update")]
    ReadyUpdate { ready: u32, total: u32 },
    #[serde(rename = "ready:enabled")]
    ReadyEnabled { enabled: bool },
    #[serde(rename = "player:ready")]
    PlayerReady {
        player_id: PlayerId,
        player_name: String,
        player_number: u32,
        is_ready: bool,
    },
    #[serde(rename = "role:assigned")]
    RoleAssigned {
        player_id: PlayerId,
        name: String,
        display_name: String,
        description: String,
        difficulty: String,
        target_number: Option<u32>,
        target_name: Option<String>,
    },
    #[serde(rename = "mode:event")]
    ModeEvent {
        event_type: String,
        data: serde_json::Value,
    },
    #[serde(rename = "base:registered")]
    BaseRegistered { base_id: BaseId, base_number: u32 },
    #[serde(rename = "base:captured")]
    BaseCaptured {
        base_id: BaseId,
        base_number: u32,
        team_id: TeamId,
    },
    #[serde(rename = "base:point")]
    BasePoint {
        base_id: BaseId,
        team_id: TeamId,
        total: u32,
    },
    #[serde(rename = "base:status")]
    BaseStatus {
        base_id: BaseId,
        base_number: u32,
        is_connected: bool,
    },
    #[serde(rename = "domination:win")]
    DominationWin { team_id: TeamId, total: u32 },
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    /// Stable event name matching the wire `type` tag; used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::LobbyUpdate { .. } => "lobby:update",
            ServerMessage::PlayerJoined { .. } => "player:joined",
            ServerMessage::PlayerReconnected { .. } => "player:reconnected",
            ServerMessage::GameTick { .. } => "game:tick",
            ServerMessage::PlayerDeath { .. } => "player:death",
            ServerMessage::RoundStart { .. } => "round:start",
            ServerMessage::RoundEnd { .. } => "round:end",
            ServerMessage::GameStart => "game:start",
            ServerMessage::GameEnd { .. } => "game:end",
            ServerMessage::GameCountdown { .. } => "game:countdown",
            ServerMessage::GameStopped => "game:stopped",
            ServerMessage::ReadyUpdate { .. } => "ready:update",
            ServerMessage::ReadyEnabled { .. } => "ready:enabled",
            ServerMessage::PlayerReady { .. } => "player:ready",
            ServerMessage::RoleAssigned { .. } => "role:assigned",
            ServerMessage::ModeEvent { .. } => "mode:event",
            ServerMessage::BaseRegistered { .. } => "base:registered",
            ServerMessage::BaseCaptured { .. } => "base:captured",
            ServerMessage::BasePoint { .. } => "base:point",
            ServerMessage::BaseStatus { .. } => "base:status",
            ServerMessage::DominationWin { .. } => "domination:win",
            ServerMessage::Error { .. } => "error",
        }
    }

    /// `true` for the handful of events that are unicast to the socket that
    /// caused them rather than broadcast to every connected socket.
    pub fn is_unicast(&self) -> bool {
        matches!(
            self,
            ServerMessage::PlayerJoined { .. }
                | ServerMessage::PlayerReconnected { .. }
                | ServerMessage::RoleAssigned { .. }
        )
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: u64,
}

/// `GET /api/game/config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub dev_mode: bool,
}

/// One entry of `GET /api/game/modes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeInfo {
    pub key: String,
    pub name: String,
    pub description: String,
}

/// `GET /api/game/settings` and the accepted body of `POST /api/game/settings`.
///
/// All fields optional on the way in (partial update); `GET` always returns
/// every field populated from the persisted defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsPatch {
    pub sensitivity: Option<String>,
    pub game_mode: Option<String>,
    pub theme: Option<String>,
    pub round_count: Option<u32>,
    pub round_duration: Option<u32>,
    pub danger_threshold: Option<f32>,
    pub damage_multiplier: Option<f32>,
    pub teams_enabled: Option<bool>,
    pub team_count: Option<u8>,
    pub target_score: Option<u32>,
    pub domination_point_target: Option<u32>,
    pub domination_control_interval: Option<u32>,
    pub domination_base_count: Option<u32>,
    pub death_count_respawn_time: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub mode: Option<String>,
    pub theme: Option<String>,
    pub countdown_duration: Option<u32>,
}

/// `GET /api/game/state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: String,
    pub current_round: u32,
    pub game_time: u64,
    pub players: Vec<PlayerSnapshot>,
}

/// A single debug log entry as returned by `POST /api/debug/logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryDto {
    pub level: String,
    pub category: String,
    pub message: String,
    pub game_time: u64,
    pub fields: HashMap<String, String>,
}

/// A uniform error body for HTTP 4xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
