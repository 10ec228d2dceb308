//! The single mutation surface into the engine task.
//!
//! Every inbound WebSocket frame and every HTTP control-plane call becomes
//! one of these, sent over an mpsc channel into the dedicated engine task.
//! Nothing outside that task ever touches
//! `GameEngine`/`ConnectionManager`/`SettingsStore` directly, so there is
//! exactly one place state can be mutated from.

use game_core::error::EngineError;
use game_core::settings::Settings;
use protocol::{BaseId, LobbyEntry, LogEntryDto, ModeInfo, PlayerId, SessionToken, SettingsPatch, StateSnapshot};
use tokio::sync::oneshot;

/// Which physical socket sent a command; base sockets and player sockets
/// share the same transport but are routed to different managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Player,
    Base,
}

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub token: SessionToken,
    pub number: u32,
    pub team_id: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct ReconnectOutcome {
    pub success: bool,
    pub player_id: Option<PlayerId>,
    pub number: Option<u32>,
    pub name: Option<String>,
    pub team_id: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub mode: Option<String>,
    pub theme: Option<String>,
    pub countdown_duration_secs: Option<u32>,
}

pub enum EngineCommand {
    PlayerJoin {
        player_id: PlayerId,
        socket_id: String,
        name: String,
        reply: oneshot::Sender<Result<JoinOutcome, EngineError>>,
    },
    PlayerReconnect {
        token: SessionToken,
        socket_id: String,
        reply: oneshot::Sender<ReconnectOutcome>,
    },
    PlayerMove {
        player_id: PlayerId,
        x: f32,
        y: f32,
        z: f32,
    },
    PlayerReady {
        player_id: PlayerId,
    },
    PlayerTeamSwitch {
        player_id: PlayerId,
    },
    BaseJoin {
        socket_id: String,
        reply: oneshot::Sender<Result<(BaseId, u32), EngineError>>,
    },
    BaseTap {
        base_id: BaseId,
    },
    SocketClosed {
        socket_id: String,
        kind: SocketKind,
    },
    Ping {
        socket_id: String,
    },
    Launch {
        options: LaunchOptions,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    NextRound {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    GetState {
        reply: oneshot::Sender<StateSnapshot>,
    },
    GetLobby {
        reply: oneshot::Sender<Vec<LobbyEntry>>,
    },
    GetModes {
        reply: oneshot::Sender<Vec<ModeInfo>>,
    },
    GetSettings {
        reply: oneshot::Sender<Settings>,
    },
    UpdateSettings {
        patch: SettingsPatch,
        reply: oneshot::Sender<Result<Settings, EngineError>>,
    },
    DebugCreateBotGame {
        bot_count: u32,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    DebugFastForward {
        ticks: u32,
        reply: oneshot::Sender<()>,
    },
    DebugReset {
        reply: oneshot::Sender<()>,
    },
    DebugLogs {
        category: Option<String>,
        min_level: Option<String>,
        limit: usize,
        reply: oneshot::Sender<Vec<LogEntryDto>>,
    },
}
