//! HTTP control plane: health, read-only game/lobby/settings views, and the
//! admin mutations (launch, next-round, stop, settings patch). `/api/debug/*`
//! only registers when `dev_mode` is set (see `main.rs`).
//!
//! Plain axum JSON handlers reading `AppState`; every handler that touches
//! game state does so by sending a command into the engine actor and
//! awaiting its oneshot reply, never by locking anything itself.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use game_core::error::EngineError;
use protocol::{ErrorBody, HealthResponse, LaunchRequest, SettingsPatch};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::commands::{EngineCommand, LaunchOptions};
use crate::state::AppState;

pub fn router(dev_mode: bool) -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/game/config", get(config))
        .route("/api/game/modes", get(modes))
        .route("/api/game/lobby", get(lobby))
        .route("/api/game/settings", get(get_settings).post(update_settings))
        .route("/api/game/launch", post(launch))
        .route("/api/game/next-round", post(next_round))
        .route("/api/game/stop", post(stop))
        .route("/api/game/state", get(state));

    if dev_mode {
        router = router
            .route("/api/debug/bots", post(debug_bots))
            .route("/api/debug/fast-forward", post(debug_fast_forward))
            .route("/api/debug/reset", post(debug_reset))
            .route("/api/debug/logs", post(debug_logs));
    }
    router
}

fn engine_error_response(e: EngineError) -> (StatusCode, Json<ErrorBody>) {
    let status = match e {
        EngineError::InvalidState { .. }
        | EngineError::NotEnoughPlayers
        | EngineError::NoModeSelected
        | EngineError::BasesNotSupported => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorBody { code: e.wire_code().to_string(), message: e.to_string() }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", uptime: state.uptime_secs() })
}

async fn config(State(state): State<Arc<AppState>>) -> Json<protocol::ConfigResponse> {
    Json(protocol::ConfigResponse { dev_mode: state.dev_mode })
}

async fn modes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::GetModes { reply }).await;
    Json(rx.await.unwrap_or_default())
}

async fn lobby(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::GetLobby { reply }).await;
    Json(rx.await.unwrap_or_default())
}

async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::GetSettings { reply }).await;
    match rx.await {
        Ok(settings) => Json(settings).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn update_settings(State(state): State<Arc<AppState>>, Json(patch): Json<SettingsPatch>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::UpdateSettings { patch, reply }).await;
    match rx.await {
        Ok(Ok(settings)) => Json(settings).into_response(),
        Ok(Err(e)) => engine_error_response(e).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn launch(State(state): State<Arc<AppState>>, Json(request): Json<LaunchRequest>) -> impl IntoResponse {
    let options = LaunchOptions {
        mode: request.mode,
        theme: request.theme,
        countdown_duration_secs: request.countdown_duration,
    };
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::Launch { options, reply }).await;
    match rx.await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(e)) => engine_error_response(e).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn next_round(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::NextRound { reply }).await;
    match rx.await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(e)) => engine_error_response(e).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn stop(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::Stop { reply }).await;
    let _ = rx.await;
    StatusCode::NO_CONTENT
}

async fn state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::GetState { reply }).await;
    match rx.await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct BotGameRequest {
    #[serde(default = "default_bot_count")]
    count: u32,
}

fn default_bot_count() -> u32 {
    3
}

async fn debug_bots(State(state): State<Arc<AppState>>, Json(body): Json<BotGameRequest>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::DebugCreateBotGame { bot_count: body.count, reply }).await;
    match rx.await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(e)) => engine_error_response(e).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct FastForwardRequest {
    ticks: u32,
}

async fn debug_fast_forward(State(state): State<Arc<AppState>>, Json(body): Json<FastForwardRequest>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::DebugFastForward { ticks: body.ticks, reply }).await;
    let _ = rx.await;
    StatusCode::NO_CONTENT
}

async fn debug_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state.engine_tx.send(EngineCommand::DebugReset { reply }).await;
    let _ = rx.await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct DebugLogsRequest {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    min_level: Option<String>,
    #[serde(default = "default_log_limit")]
    limit: usize,
}

fn default_log_limit() -> usize {
    100
}

async fn debug_logs(State(state): State<Arc<AppState>>, Json(body): Json<DebugLogsRequest>) -> impl IntoResponse {
    let (reply, rx) = oneshot::channel();
    let _ = state
        .engine_tx
        .send(EngineCommand::DebugLogs { category: body.category, min_level: body.min_level, limit: body.limit, reply })
        .await;
    Json(rx.await.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_maps_to_conflict() {
        let (status, _) = engine_error_response(EngineError::InvalidState { op: "launch".into(), state: "active".into() });
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn not_enough_players_maps_to_conflict() {
        let (status, _) = engine_error_response(EngineError::NotEnoughPlayers);
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn bases_not_supported_maps_to_conflict() {
        let (status, _) = engine_error_response(EngineError::BasesNotSupported);
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_mode_maps_to_bad_request() {
        let (status, body) = engine_error_response(EngineError::UnknownMode("nope".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "unknown_mode");
    }

    #[test]
    fn default_bot_count_is_three() {
        assert_eq!(default_bot_count(), 3);
    }

    #[test]
    fn default_log_limit_is_one_hundred() {
        assert_eq!(default_log_limit(), 100);
    }
}
