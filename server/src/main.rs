mod commands;
mod engine_actor;
mod gateway;
mod http_api;
mod state;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::main]
/// Boots tracing, loads persisted settings, spawns the engine actor, then
/// serves the WebSocket gateway and HTTP control plane on one listener.
async fn main() {
    let log_to_file = std::env::var("LOG_TO_FILE").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    let env_filter = std::env::var("LOG_LEVEL")
        .map(|level| format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")));

    let fmt_layer = tracing_subscriber::fmt::layer().with_file(true).with_line_number(true).with_target(true);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| env_filter.into()))
        .with(fmt_layer)
        .init();
    if log_to_file {
        tracing::warn!("LOG_TO_FILE=1 requested but this build only logs to stdout/stderr");
    }

    let dev_mode = std::env::var("NODE_ENV").map(|v| v == "development").unwrap_or(false);
    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok();

    let settings_store = game_core::settings::SettingsStore::load("settings.json")
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load settings.json, continuing with defaults");
            panic!("cannot continue without a writable settings store: {e}");
        });

    let sockets = Arc::new(RwLock::new(HashMap::new()));
    let handle = engine_actor::spawn(sockets.clone(), settings_store, dev_mode);
    let app_state = Arc::new(AppState::new(handle.engine_tx, sockets, dev_mode));

    let cors = build_cors_layer(allowed_origins.as_deref());

    let app = Router::new()
        .route("/ws", get(gateway::ws_handler))
        .merge(http_api::router(dev_mode))
        .layer(cors)
        .with_state(app_state);

    let tls_configured = tls_cert_path().is_some();
    if tls_configured {
        tracing::warn!("TLS cert path configured but this build terminates TLS upstream of the process; serving plain HTTP");
    } else {
        tracing::warn!("no TLS cert configured; serving plain HTTP (mobile browsers may refuse motion sensor permission over http://)");
    }

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port, "failed to bind listener");
            std::process::exit(1);
        }
    };
    tracing::info!(port, dev_mode, "party-server listening");

    let serve_result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    if let Err(e) = serve_result {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}

fn tls_cert_path() -> Option<String> {
    std::env::var("TLS_CERT_PATH").ok().filter(|p| Path::new(p).exists())
}

fn build_cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let parsed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new().allow_origin(parsed).allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any)
        }
        None => CorsLayer::permissive(),
    }
}

/// Waits for SIGINT or SIGTERM, logs, and lets axum's graceful shutdown
/// drain in-flight connections up to `SHUTDOWN_DEADLINE` before the process
/// exits normally.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }

    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_DEADLINE).await;
        tracing::error!("graceful shutdown exceeded deadline, forcing exit");
        std::process::exit(1);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_allowed_origins_is_permissive() {
        // CorsLayer has no introspection API; just check construction doesn't panic.
        let _ = build_cors_layer(None);
    }

    #[test]
    fn allowed_origins_splits_and_trims() {
        let _ = build_cors_layer(Some("https://a.example, https://b.example"));
    }

    #[test]
    fn tls_cert_path_absent_or_missing_file_is_none() {
        std::env::remove_var("TLS_CERT_PATH");
        assert!(tls_cert_path().is_none());

        std::env::set_var("TLS_CERT_PATH", "/nonexistent/path/does-not-exist.pem");
        assert!(tls_cert_path().is_none());
        std::env::remove_var("TLS_CERT_PATH");
    }
}
