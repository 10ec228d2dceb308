//! Process-wide shared state handed to every axum handler.
//!
//! Holds one outbound channel per connected socket (player or base) rather
//! than per room, since this process is itself the single game authority
//! rather than a relay between rooms of peers.

use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};

use crate::commands::EngineCommand;

/// Outbound half of a socket: every message the gateway wants delivered to
/// one specific connection goes through this channel to that socket's
/// writer task. Cheap, non-blocking sends only — the actual I/O happens on
/// the writer task, never inside the engine's tick.
pub type SocketSender = mpsc::UnboundedSender<Message>;

pub struct AppState {
    pub engine_tx: mpsc::Sender<EngineCommand>,
    pub sockets: Arc<RwLock<HashMap<String, SocketSender>>>,
    pub dev_mode: bool,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine_tx: mpsc::Sender<EngineCommand>, sockets: Arc<RwLock<HashMap<String, SocketSender>>>, dev_mode: bool) -> Self {
        Self {
            engine_tx,
            sockets,
            dev_mode,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
