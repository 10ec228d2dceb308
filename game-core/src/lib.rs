//! Engine-side domain logic: players, roles, status effects, game modes,
//! and the `GameEngine` that ticks them all forward. No networking or
//! persistence lives here — the `server` crate owns the WebSocket gateway,
//! HTTP control plane, and settings file I/O, calling into this crate as a
//! plain library.

pub mod base_manager;
pub mod connection_manager;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod game_event_manager;
pub mod game_mode;
pub mod logging;
pub mod player;
pub mod ready_state;
pub mod role;
pub mod settings;
pub mod status_effect;
pub mod team_manager;
pub mod time_source;

pub use engine::{GameEngine, GameState, RosterEntry};
pub use error::EngineError;
