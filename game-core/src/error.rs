//! Typed errors for every fallible engine boundary.
//!
//! Internal mutators never panic on reachable input; they return one of
//! these and let the caller (gateway, HTTP layer) decide how to render it on
//! the wire. See `EngineError::wire_code` for the mapping.

use thiserror::Error;

/// Validation or state-machine errors surfaced to a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown game mode '{0}'")]
    UnknownMode(String),
    #[error("player name must be 1-20 characters")]
    NameTooLong,
    #[error("setting '{field}' out of range: {detail}")]
    SettingOutOfRange { field: String, detail: String },
    #[error("not enough connected players to launch (need at least 2)")]
    NotEnoughPlayers,
    #[error("no mode selected")]
    NoModeSelected,
    #[error("operation '{op}' invalid in state '{state}'")]
    InvalidState { op: String, state: String },
    #[error("unknown session token")]
    UnknownToken,
    #[error("unknown player id")]
    UnknownPlayer,
    #[error("base devices are only accepted while a domination-mode game is active")]
    BasesNotSupported,
    #[error("unknown base id")]
    UnknownBase,
}

impl EngineError {
    /// Stable machine-readable code for the `error` wire event / HTTP body.
    pub fn wire_code(&self) -> &'static str {
        match self {
            EngineError::UnknownMode(_) => "unknown_mode",
            EngineError::NameTooLong => "name_too_long",
            EngineError::SettingOutOfRange { .. } => "setting_out_of_range",
            EngineError::NotEnoughPlayers => "not_enough_players",
            EngineError::NoModeSelected => "no_mode_selected",
            EngineError::InvalidState { .. } => "invalid_state",
            EngineError::UnknownToken => "unknown_token",
            EngineError::UnknownPlayer => "unknown_player",
            EngineError::BasesNotSupported => "bases_not_supported",
            EngineError::UnknownBase => "unknown_base",
        }
    }
}
