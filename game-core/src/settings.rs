//! Persisted user preferences: a single JSON key-value file, loaded at
//! startup and mutated through the settings endpoint. A read-write store
//! guarded by a single writer so disk I/O never blocks the engine tick.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub sensitivity: String,
    pub game_mode: String,
    pub theme: String,
    pub round_count: u32,
    pub round_duration_secs: u32,
    pub danger_threshold: f32,
    pub damage_multiplier: f32,
    pub teams_enabled: bool,
    pub team_count: u8,
    pub target_score: u32,
    pub domination_point_target: u32,
    pub domination_control_interval_ms: u32,
    pub domination_base_count: u32,
    pub death_count_respawn_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: "medium".to_string(),
            game_mode: "classic".to_string(),
            theme: "standard".to_string(),
            round_count: 3,
            round_duration_secs: 90,
            danger_threshold: 0.6,
            damage_multiplier: 1.0,
            teams_enabled: false,
            team_count: 2,
            target_score: 10,
            domination_point_target: 10,
            domination_control_interval_ms: 5_000,
            domination_base_count: 2,
            death_count_respawn_secs: 5,
        }
    }
}

impl Settings {
    pub fn apply_patch(&mut self, patch: &protocol::SettingsPatch) -> Result<(), crate::error::EngineError> {
        use crate::error::EngineError;

        if let Some(ref v) = patch.sensitivity {
            self.sensitivity = v.clone();
        }
        if let Some(ref v) = patch.game_mode {
            self.game_mode = v.clone();
        }
        if let Some(ref v) = patch.theme {
            self.theme = v.clone();
        }
        if let Some(v) = patch.round_count {
            if !(1..=10).contains(&v) {
                return Err(EngineError::SettingOutOfRange {
                    field: "roundCount".into(),
                    detail: "must be 1-10".into(),
                });
            }
            self.round_count = v;
        }
        if let Some(v) = patch.round_duration {
            if !(30..=300).contains(&v) {
                return Err(EngineError::SettingOutOfRange {
                    field: "roundDuration".into(),
                    detail: "must be 30-300 seconds".into(),
                });
            }
            self.round_duration_secs = v;
        }
        if let Some(v) = patch.danger_threshold {
            if !(0.0..=1.0).contains(&v) {
                return Err(EngineError::SettingOutOfRange {
                    field: "dangerThreshold".into(),
                    detail: "must be 0-1".into(),
                });
            }
            self.danger_threshold = v;
        }
        if let Some(v) = patch.damage_multiplier {
            self.damage_multiplier = v;
        }
        if let Some(v) = patch.teams_enabled {
            self.teams_enabled = v;
        }
        if let Some(v) = patch.team_count {
            if !(2..=4).contains(&v) {
                return Err(EngineError::SettingOutOfRange {
                    field: "teamCount".into(),
                    detail: "must be 2-4".into(),
                });
            }
            self.team_count = v;
        }
        if let Some(v) = patch.target_score {
            self.target_score = v;
        }
        if let Some(v) = patch.domination_point_target {
            self.domination_point_target = v;
        }
        if let Some(v) = patch.domination_control_interval {
            self.domination_control_interval_ms = v;
        }
        if let Some(v) = patch.domination_base_count {
            self.domination_base_count = v;
        }
        if let Some(v) = patch.death_count_respawn_time {
            self.death_count_respawn_secs = v;
        }
        Ok(())
    }
}

/// Single-writer JSON file store. Reads are cheap in-memory snapshots;
/// writes go through `save`, serialized by `&mut self` so two concurrent
/// `POST /api/game/settings` calls can't interleave a torn write.
pub struct SettingsStore {
    path: PathBuf,
    current: Settings,
}

impl SettingsStore {
    /// Loads from `path` if present, otherwise seeds it with defaults.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let current = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Settings::default(),
        };
        let store = Self { path, current };
        store.save_current().await?;
        Ok(store)
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }

    pub async fn update(&mut self, patch: &protocol::SettingsPatch) -> Result<Settings, crate::error::EngineError> {
        let mut next = self.current.clone();
        next.apply_patch(patch)?;
        self.current = next.clone();
        let _ = self.save_current().await;
        Ok(next)
    }

    async fn save_current(&self) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.current).unwrap_or_default();
        tokio::fs::write(&self.path, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_rejects_out_of_range_round_count() {
        let mut settings = Settings::default();
        let patch = protocol::SettingsPatch { round_count: Some(20), ..Default::default() };
        assert!(settings.apply_patch(&patch).is_err());
        assert_eq!(settings.round_count, 3);
    }

    #[test]
    fn patch_applies_valid_fields() {
        let mut settings = Settings::default();
        let patch = protocol::SettingsPatch { theme: Some("halloween".into()), round_count: Some(5), ..Default::default() };
        settings.apply_patch(&patch).unwrap();
        assert_eq!(settings.theme, "halloween");
        assert_eq!(settings.round_count, 5);
    }
}
