//! Registration and ownership of "base" devices for domination mode.

use protocol::{BaseId, TeamId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Base {
    pub id: BaseId,
    pub number: u32,
    pub socket_id: Option<String>,
    pub owner_team: Option<TeamId>,
    pub is_connected: bool,
    pub last_capture_time: Option<u64>,
    pub last_point_time: u64,
}

#[derive(Default)]
pub struct BaseManager {
    bases: HashMap<BaseId, Base>,
    socket_index: HashMap<String, BaseId>,
    team_points: HashMap<TeamId, u32>,
}

impl BaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, socket_id: String, now_ms: u64) -> BaseId {
        let id = BaseId::new();
        let number = self.bases.len() as u32 + 1;
        self.socket_index.insert(socket_id.clone(), id);
        self.bases.insert(
            id,
            Base {
                id,
                number,
                socket_id: Some(socket_id),
                owner_team: None,
                is_connected: true,
                last_capture_time: None,
                last_point_time: now_ms,
            },
        );
        id
    }

    /// Base disconnected while not in an active round: purged outright.
    pub fn purge_outside_game(&mut self, socket_id: &str) {
        if let Some(base_id) = self.socket_index.remove(socket_id) {
            self.bases.remove(&base_id);
        }
    }

    /// Base disconnected mid-round: stays registered but stops accruing
    /// points until it reconnects.
    pub fn mark_disconnected(&mut self, socket_id: &str) {
        if let Some(base_id) = self.socket_index.get(socket_id) {
            if let Some(base) = self.bases.get_mut(base_id) {
                base.is_connected = false;
                base.socket_id = None;
            }
        }
        self.socket_index.remove(socket_id);
    }

    pub fn reconnect(&mut self, base_id: BaseId, socket_id: String, now_ms: u64) -> bool {
        let Some(base) = self.bases.get_mut(&base_id) else {
            return false;
        };
        base.is_connected = true;
        base.socket_id = Some(socket_id.clone());
        base.last_point_time = now_ms;
        self.socket_index.insert(socket_id, base_id);
        true
    }

    /// Cycles ownership to `team_id`; returns `true` if ownership changed.
    pub fn tap(&mut self, base_id: BaseId, team_id: TeamId, game_time: u64) -> bool {
        let Some(base) = self.bases.get_mut(&base_id) else {
            return false;
        };
        let changed = base.owner_team != Some(team_id);
        base.owner_team = Some(team_id);
        base.last_capture_time = Some(game_time);
        changed
    }

    /// Advances all bases; a disconnected base never contributes, regardless
    /// of ownership. Returns the set of bases that scored this call along
    /// with their owning team.
    pub fn tick(&mut self, game_time: u64, control_interval_ms: u64) -> Vec<(BaseId, TeamId)> {
        let mut scored = Vec::new();
        for base in self.bases.values_mut() {
            if !base.is_connected {
                continue;
            }
            let Some(team) = base.owner_team else {
                continue;
            };
            if game_time.saturating_sub(base.last_point_time) >= control_interval_ms {
                base.last_point_time = game_time;
                *self.team_points.entry(team).or_insert(0) += 1;
                scored.push((base.id, team));
            }
        }
        scored
    }

    pub fn team_points(&self, team: TeamId) -> u32 {
        self.team_points.get(&team).copied().unwrap_or(0)
    }

    pub fn base(&self, base_id: BaseId) -> Option<&Base> {
        self.bases.get(&base_id)
    }

    pub fn base_id_for_socket(&self, socket_id: &str) -> Option<BaseId> {
        self.socket_index.get(socket_id).copied()
    }

    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.bases.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_base_contributes_nothing() {
        let mut bm = BaseManager::new();
        let base = bm.register("s1".into(), 0);
        bm.tap(base, 0, 0);
        bm.mark_disconnected("s1");
        let scored = bm.tick(10_000, 5_000);
        assert!(scored.is_empty());
        assert_eq!(bm.team_points(0), 0);
    }

    #[test]
    fn connected_owned_base_scores_every_interval() {
        let mut bm = BaseManager::new();
        let base = bm.register("s1".into(), 0);
        bm.tap(base, 0, 0);
        let scored = bm.tick(5_000, 5_000);
        assert_eq!(scored, vec![(base, 0)]);
        assert_eq!(bm.team_points(0), 1);

        let scored_again = bm.tick(9_999, 5_000);
        assert!(scored_again.is_empty());
    }
}
