//! Assignment of players to 2-4 teams for domination mode.

use protocol::{PlayerId, TeamId};
use rand::seq::SliceRandom;
use std::collections::HashMap;

pub const MIN_TEAMS: u8 = 2;
pub const MAX_TEAMS: u8 = 4;

#[derive(Debug, Clone)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub color: &'static str,
}

fn default_teams(count: u8) -> Vec<Team> {
    const NAMES: [(&str, &str); 4] = [
        ("Red", "#e53935"),
        ("Blue", "#1e88e5"),
        ("Green", "#43a047"),
        ("Yellow", "#fdd835"),
    ];
    (0..count)
        .map(|i| Team {
            id: i,
            name: NAMES[i as usize].0.to_string(),
            color: NAMES[i as usize].1,
        })
        .collect()
}

pub struct TeamManager {
    teams: Vec<Team>,
    assignment: HashMap<PlayerId, TeamId>,
}

impl TeamManager {
    pub fn new(team_count: u8) -> Self {
        let team_count = team_count.clamp(MIN_TEAMS, MAX_TEAMS);
        Self {
            teams: default_teams(team_count),
            assignment: HashMap::new(),
        }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team_of(&self, player_id: PlayerId) -> Option<TeamId> {
        self.assignment.get(&player_id).copied()
    }

    /// Sequential round-robin balance: each new player goes to whichever
    /// team currently has the fewest members.
    pub fn assign_balanced(&mut self, player_id: PlayerId) -> TeamId {
        let mut counts = vec![0u32; self.teams.len()];
        for &team in self.assignment.values() {
            counts[team as usize] += 1;
        }
        let team = counts
            .iter()
            .enumerate()
            .min_by_key(|(_, count)| **count)
            .map(|(i, _)| i as TeamId)
            .unwrap_or(0);
        self.assignment.insert(player_id, team);
        team
    }

    pub fn remove(&mut self, player_id: PlayerId) {
        self.assignment.remove(&player_id);
    }

    /// Fisher-Yates reshuffle of the full roster across teams, kept as even
    /// as possible.
    pub fn shuffle(&mut self, player_ids: &[PlayerId]) {
        let mut shuffled: Vec<PlayerId> = player_ids.to_vec();
        shuffled.shuffle(&mut rand::thread_rng());
        self.assignment.clear();
        for (i, player_id) in shuffled.into_iter().enumerate() {
            let team = (i % self.teams.len()) as TeamId;
            self.assignment.insert(player_id, team);
        }
    }

    /// Moves a player to the next team in cyclic order (`player:team-switch`).
    pub fn cycle(&mut self, player_id: PlayerId) -> TeamId {
        let current = self.assignment.get(&player_id).copied().unwrap_or(0);
        let next = (current + 1) % self.teams.len() as TeamId;
        self.assignment.insert(player_id, next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_balanced_fills_smallest_team_first() {
        let mut tm = TeamManager::new(2);
        let a = tm.assign_balanced(PlayerId::new());
        let b = tm.assign_balanced(PlayerId::new());
        assert_ne!(a, b);
    }

    #[test]
    fn cycle_wraps_around() {
        let mut tm = TeamManager::new(2);
        let player = PlayerId::new();
        tm.assign_balanced(player);
        let first = tm.team_of(player).unwrap();
        let next = tm.cycle(player);
        assert_ne!(first, next);
        let wrapped = tm.cycle(player);
        assert_eq!(wrapped, first);
    }
}
