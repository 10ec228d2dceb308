//! Player ↔ socket mapping, session tokens, numbering, and lobby grace.
//!
//! Deliberately synchronous and free of any `tokio` task spawning: grace
//! timers and the heartbeat sweep are driven by the engine's own
//! serialization surface (an explicit scheduled check against a stored
//! deadline), not by timers living inside this manager, per the "implicit
//! async via timers" redesign note. All operations return a status value;
//! unknown ids are no-ops, never panics.

use protocol::{PlayerId, SessionToken};
use std::collections::HashMap;

pub const LOBBY_GRACE_MS: u64 = 60_000;
pub const SESSION_TIMEOUT_MS: u64 = 5 * 60_000;
pub const MAX_NUMBERED_SLOTS: u32 = 20;

#[derive(Debug, Clone)]
pub struct RegisterResult {
    pub token: SessionToken,
    pub number: u32,
}

#[derive(Default)]
pub struct ConnectionManager {
    socket_of: HashMap<PlayerId, String>,
    player_of_socket: HashMap<String, PlayerId>,
    token_of: HashMap<PlayerId, SessionToken>,
    player_of_token: HashMap<SessionToken, PlayerId>,
    last_activity: HashMap<String, u64>,
    number_of: HashMap<PlayerId, u32>,
    name_of: HashMap<PlayerId, String>,
    ready: HashMap<PlayerId, bool>,
    /// Set while a player has left the lobby and is within their grace
    /// window; cleared by `reconnect`. The engine polls
    /// `lobby_grace_expired_players` each tick/heartbeat.
    lobby_grace_deadline: HashMap<PlayerId, u64>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lowest_free_number(&self) -> u32 {
        let used: std::collections::HashSet<u32> = self.number_of.values().copied().collect();
        for n in 1..=MAX_NUMBERED_SLOTS {
            if !used.contains(&n) {
                return n;
            }
        }
        used.len() as u32 + 1
    }

    /// Idempotent on `player_id` with respect to number: re-registering an
    /// already-known player keeps its existing number.
    pub fn register(
        &mut self,
        player_id: PlayerId,
        socket_id: String,
        name: String,
        generate_token: bool,
        now_ms: u64,
    ) -> RegisterResult {
        let number = *self
            .number_of
            .entry(player_id)
            .or_insert_with(|| self.lowest_free_number());
        self.name_of.insert(player_id, name);
        self.player_of_socket.insert(socket_id.clone(), player_id);
        self.socket_of.insert(player_id, socket_id.clone());
        self.last_activity.insert(socket_id, now_ms);

        let token = if generate_token || !self.token_of.contains_key(&player_id) {
            let token = SessionToken::new();
            self.token_of.insert(player_id, token);
            self.player_of_token.insert(token, player_id);
            token
        } else {
            self.token_of[&player_id]
        };

        RegisterResult { token, number }
    }

    /// O(players) token scan; rewires socket indexes on hit and cancels any
    /// pending lobby grace. Returns `None` when the token is unknown.
    pub fn reconnect(&mut self, token: SessionToken, new_socket_id: String, now_ms: u64) -> Option<PlayerId> {
        let player_id = *self.player_of_token.get(&token)?;
        if let Some(old_socket) = self.socket_of.remove(&player_id) {
            self.player_of_socket.remove(&old_socket);
        }
        self.player_of_socket.insert(new_socket_id.clone(), player_id);
        self.socket_of.insert(player_id, new_socket_id.clone());
        self.last_activity.insert(new_socket_id, now_ms);
        self.lobby_grace_deadline.remove(&player_id);
        Some(player_id)
    }

    /// Drops socket indexes only; token/number/name survive for a later
    /// reconnect. Used mid-game, where the mode decides disconnect handling.
    pub fn handle_disconnect(&mut self, socket_id: &str) -> Option<PlayerId> {
        let player_id = self.player_of_socket.remove(socket_id)?;
        self.socket_of.remove(&player_id);
        self.last_activity.remove(socket_id);
        Some(player_id)
    }

    /// Full purge: frees number, token, all indexes, cancels any grace.
    pub fn remove_player(&mut self, player_id: PlayerId) {
        if let Some(socket_id) = self.socket_of.remove(&player_id) {
            self.player_of_socket.remove(&socket_id);
            self.last_activity.remove(&socket_id);
        }
        if let Some(token) = self.token_of.remove(&player_id) {
            self.player_of_token.remove(&token);
        }
        self.number_of.remove(&player_id);
        self.name_of.remove(&player_id);
        self.ready.remove(&player_id);
        self.lobby_grace_deadline.remove(&player_id);
    }

    /// Only valid while the game is `waiting`: drops the socket and starts a
    /// grace window so a stale lobby entry doesn't linger forever.
    pub fn handle_lobby_disconnect(&mut self, player_id: PlayerId, socket_id: &str, now_ms: u64) {
        self.handle_disconnect(socket_id);
        self.lobby_grace_deadline.insert(player_id, now_ms + LOBBY_GRACE_MS);
    }

    /// Players whose lobby grace has elapsed as of `now_ms` and have not
    /// reconnected. Caller is expected to `remove_player` each and fire the
    /// expiry event; this method does not mutate.
    pub fn lobby_grace_expired_players(&self, now_ms: u64) -> Vec<PlayerId> {
        self.lobby_grace_deadline
            .iter()
            .filter(|(_, deadline)| now_ms >= **deadline)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn set_player_ready(&mut self, player_id: PlayerId, is_ready: bool) {
        if self.number_of.contains_key(&player_id) {
            self.ready.insert(player_id, is_ready);
        }
    }

    pub fn is_player_ready(&self, player_id: PlayerId) -> bool {
        self.ready.get(&player_id).copied().unwrap_or(false)
    }

    /// Only currently connected players count toward `total`.
    pub fn ready_count(&self) -> (u32, u32) {
        let total = self.socket_of.len() as u32;
        let ready = self
            .socket_of
            .keys()
            .filter(|id| self.ready.get(id).copied().unwrap_or(false))
            .count() as u32;
        (ready, total)
    }

    pub fn touch_activity(&mut self, socket_id: &str, now_ms: u64) {
        if let Some(activity) = self.last_activity.get_mut(socket_id) {
            *activity = now_ms;
        }
    }

    /// Sockets whose last activity is older than `SESSION_TIMEOUT_MS`; caller
    /// disconnects each and drops its token.
    pub fn stale_sockets(&self, now_ms: u64) -> Vec<String> {
        self.last_activity
            .iter()
            .filter(|(_, last)| now_ms.saturating_sub(**last) >= SESSION_TIMEOUT_MS)
            .map(|(socket, _)| socket.clone())
            .collect()
    }

    pub fn socket_of(&self, player_id: PlayerId) -> Option<&str> {
        self.socket_of.get(&player_id).map(String::as_str)
    }

    pub fn player_of_socket(&self, socket_id: &str) -> Option<PlayerId> {
        self.player_of_socket.get(socket_id).copied()
    }

    pub fn number_of(&self, player_id: PlayerId) -> Option<u32> {
        self.number_of.get(&player_id).copied()
    }

    pub fn name_of(&self, player_id: PlayerId) -> Option<&str> {
        self.name_of.get(&player_id).map(String::as_str)
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.socket_of.contains_key(&player_id)
    }

    pub fn connected_player_ids(&self) -> Vec<PlayerId> {
        self.socket_of.keys().copied().collect()
    }

    /// Every player this manager still knows about (connected or within a
    /// lobby grace window); used to build `lobby:update`/`GET
    /// /api/game/lobby` so a briefly-disconnected player still appears.
    pub fn known_player_ids(&self) -> Vec<PlayerId> {
        self.name_of.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_lowest_free_number() {
        let mut cm = ConnectionManager::new();
        let a = cm.register(PlayerId::new(), "s1".into(), "A".into(), true, 0);
        let b = cm.register(PlayerId::new(), "s2".into(), "B".into(), true, 0);
        assert_eq!(a.number, 1);
        assert_eq!(b.number, 2);
    }

    #[test]
    fn number_is_stable_across_reconnect() {
        let mut cm = ConnectionManager::new();
        let player = PlayerId::new();
        let reg = cm.register(player, "s1".into(), "A".into(), true, 0);
        cm.handle_disconnect("s1");
        let reconnected = cm.reconnect(reg.token, "s2".into(), 1_000).unwrap();
        assert_eq!(reconnected, player);
        assert_eq!(cm.number_of(player), Some(reg.number));
    }

    #[test]
    fn lobby_grace_expiry_is_polled_not_fired_directly() {
        let mut cm = ConnectionManager::new();
        let player = PlayerId::new();
        cm.register(player, "s1".into(), "A".into(), true, 0);
        cm.handle_lobby_disconnect(player, "s1", 0);

        assert!(cm.lobby_grace_expired_players(LOBBY_GRACE_MS - 1).is_empty());
        assert_eq!(cm.lobby_grace_expired_players(LOBBY_GRACE_MS), vec![player]);
    }

    #[test]
    fn reconnect_during_grace_cancels_it() {
        let mut cm = ConnectionManager::new();
        let player = PlayerId::new();
        let reg = cm.register(player, "s1".into(), "A".into(), true, 0);
        cm.handle_lobby_disconnect(player, "s1", 0);
        cm.reconnect(reg.token, "s2".into(), 10);
        assert!(cm.lobby_grace_expired_players(LOBBY_GRACE_MS).is_empty());
    }

    #[test]
    fn ready_count_only_considers_connected_players() {
        let mut cm = ConnectionManager::new();
        let a = PlayerId::new();
        let b = PlayerId::new();
        cm.register(a, "s1".into(), "A".into(), true, 0);
        cm.register(b, "s2".into(), "B".into(), true, 0);
        cm.set_player_ready(a, true);
        cm.handle_disconnect("s2");
        assert_eq!(cm.ready_count(), (1, 1));
    }
}
