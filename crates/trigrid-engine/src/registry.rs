//! Session registry: the process-wide lobby and game tables.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use trigrid_protocol::{GameCode, ListedLobby, LobbyCode, LobbyUser};

use crate::{Game, Lobby};

/// Alphabet for session codes: uppercase letters and digits with the
/// easily-confused characters (`I`, `O`, `0`, `1`) removed, since codes
/// are read aloud and typed by humans.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Code length. 32^6 ≈ one billion codes, so a collision against the
/// handful of live sessions is vanishingly rare per attempt.
const CODE_LEN: usize = 6;

/// Owns the lifetime of every [`Lobby`] and [`Game`] in the process.
///
/// Constructed once at server start and injected into connection
/// handlers behind a single `tokio::Mutex` — there is deliberately no
/// global singleton. That outer lock serializes table mutation and code
/// generation; the per-entity `Arc<Mutex<_>>` handles it hands out
/// serialize access to each lobby/game independently.
///
/// Lock order is registry → entity (`start_lobby` is the only method
/// that nests them); callers must never acquire the registry while
/// holding an entity lock.
pub struct Registry {
    lobbies: HashMap<LobbyCode, Arc<Mutex<Lobby>>>,
    games: HashMap<GameCode, Arc<Mutex<Game>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            lobbies: HashMap::new(),
            games: HashMap::new(),
        }
    }

    /// Creates a lobby owned by `owner` and returns its join code.
    ///
    /// The code is regenerated until it misses every live lobby, so the
    /// returned code is always unique; exhaustion of the code space is
    /// not modeled.
    pub fn create_lobby(&mut self, owner: &str) -> LobbyCode {
        let code = loop {
            let candidate = LobbyCode(random_code());
            if !self.lobbies.contains_key(&candidate) {
                break candidate;
            }
        };

        let lobby = Lobby::new(owner, code.clone());
        self.lobbies.insert(code.clone(), Arc::new(Mutex::new(lobby)));
        tracing::info!(%code, owner, lobbies = self.lobbies.len(), "lobby created");
        code
    }

    /// Looks up a lobby handle by code.
    pub fn lobby(&self, code: &LobbyCode) -> Option<Arc<Mutex<Lobby>>> {
        self.lobbies.get(code).cloned()
    }

    /// Removes a lobby. No-op if the code is unknown.
    pub fn close_lobby(&mut self, code: &LobbyCode) {
        if self.lobbies.remove(code).is_some() {
            tracing::info!(%code, lobbies = self.lobbies.len(), "lobby closed");
        }
    }

    /// Snapshot of every live lobby for discovery UIs.
    ///
    /// Iteration order follows the underlying table and is not stable
    /// across calls while lobbies open and close concurrently.
    pub async fn list_lobbies(&self) -> Vec<ListedLobby> {
        let mut listed = Vec::with_capacity(self.lobbies.len());
        for (code, lobby) in &self.lobbies {
            let lobby = lobby.lock().await;
            listed.push(ListedLobby {
                code: code.clone(),
                owner: lobby.owner().to_string(),
                players: lobby.users().to_vec(),
            });
        }
        listed
    }

    /// Mints a game from the lobby's current membership.
    ///
    /// Returns `None` when the lobby doesn't exist, isn't exactly full,
    /// or has already started. On success the new game holds a copy of
    /// the two members — lobby and game never alias mutable state — and
    /// the lobby itself stays registered: its members still hold
    /// lobby-scoped connections, and teardown of those drives closure.
    pub async fn start_lobby(&mut self, code: &LobbyCode) -> Option<GameCode> {
        let lobby = self.lobbies.get(code)?.clone();
        let seats = {
            let lobby = lobby.lock().await;
            if lobby.is_starting() {
                return None;
            }
            match lobby.users() {
                [a, b] => [a.clone(), b.clone()],
                _ => return None,
            }
        };

        let game_code = loop {
            let candidate = GameCode(random_code());
            if !self.games.contains_key(&candidate) {
                break candidate;
            }
        };

        let game = Game::new(game_code.clone(), seats);
        self.games
            .insert(game_code.clone(), Arc::new(Mutex::new(game)));
        tracing::info!(lobby = %code, game = %game_code, "game minted from lobby");
        Some(game_code)
    }

    /// Looks up a game handle by code.
    pub fn game(&self, code: &GameCode) -> Option<Arc<Mutex<Game>>> {
        self.games.get(code).cloned()
    }

    /// Removes a game. No-op if the code is unknown.
    pub fn close_game(&mut self, code: &GameCode) {
        if self.games.remove(code).is_some() {
            tracing::info!(%code, games = self.games.len(), "game closed");
        }
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates one candidate session code from the thread-local CSPRNG.
fn random_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
