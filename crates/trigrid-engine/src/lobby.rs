//! Pre-game waiting room.

use std::collections::HashMap;

use trigrid_protocol::{GameCode, LobbyCode, LobbyEvent, LobbyUser};

use crate::{LobbySender, Outbound};

/// Maximum number of members in a lobby.
pub const LOBBY_CAPACITY: usize = 2;

/// A waiting room for up to two players, keyed by a short join code.
///
/// Two states: open (`starting == false`) and starting. Setting the
/// starting flag is terminal for joins — a lobby is discarded after use,
/// never reopened.
///
/// Membership is an insertion-ordered list so that the game seats minted
/// from it are deterministic: seat 0 is whoever joined first. The
/// outbound-connection table is owned here; handlers only hold the
/// receiving ends.
pub struct Lobby {
    code: LobbyCode,
    owner: String,
    users: Vec<LobbyUser>,
    connections: HashMap<String, LobbySender>,
    starting: bool,
}

impl Lobby {
    /// Creates an empty lobby owned by `owner`.
    pub fn new(owner: impl Into<String>, code: LobbyCode) -> Self {
        Self {
            code,
            owner: owner.into(),
            users: Vec::with_capacity(LOBBY_CAPACITY),
            connections: HashMap::new(),
            starting: false,
        }
    }

    pub fn code(&self) -> &LobbyCode {
        &self.code
    }

    /// Id of the player who created the lobby; only they may start it.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Current members in join order.
    pub fn users(&self) -> &[LobbyUser] {
        &self.users
    }

    pub fn is_starting(&self) -> bool {
        self.starting
    }

    /// Admits `user`, or rejects without mutating anything.
    ///
    /// Rejected when the lobby is starting or already has two distinct
    /// members. Re-joining with an id that is already a member replaces
    /// that member's outbound channel instead of taking a second seat.
    /// On success the full membership snapshot is broadcast to everyone,
    /// including the new joiner.
    pub fn join(&mut self, user: LobbyUser, sender: LobbySender) -> bool {
        if self.starting {
            return false;
        }

        if let Some(existing) = self.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
            self.connections.insert(user.id.clone(), sender);
            tracing::debug!(code = %self.code, user = %user, "member re-joined");
            self.broadcast(self.state_sync());
            return true;
        }

        if self.users.len() >= LOBBY_CAPACITY {
            return false;
        }

        self.connections.insert(user.id.clone(), sender);
        self.users.push(user.clone());
        tracing::info!(
            code = %self.code,
            user = %user,
            members = self.users.len(),
            "member joined"
        );
        self.broadcast(self.state_sync());
        true
    }

    /// Removes the member with `user_id` (no-op if absent), broadcasts
    /// the updated snapshot to whoever remains, and returns the new
    /// membership size. A return of 0 tells the caller to close the
    /// lobby through the registry.
    pub fn leave(&mut self, user_id: &str) -> usize {
        let before = self.users.len();
        self.users.retain(|u| u.id != user_id);
        self.connections.remove(user_id);

        if self.users.len() != before {
            tracing::info!(
                code = %self.code,
                user_id,
                members = self.users.len(),
                "member left"
            );
            self.broadcast(self.state_sync());
        }

        self.users.len()
    }

    /// Flags the lobby as starting and tells every member to migrate to
    /// the game identified by `game_code`. Fails (no mutation, no
    /// broadcast) when fewer than two members are present.
    ///
    /// Purely a notification step: the authoritative game already exists
    /// in the registry by the time this runs.
    pub fn start(&mut self, game_code: &GameCode) -> bool {
        if self.users.len() < LOBBY_CAPACITY {
            return false;
        }

        self.starting = true;
        tracing::info!(code = %self.code, game_code = %game_code, "lobby starting");
        self.broadcast(LobbyEvent::LobbyStarting {
            code: game_code.clone(),
            starting: true,
        });
        true
    }

    fn state_sync(&self) -> LobbyEvent {
        LobbyEvent::StateSync {
            owner: self.owner.clone(),
            code: self.code.clone(),
            users: self.users.clone(),
        }
    }

    /// Queues `event` on every member's outbound channel. A closed
    /// channel (handler already gone) is skipped; membership is only
    /// ever changed through [`leave`](Self::leave).
    fn broadcast(&self, event: LobbyEvent) {
        for (user_id, tx) in &self.connections {
            if tx.send(Outbound::Event(event.clone())).is_err() {
                tracing::debug!(code = %self.code, %user_id, "outbound channel closed");
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
