//! Lobby-scope events.
//!
//! Every message on a lobby-scoped connection is one of these variants.
//! `#[serde(tag = "type", content = "data")]` produces the adjacently
//! tagged envelope the clients expect:
//!
//! ```text
//! { "type": "STATE_SYNC", "data": { "owner": "u1", "code": "K4QJ7W", "users": [...] } }
//! ```
//!
//! `rename_all = "SCREAMING_SNAKE_CASE"` turns variant names into the
//! wire tags (`StateSync` → `"STATE_SYNC"`). Unknown tags or payloads of
//! the wrong shape fail to deserialize; callers map any decode failure to
//! [`LobbyEvent::invalid_event`] rather than crashing.

use serde::{Deserialize, Serialize};

use crate::{GameCode, ListedLobby, LobbyCode, LobbyUser};

/// The closed set of lobby-scope messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LobbyEvent {
    /// Server → client: response to a create-lobby call.
    CreateLobby { code: LobbyCode },

    /// Client → server: required first message on a lobby connection.
    /// The payload is the joining player's identity itself.
    JoinLobby(LobbyUser),

    /// Client → server: ask the server to start the game. Only effective
    /// when the sender is the lobby owner; anyone else is silently
    /// ignored.
    StartLobby { user_id: String },

    /// Server → client: full membership snapshot, broadcast after every
    /// join and leave.
    StateSync {
        owner: String,
        code: LobbyCode,
        users: Vec<LobbyUser>,
    },

    /// Server → client: the lobby is starting; migrate to the game
    /// connection identified by `code`.
    LobbyStarting { code: GameCode, starting: bool },

    /// Server → client: the lobby already has two members (or is
    /// starting). Sent once, then the connection is closed.
    LobbyFull { error: String },

    /// Server → client: response to a list-lobbies call.
    LobbyList { lobbies: Vec<ListedLobby> },

    /// Server → client: the last message could not be understood.
    InvalidEvent { error: String },
}

impl LobbyEvent {
    /// The canonical capacity-rejection payload.
    pub fn lobby_full() -> Self {
        Self::LobbyFull {
            error: "Lobby Full".into(),
        }
    }

    /// The canonical rejection for malformed or unrecognized input.
    pub fn invalid_event() -> Self {
        Self::InvalidEvent {
            error: "Invalid Event".into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
