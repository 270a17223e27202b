//! Identity and session-code types shared by both connection scopes.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Player identity
// ---------------------------------------------------------------------------

/// A player's identity as supplied by the (external) authenticator.
///
/// The `id` is an opaque stable identifier; `username` is the display
/// name shown to the other player. The identity is fixed for the lifetime
/// of a connection — a connection never changes who it speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyUser {
    pub id: String,
    pub username: String,
}

impl LobbyUser {
    /// Convenience constructor, mostly for tests and examples.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

impl fmt::Display for LobbyUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

// ---------------------------------------------------------------------------
// Session codes
// ---------------------------------------------------------------------------

/// A short, human-typable code identifying a lobby.
///
/// Newtype wrapper so a `LobbyCode` can't be passed where a [`GameCode`]
/// is expected. `#[serde(transparent)]` makes it travel as a plain JSON
/// string, e.g. `"K4QJ7W"`, not `{ "0": "K4QJ7W" }`.
///
/// Codes are shared out-of-band for humans to type, so they are not
/// treated as secrets; uniqueness within the registry is enforced by the
/// registry itself, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyCode(pub String);

impl LobbyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// A short, human-typable code identifying a game.
///
/// Same newtype pattern as [`LobbyCode`]. A game code is minted when a
/// lobby starts and tells both clients where to migrate their
/// connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(pub String);

impl GameCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// One row of the lobby-discovery listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedLobby {
    /// The lobby's join code.
    pub code: LobbyCode,
    /// Id of the player who created the lobby.
    pub owner: String,
    /// Current members, in join order.
    pub players: Vec<LobbyUser>,
}

// =========================================================================
// Tests
// =========================================================================
