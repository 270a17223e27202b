//! Game-scope events and board types.
//!
//! Same envelope convention as the lobby scope: adjacently tagged
//! `{ "type": ..., "data": ... }` with SCREAMING_SNAKE_CASE tags.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::LobbyUser;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// One cell of the 3×3 board.
///
/// The board travels on the wire as a flat 9-element array of strings —
/// `""` for an empty cell, `"X"` or `"O"` for a placed mark — so the
/// variants rename to exactly those strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    /// Returns `true` for an unoccupied cell.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, "."),
            Cell::X => write!(f, "X"),
            Cell::O => write!(f, "O"),
        }
    }
}

// ---------------------------------------------------------------------------
// Status and result
// ---------------------------------------------------------------------------

/// Lifecycle state of a game session.
///
/// Transitions run strictly forward:
///
/// ```text
/// Forming → Starting → Started → Ended
/// ```
///
/// `Forming`: waiting for both seats to connect. `Starting`: first turn
/// being decided (never observable across a suspension point).
/// `Started`: moves are accepted from the current seat. `Ended`:
/// terminal — no transitions out, no further moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Forming,
    Starting,
    Started,
    Ended,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Forming => write!(f, "FORMING"),
            GameStatus::Starting => write!(f, "STARTING"),
            GameStatus::Started => write!(f, "STARTED"),
            GameStatus::Ended => write!(f, "ENDED"),
        }
    }
}

/// Outcome of a termination check.
///
/// `winner` and `combination` are both `None` for a tie; for a win the
/// combination is the triple of board indices that completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub is_over: bool,
    pub status: GameStatus,
    pub winner: Option<LobbyUser>,
    pub combination: Option<[usize; 3]>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The closed set of game-scope messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    /// Client → server: required first message after opening a
    /// game-scoped connection; names the seat this connection speaks for.
    UserConnected { user_id: String },

    /// Client → server: place a mark on `tile_index` (0..=8). Also
    /// server → client: the same payload relayed verbatim to the
    /// opponent so both clients render the click immediately.
    UserTurn { tile_index: usize },

    /// Server → client: full state snapshot. `turn` is the player whose
    /// move it is.
    GameSync {
        status: GameStatus,
        users: Vec<LobbyUser>,
        board: [Cell; 9],
        turn: LobbyUser,
        total_turns: u32,
    },

    /// Server → client: names the randomly chosen first-turn player.
    FirstTurn(LobbyUser),

    /// Server → client: terminal result broadcast.
    Result(GameResult),

    /// Server → client: the connection does not belong to either seat.
    Unauthorized { error: String },

    /// Server → client: the other seat's connection dropped mid-game.
    UserDisconnected { error: String },

    /// Server → client: the last message could not be understood.
    InvalidEvent { error: String },
}

impl GameEvent {
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            error: "Unauthorized".into(),
        }
    }

    pub fn user_disconnected() -> Self {
        Self::UserDisconnected {
            error: "User disconnected".into(),
        }
    }

    pub fn invalid_event() -> Self {
        Self::InvalidEvent {
            error: "Invalid Event".into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
