//! Authoritative board referee for one match.

use std::collections::HashMap;

use rand::Rng;
use trigrid_protocol::{Cell, GameCode, GameEvent, GameResult, GameStatus, LobbyUser};

use crate::{GameSender, Outbound};

/// The 8 winning lines of the 3×3 board, addressed as flat indices:
/// rows, then columns, then the two diagonals.
pub const WINNING_TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// One match between exactly two seats.
///
/// Seats are fixed at creation from the lobby membership snapshot:
/// seat 0 plays `X`, seat 1 plays `O`. Status runs strictly forward,
/// `Forming → Starting → Started → Ended`, with `Ended` terminal. The
/// `Starting` window exists only inside [`start_game`](Self::start_game)
/// — the struct is never observable in that state across an await point.
///
/// The connection table starts empty and fills as players open their
/// game-scoped connections. Re-binding a live seat's channel is allowed
/// (a client may replace its connection while the game is open); once
/// the game is reclaimed there is nothing to come back to.
pub struct Game {
    code: GameCode,
    users: [LobbyUser; 2],
    connections: HashMap<String, GameSender>,
    status: GameStatus,
    board: [Cell; 9],
    turn: usize,
    total_turns: u32,
}

impl Game {
    /// Creates a game in `Forming` for the two given seats.
    pub fn new(code: GameCode, users: [LobbyUser; 2]) -> Self {
        Self {
            code,
            users,
            connections: HashMap::new(),
            status: GameStatus::Forming,
            board: [Cell::Empty; 9],
            turn: 0,
            total_turns: 0,
        }
    }

    pub fn code(&self) -> &GameCode {
        &self.code
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// The two seats, in lobby join order.
    pub fn users(&self) -> &[LobbyUser; 2] {
        &self.users
    }

    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    /// Binds an outbound channel for `user_id`.
    ///
    /// Returns `false` for anyone who isn't one of the two recorded
    /// seats. A known seat re-connecting overwrites its prior channel.
    pub fn connect_user(&mut self, user_id: &str, sender: GameSender) -> bool {
        if !self.users.iter().any(|u| u.id == user_id) {
            tracing::warn!(code = %self.code, user_id, "connect from unknown seat");
            return false;
        }
        self.connections.insert(user_id.to_string(), sender);
        tracing::info!(
            code = %self.code,
            user_id,
            connected = self.connections.len(),
            "seat connected"
        );
        true
    }

    /// Starts the match once both seats are connected.
    ///
    /// No-op unless status is `Forming` with two bound channels. Picks
    /// the first turn uniformly at random, broadcasts `FIRST_TURN`
    /// naming that player, then `Started` and a full state sync.
    pub fn start_game(&mut self) {
        if self.status != GameStatus::Forming || self.connections.len() < 2 {
            return;
        }

        self.status = GameStatus::Starting;
        self.decide_turn();
        self.status = GameStatus::Started;
        self.game_sync();
    }

    fn decide_turn(&mut self) {
        self.turn = rand::rng().random_range(0..2);
        let first = self.users[self.turn].clone();
        tracing::info!(code = %self.code, first = %first, "first turn decided");
        self.broadcast(GameEvent::FirstTurn(first));
    }

    /// Broadcasts a full state snapshot to every bound connection.
    pub fn game_sync(&self) {
        self.broadcast(GameEvent::GameSync {
            status: self.status,
            users: self.users.to_vec(),
            board: self.board,
            turn: self.users[self.turn].clone(),
            total_turns: self.total_turns,
        });
    }

    /// The single authoritative entry point for a move.
    ///
    /// Returns `true` when the move ended the game. Rejections are
    /// silent no-ops returning `false` — no state change, no broadcast;
    /// the client reconciles from the next state sync:
    ///
    /// - the game already ended, or `user_id` doesn't hold the turn
    /// - `event` is not a `USER_TURN` placement
    /// - the target tile is out of range or already occupied
    ///
    /// An accepted move writes the seat's mark, relays the raw event to
    /// the opponent (so their client renders the click without waiting
    /// for the sync), broadcasts a sync, and then settles the outcome:
    /// win or tie ends the game; otherwise the turn flips and a second
    /// sync announces whose move it is.
    pub fn apply_turn(&mut self, user_id: &str, event: &GameEvent) -> bool {
        if self.status == GameStatus::Ended || self.users[self.turn].id != user_id {
            return false;
        }

        let &GameEvent::UserTurn { tile_index } = event else {
            return false;
        };
        if tile_index >= self.board.len() || !self.board[tile_index].is_empty() {
            return false;
        }

        let mark = self.current_mark();
        self.board[tile_index] = mark;
        tracing::debug!(
            code = %self.code,
            user_id,
            tile_index,
            %mark,
            "mark placed"
        );

        self.relay_to_opponent(user_id, event);
        self.game_sync();

        match self.settle_outcome(user_id) {
            Some(result) => {
                self.end_game(result);
                true
            }
            None => {
                self.advance_turn();
                self.game_sync();
                false
            }
        }
    }

    /// Checks the board after a placement by `user_id`'s mark.
    /// `Some` means the game is over (win or tie).
    fn settle_outcome(&self, user_id: &str) -> Option<GameResult> {
        if let Some(combination) = self.check_win(self.current_mark()) {
            let winner = self.users.iter().find(|u| u.id == user_id).cloned();
            return Some(GameResult {
                is_over: true,
                status: GameStatus::Ended,
                winner,
                combination: Some(combination),
            });
        }

        if self.is_board_full() {
            return Some(GameResult {
                is_over: true,
                status: GameStatus::Ended,
                winner: None,
                combination: None,
            });
        }

        None
    }

    /// Returns the first triple fully occupied by `mark`, if any.
    ///
    /// A single placement can complete at most one outcome, so "first"
    /// is never ambiguous in practice.
    pub fn check_win(&self, mark: Cell) -> Option<[usize; 3]> {
        WINNING_TRIPLES
            .into_iter()
            .find(|triple| triple.iter().all(|&i| self.board[i] == mark))
    }

    pub fn is_board_full(&self) -> bool {
        self.board.iter().all(|cell| !cell.is_empty())
    }

    fn advance_turn(&mut self) {
        self.turn = 1 - self.turn;
        self.total_turns += 1;
    }

    fn current_mark(&self) -> Cell {
        if self.turn == 0 { Cell::X } else { Cell::O }
    }

    fn relay_to_opponent(&self, user_id: &str, event: &GameEvent) {
        for user in &self.users {
            if user.id != user_id {
                self.send_to(&user.id, event.clone());
            }
        }
    }

    fn end_game(&mut self, result: GameResult) {
        self.status = GameStatus::Ended;
        tracing::info!(
            code = %self.code,
            winner = result.winner.as_ref().map(|u| u.id.as_str()).unwrap_or("none"),
            "game over"
        );
        self.broadcast(GameEvent::Result(result));
        // Server-initiated close for both seats; the queued events above
        // flush before the handlers act on this.
        for tx in self.connections.values() {
            let _ = tx.send(Outbound::Close);
        }
    }

    /// Drops `user_id`'s channel and tells whoever is left.
    ///
    /// The caller is responsible for reclaiming the game from the
    /// registry unless the status is already `Ended` (natural
    /// termination has its own closure path).
    pub fn handle_disconnect(&mut self, user_id: &str) {
        self.connections.remove(user_id);
        tracing::info!(code = %self.code, user_id, "seat disconnected");
        self.broadcast(GameEvent::user_disconnected());
    }

    fn broadcast(&self, event: GameEvent) {
        for (user_id, tx) in &self.connections {
            if tx.send(Outbound::Event(event.clone())).is_err() {
                tracing::debug!(code = %self.code, %user_id, "outbound channel closed");
            }
        }
    }

    fn send_to(&self, user_id: &str, event: GameEvent) {
        if let Some(tx) = self.connections.get(user_id) {
            let _ = tx.send(Outbound::Event(event));
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
