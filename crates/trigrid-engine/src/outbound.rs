//! Outbound queues from the engine to connection handlers.

use tokio::sync::mpsc;
use trigrid_protocol::{GameEvent, LobbyEvent};

/// An item on a player's outbound queue.
///
/// Lobbies and games never write to sockets; they push onto per-player
/// unbounded queues and the owning connection handler drains them. The
/// queue being unbounded is what keeps every broadcast a plain
/// non-suspending push: the authoritative mutation and its outcome are
/// committed before any byte hits the network, and a stalled reader
/// only grows its own queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound<E> {
    /// Deliver this event to the peer.
    Event(E),

    /// Flush anything already queued, then close the connection.
    /// This is how the referee performs a server-initiated close.
    Close,
}

/// Outbound queue handle for a lobby-scoped connection.
pub type LobbySender = mpsc::UnboundedSender<Outbound<LobbyEvent>>;

/// Outbound queue handle for a game-scoped connection.
pub type GameSender = mpsc::UnboundedSender<Outbound<GameEvent>>;
