//! Matchmaking and game-session engine for Trigrid.
//!
//! This crate is the authoritative core: it owns who is waiting where,
//! whose turn it is, and when a session is over. Nothing in here touches
//! a socket — connection handlers feed validated events in and drain
//! outbound queues per player.
//!
//! # Key types
//!
//! - [`Registry`] — process-wide lobby/game tables and code minting
//! - [`Lobby`] — pre-game waiting room for up to two players
//! - [`Game`] — turn-based board referee for exactly two seats
//! - [`Outbound`] — items on a player's outbound queue
//!
//! # Concurrency model
//!
//! Each `Lobby` and `Game` lives behind its own `tokio::Mutex`, handed
//! out by the registry as `Arc<Mutex<_>>`. At most two connection
//! handler tasks (plus, transiently, a start-lobby call) ever contend
//! for one entity, so a mutex per entity is all the serialization the
//! invariants need. Every mutating method is synchronous: broadcasts are
//! unbounded-channel pushes, so state commits atomically under the lock
//! and a slow reader can never stall a turn.
//!
//! Lock order is registry → entity. No code path acquires the registry
//! lock while holding an entity lock.

mod game;
mod lobby;
mod outbound;
mod registry;

pub use game::{Game, WINNING_TRIPLES};
pub use lobby::{LOBBY_CAPACITY, Lobby};
pub use outbound::{GameSender, LobbySender, Outbound};
pub use registry::Registry;
