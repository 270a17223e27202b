//! Wire protocol for Trigrid.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`LobbyUser`], [`LobbyCode`], [`GameCode`], board and
//!   status types) — the structures that travel on the wire.
//! - **Events** ([`LobbyEvent`], [`GameEvent`]) — the closed set of
//!   `{ "type": ..., "data": ... }` envelopes for each connection scope.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the engine
//! (lobbies and games). It doesn't know about connections or turn order —
//! it only knows how to serialize and deserialize events.
//!
//! ```text
//! Transport (frames) → Protocol (LobbyEvent / GameEvent) → Engine
//! ```

mod codec;
mod error;
mod game;
mod lobby;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use game::{Cell, GameEvent, GameResult, GameStatus};
pub use lobby::LobbyEvent;
pub use types::{GameCode, ListedLobby, LobbyCode, LobbyUser};
