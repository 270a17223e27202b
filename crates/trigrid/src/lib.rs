//! # Trigrid
//!
//! A server that matches two remote players into a session and referees
//! a turn-based board game over persistent WebSocket connections.
//!
//! The layering mirrors the workspace crates: transport frames come in,
//! the protocol crate gives them meaning, the session crate says who
//! sent them, and the engine decides what they do. This crate is the
//! glue — per-connection handler tasks and the accept loop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trigrid::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TrigridError> {
//!     let server = TrigridServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(AcceptClaims)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::Config;
pub use error::TrigridError;
pub use server::{TrigridServer, TrigridServerBuilder};

/// One-stop imports for building and talking to a Trigrid server.
pub mod prelude {
    pub use crate::{Config, TrigridError, TrigridServer, TrigridServerBuilder};
    pub use trigrid_engine::{Game, Lobby, Registry};
    pub use trigrid_protocol::{
        Cell, GameCode, GameEvent, GameResult, GameStatus, ListedLobby, LobbyCode,
        LobbyEvent, LobbyUser,
    };
    pub use trigrid_session::{AcceptClaims, AuthError, Authenticator};
}
