//! Player identity for Trigrid.
//!
//! Credential issuance and storage live outside this codebase — an auth
//! provider (JWT service, OAuth, anything) vouches for who a player is.
//! This crate defines only the seam the server consumes:
//!
//! - [`Authenticator`] — turns the identity claim a connection opens
//!   with into a canonical, stable [`LobbyUser`](trigrid_protocol::LobbyUser)
//! - [`AcceptClaims`] — the permissive development implementation
//! - [`AuthError`] — what a rejection looks like
//!
//! There is no session table and no reconnection state here on purpose:
//! a disconnect is immediately terminal for the lobby or game it
//! happened in, so the server has nothing to remember between
//! connections.

#![allow(async_fn_in_trait)]

mod auth;
mod error;

pub use auth::{AcceptClaims, Authenticator};
pub use error::AuthError;
