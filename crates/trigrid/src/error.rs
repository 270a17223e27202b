//! Unified error type for the Trigrid server.

use trigrid_protocol::ProtocolError;
use trigrid_session::AuthError;
use trigrid_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// Only infrastructure failures surface here — engine rejections are
/// boolean/optional results plus outbound notifications by design, so
/// game rules never appear in this enum.
#[derive(Debug, thiserror::Error)]
pub enum TrigridError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An identity-layer error.
    #[error(transparent)]
    Auth(#[from] AuthError),
}
