//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// A `ProtocolError` always means a serialization problem, never a
/// networking or game-rule one — those live in their own crates.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, unknown event tags, missing
    /// required fields, wrong data types. At the connection boundary
    /// this maps to the `INVALID_EVENT` rejection.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates protocol rules — e.g. a
    /// connection's first message was not the required opening event.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
