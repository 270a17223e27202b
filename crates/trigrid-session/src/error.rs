//! Error types for the identity layer.

/// Errors that can occur while authenticating a connection.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The claim was structurally unusable (empty id, bad encoding).
    #[error("malformed identity claim: {0}")]
    MalformedClaim(String),

    /// The auth provider refused the claim for player `{0}`.
    #[error("identity rejected for {0}")]
    Rejected(String),
}
