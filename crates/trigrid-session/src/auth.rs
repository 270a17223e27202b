//! Authentication hook for validating player identity.
//!
//! Trigrid doesn't implement authentication itself — that's your auth
//! provider's job. The framework defines the [`Authenticator`] trait:
//! a single async method that takes the identity claim presented when a
//! connection opens and returns the canonical identity or an error.
//! Swap implementations freely: JWT validation in production,
//! [`AcceptClaims`] in development, a mock in tests — without changing
//! any framework code.

use trigrid_protocol::LobbyUser;

use crate::AuthError;

/// Validates a connection's opening identity claim.
///
/// `Send + Sync + 'static` because the authenticator is shared across
/// connection handler tasks for the lifetime of the server.
///
/// # Example
///
/// ```rust
/// use trigrid_protocol::LobbyUser;
/// use trigrid_session::{AuthError, Authenticator};
///
/// /// Only players on the allow list get in.
/// struct AllowList(Vec<String>);
///
/// impl Authenticator for AllowList {
///     async fn authenticate(
///         &self,
///         claim: &LobbyUser,
///     ) -> Result<LobbyUser, AuthError> {
///         if self.0.iter().any(|id| *id == claim.id) {
///             Ok(claim.clone())
///         } else {
///             Err(AuthError::Rejected(claim.id.clone()))
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `claim` and returns the canonical identity for this
    /// connection. The returned identity is immutable for the
    /// connection's lifetime.
    fn authenticate(
        &self,
        claim: &LobbyUser,
    ) -> impl std::future::Future<Output = Result<LobbyUser, AuthError>> + Send;
}

/// An [`Authenticator`] that accepts any well-formed claim verbatim.
///
/// Suitable for development and tests only — it performs no verification
/// beyond rejecting empty ids, so any client can claim any identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptClaims;

impl Authenticator for AcceptClaims {
    async fn authenticate(&self, claim: &LobbyUser) -> Result<LobbyUser, AuthError> {
        if claim.id.is_empty() {
            return Err(AuthError::MalformedClaim("empty user id".into()));
        }
        Ok(claim.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_claims_echoes_the_claim() {
        let claim = LobbyUser::new("u1", "alice");
        let identity = AcceptClaims.authenticate(&claim).await.unwrap();
        assert_eq!(identity, claim);
    }

    #[tokio::test]
    async fn test_accept_claims_rejects_empty_id() {
        let claim = LobbyUser::new("", "alice");
        let result = AcceptClaims.authenticate(&claim).await;
        assert!(matches!(result, Err(AuthError::MalformedClaim(_))));
    }
}
