use async_trait::async_trait;
use auth::TokenClaims;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::errors::StoreError;
use crate::domain::authentication::models::Authenticated;
use crate::domain::authentication::models::Principal;
use crate::domain::authentication::models::PrincipalId;

/// Port for authentication service operations.
#[async_trait]
pub trait AuthenticationServicePort: Send + Sync + 'static {
    /// Verify a credential and issue an access/refresh token pair.
    ///
    /// # Arguments
    /// * `identifier` - Login identifier (trimmed before lookup)
    /// * `secret` - Plaintext secret
    ///
    /// # Returns
    /// Principal profile and the issued token pair
    ///
    /// # Errors
    /// * `InvalidInput` - Identifier or secret is empty
    /// * `AuthenticationFailed` - Unknown identifier or wrong secret, indistinguishably
    /// * `HashingFailure` - Stored hash is malformed or hashing faulted
    /// * `TokenIssuance` - Signing failed
    /// * `DependencyUnavailable` - Credential store failed
    /// * `Timeout` - Credential store did not answer in time
    async fn login(&self, identifier: &str, secret: &str) -> Result<Authenticated, AuthError>;

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token's session is consumed first, so each refresh token
    /// works once.
    ///
    /// # Errors
    /// * `InvalidInput` - Token is empty
    /// * `TokenExpired` - Refresh token is past its expiry
    /// * `TokenInvalid` - Bad signature, structure, not a refresh token, or
    ///   already used or revoked
    /// * `AuthenticationFailed` - Principal no longer exists
    /// * `DependencyUnavailable` / `Timeout` - Store fault
    async fn refresh(&self, refresh_token: &str) -> Result<Authenticated, AuthError>;

    /// Revoke every outstanding refresh token of a principal.
    ///
    /// # Returns
    /// Number of sessions revoked
    ///
    /// # Errors
    /// * `DependencyUnavailable` / `Timeout` - Store fault
    async fn logout(&self, subject: &PrincipalId) -> Result<u64, AuthError>;

    /// Hash a new secret for provisioning or password change.
    ///
    /// # Errors
    /// * `InvalidInput` - Secret is empty
    /// * `HashingFailure` - Hashing faulted
    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError>;

    /// Verify an access token presented by a client.
    ///
    /// # Errors
    /// * `InvalidInput` - Token is empty
    /// * `TokenExpired` - Token is past its expiry
    /// * `TokenInvalid` - Bad signature, structure, or not an access token
    async fn verify_access_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Read access to stored principals.
///
/// Implementations never return soft-deleted principals. Retries and
/// cancellation belong to the implementation.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Find a principal by login identifier.
    ///
    /// # Returns
    /// Optional principal (None if not found)
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be queried
    /// * `Corrupt` - Stored record could not be mapped
    async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError>;

    /// Find a principal by the subject carried in its tokens.
    ///
    /// # Returns
    /// Optional principal (None if not found)
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be queried
    /// * `Corrupt` - Stored record could not be mapped
    async fn lookup_by_subject(
        &self,
        subject: &PrincipalId,
    ) -> Result<Option<Principal>, StoreError>;
}

/// Outstanding refresh-token sessions.
///
/// A session is recorded when a pair is issued and removed when its refresh
/// token is used or revoked, so only recorded sessions may refresh.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Record a newly issued session.
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be written
    async fn record(
        &self,
        session_id: &str,
        subject: &PrincipalId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove a session, reporting whether it was outstanding.
    ///
    /// Removal is atomic: of several concurrent calls for one session, at most
    /// one returns `true`.
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be written
    async fn consume(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Remove every session of a principal.
    ///
    /// # Returns
    /// Number of sessions removed
    ///
    /// # Errors
    /// * `Unavailable` - Store could not be written
    async fn revoke_all(&self, subject: &PrincipalId) -> Result<u64, StoreError>;
}
