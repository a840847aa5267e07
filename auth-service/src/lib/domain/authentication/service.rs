use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::IssuedTokenPair;
use auth::TokenClaims;
use auth::TokenKind;
use chrono::Utc;
use tokio::task;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::errors::CredentialError;
use crate::domain::authentication::errors::StoreError;
use crate::domain::authentication::models::Authenticated;
use crate::domain::authentication::models::Credential;
use crate::domain::authentication::models::PrincipalId;
use crate::domain::authentication::ports::AuthenticationServicePort;
use crate::domain::authentication::ports::CredentialStore;
use crate::domain::authentication::ports::RefreshTokenStore;

/// Domain service implementation for authentication.
///
/// Holds no per-attempt state: the stores and authenticator are shared, so any
/// number of logins may run concurrently. Password work runs on the blocking
/// pool.
pub struct AuthenticationService<CS, RS>
where
    CS: CredentialStore,
    RS: RefreshTokenStore,
{
    store: Arc<CS>,
    refresh_tokens: Arc<RS>,
    authenticator: Arc<Authenticator>,
    lookup_timeout: Option<Duration>,
}

impl<CS, RS> AuthenticationService<CS, RS>
where
    CS: CredentialStore,
    RS: RefreshTokenStore,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential store implementation
    /// * `refresh_tokens` - Outstanding refresh-token sessions
    /// * `authenticator` - Password verification and token issuance
    ///
    /// # Returns
    /// Service without a store deadline
    pub fn new(store: Arc<CS>, refresh_tokens: Arc<RS>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            refresh_tokens,
            authenticator,
            lookup_timeout: None,
        }
    }

    /// Abandon attempts whose store calls take longer than `timeout`.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, AuthError>
    where
        T: Send,
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        let result = match self.lookup_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(
                        operation,
                        timeout_ms = limit.as_millis() as u64,
                        "Store call timed out"
                    );
                    return Err(AuthError::Timeout);
                }
            },
            None => call.await,
        };

        result.map_err(|e| {
            tracing::error!(operation, error = %e, "Store call failed");
            AuthError::DependencyUnavailable(e)
        })
    }

    async fn record_session(
        &self,
        principal_id: &PrincipalId,
        tokens: &IssuedTokenPair,
    ) -> Result<(), AuthError> {
        self.bounded(
            "record_session",
            self.refresh_tokens
                .record(&tokens.session_id, principal_id, tokens.refresh_expires_at),
        )
        .await
    }

    fn validate(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::EmptyToken.into());
        }

        self.authenticator
            .validate_token(token, kind, Utc::now())
            .map_err(|e| {
                tracing::warn!(kind = %kind, error = %e, "Token rejected");
                AuthError::from(e)
            })
    }
}

#[async_trait]
impl<CS, RS> AuthenticationServicePort for AuthenticationService<CS, RS>
where
    CS: CredentialStore,
    RS: RefreshTokenStore,
{
    async fn login(&self, identifier: &str, secret: &str) -> Result<Authenticated, AuthError> {
        let credential = Credential::new(identifier, secret)?;

        let found = self
            .bounded("lookup", self.store.lookup(credential.identifier()))
            .await?;

        let identifier = credential.identifier().to_string();
        let secret = credential.into_secret();
        let authenticator = Arc::clone(&self.authenticator);

        let Some(principal) = found else {
            // Same work and same error as a wrong secret
            if let Err(e) = task::spawn_blocking(move || authenticator.reject(&secret)).await {
                tracing::error!(error = %e, "Decoy verification task failed");
            }
            tracing::warn!(
                identifier = %identifier,
                reason = "unknown_identifier",
                "Login rejected"
            );
            return Err(AuthError::AuthenticationFailed);
        };

        let (principal, outcome) = task::spawn_blocking(move || {
            let now = Utc::now();
            let outcome =
                authenticator.authenticate(&secret, &principal.password_hash, &principal, now);
            (principal, outcome)
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            AuthError::HashingFailure
        })?;

        match outcome {
            Ok(tokens) => {
                self.record_session(&principal.id, &tokens).await?;
                tracing::info!(principal_id = %principal.id, "Login succeeded");
                Ok(Authenticated {
                    principal: principal.profile(),
                    tokens,
                })
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::warn!(
                    principal_id = %principal.id,
                    reason = "secret_mismatch",
                    "Login rejected"
                );
                Err(AuthError::AuthenticationFailed)
            }
            Err(AuthenticationError::PasswordError(e)) => {
                tracing::error!(
                    principal_id = %principal.id,
                    error = %e,
                    "Stored password hash could not be verified"
                );
                Err(AuthError::from(e))
            }
            Err(AuthenticationError::JwtError(e)) => {
                tracing::error!(principal_id = %principal.id, error = %e, "Token issuance failed");
                Err(AuthError::from(e))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Authenticated, AuthError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        let subject = PrincipalId::new(claims.sub).map_err(|_| AuthError::TokenInvalid)?;

        let outstanding = self
            .bounded("consume_session", self.refresh_tokens.consume(&claims.session_id))
            .await?;
        if !outstanding {
            tracing::warn!(
                principal_id = %subject,
                session_id = %claims.session_id,
                reason = "session_not_outstanding",
                "Refresh rejected"
            );
            return Err(AuthError::TokenInvalid);
        }

        let principal = self
            .bounded("lookup_by_subject", self.store.lookup_by_subject(&subject))
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    principal_id = %subject,
                    reason = "unknown_subject",
                    "Refresh rejected"
                );
                AuthError::AuthenticationFailed
            })?;

        let tokens = self
            .authenticator
            .issue_tokens(&principal, Utc::now())
            .map_err(|e| {
                tracing::error!(principal_id = %principal.id, error = %e, "Token issuance failed");
                AuthError::from(e)
            })?;
        self.record_session(&principal.id, &tokens).await?;

        tracing::info!(principal_id = %principal.id, "Tokens refreshed");

        Ok(Authenticated {
            principal: principal.profile(),
            tokens,
        })
    }

    async fn logout(&self, subject: &PrincipalId) -> Result<u64, AuthError> {
        let revoked = self
            .bounded("revoke_sessions", self.refresh_tokens.revoke_all(subject))
            .await?;

        tracing::info!(principal_id = %subject, revoked, "Sessions revoked");
        Ok(revoked)
    }

    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError> {
        if secret.trim().is_empty() {
            return Err(CredentialError::EmptySecret.into());
        }

        let secret = secret.to_string();
        let authenticator = Arc::clone(&self.authenticator);

        task::spawn_blocking(move || authenticator.hash_password(&secret))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                AuthError::HashingFailure
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                AuthError::from(e)
            })
    }

    async fn verify_access_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.validate(token, TokenKind::Access)
    }
}
