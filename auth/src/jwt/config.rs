use std::fmt;

use chrono::Duration;
use chrono::Utc;

use super::errors::JwtError;

/// Validated signing configuration for [`TokenIssuer`](super::TokenIssuer).
///
/// Built once at startup. Every check happens here so a bad configuration
/// aborts the process instead of failing the first login.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: Option<String>,
}

impl TokenConfig {
    /// Create a token configuration.
    ///
    /// # Arguments
    /// * `secret` - HMAC signing secret
    /// * `access_ttl` - Lifetime of access tokens
    /// * `refresh_ttl` - Lifetime of refresh tokens, strictly longer than `access_ttl`
    ///
    /// # Errors
    /// * `InvalidConfig` - Empty secret, non-positive TTL, refresh TTL not above
    ///   access TTL, or a TTL so large the expiry cannot be represented
    pub fn new(
        secret: impl AsRef<[u8]>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, JwtError> {
        let secret = secret.as_ref();

        if secret.is_empty() {
            return Err(JwtError::InvalidConfig(
                "signing secret must not be empty".to_string(),
            ));
        }

        if access_ttl <= Duration::zero() {
            return Err(JwtError::InvalidConfig(format!(
                "access token TTL must be positive, got {}s",
                access_ttl.num_seconds()
            )));
        }

        if refresh_ttl <= access_ttl {
            return Err(JwtError::InvalidConfig(format!(
                "refresh token TTL ({}s) must be greater than access token TTL ({}s)",
                refresh_ttl.num_seconds(),
                access_ttl.num_seconds()
            )));
        }

        if Utc::now().checked_add_signed(refresh_ttl).is_none() {
            return Err(JwtError::InvalidConfig(format!(
                "refresh token TTL ({}s) is out of range",
                refresh_ttl.num_seconds()
            )));
        }

        Ok(Self {
            secret: secret.to_vec(),
            access_ttl,
            refresh_ttl,
            issuer: None,
        })
    }

    /// Set the `iss` claim written into tokens and required on verification.
    pub fn with_issuer(mut self, issuer: impl ToString) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}
