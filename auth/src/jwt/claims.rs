use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Identity data a principal exposes to be embedded in token claims.
///
/// Implemented by the service's principal type so this crate never sees the
/// stored secret hash.
pub trait TokenSubject {
    /// Stable unique identifier, becomes the `sub` claim.
    fn subject(&self) -> &str;

    /// Human-readable contact attribute, becomes the `email` claim.
    fn email(&self) -> &str;
}

/// Distinguishes short-lived access tokens from long-lived refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims signed into every issued token.
///
/// Carries enough identity for downstream services to authorize without a
/// second lookup. Timestamps are Unix seconds. Both tokens of one pair carry
/// the same session ID, which the refresh flow consumes to rotate the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (principal identifier)
    pub sub: String,

    /// Principal email address
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token kind, serialized as `typ`
    #[serde(rename = "typ")]
    pub kind: TokenKind,

    /// Session the token belongs to, serialized as `sid`
    #[serde(rename = "sid")]
    pub session_id: String,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    /// Build claims for a subject issued at `now` and valid for `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - `now + ttl` is outside the representable range
    pub fn new<S: TokenSubject + ?Sized>(
        subject: &S,
        kind: TokenKind,
        session_id: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = expiry(now, ttl)?;

        Ok(Self {
            sub: subject.subject().to_string(),
            email: subject.email().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            kind,
            session_id: session_id.into(),
            iss: None,
        })
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: Option<String>) -> Self {
        self.iss = iss;
        self
    }

    /// Check if token is expired.
    ///
    /// A token is still valid at the exact second of its expiry.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// `now + ttl`, or `EncodingFailed` when it overflows.
pub(crate) fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, JwtError> {
    now.checked_add_signed(ttl).ok_or_else(|| {
        JwtError::EncodingFailed(format!(
            "expiry overflows: {} + {}s",
            now.to_rfc3339(),
            ttl.num_seconds()
        ))
    })
}

/// Access and refresh token produced together for one principal at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub issued_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
