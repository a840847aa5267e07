use chrono::DateTime;
use chrono::Utc;

use crate::jwt::IssuedTokenPair;
use crate::jwt::JwtError;
use crate::jwt::TokenClaims;
use crate::jwt::TokenIssuer;
use crate::jwt::TokenKind;
use crate::jwt::TokenSubject;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-principals";

/// Authentication coordinator combining password verification and token issuance.
///
/// Every operation here is CPU-bound and synchronous. Async callers should run
/// them on a blocking thread.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
    decoy_hash: String,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// Hashes a decoy password up front so [`reject`](Self::reject) costs the
    /// same as a real verification.
    ///
    /// # Arguments
    /// * `password_hasher` - Hasher carrying the configured work factor
    /// * `token_issuer` - Issuer carrying the signing key and TTLs
    ///
    /// # Errors
    /// * `HashingFailed` - The decoy hash could not be computed
    pub fn new(
        password_hasher: PasswordHasher,
        token_issuer: TokenIssuer,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = password_hasher.hash(DECOY_PASSWORD)?;

        Ok(Self {
            password_hasher,
            token_issuer,
            decoy_hash,
        })
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.token_issuer
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password and issue an access/refresh pair at `now`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `subject` - Principal the tokens are issued for
    /// * `now` - Single issuance instant shared by both tokens
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is malformed
    /// * `JwtError` - Token generation failed
    pub fn authenticate<S: TokenSubject + ?Sized>(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &S,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokenPair, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_issuer.issue_pair(subject, now)?)
    }

    /// Spend one verification on the decoy hash and fail.
    ///
    /// Used when no principal matched, so that path performs the same work as a
    /// wrong password and returns the same error.
    pub fn reject(&self, password: &str) -> AuthenticationError {
        let _ = self.password_hasher.verify(password, &self.decoy_hash);
        AuthenticationError::InvalidCredentials
    }

    /// Issue a token pair without password verification.
    ///
    /// Used by the refresh flow once a refresh token has been validated.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_tokens<S: TokenSubject + ?Sized>(
        &self,
        subject: &S,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokenPair, JwtError> {
        self.token_issuer.issue_pair(subject, now)
    }

    /// Validate a token of the given kind at `now`.
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiry
    /// * `Invalid` - Signature, structure, issuer, or kind is wrong
    pub fn validate_token(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, JwtError> {
        self.token_issuer.verify_kind(token, kind, now)
    }
}
