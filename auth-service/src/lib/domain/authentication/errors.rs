use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

/// Error for rejected login or token input, raised before any store call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Secret must not be empty")]
    EmptySecret,

    #[error("Token must not be empty")]
    EmptyToken,
}

/// Error for PrincipalId validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalIdError {
    #[error("Principal ID must not be empty")]
    Empty,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error reported by a credential store adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored principal is corrupt: {0}")]
    Corrupt(String),
}

/// Top-level error for authentication operations.
///
/// `AuthenticationFailed` is a unit variant: an unknown identifier and a wrong
/// secret produce the same value. Internal faults carry no detail in their
/// message; the detail is logged where the fault is observed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] CredentialError),

    #[error("Invalid credentials")]
    AuthenticationFailed,

    #[error("Internal authentication error")]
    HashingFailure,

    #[error("Invalid token configuration: {0}")]
    InvalidTokenConfig(String),

    #[error("Invalid password hasher configuration: {0}")]
    InvalidHasherConfig(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Internal authentication error")]
    TokenIssuance,

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(#[from] StoreError),

    #[error("Credential lookup timed out")]
    Timeout,
}

impl AuthError {
    /// Whether the caller may retry the same attempt.
    ///
    /// Only dependency faults qualify; a rejected credential never does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::DependencyUnavailable(_) | AuthError::Timeout)
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::Invalid(_) => AuthError::TokenInvalid,
            JwtError::EncodingFailed(_) => AuthError::TokenIssuance,
            JwtError::InvalidConfig(reason) => AuthError::InvalidTokenConfig(reason),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailed(_) | PasswordError::MalformedHash(_) => {
                AuthError::HashingFailure
            }
            PasswordError::InvalidWorkFactor(reason) => AuthError::InvalidHasherConfig(reason),
        }
    }
}
