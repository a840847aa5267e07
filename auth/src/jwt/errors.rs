use thiserror::Error;

/// Error type for JWT operations.
///
/// `Expired` and `Invalid` are kept apart because callers react differently:
/// an expired access token sends the client to the refresh flow, an invalid one
/// is rejected outright.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    Invalid(String),

    #[error("Invalid token configuration: {0}")]
    InvalidConfig(String),
}
