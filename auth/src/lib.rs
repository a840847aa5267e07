//! Authentication primitives library
//!
//! Provides reusable authentication infrastructure without any I/O:
//! - Password hashing (Argon2id, configurable work factor)
//! - Access/refresh JWT issuance and verification
//! - Authentication coordination
//!
//! Services define their own principal type and credential store and adapt
//! these implementations through the [`TokenSubject`] trait.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenConfig, TokenIssuer, TokenKind, TokenSubject};
//! use chrono::{Duration, Utc};
//!
//! struct User;
//!
//! impl TokenSubject for User {
//!     fn subject(&self) -> &str { "user123" }
//!     fn email(&self) -> &str { "alice@example.com" }
//! }
//!
//! let config = TokenConfig::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     Duration::minutes(15),
//!     Duration::days(7),
//! )
//! .unwrap();
//! let issuer = TokenIssuer::new(&config);
//!
//! let now = Utc::now();
//! let pair = issuer.issue_pair(&User, now).unwrap();
//! let claims = issuer.verify(&pair.access_token, now).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.kind, TokenKind::Access);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::IssuedTokenPair;
pub use jwt::JwtError;
pub use jwt::TokenClaims;
pub use jwt::TokenConfig;
pub use jwt::TokenIssuer;
pub use jwt::TokenKind;
pub use jwt::TokenSubject;
pub use password::PasswordError;
pub use password::PasswordHasher;
