pub mod claims;
pub mod config;
pub mod errors;
pub mod issuer;

pub use claims::IssuedTokenPair;
pub use claims::TokenClaims;
pub use claims::TokenKind;
pub use claims::TokenSubject;
pub use config::TokenConfig;
pub use errors::JwtError;
pub use issuer::TokenIssuer;
