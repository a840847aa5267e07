use std::fmt;
use std::str::FromStr;

use auth::IssuedTokenPair;
use auth::TokenSubject;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::authentication::errors::CredentialError;
use crate::domain::authentication::errors::EmailError;
use crate::domain::authentication::errors::PrincipalIdError;

/// Authenticatable identity record.
///
/// Provisioned externally. Login never mutates it; only a password change
/// replaces `password_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: EmailAddress,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// Public view of this principal, without the secret hash.
    pub fn profile(&self) -> PrincipalProfile {
        PrincipalProfile {
            id: self.id.to_string(),
            email: self.email.as_str().to_string(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

impl TokenSubject for Principal {
    fn subject(&self) -> &str {
        self.id.as_str()
    }

    fn email(&self) -> &str {
        self.email.as_str()
    }
}

/// Principal unique identifier type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Create a principal ID.
    ///
    /// # Errors
    /// * `Empty` - ID is empty or whitespace only
    pub fn new(id: impl Into<String>) -> Result<Self, PrincipalIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PrincipalIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier and plaintext secret supplied for one login attempt.
///
/// Never persisted. The secret is kept out of `Debug` output.
pub struct Credential {
    identifier: String,
    secret: String,
}

impl Credential {
    /// Build a credential, trimming the identifier.
    ///
    /// The secret is kept as supplied but must contain something other than
    /// whitespace.
    ///
    /// # Errors
    /// * `EmptyIdentifier` - Identifier is empty after trimming
    /// * `EmptySecret` - Secret is empty or whitespace only
    pub fn new(identifier: &str, secret: &str) -> Result<Self, CredentialError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(CredentialError::EmptyIdentifier);
        }
        if secret.trim().is_empty() {
            return Err(CredentialError::EmptySecret);
        }

        Ok(Self {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Consume the credential, keeping only the secret for verification.
    pub fn into_secret(self) -> String {
        self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Principal as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalProfile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authenticated {
    pub principal: PrincipalProfile,
    pub tokens: IssuedTokenPair,
}
