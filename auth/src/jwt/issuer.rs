use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use uuid::Uuid;

use super::claims::expiry;
use super::claims::IssuedTokenPair;
use super::claims::TokenClaims;
use super::claims::TokenKind;
use super::claims::TokenSubject;
use super::config::TokenConfig;
use super::errors::JwtError;

/// Issues and verifies signed access and refresh tokens.
///
/// Uses HS256 (HMAC with SHA-256). Keys are derived once from the
/// [`TokenConfig`] and never change for the lifetime of the issuer.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: Option<String>,
}

impl TokenIssuer {
    /// Create a token issuer from a validated configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret()),
            decoding_key: DecodingKey::from_secret(config.secret()),
            algorithm: Algorithm::HS256,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            issuer: config.issuer().map(str::to_string),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token expiring at `now + access_ttl` in a new session.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed, or the expiry overflows
    pub fn issue_access_token<S: TokenSubject + ?Sized>(
        &self,
        subject: &S,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        self.issue(subject, TokenKind::Access, &new_session_id(), now)
    }

    /// Issue a refresh token expiring at `now + refresh_ttl` in a new session.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed, or the expiry overflows
    pub fn issue_refresh_token<S: TokenSubject + ?Sized>(
        &self,
        subject: &S,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        self.issue(subject, TokenKind::Refresh, &new_session_id(), now)
    }

    /// Issue both tokens for the same subject at the same instant.
    ///
    /// Both tokens carry an identical `iat` and session ID; they differ only in
    /// kind and expiry.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed, or an expiry overflows
    pub fn issue_pair<S: TokenSubject + ?Sized>(
        &self,
        subject: &S,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokenPair, JwtError> {
        let session_id = new_session_id();
        let access_token = self.issue(subject, TokenKind::Access, &session_id, now)?;
        let refresh_token = self.issue(subject, TokenKind::Refresh, &session_id, now)?;

        Ok(IssuedTokenPair {
            access_token,
            refresh_token,
            session_id,
            issued_at: now,
            access_expires_at: expiry(now, self.access_ttl)?,
            refresh_expires_at: expiry(now, self.refresh_ttl)?,
        })
    }

    fn issue<S: TokenSubject + ?Sized>(
        &self,
        subject: &S,
        kind: TokenKind,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims =
            TokenClaims::new(subject, kind, session_id, now, ttl)?.with_issuer(self.issuer.clone());
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token's signature and structure, then its expiry against `now`.
    ///
    /// The signature is checked first, so a tampered token is `Invalid` whether
    /// or not it has also expired. Expiry has whole-second resolution: `now` is
    /// truncated to its Unix second, so a token stays valid until the second
    /// after its `exp` begins.
    ///
    /// When the issuer is configured, tokens without an `iss` claim are `Invalid`.
    ///
    /// # Errors
    /// * `Invalid` - Bad signature, wrong algorithm, wrong or missing issuer, or malformed token
    /// * `Expired` - `now` is past the token's `exp`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is evaluated against the caller's clock below
        validation.validate_exp = false;
        validation.leeway = 0;
        match &self.issuer {
            Some(issuer) => {
                validation.set_required_spec_claims(&["exp", "sub", "iss"]);
                validation.set_issuer(&[issuer]);
            }
            None => validation.set_required_spec_claims(&["exp", "sub"]),
        }

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::Invalid(e.to_string()))?;

        if token_data.claims.is_expired(now.timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }

    /// Verify a token and require it to be of the given kind.
    ///
    /// # Errors
    /// * `Invalid` - As [`verify`](Self::verify), or the token is of another kind
    /// * `Expired` - `now` is past the token's `exp`
    pub fn verify_kind(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, JwtError> {
        let claims = self.verify(token, now)?;

        if claims.kind != kind {
            return Err(JwtError::Invalid(format!(
                "expected {} token, got {} token",
                kind, claims.kind
            )));
        }

        Ok(claims)
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    struct Principal {
        id: &'static str,
        email: &'static str,
    }

    impl TokenSubject for Principal {
        fn subject(&self) -> &str {
            self.id
        }

        fn email(&self) -> &str {
            self.email
        }
    }

    const PRINCIPAL: Principal = Principal {
        id: "u1",
        email: "a@x.com",
    };

    fn issuer_with_secret(secret: &[u8]) -> TokenIssuer {
        let config = TokenConfig::new(secret, Duration::minutes(15), Duration::days(7))
            .expect("Failed to build token config");
        TokenIssuer::new(&config)
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let issuer = issuer_with_secret(SECRET);
        let now = now();

        let token = issuer
            .issue_access_token(&PRINCIPAL, now)
            .expect("Failed to issue token");
        assert_eq!(token.split('.').count(), 3);

        let claims = issuer.verify(&token, now).expect("Failed to verify token");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_pair_shares_issued_at() {
        let issuer = issuer_with_secret(SECRET);
        let now = now();

        let pair = issuer.issue_pair(&PRINCIPAL, now).expect("Failed to issue pair");
        let access = issuer.verify(&pair.access_token, now).unwrap();
        let refresh = issuer.verify(&pair.refresh_token, now).unwrap();

        assert_eq!(access.iat, refresh.iat);
        assert_eq!(access.sub, refresh.sub);
        assert_eq!(access.email, refresh.email);
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 60 * 60);
        assert_eq!(access.session_id, refresh.session_id);
        assert_eq!(pair.session_id, access.session_id);
        assert_eq!(pair.issued_at, now);
        assert_eq!(pair.access_expires_at, now + Duration::minutes(15));
        assert_eq!(pair.refresh_expires_at, now + Duration::days(7));
    }

    #[test]
    fn test_verify_expired_token() {
        let issuer = issuer_with_secret(SECRET);
        let issued = now();

        let token = issuer.issue_access_token(&PRINCIPAL, issued).unwrap();

        let at_expiry = issued + Duration::minutes(15);
        assert!(issuer.verify(&token, at_expiry).is_ok());

        let later = issued + Duration::minutes(15) + Duration::seconds(1);
        assert_eq!(issuer.verify(&token, later), Err(JwtError::Expired));
    }

    #[test]
    fn test_verify_tampered_token() {
        let issuer = issuer_with_secret(SECRET);
        let now = now();

        let token = issuer.issue_access_token(&PRINCIPAL, now).unwrap();
        let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = issuer.issue_refresh_token(&PRINCIPAL, now).unwrap();
        segments[1] = forged.split('.').nth(1).unwrap().to_string();
        let tampered = segments.join(".");

        assert!(matches!(
            issuer.verify(&tampered, now),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_tampered_and_expired_token_is_invalid() {
        let issuer = issuer_with_secret(SECRET);
        let other = issuer_with_secret(b"secret2_at_least_32_bytes_long_key!");
        let issued = now();

        let token = other.issue_access_token(&PRINCIPAL, issued).unwrap();
        let later = issued + Duration::days(30);

        assert!(matches!(
            issuer.verify(&token, later),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_verify_malformed_token() {
        let issuer = issuer_with_secret(SECRET);
        let result = issuer.verify("invalid.token.here", now());
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let issuer1 = issuer_with_secret(b"secret1_at_least_32_bytes_long_key!");
        let issuer2 = issuer_with_secret(b"secret2_at_least_32_bytes_long_key!");
        let now = now();

        let token = issuer1.issue_access_token(&PRINCIPAL, now).unwrap();

        assert!(matches!(
            issuer2.verify(&token, now),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let config = TokenConfig::new(SECRET, Duration::minutes(15), Duration::days(7)).unwrap();
        let service_a = TokenIssuer::new(&config.clone().with_issuer("service-a"));
        let service_b = TokenIssuer::new(&config.with_issuer("service-b"));
        let now = now();

        let token = service_a.issue_access_token(&PRINCIPAL, now).unwrap();

        assert!(service_a.verify(&token, now).is_ok());
        assert!(matches!(
            service_b.verify(&token, now),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_issue_pair_near_end_of_time_fails_without_panic() {
        let issuer = issuer_with_secret(SECRET);

        let result = issuer.issue_pair(&PRINCIPAL, DateTime::<Utc>::MAX_UTC);
        assert!(matches!(result, Err(JwtError::EncodingFailed(_))));
    }

    #[test]
    fn test_pairs_get_distinct_sessions() {
        let issuer = issuer_with_secret(SECRET);
        let now = now();

        let first = issuer.issue_pair(&PRINCIPAL, now).unwrap();
        let second = issuer.issue_pair(&PRINCIPAL, now).unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_verify_requires_issuer_when_configured() {
        let config = TokenConfig::new(SECRET, Duration::minutes(15), Duration::days(7)).unwrap();
        let anonymous = TokenIssuer::new(&config);
        let named = TokenIssuer::new(&config.with_issuer("auth-service"));
        let now = now();

        let token = anonymous.issue_access_token(&PRINCIPAL, now).unwrap();

        assert!(anonymous.verify(&token, now).is_ok());
        assert!(matches!(
            named.verify(&token, now),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_expiry_has_second_resolution() {
        let issuer = issuer_with_secret(SECRET);
        let issued = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let token = issuer.issue_access_token(&PRINCIPAL, issued).unwrap();
        let exp = issued + Duration::minutes(15);

        assert!(issuer.verify(&token, exp + Duration::milliseconds(900)).is_ok());
        assert_eq!(
            issuer.verify(&token, exp + Duration::seconds(1)),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_verify_kind_rejects_other_kind() {
        let issuer = issuer_with_secret(SECRET);
        let now = now();

        let access = issuer.issue_access_token(&PRINCIPAL, now).unwrap();
        let refresh = issuer.issue_refresh_token(&PRINCIPAL, now).unwrap();

        assert!(issuer.verify_kind(&refresh, TokenKind::Refresh, now).is_ok());
        assert!(matches!(
            issuer.verify_kind(&access, TokenKind::Refresh, now),
            Err(JwtError::Invalid(_))
        ));
    }
}
