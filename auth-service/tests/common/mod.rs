use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenConfig;
use auth::TokenIssuer;
use auth_service::authentication::models::EmailAddress;
use auth_service::authentication::models::Principal;
use auth_service::authentication::models::PrincipalId;
use auth_service::authentication::service::AuthenticationService;
use auth_service::repositories::InMemoryCredentialStore;
use auth_service::repositories::InMemoryRefreshTokenStore;
use chrono::Duration;
use chrono::Utc;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ISSUER: &str = "auth-service-test";

pub type TestService = AuthenticationService<InMemoryCredentialStore, InMemoryRefreshTokenStore>;

/// Service wired to in-memory stores seeded with principal `u1`
pub struct TestApp {
    pub service: Arc<TestService>,
    pub store: Arc<InMemoryCredentialStore>,
    pub sessions: Arc<InMemoryRefreshTokenStore>,
    pub token_issuer: TokenIssuer,
    pub hasher: PasswordHasher,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let token_config = token_config();
        let hasher = PasswordHasher::with_work_factor(1).expect("Failed to build hasher");

        let authenticator = Arc::new(
            Authenticator::new(hasher.clone(), TokenIssuer::new(&token_config))
                .expect("Failed to build authenticator"),
        );

        let store = Arc::new(InMemoryCredentialStore::new());
        let sessions = Arc::new(InMemoryRefreshTokenStore::new());
        let service = Arc::new(AuthenticationService::new(
            Arc::clone(&store),
            Arc::clone(&sessions),
            authenticator,
        ));

        let app = Self {
            service,
            store,
            sessions,
            token_issuer: TokenIssuer::new(&token_config),
            hasher,
        };

        app.add_principal("u1", "a@x.com", "secret123").await;
        app
    }

    pub async fn add_principal(&self, id: &str, email: &str, secret: &str) -> Principal {
        let principal = Principal {
            id: PrincipalId::new(id).expect("Invalid principal id"),
            email: EmailAddress::new(email.to_string()).expect("Invalid email"),
            display_name: None,
            password_hash: self.hasher.hash(secret).expect("Failed to hash secret"),
            created_at: Utc::now(),
        };
        self.store.insert(principal.clone()).await;
        principal
    }
}

pub fn token_config() -> TokenConfig {
    TokenConfig::new(JWT_SECRET, Duration::minutes(15), Duration::days(7))
        .expect("Failed to build token config")
        .with_issuer(ISSUER)
}
