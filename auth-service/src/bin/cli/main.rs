use std::sync::Arc;

use auth_service::authentication::models::PrincipalId;
use auth_service::authentication::ports::AuthenticationServicePort;
use auth_service::authentication::service::AuthenticationService;
use auth_service::config::Config;
use auth_service::repositories::PostgresCredentialStore;
use auth_service::repositories::PostgresRefreshTokenStore;
use clap::Parser;
use clap::Subcommand;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "auth-service", version, about = "Credential authentication and token issuance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Hash a secret for provisioning or a password change
    HashPassword { secret: String },
    /// Log in against the configured credential store and print the token pair
    Login { identifier: String, secret: String },
    /// Exchange a refresh token for a new token pair
    Refresh { refresh_token: String },
    /// Revoke every refresh token of a principal
    Logout { principal_id: String },
    /// Verify an access token and print its claims
    VerifyToken { token: String },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,auth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    // Invalid signing or hashing settings abort here, before any request
    let authenticator = Arc::new(config.authenticator()?);

    tracing::info!(
        access_ttl_minutes = config.jwt.access_ttl_minutes,
        refresh_ttl_minutes = config.jwt.refresh_ttl_minutes,
        issuer = ?config.jwt.issuer,
        work_factor = ?config.password.work_factor,
        lookup_timeout_ms = ?config.store.lookup_timeout_ms,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&config.database.url)?;
    let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool.clone()));
    let refresh_tokens = Arc::new(PostgresRefreshTokenStore::new(pg_pool));

    let mut service = AuthenticationService::new(credential_store, refresh_tokens, authenticator);
    if let Some(timeout) = config.lookup_timeout() {
        service = service.with_lookup_timeout(timeout);
    }

    match cli.command {
        Command::HashPassword { secret } => {
            let hash = service.hash_secret(&secret).await?;
            println!("{}", hash);
        }
        Command::Login { identifier, secret } => {
            let authenticated = service.login(&identifier, &secret).await?;
            println!("{}", serde_json::to_string_pretty(&authenticated)?);
        }
        Command::Refresh { refresh_token } => {
            let authenticated = service.refresh(&refresh_token).await?;
            println!("{}", serde_json::to_string_pretty(&authenticated)?);
        }
        Command::Logout { principal_id } => {
            let principal_id = PrincipalId::new(principal_id)?;
            let revoked = service.logout(&principal_id).await?;
            println!("{}", serde_json::json!({ "revoked": revoked }));
        }
        Command::VerifyToken { token } => {
            let claims = service.verify_access_token(&token).await?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }

    Ok(())
}
