use std::env;
use std::fmt;
use std::time::Duration;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenConfig;
use auth::TokenIssuer;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::authentication::errors::AuthError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default)]
    pub issuer: Option<String>,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PasswordConfig {
    /// Argon2 time cost; library default when absent
    #[serde(default)]
    pub work_factor: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub lookup_timeout_ms: Option<u64>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .finish()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }

    /// Validated token configuration.
    ///
    /// # Errors
    /// * `InvalidTokenConfig` - Empty secret, non-positive or out-of-range TTL,
    ///   or refresh TTL not above access TTL
    pub fn token_config(&self) -> Result<TokenConfig, AuthError> {
        let token_config = TokenConfig::new(
            self.jwt.secret.as_bytes(),
            ttl_minutes("access", self.jwt.access_ttl_minutes)?,
            ttl_minutes("refresh", self.jwt.refresh_ttl_minutes)?,
        )?;

        Ok(match &self.jwt.issuer {
            Some(issuer) => token_config.with_issuer(issuer),
            None => token_config,
        })
    }

    /// Password hasher with the configured work factor.
    ///
    /// # Errors
    /// * `InvalidHasherConfig` - Work factor rejected
    pub fn password_hasher(&self) -> Result<PasswordHasher, AuthError> {
        match self.password.work_factor {
            Some(work_factor) => Ok(PasswordHasher::with_work_factor(work_factor)?),
            None => Ok(PasswordHasher::new()),
        }
    }

    /// Build the authenticator, failing on any invalid setting.
    pub fn authenticator(&self) -> Result<Authenticator, AuthError> {
        let token_issuer = TokenIssuer::new(&self.token_config()?);
        Ok(Authenticator::new(self.password_hasher()?, token_issuer)?)
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.store.lookup_timeout_ms.map(Duration::from_millis)
    }
}

fn ttl_minutes(kind: &str, minutes: i64) -> Result<chrono::Duration, AuthError> {
    chrono::Duration::try_minutes(minutes).ok_or_else(|| {
        AuthError::InvalidTokenConfig(format!("{} TTL of {} minutes is out of range", kind, minutes))
    })
}
