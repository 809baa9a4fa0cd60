use std::time::Duration;

use config::{self, ConfigError, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;

use crate::routes::auth::challenge::ChallengeSize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseConfig,
    pub secret: SecretSetting,
    pub identity: IdentityProviderSettings,
    pub challenge: ChallengeSettings,
    pub storage: StorageSettings,
    pub contact: ContactSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub workers: usize,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub name: String,
    pub acquire_timeout: u64,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JWT {
    pub secret: SecretString,
    /// Session lifetime in hours.
    pub expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSetting {
    pub jwt: JWT,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityProviderSettings {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout_milliseconds: u64,
}

impl IdentityProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChallengeSettings {
    pub site_key: String,
    pub size: ChallengeSize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub base_url: String,
    pub bucket: String,
    pub access_token: SecretString,
    pub timeout_milliseconds: u64,
    /// Upper bound for a single media upload in bytes.
    pub max_upload_size: usize,
}

impl StorageSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContactSettings {
    pub phone_number: String,
    pub greeting: String,
    pub site_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// Client-side bound on a single send/confirm round trip.
    pub otp_timeout_seconds: u64,
    /// How long a guarded request waits for a pending role resolution.
    pub guard_wait_seconds: u64,
    pub session_prune_interval_seconds: u64,
}

impl AuthSettings {
    pub fn otp_timeout(&self) -> Duration {
        Duration::from_secs(self.otp_timeout_seconds)
    }

    pub fn guard_wait(&self) -> Duration {
        Duration::from_secs(self.guard_wait_seconds)
    }

    pub fn session_prune_interval(&self) -> Duration {
        Duration::from_secs(self.session_prune_interval_seconds)
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("configuration.yaml"),
        ))
        .add_source(
            Environment::default()
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("application.allowed_origins")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<Settings>()
}
