use config::{Config, ConfigError, File};
use serde::{Deserialize, de::DeserializeOwned};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, AsRefStr, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Environment {
    Local,
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PsqlLogStatements {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PsqlSettings {
    pub ip: String,
    pub port: u16,
    pub db_name: Option<String>,
    pub username: String,
    pub password: Option<String>,
    pub max_connections: u32,
    pub root_cert: Option<String>,
    pub log_statements: PsqlLogStatements,
    pub application_name: Option<String>,
}

/// Which datastore backs the storage ports.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageSettings {
    Postgres(PsqlSettings),
    Memory,
}

impl Environment {
    pub fn as_file_name(&self) -> String {
        self.as_ref().to_lowercase()
    }
}

impl From<&LogLevel> for tracing::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Loads `config/{environment}.yml` where the environment is read from `APP_ENVIRONMENT`,
/// then applies overrides from environment variables prefixed with `prefix`, using `__`
/// as the nesting separator.
pub fn load_settings<T: DeserializeOwned>(prefix: &str) -> Result<T, ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .map_err(|_| ConfigError::NotFound("APP_ENVIRONMENT".into()))?
        .parse()
        .map_err(|_| ConfigError::Message("failed to parse APP_ENVIRONMENT".into()))?;

    Config::builder()
        .add_source(
            File::with_name(&format!("config/{}", environment.as_file_name())).required(true),
        )
        .add_source(config::Environment::with_prefix(prefix).separator("__"))
        .set_override("environment", environment.as_ref())?
        .build()?
        .try_deserialize()
}
