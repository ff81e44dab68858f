//! Configuration management for the library API server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::application::loan::{DEFAULT_SUBJECT, SweepSettings};
use crate::domain::loan::DEFAULT_OVERDUE_DAYS;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 永続化のバックエンド
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

/// 延滞スイープの設定
#[derive(Debug, Deserialize, Clone)]
pub struct OverdueConfig {
    /// この日数を超えて未返却なら延滞
    pub threshold_days: u32,
    pub interval_secs: u64,
    pub subject: String,
    /// 通知本文（SMTP送信時）
    pub message: String,
}

impl OverdueConfig {
    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            threshold_days: self.threshold_days,
            interval: Duration::from_secs(self.interval_secs.max(1)),
            subject: self.subject.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub use_tls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub overdue: OverdueConfig,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    /// Load configuration from defaults, files and environment variables
    ///
    /// Later sources override earlier ones:
    /// built-in defaults, `config/default`, `config/{RUN_MODE}`, `LIBRARY__*` variables,
    /// then `DATABASE_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only, without reading files or the environment
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder_with_defaults()?.build()?.try_deserialize()
    }

    fn builder_with_defaults()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/library")?
            .set_default("database.max_connections", 5)?
            .set_default("storage.backend", "postgres")?
            .set_default("logging.level", "info")?
            .set_default("overdue.threshold_days", i64::from(DEFAULT_OVERDUE_DAYS))?
            .set_default("overdue.interval_secs", 24 * 60 * 60)?
            .set_default("overdue.subject", DEFAULT_SUBJECT)?
            .set_default(
                "overdue.message",
                "You have an overdue loan. Please return the book as soon as possible.",
            )?
            .set_default("smtp.enabled", false)?
            .set_default("smtp.host", "localhost")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.from", "Library <noreply@library.local>")?
            .set_default("smtp.use_tls", true)
    }
}
