//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    pub notifications: NotificationsConfig,
    pub profile_sync: ProfileSyncConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Shared secret word new members must type to register.
    pub secret_word: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Per-chat rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Birthday reminder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    /// How many days in advance admins are reminded of a birthday.
    pub lead_days: u32,
    /// Local hour (0-23) the daily notifier run is scheduled at.
    pub run_hour: u32,
}

/// Profile sync job configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileSyncConfig {
    pub interval_hours: u64,
    pub base_delay_ms: u64,
    pub jitter_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("GIFTBOT").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::GiftBotError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                secret_word: String::new(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/giftbot".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            rate_limit: RateLimitConfig {
                max_requests: 10,
                window_seconds: 60,
            },
            notifications: NotificationsConfig {
                lead_days: 3,
                run_hour: 9,
            },
            profile_sync: ProfileSyncConfig {
                interval_hours: 24,
                base_delay_ms: 250,
                jitter_ms: 250,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "./logs".to_string(),
            },
        }
    }
}
