//! Configuration validation module
//!
//! Validation functions for application configuration to ensure all
//! required settings are properly configured before startup.

use super::Settings;
use crate::utils::errors::{GiftBotError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_rate_limit_config(&settings.rate_limit)?;
    validate_notifications_config(&settings.notifications)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(GiftBotError::Config("Bot token is required".to_string()));
    }

    if config.secret_word.trim().is_empty() {
        return Err(GiftBotError::Config(
            "Registration secret word is required".to_string(),
        ));
    }

    Ok(())
}

fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GiftBotError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(GiftBotError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GiftBotError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit_config(config: &super::RateLimitConfig) -> Result<()> {
    if config.max_requests == 0 {
        return Err(GiftBotError::Config(
            "Rate limit must allow at least one request per window".to_string(),
        ));
    }

    if config.window_seconds == 0 {
        return Err(GiftBotError::Config(
            "Rate limit window must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_notifications_config(config: &super::NotificationsConfig) -> Result<()> {
    if config.lead_days == 0 || config.lead_days > 365 {
        return Err(GiftBotError::Config(
            "Birthday lead days must be between 1 and 365".to_string(),
        ));
    }

    if config.run_hour > 23 {
        return Err(GiftBotError::Config(
            "Notifier run hour must be between 0 and 23".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GiftBotError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GiftBotError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
