//! Error handling for GiftBot
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for GiftBot application
#[derive(Error, Debug)]
pub enum GiftBotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {chat_id}")]
    UserNotFound { chat_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GiftBot operations
pub type Result<T> = std::result::Result<T, GiftBotError>;

impl GiftBotError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            GiftBotError::Database(_) => true,
            GiftBotError::Migration(_) => false,
            GiftBotError::Telegram(_) => true,
            GiftBotError::Config(_) => false,
            GiftBotError::PermissionDenied(_) => false,
            GiftBotError::UserNotFound { .. } => false,
            GiftBotError::InvalidInput(_) => false,
            GiftBotError::RateLimitExceeded => true,
            GiftBotError::Io(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(GiftBotError::RateLimitExceeded.is_recoverable());
        assert!(!GiftBotError::Config("missing token".to_string()).is_recoverable());
        assert!(!GiftBotError::UserNotFound { chat_id: 1 }.is_recoverable());
    }
}
