//! GiftBot Telegram Bot
//!
//! A small Telegram bot for a team that celebrates its colleagues:
//! members register with a shared secret word and their birthdate, keep a
//! wishlist, and admins broadcast messages, manage members and get
//! automated birthday reminders.

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use handlers::DialogueEngine;
pub use services::ServiceFactory;
pub use utils::errors::{GiftBotError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
