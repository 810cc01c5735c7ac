//! Utility modules
//!
//! Common utilities used throughout the application: error handling,
//! logging setup, and helper functions.

pub mod errors;
pub mod helpers;
pub mod logging;

pub use errors::{GiftBotError, Result};
