//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
pub mod repositories;
pub mod store;

pub use connection::{create_pool, run_migrations, DatabasePool};
pub use repositories::UserRepository;
pub use store::UserStore;
