//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;

pub use user::{CreateUserRequest, Profile, UpdateUserRequest, User, ROLE_ADMIN, ROLE_USER};
