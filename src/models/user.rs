//! User model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role string for regular users.
pub const ROLE_USER: &str = "user";
/// Role string for administrators.
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    /// Telegram chat id, the stable identity for both persisted users and
    /// ephemeral conversation state.
    pub chat_id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub birthdate: Option<NaiveDate>,
    pub wishlist: Vec<String>,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Payload for creating a user row. Creation is idempotent by `chat_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub chat_id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub birthdate: Option<NaiveDate>,
    pub blocked: bool,
}

impl CreateUserRequest {
    /// Draft for a freshly registered member.
    pub fn member(chat_id: i64, username: String, first_name: Option<String>, last_name: Option<String>) -> Self {
        Self {
            chat_id,
            username,
            first_name,
            last_name,
            role: ROLE_USER.to_string(),
            birthdate: None,
            blocked: false,
        }
    }

    /// Stub row for a sender blocked before ever registering.
    pub fn blocked_stub(chat_id: i64, username: String) -> Self {
        Self {
            chat_id,
            username,
            first_name: None,
            last_name: None,
            role: ROLE_USER.to_string(),
            birthdate: None,
            blocked: true,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub role: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub wishlist: Option<Vec<String>>,
    pub blocked: Option<bool>,
}

/// Display-name fields synced from the transport profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        let request = CreateUserRequest::member(1, "alice".to_string(), None, None);
        assert_eq!(request.role, ROLE_USER);

        let stub = CreateUserRequest::blocked_stub(2, "bob".to_string());
        assert!(stub.blocked);
    }
}
