//! External user-store seam
//!
//! The dialogue engine and the scheduled jobs only need a handful of
//! create/read/update operations plus the birthday-notification ledger,
//! so they talk to this trait instead of a concrete database. The
//! production implementation is [`crate::database::UserRepository`].

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{CreateUserRequest, Profile, UpdateUserRequest, User};
use crate::utils::errors::Result;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user row. Idempotent: a duplicate `chat_id` is a no-op,
    /// not an error.
    async fn create_user(&self, request: CreateUserRequest) -> Result<()>;

    /// Look up a user by chat id. Row absence is `Ok(None)`, never an error.
    async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<User>>;

    /// All user rows, blocked ones included.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Apply a partial update and return the updated row.
    async fn update_user(&self, chat_id: i64, request: UpdateUserRequest) -> Result<User>;

    /// Overwrite the display-name fields synced from the transport.
    async fn update_profile(&self, chat_id: i64, profile: &Profile) -> Result<()>;

    /// Batch soft-block or unblock users by handle.
    async fn set_blocked_by_usernames(&self, usernames: &[String], blocked: bool) -> Result<()>;

    /// Whether a reminder for (admin, user) was already recorded for `date`.
    async fn has_birthday_notification(
        &self,
        admin_chat_id: i64,
        user_chat_id: i64,
        date: NaiveDate,
    ) -> Result<bool>;

    /// Record a reminder in the dedup ledger. Insert-if-absent only.
    async fn record_birthday_notification(
        &self,
        admin_chat_id: i64,
        user_chat_id: i64,
        date: NaiveDate,
    ) -> Result<()>;
}
