//! User service implementation
//!
//! Registration, role changes, soft blocking and the filtered member lists
//! the dialogue engine and the scheduled jobs read from.

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::UserStore;
use crate::models::{CreateUserRequest, Profile, UpdateUserRequest, User, ROLE_ADMIN, ROLE_USER};
use crate::utils::errors::{GiftBotError, Result};

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Register a new member or return the existing row for this chat.
    pub async fn register_or_get_user(&self, chat_id: i64, profile: &Profile) -> Result<User> {
        debug!(chat_id = chat_id, "Attempting to register or get user");

        if let Some(existing_user) = self.store.find_by_chat_id(chat_id).await? {
            info!(chat_id = chat_id, "User already exists, returning existing user");
            return Ok(existing_user);
        }

        let request = CreateUserRequest::member(
            chat_id,
            profile.username.clone(),
            profile.first_name.clone(),
            profile.last_name.clone(),
        );
        self.store.create_user(request).await?;

        let user = self
            .store
            .find_by_chat_id(chat_id)
            .await?
            .ok_or(GiftBotError::UserNotFound { chat_id })?;
        info!(user_id = user.id, chat_id = chat_id, "New user registered");

        Ok(user)
    }

    /// Get user by chat id
    pub async fn get_user(&self, chat_id: i64) -> Result<Option<User>> {
        self.store.find_by_chat_id(chat_id).await
    }

    /// Get user by chat id, treating absence as an error.
    pub async fn require_user(&self, chat_id: i64) -> Result<User> {
        self.store
            .find_by_chat_id(chat_id)
            .await?
            .ok_or(GiftBotError::UserNotFound { chat_id })
    }

    /// Record the birthdate a user entered during registration.
    pub async fn set_birthdate(&self, chat_id: i64, birthdate: chrono::NaiveDate) -> Result<User> {
        debug!(chat_id = chat_id, "Setting birthdate");
        let request = UpdateUserRequest {
            birthdate: Some(birthdate),
            ..Default::default()
        };
        self.store.update_user(chat_id, request).await
    }

    /// Replace the user's wishlist.
    pub async fn set_wishlist(&self, chat_id: i64, wishlist: Vec<String>) -> Result<User> {
        let request = UpdateUserRequest {
            wishlist: Some(wishlist),
            ..Default::default()
        };
        self.store.update_user(chat_id, request).await
    }

    /// Grant or revoke the admin role for a user picked by handle.
    pub async fn set_role_by_username(&self, username: &str, admin: bool) -> Result<Option<User>> {
        let role = if admin { ROLE_ADMIN } else { ROLE_USER };
        let Some(target) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        let request = UpdateUserRequest {
            role: Some(role.to_string()),
            ..Default::default()
        };
        let updated = self.store.update_user(target.chat_id, request).await?;
        info!(chat_id = updated.chat_id, username = %username, role = %role, "Role updated");
        Ok(Some(updated))
    }

    /// Soft-block users by handle. Rows are kept so an unblock restores them.
    pub async fn block_by_usernames(&self, usernames: &[String]) -> Result<()> {
        info!(count = usernames.len(), "Blocking users");
        self.store.set_blocked_by_usernames(usernames, true).await
    }

    /// Lift the block for the given handles.
    pub async fn unblock_by_usernames(&self, usernames: &[String]) -> Result<()> {
        info!(count = usernames.len(), "Unblocking users");
        self.store.set_blocked_by_usernames(usernames, false).await
    }

    /// Insert a blocked stub row for a sender that never registered.
    pub async fn block_unregistered(&self, chat_id: i64, username: &str) -> Result<()> {
        info!(chat_id = chat_id, "Blocking unregistered sender");
        self.store
            .create_user(CreateUserRequest::blocked_stub(chat_id, username.to_string()))
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }

    /// Non-blocked members, the audience for broadcasts and pickers.
    pub async fn list_active(&self) -> Result<Vec<User>> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().filter(|u| !u.blocked).collect())
    }

    /// Currently blocked members, the audience for the unblock picker.
    pub async fn list_blocked(&self) -> Result<Vec<User>> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().filter(|u| u.blocked).collect())
    }

    pub async fn list_admins(&self) -> Result<Vec<User>> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().filter(|u| u.is_admin() && !u.blocked).collect())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let handle = username.trim().trim_start_matches('@');
        let users = self.store.list_users().await?;
        Ok(users.into_iter().find(|u| u.username == handle))
    }
}
