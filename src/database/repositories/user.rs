//! User repository implementation

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::database::store::UserStore;
use crate::models::{CreateUserRequest, Profile, UpdateUserRequest, User};
use crate::utils::errors::Result;

const USER_COLUMNS: &str = "id, chat_id, username, first_name, last_name, role, birthdate, wishlist, blocked, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, request: CreateUserRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (chat_id, username, first_name, last_name, role, birthdate, wishlist, blocked, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, '{}', $7, $8, $8)
            ON CONFLICT (chat_id) DO NOTHING
            "#,
        )
        .bind(request.chat_id)
        .bind(request.username)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.role)
        .bind(request.birthdate)
        .bind(request.blocked)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE chat_id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update_user(&self, chat_id: i64, request: UpdateUserRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                role = COALESCE($3, role),
                birthdate = COALESCE($4, birthdate),
                wishlist = COALESCE($5, wishlist),
                blocked = COALESCE($6, blocked),
                updated_at = $7
            WHERE chat_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(chat_id)
        .bind(request.username)
        .bind(request.role)
        .bind(request.birthdate)
        .bind(request.wishlist)
        .bind(request.blocked)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(&self, chat_id: i64, profile: &Profile) -> Result<()> {
        sqlx::query(
            "UPDATE users SET username = $2, first_name = $3, last_name = $4, updated_at = $5 WHERE chat_id = $1",
        )
        .bind(chat_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_blocked_by_usernames(&self, usernames: &[String], blocked: bool) -> Result<()> {
        sqlx::query("UPDATE users SET blocked = $2, updated_at = $3 WHERE username = ANY($1)")
            .bind(usernames)
            .bind(blocked)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn has_birthday_notification(
        &self,
        admin_chat_id: i64,
        user_chat_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM birthday_notifications WHERE admin_chat_id = $1 AND user_chat_id = $2 AND notify_date = $3",
        )
        .bind(admin_chat_id)
        .bind(user_chat_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn record_birthday_notification(
        &self,
        admin_chat_id: i64,
        user_chat_id: i64,
        date: NaiveDate,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO birthday_notifications (admin_chat_id, user_chat_id, notify_date, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (admin_chat_id, user_chat_id, notify_date) DO NOTHING
            "#,
        )
        .bind(admin_chat_id)
        .bind(user_chat_id)
        .bind(date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
