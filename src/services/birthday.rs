//! Birthday reminder service
//!
//! Scans for members whose birthday is a configured number of days away and
//! reminds every admin, once per (admin, member, day) via the dedup ledger.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::config::NotificationsConfig;
use crate::database::UserStore;
use crate::models::User;
use crate::transport::Transport;
use crate::utils::errors::Result;
use crate::utils::helpers::{days_until_birthday, format_user_label};

#[derive(Clone)]
pub struct BirthdayNotifier {
    store: Arc<dyn UserStore>,
    transport: Arc<dyn Transport>,
    config: NotificationsConfig,
}

impl BirthdayNotifier {
    pub fn new(
        store: Arc<dyn UserStore>,
        transport: Arc<dyn Transport>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    /// One daily run against the local calendar date.
    pub async fn notify_upcoming(&self) -> Result<()> {
        self.notify_upcoming_on(Local::now().date_naive()).await
    }

    /// Run with an explicit "today", so tests control the calendar.
    pub async fn notify_upcoming_on(&self, today: NaiveDate) -> Result<()> {
        let users = self.store.list_users().await?;

        let upcoming: Vec<&User> = users
            .iter()
            .filter(|u| !u.blocked)
            .filter(|u| match u.birthdate {
                Some(birthdate) => {
                    days_until_birthday(birthdate, today) == i64::from(self.config.lead_days)
                }
                None => false,
            })
            .collect();

        if upcoming.is_empty() {
            debug!(date = %today, "No upcoming birthdays");
            return Ok(());
        }

        let admins: Vec<&User> = users.iter().filter(|u| u.is_admin() && !u.blocked).collect();
        info!(
            birthdays = upcoming.len(),
            admins = admins.len(),
            date = %today,
            "Sending birthday reminders"
        );

        for birthday_user in &upcoming {
            for admin in &admins {
                let already_sent = match self
                    .store
                    .has_birthday_notification(admin.chat_id, birthday_user.chat_id, today)
                    .await
                {
                    Ok(sent) => sent,
                    Err(e) => {
                        error!(
                            admin_chat_id = admin.chat_id,
                            user_chat_id = birthday_user.chat_id,
                            error = %e,
                            "Failed to check notification ledger"
                        );
                        continue;
                    }
                };
                if already_sent {
                    continue;
                }

                let message = self.compose_reminder(birthday_user);
                if let Err(e) = self.transport.send_text(admin.chat_id, &message).await {
                    // No ledger entry on failure, so a later run retries.
                    warn!(
                        admin_chat_id = admin.chat_id,
                        user_chat_id = birthday_user.chat_id,
                        error = %e,
                        "Failed to deliver birthday reminder"
                    );
                    continue;
                }

                if let Err(e) = self
                    .store
                    .record_birthday_notification(admin.chat_id, birthday_user.chat_id, today)
                    .await
                {
                    error!(
                        admin_chat_id = admin.chat_id,
                        user_chat_id = birthday_user.chat_id,
                        error = %e,
                        "Failed to record birthday notification"
                    );
                }
            }
        }

        Ok(())
    }

    fn compose_reminder(&self, user: &User) -> String {
        let mut message = format!(
            "{} has a birthday coming up in {} days. Don't forget to congratulate them!",
            format_user_label(user),
            self.config.lead_days
        );
        if !user.wishlist.is_empty() {
            message.push_str("\n\nTheir wishlist:");
            for (i, wish) in user.wishlist.iter().enumerate() {
                message.push_str(&format!("\n{}. {}", i + 1, wish));
            }
        }
        message
    }
}
