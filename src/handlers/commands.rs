//! Plain-command handlers
//!
//! Dispatched when a chat has no active flow. Commands are matched on the
//! exact literal text, case-sensitive.

use tracing::info;

use super::keyboard::selection_keyboard;
use super::{DialogueEngine, MSG_NOT_UNDERSTOOD, MSG_NO_PERMISSION};
use crate::models::User;
use crate::state::{FlowState, Selection};
use crate::transport::{Button, Event, CB_BLOCK_USERS, CB_UNBLOCK_USERS};
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

const HELP_TEXT: &str = "Available commands:\n\
/start - greeting\n\
/help - this list\n\
/chat - show your chat id\n\
/login - register with the bot\n\
/wishlist - show your wishlist\n\
/wishlist_add - add a wish\n\
/wishlist_remove - remove a wish\n\n\
Admin commands:\n\
/message - broadcast a message to all users\n\
/block - block users\n\
/unblock - unblock users\n\
/list - list registered users\n\
/admin_add - grant admin rights\n\
/admin_remove - revoke admin rights";

impl DialogueEngine {
    pub(crate) async fn handle_command(&self, event: &Event, sender: Option<&User>) -> Result<()> {
        let chat_id = event.chat_id;

        match event.payload() {
            "/help" => self.transport.send_text(chat_id, HELP_TEXT).await,

            "/chat" => {
                let text = format!("Your chat id: {chat_id}");
                self.transport.send_text(chat_id, &text).await
            }

            "/login" => self.cmd_login(chat_id, sender).await,

            "/message" => {
                let Some(admin) = self.require_admin(chat_id, sender).await? else {
                    return Ok(());
                };
                log_admin_action(admin.chat_id, "broadcast_start", None);
                self.conversations.set(chat_id, FlowState::ComposingBroadcast);
                self.transport
                    .send_text(chat_id, "Enter the message you want to send to all users:")
                    .await
            }

            "/block" => {
                if self.require_admin(chat_id, sender).await?.is_none() {
                    return Ok(());
                }
                self.cmd_block(chat_id).await
            }

            "/unblock" => {
                if self.require_admin(chat_id, sender).await?.is_none() {
                    return Ok(());
                }
                self.cmd_unblock(chat_id).await
            }

            "/list" => {
                if self.require_admin(chat_id, sender).await?.is_none() {
                    return Ok(());
                }
                self.cmd_list(chat_id).await
            }

            "/admin_add" => {
                if self.require_admin(chat_id, sender).await?.is_none() {
                    return Ok(());
                }
                self.cmd_admin_add(chat_id).await
            }

            "/admin_remove" => {
                if self.require_admin(chat_id, sender).await?.is_none() {
                    return Ok(());
                }
                self.cmd_admin_remove(chat_id).await
            }

            "/wishlist" => {
                let Some(user) = self.require_registered(chat_id, sender).await? else {
                    return Ok(());
                };
                let text = if user.wishlist.is_empty() {
                    "Your wishlist is empty.".to_string()
                } else {
                    format!("Your wishlist:\n{}", numbered(&user.wishlist))
                };
                self.transport.send_text(chat_id, &text).await
            }

            "/wishlist_add" => {
                if self.require_registered(chat_id, sender).await?.is_none() {
                    return Ok(());
                }
                self.conversations.set(chat_id, FlowState::AwaitingWishToAdd);
                self.transport.send_text(chat_id, "Send the wish you want to add:").await
            }

            "/wishlist_remove" => {
                let Some(user) = self.require_registered(chat_id, sender).await? else {
                    return Ok(());
                };
                if user.wishlist.is_empty() {
                    return self.transport.send_text(chat_id, "Your wishlist is empty.").await;
                }
                self.conversations.set(chat_id, FlowState::AwaitingWishToRemove);
                let text = format!(
                    "Your wishlist:\n{}\n\nSend the number of the wish to remove:",
                    numbered(&user.wishlist)
                );
                self.transport.send_text(chat_id, &text).await
            }

            _ => self.transport.send_text(chat_id, MSG_NOT_UNDERSTOOD).await,
        }
    }

    async fn cmd_login(&self, chat_id: i64, sender: Option<&User>) -> Result<()> {
        if sender.is_some() {
            return self
                .transport
                .send_text(chat_id, "You are already registered.")
                .await;
        }

        info!(chat_id = chat_id, "Login flow started");
        self.conversations
            .set(chat_id, FlowState::AwaitingSecret { attempts: 0 });
        self.transport
            .send_text(chat_id, "Send the secret word you were given to register:")
            .await
    }

    async fn cmd_block(&self, chat_id: i64) -> Result<()> {
        let users = self.users.list_active().await?;
        if users.is_empty() {
            return self.transport.send_text(chat_id, "There are no users to block.").await;
        }

        let (keyboard, page) =
            selection_keyboard(&users, &[], 0, Some(Button::new("Block", CB_BLOCK_USERS)));
        self.conversations.set(
            chat_id,
            FlowState::SelectingBlockTargets {
                selection: Selection { picked: vec![], page },
            },
        );
        self.transport
            .send_text_with_keyboard(chat_id, "Select users to block:", keyboard)
            .await
    }

    async fn cmd_unblock(&self, chat_id: i64) -> Result<()> {
        let users = self.users.list_blocked().await?;
        if users.is_empty() {
            return self.transport.send_text(chat_id, "There are no blocked users.").await;
        }

        let (keyboard, page) =
            selection_keyboard(&users, &[], 0, Some(Button::new("Unblock", CB_UNBLOCK_USERS)));
        self.conversations.set(
            chat_id,
            FlowState::SelectingUnblockTargets {
                selection: Selection { picked: vec![], page },
            },
        );
        self.transport
            .send_text_with_keyboard(chat_id, "Select users to unblock:", keyboard)
            .await
    }

    async fn cmd_list(&self, chat_id: i64) -> Result<()> {
        let users = self.users.list_active().await?;
        if users.is_empty() {
            return self.transport.send_text(chat_id, "No registered users.").await;
        }

        let lines: Vec<String> = users
            .iter()
            .enumerate()
            .map(|(i, u)| format!("{}. @{}", i + 1, u.username))
            .collect();
        let text = format!("Registered users:\n\n{}", lines.join("\n"));
        self.transport.send_text(chat_id, &text).await
    }

    async fn cmd_admin_add(&self, chat_id: i64) -> Result<()> {
        let users = self.users.list_active().await?;
        let candidates: Vec<_> = users.into_iter().filter(|u| !u.is_admin()).collect();
        if candidates.is_empty() {
            return self
                .transport
                .send_text(chat_id, "There are no users to promote.")
                .await;
        }

        let (keyboard, page) = selection_keyboard(&candidates, &[], 0, None);
        self.conversations
            .set(chat_id, FlowState::SelectingPromotionTarget { page });
        self.transport
            .send_text_with_keyboard(chat_id, "Select the user to make an administrator:", keyboard)
            .await
    }

    async fn cmd_admin_remove(&self, chat_id: i64) -> Result<()> {
        let admins = self.users.list_admins().await?;
        if admins.is_empty() {
            return self
                .transport
                .send_text(chat_id, "There are no administrators to demote.")
                .await;
        }

        let (keyboard, page) = selection_keyboard(&admins, &[], 0, None);
        self.conversations
            .set(chat_id, FlowState::SelectingDemotionTarget { page });
        self.transport
            .send_text_with_keyboard(chat_id, "Select the administrator to demote:", keyboard)
            .await
    }

    /// Admin gate: reports the refusal to the sender and returns `None`
    /// for non-admins.
    async fn require_admin(&self, chat_id: i64, sender: Option<&User>) -> Result<Option<User>> {
        match sender {
            Some(user) if user.is_admin() => Ok(Some(user.clone())),
            _ => {
                self.transport.send_text(chat_id, MSG_NO_PERMISSION).await?;
                Ok(None)
            }
        }
    }

    async fn require_registered(&self, chat_id: i64, sender: Option<&User>) -> Result<Option<User>> {
        match sender {
            Some(user) => Ok(Some(user.clone())),
            None => {
                self.transport
                    .send_text(chat_id, "You are not registered yet. Send /login to register.")
                    .await?;
                Ok(None)
            }
        }
    }
}

/// Render wishes as a 1-based numbered list.
pub(crate) fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
