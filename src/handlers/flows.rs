//! Multi-step flow handlers
//!
//! Each active [`FlowState`] routes here. Reserved callback tokens (noop,
//! page navigation, cancel) are handled uniformly across the selection
//! flows; raw usernames arrive as the callback payload itself.

use tracing::{info, warn};

use super::keyboard::selection_keyboard;
use super::{DialogueEngine, CANCEL_WORD, MSG_CANCELLED};
use crate::models::User;
use crate::state::{BroadcastDraft, FlowState, RegistrationDraft, Selection};
use crate::transport::{
    Button, Event, Keyboard, CB_BLOCK_USERS, CB_CANCEL, CB_NOOP, CB_PAGE_NEXT, CB_PAGE_PREV,
    CB_SEND_MESSAGE, CB_UNBLOCK_USERS,
};
use crate::utils::errors::Result;
use crate::utils::helpers::{format_user_label, parse_birthdate};
use crate::utils::logging::log_admin_action;

impl DialogueEngine {
    /// Secret-word step of the login flow.
    pub(crate) async fn handle_secret(&self, event: &Event, attempts: u32) -> Result<()> {
        let chat_id = event.chat_id;

        if event.payload() == self.secret_word {
            let draft = RegistrationDraft {
                chat_id,
                username: event.profile.username.clone(),
                first_name: event.profile.first_name.clone(),
                last_name: event.profile.last_name.clone(),
            };
            self.conversations
                .set(chat_id, FlowState::AwaitingBirthdate { draft });
            return self
                .transport
                .send_text(chat_id, "Enter your birthdate as DD.MM.YYYY:")
                .await;
        }

        let attempts = attempts + 1;
        if attempts >= 3 {
            info!(chat_id = chat_id, "Secret word attempts exhausted, blocking sender");
            self.conversations.clear(chat_id);
            self.transport
                .send_text(chat_id, "You have used up all attempts and are now blocked.")
                .await?;
            if let Err(e) = self
                .users
                .block_unregistered(chat_id, &event.profile.username)
                .await
            {
                warn!(chat_id = chat_id, error = %e, "Failed to block sender");
            }
            return Ok(());
        }

        self.conversations
            .set(chat_id, FlowState::AwaitingSecret { attempts });
        self.transport
            .send_text(chat_id, "Wrong secret word, try again.")
            .await
    }

    pub(crate) async fn handle_flow(&self, event: &Event, state: FlowState) -> Result<()> {
        let chat_id = event.chat_id;

        // Typing the cancel word abandons any flow.
        if !event.is_callback() && event.payload() == CANCEL_WORD {
            self.conversations.clear(chat_id);
            return self.transport.send_text(chat_id, MSG_CANCELLED).await;
        }

        match state {
            FlowState::AwaitingBirthdate { draft } => self.handle_birthdate(event, draft).await,
            FlowState::ComposingBroadcast => self.handle_broadcast_text(event).await,
            FlowState::SelectingBroadcastExclusions { draft } => {
                self.handle_broadcast_exclusions(event, draft).await
            }
            FlowState::SelectingPromotionTarget { page } => {
                self.handle_promotion(event, page).await
            }
            FlowState::SelectingDemotionTarget { page } => self.handle_demotion(event, page).await,
            FlowState::SelectingBlockTargets { selection } => {
                self.handle_block_targets(event, selection).await
            }
            FlowState::SelectingUnblockTargets { selection } => {
                self.handle_unblock_targets(event, selection).await
            }
            FlowState::AwaitingWishToAdd => self.handle_wish_add(event).await,
            FlowState::AwaitingWishToRemove => self.handle_wish_remove(event).await,
            // Idle and AwaitingSecret are dispatched before handle_flow.
            FlowState::Idle | FlowState::AwaitingSecret { .. } => Ok(()),
        }
    }

    async fn handle_birthdate(&self, event: &Event, draft: RegistrationDraft) -> Result<()> {
        let chat_id = event.chat_id;

        let Some(birthdate) = parse_birthdate(event.payload()) else {
            return self
                .transport
                .send_text(chat_id, "Invalid date format. Please enter the date as DD.MM.YYYY:")
                .await;
        };

        let profile = crate::models::Profile {
            username: draft.username.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
        };
        let user = match self.users.register_or_get_user(draft.chat_id, &profile).await {
            Ok(user) => user,
            Err(e) => return self.report_store_error(chat_id, &e).await,
        };
        if let Err(e) = self.users.set_birthdate(user.chat_id, birthdate).await {
            return self.report_store_error(chat_id, &e).await;
        }

        self.conversations.clear(chat_id);
        info!(chat_id = chat_id, "Registration completed");
        self.transport
            .send_text(chat_id, "You have successfully registered.")
            .await?;

        // Tell every admin about the newcomer. One failed send never stops
        // the rest.
        let admins = match self.users.list_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(error = %e, "Failed to load admins for registration notice");
                return Ok(());
            }
        };
        let notice = format!("User @{} registered with the bot", draft.username);
        for admin in admins {
            if let Err(e) = self.transport.send_text(admin.chat_id, &notice).await {
                warn!(admin_chat_id = admin.chat_id, error = %e, "Failed to send registration notice");
            }
        }
        Ok(())
    }

    async fn handle_broadcast_text(&self, event: &Event) -> Result<()> {
        let chat_id = event.chat_id;
        let text = event.payload().trim();
        if text.is_empty() {
            return self
                .transport
                .send_text(chat_id, "The message cannot be empty. Enter the message text:")
                .await;
        }

        let users = match self.users.list_active().await {
            Ok(users) => users,
            Err(e) => return self.report_store_error(chat_id, &e).await,
        };

        let (keyboard, page) =
            selection_keyboard(&users, &[], 0, Some(Button::new("Send", CB_SEND_MESSAGE)));
        let draft = BroadcastDraft {
            text: text.to_string(),
            exclusions: Selection { picked: vec![], page },
        };
        self.conversations
            .set(chat_id, FlowState::SelectingBroadcastExclusions { draft });
        self.transport
            .send_text_with_keyboard(
                chat_id,
                "Select users who should not receive the message, then press 'Send'.",
                keyboard,
            )
            .await
    }

    async fn handle_broadcast_exclusions(&self, event: &Event, mut draft: BroadcastDraft) -> Result<()> {
        let chat_id = event.chat_id;

        if !event.is_callback() {
            return self
                .transport
                .send_text(chat_id, "Use the buttons to pick users, or type 'cancel'.")
                .await;
        }

        match event.payload() {
            CB_NOOP => Ok(()),

            CB_CANCEL => {
                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                self.transport.send_text(chat_id, MSG_CANCELLED).await
            }

            CB_SEND_MESSAGE => {
                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                self.deliver_broadcast(chat_id, &draft).await
            }

            token @ (CB_PAGE_NEXT | CB_PAGE_PREV) => {
                draft.exclusions.page = shift_page(draft.exclusions.page, token);
                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) = selection_keyboard(
                    &users,
                    &draft.exclusions.picked,
                    draft.exclusions.page,
                    Some(Button::new("Send", CB_SEND_MESSAGE)),
                );
                draft.exclusions.page = page;
                self.conversations
                    .set(chat_id, FlowState::SelectingBroadcastExclusions { draft });
                self.edit_selection(event, keyboard).await
            }

            username => {
                draft.exclusions.pick(username);
                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) = selection_keyboard(
                    &users,
                    &draft.exclusions.picked,
                    draft.exclusions.page,
                    Some(Button::new("Send", CB_SEND_MESSAGE)),
                );
                draft.exclusions.page = page;
                self.conversations
                    .set(chat_id, FlowState::SelectingBroadcastExclusions { draft });
                self.edit_selection(event, keyboard).await
            }
        }
    }

    async fn deliver_broadcast(&self, admin_chat_id: i64, draft: &BroadcastDraft) -> Result<()> {
        let users = match self.users.list_active().await {
            Ok(users) => users,
            Err(e) => return self.report_store_error(admin_chat_id, &e).await,
        };

        let mut delivered = 0usize;
        for user in &users {
            if draft.exclusions.contains(&user.username) {
                continue;
            }
            if let Err(e) = self.transport.send_text(user.chat_id, &draft.text).await {
                warn!(chat_id = user.chat_id, error = %e, "Failed to deliver broadcast");
                continue;
            }
            delivered += 1;
        }

        info!(
            admin_chat_id = admin_chat_id,
            delivered = delivered,
            excluded = draft.exclusions.picked.len(),
            "Broadcast finished"
        );
        log_admin_action(admin_chat_id, "broadcast_sent", None);
        self.transport
            .send_text(admin_chat_id, "Message sent to all users.")
            .await
    }

    async fn handle_promotion(&self, event: &Event, page: usize) -> Result<()> {
        let chat_id = event.chat_id;
        if !event.is_callback() {
            return self.prompt_buttons(chat_id).await;
        }

        match event.payload() {
            CB_NOOP => Ok(()),

            CB_CANCEL => {
                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                self.transport.send_text(chat_id, MSG_CANCELLED).await
            }

            token @ (CB_PAGE_NEXT | CB_PAGE_PREV) => {
                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let candidates: Vec<User> = users.into_iter().filter(|u| !u.is_admin()).collect();
                let (keyboard, page) =
                    selection_keyboard(&candidates, &[], shift_page(page, token), None);
                self.conversations
                    .set(chat_id, FlowState::SelectingPromotionTarget { page });
                self.edit_selection(event, keyboard).await
            }

            username => {
                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let Some(target) = users.iter().find(|u| u.username == username) else {
                    return self.transport.send_text(chat_id, "User not found.").await;
                };
                if target.is_admin() {
                    return self
                        .transport
                        .send_text(chat_id, "User is already an administrator.")
                        .await;
                }

                match self.users.set_role_by_username(username, true).await {
                    Ok(Some(user)) => {
                        self.clear_keyboard(event).await;
                        self.conversations.clear(chat_id);
                        log_admin_action(chat_id, "promote", Some(username));
                        let text = format!("User @{} is now an administrator.", user.username);
                        self.transport.send_text(chat_id, &text).await
                    }
                    Ok(None) => self.transport.send_text(chat_id, "User not found.").await,
                    Err(e) => self.report_store_error(chat_id, &e).await,
                }
            }
        }
    }

    async fn handle_demotion(&self, event: &Event, page: usize) -> Result<()> {
        let chat_id = event.chat_id;
        if !event.is_callback() {
            return self.prompt_buttons(chat_id).await;
        }

        match event.payload() {
            CB_NOOP => Ok(()),

            CB_CANCEL => {
                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                self.transport.send_text(chat_id, MSG_CANCELLED).await
            }

            token @ (CB_PAGE_NEXT | CB_PAGE_PREV) => {
                let admins = match self.users.list_admins().await {
                    Ok(admins) => admins,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) =
                    selection_keyboard(&admins, &[], shift_page(page, token), None);
                self.conversations
                    .set(chat_id, FlowState::SelectingDemotionTarget { page });
                self.edit_selection(event, keyboard).await
            }

            username => {
                let admins = match self.users.list_admins().await {
                    Ok(admins) => admins,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                if !admins.iter().any(|a| a.username == username) {
                    return self.transport.send_text(chat_id, "Administrator not found.").await;
                }

                match self.users.set_role_by_username(username, false).await {
                    Ok(Some(user)) => {
                        self.clear_keyboard(event).await;
                        self.conversations.clear(chat_id);
                        log_admin_action(chat_id, "demote", Some(username));
                        let text =
                            format!("User @{} is no longer an administrator.", user.username);
                        self.transport.send_text(chat_id, &text).await
                    }
                    Ok(None) => self.transport.send_text(chat_id, "Administrator not found.").await,
                    Err(e) => self.report_store_error(chat_id, &e).await,
                }
            }
        }
    }

    async fn handle_block_targets(&self, event: &Event, mut selection: Selection) -> Result<()> {
        let chat_id = event.chat_id;
        if !event.is_callback() {
            return self.prompt_buttons(chat_id).await;
        }

        match event.payload() {
            CB_NOOP => Ok(()),

            CB_CANCEL => {
                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                self.transport.send_text(chat_id, MSG_CANCELLED).await
            }

            CB_BLOCK_USERS => {
                if selection.is_empty() {
                    return self
                        .transport
                        .send_text(chat_id, "No users selected to block.")
                        .await;
                }

                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                if let Err(e) = self.users.block_by_usernames(&selection.picked).await {
                    return self.report_store_error(chat_id, &e).await;
                }

                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                log_admin_action(chat_id, "block", None);
                let text = format!(
                    "Users blocked:\n{}",
                    labels_for(&selection.picked, &users)
                );
                self.transport.send_text(chat_id, &text).await
            }

            token @ (CB_PAGE_NEXT | CB_PAGE_PREV) => {
                selection.page = shift_page(selection.page, token);
                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) = selection_keyboard(
                    &users,
                    &selection.picked,
                    selection.page,
                    Some(Button::new("Block", CB_BLOCK_USERS)),
                );
                selection.page = page;
                self.conversations
                    .set(chat_id, FlowState::SelectingBlockTargets { selection });
                self.edit_selection(event, keyboard).await
            }

            username => {
                selection.pick(username);
                let users = match self.users.list_active().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) = selection_keyboard(
                    &users,
                    &selection.picked,
                    selection.page,
                    Some(Button::new("Block", CB_BLOCK_USERS)),
                );
                selection.page = page;
                self.conversations
                    .set(chat_id, FlowState::SelectingBlockTargets { selection });
                self.edit_selection(event, keyboard).await
            }
        }
    }

    async fn handle_unblock_targets(&self, event: &Event, mut selection: Selection) -> Result<()> {
        let chat_id = event.chat_id;
        if !event.is_callback() {
            return self.prompt_buttons(chat_id).await;
        }

        match event.payload() {
            CB_NOOP => Ok(()),

            CB_CANCEL => {
                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                self.transport.send_text(chat_id, MSG_CANCELLED).await
            }

            CB_UNBLOCK_USERS => {
                if selection.is_empty() {
                    return self
                        .transport
                        .send_text(chat_id, "No users selected to unblock.")
                        .await;
                }

                let users = match self.users.list_blocked().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                if let Err(e) = self.users.unblock_by_usernames(&selection.picked).await {
                    return self.report_store_error(chat_id, &e).await;
                }

                self.clear_keyboard(event).await;
                self.conversations.clear(chat_id);
                log_admin_action(chat_id, "unblock", None);
                let text = format!(
                    "Users unblocked:\n{}",
                    labels_for(&selection.picked, &users)
                );
                self.transport.send_text(chat_id, &text).await
            }

            token @ (CB_PAGE_NEXT | CB_PAGE_PREV) => {
                selection.page = shift_page(selection.page, token);
                let users = match self.users.list_blocked().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) = selection_keyboard(
                    &users,
                    &selection.picked,
                    selection.page,
                    Some(Button::new("Unblock", CB_UNBLOCK_USERS)),
                );
                selection.page = page;
                self.conversations
                    .set(chat_id, FlowState::SelectingUnblockTargets { selection });
                self.edit_selection(event, keyboard).await
            }

            username => {
                selection.pick(username);
                let users = match self.users.list_blocked().await {
                    Ok(users) => users,
                    Err(e) => return self.report_store_error(chat_id, &e).await,
                };
                let (keyboard, page) = selection_keyboard(
                    &users,
                    &selection.picked,
                    selection.page,
                    Some(Button::new("Unblock", CB_UNBLOCK_USERS)),
                );
                selection.page = page;
                self.conversations
                    .set(chat_id, FlowState::SelectingUnblockTargets { selection });
                self.edit_selection(event, keyboard).await
            }
        }
    }

    async fn handle_wish_add(&self, event: &Event) -> Result<()> {
        let chat_id = event.chat_id;
        let wish = event.payload().trim();
        if wish.is_empty() {
            return self
                .transport
                .send_text(chat_id, "A wish cannot be empty. Send the wish text:")
                .await;
        }

        let user = match self.users.require_user(chat_id).await {
            Ok(user) => user,
            Err(e) => return self.report_store_error(chat_id, &e).await,
        };
        let mut wishlist = user.wishlist;
        wishlist.push(wish.to_string());
        if let Err(e) = self.users.set_wishlist(chat_id, wishlist).await {
            return self.report_store_error(chat_id, &e).await;
        }

        self.conversations.clear(chat_id);
        self.transport.send_text(chat_id, "Added to your wishlist.").await
    }

    async fn handle_wish_remove(&self, event: &Event) -> Result<()> {
        let chat_id = event.chat_id;

        let user = match self.users.require_user(chat_id).await {
            Ok(user) => user,
            Err(e) => return self.report_store_error(chat_id, &e).await,
        };

        let index: usize = match event.payload().trim().parse() {
            Ok(n) => n,
            Err(_) => {
                return self
                    .transport
                    .send_text(chat_id, "Send the number of the wish to remove:")
                    .await;
            }
        };
        if index == 0 || index > user.wishlist.len() {
            let text = format!(
                "There is no wish with that number. Send a number from 1 to {}:",
                user.wishlist.len()
            );
            return self.transport.send_text(chat_id, &text).await;
        }

        let mut wishlist = user.wishlist;
        let removed = wishlist.remove(index - 1);
        if let Err(e) = self.users.set_wishlist(chat_id, wishlist).await {
            return self.report_store_error(chat_id, &e).await;
        }

        self.conversations.clear(chat_id);
        let text = format!("Removed \"{removed}\" from your wishlist.");
        self.transport.send_text(chat_id, &text).await
    }

    async fn prompt_buttons(&self, chat_id: i64) -> Result<()> {
        self.transport
            .send_text(chat_id, "Use the buttons to pick users, or type 'cancel'.")
            .await
    }

    /// Re-render a selection keyboard in place on the originating message.
    async fn edit_selection(&self, event: &Event, keyboard: Keyboard) -> Result<()> {
        if let Some(message_id) = event.callback_message_id() {
            self.transport
                .edit_keyboard(event.chat_id, message_id, keyboard)
                .await?;
        }
        Ok(())
    }

    /// Drop the inline keyboard from the originating message once a flow
    /// finishes or is cancelled. Failure here is cosmetic only.
    async fn clear_keyboard(&self, event: &Event) {
        if let Some(message_id) = event.callback_message_id() {
            if let Err(e) = self
                .transport
                .edit_keyboard(event.chat_id, message_id, Keyboard::default())
                .await
            {
                warn!(chat_id = event.chat_id, error = %e, "Failed to clear inline keyboard");
            }
        }
    }
}

fn shift_page(page: usize, token: &str) -> usize {
    if token == CB_PAGE_NEXT {
        page.saturating_add(1)
    } else {
        page.saturating_sub(1)
    }
}

/// Button-style labels for a list of handles, falling back to `@handle`
/// for rows we cannot find anymore.
fn labels_for(usernames: &[String], users: &[User]) -> String {
    usernames
        .iter()
        .map(|username| {
            users
                .iter()
                .find(|u| &u.username == username)
                .map(format_user_label)
                .unwrap_or_else(|| format!("@{}", username.trim()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
