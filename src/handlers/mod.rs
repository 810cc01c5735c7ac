//! Dialogue engine
//!
//! Routes every inbound event through the rate limiter, the blocked-user
//! gate and the per-chat flow state, then into the command or flow
//! handlers.

pub mod commands;
pub mod flows;
pub mod keyboard;

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::middleware::RateLimiter;
use crate::services::UserService;
use crate::state::{ConversationStore, FlowState};
use crate::transport::{Event, Transport};
use crate::utils::errors::Result;

pub(crate) const MSG_RATE_LIMITED: &str = "Too many requests. Please try again later.";
pub(crate) const MSG_BLOCKED: &str = "You are blocked.";
pub(crate) const MSG_NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";
pub(crate) const MSG_NO_PERMISSION: &str = "You don't have permission to use this command.";
pub(crate) const MSG_STORE_ERROR: &str = "Something went wrong. Please try again.";
pub(crate) const MSG_CANCELLED: &str = "Action cancelled.";

pub(crate) const WELCOME: &str = "Hi! This is a small bot for celebrating your colleagues. \
It has a couple of commands to get you started. If anything goes wrong you can always \
reach out to your administrator.\n\nTo begin, send the /login command.";

/// Text a user can type to abandon the current flow.
pub(crate) const CANCEL_WORD: &str = "cancel";

#[derive(Clone)]
pub struct DialogueEngine {
    pub(crate) users: UserService,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) conversations: ConversationStore,
    pub(crate) rate_limiter: RateLimiter,
    pub(crate) secret_word: String,
}

impl DialogueEngine {
    pub fn new(
        users: UserService,
        transport: Arc<dyn Transport>,
        conversations: ConversationStore,
        rate_limiter: RateLimiter,
        secret_word: String,
    ) -> Self {
        Self {
            users,
            transport,
            conversations,
            rate_limiter,
            secret_word,
        }
    }

    /// Process one inbound event end to end.
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        let chat_id = event.chat_id;

        let decision = self.rate_limiter.allow(chat_id);
        if !decision.allowed {
            if decision.should_warn {
                info!(chat_id = chat_id, "Rate limit exceeded, warning sender");
                self.transport.send_text(chat_id, MSG_RATE_LIMITED).await?;
            }
            return Ok(());
        }

        if let Some(callback_id) = event.callback_id() {
            if let Err(e) = self.transport.ack_callback(callback_id).await {
                debug!(chat_id = chat_id, error = %e, "Failed to ack callback");
            }
        }

        // /start always answers, whatever state the chat is in.
        if event.payload() == "/start" {
            self.transport.send_text(chat_id, WELCOME).await?;
            return Ok(());
        }

        let sender = self.users.get_user(chat_id).await?;
        if sender.as_ref().is_some_and(|u| u.blocked) {
            self.transport.send_text(chat_id, MSG_BLOCKED).await?;
            return Ok(());
        }

        let state = self.conversations.get(chat_id);
        debug!(chat_id = chat_id, state = state.name(), "Dispatching event");

        match state {
            FlowState::Idle => self.handle_command(&event, sender.as_ref()).await,
            FlowState::AwaitingSecret { attempts } => self.handle_secret(&event, attempts).await,
            other => self.handle_flow(&event, other).await,
        }
    }

    /// Report a failed store write without touching conversation state, so
    /// the sender can retry the same step.
    pub(crate) async fn report_store_error(
        &self,
        chat_id: i64,
        error: &crate::utils::errors::GiftBotError,
    ) -> Result<()> {
        error!(chat_id = chat_id, error = %error, "Store operation failed");
        self.transport.send_text(chat_id, MSG_STORE_ERROR).await
    }
}
