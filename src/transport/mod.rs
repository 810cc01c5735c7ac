//! Transport seam
//!
//! Inbound events and the outbound send interface the dialogue engine and
//! jobs use. The production adapter is [`telegram::TelegramTransport`];
//! tests substitute a recording implementation.

pub mod telegram;

use async_trait::async_trait;

use crate::models::Profile;
use crate::utils::errors::Result;

/// Reserved callback tokens handled uniformly before flow dispatch.
pub const CB_NOOP: &str = "noop";
pub const CB_PAGE_NEXT: &str = "page:next";
pub const CB_PAGE_PREV: &str = "page:prev";
pub const CB_CANCEL: &str = "cancel_action";

/// Flow-specific action tokens.
pub const CB_SEND_MESSAGE: &str = "send_message";
pub const CB_BLOCK_USERS: &str = "block_users";
pub const CB_UNBLOCK_USERS: &str = "unblock_users";

/// What kind of inbound event arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Plain text message.
    Text(String),
    /// Inline-keyboard button press. `message_id` identifies the message
    /// whose keyboard can be edited in place.
    Callback {
        id: String,
        data: String,
        message_id: i32,
    },
}

/// One inbound event from the transport.
#[derive(Debug, Clone)]
pub struct Event {
    pub chat_id: i64,
    pub kind: EventKind,
    pub profile: Profile,
}

impl Event {
    /// The dispatchable payload: message text or raw callback data.
    pub fn payload(&self) -> &str {
        match &self.kind {
            EventKind::Text(text) => text,
            EventKind::Callback { data, .. } => data,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, EventKind::Callback { .. })
    }

    pub fn callback_message_id(&self) -> Option<i32> {
        match &self.kind {
            EventKind::Callback { message_id, .. } => Some(*message_id),
            EventKind::Text(_) => None,
        }
    }

    pub fn callback_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Callback { id, .. } => Some(id),
            EventKind::Text(_) => None,
        }
    }
}

/// One inline-keyboard button: label plus opaque callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(), data: data.into() }
    }
}

/// Inline keyboard: rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn push_row(&mut self, row: Vec<Button>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All callback data values, row by row. Used by pagination re-renders
    /// and tests.
    pub fn callback_data(&self) -> Vec<&str> {
        self.rows.iter().flatten().map(|b| b.data.as_str()).collect()
    }
}

/// Outbound side of the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_text_with_keyboard(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()>;

    /// Replace the inline keyboard of an existing message in place.
    async fn edit_keyboard(&self, chat_id: i64, message_id: i32, keyboard: Keyboard) -> Result<()>;

    /// Acknowledge a callback so the client stops showing a spinner.
    async fn ack_callback(&self, callback_id: &str) -> Result<()>;

    /// Current display-name fields for a chat, for profile sync.
    async fn fetch_profile(&self, chat_id: i64) -> Result<Profile>;
}
