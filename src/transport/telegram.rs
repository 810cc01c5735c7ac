//! Teloxide-backed transport adapter

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId},
    Bot,
};
use tracing::debug;

use super::{Keyboard, Transport};
use crate::models::Profile;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn to_markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
        let rows = keyboard.rows.into_iter().map(|row| {
            row.into_iter()
                .map(|button| InlineKeyboardButton::callback(button.label, button.data))
                .collect::<Vec<_>>()
        });
        InlineKeyboardMarkup::new(rows)
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn send_text_with_keyboard(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(Self::to_markup(keyboard))
            .await?;
        Ok(())
    }

    async fn edit_keyboard(&self, chat_id: i64, message_id: i32, keyboard: Keyboard) -> Result<()> {
        self.bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
            .reply_markup(Self::to_markup(keyboard))
            .await?;
        Ok(())
    }

    async fn ack_callback(&self, callback_id: &str) -> Result<()> {
        self.bot.answer_callback_query(callback_id.to_string()).await?;
        Ok(())
    }

    async fn fetch_profile(&self, chat_id: i64) -> Result<Profile> {
        debug!(chat_id = chat_id, "Fetching chat profile");
        let chat = self.bot.get_chat(ChatId(chat_id)).await?;

        Ok(Profile {
            username: chat.username().unwrap_or_default().to_string(),
            first_name: chat.first_name().map(ToOwned::to_owned),
            last_name: chat.last_name().map(ToOwned::to_owned),
        })
    }
}
