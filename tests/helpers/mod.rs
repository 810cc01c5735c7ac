//! Shared test doubles for the dialogue engine and job tests
//!
//! An in-memory [`UserStore`] and a transport that records every outbound
//! message instead of talking to Telegram.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use giftbot::database::UserStore;
use giftbot::models::{CreateUserRequest, Profile, UpdateUserRequest, User, ROLE_ADMIN, ROLE_USER};
use giftbot::transport::{Event, EventKind, Keyboard, Transport};
use giftbot::{GiftBotError, Result};

/// In-memory user store mirroring the repository semantics.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    ledger: Mutex<HashSet<(i64, i64, NaiveDate)>>,
    next_id: Mutex<i64>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registered member.
    pub fn seed_user(&self, chat_id: i64, username: &str) -> User {
        self.seed(chat_id, username, ROLE_USER, None, false)
    }

    pub fn seed_admin(&self, chat_id: i64, username: &str) -> User {
        self.seed(chat_id, username, ROLE_ADMIN, None, false)
    }

    pub fn seed(
        &self,
        chat_id: i64,
        username: &str,
        role: &str,
        birthdate: Option<NaiveDate>,
        blocked: bool,
    ) -> User {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let user = User {
            id: *next_id,
            chat_id,
            username: username.to_string(),
            first_name: None,
            last_name: None,
            role: role.to_string(),
            birthdate,
            wishlist: vec![],
            blocked,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn user(&self, chat_id: i64) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.chat_id == chat_id)
            .cloned()
    }

    pub fn set_wishlist(&self, chat_id: i64, wishlist: Vec<String>) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.chat_id == chat_id) {
            user.wishlist = wishlist;
        }
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, request: CreateUserRequest) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        // Idempotent by chat_id, like the ON CONFLICT DO NOTHING insert.
        if users.iter().any(|u| u.chat_id == request.chat_id) {
            return Ok(());
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        users.push(User {
            id: *next_id,
            chat_id: request.chat_id,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.role,
            birthdate: request.birthdate,
            wishlist: vec![],
            blocked: request.blocked,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<User>> {
        Ok(self.user(chat_id))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_user(&self, chat_id: i64, request: UpdateUserRequest) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.chat_id == chat_id)
            .ok_or(GiftBotError::UserNotFound { chat_id })?;
        if let Some(username) = request.username {
            user.username = username;
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(birthdate) = request.birthdate {
            user.birthdate = Some(birthdate);
        }
        if let Some(wishlist) = request.wishlist {
            user.wishlist = wishlist;
        }
        if let Some(blocked) = request.blocked {
            user.blocked = blocked;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_profile(&self, chat_id: i64, profile: &Profile) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.chat_id == chat_id)
            .ok_or(GiftBotError::UserNotFound { chat_id })?;
        user.username = profile.username.clone();
        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_blocked_by_usernames(&self, usernames: &[String], blocked: bool) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        for user in users.iter_mut() {
            if usernames.iter().any(|n| n == &user.username) {
                user.blocked = blocked;
            }
        }
        Ok(())
    }

    async fn has_birthday_notification(
        &self,
        admin_chat_id: i64,
        user_chat_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .contains(&(admin_chat_id, user_chat_id, date)))
    }

    async fn record_birthday_notification(
        &self,
        admin_chat_id: i64,
        user_chat_id: i64,
        date: NaiveDate,
    ) -> Result<()> {
        self.ledger
            .lock()
            .unwrap()
            .insert((admin_chat_id, user_chat_id, date));
        Ok(())
    }
}

/// One outbound action the transport was asked to perform.
#[derive(Debug, Clone)]
pub enum Outbound {
    Text { chat_id: i64, text: String },
    TextWithKeyboard { chat_id: i64, text: String, keyboard: Keyboard },
    EditKeyboard { chat_id: i64, message_id: i32, keyboard: Keyboard },
    Ack { callback_id: String },
}

/// Transport double that records everything sent through it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Outbound>>,
    profiles: Mutex<HashMap<i64, Profile>>,
    failing_chats: Mutex<HashSet<i64>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends to this chat fail, for failure-isolation tests.
    pub fn fail_sends_to(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }

    pub fn set_profile(&self, chat_id: i64, profile: Profile) {
        self.profiles.lock().unwrap().insert(chat_id, profile);
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    /// All plain texts sent to a chat, in order.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|o| match o {
                Outbound::Text { chat_id: c, text } if *c == chat_id => Some(text.clone()),
                Outbound::TextWithKeyboard { chat_id: c, text, .. } if *c == chat_id => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    /// The most recent keyboard shown or edited in a chat.
    pub fn last_keyboard_in(&self, chat_id: i64) -> Option<Keyboard> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|o| match o {
                Outbound::TextWithKeyboard { chat_id: c, keyboard, .. } if *c == chat_id => {
                    Some(keyboard.clone())
                }
                Outbound::EditKeyboard { chat_id: c, keyboard, .. } if *c == chat_id => {
                    Some(keyboard.clone())
                }
                _ => None,
            })
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.failing_chats.lock().unwrap().contains(&chat_id) {
            return Err(GiftBotError::InvalidInput(format!(
                "send to {chat_id} failed"
            )));
        }
        self.sent.lock().unwrap().push(Outbound::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_text_with_keyboard(&self, chat_id: i64, text: &str, keyboard: Keyboard) -> Result<()> {
        self.sent.lock().unwrap().push(Outbound::TextWithKeyboard {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_keyboard(&self, chat_id: i64, message_id: i32, keyboard: Keyboard) -> Result<()> {
        self.sent.lock().unwrap().push(Outbound::EditKeyboard {
            chat_id,
            message_id,
            keyboard,
        });
        Ok(())
    }

    async fn ack_callback(&self, callback_id: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Outbound::Ack {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }

    async fn fetch_profile(&self, chat_id: i64) -> Result<Profile> {
        self.profiles
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .ok_or(GiftBotError::UserNotFound { chat_id })
    }
}

/// Text event from a chat.
pub fn text_event(chat_id: i64, username: &str, text: &str) -> Event {
    Event {
        chat_id,
        kind: EventKind::Text(text.to_string()),
        profile: Profile {
            username: username.to_string(),
            first_name: None,
            last_name: None,
        },
    }
}

/// Button-press event from a chat.
pub fn callback_event(chat_id: i64, username: &str, data: &str) -> Event {
    Event {
        chat_id,
        kind: EventKind::Callback {
            id: format!("cb-{chat_id}"),
            data: data.to_string(),
            message_id: 100,
        },
        profile: Profile {
            username: username.to_string(),
            first_name: None,
            last_name: None,
        },
    }
}
