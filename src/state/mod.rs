//! State management module
//!
//! This module handles per-chat conversation state

pub mod flow;
pub mod store;

pub use flow::{BroadcastDraft, FlowState, RegistrationDraft, Selection};
pub use store::ConversationStore;
