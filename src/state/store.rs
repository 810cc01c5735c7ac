//! In-memory conversation state store
//!
//! Maps chat ids to their current [`FlowState`]. State is ephemeral by
//! design: a process restart drops all in-flight flows and users simply
//! restart them. The map is lock-guarded because the dispatcher may run
//! handlers concurrently; the lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::flow::FlowState;

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    states: Arc<Mutex<HashMap<i64, FlowState>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a chat; `Idle` when the chat has never been seen.
    pub fn get(&self, chat_id: i64) -> FlowState {
        let states = self.states.lock().expect("conversation store lock poisoned");
        states.get(&chat_id).cloned().unwrap_or_default()
    }

    /// Replace the state for a chat. Entering a new flow this way discards
    /// any previous flow's payload.
    pub fn set(&self, chat_id: i64, state: FlowState) {
        let mut states = self.states.lock().expect("conversation store lock poisoned");
        tracing::debug!(chat_id = chat_id, state = state.name(), "Conversation state set");
        states.insert(chat_id, state);
    }

    /// Clear a chat back to `Idle` (flow completed or cancelled).
    pub fn clear(&self, chat_id: i64) {
        let mut states = self.states.lock().expect("conversation store lock poisoned");
        states.remove(&chat_id);
    }

    /// Number of chats with a non-idle flow, for diagnostics.
    pub fn active_count(&self) -> usize {
        let states = self.states.lock().expect("conversation store lock poisoned");
        states.values().filter(|s| !s.is_idle()).count()
    }
}
