//! Conversation flow states
//!
//! Every multi-step conversation a chat can be in is a variant of
//! [`FlowState`], carrying only the payload that flow needs. A chat is in
//! exactly one state at a time; entering a new flow replaces the previous
//! state wholesale, so payloads can never leak between flows.

use serde::{Deserialize, Serialize};

/// Draft of a user mid-registration: collected at secret-word time,
/// finalized once a valid birthdate arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDraft {
    pub chat_id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Ordered, duplicate-free set of usernames picked from a selection
/// keyboard, plus the pagination cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub picked: Vec<String>,
    pub page: usize,
}

impl Selection {
    /// Add a username, preserving pick order and ignoring duplicates.
    pub fn pick(&mut self, username: &str) {
        if !self.picked.iter().any(|u| u == username) {
            self.picked.push(username.to_string());
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.picked.iter().any(|u| u == username)
    }

    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }
}

/// Broadcast draft: the message body plus the exclusion selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastDraft {
    pub text: String,
    pub exclusions: Selection,
}

/// Per-chat conversation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    /// No active flow.
    #[default]
    Idle,
    /// `/login` issued; waiting for the shared secret word.
    AwaitingSecret { attempts: u32 },
    /// Secret accepted; waiting for a `DD.MM.YYYY` birthdate.
    AwaitingBirthdate { draft: RegistrationDraft },
    /// `/message` issued; waiting for the broadcast body.
    ComposingBroadcast,
    /// Broadcast body stored; picking users to exclude.
    SelectingBroadcastExclusions { draft: BroadcastDraft },
    /// `/admin_add`; picking a single non-admin to promote.
    SelectingPromotionTarget { page: usize },
    /// `/admin_remove`; picking a single admin to demote.
    SelectingDemotionTarget { page: usize },
    /// `/block`; picking users to soft-block.
    SelectingBlockTargets { selection: Selection },
    /// `/unblock`; picking blocked users to restore.
    SelectingUnblockTargets { selection: Selection },
    /// `/wishlist_add`; waiting for one line of wish text.
    AwaitingWishToAdd,
    /// `/wishlist_remove`; waiting for a 1-based index.
    AwaitingWishToRemove,
}

impl FlowState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FlowState::Idle)
    }

    /// Short tag for structured logging.
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::AwaitingSecret { .. } => "awaiting_secret",
            FlowState::AwaitingBirthdate { .. } => "awaiting_birthdate",
            FlowState::ComposingBroadcast => "composing_broadcast",
            FlowState::SelectingBroadcastExclusions { .. } => "selecting_broadcast_exclusions",
            FlowState::SelectingPromotionTarget { .. } => "selecting_promotion_target",
            FlowState::SelectingDemotionTarget { .. } => "selecting_demotion_target",
            FlowState::SelectingBlockTargets { .. } => "selecting_block_targets",
            FlowState::SelectingUnblockTargets { .. } => "selecting_unblock_targets",
            FlowState::AwaitingWishToAdd => "awaiting_wish_to_add",
            FlowState::AwaitingWishToRemove => "awaiting_wish_to_remove",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert!(FlowState::default().is_idle());
    }

    #[test]
    fn test_selection_pick_is_ordered_and_unique() {
        let mut selection = Selection::default();
        selection.pick("bob");
        selection.pick("alice");
        selection.pick("bob");

        assert_eq!(selection.picked, vec!["bob".to_string(), "alice".to_string()]);
        assert!(selection.contains("alice"));
        assert!(!selection.contains("carol"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(FlowState::Idle.name(), "idle");
        assert_eq!(FlowState::AwaitingSecret { attempts: 1 }.name(), "awaiting_secret");
        assert_eq!(
            FlowState::SelectingBlockTargets { selection: Selection::default() }.name(),
            "selecting_block_targets"
        );
    }
}
