//! Services module
//!
//! This module contains business logic services

pub mod birthday;
pub mod profile_sync;
pub mod user;

// Re-export commonly used services
pub use birthday::BirthdayNotifier;
pub use profile_sync::ProfileSync;
pub use user::UserService;

use std::sync::Arc;

use crate::config::Settings;
use crate::database::UserStore;
use crate::transport::Transport;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub user_service: UserService,
    pub birthday_notifier: BirthdayNotifier,
    pub profile_sync: ProfileSync,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(store: Arc<dyn UserStore>, transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        let user_service = UserService::new(Arc::clone(&store));
        let birthday_notifier = BirthdayNotifier::new(
            Arc::clone(&store),
            Arc::clone(&transport),
            settings.notifications.clone(),
        );
        let profile_sync = ProfileSync::new(store, transport, settings.profile_sync.clone());

        Self {
            user_service,
            birthday_notifier,
            profile_sync,
        }
    }
}
