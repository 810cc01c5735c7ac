//! Profile sync job
//!
//! Periodically refreshes stored display-name fields from the transport,
//! throttled with a jittered delay between lookups.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::ProfileSyncConfig;
use crate::database::UserStore;
use crate::transport::Transport;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct ProfileSync {
    store: Arc<dyn UserStore>,
    transport: Arc<dyn Transport>,
    config: ProfileSyncConfig,
}

impl ProfileSync {
    pub fn new(
        store: Arc<dyn UserStore>,
        transport: Arc<dyn Transport>,
        config: ProfileSyncConfig,
    ) -> Self {
        Self {
            store,
            transport,
            config,
        }
    }

    /// Walk every user serially, refreshing changed name fields. A failed
    /// lookup skips that user and keeps going.
    pub async fn sync_profiles(&self) -> Result<()> {
        let users = self.store.list_users().await?;
        if users.is_empty() {
            return Ok(());
        }

        info!(count = users.len(), "Starting profile sync");
        let mut updated = 0usize;

        for user in users {
            match self.transport.fetch_profile(user.chat_id).await {
                Ok(profile) => {
                    let changed = user.username != profile.username
                        || user.first_name != profile.first_name
                        || user.last_name != profile.last_name;
                    if changed {
                        debug!(chat_id = user.chat_id, "Profile changed, updating");
                        if let Err(e) = self.store.update_profile(user.chat_id, &profile).await {
                            warn!(chat_id = user.chat_id, error = %e, "Failed to update profile");
                        } else {
                            updated += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(chat_id = user.chat_id, error = %e, "Failed to fetch profile");
                }
            }

            tokio::time::sleep(self.throttle_delay()).await;
        }

        info!(updated = updated, "Profile sync finished");
        Ok(())
    }

    fn throttle_delay(&self) -> Duration {
        let jitter = if self.config.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.config.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.config.base_delay_ms + jitter)
    }
}
