//! Backend login reconciliation
//!
//! Two phases: the session is marked authenticated with placeholder values
//! right away, then a background task asks the profile service and patches
//! plan and status on success. A failure only logs.

use crate::domain::entities::WalletSessionState;
use crate::domain::repositories::ProfileService;
use crate::shared::types::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct BackendLoginTask {
    profiles: Arc<dyn ProfileService>,
    timeout: Duration,
}

impl BackendLoginTask {
    pub fn new(profiles: Arc<dyn ProfileService>, timeout: Duration) -> Self {
        Self { profiles, timeout }
    }

    /// Apply the optimistic phase and start the reconciliation task.
    ///
    /// The returned handle may be dropped; the task runs detached.
    pub fn spawn(&self, state: Arc<watch::Sender<WalletSessionState>>, address: Address) -> JoinHandle<()> {
        state.send_if_modified(|s| {
            if s.is_connected() && s.address.as_deref() == Some(address.as_str()) {
                s.mark_authenticated_optimistically();
                true
            } else {
                false
            }
        });

        let profiles = self.profiles.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let profile = match tokio::time::timeout(timeout, profiles.login(&address)).await {
                Ok(Ok(profile)) => profile,
                Ok(Err(e)) => {
                    log::warn!("Backend login failed for {}, keeping optimistic profile: {}", address, e);
                    return;
                }
                Err(_) => {
                    log::warn!("Backend login timed out for {}, keeping optimistic profile", address);
                    return;
                }
            };

            // The user may have switched accounts or disconnected meanwhile
            let applied = state.send_if_modified(|s| {
                if s.is_connected() && s.address.as_deref() == Some(address.as_str()) {
                    s.apply_profile(&profile);
                    true
                } else {
                    false
                }
            });

            if applied {
                log::info!("Backend profile applied for {}: {:?} / {}", address, profile.plan, profile.status);
            } else {
                log::debug!("Discarding backend profile for inactive address {}", address);
            }
        })
    }
}
