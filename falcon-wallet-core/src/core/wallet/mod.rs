//! Wallet session management
//!
//! This module owns the connect / disconnect / restore lifecycle across the
//! four provider families. `WalletSession` is the only writer of
//! `WalletSessionState`; consumers subscribe to a watch channel.

pub mod login;
pub mod providers;

pub use login::BackendLoginTask;
pub use providers::{Handshake, HandshakeSettings, ProviderRegistry};

use crate::core::storage::SessionStore;
use crate::domain::entities::{PersistedSession, WalletSessionState};
use crate::shared::error::WalletError;
use crate::shared::types::{Address, ProviderKind, SessionStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

pub struct WalletSession {
    state: Arc<watch::Sender<WalletSessionState>>,
    registry: ProviderRegistry,
    store: SessionStore,
    login: BackendLoginTask,
    settings: HandshakeSettings,
    // Bumped by disconnect so a connect that resolves afterwards is dropped
    epoch: AtomicU64,
}

impl WalletSession {
    pub fn new(
        registry: ProviderRegistry,
        store: SessionStore,
        login: BackendLoginTask,
        settings: HandshakeSettings,
    ) -> Self {
        let (state, _) = watch::channel(WalletSessionState::default());
        Self {
            state: Arc::new(state),
            registry,
            store,
            login,
            settings,
            epoch: AtomicU64::new(0),
        }
    }

    /// Current state snapshot
    pub fn current(&self) -> WalletSessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSessionState> {
        self.state.subscribe()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Active address, if connected
    pub fn address(&self) -> Option<Address> {
        self.state.borrow().address.clone()
    }

    /// Adopt a previous session at startup.
    ///
    /// A live identity-provider session wins. Otherwise a persisted injected
    /// provider pair is adopted without re-verifying it with the extension.
    pub async fn restore(&self) -> WalletSessionState {
        if self.state.borrow().status != SessionStatus::Disconnected {
            return self.current();
        }
        let epoch = self.epoch.load(Ordering::SeqCst);

        let identity = self.registry.identity();
        if identity.is_authenticated().await {
            if let Some(principal) = identity.principal().filter(|p| !p.is_empty()) {
                log::info!("Restored Internet Identity session");
                self.adopt(epoch, ProviderKind::FederatedIdentity, principal);
                return self.current();
            }
        }

        match self.store.load() {
            Some(saved) if saved.provider_kind != ProviderKind::FederatedIdentity => {
                // Known limitation: the extension may have revoked access since
                log::info!("Restored persisted {} session", saved.provider_kind);
                self.adopt(epoch, saved.provider_kind, saved.address);
            }
            Some(_) => {
                log::debug!("Persisted identity session has expired");
                self.clear_persisted();
            }
            None => {}
        }

        self.current()
    }

    /// Connect through `kind`.
    ///
    /// Rejected with `Conflict` while another connect is in flight. Any other
    /// failure is also recorded in `last_error` with status `Error`.
    pub async fn connect(&self, kind: ProviderKind) -> Result<Address, WalletError> {
        let started = self.state.send_if_modified(|s| {
            if s.is_connecting() {
                return false;
            }
            *s = WalletSessionState {
                status: SessionStatus::Connecting,
                ..WalletSessionState::default()
            };
            true
        });
        if !started {
            log::debug!("Ignoring connect to {} while another connect is in progress", kind);
            return Err(WalletError::conflict("A wallet connection is already in progress"));
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        log::info!("Connecting to {}", kind);

        let result = match self.registry.handshake(kind) {
            Some(handshake) => handshake.connect(&self.settings).await,
            None => Err(WalletError::provider_unavailable(match kind.install_url() {
                Some(url) => format!("{} is not installed. Get it at {}", kind.display_name(), url),
                None => format!("{} is not available", kind.display_name()),
            })),
        };

        if self.epoch.load(Ordering::SeqCst) != epoch {
            log::debug!("Discarding {} connect result after disconnect", kind);
            return Err(WalletError::conflict("Session was reset while connecting"));
        }

        match result {
            Ok(address) => {
                log::info!("Connected to {}", kind);
                self.adopt(epoch, kind, address.clone());
                Ok(address)
            }
            Err(e) => {
                log::warn!("Failed to connect to {}: {}", kind, e);
                self.state.send_replace(WalletSessionState::failed(e.to_string()));
                self.clear_persisted();
                Err(e)
            }
        }
    }

    /// Tear down the provider (best effort) and reset the session.
    pub async fn disconnect(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let kind = self.state.borrow().provider_kind;

        if let Some(handshake) = kind.and_then(|k| self.registry.handshake(k)) {
            if let Err(e) = handshake.disconnect().await {
                log::warn!("Provider teardown failed, resetting anyway: {}", e);
            }
        }

        self.state.send_replace(WalletSessionState::default());
        self.clear_persisted();
        log::info!("Wallet disconnected");
    }

    /// Account change pushed by the EVM provider.
    ///
    /// Zero accounts ends the session; otherwise the first account becomes
    /// the active address. Events while another provider is active are ignored.
    pub async fn on_accounts_changed(&self, accounts: &[String]) {
        let current = self.current();
        if !current.is_connected() || current.provider_kind != Some(ProviderKind::InjectedEvm) {
            log::debug!("Ignoring account change for inactive EVM provider");
            return;
        }

        let Some(next) = accounts.first().filter(|a| !a.is_empty()).cloned() else {
            log::info!("EVM provider reported no accounts");
            self.disconnect().await;
            return;
        };

        let switched = self.state.send_if_modified(|s| {
            if s.is_connected() && s.provider_kind == Some(ProviderKind::InjectedEvm) && s.address.as_ref() != Some(&next) {
                s.address = Some(next.clone());
                s.plan = None;
                s.account_status = None;
                s.is_authenticated = false;
                true
            } else {
                false
            }
        });

        if switched {
            log::info!("EVM account switched");
            self.persist(ProviderKind::InjectedEvm, &next);
            self.login.spawn(self.state.clone(), next);
        }
    }

    fn adopt(&self, epoch: u64, kind: ProviderKind, address: Address) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        self.state.send_replace(WalletSessionState::connected(kind, address.clone()));
        self.persist(kind, &address);
        self.login.spawn(self.state.clone(), address);
    }

    fn persist(&self, provider_kind: ProviderKind, address: &str) {
        let record = PersistedSession {
            provider_kind,
            address: address.to_string(),
        };
        if let Err(e) = self.store.save(&record) {
            log::warn!("Failed to persist session: {}", e);
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear persisted session: {}", e);
        }
    }
}
