//! Provider detection and connect handshakes
//!
//! `ProviderRegistry` probes the browser environment on every call.
//! `Handshake` is one variant per provider family, each with its own
//! connect and teardown routine behind the same three operations.

use crate::infrastructure::browser::{
    BrowserEnvironment, EvmProvider, IdentityProvider, LoginOptions, SolanaProvider, TronProvider,
};
use crate::shared::config::WalletCoreConfig;
use crate::shared::error::WalletError;
use crate::shared::types::{Address, ProviderKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Identity provider error when the user closes the login window
const IDENTITY_USER_INTERRUPT: &str = "UserInterrupt";

/// Knobs for the provider handshakes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSettings {
    pub tron_poll_interval: Duration,
    pub tron_poll_attempts: u32,
    pub identity_session_ttl: Duration,
    pub identity_login_timeout: Duration,
    pub identity_provider_url: String,
}

impl From<&WalletCoreConfig> for HandshakeSettings {
    fn from(config: &WalletCoreConfig) -> Self {
        Self {
            tron_poll_interval: config.tron_poll_interval(),
            tron_poll_attempts: config.tron_poll_attempts,
            identity_session_ttl: config.identity_session_ttl(),
            identity_login_timeout: config.identity_login_timeout(),
            identity_provider_url: config.network.identity_provider_url().to_string(),
        }
    }
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self::from(&WalletCoreConfig::default())
    }
}

pub struct ProviderRegistry {
    environment: Arc<dyn BrowserEnvironment>,
}

impl ProviderRegistry {
    pub fn new(environment: Arc<dyn BrowserEnvironment>) -> Self {
        Self { environment }
    }

    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.handshake(kind).is_some()
    }

    /// Providers usable right now, in display order
    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
            .collect()
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        self.environment.identity()
    }

    /// Bind a handshake to the provider object currently injected, if any
    pub fn handshake(&self, kind: ProviderKind) -> Option<Handshake> {
        match kind {
            ProviderKind::InjectedEvm => self.environment.evm().map(Handshake::Evm),
            ProviderKind::InjectedSolana => self.environment.solana().map(Handshake::Solana),
            ProviderKind::InjectedTron => self.environment.tron().map(Handshake::Tron),
            ProviderKind::FederatedIdentity => Some(Handshake::Federated(self.environment.identity())),
        }
    }
}

pub enum Handshake {
    Evm(Arc<dyn EvmProvider>),
    Solana(Arc<dyn SolanaProvider>),
    Tron(Arc<dyn TronProvider>),
    Federated(Arc<dyn IdentityProvider>),
}

impl Handshake {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Handshake::Evm(_) => ProviderKind::InjectedEvm,
            Handshake::Solana(_) => ProviderKind::InjectedSolana,
            Handshake::Tron(_) => ProviderKind::InjectedTron,
            Handshake::Federated(_) => ProviderKind::FederatedIdentity,
        }
    }

    pub async fn connect(&self, settings: &HandshakeSettings) -> Result<Address, WalletError> {
        let address = match self {
            Handshake::Evm(provider) => provider
                .request_accounts()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| WalletError::address_unresolved("MetaMask returned no accounts"))?,
            Handshake::Solana(provider) => provider.connect(false).await?,
            Handshake::Tron(provider) => Self::connect_tron(provider.as_ref(), settings).await?,
            Handshake::Federated(identity) => Self::connect_identity(identity.as_ref(), settings).await?,
        };

        if address.trim().is_empty() {
            return Err(WalletError::address_unresolved(format!(
                "{} returned an empty address",
                self.kind()
            )));
        }
        Ok(address)
    }

    /// Best-effort provider teardown
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        match self {
            Handshake::Solana(provider) => Ok(provider.disconnect().await?),
            Handshake::Federated(identity) => Ok(identity.logout().await?),
            // No programmatic disconnect; the extension keeps its own grant
            Handshake::Evm(_) | Handshake::Tron(_) => Ok(()),
        }
    }

    async fn connect_tron(provider: &dyn TronProvider, settings: &HandshakeSettings) -> Result<Address, WalletError> {
        provider.request_accounts().await?;

        // The default address shows up asynchronously with no event to wait on
        for attempt in 1..=settings.tron_poll_attempts {
            if let Some(address) = provider.default_address().filter(|a| !a.is_empty()) {
                log::debug!("TronLink address resolved after {} attempt(s)", attempt);
                return Ok(address);
            }
            if attempt < settings.tron_poll_attempts {
                tokio::time::sleep(settings.tron_poll_interval).await;
            }
        }

        Err(WalletError::address_unresolved(format!(
            "TronLink did not expose an address after {} attempts",
            settings.tron_poll_attempts
        )))
    }

    async fn connect_identity(
        identity: &dyn IdentityProvider,
        settings: &HandshakeSettings,
    ) -> Result<Address, WalletError> {
        let (tx, rx) = oneshot::channel();
        let options = LoginOptions {
            identity_provider_url: settings.identity_provider_url.clone(),
            max_time_to_live: settings.identity_session_ttl,
        };

        identity.login(
            options,
            Box::new(move |outcome| {
                // Receiver gone means the connect future was dropped
                let _ = tx.send(outcome);
            }),
        );

        let outcome = match tokio::time::timeout(settings.identity_login_timeout, rx).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return Err(WalletError::address_unresolved(format!(
                    "Internet Identity login did not finish within {}s",
                    settings.identity_login_timeout.as_secs()
                )))
            }
        };

        match outcome {
            Ok(Ok(principal)) => Ok(principal),
            Ok(Err(reason)) if reason.contains(IDENTITY_USER_INTERRUPT) => {
                Err(WalletError::user_rejected("Internet Identity login was cancelled"))
            }
            Ok(Err(reason)) => Err(WalletError::address_unresolved(format!(
                "Internet Identity login failed: {}",
                reason
            ))),
            Err(_) => Err(WalletError::address_unresolved(
                "Internet Identity login ended without a result",
            )),
        }
    }
}
