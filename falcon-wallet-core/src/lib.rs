//! Falcon Wallet Core
//!
//! Wallet session manager and multi-token aggregation client for Falcon Wallet.
//! Connects to one of several browser wallet providers, keeps the session
//! across reloads, and aggregates balances, USD prices and transaction history
//! for the connected address.
//!
//! ## Architecture
//!
//! - **Core**: Session state machine, token catalog, aggregators, polling
//! - **Domain**: Entities and the traits remote collaborators implement
//! - **Infrastructure**: Platform storage, browser provider ports, HTTP backend
//! - **Shared**: Errors, types, constants, configuration and utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use falcon_wallet_core::{init_wallet_core, ProviderKind};
//!
//! falcon_wallet_core::init()?;
//! let core = init_wallet_core(environment, ledger, minter, storage).await?;
//!
//! let address = core.connect(ProviderKind::FederatedIdentity).await?;
//! let snapshot = core.snapshot().await;
//! println!("{} holds ${:.2}", address, snapshot.portfolio_usd);
//! ```

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod shared;

#[cfg(test)]
pub(crate) mod test_support;

use crate::core::balances::BalanceAggregator;
use crate::core::polling::{DashboardPoller, DashboardSnapshot, PollIntervals};
use crate::core::prices::{PriceCache, PriceCacheSettings};
use crate::core::storage::SessionStore;
use crate::core::tokens::{DepositAddress, DepositService, TokenCatalog};
use crate::core::transactions::{HistoryFilter, HistorySettings, TransactionAggregator, TransferService};
use crate::core::wallet::{BackendLoginTask, HandshakeSettings, ProviderRegistry, WalletSession};
use crate::domain::repositories::{
    CrossChainMinter, LedgerClient, PreferencesService, PriceSource, ProfileService, TransactionBackend,
};
use crate::infrastructure::browser::BrowserEnvironment;
use crate::infrastructure::http::{HttpBackend, OfflineBackend};
use crate::infrastructure::platform::PlatformStorage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

// Re-export the types hosts work with
pub use crate::domain::entities::{
    BalanceEntry, PriceQuote, TokenDescriptor, TransactionPage, TransactionRecord, WalletSessionState,
};
pub use crate::shared::config::WalletCoreConfig;
pub use crate::shared::error::WalletError;
pub use crate::shared::types::{Address, BlockIndex, Network, ProviderKind, SessionStatus, TokenKey, TxDirection};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Install the logger using the configured level. `RUST_LOG` wins when set.
/// Safe to call more than once.
pub fn init() -> Result<(), WalletError> {
    let config = WalletCoreConfig::load()?;
    init_logging(&config.log_level);
    Ok(())
}

pub fn init_logging(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Backend services the core talks to
#[derive(Clone)]
pub struct Backends {
    pub profiles: Arc<dyn ProfileService>,
    pub preferences: Arc<dyn PreferencesService>,
    pub prices: Arc<dyn PriceSource>,
    pub history: Arc<dyn TransactionBackend>,
}

impl Backends {
    /// HTTP gateway when `backend_url` is set, the offline backend otherwise
    pub fn from_config(config: &WalletCoreConfig) -> Result<Self, WalletError> {
        match &config.backend_url {
            Some(url) => {
                let http = Arc::new(HttpBackend::new(url.clone(), config.request_timeout())?);
                Ok(Self::shared(http))
            }
            None => {
                log::info!("No backend_url configured, running offline");
                Ok(Self::shared(Arc::new(OfflineBackend)))
            }
        }
    }

    /// One object serving every backend role
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: ProfileService + PreferencesService + PriceSource + TransactionBackend + 'static,
    {
        Self {
            profiles: backend.clone(),
            preferences: backend.clone(),
            prices: backend.clone(),
            history: backend,
        }
    }
}

/// Load configuration, build the core, restore the previous session and
/// start dashboard polling.
pub async fn init_wallet_core(
    environment: Arc<dyn BrowserEnvironment>,
    ledger: Arc<dyn LedgerClient>,
    minter: Arc<dyn CrossChainMinter>,
    storage: Arc<dyn PlatformStorage>,
) -> Result<WalletCore, WalletError> {
    let config = WalletCoreConfig::load()?;
    let backends = Backends::from_config(&config)?;
    let core = WalletCore::new(config, environment, ledger, minter, storage, backends);
    core.start().await;
    Ok(core)
}

/// Main wallet core struct that provides access to all functionality
pub struct WalletCore {
    config: WalletCoreConfig,
    session: Arc<WalletSession>,
    catalog: Arc<TokenCatalog>,
    balances: BalanceAggregator,
    prices: Arc<PriceCache>,
    transactions: Arc<TransactionAggregator>,
    transfers: TransferService,
    deposits: DepositService,
    poller: Arc<DashboardPoller>,
}

impl WalletCore {
    pub fn new(
        config: WalletCoreConfig,
        environment: Arc<dyn BrowserEnvironment>,
        ledger: Arc<dyn LedgerClient>,
        minter: Arc<dyn CrossChainMinter>,
        storage: Arc<dyn PlatformStorage>,
        backends: Backends,
    ) -> Self {
        let timeout = config.request_timeout();
        let session = Arc::new(WalletSession::new(
            ProviderRegistry::new(environment),
            SessionStore::new(storage, &config.storage_namespace),
            BackendLoginTask::new(backends.profiles, timeout),
            HandshakeSettings::from(&config),
        ));
        let catalog = Arc::new(TokenCatalog::new(ledger.clone(), backends.preferences, timeout));
        let balances = BalanceAggregator::new(ledger.clone(), timeout);
        let prices = Arc::new(PriceCache::new(backends.prices, PriceCacheSettings::from(&config)));
        let transactions = Arc::new(TransactionAggregator::new(
            backends.history,
            ledger.clone(),
            HistorySettings::from(&config),
        ));
        let poller = Arc::new(DashboardPoller::new(
            session.subscribe(),
            catalog.clone(),
            balances.clone(),
            prices.clone(),
            transactions.clone(),
            PollIntervals::from(&config),
        ));

        Self {
            transfers: TransferService::new(ledger, timeout),
            deposits: DepositService::new(minter, timeout),
            config,
            session,
            catalog,
            balances,
            prices,
            transactions,
            poller,
        }
    }

    /// Restore the previous session and begin polling
    pub async fn start(&self) {
        let restored = self.session.restore().await;
        log::info!("{} v{} started ({:?})", NAME, VERSION, restored.status);
        self.poller.start();
    }

    /// Stop background polling
    pub fn shutdown(&self) {
        self.poller.stop();
    }

    pub fn config(&self) -> &WalletCoreConfig {
        &self.config
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn state(&self) -> WalletSessionState {
        self.session.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSessionState> {
        self.session.subscribe()
    }

    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.session.registry().available()
    }

    pub async fn connect(&self, kind: ProviderKind) -> Result<Address, WalletError> {
        self.session.connect(kind).await
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    pub async fn on_accounts_changed(&self, accounts: &[String]) {
        self.session.on_accounts_changed(accounts).await;
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.poller.snapshot().await
    }

    /// Poll balances, prices and transactions right away
    pub fn refresh(&self) {
        self.poller.refresh();
    }

    pub async fn tokens(&self) -> Vec<TokenDescriptor> {
        self.catalog.visible().await
    }

    pub async fn add_token(&self, ledger_id: &str) -> Result<TokenDescriptor, WalletError> {
        let address = self.require_address()?;
        let token = self.catalog.add_token(&address, ledger_id).await?;
        self.refresh();
        Ok(token)
    }

    pub async fn remove_token(&self, ledger_id: &str) -> Result<(), WalletError> {
        let address = self.require_address()?;
        self.catalog.remove_token(&address, ledger_id).await?;
        self.refresh();
        Ok(())
    }

    pub async fn set_token_hidden(&self, token_id: &str, hidden: bool) -> Result<(), WalletError> {
        let address = self.require_address()?;
        self.catalog.set_hidden(&address, token_id, hidden).await?;
        self.refresh();
        Ok(())
    }

    /// Balances of every visible token for the active address
    pub async fn balances(&self) -> Result<Vec<BalanceEntry>, WalletError> {
        let address = self.require_address()?;
        let tokens = self.catalog.visible().await;
        Ok(self.balances.fetch_all(&address, &tokens).await)
    }

    pub async fn prices(&self, keys: &[TokenKey]) -> HashMap<TokenKey, PriceQuote> {
        self.prices.get_prices(keys).await
    }

    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<TransactionRecord>, WalletError> {
        let address = self.require_address()?;
        let tokens = self.catalog.visible().await;
        Ok(self.transactions.recent(&address, &tokens, limit).await)
    }

    pub async fn history(&self, filter: &HistoryFilter, page: usize) -> Result<TransactionPage, WalletError> {
        let address = self.require_address()?;
        let tokens = self.catalog.tokens().await;
        Ok(self.transactions.history(&address, &tokens, filter, page).await)
    }

    /// Send `amount` of the token identified by `token_id` and refresh the
    /// dashboard.
    pub async fn send(&self, token_id: &str, to: &str, amount: &str) -> Result<BlockIndex, WalletError> {
        let address = self.require_address()?;
        let token = self.require_token(token_id).await?;
        let block = self.transfers.send(&token, &address, to, amount).await?;
        self.refresh();
        Ok(block)
    }

    pub async fn deposit_address(&self, token_id: &str) -> Result<DepositAddress, WalletError> {
        let address = self.require_address()?;
        let token = self.require_token(token_id).await?;
        self.deposits.deposit_address(&token, &address).await
    }

    fn require_address(&self) -> Result<Address, WalletError> {
        self.session
            .address()
            .ok_or_else(|| WalletError::validation("Connect a wallet first"))
    }

    async fn require_token(&self, token_id: &str) -> Result<TokenDescriptor, WalletError> {
        self.catalog
            .find(token_id)
            .await
            .ok_or_else(|| WalletError::not_found(format!("Unknown token {}", token_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockCrossChainMinter;
    use crate::infrastructure::platform::MemoryStorage;
    use crate::shared::constants::{CKETH_TOKEN, ICP_TOKEN};
    use crate::test_support::{FakeEnvironment, FakeEvm, FakeLedger};
    use num_bigint::BigUint;
    use tokio_test::{assert_err, assert_ok};

    const ADDRESS: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

    fn core_with(ledger: Arc<FakeLedger>, minter: MockCrossChainMinter) -> WalletCore {
        let environment = Arc::new(FakeEnvironment::new().with_evm(FakeEvm::with_accounts(&[ADDRESS])));
        WalletCore::new(
            WalletCoreConfig::default(),
            environment,
            ledger,
            Arc::new(minter),
            Arc::new(MemoryStorage::new()),
            Backends::shared(Arc::new(OfflineBackend)),
        )
    }

    #[tokio::test]
    async fn test_operations_require_a_connected_wallet() {
        let core = core_with(Arc::new(FakeLedger::new()), MockCrossChainMinter::new());
        assert_err!(core.balances().await);
        assert!(matches!(core.send("icp", "peer", "1").await, Err(WalletError::Validation(_))));
    }

    #[tokio::test]
    async fn test_connect_send_and_receive() {
        let ledger = Arc::new(FakeLedger::new());
        ledger.set_balance(ICP_TOKEN.ledger_id, 500_000_000);
        let mut minter = MockCrossChainMinter::new();
        minter
            .expect_deposit_address()
            .times(1)
            .returning(|_, _, _| Ok("0xdeposit".to_string()));
        let core = core_with(ledger.clone(), minter);

        assert_eq!(
            core.available_providers(),
            vec![ProviderKind::InjectedEvm, ProviderKind::FederatedIdentity]
        );
        let address = assert_ok!(core.connect(ProviderKind::InjectedEvm).await);
        assert_eq!(address, ADDRESS);

        let balances = assert_ok!(core.balances().await);
        assert_eq!(balances[0].formatted_balance, "5.00");

        let block = assert_ok!(core.send("icp", "peer-principal", "2").await);
        assert_eq!(block, 1);
        assert_eq!(ledger.transfers()[0].2, BigUint::from(200_000_000u64));

        let own = assert_ok!(core.deposit_address("icp").await);
        assert_eq!(own.address, ADDRESS);
        let wrapped = assert_ok!(core.deposit_address(CKETH_TOKEN.id).await);
        assert_eq!(wrapped.address, "0xdeposit");

        core.disconnect().await;
        assert_eq!(core.state(), WalletSessionState::default());
    }

    #[tokio::test]
    async fn test_offline_prices_fall_back() {
        let core = core_with(Arc::new(FakeLedger::new()), MockCrossChainMinter::new());
        let prices = core.prices(&["icp".to_string(), "ckusdt".to_string()]).await;
        assert_eq!(prices["icp"].usd_price, 0.0);
        assert_eq!(prices["ckusdt"].usd_price, 1.0);
    }
}
