//! Dashboard polling
//!
//! This module keeps a dashboard snapshot (balances, prices, recent
//! transactions and portfolio value) current for the active address.
//!
//! One interval task per data set runs while an address is active. Every
//! address change aborts the running tasks, resets the snapshot and starts
//! new ones. Results are only written when the address they were fetched
//! for is still the active one.

use crate::core::balances::{portfolio_value, BalanceAggregator};
use crate::core::prices::PriceCache;
use crate::core::tokens::TokenCatalog;
use crate::core::transactions::TransactionAggregator;
use crate::domain::entities::{BalanceEntry, PriceQuote, TransactionRecord, WalletSessionState};
use crate::shared::config::WalletCoreConfig;
use crate::shared::constants::RECENT_TRANSACTION_LIMIT;
use crate::shared::types::{Address, TokenKey};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub address: Option<Address>,
    pub balances: Vec<BalanceEntry>,
    pub prices: HashMap<TokenKey, PriceQuote>,
    pub recent_transactions: Vec<TransactionRecord>,
    pub portfolio_usd: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollIntervals {
    pub balances: Duration,
    pub prices: Duration,
    pub transactions: Duration,
}

impl From<&WalletCoreConfig> for PollIntervals {
    fn from(config: &WalletCoreConfig) -> Self {
        Self {
            balances: Duration::from_secs(config.balance_poll_secs),
            prices: Duration::from_secs(config.price_poll_secs),
            transactions: Duration::from_secs(config.transaction_poll_secs),
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self::from(&WalletCoreConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Balances,
    Prices,
    Transactions,
}

pub struct DashboardPoller {
    session: watch::Receiver<WalletSessionState>,
    catalog: Arc<TokenCatalog>,
    balances: BalanceAggregator,
    prices: Arc<PriceCache>,
    transactions: Arc<TransactionAggregator>,
    intervals: PollIntervals,
    snapshot: Arc<RwLock<DashboardSnapshot>>,
    /// One trigger per job so a refresh requested mid-cycle is kept as a permit
    refresh: [Notify; 3],
    supervisor: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DashboardPoller {
    pub fn new(
        session: watch::Receiver<WalletSessionState>,
        catalog: Arc<TokenCatalog>,
        balances: BalanceAggregator,
        prices: Arc<PriceCache>,
        transactions: Arc<TransactionAggregator>,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            session,
            catalog,
            balances,
            prices,
            transactions,
            intervals,
            snapshot: Arc::new(RwLock::new(DashboardSnapshot::default())),
            refresh: [Notify::new(), Notify::new(), Notify::new()],
            supervisor: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Address of the connected session, if any
    pub fn active_address(&self) -> Option<Address> {
        let state = self.session.borrow();
        if state.is_connected() {
            state.address.clone()
        } else {
            None
        }
    }

    /// Run every polling task again as soon as it is idle
    pub fn refresh(&self) {
        for trigger in &self.refresh {
            trigger.notify_one();
        }
    }

    /// Follow the session: restart polling on every address change.
    pub fn start(self: &Arc<Self>) {
        let poller = Arc::clone(self);
        let mut session = self.session.clone();
        let handle = tokio::spawn(async move {
            let mut current: Option<Address> = None;
            let mut first = true;
            loop {
                let next = {
                    let state = session.borrow_and_update();
                    if state.is_connected() {
                        state.address.clone()
                    } else {
                        None
                    }
                };

                if first || next != current {
                    first = false;
                    current = next;
                    poller.switch_to(current.clone()).await;
                }

                if session.changed().await.is_err() {
                    log::debug!("Session closed, stopping dashboard polling");
                    break;
                }
            }
            poller.abort_tasks();
        });

        if let Some(previous) = self.lock_supervisor().replace(handle) {
            previous.abort();
        }
    }

    /// Stop every polling task
    pub fn stop(&self) {
        if let Some(handle) = self.lock_supervisor().take() {
            handle.abort();
        }
        self.abort_tasks();
    }

    /// Run all three fetches once for `address`. Returns whether the
    /// results were applied.
    pub async fn poll_once(&self, address: &str) -> bool {
        let (balances, prices, transactions) = tokio::join!(
            self.run(Job::Balances, address),
            self.run(Job::Prices, address),
            self.run(Job::Transactions, address),
        );
        balances && prices && transactions
    }

    async fn switch_to(self: &Arc<Self>, address: Option<Address>) {
        self.abort_tasks();
        {
            let mut snapshot = self.snapshot.write().await;
            *snapshot = DashboardSnapshot {
                address: address.clone(),
                ..DashboardSnapshot::default()
            };
        }

        match address {
            Some(address) => {
                log::info!("Dashboard polling started for {}", address);
                self.catalog.load(&address).await;
                let tasks = vec![
                    self.spawn_job(Job::Balances, address.clone(), self.intervals.balances),
                    self.spawn_job(Job::Prices, address.clone(), self.intervals.prices),
                    self.spawn_job(Job::Transactions, address, self.intervals.transactions),
                ];
                self.lock_tasks().extend(tasks);
            }
            None => {
                log::info!("Dashboard polling stopped");
                self.catalog.reset().await;
            }
        }
    }

    fn spawn_job(self: &Arc<Self>, job: Job, address: Address, period: Duration) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = poller.refresh[job as usize].notified() => {}
                }
                poller.run(job, &address).await;
            }
        })
    }

    async fn run(&self, job: Job, address: &str) -> bool {
        match job {
            Job::Balances => {
                let tokens = self.catalog.visible().await;
                let entries = self.balances.fetch_all(address, &tokens).await;
                self.apply(address, |s| s.balances = entries).await
            }
            Job::Prices => {
                let keys: Vec<TokenKey> = self.catalog.visible().await.iter().map(|t| t.price_key()).collect();
                let quotes = self.prices.get_prices(&keys).await;
                self.apply(address, |s| s.prices = quotes).await
            }
            Job::Transactions => {
                let tokens = self.catalog.visible().await;
                let records = self.transactions.recent(address, &tokens, RECENT_TRANSACTION_LIMIT).await;
                self.apply(address, |s| s.recent_transactions = records).await
            }
        }
    }

    async fn apply(&self, address: &str, update: impl FnOnce(&mut DashboardSnapshot)) -> bool {
        if self.active_address().as_deref() != Some(address) {
            log::debug!("Discarding dashboard result for inactive address {}", address);
            return false;
        }
        let mut snapshot = self.snapshot.write().await;
        if snapshot.address.as_deref() != Some(address) {
            log::debug!("Discarding dashboard result for inactive address {}", address);
            return false;
        }
        update(&mut snapshot);
        snapshot.portfolio_usd = portfolio_value(&snapshot.balances, &snapshot.prices);
        snapshot.updated_at = Some(Utc::now());
        true
    }

    fn abort_tasks(&self) {
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_supervisor(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.supervisor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
