//! In-memory fakes for unit tests

use crate::domain::entities::{LedgerTransaction, MetadataValue, TokenDescriptor, UserProfile};
use crate::domain::repositories::{LedgerClient, PreferencesService, ProfileService};
use crate::infrastructure::browser::{
    BrowserEnvironment, EvmProvider, IdentityProvider, LoginCallback, LoginOptions, ProviderError, SolanaProvider,
    TronProvider,
};
use crate::shared::constants::{METADATA_DECIMALS, METADATA_FEE, METADATA_NAME, METADATA_SYMBOL};
use crate::shared::error::WalletError;
use crate::shared::types::{BlockIndex, TokenKey};
use async_trait::async_trait;
use num_bigint::BigUint;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub struct FakeEvm {
    response: Result<Vec<String>, ProviderError>,
    gate: Option<Arc<Notify>>,
    pub requests: AtomicUsize,
}

impl FakeEvm {
    pub fn with_accounts(accounts: &[&str]) -> Self {
        Self {
            response: Ok(accounts.iter().map(|a| a.to_string()).collect()),
            gate: None,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(error),
            gate: None,
            requests: AtomicUsize::new(0),
        }
    }

    /// Answers only after `gate()` is notified
    pub fn gated(accounts: &[&str]) -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::with_accounts(accounts)
        }
    }

    pub fn gate(&self) -> Arc<Notify> {
        self.gate.clone().unwrap_or_else(|| Arc::new(Notify::new()))
    }
}

#[async_trait]
impl EvmProvider for FakeEvm {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.response.clone()
    }
}

pub struct FakeSolana {
    key: String,
    only_if_trusted: Mutex<Option<bool>>,
    pub disconnects: AtomicUsize,
}

impl FakeSolana {
    pub fn with_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            only_if_trusted: Mutex::new(None),
            disconnects: AtomicUsize::new(0),
        }
    }

    pub fn last_only_if_trusted(&self) -> Option<bool> {
        *self.only_if_trusted.lock().expect("lock")
    }
}

#[async_trait]
impl SolanaProvider for FakeSolana {
    async fn connect(&self, only_if_trusted: bool) -> Result<String, ProviderError> {
        *self.only_if_trusted.lock().expect("lock") = Some(only_if_trusted);
        Ok(self.key.clone())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeTron {
    ready_after: Option<usize>,
    address: String,
    pub polls: AtomicUsize,
}

impl FakeTron {
    /// `default_address` is empty for the first `polls` reads
    pub fn ready_after(polls: usize, address: &str) -> Self {
        Self {
            ready_after: Some(polls),
            address: address.to_string(),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn never_ready() -> Self {
        Self {
            ready_after: None,
            address: String::new(),
            polls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TronProvider for FakeTron {
    async fn request_accounts(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn default_address(&self) -> Option<String> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        match self.ready_after {
            Some(after) if seen >= after => Some(self.address.clone()),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    authenticated: AtomicBool,
    principal: Mutex<Option<String>>,
    outcomes: Mutex<VecDeque<Result<String, String>>>,
    ttl: Mutex<Option<Duration>>,
    logout_fails: AtomicBool,
    hold_logins: AtomicBool,
    held: Mutex<Vec<LoginCallback>>,
    pub logouts: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_login(&self, outcome: Result<String, String>) {
        self.outcomes.lock().expect("lock").push_back(outcome);
    }

    pub fn set_authenticated(&self, principal: &str) {
        self.authenticated.store(true, Ordering::SeqCst);
        *self.principal.lock().expect("lock") = Some(principal.to_string());
    }

    /// Keep login callbacks without ever invoking them
    pub fn hold_logins(&self) {
        self.hold_logins.store(true, Ordering::SeqCst);
    }

    pub fn fail_logout(&self) {
        self.logout_fails.store(true, Ordering::SeqCst);
    }

    pub fn last_ttl(&self) -> Option<Duration> {
        *self.ttl.lock().expect("lock")
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn principal(&self) -> Option<String> {
        self.principal.lock().expect("lock").clone()
    }

    fn login(&self, options: LoginOptions, on_complete: LoginCallback) {
        *self.ttl.lock().expect("lock") = Some(options.max_time_to_live);
        if self.hold_logins.load(Ordering::SeqCst) {
            self.held.lock().expect("lock").push(on_complete);
            return;
        }
        let outcome = self.outcomes.lock().expect("lock").pop_front();
        match outcome {
            Some(Ok(principal)) => {
                self.set_authenticated(&principal);
                on_complete(Ok(principal));
            }
            Some(Err(reason)) => on_complete(Err(reason)),
            None => drop(on_complete),
        }
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        self.authenticated.store(false, Ordering::SeqCst);
        *self.principal.lock().expect("lock") = None;
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::new(-1, "logout failed"));
        }
        Ok(())
    }
}

pub struct FakeEnvironment {
    evm: Mutex<Option<Arc<dyn EvmProvider>>>,
    solana: Mutex<Option<Arc<dyn SolanaProvider>>>,
    tron: Mutex<Option<Arc<dyn TronProvider>>>,
    identity: Arc<FakeIdentity>,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self::with_identity(FakeIdentity::new())
    }

    pub fn with_identity(identity: FakeIdentity) -> Self {
        Self {
            evm: Mutex::new(None),
            solana: Mutex::new(None),
            tron: Mutex::new(None),
            identity: Arc::new(identity),
        }
    }

    pub fn with_evm(self, evm: FakeEvm) -> Self {
        self.install_evm(evm);
        self
    }

    pub fn with_solana_shared(self, solana: Arc<FakeSolana>) -> Self {
        *self.solana.lock().expect("lock") = Some(solana);
        self
    }

    pub fn with_tron(self, tron: FakeTron) -> Self {
        *self.tron.lock().expect("lock") = Some(Arc::new(tron));
        self
    }

    /// Simulates an extension injecting itself after page load
    pub fn install_evm(&self, evm: FakeEvm) {
        *self.evm.lock().expect("lock") = Some(Arc::new(evm));
    }
}

impl BrowserEnvironment for FakeEnvironment {
    fn evm(&self) -> Option<Arc<dyn EvmProvider>> {
        self.evm.lock().expect("lock").clone()
    }

    fn solana(&self) -> Option<Arc<dyn SolanaProvider>> {
        self.solana.lock().expect("lock").clone()
    }

    fn tron(&self) -> Option<Arc<dyn TronProvider>> {
        self.tron.lock().expect("lock").clone()
    }

    fn identity(&self) -> Arc<dyn IdentityProvider> {
        self.identity.clone()
    }
}

pub struct FakeProfiles {
    result: Result<UserProfile, WalletError>,
}

impl FakeProfiles {
    pub fn offline() -> Self {
        Self {
            result: Ok(UserProfile {
                plan: None,
                status: "offline".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProfileService for FakeProfiles {
    async fn login(&self, _address: &str) -> Result<UserProfile, WalletError> {
        self.result.clone()
    }
}

#[derive(Default)]
pub struct FakeLedger {
    balances: Mutex<HashMap<String, Result<BigUint, WalletError>>>,
    metadata: Mutex<HashMap<String, Vec<(String, MetadataValue)>>>,
    transactions: Mutex<HashMap<String, Vec<LedgerTransaction>>>,
    transfers: Mutex<Vec<(String, String, BigUint)>>,
    balance_gate: Mutex<Option<Arc<Notify>>>,
    pub balance_entered: Notify,
    pub balance_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, ledger_id: &str, amount: u64) {
        self.balances
            .lock()
            .expect("lock")
            .insert(ledger_id.to_string(), Ok(BigUint::from(amount)));
    }

    pub fn fail_balance(&self, ledger_id: &str) {
        self.balances
            .lock()
            .expect("lock")
            .insert(ledger_id.to_string(), Err(WalletError::ledger("canister trapped")));
    }

    pub fn set_metadata(&self, ledger_id: &str, name: &str, symbol: &str, decimals: u8, fee: u64) {
        let entries = vec![
            (METADATA_NAME.to_string(), MetadataValue::Text(name.to_string())),
            (METADATA_SYMBOL.to_string(), MetadataValue::Text(symbol.to_string())),
            (METADATA_DECIMALS.to_string(), MetadataValue::Nat(BigUint::from(decimals))),
            (METADATA_FEE.to_string(), MetadataValue::Nat(BigUint::from(fee))),
        ];
        self.metadata.lock().expect("lock").insert(ledger_id.to_string(), entries);
    }

    pub fn set_raw_metadata(&self, ledger_id: &str, entries: Vec<(String, MetadataValue)>) {
        self.metadata.lock().expect("lock").insert(ledger_id.to_string(), entries);
    }

    pub fn push_transaction(&self, ledger_id: &str, tx: LedgerTransaction) {
        self.transactions
            .lock()
            .expect("lock")
            .entry(ledger_id.to_string())
            .or_default()
            .push(tx);
    }

    /// Hold the next balance query until the returned gate is notified.
    /// `balance_entered` fires once that query is waiting.
    pub fn gate_next_balance(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.balance_gate.lock().expect("lock") = Some(gate.clone());
        gate
    }

    pub fn transfers(&self) -> Vec<(String, String, BigUint)> {
        self.transfers.lock().expect("lock").clone()
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn balance_of(&self, ledger_id: &str, _owner: &str) -> Result<BigUint, WalletError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.balance_gate.lock().expect("lock").take();
        if let Some(gate) = gate {
            self.balance_entered.notify_one();
            gate.notified().await;
        }
        self.balances
            .lock()
            .expect("lock")
            .get(ledger_id)
            .cloned()
            .unwrap_or_else(|| Ok(BigUint::from(0u8)))
    }

    async fn metadata(&self, ledger_id: &str) -> Result<Vec<(String, MetadataValue)>, WalletError> {
        self.metadata
            .lock()
            .expect("lock")
            .get(ledger_id)
            .cloned()
            .ok_or_else(|| WalletError::ledger(format!("No ledger at {}", ledger_id)))
    }

    async fn transfer(&self, ledger_id: &str, to: &str, amount: &BigUint) -> Result<BlockIndex, WalletError> {
        let mut transfers = self.transfers.lock().expect("lock");
        transfers.push((ledger_id.to_string(), to.to_string(), amount.clone()));
        Ok(transfers.len() as BlockIndex)
    }

    async fn transactions(&self, ledger_id: &str, start: u64, length: u64) -> Result<Vec<LedgerTransaction>, WalletError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        let all = self.transactions.lock().expect("lock").get(ledger_id).cloned().unwrap_or_default();
        Ok(all.into_iter().skip(start as usize).take(length as usize).collect())
    }
}

#[derive(Default)]
pub struct FakePreferences {
    tokens: Mutex<HashMap<String, Vec<TokenDescriptor>>>,
    hidden: Mutex<HashMap<String, Vec<TokenKey>>>,
    unavailable: AtomicBool,
}

impl FakePreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        let prefs = Self::default();
        prefs.unavailable.store(true, Ordering::SeqCst);
        prefs
    }

    pub fn stored_tokens(&self, address: &str) -> Vec<TokenDescriptor> {
        self.tokens.lock().expect("lock").get(address).cloned().unwrap_or_default()
    }

    pub fn stored_hidden(&self, address: &str) -> Vec<TokenKey> {
        self.hidden.lock().expect("lock").get(address).cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<(), WalletError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(WalletError::backend("preferences service unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PreferencesService for FakePreferences {
    async fn custom_tokens(&self, address: &str) -> Result<Vec<TokenDescriptor>, WalletError> {
        self.check()?;
        Ok(self.stored_tokens(address))
    }

    async fn add_custom_token(&self, address: &str, token: &TokenDescriptor) -> Result<(), WalletError> {
        self.check()?;
        self.tokens
            .lock()
            .expect("lock")
            .entry(address.to_string())
            .or_default()
            .push(token.clone());
        Ok(())
    }

    async fn remove_custom_token(&self, address: &str, ledger_id: &str) -> Result<(), WalletError> {
        self.check()?;
        if let Some(tokens) = self.tokens.lock().expect("lock").get_mut(address) {
            tokens.retain(|t| t.ledger_id != ledger_id);
        }
        Ok(())
    }

    async fn hidden_tokens(&self, address: &str) -> Result<Vec<TokenKey>, WalletError> {
        self.check()?;
        Ok(self.stored_hidden(address))
    }

    async fn save_hidden_tokens(&self, address: &str, token_ids: &[TokenKey]) -> Result<(), WalletError> {
        self.check()?;
        self.hidden
            .lock()
            .expect("lock")
            .insert(address.to_string(), token_ids.to_vec());
        Ok(())
    }
}
