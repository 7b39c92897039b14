use super::error::MessengerError;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Notifications pushed by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
}

pub type WalletListener = Arc<dyn Fn(WalletEvent) + Send + Sync>;

/// Keeps a listener registered until it is released, explicitly or on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the wallet to expose its accounts. The first entry is the active one.
    async fn request_accounts(&self) -> Result<Vec<String>, MessengerError>;

    fn selected_address(&self) -> Option<String>;

    fn subscribe(&self, listener: WalletListener) -> Subscription;
}

pub fn format_address(address: &alloy::primitives::Address) -> String {
    format!("{:#x}", address)
}

async fn connect_provider(rpc_url: &str) -> Result<DynProvider, MessengerError> {
    let provider = ProviderBuilder::new()
        .connect(rpc_url)
        .await
        .map_err(|err| MessengerError::from_transport(&err, MessengerError::ConnectionFailed))?;
    Ok(provider.erased())
}

/// Wallet backed by the unlocked accounts of a JSON-RPC node.
pub struct RpcWallet {
    provider: DynProvider,
    selected: Arc<RwLock<Option<String>>>,
    poll_interval: Duration,
    handle: Handle,
}

impl RpcWallet {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Must be called from within the runtime that will drive the notification watcher.
    pub async fn connect(rpc_url: &str) -> Result<Self, MessengerError> {
        let provider = connect_provider(rpc_url).await?;
        info!(rpc_url, "wallet provider ready");
        Ok(Self::from_provider(provider))
    }

    fn from_provider(provider: DynProvider) -> Self {
        Self {
            provider,
            selected: Arc::new(RwLock::new(None)),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            handle: Handle::current(),
        }
    }

    /// Selects `account` again if the node still exposes it. Returns whether it did.
    pub async fn restore(&self, account: &str) -> Result<bool, MessengerError> {
        let accounts = Self::accounts(&self.provider).await?;
        let Some(found) = accounts
            .into_iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(account))
        else {
            return Ok(false);
        };
        if let Ok(mut selected) = self.selected.write() {
            *selected = Some(found);
        }
        Ok(true)
    }

    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }

    async fn accounts(provider: &DynProvider) -> Result<Vec<String>, MessengerError> {
        let accounts = provider
            .get_accounts()
            .await
            .map_err(|err| MessengerError::from_transport(&err, MessengerError::ConnectionFailed))?;
        Ok(accounts.iter().map(format_address).collect())
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, MessengerError> {
        let accounts = Self::accounts(&self.provider).await?;
        if let Ok(mut selected) = self.selected.write() {
            *selected = accounts.first().cloned();
        }
        debug!(count = accounts.len(), "accounts requested");
        Ok(accounts)
    }

    fn selected_address(&self) -> Option<String> {
        self.selected.read().ok().and_then(|selected| selected.clone())
    }

    fn subscribe(&self, listener: WalletListener) -> Subscription {
        let token = CancellationToken::new();
        self.handle.spawn(watch(
            self.provider.clone(),
            self.selected.clone(),
            listener,
            token.clone(),
            self.poll_interval,
        ));
        Subscription::new(move || token.cancel())
    }
}

/// Last observed chain id and account list.
#[derive(Debug, Default)]
struct Snapshot {
    chain: Option<u64>,
    accounts: Option<Vec<String>>,
}

impl Snapshot {
    /// Records one poll and returns the notification it warrants. A failed poll (`None`)
    /// keeps the previous value. A chain change absorbs any account change seen with it,
    /// since the messenger has to be reconnected anyway.
    fn record(&mut self, chain: Option<u64>, accounts: Option<Vec<String>>) -> Option<WalletEvent> {
        let chain_changed = matches!((self.chain, chain), (Some(known), Some(now)) if known != now);
        let accounts_changed = matches!(
            (&self.accounts, &accounts),
            (Some(known), Some(now)) if known != now
        );
        if chain.is_some() {
            self.chain = chain;
        }
        if accounts.is_some() {
            self.accounts = accounts.clone();
        }

        match (chain, accounts) {
            (Some(chain_id), _) if chain_changed => Some(WalletEvent::ChainChanged(chain_id)),
            (_, Some(accounts)) if accounts_changed => Some(WalletEvent::AccountsChanged(accounts)),
            _ => None,
        }
    }
}

async fn poll(provider: &DynProvider) -> (Option<u64>, Option<Vec<String>>) {
    let chain = match provider.get_chain_id().await {
        Ok(chain_id) => Some(chain_id),
        Err(err) => {
            warn!(%err, "failed to poll chain id");
            None
        }
    };
    let accounts = match RpcWallet::accounts(provider).await {
        Ok(accounts) => Some(accounts),
        Err(err) => {
            warn!(%err, "failed to poll accounts");
            None
        }
    };
    (chain, accounts)
}

/// Polls the node and reports account and chain differences until cancelled.
async fn watch(
    provider: DynProvider,
    selected: Arc<RwLock<Option<String>>>,
    listener: WalletListener,
    token: CancellationToken,
    period: Duration,
) {
    let mut snapshot = Snapshot::default();
    let (chain, accounts) = poll(&provider).await;
    snapshot.record(chain, accounts);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let (chain, accounts) = poll(&provider).await;
        let Some(event) = snapshot.record(chain, accounts) else {
            continue;
        };
        match &event {
            WalletEvent::ChainChanged(chain_id) => {
                info!(chain_id, "chain changed");
                if let Ok(mut current) = selected.write() {
                    *current = None;
                }
            }
            WalletEvent::AccountsChanged(accounts) => {
                info!(count = accounts.len(), "accounts changed");
                if let Ok(mut current) = selected.write() {
                    *current = accounts.first().cloned();
                }
            }
        }
        listener(event);
    }
    debug!("wallet watcher stopped");
}
