use super::{
    CommandBus,
    contract::{ContractGateway, RpcGateway, parse_address},
    error::MessengerError,
    messenger::{Effect, MessengerEvent},
    wallet::{RpcWallet, Subscription, WalletEvent, WalletProvider},
};
use crate::storage::ConfigState;
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Live connection to a wallet and a contract. Dropping it tears everything down.
pub struct Session {
    wallet: Arc<dyn WalletProvider>,
    gateway: Arc<dyn ContractGateway>,
    root: CancellationToken,
    epoch: CancellationToken,
    subscription: Option<Subscription>,
}

impl Session {
    pub fn start(
        wallet: Arc<dyn WalletProvider>,
        gateway: Arc<dyn ContractGateway>,
        bus: &CommandBus,
    ) -> Self {
        let root = CancellationToken::new();
        let sink = bus.sink(root.clone());
        let subscription = wallet.subscribe(Arc::new(move |event: WalletEvent| {
            sink.emit(match event {
                WalletEvent::AccountsChanged(accounts) => MessengerEvent::AccountsChanged(accounts),
                WalletEvent::ChainChanged(chain_id) => MessengerEvent::ChainChanged(chain_id),
            })
        }));
        let epoch = root.child_token();
        Self {
            wallet,
            gateway,
            root,
            epoch,
            subscription: Some(subscription),
        }
    }

    /// Builds the JSON-RPC backed wallet and gateway described by `config`.
    pub async fn connect(config: &ConfigState, bus: &CommandBus) -> Result<Self, MessengerError> {
        let rpc_url = config
            .rpc_url
            .as_deref()
            .ok_or(MessengerError::ProviderMissing)?;
        let address = config
            .contract_address
            .as_deref()
            .ok_or(MessengerError::ProviderMissing)?;
        let address = parse_address(address).map_err(MessengerError::ConnectionFailed)?;

        let wallet = RpcWallet::connect(rpc_url).await?;
        if let Some(account) = config.last_account.as_deref() {
            match wallet.restore(account).await {
                Ok(true) => debug!(account, "previous account still available"),
                Ok(false) => debug!(account, "previous account no longer exposed"),
                Err(err) => warn!(%err, "could not check the previous account"),
            }
        }
        let gateway = RpcGateway::new(wallet.provider(), address);
        info!(contract = %address, "session started");
        Ok(Self::start(Arc::new(wallet), Arc::new(gateway), bus))
    }

    pub fn selected_address(&self) -> Option<String> {
        self.wallet.selected_address()
    }

    pub fn execute(&mut self, effect: Effect, bus: &CommandBus) {
        match effect {
            Effect::RequestAccounts => {
                let wallet = self.wallet.clone();
                bus.spawn_guarded(self.epoch.clone(), move |_| async move {
                    MessengerEvent::AccountsReceived(wallet.request_accounts().await)
                });
            }
            Effect::Read { account } => {
                let gateway = self.gateway.clone();
                bus.spawn_guarded(self.epoch.clone(), move |_| async move {
                    MessengerEvent::MessageRead(gateway.read(&account).await)
                });
            }
            Effect::Write { account, message } => {
                let gateway = self.gateway.clone();
                bus.spawn_guarded(self.epoch.clone(), move |sink| async move {
                    let pending = match gateway.write(&account, &message).await {
                        Ok(pending) => pending,
                        Err(err) => return MessengerEvent::WriteConfirmed(Err(err)),
                    };
                    sink.emit(MessengerEvent::WriteSubmitted(pending.tx_hash()));
                    MessengerEvent::WriteConfirmed(pending.confirm().await)
                });
            }
            Effect::Reset => self.reset(),
        }
    }

    /// Abandons in-flight work; notifications keep flowing.
    pub fn reset(&mut self) {
        self.epoch.cancel();
        self.epoch = self.root.child_token();
        debug!("session epoch reset");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("selected", &self.wallet.selected_address())
            .field("cancelled", &self.root.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.root.cancel();
        debug!("session torn down");
    }
}
