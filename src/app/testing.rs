//! In-memory wallet and contract doubles for exercising the messenger without a node.

use super::{
    contract::{ContractGateway, PendingWrite},
    error::MessengerError,
    wallet::{Subscription, WalletEvent, WalletListener, WalletProvider},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

pub struct MockWallet {
    response: Mutex<Result<Vec<String>, MessengerError>>,
    selected: Mutex<Option<String>>,
    listeners: Arc<Mutex<HashMap<u64, WalletListener>>>,
    next_id: AtomicU64,
    pub requests: AtomicUsize,
}

impl MockWallet {
    pub fn with_accounts(accounts: &[&str]) -> Arc<Self> {
        let accounts = accounts.iter().map(|a| a.to_string()).collect();
        Arc::new(Self::responding(Ok(accounts)))
    }

    pub fn failing(error: MessengerError) -> Arc<Self> {
        Arc::new(Self::responding(Err(error)))
    }

    pub fn preselected(address: &str) -> Arc<Self> {
        let wallet = Self::responding(Ok(vec![address.to_string()]));
        *wallet.selected.lock().unwrap() = Some(address.to_string());
        Arc::new(wallet)
    }

    fn responding(response: Result<Vec<String>, MessengerError>) -> Self {
        Self {
            response: Mutex::new(response),
            selected: Mutex::new(None),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn emit(&self, event: WalletEvent) {
        let listeners: Vec<WalletListener> =
            self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, MessengerError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let response = self.response.lock().unwrap().clone();
        if let Ok(accounts) = &response {
            *self.selected.lock().unwrap() = accounts.first().cloned();
        }
        response
    }

    fn selected_address(&self) -> Option<String> {
        self.selected.lock().unwrap().clone()
    }

    fn subscribe(&self, listener: WalletListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().insert(id, listener);
        let listeners = self.listeners.clone();
        Subscription::new(move || {
            listeners.lock().unwrap().remove(&id);
        })
    }
}

pub struct MockGateway {
    value: Arc<Mutex<String>>,
    read_failure: Mutex<Option<MessengerError>>,
    write_failure: Mutex<Option<MessengerError>>,
    confirm_failure: Mutex<Option<MessengerError>>,
    hold: Option<Arc<Notify>>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl MockGateway {
    pub fn holding(initial: &str) -> Arc<Self> {
        Arc::new(Self::build(initial))
    }

    /// Confirmations wait until the returned `Notify` is signalled.
    pub fn with_held_confirmations(initial: &str) -> (Arc<Self>, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        let mut gateway = Self::build(initial);
        gateway.hold = Some(notify.clone());
        (Arc::new(gateway), notify)
    }

    fn build(initial: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial.to_string())),
            read_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
            confirm_failure: Mutex::new(None),
            hold: None,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_reads(&self, error: MessengerError) {
        *self.read_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_writes(&self, error: MessengerError) {
        *self.write_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_confirmations(&self, error: MessengerError) {
        *self.confirm_failure.lock().unwrap() = Some(error);
    }

    pub fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractGateway for MockGateway {
    async fn read(&self, _from: &str) -> Result<String, MessengerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.read_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.value())
    }

    async fn write(
        &self,
        _from: &str,
        message: &str,
    ) -> Result<Box<dyn PendingWrite>, MessengerError> {
        let nonce = self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.write_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(Box::new(MockPendingWrite {
            tx_hash: format!("0x{:064x}", nonce + 1),
            message: message.to_string(),
            value: self.value.clone(),
            failure: self.confirm_failure.lock().unwrap().clone(),
            hold: self.hold.clone(),
        }))
    }
}

struct MockPendingWrite {
    tx_hash: String,
    message: String,
    value: Arc<Mutex<String>>,
    failure: Option<MessengerError>,
    hold: Option<Arc<Notify>>,
}

#[async_trait]
impl PendingWrite for MockPendingWrite {
    fn tx_hash(&self) -> String {
        self.tx_hash.clone()
    }

    async fn confirm(self: Box<Self>) -> Result<(), MessengerError> {
        let MockPendingWrite {
            message,
            value,
            failure,
            hold,
            ..
        } = *self;
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        *value.lock().unwrap() = message;
        Ok(())
    }
}
