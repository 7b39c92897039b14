use super::error::MessengerError;
use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{DynProvider, PendingTransactionBuilder},
    rpc::types::TransactionReceipt,
    sol,
};
use async_trait::async_trait;
use std::str::FromStr;
use tracing::{debug, info};

sol! {
    #[sol(rpc)]
    interface MessageBoard {
        function getMessage() external view returns (string memory);
        function setMessage(string calldata message) external;
    }
}

/// A submitted write that has not been mined yet.
#[async_trait]
pub trait PendingWrite: Send {
    fn tx_hash(&self) -> String;

    /// Suspends until the transaction is mined.
    async fn confirm(self: Box<Self>) -> Result<(), MessengerError>;
}

/// The single string value held by the configured contract.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    async fn read(&self, from: &str) -> Result<String, MessengerError>;

    async fn write(&self, from: &str, message: &str)
    -> Result<Box<dyn PendingWrite>, MessengerError>;
}

pub fn parse_address(value: &str) -> Result<Address, String> {
    Address::from_str(value.trim()).map_err(|err| format!("invalid address {value:?}: {err}"))
}

pub struct RpcGateway {
    contract: MessageBoard::MessageBoardInstance<DynProvider>,
}

impl RpcGateway {
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self {
            contract: MessageBoard::new(address, provider),
        }
    }

    pub fn address(&self) -> Address {
        *self.contract.address()
    }
}

#[async_trait]
impl ContractGateway for RpcGateway {
    async fn read(&self, from: &str) -> Result<String, MessengerError> {
        let from = parse_address(from).map_err(MessengerError::ReadFailed)?;
        let message = self
            .contract
            .getMessage()
            .from(from)
            .call()
            .await
            .map_err(|err| MessengerError::from_contract(err, MessengerError::ReadFailed))?;
        debug!(contract = %self.address(), len = message.len(), "message read");
        Ok(message)
    }

    async fn write(
        &self,
        from: &str,
        message: &str,
    ) -> Result<Box<dyn PendingWrite>, MessengerError> {
        let from = parse_address(from).map_err(MessengerError::WriteFailed)?;
        let pending = self
            .contract
            .setMessage(message.to_string())
            .from(from)
            .send()
            .await
            .map_err(|err| MessengerError::from_contract(err, MessengerError::WriteFailed))?;
        info!(tx = %pending.tx_hash(), "message update submitted");
        Ok(Box::new(RpcPendingWrite { inner: pending }))
    }
}

struct RpcPendingWrite {
    inner: PendingTransactionBuilder<Ethereum>,
}

#[async_trait]
impl PendingWrite for RpcPendingWrite {
    fn tx_hash(&self) -> String {
        format!("{:#x}", self.inner.tx_hash())
    }

    async fn confirm(self: Box<Self>) -> Result<(), MessengerError> {
        let receipt = self.inner.get_receipt().await.map_err(|err| match err {
            alloy::providers::PendingTransactionError::TransportError(inner) => {
                MessengerError::from_transport(&inner, MessengerError::WriteFailed)
            }
            other => MessengerError::WriteFailed(other.to_string()),
        })?;
        ensure_mined(&receipt)?;
        info!(tx = %receipt.transaction_hash, "message update confirmed");
        Ok(())
    }
}

/// A mined but reverted transaction did not update the message.
fn ensure_mined(receipt: &TransactionReceipt) -> Result<(), MessengerError> {
    if receipt.status() {
        Ok(())
    } else {
        Err(MessengerError::WriteFailed(format!(
            "transaction {:#x} reverted",
            receipt.transaction_hash
        )))
    }
}
