use alloy::transports::TransportError;
use std::fmt;

/// EIP-1193 code a wallet returns when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Failures surfaced by the messenger. They are rendered as the status line and never
/// propagate past the operation that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    ProviderMissing,
    UserRejected,
    ConnectionFailed(String),
    NotConnected,
    ReadFailed(String),
    EmptyInput,
    WriteFailed(String),
}

impl MessengerError {
    /// Maps a transport failure, keeping user rejections distinct from everything else.
    pub fn from_transport(
        err: &TransportError,
        fallback: impl FnOnce(String) -> MessengerError,
    ) -> MessengerError {
        match err.as_error_resp() {
            Some(payload) if payload.code == USER_REJECTED_CODE => MessengerError::UserRejected,
            _ => fallback(err.to_string()),
        }
    }

    pub fn from_contract(
        err: alloy::contract::Error,
        fallback: impl FnOnce(String) -> MessengerError,
    ) -> MessengerError {
        match err {
            alloy::contract::Error::TransportError(inner) => Self::from_transport(&inner, fallback),
            other => fallback(other.to_string()),
        }
    }
}

impl fmt::Display for MessengerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessengerError::ProviderMissing => {
                f.write_str("no wallet provider configured (press s to set one up)")
            }
            MessengerError::UserRejected => f.write_str("request rejected in the wallet"),
            MessengerError::ConnectionFailed(reason) => {
                write!(f, "could not connect wallet: {reason}")
            }
            MessengerError::NotConnected => f.write_str("connect a wallet first"),
            MessengerError::ReadFailed(reason) => write!(f, "failed to read message: {reason}"),
            MessengerError::EmptyInput => f.write_str("enter a message before updating"),
            MessengerError::WriteFailed(reason) => {
                write!(f, "failed to update message: {reason}")
            }
        }
    }
}

impl std::error::Error for MessengerError {}
