use color_eyre::{Result, eyre::WrapErr};
use fjall::PartitionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    RpcUrl,
    ContractAddress,
    /// Account the messenger was last connected with.
    LastAccount,
}

impl ConfigKey {
    fn storage_key(self) -> &'static str {
        match self {
            ConfigKey::RpcUrl => "v1::config::rpc_url",
            ConfigKey::ContractAddress => "v1::config::contract_address",
            ConfigKey::LastAccount => "v1::config::last_account",
        }
    }

    pub fn env_var(self) -> Option<&'static str> {
        match self {
            ConfigKey::RpcUrl => Some("MESSENGER_RPC_URL"),
            ConfigKey::ContractAddress => Some("MESSENGER_CONTRACT"),
            ConfigKey::LastAccount => None,
        }
    }
}

#[derive(Clone)]
pub struct ConfigRepository {
    handle: PartitionHandle,
}

impl ConfigRepository {
    pub(crate) fn new(handle: PartitionHandle) -> Self {
        Self { handle }
    }

    pub fn get(&self, key: ConfigKey) -> Result<Option<String>> {
        Ok(self
            .handle
            .get(key.storage_key().as_bytes())
            .wrap_err("failed to read config value")?
            .map(|bytes| {
                String::from_utf8(bytes.to_vec()).wrap_err("config value is not valid UTF-8")
            })
            .transpose()?)
    }

    /// Stored value, falling back to the key's environment variable.
    pub fn resolve(&self, key: ConfigKey) -> Result<Option<String>> {
        let stored = self.get(key)?.filter(|value| !value.trim().is_empty());
        Ok(stored.or_else(|| {
            key.env_var()
                .and_then(|name| std::env::var(name).ok())
                .filter(|value| !value.trim().is_empty())
        }))
    }

    pub fn set(&self, key: ConfigKey, value: &str) -> Result<()> {
        self.handle
            .insert(key.storage_key().as_bytes(), value.as_bytes())
            .wrap_err("failed to write config value")
    }
}
