use color_eyre::Result;
use fjall::{Config, Keyspace, PartitionCreateOptions};
use std::{
    fs,
    path::{Path, PathBuf},
};

mod repositories;

pub use repositories::{ConfigKey, ConfigRepository};

pub struct Storage {
    root: PathBuf,
    #[allow(dead_code)]
    keyspace: Keyspace,
    config: ConfigRepository,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let keyspace = Config::new(root.join("db")).open()?;
        let config = keyspace.open_partition("config", PartitionCreateOptions::default())?;

        Ok(Self {
            root,
            config: ConfigRepository::new(config),
            keyspace,
        })
    }

    pub fn config(&self) -> &ConfigRepository {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Connection settings the messenger needs before it can talk to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigState {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub last_account: Option<String>,
}

impl ConfigState {
    pub fn load(repository: &ConfigRepository) -> Result<Self> {
        Ok(Self {
            rpc_url: repository.resolve(ConfigKey::RpcUrl)?,
            contract_address: repository.resolve(ConfigKey::ContractAddress)?,
            last_account: repository.resolve(ConfigKey::LastAccount)?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.rpc_url.is_some() && self.contract_address.is_some()
    }

    /// Stores `account` for the next session to restore. Returns whether anything was written.
    pub fn remember_account(&mut self, repository: &ConfigRepository, account: &str) -> Result<bool> {
        if self.last_account.as_deref() == Some(account) {
            return Ok(false);
        }
        repository.set(ConfigKey::LastAccount, account)?;
        self.last_account = Some(account.to_string());
        Ok(true)
    }

    pub fn missing_env_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.rpc_url.is_none() {
            missing.extend(ConfigKey::RpcUrl.env_var());
        }
        if self.contract_address.is_none() {
            missing.extend(ConfigKey::ContractAddress.env_var());
        }
        missing
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let explicit = std::env::var("CHAIN_MESSENGER_DATA_DIR").map(PathBuf::from);
    let path = match explicit {
        Ok(path) => path,
        Err(_) => {
            let mut root = dirs::data_local_dir()
                .unwrap_or(std::env::current_dir()?)
                .join("chain-messenger");
            if cfg!(debug_assertions) {
                root = root.join("dev");
            }
            root
        }
    };
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_reads_saved_config() -> Result<()> {
        let temp = tempdir()?;
        let storage = Storage::open(temp.path())?;
        storage
            .config()
            .set(ConfigKey::RpcUrl, "http://localhost:8545")?;
        storage.config().set(
            ConfigKey::ContractAddress,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        )?;

        let config = ConfigState::load(storage.config())?;
        assert!(config.is_complete());
        assert!(config.missing_env_vars().is_empty());
        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(storage.root(), temp.path());
        Ok(())
    }

    #[test]
    fn remembered_account_survives_reload() -> Result<()> {
        let temp = tempdir()?;
        let storage = Storage::open(temp.path())?;
        let mut config = ConfigState::load(storage.config())?;
        assert_eq!(config.last_account, None);

        assert!(config.remember_account(storage.config(), "0xabc")?);
        assert!(!config.remember_account(storage.config(), "0xabc")?);
        assert_eq!(
            ConfigState::load(storage.config())?.last_account.as_deref(),
            Some("0xabc")
        );
        Ok(())
    }

    #[test]
    fn incomplete_config_names_missing_variables() {
        let config = ConfigState {
            rpc_url: Some("http://localhost:8545".into()),
            contract_address: None,
            last_account: None,
        };
        assert!(!config.is_complete());
        assert_eq!(config.missing_env_vars(), vec!["MESSENGER_CONTRACT"]);
    }
}
