use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rxl_store::{ChainStore, JsonFileStore, LogFileStore, SyncMode};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// Where and how the chain is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub format: StoreFormat,
    pub sync_mode: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("blockchain.json"),
            format: StoreFormat::Json,
            sync_mode: SyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Build the configured backend.
    pub fn open(&self) -> Box<dyn ChainStore> {
        match self.format {
            StoreFormat::Json => {
                Box::new(JsonFileStore::new(&self.path).with_sync_mode(self.sync_mode))
            }
            StoreFormat::Log => {
                Box::new(LogFileStore::new(&self.path).with_sync_mode(self.sync_mode))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFormat {
    /// Single JSON document, rewritten on every append.
    #[default]
    Json,
    /// Framed append-only log.
    Log,
}
