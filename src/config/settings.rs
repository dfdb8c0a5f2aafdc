use std::str::FromStr;

use config::{Config, ConfigError, File, FileFormat};
use log::LevelFilter;
use serde::Deserialize;

use crate::db::models::{NativeTokenMetadata, Protocol};

/// Logger configuration for the binary.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingSettings {
    /// Falls back to `Info` on an unknown level name.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.level).unwrap_or(LevelFilter::Info)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-chain token classification data.
///
/// Addresses may be checksummed; they are lowercased when the registry is built.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub name: String,
    /// Not used by the engine; kept for collaborators that read chain state
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    pub wrapped_native_address: String,
    pub native_token: NativeTokenMetadata,
    #[serde(default)]
    pub stablecoins: Vec<String>,
}

/// Factory (or pool manager) of a protocol on one chain.
#[derive(Debug, Deserialize, Clone)]
pub struct DeploymentSettings {
    pub protocol: Protocol,
    pub chain_id: u64,
    pub factory: String,
}

/// Input files for the replay binary.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySettings {
    /// NDJSON file, one raw log per line, in chain order
    #[serde(default = "default_events_path")]
    pub events_path: String,
    /// JSON array of tokens with their USD prices
    #[serde(default = "default_tokens_path")]
    pub tokens_path: String,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            events_path: default_events_path(),
            tokens_path: default_tokens_path(),
        }
    }
}

fn default_events_path() -> String {
    "events.ndjson".to_string()
}

fn default_tokens_path() -> String {
    "tokens.json".to_string()
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,
    pub chains: Vec<ChainSettings>,
    #[serde(default)]
    pub protocols: Vec<DeploymentSettings>,
    #[serde(default)]
    pub replay: ReplaySettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Parse settings from an inline YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
pub(crate) const TEST_SETTINGS: &str = r#"
chains:
  - chain_id: 1
    name: ethereum
    rpc_urls:
      - https://eth.llamarpc.com
    wrapped_native_address: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
    native_token:
      decimals: 18
      name: Ether
      symbol: ETH
    stablecoins:
      - "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
      - "0xdAC17F958D2ee523a2206206994597C13D831ec7"
protocols:
  - protocol: uniswap_v2
    chain_id: 1
    factory: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f"
  - protocol: uniswap_v3
    chain_id: 1
    factory: "0x1F98431c8aD98523631AE4a59f267346ea31F984"
  - protocol: uniswap_v4
    chain_id: 1
    factory: "0x000000000004444c5dc75cB358380D2e3dE08A90"
"#;
