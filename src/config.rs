use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  pub tron: TronSettings,
  #[serde(default)]
  pub bridge: BridgeSettings,
  #[serde(default)]
  pub solvency: SolvencySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TronSettings {
  #[serde(default = "default_chain_id")]
  pub chain_id: String,
  pub api_host: String,
  pub rpc_host: String,
  /// hex; enables local signing for the vault it controls
  #[serde(default)]
  pub local_private_key: Option<String>,
  #[serde(default)]
  pub block_scanner: BlockScannerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlockScannerSettings {
  #[serde(default = "default_chain_id")]
  pub chain_id: String,
  #[serde(default = "default_http_timeout")]
  pub http_request_timeout_secs: u64,
  #[serde(default)]
  pub whitelist_tokens: Vec<String>,
  /// absent => in-memory store
  #[serde(default)]
  pub db_path: Option<String>,
  #[serde(default)]
  pub start_block_height: i64,
  #[serde(default = "default_block_interval")]
  pub block_interval_secs: u64,
  #[serde(default = "default_max_healthy_lag")]
  pub max_healthy_lag: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeSettings {
  #[serde(default = "default_bridge_host")]
  pub api_host: String,
  #[serde(default = "default_block_time")]
  pub block_time_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolvencySettings {
  #[serde(default = "default_solvency_interval")]
  pub check_interval_secs: u64,
}

fn default_chain_id() -> String {
  "TRON".to_string()
}

fn default_http_timeout() -> u64 {
  30
}

fn default_block_interval() -> u64 {
  3
}

fn default_max_healthy_lag() -> i64 {
  30
}

fn default_bridge_host() -> String {
  "http://localhost:1317".to_string()
}

fn default_block_time() -> u64 {
  6
}

fn default_solvency_interval() -> u64 {
  60
}

impl Default for BlockScannerSettings {
  fn default() -> Self {
    Self {
      chain_id: default_chain_id(),
      http_request_timeout_secs: default_http_timeout(),
      whitelist_tokens: Vec::new(),
      db_path: None,
      start_block_height: 0,
      block_interval_secs: default_block_interval(),
      max_healthy_lag: default_max_healthy_lag(),
    }
  }
}

impl Default for BridgeSettings {
  fn default() -> Self {
    Self { api_host: default_bridge_host(), block_time_secs: default_block_time() }
  }
}

impl Default for SolvencySettings {
  fn default() -> Self {
    Self { check_interval_secs: default_solvency_interval() }
  }
}

impl BlockScannerSettings {
  pub fn http_request_timeout(&self) -> Duration {
    Duration::from_secs(self.http_request_timeout_secs)
  }
}

impl Settings {
  pub fn new() -> Result<Self, config::ConfigError> {
    let config_path = std::env::var("BIFROST_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
    let env_prefix = "BIFROST"; // e.g. BIFROST_TRON__API_HOST=http://...

    let builder = config::Config::builder()
      .add_source(config::File::with_name(&config_path).required(false))
      .add_source(config::Environment::with_prefix(env_prefix).separator("__"));

    builder.build()?.try_deserialize()
  }

  pub fn from_toml(raw: &str) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from_str(raw, config::FileFormat::Toml))
      .build()?
      .try_deserialize()
  }
}
