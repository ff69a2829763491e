use crate::bridge::{ThorchainBridge, Vault};
use crate::coin::coin_trait::BlockchainClient;
use crate::types::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Read-only REST client of the protocol chain.
#[derive(Clone)]
pub struct HttpBridge {
  client: Client,
  api_url: String,
}

#[derive(Debug, Deserialize)]
struct PubKeyEntry {
  pub_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct PubKeysResponse {
  #[serde(default)]
  asgard: Vec<PubKeyEntry>,
}

impl HttpBridge {
  pub fn new(api_url: String, timeout: Duration) -> Result<Self, AppError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("failed to build bridge HTTP client: {}", e)))?;
    Ok(Self { client, api_url })
  }
}

#[async_trait]
impl BlockchainClient for HttpBridge {
  fn get_http_client(&self) -> &Client {
    &self.client
  }

  fn get_api_url(&self) -> &str {
    &self.api_url
  }
}

#[async_trait]
impl ThorchainBridge for HttpBridge {
  async fn get_asgards(&self) -> Result<Vec<Vault>, AppError> {
    self.get_json("/thorchain/vaults/asgard").await
  }

  async fn get_asgard_pub_keys(&self) -> Result<Vec<String>, AppError> {
    let resp: PubKeysResponse = self.get_json("/thorchain/vaults/pubkeys").await?;
    Ok(resp.asgard.into_iter().map(|k| k.pub_key).collect())
  }

  async fn get_mimir(&self, key: &str) -> Result<i64, AppError> {
    self.get_json(&format!("/thorchain/mimir/key/{}", key)).await
  }
}
