/**
* filename : cache
* date: 2025. 6. 5.
* description: signer cache (duplicate-sign suppression, last tx per vault)
**/

use crate::respository::KeyValueStore;
use crate::types::AppError;
use log::error;
use std::sync::Arc;

const SIGNED_PREFIX: &str = "signed:";
const LATEST_PREFIX: &str = "latest:";

#[derive(Clone)]
pub struct SignerCache {
  store: Arc<dyn KeyValueStore>,
}

impl SignerCache {
  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self { store }
  }

  pub async fn has_signed(&self, order_hash: &str) -> Result<bool, AppError> {
    Ok(self.get_signed(order_hash).await?.is_some())
  }

  /// Broadcast tx id recorded for an order, if any.
  pub async fn get_signed(&self, order_hash: &str) -> Result<Option<String>, AppError> {
    self.store.get(&format!("{}{}", SIGNED_PREFIX, order_hash)).await
  }

  /// Records a broadcast. Store failures are logged only.
  pub async fn set_signed(&self, order_hash: &str, vault_pub_key: &str, tx_id: &str) {
    if let Err(e) = self.store.put(&format!("{}{}", SIGNED_PREFIX, order_hash), tx_id).await {
      error!("[SignerCache] failed to record order {} -> {}: {}", order_hash, tx_id, e);
      return;
    }
    if let Err(e) = self.store.put(&format!("{}{}", LATEST_PREFIX, vault_pub_key), tx_id).await {
      error!("[SignerCache] failed to record latest tx {} for vault {}: {}", tx_id, vault_pub_key, e);
    }
  }

  pub async fn get_latest_tx_for_vault(&self, vault_pub_key: &str) -> Result<Option<String>, AppError> {
    self.store.get(&format!("{}{}", LATEST_PREFIX, vault_pub_key)).await
  }
}
