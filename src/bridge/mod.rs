/**
* filename : bridge
* date: 2025. 6. 5.
* description: protocol-chain types and the narrow calls the TRON client makes into it
**/

mod http;
mod types;

pub use http::HttpBridge;
pub use types::*;

use crate::signer::tss::Blame;
use crate::types::AppError;
use async_trait::async_trait;

/// Read side of the protocol chain.
#[async_trait]
pub trait ThorchainBridge: Send + Sync {
  async fn get_asgards(&self) -> Result<Vec<Vault>, AppError>;
  async fn get_asgard_pub_keys(&self) -> Result<Vec<String>, AppError>;
  /// Value of a mimir key; `-1` when unset.
  async fn get_mimir(&self, key: &str) -> Result<i64, AppError>;
}

#[async_trait]
pub trait KeysignFailureReporter: Send + Sync {
  /// Posts a keysign failure; returns the protocol-chain tx id of the report.
  async fn post_keysign_failure(
    &self,
    blame: &Blame,
    height: i64,
    memo: &str,
    coins: &[Coin],
    pub_key: &str,
  ) -> Result<String, AppError>;
}
