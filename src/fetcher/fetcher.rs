/**
* filename : fetcher
* date: 2025. 6. 5.
* description: contract between a chain scanner and the scheduler that drives it
**/

use crate::bridge::TxIn;
use crate::types::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait BlockFetcher: Send + Sync {
  /// Highest height that is safe to fetch.
  async fn get_height(&self) -> Result<i64, AppError>;
  /// Observations of one block. Called serially, in height order.
  async fn fetch_txs(&self, height: i64) -> Result<TxIn, AppError>;
  fn set_healthy(&self, healthy: bool);
  fn chain_name(&self) -> &'static str;
}
