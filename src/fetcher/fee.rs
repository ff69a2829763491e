/**
* filename : fee
* date: 2025. 6. 5.
* description: TRON network fee estimation (bandwidth + energy + memo + activation)
**/

use crate::bridge::{Asset, NetworkFee, ThorchainBridge, TRON_CHAIN};
use crate::coin::tron::address;
use crate::coin::tron::client::TronApi;
use crate::coin::tron::codec::{self, TRANSFER_METHOD};
use crate::coin::tron::model::ChainParameters;
use crate::coin::tron::token::WhitelistToken;
use crate::coin::tron::utils::sun_to_trx;
use crate::types::{AppError, NetworkFeeSender};
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Bandwidth bytes of a plain TRX transfer (raw data, protobuf overhead, result, signature).
pub const BANDWIDTH_TRX_TRANSFER: i64 = 284;
/// Bandwidth bytes of a TRC-20 `transfer` call.
pub const BANDWIDTH_TRC20_TRANSFER: i64 = 345;
/// First transfer to a fresh recipient roughly doubles the energy bill.
pub const ENERGY_SAFETY_MULTIPLIER: i64 = 2;
/// Covers activating a recipient account that does not exist yet, in sun.
pub const ACCOUNT_ACTIVATION_FEE: i64 = 1_100_000;
/// sun -> protocol units
const FEE_SCALE: u64 = 100;

/// Largest energy estimate times the safety multiplier.
pub fn max_energy(estimates: &[i64]) -> i64 {
  estimates.iter().copied().max().unwrap_or(0) * ENERGY_SAFETY_MULTIPLIER
}

/// Composite per-transaction fee in sun.
pub fn compute_fee(params: &ChainParameters, has_tokens: bool, max_energy: i64) -> i64 {
  let bandwidth = if has_tokens { BANDWIDTH_TRC20_TRANSFER } else { BANDWIDTH_TRX_TRANSFER };
  let mut fee = bandwidth * params.bandwidth_fee;
  if has_tokens {
    fee += max_energy * params.energy_fee;
  }
  fee + params.memo_fee + ACCOUNT_ACTIVATION_FEE
}

pub struct FeeEngine {
  api: Arc<dyn TronApi>,
  bridge: Arc<dyn ThorchainBridge>,
  tokens: Vec<WhitelistToken>,
  sender: NetworkFeeSender,
  /// sun; zero until the first successful refresh
  current_fee: AtomicU64,
  ref_address: RwLock<Option<String>>,
}

impl FeeEngine {
  pub fn new(
    api: Arc<dyn TronApi>,
    bridge: Arc<dyn ThorchainBridge>,
    tokens: Vec<WhitelistToken>,
    sender: NetworkFeeSender,
  ) -> Self {
    Self {
      api,
      bridge,
      tokens,
      sender,
      current_fee: AtomicU64::new(0),
      ref_address: RwLock::new(None),
    }
  }

  pub fn current_fee(&self) -> u64 {
    self.current_fee.load(Ordering::SeqCst)
  }

  /// Refreshes the fee and publishes it. Any failure leaves the previous fee in place.
  pub async fn update(&self, height: i64) -> Result<(), AppError> {
    let ref_address = self.ref_address().await?;
    let params = self.api.get_chain_parameters().await?;

    let energy = if self.tokens.is_empty() { 0 } else { self.estimate_max_energy(&ref_address).await? };
    let fee = compute_fee(&params, !self.tokens.is_empty(), energy);
    if fee <= 0 {
      warn!("[FeeEngine] computed non-positive fee {} at height {}, keeping {}", fee, height, self.current_fee());
      return Ok(());
    }

    let fee = fee as u64;
    // the fee only moves once the protocol chain has it
    self
      .sender
      .send(NetworkFee {
        chain: TRON_CHAIN.to_string(),
        height,
        transaction_size: 1,
        transaction_rate: fee * FEE_SCALE,
      })
      .await?;
    self.current_fee.store(fee, Ordering::SeqCst);
    info!("[FeeEngine] fee at height {} is {} TRX (energy {})", height, sun_to_trx(fee), energy);
    Ok(())
  }

  pub async fn estimate_max_energy(&self, ref_address: &str) -> Result<i64, AppError> {
    // zero-amount transfer back to the reference address
    let call = codec::encode_transfer(ref_address, 0)?;
    let parameter = hex::encode(&call[4..]);

    let mut estimates = Vec::with_capacity(self.tokens.len());
    for token in &self.tokens {
      let energy = self
        .api
        .estimate_energy(ref_address, &token.contract, TRANSFER_METHOD, &parameter)
        .await?;
      estimates.push(energy);
    }
    Ok(max_energy(&estimates))
  }

  /// First vault holding TRX, resolved once.
  async fn ref_address(&self) -> Result<String, AppError> {
    if let Some(addr) = self.ref_address.read().await.as_ref() {
      return Ok(addr.clone());
    }

    let gas_asset = Asset::trx();
    let vaults = self.bridge.get_asgards().await?;
    let vault = vaults
      .iter()
      .find(|v| v.has_funds_for(&gas_asset))
      .ok_or_else(|| AppError::Parameter("no vault holds TRX yet, fee reference address unknown".to_string()))?;
    let addr = address::address_from_pub_key_hex(&vault.pub_key)?;

    info!("[FeeEngine] using {} as fee reference address", addr);
    *self.ref_address.write().await = Some(addr.clone());
    Ok(addr)
  }
}
