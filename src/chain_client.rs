/**
* filename : chain_client
* date: 2025. 6. 5.
* description: TRON chain client - account queries, outbound signing and broadcast
**/

use crate::bridge::{amount_of, Asset, Coin, KeysignFailureReporter, ThorchainBridge, TxIn, TxOutItem, TRON_CHAIN};
use crate::coin::tron::address;
use crate::coin::tron::client::TronApi;
use crate::coin::tron::codec::{self, TRANSFER_METHOD};
use crate::coin::tron::model::TronTransaction;
use crate::coin::tron::token;
use crate::coin::tron::utils::{convert_decimals, protocol_to_sun, PROTOCOL_DECIMALS};
use crate::fetcher::fetcher::BlockFetcher;
use crate::fetcher::tron_fetcher::{RefBlock, TronBlockScanner};
use crate::signer::keys::{self, KeyManager};
use crate::signer::tss::Blame;
use crate::signer::SignerCache;
use crate::types::{AppError, NetworkFeeSender, SolvencySender};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Outbound timestamps are rounded down to this many ms.
pub const TIMESTAMP_ACCURACY_MS: i64 = 10_000;
/// How long a signed transaction stays valid, in ms.
pub const TIMESTAMP_VALIDITY_MS: i64 = 90_000;

pub struct ClientConfig {
  pub chain_id: String,
  pub whitelist_tokens: Vec<String>,
  /// protocol-chain block time; bounds each solvency push
  pub block_time: Duration,
}

#[derive(Default)]
pub struct Signers {
  pub local: Option<Arc<dyn KeyManager>>,
  pub tss: Option<Arc<dyn KeyManager>>,
  pub reporter: Option<Arc<dyn KeysignFailureReporter>>,
}

pub struct TronChainClient {
  api: Arc<dyn TronApi>,
  scanner: Arc<TronBlockScanner>,
  signers: Signers,
  cache: SignerCache,
}

/// `floor(now, 10s) - 10s`, in ms.
pub fn stamp_timestamp(now_ms: i64) -> i64 {
  now_ms - now_ms.rem_euclid(TIMESTAMP_ACCURACY_MS) - TIMESTAMP_ACCURACY_MS
}

/// Picks the reference block for a transaction stamped at `stamp`: the block before the
/// newest one older than `stamp` when there is one, else that block, else the oldest.
/// `ring` is sorted by height.
pub fn select_ref_block(ring: &[RefBlock], stamp: i64) -> Option<RefBlock> {
  match ring.iter().rposition(|b| b.timestamp < stamp) {
    Some(i) if i > 0 => Some(ring[i - 1].clone()),
    Some(i) => Some(ring[i].clone()),
    None => ring.first().cloned(),
  }
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as i64)
    .unwrap_or_default()
}

impl TronChainClient {
  pub async fn new(
    config: ClientConfig,
    api: Arc<dyn TronApi>,
    bridge: Arc<dyn ThorchainBridge>,
    signers: Signers,
    cache: SignerCache,
    network_fee_sender: NetworkFeeSender,
    solvency_sender: SolvencySender,
  ) -> Result<Self, AppError> {
    if config.chain_id != TRON_CHAIN {
      return Err(AppError::Config(format!("chain id {} is not {}", config.chain_id, TRON_CHAIN)));
    }

    let tokens = token::load_whitelist(api.as_ref(), &config.whitelist_tokens).await?;
    let scanner = TronBlockScanner::new(
      api.clone(),
      bridge,
      tokens,
      network_fee_sender,
      solvency_sender,
      config.block_time,
    );

    info!("[TRON Client] ready with {} whitelisted tokens", scanner.tokens().len());
    Ok(Self { api, scanner: Arc::new(scanner), signers, cache })
  }

  pub fn get_chain(&self) -> &'static str {
    TRON_CHAIN
  }

  pub fn scanner(&self) -> Arc<TronBlockScanner> {
    self.scanner.clone()
  }

  pub async fn get_height(&self) -> Result<i64, AppError> {
    self.scanner.get_height().await
  }

  /// TRON address of a secp256k1 public key, hex or bech32.
  pub fn get_address(&self, pub_key: &str) -> Result<String, AppError> {
    address::address_from_pub_key_hex(pub_key)
  }

  /// Balances of `addr` in protocol units: TRX first, then every whitelisted token.
  pub async fn get_account(&self, addr: &str) -> Result<Vec<Coin>, AppError> {
    self.scanner.account_coins(&address::to_base58(addr)?).await
  }

  pub async fn get_account_by_pub_key(&self, pub_key: &str) -> Result<Vec<Coin>, AppError> {
    self.scanner.account_coins(&self.get_address(pub_key)?).await
  }

  /// The confirmation lag of the scanner already covers reorgs.
  pub fn get_confirmation_count(&self, _tx_in: &TxIn) -> i64 {
    0
  }

  pub fn confirmation_count_ready(&self, _tx_in: &TxIn) -> bool {
    true
  }

  pub async fn get_latest_tx_for_vault(&self, vault_pub_key: &str) -> Result<Option<String>, AppError> {
    self.cache.get_latest_tx_for_vault(vault_pub_key).await
  }

  /// Builds and signs the TRON transaction for `order` and returns it JSON encoded.
  /// An order that was already broadcast yields an empty payload.
  pub async fn sign_tx(&self, order: &TxOutItem) -> Result<Vec<u8>, AppError> {
    self.sign_tx_at(order, now_ms()).await
  }

  pub async fn sign_tx_at(&self, order: &TxOutItem, now_ms: i64) -> Result<Vec<u8>, AppError> {
    let order_hash = order.cache_hash();
    if self.cache.has_signed(&order_hash).await? {
      info!("[TRON Client] order {} already signed, skipping", order_hash);
      return Ok(Vec::new());
    }

    let ring = self.scanner.ref_blocks().await;
    if ring.is_empty() {
      return Err(AppError::NoRefBlock);
    }
    let coin = match order.coins.as_slice() {
      [coin] if !coin.is_empty() => coin,
      [_] => return Err(AppError::BadOrder("empty coin".to_string())),
      coins => return Err(AppError::BadOrder(format!("expected 1 coin, got {}", coins.len()))),
    };

    let from = address::address_from_pub_key_hex(&order.vault_pub_key)?;
    let to = address::to_base58(&order.to_address)?;
    let mut tx = self.build_tx(order, coin, &from, &to).await?;

    let stamp = stamp_timestamp(now_ms);
    let ref_block = select_ref_block(&ring, stamp).ok_or(AppError::NoRefBlock)?;
    tx.raw_data.ref_block_bytes = codec::ref_block_bytes(ref_block.height);
    tx.raw_data.ref_block_hash = codec::ref_block_hash(&ref_block.block_id)?;
    tx.raw_data.timestamp = stamp;
    tx.raw_data.expiration = stamp + TIMESTAMP_VALIDITY_MS;
    tx.raw_data.data = hex::encode(&order.memo);
    codec::rehash(&mut tx)?;

    let hash = hex::decode(&tx.tx_id)?;
    let sig = self.sign(&hash, order).await?;
    tx.signature.push(hex::encode(sig));

    info!("[TRON Client] signed {} for order {} ({} -> {})", tx.tx_id, order_hash, from, to);
    Ok(serde_json::to_vec(&tx)?)
  }

  async fn build_tx(&self, order: &TxOutItem, coin: &Coin, from: &str, to: &str) -> Result<TronTransaction, AppError> {
    if coin.asset.is_gas_asset() {
      let amount = u64::try_from(protocol_to_sun(coin.amount))
        .map_err(|_| AppError::BadOrder(format!("amount {} out of range", coin.amount)))?;
      return self.api.create_transaction(from, to, amount, &order.memo).await;
    }

    let t = token::find_by_asset(self.scanner.tokens(), &coin.asset)
      .ok_or_else(|| AppError::BadOrder(format!("{} is not a whitelisted token", coin.asset)))?;
    let amount = convert_decimals(coin.amount, PROTOCOL_DECIMALS, t.decimals);
    let call = codec::encode_transfer(to, amount)?;
    let fee_limit = u64::try_from(protocol_to_sun(amount_of(&order.max_gas, &Asset::trx())))
      .map_err(|_| AppError::BadOrder("max gas out of range".to_string()))?;

    self
      .api
      .trigger_smart_contract(from, &t.contract, TRANSFER_METHOD, &hex::encode(&call[4..]), fee_limit)
      .await
  }

  /// Signs `hash` with the local key when it owns the vault, else through TSS.
  async fn sign(&self, hash: &[u8], order: &TxOutItem) -> Result<Vec<u8>, AppError> {
    let vault = &order.vault_pub_key;
    let local = self.signers.local.as_ref().filter(|km| address::same_pub_key(&km.pub_key(), vault));

    let sig = match (local, self.signers.tss.as_ref()) {
      (Some(km), _) => km.sign(hash, vault).await?,
      (None, Some(tss)) => match tss.sign(hash, vault).await {
        Ok(sig) => sig,
        Err(AppError::KeysignBlame(err)) => {
          self.report_keysign_failure(&err.blame, order).await;
          return Err(AppError::KeysignBlame(err));
        }
        Err(e) => return Err(e),
      },
      (None, None) => return Err(AppError::Config(format!("no key manager can sign for vault {}", vault))),
    };

    keys::verify_signature(hash, &sig, vault)?;
    Ok(sig)
  }

  async fn report_keysign_failure(&self, blame: &Blame, order: &TxOutItem) {
    if blame.is_empty() {
      return;
    }
    let reporter = match &self.signers.reporter {
      Some(r) => r,
      None => {
        warn!("[TRON Client] keysign blame for {} not forwarded, no reporter configured", order.vault_pub_key);
        return;
      }
    };
    match reporter
      .post_keysign_failure(blame, order.height, &order.memo, &order.coins, &order.vault_pub_key)
      .await
    {
      Ok(txid) => info!("[TRON Client] keysign failure posted: {}", txid),
      Err(e) => error!("[TRON Client] failed to post keysign failure: {}", e),
    }
  }

  /// Broadcasts a signed transaction and records it in the signer cache.
  pub async fn broadcast_tx(&self, order: &TxOutItem, tx: &[u8]) -> Result<String, AppError> {
    let resp = self.api.broadcast_transaction(tx).await?;
    let tx_id = if resp.txid.is_empty() {
      serde_json::from_slice::<TronTransaction>(tx)?.tx_id
    } else {
      resp.txid
    };

    self.cache.set_signed(&order.cache_hash(), &order.vault_pub_key, &tx_id).await;
    info!("[TRON Client] broadcast {} for vault {}", tx_id, order.vault_pub_key);
    Ok(tx_id)
  }
}
