#![allow(dead_code)]

use async_trait::async_trait;
use prost::Message;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use tron_bifrost::bridge::{Coin, KeysignFailureReporter, NetworkFee, Solvency, ThorchainBridge, Vault};
use tron_bifrost::chain_client::{ClientConfig, Signers, TronChainClient};
use tron_bifrost::coin::tron::address;
use tron_bifrost::coin::tron::client::TronApi;
use tron_bifrost::coin::tron::model::{
  Account, BlockHeader, BlockHeaderRawData, BroadcastResponse, ChainParameters, RpcResponse, TransactionInfo,
  TronBlock, TronTransaction,
};
use tron_bifrost::coin::tron::proto;
use tron_bifrost::respository::MemoryStore;
use tron_bifrost::signer::keys::KeyManager;
use tron_bifrost::signer::tss::{Blame, KeysignError, RemoteSignature, SignAlgo, TssServer};
use tron_bifrost::signer::{LocalKeyManager, SignerCache};
use tron_bifrost::types::AppError;

/// BIP32 test vector 1 master key; controls VAULT_ADDRESS.
pub const VAULT_PRIVATE_KEY: &str = "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35";
pub const VAULT_PUB_KEY: &str = "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2";
pub const VAULT_BECH32: &str = "tthorpub1addwnpepqvu6xcqnxq2e0kh0g8a7tyaq9nz3859425n7ct03q58zarl5njzuyxw5fzk";
pub const VAULT_ADDRESS: &str = "TATunwEDpE8mCD9Dih5BWyUfShkgVgoH25";
pub const USER_ADDRESS: &str = "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL";
pub const USDT_CONTRACT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

const SHELL_REF_BYTES: &str = "95a2";
const SHELL_REF_HASH: &str = "1f2e3d4c5b6a7988";
const SHELL_EXPIRATION: i64 = 1749121640000;
const SHELL_TIMESTAMP: i64 = 1749121580000;

pub struct FakeToken {
  pub symbol: String,
  pub decimals: u32,
  /// owner base58 -> raw token units
  pub balances: HashMap<String, u128>,
}

/// In-memory TRON node.
#[derive(Default)]
pub struct FakeTronApi {
  pub blocks: Mutex<HashMap<i64, TronBlock>>,
  pub tip: Mutex<i64>,
  pub fees: Mutex<HashMap<String, i64>>,
  pub balances: Mutex<HashMap<String, u64>>,
  /// keyed by base58 contract
  pub tokens: Mutex<HashMap<String, FakeToken>>,
  pub chain_params: Mutex<Option<ChainParameters>>,
  pub energy: Mutex<HashMap<String, i64>>,
  pub broadcasts: Mutex<Vec<Vec<u8>>>,
  pub reject_broadcast: Mutex<bool>,
  pub tx_info_calls: Mutex<usize>,
  pub trigger_calls: Mutex<Vec<(String, String, String, u64)>>,
}

impl FakeTronApi {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn add_block(&self, height: i64, timestamp: i64, block_id: &str, transactions: Vec<TronTransaction>) {
    self.blocks.lock().unwrap().insert(height, block(height, timestamp, block_id, transactions));
  }

  pub fn add_token(&self, contract: &str, symbol: &str, decimals: u32) {
    self.tokens.lock().unwrap().insert(
      contract.to_string(),
      FakeToken { symbol: symbol.to_string(), decimals, balances: HashMap::new() },
    );
  }

  pub fn set_token_balance(&self, contract: &str, owner: &str, amount: u128) {
    if let Some(t) = self.tokens.lock().unwrap().get_mut(contract) {
      t.balances.insert(owner.to_string(), amount);
    }
  }

  pub fn set_fee(&self, tx_id: &str, fee: i64) {
    self.fees.lock().unwrap().insert(tx_id.to_string(), fee);
  }

  pub fn set_balance(&self, addr: &str, sun: u64) {
    self.balances.lock().unwrap().insert(addr.to_string(), sun);
  }

  fn token_by_evm(&self, evm: &str) -> Option<String> {
    let tokens = self.tokens.lock().unwrap();
    tokens
      .keys()
      .find(|c| address::to_evm_hex(c).map(|e| e.eq_ignore_ascii_case(evm)).unwrap_or(false))
      .cloned()
  }
}

pub fn block(height: i64, timestamp: i64, block_id: &str, transactions: Vec<TronTransaction>) -> TronBlock {
  TronBlock {
    block_id: block_id.to_string(),
    block_header: Some(BlockHeader {
      raw_data: BlockHeaderRawData { number: height, timestamp, ..Default::default() },
      witness_signature: String::new(),
    }),
    transactions,
  }
}

pub fn block_id(height: i64) -> String {
  format!("{:016x}{}", height, "ab".repeat(24))
}

fn abi_word(value: u128) -> String {
  format!("{:064x}", value)
}

fn abi_string(s: &str) -> String {
  let data = hex::encode(s);
  let padded = format!("{:0<64}", data);
  format!("0x{}{}{}", abi_word(32), abi_word(s.len() as u128), padded)
}

/// Builds what the node answers to createtransaction / triggersmartcontract.
fn shell(contract_type: i32, type_name: &str, value_proto: Vec<u8>, value_json: serde_json::Value, fee_limit: Option<i64>) -> TronTransaction {
  let type_url = format!("type.googleapis.com/protocol.{}", type_name);
  let raw = proto::TransactionRaw {
    ref_block_bytes: hex::decode(SHELL_REF_BYTES).unwrap(),
    ref_block_hash: hex::decode(SHELL_REF_HASH).unwrap(),
    expiration: SHELL_EXPIRATION,
    contract: vec![proto::Contract {
      r#type: contract_type,
      parameter: Some(proto::Any { type_url: type_url.clone(), value: value_proto }),
      ..Default::default()
    }],
    timestamp: SHELL_TIMESTAMP,
    fee_limit: fee_limit.unwrap_or_default(),
    ..Default::default()
  };
  let encoded = raw.encode_to_vec();

  let mut raw_data = json!({
    "contract": [{"parameter": {"value": value_json, "type_url": type_url}, "type": type_name}],
    "ref_block_bytes": SHELL_REF_BYTES,
    "ref_block_hash": SHELL_REF_HASH,
    "expiration": SHELL_EXPIRATION,
    "timestamp": SHELL_TIMESTAMP,
  });
  if let Some(limit) = fee_limit {
    raw_data["fee_limit"] = json!(limit);
  }
  serde_json::from_value(json!({
    "visible": true,
    "txID": hex::encode(Sha256::digest(&encoded)),
    "raw_data": raw_data,
    "raw_data_hex": hex::encode(&encoded),
  }))
  .unwrap()
}

fn raw_address(addr: &str) -> Vec<u8> {
  hex::decode(address::to_hex(addr).unwrap()).unwrap()
}

#[async_trait]
impl TronApi for FakeTronApi {
  async fn get_latest_block(&self) -> Result<TronBlock, AppError> {
    let tip = *self.tip.lock().unwrap();
    Ok(block(tip, 0, &block_id(tip), vec![]))
  }

  async fn get_block(&self, height: i64) -> Result<TronBlock, AppError> {
    self
      .blocks
      .lock()
      .unwrap()
      .get(&height)
      .cloned()
      .ok_or_else(|| AppError::Transport(format!("block {} not found", height)))
  }

  async fn get_transaction_info(&self, hash: &str) -> Result<TransactionInfo, AppError> {
    *self.tx_info_calls.lock().unwrap() += 1;
    let fee = self
      .fees
      .lock()
      .unwrap()
      .get(hash)
      .copied()
      .ok_or_else(|| AppError::Transport(format!("no info for {}", hash)))?;
    Ok(TransactionInfo { id: hash.to_string(), fee, ..Default::default() })
  }

  async fn get_balance(&self, address: &str) -> Result<u64, AppError> {
    Ok(self.get_account(address).await?.balance)
  }

  async fn get_account(&self, address: &str) -> Result<Account, AppError> {
    let balance = self.balances.lock().unwrap().get(address).copied().unwrap_or(0);
    Ok(Account { address: address.to_string(), balance })
  }

  async fn create_transaction(&self, from: &str, to: &str, amount: u64, _memo: &str) -> Result<TronTransaction, AppError> {
    let value = proto::TransferContract { owner_address: raw_address(from), to_address: raw_address(to), amount: amount as i64 };
    Ok(shell(
      proto::CONTRACT_TYPE_TRANSFER,
      "TransferContract",
      value.encode_to_vec(),
      json!({"amount": amount, "owner_address": from, "to_address": to}),
      None,
    ))
  }

  async fn trigger_smart_contract(
    &self,
    from: &str,
    contract: &str,
    selector: &str,
    parameter: &str,
    fee_limit: u64,
  ) -> Result<TronTransaction, AppError> {
    self
      .trigger_calls
      .lock()
      .unwrap()
      .push((contract.to_string(), selector.to_string(), parameter.to_string(), fee_limit));
    let mut data = tron_bifrost::coin::tron::codec::selector(selector).to_vec();
    data.extend(hex::decode(parameter)?);
    let value = proto::TriggerSmartContract {
      owner_address: raw_address(from),
      contract_address: raw_address(contract),
      data: data.clone(),
      ..Default::default()
    };
    Ok(shell(
      proto::CONTRACT_TYPE_TRIGGER_SMART_CONTRACT,
      "TriggerSmartContract",
      value.encode_to_vec(),
      json!({"data": hex::encode(&data), "owner_address": from, "contract_address": contract}),
      Some(fee_limit as i64),
    ))
  }

  async fn broadcast_transaction(&self, tx: &[u8]) -> Result<BroadcastResponse, AppError> {
    if *self.reject_broadcast.lock().unwrap() {
      return Err(AppError::Broadcast("SIGERROR validate signature error".to_string()));
    }
    self.broadcasts.lock().unwrap().push(tx.to_vec());
    let parsed: TronTransaction = serde_json::from_slice(tx)?;
    Ok(BroadcastResponse { result: true, txid: parsed.tx_id, ..Default::default() })
  }

  async fn get_chain_parameters(&self) -> Result<ChainParameters, AppError> {
    self
      .chain_params
      .lock()
      .unwrap()
      .ok_or_else(|| AppError::Parameter("chain parameter getMemoFee missing".to_string()))
  }

  async fn estimate_energy(&self, _from: &str, contract: &str, _selector: &str, _parameter: &str) -> Result<i64, AppError> {
    self
      .energy
      .lock()
      .unwrap()
      .get(contract)
      .copied()
      .ok_or_else(|| AppError::Parameter(format!("no estimate for {}", contract)))
  }

  async fn eth_call(&self, contract: &str, data: &str) -> Result<RpcResponse, AppError> {
    let contract = self
      .token_by_evm(contract)
      .ok_or_else(|| AppError::Transport(format!("unknown contract {}", contract)))?;
    let tokens = self.tokens.lock().unwrap();
    let token = &tokens[&contract];
    let data = data.trim_start_matches("0x");

    let result = match &data[..8] {
      "95d89b41" => abi_string(&token.symbol),
      "313ce567" => format!("0x{}", abi_word(token.decimals as u128)),
      "70a08231" => {
        let owner = address::from_evm_bytes(&hex::decode(&data[8 + 24..8 + 64]).unwrap())?;
        format!("0x{}", abi_word(token.balances.get(&owner).copied().unwrap_or(0)))
      }
      other => return Err(AppError::Parameter(format!("unexpected selector {}", other))),
    };
    Ok(RpcResponse { result: Some(result), error: None })
  }
}

/// Protocol chain stand-in.
#[derive(Default)]
pub struct FakeBridge {
  pub vaults: Mutex<Vec<Vault>>,
  pub mimir: Mutex<HashMap<String, i64>>,
}

impl FakeBridge {
  pub fn with_vaults(vaults: Vec<Vault>) -> Arc<Self> {
    let bridge = Self::default();
    *bridge.vaults.lock().unwrap() = vaults;
    Arc::new(bridge)
  }
}

#[async_trait]
impl ThorchainBridge for FakeBridge {
  async fn get_asgards(&self) -> Result<Vec<Vault>, AppError> {
    Ok(self.vaults.lock().unwrap().clone())
  }

  async fn get_asgard_pub_keys(&self) -> Result<Vec<String>, AppError> {
    Ok(self.vaults.lock().unwrap().iter().map(|v| v.pub_key.clone()).collect())
  }

  async fn get_mimir(&self, key: &str) -> Result<i64, AppError> {
    Ok(self.mimir.lock().unwrap().get(key).copied().unwrap_or(-1))
  }
}

#[derive(Default)]
pub struct RecordingReporter {
  pub reports: Mutex<Vec<(Blame, i64, String, Vec<Coin>, String)>>,
  pub fail: bool,
}

#[async_trait]
impl KeysignFailureReporter for RecordingReporter {
  async fn post_keysign_failure(
    &self,
    blame: &Blame,
    height: i64,
    memo: &str,
    coins: &[Coin],
    pub_key: &str,
  ) -> Result<String, AppError> {
    self
      .reports
      .lock()
      .unwrap()
      .push((blame.clone(), height, memo.to_string(), coins.to_vec(), pub_key.to_string()));
    if self.fail {
      return Err(AppError::Transport("bridge unavailable".to_string()));
    }
    Ok("KEYSIGNFAIL".to_string())
  }
}

/// Threshold signer backed by a single local key, or one that always blames.
pub struct FakeTss {
  pub key: Option<LocalKeyManager>,
  pub blame: Option<Blame>,
}

#[async_trait]
impl TssServer for FakeTss {
  async fn remote_sign(&self, msg: &[u8], _algo: SignAlgo, pub_key: &str) -> Result<RemoteSignature, AppError> {
    if let Some(blame) = &self.blame {
      return Err(KeysignError::new(blame.clone()).into());
    }
    let key = self.key.as_ref().ok_or_else(|| AppError::Crypto("no key".to_string()))?;
    let mut sig = key.sign(msg, pub_key).await?;
    let recovery = sig.pop().unwrap();
    Ok(RemoteSignature { signature: sig, recovery })
  }
}

pub struct Harness {
  pub api: Arc<FakeTronApi>,
  pub bridge: Arc<FakeBridge>,
  pub client: TronChainClient,
  pub fee_rx: mpsc::Receiver<NetworkFee>,
  pub solvency_rx: mpsc::Receiver<Solvency>,
}

pub async fn harness(
  api: Arc<FakeTronApi>,
  bridge: Arc<FakeBridge>,
  whitelist: Vec<String>,
  signers: Signers,
) -> Result<Harness, AppError> {
  let (fee_tx, fee_rx) = mpsc::channel(16);
  let (solvency_tx, solvency_rx) = mpsc::channel(16);
  let client = TronChainClient::new(
    ClientConfig { chain_id: "TRON".to_string(), whitelist_tokens: whitelist, block_time: Duration::from_millis(50) },
    api.clone(),
    bridge.clone(),
    signers,
    SignerCache::new(Arc::new(MemoryStore::new())),
    fee_tx,
    solvency_tx,
  )
  .await?;
  Ok(Harness { api, bridge, client, fee_rx, solvency_rx })
}

pub fn local_signers() -> Signers {
  Signers {
    local: Some(Arc::new(LocalKeyManager::from_hex(VAULT_PRIVATE_KEY).unwrap())),
    ..Default::default()
  }
}

/// Inbound TRX transfer as the wallet API returns it with `visible=true`.
pub fn trx_transfer(tx_id: &str, from: &str, to: &str, amount: i64, memo: &str, ret: &str) -> TronTransaction {
  serde_json::from_value(json!({
    "ret": [{"contractRet": ret}],
    "txID": tx_id,
    "raw_data": {
      "contract": [{
        "parameter": {
          "value": {"amount": amount, "owner_address": from, "to_address": to},
          "type_url": "type.googleapis.com/protocol.TransferContract"
        },
        "type": "TransferContract"
      }],
      "ref_block_bytes": "95a2",
      "ref_block_hash": "1f2e3d4c5b6a7988",
      "expiration": 1749121640000i64,
      "timestamp": 1749121580000i64,
      "data": hex::encode(memo)
    },
    "raw_data_hex": "00"
  }))
  .unwrap()
}

/// Inbound TRC-20 call with arbitrary call data.
pub fn trc20_call(tx_id: &str, from: &str, contract: &str, data: &str, memo: &str) -> TronTransaction {
  serde_json::from_value(json!({
    "ret": [{"contractRet": "SUCCESS"}],
    "txID": tx_id,
    "raw_data": {
      "contract": [{
        "parameter": {
          "value": {"data": data, "owner_address": from, "contract_address": contract},
          "type_url": "type.googleapis.com/protocol.TriggerSmartContract"
        },
        "type": "TriggerSmartContract"
      }],
      "ref_block_bytes": "95a2",
      "ref_block_hash": "1f2e3d4c5b6a7988",
      "expiration": 1749121640000i64,
      "timestamp": 1749121580000i64,
      "data": hex::encode(memo),
      "fee_limit": 100000000
    },
    "raw_data_hex": "00"
  }))
  .unwrap()
}
