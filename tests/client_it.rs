mod common;

use common::*;
use prost::Message;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use tron_bifrost::bridge::{Asset, Coin, KeysignFailureReporter, TxOutItem};
use tron_bifrost::chain_client::{ClientConfig, Signers, TronChainClient};
use tron_bifrost::coin::tron::model::TronTransaction;
use tron_bifrost::coin::tron::{address, codec, proto};
use tron_bifrost::fetcher::tron_fetcher::RefBlock;
use tron_bifrost::respository::MemoryStore;
use tron_bifrost::signer::keys::verify_signature;
use tron_bifrost::signer::{Blame, LocalKeyManager, SignerCache, TssKeyManager};
use tron_bifrost::types::AppError;

const NOW_MS: i64 = 1_749_121_590_000;
const STAMP_MS: i64 = 1_749_121_580_000;
const REF_BLOCK_ID: &str = "00000000034895b0e5029588a71f9689fb5c31e2c66989389d6ff09548726f6e";

fn order(coins: Vec<Coin>) -> TxOutItem {
  TxOutItem {
    chain: "TRON".to_string(),
    to_address: USER_ADDRESS.to_string(),
    vault_pub_key: VAULT_PUB_KEY.to_string(),
    coins,
    memo: "OUT:9F3A".to_string(),
    max_gas: vec![Coin::new(Asset::trx(), 1_000_000_000, 6)],
    gas_rate: 0,
    in_hash: "9F3A".to_string(),
    height: 1234,
  }
}

fn trx_order() -> TxOutItem {
  order(vec![Coin::new(Asset::trx(), 100_000_000, 6)])
}

async fn ready(h: &Harness) {
  h.client
    .scanner()
    .add_ref_block(RefBlock { timestamp: 1_749_121_581_000, height: 55088560, block_id: REF_BLOCK_ID.to_string() })
    .await;
}

async fn signing_harness(signers: Signers) -> eyre::Result<Harness> {
  let api = FakeTronApi::new();
  api.add_token(USDT_CONTRACT, "USDT", 6);
  let h = harness(api, Arc::new(FakeBridge::default()), vec![USDT_CONTRACT.to_string()], signers).await?;
  ready(&h).await;
  Ok(h)
}

fn tss_signers(tss: FakeTss, reporter: Option<Arc<RecordingReporter>>) -> Signers {
  Signers {
    local: None,
    tss: Some(Arc::new(TssKeyManager::new(Arc::new(tss), "node-pub".to_string()))),
    reporter: reporter.map(|r| r as Arc<dyn KeysignFailureReporter>),
  }
}

fn blame() -> Blame {
  Blame { fail_reason: "timeout".to_string(), blame_nodes: vec!["node-a".to_string(), "node-b".to_string()] }
}

fn assert_signed_by_vault(tx: &TronTransaction) -> eyre::Result<()> {
  assert_eq!(tx.signature.len(), 1);
  assert_eq!(tx.signature[0].len(), 130);
  let raw = hex::decode(&tx.raw_data_hex)?;
  assert_eq!(tx.tx_id, hex::encode(Sha256::digest(&raw)));
  verify_signature(&hex::decode(&tx.tx_id)?, &hex::decode(&tx.signature[0])?, VAULT_PUB_KEY)?;
  Ok(())
}

#[tokio::test]
async fn signs_trx_transfer_against_ref_block() -> eyre::Result<()> {
  let h = signing_harness(local_signers()).await?;

  let payload = h.client.sign_tx_at(&trx_order(), NOW_MS).await?;
  let tx: TronTransaction = serde_json::from_slice(&payload)?;

  assert_eq!(tx.raw_data.ref_block_bytes, "95b0");
  assert_eq!(tx.raw_data.ref_block_hash, "e5029588a71f9689");
  assert_eq!(tx.raw_data.timestamp, STAMP_MS);
  assert_eq!(tx.raw_data.expiration, STAMP_MS + 90_000);
  assert_eq!(tx.raw_data.data, hex::encode("OUT:9F3A"));
  assert_eq!(tx.raw_data.contract.len(), 1);
  assert_eq!(tx.raw_data.contract[0].contract_type, "TransferContract");
  assert_eq!(tx.raw_data.contract[0].parameter.value["amount"], 1_000_000);
  assert_signed_by_vault(&tx)?;

  // the protobuf carries the same fields the JSON shows
  let raw = proto::TransactionRaw::decode(hex::decode(&tx.raw_data_hex)?.as_slice())?;
  assert_eq!(hex::encode(&raw.ref_block_bytes), "95b0");
  assert_eq!(hex::encode(&raw.ref_block_hash), "e5029588a71f9689");
  assert_eq!(raw.timestamp, STAMP_MS);
  assert_eq!(raw.data, b"OUT:9F3A".to_vec());
  Ok(())
}

#[tokio::test]
async fn signs_trc20_transfer_with_fee_limit() -> eyre::Result<()> {
  let h = signing_harness(local_signers()).await?;
  let usdt = Asset::token("USDT", USDT_CONTRACT);

  let payload = h.client.sign_tx_at(&order(vec![Coin::new(usdt, 1_234_567_800, 6)]), NOW_MS).await?;
  let tx: TronTransaction = serde_json::from_slice(&payload)?;

  let calls = h.api.trigger_calls.lock().unwrap().clone();
  let call = codec::encode_transfer(USER_ADDRESS, 12_345_678)?;
  assert_eq!(
    calls,
    vec![(USDT_CONTRACT.to_string(), codec::TRANSFER_METHOD.to_string(), hex::encode(&call[4..]), 10_000_000)]
  );
  assert_eq!(tx.raw_data.contract[0].contract_type, "TriggerSmartContract");
  assert_eq!(tx.raw_data.fee_limit, Some(10_000_000));
  assert_eq!(tx.raw_data.ref_block_bytes, "95b0");
  assert_signed_by_vault(&tx)?;
  Ok(())
}

#[tokio::test]
async fn signs_for_a_bech32_vault_key() -> eyre::Result<()> {
  let h = signing_harness(local_signers()).await?;
  let mut order = trx_order();
  order.vault_pub_key = VAULT_BECH32.to_string();

  let payload = h.client.sign_tx_at(&order, NOW_MS).await?;
  let tx: TronTransaction = serde_json::from_slice(&payload)?;
  assert_eq!(tx.raw_data.contract[0].parameter.value["owner_address"], VAULT_ADDRESS);
  assert_signed_by_vault(&tx)?;
  assert_eq!(h.client.get_address(VAULT_BECH32)?, VAULT_ADDRESS);
  Ok(())
}

#[tokio::test]
async fn rejects_malformed_orders() -> eyre::Result<()> {
  let h = signing_harness(local_signers()).await?;

  let two = order(vec![Coin::new(Asset::trx(), 1, 6), Coin::new(Asset::trx(), 2, 6)]);
  assert!(matches!(h.client.sign_tx_at(&two, NOW_MS).await, Err(AppError::BadOrder(_))));

  let none = order(vec![]);
  assert!(matches!(h.client.sign_tx_at(&none, NOW_MS).await, Err(AppError::BadOrder(_))));

  let zero = order(vec![Coin::new(Asset::trx(), 0, 6)]);
  assert!(matches!(h.client.sign_tx_at(&zero, NOW_MS).await, Err(AppError::BadOrder(_))));

  let unknown = order(vec![Coin::new(Asset::token("FAKE", USER_ADDRESS), 100, 6)]);
  assert!(matches!(h.client.sign_tx_at(&unknown, NOW_MS).await, Err(AppError::BadOrder(_))));
  Ok(())
}

#[tokio::test]
async fn refuses_to_sign_without_ref_block() -> eyre::Result<()> {
  let h = harness(FakeTronApi::new(), Arc::new(FakeBridge::default()), vec![], local_signers()).await?;

  let err = h.client.sign_tx_at(&trx_order(), NOW_MS).await.unwrap_err();
  assert!(matches!(err, AppError::NoRefBlock));
  Ok(())
}

#[tokio::test]
async fn broadcast_memoizes_the_order() -> eyre::Result<()> {
  let h = signing_harness(local_signers()).await?;
  let order = trx_order();

  let payload = h.client.sign_tx_at(&order, NOW_MS).await?;
  let signed: TronTransaction = serde_json::from_slice(&payload)?;
  let tx_id = h.client.broadcast_tx(&order, &payload).await?;

  assert_eq!(tx_id, signed.tx_id);
  assert_eq!(h.api.broadcasts.lock().unwrap().len(), 1);
  assert_eq!(h.client.get_latest_tx_for_vault(VAULT_PUB_KEY).await?, Some(tx_id));

  // same order again: nothing to sign
  assert!(h.client.sign_tx_at(&order, NOW_MS).await?.is_empty());

  // a different order still signs
  let mut other = order.clone();
  other.in_hash = "A0B1".to_string();
  assert!(!h.client.sign_tx_at(&other, NOW_MS).await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn rejected_broadcast_is_not_memoized() -> eyre::Result<()> {
  let h = signing_harness(local_signers()).await?;
  let order = trx_order();
  *h.api.reject_broadcast.lock().unwrap() = true;

  let payload = h.client.sign_tx_at(&order, NOW_MS).await?;
  let err = h.client.broadcast_tx(&order, &payload).await.unwrap_err();
  assert!(matches!(err, AppError::Broadcast(_)));

  assert_eq!(h.client.get_latest_tx_for_vault(VAULT_PUB_KEY).await?, None);
  assert!(!h.client.sign_tx_at(&order, NOW_MS).await?.is_empty());
  Ok(())
}

#[tokio::test]
async fn signs_through_tss_when_no_local_key_matches() -> eyre::Result<()> {
  let other_key = LocalKeyManager::from_hex(&"11".repeat(32))?;
  let mut signers = tss_signers(FakeTss { key: Some(LocalKeyManager::from_hex(VAULT_PRIVATE_KEY)?), blame: None }, None);
  signers.local = Some(Arc::new(other_key));
  let h = signing_harness(signers).await?;

  let payload = h.client.sign_tx_at(&trx_order(), NOW_MS).await?;
  let tx: TronTransaction = serde_json::from_slice(&payload)?;
  assert_signed_by_vault(&tx)?;
  Ok(())
}

#[tokio::test]
async fn tss_signature_for_the_wrong_key_fails_verification() -> eyre::Result<()> {
  let wrong = LocalKeyManager::from_hex(&"22".repeat(32))?;
  let h = signing_harness(tss_signers(FakeTss { key: Some(wrong), blame: None }, None)).await?;

  let err = h.client.sign_tx_at(&trx_order(), NOW_MS).await.unwrap_err();
  assert!(matches!(err, AppError::SignVerifyFailed));
  Ok(())
}

#[tokio::test]
async fn keysign_blame_is_forwarded_once() -> eyre::Result<()> {
  let reporter = Arc::new(RecordingReporter::default());
  let h = signing_harness(tss_signers(FakeTss { key: None, blame: Some(blame()) }, Some(reporter.clone()))).await?;
  let order = trx_order();

  let err = h.client.sign_tx_at(&order, NOW_MS).await.unwrap_err();
  match err {
    AppError::KeysignBlame(e) => assert_eq!(e.blame, blame()),
    other => panic!("unexpected error {:?}", other),
  }

  let reports = reporter.reports.lock().unwrap().clone();
  assert_eq!(reports.len(), 1);
  let (b, height, memo, coins, pub_key) = &reports[0];
  assert_eq!(b, &blame());
  assert_eq!(*height, 1234);
  assert_eq!(memo, "OUT:9F3A");
  assert_eq!(coins, &order.coins);
  assert_eq!(pub_key, VAULT_PUB_KEY);
  Ok(())
}

#[tokio::test]
async fn failing_reporter_still_returns_the_blame() -> eyre::Result<()> {
  let reporter = Arc::new(RecordingReporter { fail: true, ..Default::default() });
  let h = signing_harness(tss_signers(FakeTss { key: None, blame: Some(blame()) }, Some(reporter.clone()))).await?;

  let err = h.client.sign_tx_at(&trx_order(), NOW_MS).await.unwrap_err();
  assert!(matches!(err, AppError::KeysignBlame(_)));
  assert_eq!(reporter.reports.lock().unwrap().len(), 1);
  Ok(())
}

#[tokio::test]
async fn empty_blame_is_not_forwarded() -> eyre::Result<()> {
  let reporter = Arc::new(RecordingReporter::default());
  let empty = Blame { fail_reason: String::new(), blame_nodes: vec![] };
  let h = signing_harness(tss_signers(FakeTss { key: None, blame: Some(empty) }, Some(reporter.clone()))).await?;

  assert!(h.client.sign_tx_at(&trx_order(), NOW_MS).await.is_err());
  assert!(reporter.reports.lock().unwrap().is_empty());
  Ok(())
}

#[tokio::test]
async fn no_key_manager_for_vault() -> eyre::Result<()> {
  let mut signers = Signers::default();
  signers.local = Some(Arc::new(LocalKeyManager::from_hex(&"11".repeat(32))?));
  let h = signing_harness(signers).await?;

  let err = h.client.sign_tx_at(&trx_order(), NOW_MS).await.unwrap_err();
  assert!(matches!(err, AppError::Config(_)));
  Ok(())
}

#[tokio::test]
async fn account_lists_trx_then_tokens() -> eyre::Result<()> {
  let h = signing_harness(Signers::default()).await?;
  h.api.set_balance(VAULT_ADDRESS, 12_500_000);
  h.api.set_token_balance(USDT_CONTRACT, VAULT_ADDRESS, 3_000_000);

  assert_eq!(h.client.get_address(VAULT_PUB_KEY)?, VAULT_ADDRESS);

  let expected = vec![
    Coin::new(Asset::trx(), 1_250_000_000, 6),
    Coin::new(Asset::token("USDT", USDT_CONTRACT), 300_000_000, 6),
  ];
  assert_eq!(h.client.get_account(VAULT_ADDRESS).await?, expected);
  assert_eq!(h.client.get_account(&address::to_hex(VAULT_ADDRESS)?).await?, expected);
  assert_eq!(h.client.get_account_by_pub_key(VAULT_PUB_KEY).await?, expected);

  let empty = h.client.get_account(USER_ADDRESS).await?;
  assert!(empty.iter().all(|c| c.amount == 0));
  Ok(())
}

#[tokio::test]
async fn client_only_serves_tron() -> eyre::Result<()> {
  let (fee_tx, _fee_rx) = mpsc::channel(1);
  let (solvency_tx, _solvency_rx) = mpsc::channel(1);
  let result = TronChainClient::new(
    ClientConfig { chain_id: "ETH".to_string(), whitelist_tokens: vec![], block_time: Duration::from_secs(6) },
    FakeTronApi::new(),
    Arc::new(FakeBridge::default()),
    Signers::default(),
    SignerCache::new(Arc::new(MemoryStore::new())),
    fee_tx,
    solvency_tx,
  )
  .await;
  assert!(matches!(result, Err(AppError::Config(_))));
  Ok(())
}

#[tokio::test]
async fn whitelist_is_resolved_on_chain() -> eyre::Result<()> {
  let h = signing_harness(Signers::default()).await?;
  let tokens = h.client.scanner().tokens().to_vec();
  assert_eq!(tokens.len(), 1);
  assert_eq!(tokens[0].symbol, "USDT");
  assert_eq!(tokens[0].decimals, 6);
  assert_eq!(h.client.get_chain(), "TRON");
  Ok(())
}

#[tokio::test]
async fn whitelist_rejects_decimals_beyond_u128_scale() -> eyre::Result<()> {
  let api = FakeTronApi::new();
  api.add_token(USDT_CONTRACT, "WEIRD", 50);
  let res = harness(api, Arc::new(FakeBridge::default()), vec![USDT_CONTRACT.to_string()], Signers::default()).await;
  assert!(matches!(res, Err(AppError::Decode(_))));

  let api = FakeTronApi::new();
  api.add_token(USDT_CONTRACT, "WIDE", 38);
  let h = harness(api, Arc::new(FakeBridge::default()), vec![USDT_CONTRACT.to_string()], Signers::default()).await?;
  assert_eq!(h.client.scanner().tokens()[0].decimals, 38);
  Ok(())
}
