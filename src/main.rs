// src/main.rs
/**
* date: 2025. 6. 5.
* description: Entry point of the TRON bifrost observer.
**/

use tron_bifrost::bridge::{coins_to_string, HttpBridge, ThorchainBridge};
use tron_bifrost::chain_client::{ClientConfig, Signers, TronChainClient};
use tron_bifrost::coin::tron::client::{TronApi, TronClient};
use tron_bifrost::config::Settings;
use tron_bifrost::fetcher::runner::{run_fetcher, RunnerConfig};
use tron_bifrost::respository::open_store;
use tron_bifrost::shutdown::cancel_on_signal;
use tron_bifrost::signer::{KeyManager, LocalKeyManager, SignerCache};
use tron_bifrost::tasks::{run_solvency_checker, SolvencyCheckerConfig};
use tron_bifrost::types::{AppError, NetworkFeeReceiver, SolvencyReceiver, TxInReceiver};

use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), AppError> {
  // 1. Initialize logging
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  info!("Application starting...");

  // 2. Load configuration
  let settings = Settings::new().map_err(|e| AppError::Config(e.to_string()))?;
  let scanner_cfg = settings.tron.block_scanner.clone();
  info!("Configuration loaded.");

  // 3. Store for the scan cursor and signer cache
  let store = open_store(scanner_cfg.db_path.as_deref(), &scanner_cfg.chain_id)?;

  // 4. Create API clients
  let api: Arc<dyn TronApi> = Arc::new(TronClient::new(
    settings.tron.api_host.clone(),
    settings.tron.rpc_host.clone(),
    scanner_cfg.http_request_timeout(),
  )?);
  let bridge: Arc<dyn ThorchainBridge> = Arc::new(HttpBridge::new(
    settings.bridge.api_host.clone(),
    scanner_cfg.http_request_timeout(),
  )?);

  let mut signers = Signers::default();
  if let Some(key) = settings.tron.local_private_key.as_deref() {
    let km = LocalKeyManager::from_hex(key)?;
    info!("Local key manager enabled for {}", km.pub_key());
    signers.local = Some(Arc::new(km));
  }

  // 5. Channels
  let (tx_in_sender, tx_in_receiver) = mpsc::channel(128);
  let (fee_sender, fee_receiver) = mpsc::channel(16);
  let (solvency_sender, solvency_receiver) = mpsc::channel(64);

  let client = TronChainClient::new(
    ClientConfig {
      chain_id: settings.tron.chain_id.clone(),
      whitelist_tokens: scanner_cfg.whitelist_tokens.clone(),
      block_time: Duration::from_secs(settings.bridge.block_time_secs),
    },
    api,
    bridge.clone(),
    signers,
    SignerCache::new(store.clone()),
    fee_sender,
    solvency_sender,
  )
  .await?;
  let scanner = client.scanner();

  // 6. Spawn workers
  let token = CancellationToken::new();
  let scanner_handle = tokio::spawn(run_fetcher(
    scanner.clone(),
    tx_in_sender,
    store,
    RunnerConfig {
      start_height: scanner_cfg.start_block_height,
      interval: Duration::from_secs(scanner_cfg.block_interval_secs),
      max_healthy_lag: scanner_cfg.max_healthy_lag,
    },
    token.clone(),
  ));
  let solvency_handle = tokio::spawn(run_solvency_checker(
    scanner,
    bridge,
    SolvencyCheckerConfig {
      enabled: true,
      check_interval_secs: settings.solvency.check_interval_secs,
    },
    token.clone(),
  ));
  let observer_handle = tokio::spawn(log_observations(tx_in_receiver, fee_receiver, solvency_receiver));

  // 7. Wait for shutdown signal
  cancel_on_signal(token).await;
  info!("Shutdown signal received. Waiting for tasks to finish...");

  // 8. Gracefully wait; the observer ends once every sender is dropped
  scanner_handle.await?;
  solvency_handle.await?;
  drop(client);
  observer_handle.await?;

  info!("Application exited cleanly.");
  Ok(())
}

/// Outbound posting to the protocol chain is not wired in this binary; observations are logged.
async fn log_observations(
  mut tx_in: TxInReceiver,
  mut fees: NetworkFeeReceiver,
  mut solvency: SolvencyReceiver,
) {
  let (mut tx_open, mut fee_open, mut solvency_open) = (true, true, true);
  while tx_open || fee_open || solvency_open {
    tokio::select! {
      msg = tx_in.recv(), if tx_open => match msg {
        Some(batch) => {
          for item in &batch.tx_array {
            info!(
              "[Observer] {} block {}: {} -> {} [{}] memo {:?}",
              item.tx, item.block_height, item.sender, item.to, coins_to_string(&item.coins), item.memo
            );
          }
        }
        None => tx_open = false,
      },
      msg = fees.recv(), if fee_open => match msg {
        Some(fee) => info!("[Observer] network fee at {}: rate {} size {}", fee.height, fee.transaction_rate, fee.transaction_size),
        None => fee_open = false,
      },
      msg = solvency.recv(), if solvency_open => match msg {
        Some(s) => warn!("[Observer] solvency {} at {}: solvent={} [{}]", s.pub_key, s.height, s.solvent, coins_to_string(&s.coins)),
        None => solvency_open = false,
      },
    }
  }
}
