/**
* filename : runner
* date: 2025. 6. 5.
* description: drives a BlockFetcher height by height, persisting the scan cursor
**/

use crate::fetcher::fetcher::BlockFetcher;
use crate::respository::{get_scan_position, set_scan_position, KeyValueStore};
use crate::bridge::TxIn;
use crate::types::{AppError, TxInSender};

use log::{error, info, warn};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;

pub struct RunnerConfig {
  /// 0 => start at the current confirmed height
  pub start_height: i64,
  pub interval: Duration,
  /// confirmed tip - cursor above which the scanner counts as unhealthy
  pub max_healthy_lag: i64,
}

pub async fn run_fetcher<F: BlockFetcher + ?Sized + 'static>(
  fetcher: Arc<F>,
  sender: TxInSender,
  store: Arc<dyn KeyValueStore>,
  config: RunnerConfig,
  token: CancellationToken,
) {
  let chain = fetcher.chain_name();
  let mut current = match resolve_start(fetcher.as_ref(), store.as_ref(), config.start_height, &token).await {
    Some(h) => h,
    None => {
      warn!("[{} Runner] Loop exited.", chain);
      return;
    }
  };

  let mut tick = interval(config.interval);
  info!("[{} Runner] Starting from block {} with interval {:?}", chain, current, config.interval);

  'outer: loop {
    tokio::select! {
      _ = token.cancelled() => break,
      _ = tick.tick() => {}
    }

    let confirmed = match fetcher.get_height().await {
      Ok(h) => h,
      Err(e) => {
        warn!("[{} Runner] failed to get height: {}", chain, e);
        fetcher.set_healthy(false);
        continue;
      }
    };

    while current <= confirmed {
      if token.is_cancelled() {
        break 'outer;
      }

      match fetcher.fetch_txs(current).await {
        Ok(tx_in) => {
          if !tx_in.tx_array.is_empty() {
            if let Err(e) = send_observations(&sender, tx_in, &token).await {
              error!("[{} Runner] Failed to send observations of block {}: {}", chain, current, e);
              break 'outer;
            }
          }
          current += 1;
          if let Err(e) = set_scan_position(store.as_ref(), chain, current).await {
            error!("[{} Runner] failed to persist scan position {}: {}", chain, current, e);
          }
          fetcher.set_healthy(confirmed - current <= config.max_healthy_lag);
        }
        Err(e) => {
          fetcher.set_healthy(false);
          let retry_delay = config.interval / 2;
          warn!("[{} Runner] block #{} failed: {} | retrying in {:?}", chain, current, e, retry_delay);
          tokio::select! {
            _ = token.cancelled() => break 'outer,
            _ = tokio::time::sleep(retry_delay) => {}
          }
        }
      }
    }
  }

  warn!("[{} Runner] Loop exited.", chain);
}

/// Blocks while the queue is full; a stop signal aborts the send.
async fn send_observations(sender: &TxInSender, tx_in: TxIn, token: &CancellationToken) -> Result<(), AppError> {
  tokio::select! {
    res = sender.send(tx_in) => Ok(res?),
    _ = token.cancelled() => Err(AppError::Cancelled),
  }
}

/// Stored cursor, else the configured height, else the current confirmed height.
/// `None` when cancelled first.
async fn resolve_start<F: BlockFetcher + ?Sized>(
  fetcher: &F,
  store: &dyn KeyValueStore,
  start_height: i64,
  token: &CancellationToken,
) -> Option<i64> {
  let chain = fetcher.chain_name();
  match get_scan_position(store, chain).await {
    Ok(Some(h)) => return Some(h),
    Ok(None) => {}
    Err(e) => error!("[{} Runner] ignoring unreadable scan position: {}", chain, e),
  }
  if start_height > 0 {
    return Some(start_height);
  }

  loop {
    match fetcher.get_height().await {
      Ok(h) => return Some(h),
      Err(e) => warn!("[{} Runner] failed to get start height: {}", chain, e),
    }
    tokio::select! {
      _ = token.cancelled() => return None,
      _ = tokio::time::sleep(Duration::from_secs(1)) => {}
    }
  }
}
