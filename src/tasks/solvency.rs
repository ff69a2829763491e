use crate::bridge::{amount_of, Asset, Coin, Solvency, ThorchainBridge, Vault, TRON_CHAIN};
use crate::fetcher::fetcher::BlockFetcher;
use crate::fetcher::tron_fetcher::TronBlockScanner;
use crate::types::SolvencySender;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;

pub const SOLVENCY_INTERVAL: i64 = 10;
pub const STOP_SOLVENCY_CHECK_MIMIR: &str = "StopSolvencyCheck";

pub fn should_report_solvency(height: i64) -> bool {
    height % SOLVENCY_INTERVAL == 0
}

pub fn stop_solvency_check_key() -> String {
    format!("{}-{}", STOP_SOLVENCY_CHECK_MIMIR, TRON_CHAIN)
}

/// A vault is solvent when, for every asset it owes, the observed balance covers the
/// committed amount plus pending outbound, plus one transaction fee for the gas asset.
/// `gas_fee` is in protocol units.
pub fn is_vault_solvent(account: &[Coin], vault: &Vault, gas_fee: u128) -> bool {
    let assets: HashSet<&Asset> = vault.coins.iter().chain(vault.pending_outbound.iter()).map(|c| &c.asset).collect();

    assets.into_iter().all(|asset| {
        let mut required = amount_of(&vault.coins, asset).saturating_add(amount_of(&vault.pending_outbound, asset));
        if asset.is_gas_asset() {
            required = required.saturating_add(gas_fee);
        }
        amount_of(account, asset) >= required
    })
}

/// Result of checking one vault.
#[derive(Debug, Clone)]
pub struct VaultCheck {
    pub pub_key: String,
    pub coins: Vec<Coin>,
    pub solvent: bool,
}

/// While the scanner is unhealthy and every vault is solvent, every vault is reported
/// solvent so the chain can unhalt. Otherwise only insolvent vaults are reported.
pub fn select_reports(height: i64, checks: Vec<VaultCheck>, scanner_healthy: bool) -> Vec<Solvency> {
    let all_solvent = checks.iter().all(|c| c.solvent);
    let unhalt = !scanner_healthy && all_solvent;

    checks
        .into_iter()
        .filter(|c| unhalt || !c.solvent)
        .map(|c| Solvency {
            height,
            chain: TRON_CHAIN.to_string(),
            pub_key: c.pub_key,
            coins: c.coins,
            solvent: c.solvent,
        })
        .collect()
}

/// Offers each report once, waiting at most `timeout`. Timed-out reports are dropped.
pub async fn push_solvency(sender: &SolvencySender, reports: Vec<Solvency>, timeout: Duration) {
    for report in reports {
        let pub_key = report.pub_key.clone();
        match tokio::time::timeout(timeout, sender.send(report)).await {
            Ok(Ok(())) => debug!("[Solvency] reported vault {}", pub_key),
            Ok(Err(e)) => error!("[Solvency] solvency queue closed, vault {}: {}", pub_key, e),
            Err(_) => warn!("[Solvency] solvency queue busy for {:?}, dropped report of {}", timeout, pub_key),
        }
    }
}

pub struct SolvencyCheckerConfig {
    pub enabled: bool,
    pub check_interval_secs: u64,
}

impl Default for SolvencyCheckerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 60,
        }
    }
}

/// Auto-unhalt path: while the scanner is stuck, keep reporting solvency from the
/// chain tip so the protocol chain can resume the chain once vaults are safe.
pub async fn run_solvency_checker(
    scanner: Arc<TronBlockScanner>,
    bridge: Arc<dyn ThorchainBridge>,
    config: SolvencyCheckerConfig,
    token: CancellationToken,
) {
    if !config.enabled {
        info!("[Solvency] Disabled by configuration, skipping...");
        return;
    }

    info!("[Solvency] Starting with check_interval: {}s", config.check_interval_secs);
    let mut check_interval = interval(Duration::from_secs(config.check_interval_secs));

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = check_interval.tick() => {}
        }

        if scanner.is_healthy() {
            continue;
        }

        match bridge.get_mimir(&stop_solvency_check_key()).await {
            Ok(v) if v > 0 => {
                debug!("[Solvency] {} is set, skipping", stop_solvency_check_key());
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                error!("[Solvency] failed to read mimir {}: {}", stop_solvency_check_key(), e);
                continue;
            }
        }

        let height = match scanner.get_height().await {
            Ok(h) => h - h.rem_euclid(SOLVENCY_INTERVAL),
            Err(e) => {
                error!("[Solvency] failed to get height: {}", e);
                continue;
            }
        };

        if let Err(e) = scanner.report_solvency(height).await {
            error!("[Solvency] report at height {} failed: {}", height, e);
        }
    }

    warn!("[Solvency] Loop exited.");
}
