use crate::bridge::{Asset, Coin, ThorchainBridge, TxIn, TxInItem, TRON_CHAIN};
use crate::coin::tron::address;
use crate::coin::tron::client::TronApi;
use crate::coin::tron::codec;
use crate::coin::tron::model::{
    TransferContractValue, TriggerSmartContractValue, TronTransaction, CONTRACT_RET_SUCCESS, TRANSFER_CONTRACT,
    TRIGGER_SMART_CONTRACT,
};
use crate::coin::tron::token::{self, WhitelistToken};
use crate::coin::tron::utils::{convert_decimals, sun_to_protocol, PROTOCOL_DECIMALS, TRX_DECIMALS};
use crate::fetcher::fee::FeeEngine;
use crate::fetcher::fetcher::BlockFetcher;
use crate::tasks::solvency::{self, VaultCheck};
use crate::types::{AppError, NetworkFeeSender, SolvencySender};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Blocks behind the tip before a block is trusted.
pub const CONFIRMATION_BLOCKS: i64 = 19;
pub const REF_BLOCKS_MAX: usize = 10;
pub const REF_BLOCK_INTERVAL: i64 = 25;
pub const UPDATE_GAS_INTERVAL: i64 = 30;

/// A recent block new transactions are bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefBlock {
    /// ms since epoch
    pub timestamp: i64,
    pub height: i64,
    pub block_id: String,
}

pub type RefBlockRing = Arc<RwLock<VecDeque<RefBlock>>>;

/// Inserts `block` keeping the ring sorted by height and at most `REF_BLOCKS_MAX` long.
pub fn push_ref_block(ring: &mut VecDeque<RefBlock>, block: RefBlock) {
    if ring.iter().any(|b| b.height == block.height) {
        return;
    }
    ring.push_back(block);
    ring.make_contiguous().sort_by_key(|b| b.height);
    while ring.len() > REF_BLOCKS_MAX {
        ring.pop_front();
    }
}

pub struct TronBlockScanner {
    api: Arc<dyn TronApi>,
    bridge: Arc<dyn ThorchainBridge>,
    tokens: Vec<WhitelistToken>,
    ref_blocks: RefBlockRing,
    fee: FeeEngine,
    solvency_sender: SolvencySender,
    block_time: Duration,
    healthy: AtomicBool,
    previous_height: AtomicI64,
}

impl TronBlockScanner {
    pub fn new(
        api: Arc<dyn TronApi>,
        bridge: Arc<dyn ThorchainBridge>,
        tokens: Vec<WhitelistToken>,
        network_fee_sender: NetworkFeeSender,
        solvency_sender: SolvencySender,
        block_time: Duration,
    ) -> Self {
        let fee = FeeEngine::new(api.clone(), bridge.clone(), tokens.clone(), network_fee_sender);
        Self {
            api,
            bridge,
            tokens,
            ref_blocks: Arc::new(RwLock::new(VecDeque::with_capacity(REF_BLOCKS_MAX + 1))),
            fee,
            solvency_sender,
            block_time,
            healthy: AtomicBool::new(true),
            previous_height: AtomicI64::new(0),
        }
    }

    pub fn tokens(&self) -> &[WhitelistToken] {
        &self.tokens
    }

    pub fn api(&self) -> Arc<dyn TronApi> {
        self.api.clone()
    }

    /// Current fee in sun.
    pub fn current_fee(&self) -> u64 {
        self.fee.current_fee()
    }

    pub fn fee_engine(&self) -> &FeeEngine {
        &self.fee
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn previous_height(&self) -> i64 {
        self.previous_height.load(Ordering::SeqCst)
    }

    /// Copy of the reference-block ring, oldest first.
    pub async fn ref_blocks(&self) -> Vec<RefBlock> {
        self.ref_blocks.read().await.iter().cloned().collect()
    }

    pub async fn add_ref_block(&self, block: RefBlock) {
        let mut ring = self.ref_blocks.write().await;
        push_ref_block(&mut ring, block);
    }

    /// TRX balance plus the balance of every whitelisted token, in protocol units.
    pub async fn account_coins(&self, addr: &str) -> Result<Vec<Coin>, AppError> {
        let balance = self.api.get_balance(addr).await?;
        let mut coins = vec![Coin::new(Asset::trx(), sun_to_protocol(u128::from(balance)), TRX_DECIMALS)];

        for t in &self.tokens {
            let data = format!("0x{}", hex::encode(codec::encode_balance_of(addr)?));
            let result = token::call_data(self.api.as_ref(), &address::to_evm_hex(&t.contract)?, &data).await?;
            let amount = codec::decode_uint256_result(&result)?;
            coins.push(Coin::new(
                t.asset(),
                convert_decimals(amount, t.decimals, PROTOCOL_DECIMALS),
                t.decimals,
            ));
        }
        Ok(coins)
    }

    /// Ingest filter for one transaction. `Ok(None)` means "not ours".
    pub async fn process_tx(&self, tx: &TronTransaction, height: i64) -> Result<Option<TxInItem>, AppError> {
        if tx.raw_data.contract.len() != 1 {
            debug!("[TRON Scanner] tx {} has {} contracts, skipping", tx.tx_id, tx.raw_data.contract.len());
            return Ok(None);
        }
        match tx.ret.first() {
            None => {
                warn!("[TRON Scanner] tx {} has no result, skipping", tx.tx_id);
                return Ok(None);
            }
            Some(ret) if ret.contract_ret.as_deref() != Some(CONTRACT_RET_SUCCESS) => return Ok(None),
            Some(_) => {}
        }

        let contract = &tx.raw_data.contract[0];
        let (sender, to, coin) = match contract.contract_type.as_str() {
            TRANSFER_CONTRACT => {
                let value: TransferContractValue = serde_json::from_value(contract.parameter.value.clone())?;
                if value.amount < 0 {
                    return Err(AppError::Decode(format!("negative amount in {}", tx.tx_id)));
                }
                let coin = Coin::new(Asset::trx(), sun_to_protocol(value.amount as u128), TRX_DECIMALS);
                (address::to_base58(&value.owner_address)?, address::to_base58(&value.to_address)?, coin)
            }
            TRIGGER_SMART_CONTRACT => {
                let value: TriggerSmartContractValue = serde_json::from_value(contract.parameter.value.clone())?;
                let contract_address = address::to_base58(&value.contract_address)?;
                let t = match token::find_by_contract(&self.tokens, &contract_address) {
                    Some(t) => t,
                    None => return Ok(None),
                };
                let transfer = match codec::decode_trc20_input(&value.data)? {
                    Some(transfer) => transfer,
                    None => {
                        debug!("[TRON Scanner] tx {} calls a method other than transfer, skipping", tx.tx_id);
                        return Ok(None);
                    }
                };
                let coin = Coin::new(
                    t.asset(),
                    convert_decimals(transfer.amount, t.decimals, PROTOCOL_DECIMALS),
                    t.decimals,
                );
                (address::to_base58(&value.owner_address)?, transfer.to, coin)
            }
            _ => return Ok(None),
        };

        let memo = String::from_utf8(hex::decode(&tx.raw_data.data)?)
            .map_err(|e| AppError::Decode(format!("memo of {} is not UTF-8: {}", tx.tx_id, e)))?;
        let memo = memo.trim();
        if memo.is_empty() {
            return Ok(None);
        }

        let info = self.api.get_transaction_info(&tx.tx_id).await?;
        let gas = sun_to_protocol(info.fee.max(0) as u128).max(1);

        Ok(Some(TxInItem {
            tx: tx.tx_id.clone(),
            block_height: height,
            sender,
            to,
            coins: vec![coin],
            gas: vec![Coin::new(Asset::trx(), gas, TRX_DECIMALS)],
            memo: memo.to_string(),
        }))
    }

    /// Reports vault solvency at `height` (see `tasks::solvency`).
    pub async fn report_solvency(&self, height: i64) -> Result<(), AppError> {
        if !solvency::should_report_solvency(height) {
            return Ok(());
        }
        let healthy = self.is_healthy();
        // while unhealthy only the auto-unhalt runner reports
        if !healthy && height == self.previous_height() + 1 {
            return Ok(());
        }

        let gas_fee = sun_to_protocol(u128::from(self.current_fee()));
        let mut checks = Vec::new();
        for vault in self.bridge.get_asgards().await? {
            let addr = match address::address_from_pub_key_hex(&vault.pub_key) {
                Ok(addr) => addr,
                Err(e) => {
                    warn!("[Solvency] cannot derive address of vault {}: {}", vault.pub_key, e);
                    continue;
                }
            };
            let coins = match self.account_coins(&addr).await {
                Ok(coins) => coins,
                Err(e) => {
                    error!("[Solvency] failed to read account {} of vault {}: {}", addr, vault.pub_key, e);
                    continue;
                }
            };
            let solvent = solvency::is_vault_solvent(&coins, &vault, gas_fee);
            if !solvent {
                warn!("[Solvency] vault {} ({}) is insolvent at height {}", vault.pub_key, addr, height);
            }
            checks.push(VaultCheck { pub_key: vault.pub_key, coins, solvent });
        }

        let reports = solvency::select_reports(height, checks, healthy);
        solvency::push_solvency(&self.solvency_sender, reports, self.block_time).await;
        Ok(())
    }
}

#[async_trait]
impl BlockFetcher for TronBlockScanner {
    async fn get_height(&self) -> Result<i64, AppError> {
        let tip = self.api.get_latest_block().await?.height();
        Ok((tip - CONFIRMATION_BLOCKS).max(0))
    }

    async fn fetch_txs(&self, height: i64) -> Result<TxIn, AppError> {
        let block = self.api.get_block(height).await?;

        let mut tx_array = Vec::new();
        for tx in &block.transactions {
            match self.process_tx(tx, height).await {
                Ok(Some(item)) => tx_array.push(item),
                Ok(None) => {}
                Err(e) => warn!("[TRON Scanner] skipping tx {} in block {}: {}", tx.tx_id, height, e),
            }
        }

        if height % REF_BLOCK_INTERVAL == 0 {
            self.add_ref_block(RefBlock {
                timestamp: block.timestamp(),
                height,
                block_id: block.block_id.clone(),
            })
            .await;
        }

        if height % UPDATE_GAS_INTERVAL == 0 {
            if let Err(e) = self.fee.update(height).await {
                error!("[FeeEngine] fee refresh at height {} failed: {}", height, e);
            }
        }

        if let Err(e) = self.report_solvency(height).await {
            error!("[Solvency] report at height {} failed: {}", height, e);
        }
        self.previous_height.store(height, Ordering::SeqCst);

        if !tx_array.is_empty() {
            info!("[TRON Scanner] block {}: {} inbound transfers", height, tx_array.len());
        }
        Ok(TxIn {
            chain: TRON_CHAIN.to_string(),
            tx_array,
            filtered: false,
            mem_pool: false,
        })
    }

    fn set_healthy(&self, healthy: bool) {
        let was = self.healthy.swap(healthy, Ordering::SeqCst);
        if was != healthy {
            info!("[TRON Scanner] healthy: {} -> {}", was, healthy);
        }
    }

    fn chain_name(&self) -> &'static str {
        TRON_CHAIN
    }
}
