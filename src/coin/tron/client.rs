use crate::coin::coin_trait::BlockchainClient;
use crate::coin::tron::model::{
    Account, BroadcastResponse, ChainParameters, ChainParametersResponse, CreateTransactionResponse,
    EstimateEnergyResponse, RpcRequest, RpcResponse, TransactionInfo, TriggerSmartContractResponse, TronBlock,
    TronTransaction,
};
use crate::types::AppError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const MEMO_FEE_KEY: &str = "getMemoFee";
const ENERGY_FEE_KEY: &str = "getEnergyFee";
const BANDWIDTH_FEE_KEY: &str = "getTransactionFee";

/// Wallet API and JSON-RPC surface of a TRON full node. One call, one request; no retries.
#[async_trait]
pub trait TronApi: Send + Sync {
    async fn get_latest_block(&self) -> Result<TronBlock, AppError>;
    async fn get_block(&self, height: i64) -> Result<TronBlock, AppError>;
    async fn get_transaction_info(&self, hash: &str) -> Result<TransactionInfo, AppError>;
    async fn get_balance(&self, address: &str) -> Result<u64, AppError>;
    async fn get_account(&self, address: &str) -> Result<Account, AppError>;
    async fn create_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        memo: &str,
    ) -> Result<TronTransaction, AppError>;
    async fn trigger_smart_contract(
        &self,
        from: &str,
        contract: &str,
        selector: &str,
        parameter: &str,
        fee_limit: u64,
    ) -> Result<TronTransaction, AppError>;
    async fn broadcast_transaction(&self, tx: &[u8]) -> Result<BroadcastResponse, AppError>;
    async fn get_chain_parameters(&self) -> Result<ChainParameters, AppError>;
    async fn estimate_energy(
        &self,
        from: &str,
        contract: &str,
        selector: &str,
        parameter: &str,
    ) -> Result<i64, AppError>;
    async fn eth_call(&self, contract: &str, data: &str) -> Result<RpcResponse, AppError>;
}

#[derive(Clone)]
pub struct TronClient {
    client: Client,
    api_url: String,
    rpc_url: String,
}

impl TronClient {
    pub fn new(api_url: String, rpc_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, api_url, rpc_url })
    }

    async fn rpc<T: serde::de::DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T, AppError> {
        let request = RpcRequest { jsonrpc: "2.0", method, params, id: 1 };
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("{} {} failed: {}", method, self.rpc_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!("{} {} returned status {}", method, self.rpc_url, status)));
        }
        let body = response.text().await.map_err(|e| AppError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| AppError::Decode(format!("invalid JSON-RPC answer to {}: {}", method, e)))
    }
}

#[async_trait]
impl BlockchainClient for TronClient {
    fn get_http_client(&self) -> &Client {
        &self.client
    }

    fn get_api_url(&self) -> &str {
        &self.api_url
    }
}

/// Node error messages arrive hex encoded more often than not.
pub fn decode_node_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .unwrap_or_else(|| message.to_string())
}

pub fn chain_parameters_from(resp: &ChainParametersResponse) -> Result<ChainParameters, AppError> {
    let lookup = |key: &str| {
        resp.chain_parameter
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value)
            .ok_or_else(|| AppError::Parameter(format!("chain parameter {} missing", key)))
    };
    Ok(ChainParameters {
        memo_fee: lookup(MEMO_FEE_KEY)?,
        energy_fee: lookup(ENERGY_FEE_KEY)?,
        bandwidth_fee: lookup(BANDWIDTH_FEE_KEY)?,
    })
}

#[async_trait]
impl TronApi for TronClient {
    async fn get_latest_block(&self) -> Result<TronBlock, AppError> {
        let block: TronBlock = self.post_json("/wallet/getnowblock", &json!({ "visible": true })).await?;
        if block.block_id.is_empty() {
            return Err(AppError::Parameter("getnowblock returned no blockID".to_string()));
        }
        Ok(block)
    }

    async fn get_block(&self, height: i64) -> Result<TronBlock, AppError> {
        // TRON API: /wallet/getblockbynum
        let block: TronBlock = self
            .post_json("/wallet/getblockbynum", &json!({ "num": height, "visible": true }))
            .await?;
        // unknown heights come back as `{}`
        if block.block_id.is_empty() {
            return Err(AppError::Transport(format!("block {} not found", height)));
        }
        debug!("[TRON Client] block {} has {} transactions", height, block.transactions.len());
        Ok(block)
    }

    async fn get_transaction_info(&self, hash: &str) -> Result<TransactionInfo, AppError> {
        self.post_json("/wallet/gettransactioninfobyid", &json!({ "value": hash, "visible": true }))
            .await
    }

    async fn get_balance(&self, address: &str) -> Result<u64, AppError> {
        Ok(self.get_account(address).await?.balance)
    }

    async fn get_account(&self, address: &str) -> Result<Account, AppError> {
        self.post_json("/wallet/getaccount", &json!({ "address": address, "visible": true }))
            .await
    }

    async fn create_transaction(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        memo: &str,
    ) -> Result<TronTransaction, AppError> {
        let mut payload = json!({
            "owner_address": from,
            "to_address": to,
            "amount": amount,
            "visible": true,
        });
        if !memo.is_empty() {
            payload["extra_data"] = json!(hex::encode(memo));
        }

        let resp: CreateTransactionResponse = self.post_json("/wallet/createtransaction", &payload).await?;
        if let Some(err) = resp.error {
            return Err(AppError::Parameter(format!("createtransaction rejected: {}", err)));
        }
        if resp.transaction.tx_id.is_empty() || resp.transaction.raw_data_hex.is_empty() {
            return Err(AppError::Parameter("createtransaction returned no txID".to_string()));
        }
        Ok(resp.transaction)
    }

    async fn trigger_smart_contract(
        &self,
        from: &str,
        contract: &str,
        selector: &str,
        parameter: &str,
        fee_limit: u64,
    ) -> Result<TronTransaction, AppError> {
        let payload = json!({
            "owner_address": from,
            "contract_address": contract,
            "function_selector": selector,
            "parameter": parameter,
            "fee_limit": fee_limit,
            "call_value": 0,
            "visible": true,
        });

        let resp: TriggerSmartContractResponse = self.post_json("/wallet/triggersmartcontract", &payload).await?;
        if !resp.result.result {
            let message = resp.result.message.as_deref().map(decode_node_message).unwrap_or_default();
            return Err(AppError::Parameter(format!(
                "triggersmartcontract rejected: {} {}",
                resp.result.code.unwrap_or_default(),
                message
            )));
        }
        resp.transaction
            .filter(|tx| !tx.tx_id.is_empty())
            .ok_or_else(|| AppError::Parameter("triggersmartcontract returned no transaction".to_string()))
    }

    async fn broadcast_transaction(&self, tx: &[u8]) -> Result<BroadcastResponse, AppError> {
        let transaction: serde_json::Value = serde_json::from_slice(tx)?;
        let resp: BroadcastResponse = self.post_json("/wallet/broadcasttransaction", &transaction).await?;
        if !resp.result {
            return Err(AppError::Broadcast(format!(
                "{} {}",
                resp.code.unwrap_or_default(),
                resp.message.as_deref().map(decode_node_message).unwrap_or_default()
            )));
        }
        Ok(resp)
    }

    async fn get_chain_parameters(&self) -> Result<ChainParameters, AppError> {
        let resp: ChainParametersResponse = self.get_json("/wallet/getchainparameters").await?;
        chain_parameters_from(&resp)
    }

    async fn estimate_energy(
        &self,
        from: &str,
        contract: &str,
        selector: &str,
        parameter: &str,
    ) -> Result<i64, AppError> {
        let payload = json!({
            "owner_address": from,
            "contract_address": contract,
            "function_selector": selector,
            "parameter": parameter,
            "visible": true,
        });
        let resp: EstimateEnergyResponse = self.post_json("/wallet/estimateenergy", &payload).await?;
        if !resp.result.result {
            let message = resp.result.message.as_deref().map(decode_node_message).unwrap_or_default();
            return Err(AppError::Parameter(format!("estimateenergy rejected: {}", message)));
        }
        resp.energy_required
            .ok_or_else(|| AppError::Parameter("estimateenergy returned no energy_required".to_string()))
    }

    async fn eth_call(&self, contract: &str, data: &str) -> Result<RpcResponse, AppError> {
        let params = json!([
            {
                "from": contract,
                "to": contract,
                "gas": "0x0",
                "gasPrice": "0x0",
                "value": "0x0",
                "data": data,
            },
            "latest"
        ]);
        self.rpc("eth_call", params).await
    }
}
