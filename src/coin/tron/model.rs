use serde::{Deserialize, Serialize};

pub const TRANSFER_CONTRACT: &str = "TransferContract";
pub const TRIGGER_SMART_CONTRACT: &str = "TriggerSmartContract";
pub const CONTRACT_RET_SUCCESS: &str = "SUCCESS";

// ====== Blocks ======

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TronBlock {
    #[serde(rename = "blockID", default)]
    pub block_id: String,
    #[serde(default)]
    pub block_header: Option<BlockHeader>,
    #[serde(default)]
    pub transactions: Vec<TronTransaction>,
}

impl TronBlock {
    pub fn height(&self) -> i64 {
        self.block_header.as_ref().map(|h| h.raw_data.number).unwrap_or(0)
    }

    pub fn timestamp(&self) -> i64 {
        self.block_header.as_ref().map(|h| h.raw_data.timestamp).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockHeader {
    pub raw_data: BlockHeaderRawData,
    #[serde(default)]
    pub witness_signature: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockHeaderRawData {
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "txTrieRoot", default)]
    pub tx_trie_root: String,
    #[serde(rename = "parentHash", default)]
    pub parent_hash: String,
    #[serde(default)]
    pub witness_address: String,
}

// ====== Transactions ======

/// Wallet-API representation of a transaction. Serializes back to the exact shape
/// `broadcasttransaction` expects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(rename = "txID", default)]
    pub tx_id: String,
    #[serde(default)]
    pub raw_data: TronTransactionRawData,
    #[serde(default)]
    pub raw_data_hex: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ret: Vec<TransactionRet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRet {
    #[serde(rename = "contractRet", default, skip_serializing_if = "Option::is_none")]
    pub contract_ret: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronTransactionRawData {
    #[serde(default)]
    pub contract: Vec<TronContract>,
    #[serde(default)]
    pub ref_block_bytes: String,
    #[serde(default)]
    pub ref_block_hash: String,
    #[serde(default)]
    pub expiration: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronContract {
    pub parameter: TronContractParameter,
    #[serde(rename = "type")]
    pub contract_type: String,
    #[serde(rename = "Permission_id", default, skip_serializing_if = "Option::is_none")]
    pub permission_id: Option<i32>,
}

/// `value` stays untyped so the contract survives a decode/encode pass untouched;
/// typed views are taken with `serde_json::from_value` when needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TronContractParameter {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub type_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferContractValue {
    #[serde(default)]
    pub amount: i64,
    pub owner_address: String,
    pub to_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerSmartContractValue {
    #[serde(default)]
    pub data: String,
    pub owner_address: String,
    pub contract_address: String,
    #[serde(default)]
    pub call_value: i64,
}

// ====== Responses ======

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub fee: i64,
    #[serde(rename = "blockNumber", default)]
    pub block_number: i64,
    #[serde(default)]
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub energy_usage_total: i64,
    #[serde(default)]
    pub energy_penalty_total: i64,
    #[serde(default)]
    pub net_usage: i64,
    #[serde(default)]
    pub net_fee: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub address: String,
    /// Omitted by the node for empty accounts.
    #[serde(default)]
    pub balance: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTransactionResponse {
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub transaction: TronTransaction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractCallResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerSmartContractResponse {
    #[serde(default)]
    pub result: ContractCallResult,
    #[serde(default)]
    pub transaction: Option<TronTransaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateEnergyResponse {
    #[serde(default)]
    pub result: ContractCallResult,
    #[serde(default)]
    pub energy_required: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BroadcastResponse {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub txid: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainParametersResponse {
    #[serde(rename = "chainParameter", default)]
    pub chain_parameter: Vec<ChainParameterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainParameterEntry {
    pub key: String,
    #[serde(default)]
    pub value: i64,
}

/// The three fee rates the fee engine needs, in sun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParameters {
    pub memo_fee: i64,
    pub energy_fee: i64,
    pub bandwidth_fee: i64,
}

// ====== JSON-RPC ======

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}
