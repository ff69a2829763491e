//! Transaction re-hashing and the slice of the ERC-20 ABI that TRC-20 transfers need.

use crate::coin::tron::address;
use crate::coin::tron::model::TronTransaction;
use crate::coin::tron::proto::TransactionRaw;
use crate::types::AppError;
use prost::Message;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

pub const TRANSFER_METHOD: &str = "transfer(address,uint256)";
pub const BALANCE_OF_METHOD: &str = "balanceOf(address)";
pub const SYMBOL_METHOD: &str = "symbol()";
pub const DECIMALS_METHOD: &str = "decimals()";

const WORD: usize = 32;
const SELECTOR_LEN: usize = 4;

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// First four bytes of Keccak-256 over the canonical method signature.
pub fn selector(method: &str) -> [u8; SELECTOR_LEN] {
    let digest = Keccak256::digest(method.as_bytes());
    let mut out = [0u8; SELECTOR_LEN];
    out.copy_from_slice(&digest[..SELECTOR_LEN]);
    out
}

/// Re-encodes `raw_data_hex` after `timestamp`, `expiration`, `ref_block_bytes`,
/// `ref_block_hash` or `data` changed in the JSON `raw_data`, and recomputes the tx id.
/// Every other protobuf field is carried over as decoded.
pub fn rehash(tx: &mut TronTransaction) -> Result<(), AppError> {
    let raw_bytes = hex::decode(&tx.raw_data_hex)?;
    let mut raw = TransactionRaw::decode(raw_bytes.as_slice())?;

    raw.timestamp = tx.raw_data.timestamp;
    raw.expiration = tx.raw_data.expiration;
    raw.ref_block_bytes = hex::decode(&tx.raw_data.ref_block_bytes)?;
    raw.ref_block_hash = hex::decode(&tx.raw_data.ref_block_hash)?;
    raw.data = hex::decode(&tx.raw_data.data)?;

    let encoded = raw.encode_to_vec();
    tx.raw_data_hex = hex::encode(&encoded);
    tx.tx_id = sha256_hex(&encoded);
    Ok(())
}

/// `ref_block_bytes`: bytes 6..8 of the big-endian 8-byte height.
pub fn ref_block_bytes(height: i64) -> String {
    let padded = format!("{:016x}", height);
    padded[12..16].to_string()
}

/// `ref_block_hash`: bytes 8..16 of the block id.
pub fn ref_block_hash(block_id: &str) -> Result<String, AppError> {
    block_id
        .get(16..32)
        .map(str::to_string)
        .ok_or_else(|| AppError::Decode(format!("block id too short: {}", block_id)))
}

fn address_word(addr: &str) -> Result<[u8; WORD], AppError> {
    let evm = address::to_evm_hex(addr)?;
    let raw = hex::decode(&evm[2..])?;
    let mut word = [0u8; WORD];
    word[WORD - raw.len()..].copy_from_slice(&raw);
    Ok(word)
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Full call data for `transfer(to, amount)`, selector included.
pub fn encode_transfer(to: &str, amount: u128) -> Result<Vec<u8>, AppError> {
    let mut out = selector(TRANSFER_METHOD).to_vec();
    out.extend_from_slice(&address_word(to)?);
    out.extend_from_slice(&uint_word(amount));
    Ok(out)
}

/// Full call data for `balanceOf(owner)`.
pub fn encode_balance_of(owner: &str) -> Result<Vec<u8>, AppError> {
    let mut out = selector(BALANCE_OF_METHOD).to_vec();
    out.extend_from_slice(&address_word(owner)?);
    Ok(out)
}

/// Decoded `transfer(address,uint256)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trc20Transfer {
    pub to: String,
    pub amount: u128,
}

/// Decodes TRC-20 call data. Calls to any method other than `transfer` give `Ok(None)`.
pub fn decode_trc20_input(data_hex: &str) -> Result<Option<Trc20Transfer>, AppError> {
    let data = hex::decode(data_hex.trim_start_matches("0x"))?;
    if data.len() < SELECTOR_LEN {
        return Err(AppError::Decode(format!("call data too short: {} bytes", data.len())));
    }
    if data[..SELECTOR_LEN] != selector(TRANSFER_METHOD) {
        return Ok(None);
    }

    let args = &data[SELECTOR_LEN..];
    if args.len() < 2 * WORD {
        return Err(AppError::Decode(format!("transfer arguments too short: {} bytes", args.len())));
    }
    let to = address::from_evm_bytes(&args[12..WORD])?;
    let amount = decode_uint256(&args[WORD..2 * WORD])?;
    Ok(Some(Trc20Transfer { to, amount }))
}

/// Big-endian uint256 that must fit in 128 bits.
pub fn decode_uint256(word: &[u8]) -> Result<u128, AppError> {
    if word.len() != WORD {
        return Err(AppError::Decode(format!("expected 32-byte word, got {}", word.len())));
    }
    if word[..WORD - 16].iter().any(|b| *b != 0) {
        return Err(AppError::Decode("uint256 value exceeds 128 bits".to_string()));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[WORD - 16..]);
    Ok(u128::from_be_bytes(low))
}

/// `eth_call` result (`0x...`) holding a single uint256.
pub fn decode_uint256_result(result_hex: &str) -> Result<u128, AppError> {
    let raw = hex::decode(result_hex.trim_start_matches("0x"))?;
    if raw.is_empty() {
        return Ok(0);
    }
    if raw.len() < WORD {
        return Err(AppError::Decode(format!("short uint256 result: {}", result_hex)));
    }
    decode_uint256(&raw[..WORD])
}

fn abi_usize(word: u128) -> Result<usize, AppError> {
    usize::try_from(word).map_err(|_| AppError::Decode(format!("ABI offset {} out of range", word)))
}

/// `eth_call` result holding a `string`, or a `bytes32` for the few old tokens that
/// return their symbol that way.
pub fn decode_string_result(result_hex: &str) -> Result<String, AppError> {
    let raw = hex::decode(result_hex.trim_start_matches("0x"))?;
    if raw.len() == WORD {
        let end = raw.iter().position(|b| *b == 0).unwrap_or(WORD);
        return String::from_utf8(raw[..end].to_vec()).map_err(|e| AppError::Decode(e.to_string()));
    }
    if raw.len() < 2 * WORD {
        return Err(AppError::Decode(format!("short string result: {}", result_hex)));
    }

    let offset = abi_usize(decode_uint256(&raw[..WORD])?)?;
    let len_end = offset
        .checked_add(WORD)
        .filter(|end| *end <= raw.len())
        .ok_or_else(|| AppError::Decode("string offset out of range".to_string()))?;
    let len = abi_usize(decode_uint256(&raw[offset..len_end])?)?;
    let end = len_end
        .checked_add(len)
        .filter(|end| *end <= raw.len())
        .ok_or_else(|| AppError::Decode("string length out of range".to_string()))?;
    String::from_utf8(raw[len_end..end].to_vec()).map_err(|e| AppError::Decode(e.to_string()))
}
