//! TRON address handling: base58check <-> hex, EVM-style views and key derivation.

use crate::types::AppError;
use bech32::FromBase32;
use secp256k1::PublicKey;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

pub const ADDRESS_HEX_PREFIX: &str = "41";
pub const ADDRESS_BASE58_LEN: usize = 34;
pub const ADDRESS_HEX_LEN: usize = 42;
const CHECKSUM_LEN: usize = 4;
/// Amino prefix in front of a secp256k1 key inside a bech32 `thorpub1...` string.
const AMINO_SECP256K1_PREFIX: [u8; 5] = [0xeb, 0x5a, 0xe9, 0x87, 0x21];

/// First four bytes of SHA-256(SHA-256(payload)).
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&second[..CHECKSUM_LEN]);
    out
}

/// Converts between the two TRON address forms.
///
/// A 34-char input is read as base58check and returned as lower-case hex (`41...`).
/// A 42-char input is read as hex; a leading `0x` is rewritten to the mainnet
/// version byte `41` first. Anything else is rejected.
pub fn convert(addr: &str) -> Result<String, AppError> {
    match addr.len() {
        ADDRESS_BASE58_LEN => base58_to_hex(addr),
        ADDRESS_HEX_LEN => hex_to_base58(addr),
        n => Err(AppError::InvalidAddress(format!("{} (length {})", addr, n))),
    }
}

fn base58_to_hex(addr: &str) -> Result<String, AppError> {
    let decoded = bs58::decode(addr)
        .into_vec()
        .map_err(|e| AppError::InvalidAddress(format!("{}: {}", addr, e)))?;
    if decoded.len() <= CHECKSUM_LEN {
        return Err(AppError::InvalidAddress(format!("{}: too short", addr)));
    }

    let (payload, check) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if checksum(payload) != check {
        return Err(AppError::InvalidAddress(format!("{}: bad checksum", addr)));
    }
    Ok(hex::encode(payload))
}

fn hex_to_base58(addr: &str) -> Result<String, AppError> {
    let normalized = match addr.strip_prefix("0x") {
        Some(rest) => format!("{}{}", ADDRESS_HEX_PREFIX, rest),
        None => addr.to_string(),
    };
    let mut raw = hex::decode(&normalized).map_err(|e| AppError::InvalidAddress(format!("{}: {}", addr, e)))?;
    let check = checksum(&raw);
    raw.extend_from_slice(&check);
    Ok(bs58::encode(raw).into_string())
}

/// Base58 form of either representation.
pub fn to_base58(addr: &str) -> Result<String, AppError> {
    if addr.len() == ADDRESS_BASE58_LEN {
        // validate while keeping the caller's spelling
        base58_to_hex(addr)?;
        return Ok(addr.to_string());
    }
    convert(addr)
}

/// Canonical lower-case hex form (`41...`) of either representation.
pub fn to_hex(addr: &str) -> Result<String, AppError> {
    if addr.len() == ADDRESS_HEX_LEN {
        return convert(addr).and_then(|b58| convert(&b58));
    }
    convert(addr)
}

/// EVM-style `0x` + 20-byte hex, as ABI encoders and `eth_call` expect.
pub fn to_evm_hex(addr: &str) -> Result<String, AppError> {
    let hex_form = to_hex(addr)?;
    Ok(format!("0x{}", &hex_form[ADDRESS_HEX_PREFIX.len()..]))
}

/// Base58 address for a bare 20-byte account id (e.g. an ABI-decoded `address`).
pub fn from_evm_bytes(account: &[u8]) -> Result<String, AppError> {
    if account.len() != 20 {
        return Err(AppError::InvalidAddress(format!("expected 20 bytes, got {}", account.len())));
    }
    convert(&format!("{}{}", ADDRESS_HEX_PREFIX, hex::encode(account)))
}

/// Address controlled by a secp256k1 public key: Keccak-256 over the uncompressed point
/// without its `0x04` tag, last 20 bytes.
pub fn address_from_pub_key(pub_key: &PublicKey) -> Result<String, AppError> {
    let uncompressed = pub_key.serialize_uncompressed();
    let digest = Keccak256::digest(&uncompressed[1..]);
    from_evm_bytes(&digest[12..])
}

/// Same as [`address_from_pub_key`] for an encoded key, see [`parse_pub_key`].
pub fn address_from_pub_key_hex(pub_key: &str) -> Result<String, AppError> {
    address_from_pub_key(&parse_pub_key(pub_key)?)
}

/// Reads a vault key either as hex (compressed or uncompressed) or in the bech32
/// form the protocol chain reports (`thorpub1...`, `tthorpub1...`).
pub fn parse_pub_key(pub_key: &str) -> Result<PublicKey, AppError> {
    let bytes = if pub_key.chars().all(|c| c.is_ascii_hexdigit()) {
        hex::decode(pub_key)?
    } else {
        bech32_pub_key_bytes(pub_key)?
    };
    Ok(PublicKey::from_slice(&bytes)?)
}

fn bech32_pub_key_bytes(pub_key: &str) -> Result<Vec<u8>, AppError> {
    let (hrp, data, _) =
        bech32::decode(pub_key).map_err(|e| AppError::Decode(format!("{}: {}", pub_key, e)))?;
    if !hrp.ends_with("pub") {
        return Err(AppError::Decode(format!("{}: not a public key prefix ({})", pub_key, hrp)));
    }
    let raw = Vec::<u8>::from_base32(&data).map_err(|e| AppError::Decode(format!("{}: {}", pub_key, e)))?;
    raw.strip_prefix(&AMINO_SECP256K1_PREFIX[..])
        .map(|key| key.to_vec())
        .ok_or_else(|| AppError::Decode(format!("{}: not a secp256k1 key", pub_key)))
}

/// True when both strings encode the same public key, whatever their encoding.
pub fn same_pub_key(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    match (parse_pub_key(a), parse_pub_key(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
