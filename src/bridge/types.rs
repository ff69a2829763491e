use crate::coin::tron::codec::sha256_hex;
use crate::types::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TRON_CHAIN: &str = "TRON";
pub const TRX_SYMBOL: &str = "TRX";

// ====== Asset ======

/// `CHAIN.SYMBOL`, e.g. `TRON.TRX` or `TRON.USDT-TR7NHQJEKQXGTCI8Q8ZY4PL8OTSZGJLJ6T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
  pub chain: String,
  pub symbol: String,
}

impl Asset {
  pub fn trx() -> Self {
    Self { chain: TRON_CHAIN.to_string(), symbol: TRX_SYMBOL.to_string() }
  }

  pub fn token(ticker: &str, contract: &str) -> Self {
    Self {
      chain: TRON_CHAIN.to_string(),
      symbol: format!("{}-{}", ticker, contract).to_uppercase(),
    }
  }

  pub fn is_gas_asset(&self) -> bool {
    self.chain == TRON_CHAIN && self.symbol == TRX_SYMBOL
  }

  pub fn is_empty(&self) -> bool {
    self.chain.is_empty() || self.symbol.is_empty()
  }
}

impl fmt::Display for Asset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.chain, self.symbol)
  }
}

impl FromStr for Asset {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (chain, symbol) = s
      .split_once('.')
      .ok_or_else(|| AppError::Parameter(format!("invalid asset: {}", s)))?;
    if chain.is_empty() || symbol.is_empty() {
      return Err(AppError::Parameter(format!("invalid asset: {}", s)));
    }
    Ok(Self { chain: chain.to_uppercase(), symbol: symbol.to_uppercase() })
  }
}

impl TryFrom<String> for Asset {
  type Error = AppError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Asset> for String {
  fn from(asset: Asset) -> Self {
    asset.to_string()
  }
}

// ====== Coin ======

/// Protocol-side amount (8 decimals). `decimals` records the asset's native precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
  pub asset: Asset,
  #[serde(with = "u128_string")]
  pub amount: u128,
  #[serde(default)]
  pub decimals: u32,
}

impl Coin {
  pub fn new(asset: Asset, amount: u128, decimals: u32) -> Self {
    Self { asset, amount, decimals }
  }

  pub fn is_empty(&self) -> bool {
    self.asset.is_empty() || self.amount == 0
  }
}

impl fmt::Display for Coin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.amount, self.asset)
  }
}

pub fn coins_to_string(coins: &[Coin]) -> String {
  coins.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
}

/// Amount of `asset` in `coins`, zero when absent.
pub fn amount_of(coins: &[Coin], asset: &Asset) -> u128 {
  coins.iter().filter(|c| &c.asset == asset).map(|c| c.amount).sum()
}

/// Amounts travel as decimal strings on the protocol chain; numbers are accepted too.
mod u128_string {
  use serde::{de, Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Str(String),
      Num(u64),
    }
    match Raw::deserialize(deserializer)? {
      Raw::Str(s) => s.parse().map_err(de::Error::custom),
      Raw::Num(n) => Ok(n as u128),
    }
  }
}

// ====== Vaults ======

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vault {
  pub pub_key: String,
  #[serde(default)]
  pub coins: Vec<Coin>,
  /// Outbound amounts already scheduled against the vault but not yet observed.
  #[serde(default)]
  pub pending_outbound: Vec<Coin>,
  #[serde(default)]
  pub status: String,
}

impl Vault {
  pub fn has_funds_for(&self, asset: &Asset) -> bool {
    amount_of(&self.coins, asset) > 0
  }
}

// ====== Observations ======

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInItem {
  pub tx: String,
  pub block_height: i64,
  pub sender: String,
  pub to: String,
  pub coins: Vec<Coin>,
  pub gas: Vec<Coin>,
  pub memo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
  pub chain: String,
  pub tx_array: Vec<TxInItem>,
  pub filtered: bool,
  pub mem_pool: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFee {
  pub chain: String,
  pub height: i64,
  pub transaction_size: u64,
  pub transaction_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solvency {
  pub height: i64,
  pub chain: String,
  pub pub_key: String,
  pub coins: Vec<Coin>,
  pub solvent: bool,
}

// ====== Outbound ======

/// One outbound order handed to the client by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutItem {
  pub chain: String,
  pub to_address: String,
  pub vault_pub_key: String,
  pub coins: Vec<Coin>,
  pub memo: String,
  #[serde(default)]
  pub max_gas: Vec<Coin>,
  #[serde(default)]
  pub gas_rate: i64,
  #[serde(default)]
  pub in_hash: String,
  #[serde(default)]
  pub height: i64,
}

impl TxOutItem {
  /// Signer-cache key of the order.
  pub fn cache_hash(&self) -> String {
    let fingerprint = format!(
      "{}|{}|{}|{}|{}|{}",
      self.chain,
      self.to_address,
      self.vault_pub_key,
      coins_to_string(&self.coins),
      self.memo,
      self.in_hash
    );
    sha256_hex(fingerprint.as_bytes())
  }
}
