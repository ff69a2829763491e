/**
* filename : types
* date: 2025. 6. 5.
* description: crate-wide error type and channel aliases
**/

use crate::bridge::{NetworkFee, Solvency, TxIn};
use crate::signer::tss::KeysignError;
use tokio::sync::mpsc::{Receiver, Sender};

// ====== Channel aliases ======
pub type TxInSender = Sender<TxIn>;
pub type TxInReceiver = Receiver<TxIn>;
pub type NetworkFeeSender = Sender<NetworkFee>;
pub type NetworkFeeReceiver = Receiver<NetworkFee>;
pub type SolvencySender = Sender<Solvency>;
pub type SolvencyReceiver = Receiver<Solvency>;

// ====== Unified Error Type ======
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Decode error: {0}")]
  Decode(String),

  #[error("Parameter error: {0}")]
  Parameter(String),

  #[error("Invalid address: {0}")]
  InvalidAddress(String),

  #[error("no reference block available")]
  NoRefBlock,

  #[error("Bad outbound order: {0}")]
  BadOrder(String),

  #[error("signature verification failed")]
  SignVerifyFailed,

  #[error("Keysign failed: {0}")]
  KeysignBlame(KeysignError),

  #[error("cancelled")]
  Cancelled,

  #[error("Broadcast rejected: {0}")]
  Broadcast(String),

  #[error("Crypto error: {0}")]
  Crypto(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Database error: {0}")]
  Database(String),

  #[error("Channel send error: {0}")]
  SendError(String),

  #[error("Task join error: {0}")]
  JoinError(#[from] tokio::task::JoinError),
}

// ====== Error Conversions (From impls) ======

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      AppError::Decode(format!("Reqwest decode error: {}", err))
    } else {
      AppError::Transport(format!("Reqwest error: {}", err))
    }
  }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
  fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
    AppError::SendError(format!("Channel send failed: {}", err))
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Database(format!("IO error: {}", err))
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    AppError::Decode(format!("JSON parse error: {}", err))
  }
}

impl From<hex::FromHexError> for AppError {
  fn from(err: hex::FromHexError) -> Self {
    AppError::Decode(format!("hex decode error: {}", err))
  }
}

impl From<prost::DecodeError> for AppError {
  fn from(err: prost::DecodeError) -> Self {
    AppError::Decode(format!("protobuf decode error: {}", err))
  }
}

impl From<secp256k1::Error> for AppError {
  fn from(err: secp256k1::Error) -> Self {
    AppError::Crypto(format!("secp256k1 error: {}", err))
  }
}

impl From<KeysignError> for AppError {
  fn from(err: KeysignError) -> Self {
    AppError::KeysignBlame(err)
  }
}
