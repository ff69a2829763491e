/**
* filename : tss
* date: 2025. 6. 5.
* description: threshold-signature key manager (remote sign + blame)
**/

use crate::signer::keys::KeyManager;
use crate::types::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignAlgo {
  Secp256K1,
  Ed25519,
}

/// Nodes held responsible for a failed keysign round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blame {
  pub fail_reason: String,
  pub blame_nodes: Vec<String>,
}

impl Blame {
  pub fn is_empty(&self) -> bool {
    self.blame_nodes.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysignError {
  pub blame: Blame,
}

impl KeysignError {
  pub fn new(blame: Blame) -> Self {
    Self { blame }
  }
}

impl fmt::Display for KeysignError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} (blamed: {})", self.blame.fail_reason, self.blame.blame_nodes.join(","))
  }
}

impl std::error::Error for KeysignError {}

/// Successful remote signature: 64-byte `r||s` plus the recovery id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSignature {
  pub signature: Vec<u8>,
  pub recovery: u8,
}

/// Remote threshold-signature service. Calls may suspend for as long as the
/// signing party needs; blame failures come back as `AppError::KeysignBlame`.
#[async_trait]
pub trait TssServer: Send + Sync {
  async fn remote_sign(&self, msg: &[u8], algo: SignAlgo, pub_key: &str) -> Result<RemoteSignature, AppError>;
}

pub struct TssKeyManager {
  server: Arc<dyn TssServer>,
  node_pub_key: String,
}

impl TssKeyManager {
  pub fn new(server: Arc<dyn TssServer>, node_pub_key: String) -> Self {
    Self { server, node_pub_key }
  }
}

#[async_trait]
impl KeyManager for TssKeyManager {
  fn pub_key(&self) -> String {
    self.node_pub_key.clone()
  }

  async fn sign(&self, msg: &[u8], pub_key: &str) -> Result<Vec<u8>, AppError> {
    let resp = self.server.remote_sign(msg, SignAlgo::Secp256K1, pub_key).await?;
    if resp.signature.len() != 64 {
      return Err(AppError::Crypto(format!("remote signature is {} bytes, want 64", resp.signature.len())));
    }
    let mut sig = resp.signature;
    sig.push(resp.recovery);
    Ok(sig)
  }
}
