/**
* filename : keys
* date: 2025. 6. 5.
* description: key manager capability and the local secp256k1 key
**/

use crate::coin::tron::address;
use crate::types::AppError;
use async_trait::async_trait;
use secp256k1::recovery::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

pub const SIGNATURE_LEN: usize = 65;

/// Something that can produce a recoverable secp256k1 signature (`r||s||v`) over a
/// 32-byte hash for a given public key.
#[async_trait]
pub trait KeyManager: Send + Sync {
  /// Hex-encoded compressed public key this manager answers for.
  fn pub_key(&self) -> String;
  async fn sign(&self, msg: &[u8], pub_key: &str) -> Result<Vec<u8>, AppError>;
}

pub struct LocalKeyManager {
  secp: Secp256k1<All>,
  secret: SecretKey,
  public: PublicKey,
}

impl LocalKeyManager {
  pub fn from_hex(private_key_hex: &str) -> Result<Self, AppError> {
    let raw = hex::decode(private_key_hex.trim_start_matches("0x"))?;
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&raw)?;
    let public = PublicKey::from_secret_key(&secp, &secret);
    Ok(Self { secp, secret, public })
  }

  pub fn public_key(&self) -> &PublicKey {
    &self.public
  }
}

#[async_trait]
impl KeyManager for LocalKeyManager {
  fn pub_key(&self) -> String {
    hex::encode(self.public.serialize())
  }

  async fn sign(&self, msg: &[u8], _pub_key: &str) -> Result<Vec<u8>, AppError> {
    let message = Message::from_slice(msg)?;
    let (recovery, compact) = self.secp.sign_recoverable(&message, &self.secret).serialize_compact();

    let mut sig = Vec::with_capacity(SIGNATURE_LEN);
    sig.extend_from_slice(&compact);
    sig.push(recovery.to_i32() as u8);
    Ok(sig)
  }
}

/// Recovers the signer of `msg` from an `r||s||v` signature.
pub fn recover(msg: &[u8], sig: &[u8]) -> Result<PublicKey, AppError> {
  if sig.len() != SIGNATURE_LEN {
    return Err(AppError::Crypto(format!("signature is {} bytes, want {}", sig.len(), SIGNATURE_LEN)));
  }
  let secp = Secp256k1::verification_only();
  let message = Message::from_slice(msg)?;
  let recovery = RecoveryId::from_i32(i32::from(sig[64]))?;
  let recoverable = RecoverableSignature::from_compact(&sig[..64], recovery)?;
  Ok(secp.recover(&message, &recoverable)?)
}

/// Checks that `sig` over `msg` recovers to `expected_pub_key` (hex or bech32).
pub fn verify_signature(msg: &[u8], sig: &[u8], expected_pub_key: &str) -> Result<(), AppError> {
  let expected = address::parse_pub_key(expected_pub_key)?;
  let recovered = recover(msg, sig).map_err(|_| AppError::SignVerifyFailed)?;
  if recovered.serialize_uncompressed() != expected.serialize_uncompressed() {
    return Err(AppError::SignVerifyFailed);
  }
  Ok(())
}
