//! Signing capability for payment authorizations and transactions
//!
//! The dispatcher only needs two things from a wallet: a public address and
//! the ability to sign bytes. [`PaymentSigner`] is that seam; [`KeypairSigner`]
//! implements it with an in-memory ed25519 keypair, the key type Solana uses.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use std::fmt;

use crate::{NoLimitError, Result};

/// Holds a private key and signs on its behalf without exposing it
pub trait PaymentSigner: Send + Sync {
    /// Public address of the signer (base58 on Solana)
    fn public_identifier(&self) -> String;

    /// Sign an arbitrary message
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// ed25519 keypair signer
#[derive(Clone)]
pub struct KeypairSigner {
    signing_key: SigningKey,
}

impl KeypairSigner {
    /// Wrap an existing signing key
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Generate a fresh random keypair
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Build from raw key bytes: a 32-byte seed or a 64-byte Solana keypair
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                Ok(Self::new(SigningKey::from_bytes(&seed)))
            }
            64 => {
                let mut keypair = [0u8; 64];
                keypair.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&keypair)
                    .map(Self::new)
                    .map_err(|e| NoLimitError::wallet(format!("Invalid keypair bytes: {}", e)))
            }
            n => Err(NoLimitError::wallet(format!(
                "Invalid key length: expected 32 or 64 bytes, got {}",
                n
            ))),
        }
    }

    /// Build from a base58 secret key, as exported by Solana wallets
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| NoLimitError::wallet(format!("Invalid base58 private key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Build from a base58 secret key stored in an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let encoded = std::env::var(var)
            .map_err(|_| NoLimitError::config(format!("Environment variable {} not found", var)))?;
        Self::from_base58(&encoded)
    }

    /// Verifying half of the keypair
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// 32-byte public key
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key().to_bytes()
    }

    /// Base58 Solana address
    pub fn address(&self) -> String {
        bs58::encode(self.public_key_bytes()).into_string()
    }
}

impl PaymentSigner for KeypairSigner {
    fn public_identifier(&self) -> String {
        self.address()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Decode a base58 Solana address into its 32 public key bytes
pub fn decode_address(address: &str) -> Result<[u8; 32]> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| NoLimitError::validation(format!("Invalid base58 address: {}", e)))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| {
            NoLimitError::validation(format!("Invalid address length: {} bytes", b.len()))
        })
}

/// Check that a string is a base58-encoded 32-byte public key
pub fn is_valid_public_key(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// Shorten an address for display, e.g. `7xKX...AsU9`
pub fn truncate_key(key: &str, chars: usize) -> String {
    if key.is_empty() {
        return String::new();
    }
    let len = key.chars().count();
    if len <= chars * 2 {
        return key.to_string();
    }
    let head: String = key.chars().take(chars).collect();
    let tail: String = key.chars().skip(len - chars).collect();
    format!("{}...{}", head, tail)
}

/// Verify an ed25519 signature against a base58 address
pub fn verify_signature(address: &str, message: &[u8], signature: &[u8]) -> Result<bool> {
    let key_bytes = decode_address(address)?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| NoLimitError::wallet(format!("Invalid public key: {}", e)))?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| NoLimitError::wallet(format!("Invalid signature: {}", e)))?;
    Ok(verifying_key.verify(message, &signature).is_ok())
}
