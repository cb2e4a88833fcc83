//! Solana transaction signing and submission
//!
//! The swap service returns a serialized, partially signed transaction. The
//! payer fills in its own signature slot and submits the result over
//! JSON-RPC.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use http::HeaderMap;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Commitment;
use crate::signer::{decode_address, PaymentSigner};
use crate::transport::Transport;
use crate::{NoLimitError, Result};

const SIGNATURE_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;
const VERSION_PREFIX_MASK: u8 = 0x80;
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Submits signed transactions to the chain
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a fully signed wire transaction, returning its signature (id)
    async fn submit_signed_transaction(&self, transaction: &[u8]) -> Result<String>;
}

/// Decode a compact-u16 length prefix, returning the value and bytes consumed
fn decode_compact_u16(bytes: &[u8]) -> Result<(usize, usize)> {
    let mut value = 0usize;
    for (i, byte) in bytes.iter().take(3).enumerate() {
        value |= ((byte & 0x7f) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(NoLimitError::transaction("invalid compact-u16 length"))
}

/// Layout of a wire transaction, as byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
struct WireLayout {
    signatures_offset: usize,
    num_signatures: usize,
    message_offset: usize,
    num_required_signatures: usize,
    account_keys_offset: usize,
    num_account_keys: usize,
}

impl WireLayout {
    fn parse(tx: &[u8]) -> Result<Self> {
        let (num_signatures, prefix) = decode_compact_u16(tx)?;
        let message_offset = prefix + num_signatures * SIGNATURE_LEN;
        let message = tx
            .get(message_offset..)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| NoLimitError::transaction("transaction truncated before message"))?;

        let header_offset = if message[0] & VERSION_PREFIX_MASK != 0 {
            let version = message[0] & !VERSION_PREFIX_MASK;
            if version != 0 {
                return Err(NoLimitError::transaction(format!(
                    "unsupported message version {}",
                    version
                )));
            }
            1
        } else {
            0
        };

        let header = message
            .get(header_offset..header_offset + 3)
            .ok_or_else(|| NoLimitError::transaction("message header truncated"))?;
        let num_required_signatures = header[0] as usize;

        let keys_len_offset = header_offset + 3;
        let (num_account_keys, keys_prefix) = decode_compact_u16(
            message
                .get(keys_len_offset..)
                .ok_or_else(|| NoLimitError::transaction("account keys truncated"))?,
        )?;
        let account_keys_offset = message_offset + keys_len_offset + keys_prefix;

        if tx.len() < account_keys_offset + num_account_keys * PUBKEY_LEN {
            return Err(NoLimitError::transaction("account keys truncated"));
        }
        if num_signatures != num_required_signatures {
            return Err(NoLimitError::transaction(format!(
                "transaction has {} signature slots but requires {}",
                num_signatures, num_required_signatures
            )));
        }
        if num_required_signatures > num_account_keys {
            return Err(NoLimitError::transaction("more signers than account keys"));
        }

        Ok(Self {
            signatures_offset: prefix,
            num_signatures,
            message_offset,
            num_required_signatures,
            account_keys_offset,
            num_account_keys,
        })
    }

    fn account_key<'a>(&self, tx: &'a [u8], index: usize) -> &'a [u8] {
        let start = self.account_keys_offset + index * PUBKEY_LEN;
        &tx[start..start + PUBKEY_LEN]
    }
}

/// Sign a serialized transaction with `signer`, writing into its signature slot.
///
/// The signer must be one of the transaction's required signers.
pub fn sign_transaction(transaction: &[u8], signer: &dyn PaymentSigner) -> Result<Vec<u8>> {
    let layout = WireLayout::parse(transaction)?;
    let signer_key = decode_address(&signer.public_identifier())?;

    let index = (0..layout.num_required_signatures)
        .find(|&i| layout.account_key(transaction, i) == signer_key.as_slice())
        .ok_or_else(|| {
            NoLimitError::transaction(format!(
                "{} is not a required signer of this transaction",
                signer.public_identifier()
            ))
        })?;

    let signature = signer.sign(&transaction[layout.message_offset..])?;
    if signature.len() != SIGNATURE_LEN {
        return Err(NoLimitError::wallet(format!(
            "signer produced a {}-byte signature",
            signature.len()
        )));
    }

    let mut signed = transaction.to_vec();
    let slot = layout.signatures_offset + index * SIGNATURE_LEN;
    signed[slot..slot + SIGNATURE_LEN].copy_from_slice(&signature);
    debug!(
        "Signed transaction slot {} of {} ({} account keys)",
        index, layout.num_signatures, layout.num_account_keys
    );
    Ok(signed)
}

/// First signature of a wire transaction, base58, which is its transaction id
pub fn transaction_id(transaction: &[u8]) -> Result<String> {
    let layout = WireLayout::parse(transaction)?;
    if layout.num_signatures == 0 {
        return Err(NoLimitError::transaction("transaction has no signatures"));
    }
    let first = &transaction[layout.signatures_offset..layout.signatures_offset + SIGNATURE_LEN];
    Ok(bs58::encode(first).into_string())
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

/// Submits transactions through a Solana JSON-RPC node
#[derive(Clone)]
pub struct RpcSubmitter {
    rpc_url: String,
    commitment: Commitment,
    transport: Arc<dyn Transport>,
}

impl RpcSubmitter {
    pub fn new(rpc_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            commitment: Commitment::default(),
            transport,
        }
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl TransactionSubmitter for RpcSubmitter {
    async fn submit_signed_transaction(&self, transaction: &[u8]) -> Result<String> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendTransaction",
            "params": [
                general_purpose::STANDARD.encode(transaction),
                { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
            ]
        });

        let response = self
            .transport
            .post(&self.rpc_url, &request, &HeaderMap::new(), RPC_TIMEOUT)
            .await?
            .error_for_status()?;
        let rpc: RpcResponse = serde_json::from_value(response.json()?)?;

        if let Some(error) = rpc.error {
            return Err(NoLimitError::transaction(format!(
                "sendTransaction failed ({}): {}",
                error.code, error.message
            )));
        }

        let signature = rpc
            .result
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| NoLimitError::transaction("sendTransaction returned no signature"))?
            .to_string();
        info!("Submitted transaction {}", signature);
        Ok(signature)
    }
}
