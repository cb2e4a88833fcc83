//! Shared helpers for integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

pub const PAYEE: &str = "PayeeAddr111";
pub const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// 402 body asking for 1 USDC for `resource`
pub fn payment_required_body(resource: &str) -> String {
    json!({
        "x402Version": 1,
        "error": "X-PAYMENT header is required",
        "accepts": [{
            "scheme": "exact",
            "network": "solana",
            "payTo": PAYEE,
            "maxAmountRequired": "1000000",
            "asset": { "address": USDC },
            "resource": resource
        }]
    })
    .to_string()
}

/// Unsigned v0 transaction whose only required signer is `signer`
pub fn unsigned_transaction(signer: [u8; 32]) -> Vec<u8> {
    let mut message = vec![0x80, 1, 0, 1, 2];
    message.extend_from_slice(&signer);
    message.extend_from_slice(&[0x11; 32]);
    message.extend_from_slice(&[0x22; 32]);
    message.extend_from_slice(&[0, 0]);

    let mut tx = vec![1u8];
    tx.extend_from_slice(&[0u8; 64]);
    tx.extend_from_slice(&message);
    tx
}

/// JSON-RPC success body for `sendTransaction`
pub fn rpc_result(signature: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": signature })
}
