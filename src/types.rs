//! Core types for the x402 payment handshake

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{NoLimitError, Result};

/// Version written into every payment authorization
pub const PAYMENT_VERSION: &str = "1";

/// Network identifier written into every payment authorization
pub const PAYMENT_NETWORK: &str = "solana";

/// HTTP header names used by the payment protocol (lowercase, as sent on the wire)
pub mod headers {
    /// Enterprise API key header, `X-API-Key`
    pub const API_KEY: &str = "x-api-key";
    /// Signed payment authorization header, `X-Payment`
    pub const PAYMENT: &str = "x-payment";
    /// Payment receipt header returned on success, `X-Payment-Response`
    pub const PAYMENT_RESPONSE: &str = "x-payment-response";
}

/// Asset descriptor inside payment requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAsset {
    /// Token mint address
    pub address: String,
}

/// Payment requirements sent by the server in a 402 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequirements {
    /// Recipient wallet address
    #[serde(rename = "payTo")]
    pub pay_to: String,
    /// Required payment amount in atomic token units
    #[serde(rename = "maxAmountRequired")]
    pub max_amount_required: String,
    /// Token to pay with
    pub asset: PaymentAsset,
    /// Resource the payment unlocks
    pub resource: String,
}

/// Body of an HTTP 402 response
///
/// Entries stay untyped until picked, since servers may offer schemes for
/// other networks with a different shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequirementsResponse {
    /// Acceptable payment methods, in server preference order
    pub accepts: Vec<Value>,
}

impl PaymentRequirementsResponse {
    /// Parse a 402 body and pick the first accepted requirement.
    ///
    /// A missing field in the first entry, an absent `accepts` list or an
    /// empty one is a protocol error. Later entries are not inspected.
    pub fn first_from_body(body: &str) -> Result<PaymentRequirements> {
        let response: PaymentRequirementsResponse = serde_json::from_str(body)
            .map_err(|e| NoLimitError::protocol(format!("malformed 402 body: {}", e)))?;

        let first = response
            .accepts
            .into_iter()
            .next()
            .ok_or_else(|| NoLimitError::protocol("402 body has an empty accepts list"))?;
        serde_json::from_value(first)
            .map_err(|e| NoLimitError::protocol(format!("malformed payment requirements: {}", e)))
    }
}

/// Unsigned payment authorization.
///
/// Field order is the canonical signing order; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub version: String,
    pub network: String,
    /// Payer address
    pub from: String,
    /// Payee address
    pub to: String,
    /// Atomic amount, copied from the requirements
    pub amount: String,
    /// Token mint, copied from the requirements
    pub asset: String,
    pub resource: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl PaymentAuthorization {
    /// Build an authorization for `requirements`, paid by `from`, stamped now
    pub fn from_requirements(requirements: &PaymentRequirements, from: impl Into<String>) -> Self {
        Self::with_timestamp(requirements, from, chrono::Utc::now().timestamp_millis())
    }

    /// Build an authorization with an explicit timestamp
    pub fn with_timestamp(
        requirements: &PaymentRequirements,
        from: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            version: PAYMENT_VERSION.to_string(),
            network: PAYMENT_NETWORK.to_string(),
            from: from.into(),
            to: requirements.pay_to.clone(),
            amount: requirements.max_amount_required.clone(),
            asset: requirements.asset.address.clone(),
            resource: requirements.resource.clone(),
            timestamp,
        }
    }

    /// Canonical bytes covered by the signature: compact JSON in declaration order
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Attach a raw signature, producing the full record
    pub fn into_signed(self, signature: &[u8]) -> SignedPaymentAuthorization {
        SignedPaymentAuthorization {
            authorization: self,
            signature: general_purpose::STANDARD.encode(signature),
        }
    }
}

/// Payment authorization with its base64 signature appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPaymentAuthorization {
    #[serde(flatten)]
    pub authorization: PaymentAuthorization,
    /// Base64 ed25519 signature over [`PaymentAuthorization::signing_bytes`]
    pub signature: String,
}

impl SignedPaymentAuthorization {
    /// Encode the full record as the `X-Payment` header value
    pub fn to_header(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    /// Decode an `X-Payment` header value
    pub fn from_header(encoded: &str) -> Result<Self> {
        let decoded = general_purpose::STANDARD.decode(encoded)?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    /// Raw signature bytes
    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        Ok(general_purpose::STANDARD.decode(&self.signature)?)
    }
}

/// Result of a dispatched request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome<T = Value> {
    /// Response body
    pub payload: T,
    /// Receipt token from `X-Payment-Response`, present only for paid calls
    pub payment_receipt: Option<String>,
}

impl<T> RequestOutcome<T> {
    /// Map the payload, keeping the receipt
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestOutcome<U> {
        RequestOutcome {
            payload: f(self.payload),
            payment_receipt: self.payment_receipt,
        }
    }
}

impl RequestOutcome<Value> {
    /// Deserialize the JSON payload into a typed body
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<RequestOutcome<T>> {
        Ok(RequestOutcome {
            payload: serde_json::from_value(self.payload)?,
            payment_receipt: self.payment_receipt,
        })
    }
}

/// A service endpoint on the noLimit server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Path appended to the server URL
    pub path: &'static str,
    /// Whether the endpoint is known to answer 402 without an API key
    pub paid: bool,
    /// Timeout used when the caller does not supply one
    pub default_timeout: Duration,
}

impl Endpoint {
    /// A paid endpoint
    pub const fn paid(path: &'static str, default_timeout: Duration) -> Self {
        Self {
            path,
            paid: true,
            default_timeout,
        }
    }

    /// A free endpoint
    pub const fn free(path: &'static str, default_timeout: Duration) -> Self {
        Self {
            path,
            paid: false,
            default_timeout,
        }
    }
}

/// Known noLimit endpoints
pub mod endpoints {
    use super::Endpoint;
    use std::time::Duration;

    pub const CHAT: Endpoint = Endpoint::paid("/noLimitLLM/solana", Duration::from_secs(60));
    /// Chat endpoint used with an enterprise API key
    pub const CHAT_API: Endpoint = Endpoint::free("/api/agent", Duration::from_secs(60));
    pub const SWAP: Endpoint = Endpoint::paid("/noLimitSwap/solana", Duration::from_secs(120));
    pub const MIXER: Endpoint = Endpoint::paid("/noLimitMixer/solana", Duration::from_secs(30));
    /// Prefix of the mix status endpoint, followed by `/{mix_id}`
    pub const MIX_STATUS: &str = "/mixer/status";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
}
