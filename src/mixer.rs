//! Mixer client

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatcher::PaymentAwareDispatcher;
use crate::signer::is_valid_public_key;
use crate::tokens::{mixer_fee, Token};
use crate::types::endpoints;
use crate::{NoLimitError, Result};

/// Mix parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixParams {
    pub token: Token,
    /// Human-readable amount
    pub amount: String,
    /// Recipient address
    pub recipient: String,
    /// Delay before payout, in minutes; 0 is instant
    pub delay_minutes: u32,
}

impl MixParams {
    pub fn new(token: Token, amount: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            token,
            amount: amount.into(),
            recipient: recipient.into(),
            delay_minutes: 0,
        }
    }

    pub fn with_delay_minutes(mut self, delay_minutes: u32) -> Self {
        self.delay_minutes = delay_minutes;
        self
    }
}

/// Created mix
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixResult {
    pub mix_id: String,
    /// Address to deposit into
    pub deposit_address: String,
    pub deposit_amount: String,
    /// Fee deducted (1%)
    pub fee: String,
    /// Amount the recipient receives
    pub output_amount: String,
    /// Deposit deadline
    #[serde(default)]
    pub expires_at: Option<String>,
    /// x402 payment receipt
    #[serde(skip)]
    pub payment_receipt: Option<String>,
}

/// Lifecycle of a mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixState {
    PendingDeposit,
    Deposited,
    Mixing,
    Completed,
    Failed,
    Expired,
}

impl MixState {
    /// Whether the mix can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Expired)
    }
}

/// Mix status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixStatus {
    #[serde(default)]
    pub mix_id: Option<String>,
    pub status: MixState,
    pub progress: u8,
    pub current_hop: u32,
    pub total_hops: u32,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub output_signature: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MixRequest<'a> {
    token: &'static str,
    amount: &'a str,
    recipient_address: &'a str,
    user_address: String,
    delay_minutes: u32,
}

/// Mixer client
#[derive(Debug, Clone)]
pub struct MixerClient {
    dispatcher: PaymentAwareDispatcher,
}

impl MixerClient {
    pub fn new(dispatcher: PaymentAwareDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Create a mix request
    pub async fn create(&self, params: &MixParams) -> Result<MixResult> {
        if !is_valid_public_key(&params.recipient) {
            return Err(NoLimitError::validation(format!(
                "Invalid recipient address: {}",
                params.recipient
            )));
        }
        let user_address = self
            .dispatcher
            .payer_address()
            .ok_or_else(|| NoLimitError::auth("Mixing requires a signer"))?;

        let request = MixRequest {
            token: params.token.symbol(),
            amount: &params.amount,
            recipient_address: &params.recipient,
            user_address,
            delay_minutes: params.delay_minutes,
        };

        let outcome = self
            .dispatcher
            .dispatch(&endpoints::MIXER, &serde_json::to_value(&request)?, None)
            .await?
            .decode::<MixResult>()?;

        let mut result = outcome.payload;
        result.payment_receipt = outcome.payment_receipt;
        info!("Created mix {}", result.mix_id);
        Ok(result)
    }

    /// Get the status of a mix
    pub async fn status(&self, mix_id: &str) -> Result<MixStatus> {
        if mix_id.is_empty() || !mix_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(NoLimitError::mixer(format!("Invalid mix id: {:?}", mix_id)));
        }
        let body = self
            .dispatcher
            .get(&format!("{}/{}", endpoints::MIX_STATUS, mix_id), None)
            .await?;
        serde_json::from_value(body)
            .map_err(|e| NoLimitError::mixer(format!("Unexpected status response for {}: {}", mix_id, e)))
    }

    /// Fee and recipient output for a mix of `amount`
    pub fn calculate_fee(&self, amount: &str) -> Result<(Decimal, Decimal)> {
        mixer_fee(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing() {
        let status: MixStatus = serde_json::from_value(json!({
            "mixId": "mix_1",
            "status": "pending_deposit",
            "progress": 0,
            "currentHop": 0,
            "totalHops": 3
        }))
        .unwrap();
        assert_eq!(status.status, MixState::PendingDeposit);
        assert!(!status.status.is_terminal());
        assert_eq!(status.total_hops, 3);
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let parsed: std::result::Result<MixStatus, _> = serde_json::from_value(json!({
            "status": "teleported",
            "progress": 0,
            "currentHop": 0,
            "totalHops": 3
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = MixRequest {
            token: Token::Sol.symbol(),
            amount: "1.5",
            recipient_address: "Recipient",
            user_address: "User".to_string(),
            delay_minutes: 10,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "token": "SOL",
                "amount": "1.5",
                "recipientAddress": "Recipient",
                "userAddress": "User",
                "delayMinutes": 10
            })
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(MixState::Completed.is_terminal());
        assert!(MixState::Expired.is_terminal());
        assert!(!MixState::Mixing.is_terminal());
    }
}
