//! Swap client: Jupiter quotes and paid swap execution

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::dispatcher::PaymentAwareDispatcher;
use crate::signer::PaymentSigner;
use crate::tokens::{decimals_for, parse_amount, resolve_mint};
use crate::transaction::{sign_transaction, TransactionSubmitter};
use crate::types::endpoints;
use crate::{NoLimitError, Result};

/// Default slippage, in basis points (0.5%)
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

/// Swap parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    /// Source token symbol or mint
    pub from: String,
    /// Destination token symbol or mint
    pub to: String,
    /// Human-readable amount of the source token
    pub amount: String,
    /// Slippage in basis points; defaults to 50
    pub slippage_bps: Option<u16>,
}

impl SwapParams {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount: amount.into(),
            slippage_bps: None,
        }
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = Some(slippage_bps);
        self
    }

    fn slippage(&self) -> u16 {
        self.slippage_bps.unwrap_or(DEFAULT_SLIPPAGE_BPS)
    }

    /// Input mint, output mint and atomic input amount
    fn resolve(&self) -> Result<(String, String, String)> {
        let amount = parse_amount(&self.amount, decimals_for(&self.from))?;
        Ok((resolve_mint(&self.from), resolve_mint(&self.to), amount))
    }
}

/// Swap quote
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    /// Input amount in atomic units
    pub in_amount: String,
    /// Output amount in atomic units
    pub out_amount: String,
    /// Minimum output after slippage
    #[serde(default)]
    pub other_amount_threshold: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_impact_pct: f64,
    #[serde(default)]
    pub context_slot: Option<u64>,
    /// Routing information, passed through untouched
    #[serde(default)]
    pub route_plan: Vec<Value>,
}

/// Jupiter reports price impact as a string; accept numbers too
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid priceImpactPct {:?}", s))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("invalid priceImpactPct {}", n))),
        Some(Value::Null) | None => Ok(0.0),
        Some(other) => Err(D::Error::custom(format!("invalid priceImpactPct {}", other))),
    }
}

/// Swap result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapResult {
    /// Transaction signature
    pub signature: String,
    /// Input amount in atomic units
    pub in_amount: String,
    /// Output amount in atomic units
    pub out_amount: String,
    /// $NL rewards earned
    pub nl_rewards: String,
    /// x402 payment receipt
    pub payment_receipt: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest {
    chain: &'static str,
    from_token: String,
    to_token: String,
    amount: String,
    user_address: String,
    slippage: u16,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapQuoteSummary {
    to_amount: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapApiResponse {
    tx: String,
    quote: SwapQuoteSummary,
    #[serde(default)]
    nl_earned: Option<String>,
}

/// Swap client
#[derive(Clone)]
pub struct SwapClient {
    dispatcher: PaymentAwareDispatcher,
    submitter: Option<Arc<dyn TransactionSubmitter>>,
}

impl std::fmt::Debug for SwapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapClient")
            .field("dispatcher", &self.dispatcher)
            .field("submitter", &self.submitter.is_some())
            .finish()
    }
}

impl SwapClient {
    pub fn new(
        dispatcher: PaymentAwareDispatcher,
        submitter: Option<Arc<dyn TransactionSubmitter>>,
    ) -> Self {
        Self {
            dispatcher,
            submitter,
        }
    }

    /// Quote URL on the configured Jupiter API
    pub fn quote_url(&self, params: &SwapParams) -> Result<String> {
        let (input_mint, output_mint, amount) = params.resolve()?;
        let base = format!(
            "{}/quote",
            self.dispatcher.config().jupiter_url.trim_end_matches('/')
        );
        let url = Url::parse_with_params(
            &base,
            &[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", amount),
                ("slippageBps", params.slippage().to_string()),
            ],
        )
        .map_err(|e| NoLimitError::config(format!("Invalid Jupiter URL: {}", e)))?;
        Ok(url.into())
    }

    /// Get a swap quote from Jupiter; free, no payment involved
    pub async fn quote(&self, params: &SwapParams) -> Result<SwapQuote> {
        let url = self.quote_url(params)?;
        let body = self.dispatcher.get_url(&url, None).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Execute a swap: pay for it, sign the returned transaction, submit it
    pub async fn execute(&self, params: &SwapParams) -> Result<SwapResult> {
        let signer = self
            .dispatcher
            .signer()
            .cloned()
            .ok_or_else(|| NoLimitError::auth("Swaps require a signer"))?;
        let submitter = self
            .submitter
            .as_ref()
            .ok_or_else(|| NoLimitError::config("Swaps require a transaction submitter"))?;

        let (from_token, to_token, amount) = params.resolve()?;
        let request = SwapRequest {
            chain: "solana",
            from_token,
            to_token,
            amount: amount.clone(),
            user_address: signer.public_identifier(),
            slippage: params.slippage(),
        };

        let outcome = self
            .dispatcher
            .dispatch(&endpoints::SWAP, &serde_json::to_value(&request)?, None)
            .await?
            .decode::<SwapApiResponse>()?;

        let unsigned = general_purpose::STANDARD.decode(&outcome.payload.tx)?;
        let signed = sign_transaction(&unsigned, signer.as_ref())?;
        let signature = submitter.submit_signed_transaction(&signed).await?;
        info!("Swap {} -> {} submitted as {}", params.from, params.to, signature);

        Ok(SwapResult {
            signature,
            in_amount: amount,
            out_amount: outcome.payload.quote.to_amount,
            nl_rewards: outcome.payload.nl_earned.unwrap_or_else(|| "0".to_string()),
            payment_receipt: outcome.payment_receipt,
        })
    }
}
