//! Client configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::{NoLimitError, Result};

/// Default noLimit server
pub const DEFAULT_SERVER: &str = "https://x402.nolimit.foundation";
/// Default Solana RPC endpoint
pub const DEFAULT_RPC: &str = "https://api.mainnet-beta.solana.com";
/// Default Jupiter swap API
pub const JUPITER_API: &str = "https://lite-api.jup.ag/swap/v1";

/// Environment variable overriding the server URL
pub const ENV_SERVER_URL: &str = "NOLIMIT_SERVER_URL";
/// Environment variable overriding the RPC URL
pub const ENV_RPC_URL: &str = "NOLIMIT_RPC_URL";
/// Environment variable holding an enterprise API key
pub const ENV_API_KEY: &str = "NOLIMIT_API_KEY";

/// Commitment level used for transaction preflight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable client configuration, fixed at construction
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the noLimit server
    pub server_url: String,
    /// Solana JSON-RPC URL used to submit transactions
    pub rpc_url: String,
    /// Jupiter API used for swap quotes
    pub jupiter_url: String,
    /// Enterprise API key; when set, payment logic is bypassed
    pub api_key: Option<String>,
    /// Preflight commitment for submitted transactions
    pub commitment: Commitment,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_url", &self.server_url)
            .field("rpc_url", &self.rpc_url)
            .field("jupiter_url", &self.jupiter_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("commitment", &self.commitment)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config pointing at `server_url`, other fields default
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `NOLIMIT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(server_url) = std::env::var(ENV_SERVER_URL) {
            config.server_url = server_url;
        }
        if let Ok(rpc_url) = std::env::var(ENV_RPC_URL) {
            config.rpc_url = rpc_url;
        }
        if let Ok(api_key) = std::env::var(ENV_API_KEY) {
            if !api_key.is_empty() {
                config.api_key = Some(api_key);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_jupiter_url(mut self, jupiter_url: impl Into<String>) -> Self {
        self.jupiter_url = jupiter_url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("server URL", &self.server_url),
            ("RPC URL", &self.rpc_url),
            ("Jupiter URL", &self.jupiter_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| NoLimitError::config(format!("Invalid {} {:?}: {}", name, value, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(NoLimitError::config(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        if matches!(&self.api_key, Some(key) if key.trim().is_empty()) {
            return Err(NoLimitError::config("API key cannot be empty"));
        }

        Ok(())
    }

    /// Full URL of a server path
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER.to_string(),
            rpc_url: DEFAULT_RPC.to_string(),
            jupiter_url: JUPITER_API.to_string(),
            api_key: None,
            commitment: Commitment::default(),
        }
    }
}
