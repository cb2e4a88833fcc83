//! # nolimit-solana
//!
//! Client SDK for the noLimit chat, swap and mixer services on Solana.
//!
//! Paid endpoints use the x402 protocol: the server answers
//! `402 Payment Required` with its payment requirements, the client signs a
//! payment authorization with the configured wallet and retries once with an
//! `X-Payment` header. Enterprise users can configure an API key instead, in
//! which case no payment is made.
//!
//! ```rust,no_run
//! use nolimit_solana::{ClientConfig, KeypairSigner, NoLimitClient};
//!
//! # async fn run() -> nolimit_solana::Result<()> {
//! let signer = KeypairSigner::from_env("SOLANA_PRIVATE_KEY")?;
//! let client = NoLimitClient::new(signer, ClientConfig::default())?;
//!
//! let reply = client.chat().send("Explain proof of history").await?;
//! println!("{}", reply.message);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mixer;
pub mod signer;
pub mod swap;
pub mod tokens;
pub mod transaction;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use chat::{ChatClient, ChatMessage, ChatOptions, ChatResponse, ChatRole};
pub use client::{NoLimitClient, NoLimitClientBuilder};
pub use config::{ClientConfig, Commitment};
pub use dispatcher::{create_payment_header, PaymentAwareDispatcher};
pub use error::{NoLimitError, Result};
pub use mixer::{MixParams, MixResult, MixState, MixStatus, MixerClient};
pub use signer::{KeypairSigner, PaymentSigner};
pub use swap::{SwapClient, SwapParams, SwapQuote, SwapResult};
pub use tokens::Token;
pub use transaction::{RpcSubmitter, TransactionSubmitter};
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use types::*;

/// Current version of the SDK
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
