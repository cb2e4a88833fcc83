//! Top-level client wiring configuration, signer and transport together

use std::sync::Arc;

use crate::chat::ChatClient;
use crate::config::ClientConfig;
use crate::dispatcher::PaymentAwareDispatcher;
use crate::mixer::MixerClient;
use crate::signer::PaymentSigner;
use crate::swap::SwapClient;
use crate::transaction::{RpcSubmitter, TransactionSubmitter};
use crate::transport::{HttpTransport, Transport};
use crate::Result;

/// Client for the noLimit services
#[derive(Debug, Clone)]
pub struct NoLimitClient {
    dispatcher: PaymentAwareDispatcher,
    chat: ChatClient,
    swap: SwapClient,
    mixer: MixerClient,
}

impl NoLimitClient {
    /// Create a client paying with `signer` against the given configuration
    pub fn new<S>(signer: S, config: ClientConfig) -> Result<Self>
    where
        S: PaymentSigner + 'static,
    {
        NoLimitClientBuilder::new(config).signer(signer).build()
    }

    /// Create a client that only uses an enterprise API key
    pub fn with_api_key(api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        NoLimitClientBuilder::new(config.with_api_key(api_key)).build()
    }

    pub fn builder(config: ClientConfig) -> NoLimitClientBuilder {
        NoLimitClientBuilder::new(config)
    }

    pub fn chat(&self) -> &ChatClient {
        &self.chat
    }

    pub fn swap(&self) -> &SwapClient {
        &self.swap
    }

    pub fn mixer(&self) -> &MixerClient {
        &self.mixer
    }

    /// The underlying dispatcher, for endpoints without a dedicated client
    pub fn dispatcher(&self) -> &PaymentAwareDispatcher {
        &self.dispatcher
    }

    /// Payer address, if a signer is configured
    pub fn pubkey(&self) -> Option<String> {
        self.dispatcher.payer_address()
    }
}

/// Builder for [`NoLimitClient`]
pub struct NoLimitClientBuilder {
    config: ClientConfig,
    signer: Option<Arc<dyn PaymentSigner>>,
    transport: Option<Arc<dyn Transport>>,
    submitter: Option<Arc<dyn TransactionSubmitter>>,
}

impl NoLimitClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            signer: None,
            transport: None,
            submitter: None,
        }
    }

    pub fn signer<S: PaymentSigner + 'static>(mut self, signer: S) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn shared_signer(mut self, signer: Arc<dyn PaymentSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replace the default reqwest transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the default JSON-RPC submitter
    pub fn submitter(mut self, submitter: Arc<dyn TransactionSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn build(self) -> Result<NoLimitClient> {
        self.config.validate()?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new()));
        let submitter = self.submitter.unwrap_or_else(|| {
            Arc::new(
                RpcSubmitter::new(self.config.rpc_url.clone(), transport.clone())
                    .with_commitment(self.config.commitment),
            )
        });
        let dispatcher =
            PaymentAwareDispatcher::new(Arc::new(self.config), self.signer, transport);

        Ok(NoLimitClient {
            chat: ChatClient::new(dispatcher.clone()),
            swap: SwapClient::new(dispatcher.clone(), Some(submitter)),
            mixer: MixerClient::new(dispatcher.clone()),
            dispatcher,
        })
    }
}
