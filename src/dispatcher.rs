//! Payment-aware request dispatch
//!
//! [`PaymentAwareDispatcher::dispatch`] runs the x402 handshake for a single
//! request: probe the endpoint, and on `402 Payment Required` sign the
//! server's first accepted requirement and retry exactly once with an
//! `X-Payment` header. Nothing is shared between calls except the read-only
//! configuration, signer and transport, so one dispatcher can serve many
//! concurrent requests.

use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::signer::PaymentSigner;
use crate::transport::{Transport, TransportResponse};
use crate::types::{
    endpoints, headers, Endpoint, PaymentAuthorization, PaymentRequirements,
    PaymentRequirementsResponse, RequestOutcome,
};
use crate::{NoLimitError, Result};

/// Build the `X-Payment` header value for `requirements`.
///
/// The unsigned authorization is serialized canonically, signed once, and the
/// full record (signature included) is base64-encoded.
pub fn create_payment_header(
    requirements: &PaymentRequirements,
    signer: &dyn PaymentSigner,
) -> Result<String> {
    let authorization = PaymentAuthorization::from_requirements(requirements, signer.public_identifier());
    let signature = signer.sign(&authorization.signing_bytes()?)?;
    authorization.into_signed(&signature).to_header()
}

/// Issues requests to the noLimit server, paying with x402 when asked to
#[derive(Clone)]
pub struct PaymentAwareDispatcher {
    config: Arc<ClientConfig>,
    signer: Option<Arc<dyn PaymentSigner>>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for PaymentAwareDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentAwareDispatcher")
            .field("config", &self.config)
            .field(
                "signer",
                &self.signer.as_ref().map(|s| s.public_identifier()),
            )
            .finish_non_exhaustive()
    }
}

impl PaymentAwareDispatcher {
    pub fn new(
        config: Arc<ClientConfig>,
        signer: Option<Arc<dyn PaymentSigner>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            signer,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signer(&self) -> Option<&Arc<dyn PaymentSigner>> {
        self.signer.as_ref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Address of the configured signer, if any
    pub fn payer_address(&self) -> Option<String> {
        self.signer.as_ref().map(|s| s.public_identifier())
    }

    /// POST `body` to `endpoint`, paying once if the server answers 402.
    ///
    /// `timeout` applies to each network call; `None` uses the endpoint default.
    pub async fn dispatch(
        &self,
        endpoint: &Endpoint,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<RequestOutcome> {
        let url = self.config.endpoint_url(endpoint.path);
        let timeout = timeout.unwrap_or(endpoint.default_timeout);
        let mut request_headers = HeaderMap::new();
        request_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let Some(api_key) = &self.config.api_key {
            let mut value = HeaderValue::from_str(api_key)
                .map_err(|_| NoLimitError::config("API key is not a valid header value"))?;
            value.set_sensitive(true);
            request_headers.insert(HeaderName::from_static(headers::API_KEY), value);

            debug!("POST {} with API key", url);
            let response = self
                .transport
                .post(&url, body, &request_headers, timeout)
                .await?
                .error_for_status()?;
            return Self::outcome(response, None);
        }

        if endpoint.paid && self.signer.is_none() {
            return Err(NoLimitError::auth(format!(
                "{} requires payment but no signer is configured",
                endpoint.path
            )));
        }

        debug!("POST {}", url);
        let response = self
            .transport
            .post(&url, body, &request_headers, timeout)
            .await?;

        if response.status != StatusCode::PAYMENT_REQUIRED {
            return Self::outcome(response.error_for_status()?, None);
        }

        let signer = self.signer.as_ref().ok_or_else(|| {
            NoLimitError::auth(format!(
                "{} answered 402 but no signer is configured",
                endpoint.path
            ))
        })?;
        let requirements = PaymentRequirementsResponse::first_from_body(&response.body)?;
        info!(
            "Payment required for {}: {} of {} to {}",
            requirements.resource,
            requirements.max_amount_required,
            requirements.asset.address,
            requirements.pay_to
        );

        let payment_header = create_payment_header(&requirements, signer.as_ref())?;
        let payment_value = HeaderValue::from_str(&payment_header)
            .map_err(|_| NoLimitError::protocol("payment header is not a valid header value"))?;
        request_headers.insert(HeaderName::from_static(headers::PAYMENT), payment_value);

        debug!("POST {} with payment authorization", url);
        let retry = self
            .transport
            .post(&url, body, &request_headers, timeout)
            .await?;

        if retry.status == StatusCode::PAYMENT_REQUIRED {
            warn!("{} rejected the payment authorization", url);
            return Err(NoLimitError::protocol(format!(
                "server answered 402 again after payment: {}",
                retry.body
            )));
        }

        let retry = retry.error_for_status()?;
        let receipt = retry.header(headers::PAYMENT_RESPONSE).map(str::to_string);
        if receipt.is_none() {
            debug!("{} accepted payment without a receipt header", url);
        }
        Self::outcome(retry, receipt)
    }

    /// GET a free server path; any non-success status is a transport error
    pub async fn get(&self, path: &str, timeout: Option<Duration>) -> Result<Value> {
        let url = self.config.endpoint_url(path);
        debug!("GET {}", url);
        self.get_url(&url, timeout).await
    }

    /// GET an absolute URL outside the noLimit server
    pub async fn get_url(&self, url: &str, timeout: Option<Duration>) -> Result<Value> {
        self.transport
            .get(url, timeout.unwrap_or(endpoints::DEFAULT_TIMEOUT))
            .await?
            .error_for_status()?
            .json()
    }

    fn outcome(response: TransportResponse, payment_receipt: Option<String>) -> Result<RequestOutcome> {
        Ok(RequestOutcome {
            payload: response.json()?,
            payment_receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{verify_signature, KeypairSigner};
    use crate::types::{PaymentAsset, SignedPaymentAuthorization};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned responses and records every request
    struct ScriptedTransport {
        responses: Mutex<Vec<TransportResponse>>,
        requests: Mutex<Vec<HeaderMap>>,
    }

    impl ScriptedTransport {
        fn new(mut responses: Vec<TransportResponse>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request_headers(&self, i: usize) -> HeaderMap {
            self.requests.lock().unwrap()[i].clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(
            &self,
            _url: &str,
            _body: &Value,
            headers: &HeaderMap,
            _timeout: Duration,
        ) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(headers.clone());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| NoLimitError::transport("no scripted response left"))
        }

        async fn get(&self, _url: &str, _timeout: Duration) -> Result<TransportResponse> {
            self.requests.lock().unwrap().push(HeaderMap::new());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| NoLimitError::transport("no scripted response left"))
        }
    }

    /// Counts signatures while delegating to a real keypair
    struct CountingSigner {
        inner: KeypairSigner,
        count: AtomicUsize,
    }

    impl PaymentSigner for CountingSigner {
        fn public_identifier(&self) -> String {
            self.inner.public_identifier()
        }

        fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.inner.sign(message)
        }
    }

    fn response(status: u16, body: Value, receipt: Option<&str>) -> TransportResponse {
        let mut headers = HeaderMap::new();
        if let Some(receipt) = receipt {
            headers.insert("x-payment-response", receipt.parse().unwrap());
        }
        TransportResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: body.to_string(),
        }
    }

    fn payment_required() -> TransportResponse {
        response(
            402,
            json!({
                "accepts": [{
                    "payTo": "PayeeAddr111",
                    "maxAmountRequired": "1000000",
                    "asset": { "address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v" },
                    "resource": "/chat"
                }]
            }),
            None,
        )
    }

    fn dispatcher(
        transport: Arc<ScriptedTransport>,
        signer: Option<Arc<CountingSigner>>,
        api_key: Option<&str>,
    ) -> PaymentAwareDispatcher {
        let mut config = ClientConfig::new("http://nolimit.test");
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        PaymentAwareDispatcher::new(
            Arc::new(config),
            signer.map(|s| s as Arc<dyn PaymentSigner>),
            transport,
        )
    }

    fn counting_signer() -> Arc<CountingSigner> {
        Arc::new(CountingSigner {
            inner: KeypairSigner::generate(),
            count: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![response(200, json!({"response": "hi"}), None)]);
        let signer = counting_signer();
        let outcome = dispatcher(transport.clone(), Some(signer.clone()), None)
            .dispatch(&endpoints::CHAT, &json!({"message": "hello"}), None)
            .await
            .unwrap();

        assert_eq!(outcome.payload["response"], "hi");
        assert_eq!(outcome.payment_receipt, None);
        assert_eq!(transport.calls(), 1);
        assert_eq!(signer.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_payment_flow_signs_once_and_retries_once() {
        let transport = ScriptedTransport::new(vec![
            payment_required(),
            response(200, json!({"response": "paid answer"}), Some("receipt-abc")),
        ]);
        let signer = counting_signer();
        let outcome = dispatcher(transport.clone(), Some(signer.clone()), None)
            .dispatch(&endpoints::CHAT, &json!({"message": "hello"}), None)
            .await
            .unwrap();

        assert_eq!(outcome.payload["response"], "paid answer");
        assert_eq!(outcome.payment_receipt.as_deref(), Some("receipt-abc"));
        assert_eq!(transport.calls(), 2);
        assert_eq!(signer.count.load(Ordering::SeqCst), 1);
        assert!(transport.request_headers(0).get("x-payment").is_none());

        let header = transport.request_headers(1);
        let header = header.get("x-payment").unwrap().to_str().unwrap();
        let signed = SignedPaymentAuthorization::from_header(header).unwrap();
        assert_eq!(signed.authorization.to, "PayeeAddr111");
        assert_eq!(signed.authorization.amount, "1000000");
        assert_eq!(signed.authorization.asset, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        assert_eq!(signed.authorization.resource, "/chat");
        assert_eq!(signed.authorization.from, signer.public_identifier());
        assert!(verify_signature(
            &signed.authorization.from,
            &signed.authorization.signing_bytes().unwrap(),
            &signed.signature_bytes().unwrap(),
        )
        .unwrap());
    }

    #[tokio::test]
    async fn test_paid_endpoint_without_signer_makes_no_calls() {
        let transport = ScriptedTransport::new(vec![]);
        let err = dispatcher(transport.clone(), None, None)
            .dispatch(&endpoints::SWAP, &json!({}), None)
            .await
            .unwrap_err();

        assert!(err.is_auth(), "got {:?}", err);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_402_without_signer_is_auth_error() {
        let transport = ScriptedTransport::new(vec![payment_required()]);
        let err = dispatcher(transport.clone(), None, None)
            .dispatch(&endpoints::CHAT_API, &json!({}), None)
            .await
            .unwrap_err();

        assert!(err.is_auth(), "got {:?}", err);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_402_is_protocol_error() {
        let transport = ScriptedTransport::new(vec![payment_required(), payment_required(), payment_required()]);
        let err = dispatcher(transport.clone(), Some(counting_signer()), None)
            .dispatch(&endpoints::CHAT, &json!({}), None)
            .await
            .unwrap_err();

        assert!(err.is_protocol(), "got {:?}", err);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_402_is_protocol_error() {
        let transport = ScriptedTransport::new(vec![response(402, json!({"error": "pay me"}), None)]);
        let signer = counting_signer();
        let err = dispatcher(transport.clone(), Some(signer.clone()), None)
            .dispatch(&endpoints::CHAT, &json!({}), None)
            .await
            .unwrap_err();

        assert!(err.is_protocol(), "got {:?}", err);
        assert_eq!(transport.calls(), 1);
        assert_eq!(signer.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_failure_is_transport_error() {
        let transport = ScriptedTransport::new(vec![
            payment_required(),
            response(500, json!({"error": "settlement failed"}), None),
        ]);
        let err = dispatcher(transport, Some(counting_signer()), None)
            .dispatch(&endpoints::CHAT, &json!({}), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("settlement failed"));
    }

    #[tokio::test]
    async fn test_first_attempt_failure_is_transport_error() {
        let transport = ScriptedTransport::new(vec![response(404, json!({"error": "no route"}), None)]);
        let err = dispatcher(transport.clone(), Some(counting_signer()), None)
            .dispatch(&endpoints::CHAT, &json!({}), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_api_key_bypasses_payment() {
        let transport = ScriptedTransport::new(vec![payment_required()]);
        let signer = counting_signer();
        let err = dispatcher(transport.clone(), Some(signer.clone()), Some("enterprise"))
            .dispatch(&endpoints::CHAT_API, &json!({}), None)
            .await
            .unwrap_err();

        assert!(err.is_transport(), "got {:?}", err);
        assert_eq!(err.status(), Some(402));
        assert_eq!(transport.calls(), 1);
        assert_eq!(signer.count.load(Ordering::SeqCst), 0);
        assert_eq!(
            transport.request_headers(0).get("x-api-key").unwrap(),
            "enterprise"
        );
    }

    #[tokio::test]
    async fn test_api_key_without_signer_on_paid_endpoint() {
        let transport = ScriptedTransport::new(vec![response(200, json!({"response": "ok"}), None)]);
        let outcome = dispatcher(transport.clone(), None, Some("enterprise"))
            .dispatch(&endpoints::CHAT, &json!({}), None)
            .await
            .unwrap();

        assert_eq!(outcome.payload["response"], "ok");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_create_payment_header_scenario() {
        let signer = KeypairSigner::generate();
        let requirements = PaymentRequirements {
            pay_to: "PayeeAddr111".to_string(),
            max_amount_required: "1000000".to_string(),
            asset: PaymentAsset {
                address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            },
            resource: "/chat".to_string(),
        };

        let before = chrono::Utc::now().timestamp_millis();
        let header = create_payment_header(&requirements, &signer).unwrap();
        let after = chrono::Utc::now().timestamp_millis();

        let signed = SignedPaymentAuthorization::from_header(&header).unwrap();
        assert_eq!(signed.authorization.version, "1");
        assert_eq!(signed.authorization.network, "solana");
        assert!(signed.authorization.timestamp >= before && signed.authorization.timestamp <= after);
    }
}
