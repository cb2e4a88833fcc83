//! HTTP transport capability
//!
//! The dispatcher talks to the network only through [`Transport`], so tests
//! and embedders can substitute their own HTTP stack.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::{NoLimitError, Result};

/// Raw response returned by a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON; an empty body is `null`
    pub fn json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turn a non-success status into a transport error carrying the body
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(NoLimitError::http_status(self.status.as_u16(), self.body))
        }
    }
}

/// Performs HTTP calls on behalf of the SDK
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body
    async fn post(
        &self,
        url: &str,
        body: &Value,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse>;

    /// GET a resource
    async fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a shared reqwest client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing reqwest client and its connection pool
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn read(response: reqwest::Response) -> Result<TransportResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .timeout(timeout)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        Self::read(response).await
    }
}
