//! Chat client for the noLimit LLM

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dispatcher::PaymentAwareDispatcher;
use crate::types::endpoints;
use crate::Result;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// A previous message sent as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat options
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Previous messages for context
    pub history: Vec<ChatMessage>,
    /// Per-request timeout; defaults to 60 seconds
    pub timeout: Option<Duration>,
}

/// Chat reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// AI response text
    pub message: String,
    /// x402 payment receipt, present when the call was paid
    pub payment_receipt: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(rename = "userAddress")]
    user_address: String,
    #[serde(rename = "conversationHistory", skip_serializing_if = "<[_]>::is_empty")]
    conversation_history: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatApiResponse {
    response: String,
}

/// Chat client
#[derive(Debug, Clone)]
pub struct ChatClient {
    dispatcher: PaymentAwareDispatcher,
}

impl ChatClient {
    pub fn new(dispatcher: PaymentAwareDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Send a message
    pub async fn send(&self, message: &str) -> Result<ChatResponse> {
        self.send_with_options(message, ChatOptions::default()).await
    }

    /// Send a message with conversation history or a custom timeout
    pub async fn send_with_options(&self, message: &str, options: ChatOptions) -> Result<ChatResponse> {
        let endpoint = if self.dispatcher.config().api_key.is_some() {
            endpoints::CHAT_API
        } else {
            endpoints::CHAT
        };

        let request = ChatRequest {
            message,
            user_address: self
                .dispatcher
                .payer_address()
                .unwrap_or_else(|| "anonymous".to_string()),
            conversation_history: &options.history,
        };

        let outcome = self
            .dispatcher
            .dispatch(&endpoint, &serde_json::to_value(&request)?, options.timeout)
            .await?
            .decode::<ChatApiResponse>()?;

        Ok(ChatResponse {
            message: outcome.payload.response,
            payment_receipt: outcome.payment_receipt,
        })
    }
}
