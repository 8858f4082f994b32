use std::time::Duration;

use async_trait::async_trait;
use finchat_core::{ChatBackend, ChatReply, ChatRequest};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Server responded with status: {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Chat-completion backend reached with one JSON `POST` per turn.
///
/// No retries and no timeout unless one is set with [`Self::with_timeout`].
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        info!("Creating HttpChatBackend for {endpoint}");
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Rebuild the client with a whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, BackendError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn try_send(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: serde_json::Value = serde_json::from_str(&body)?;

        Ok(ChatReply::from_json(&payload))
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> anyhow::Result<ChatReply> {
        info!(
            "Sending chat request: model={}, {} messages, conversation_id={:?}",
            request.model,
            request.messages.len(),
            request.conversation_id
        );

        let reply = self.try_send(request).await?;

        debug!(
            "Received chat response (content present: {})",
            reply.content.is_some()
        );
        Ok(reply)
    }
}
