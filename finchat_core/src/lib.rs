#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod prompt;
pub mod snapshot;

pub use prompt::{DEFAULT_SYSTEM_PROMPT, build_system_prompt, format_minor_units};
pub use snapshot::{Account, Budget, FinancialSnapshot, SnapshotSource, Transaction};

/// Role of an entry in a backend request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Author of a stored turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    /// Older widget builds persisted assistant turns as `"ai"`.
    #[serde(alias = "ai")]
    Assistant,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Self::User,
            Sender::Assistant => Self::Assistant,
        }
    }
}

/// One turn of the conversation as displayed and persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    /// RFC 3339 UTC timestamp, e.g. `2026-10-18T09:30:00.123Z`.
    pub timestamp: String,
}

impl Message {
    /// Create a message stamped with a fresh v7 id and the current time.
    #[must_use]
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content)
    }

    /// View of this turn as a backend request entry.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.sender.into(), self.content.clone())
    }
}

/// Ordered message log plus the server-assigned conversation id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub conversation_id: Option<String>,
}

impl Conversation {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Body of one chat-completion request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// What the backend answered, after the transport succeeded.
///
/// `content` is `None` when the payload parsed but did not have the
/// `choices[0].message.content` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub conversation_id: Option<String>,
    pub content: Option<String>,
}

impl ChatReply {
    /// Pick the reply text and conversation id out of a decoded payload.
    #[must_use]
    pub fn from_json(payload: &serde_json::Value) -> Self {
        let conversation_id = payload["conversation_id"]
            .as_str()
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string);

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string);

        Self {
            conversation_id,
            content,
        }
    }
}

/// Transport to the remote chat-completion service.
///
/// An `Err` means the exchange itself failed (connection, status, body
/// decoding). A payload with an unexpected shape is still `Ok`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> anyhow::Result<ChatReply>;
}

/// Durable home of the conversation.
///
/// `load` never fails: missing or unreadable state comes back as an empty
/// conversation.
#[async_trait]
pub trait ConversationStorage: Send + Sync {
    async fn load(&self) -> Conversation;
    async fn save(&self, conversation: &Conversation) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> anyhow::Result<ChatReply> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: ConversationStorage + ?Sized> ConversationStorage for Arc<T> {
    async fn load(&self) -> Conversation {
        (**self).load().await
    }

    async fn save(&self, conversation: &Conversation) -> anyhow::Result<()> {
        (**self).save(conversation).await
    }
}
