//! Conversation manager for multi-turn dialogue.
//!
//! The `ConversationManager` is the main entry point: it turns user input
//! into backend requests and folds the answers back into the message log.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use finchat_core::{
    ChatBackend, ChatRequest, ConversationStorage, Message, SnapshotSource, build_system_prompt,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::history::build_llm_messages;
use crate::store::MessageStore;

/// Assistant turn recorded when the exchange with the backend fails.
pub const FAILURE_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Assistant turn recorded when the backend answers in an unknown shape.
pub const UNEXPECTED_FORMAT_REPLY: &str = "Sorry, I received an unexpected response format.";

/// Fixed request parameters and the initial privacy setting.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Model identifier sent with every request
    pub model: String,
    /// Temperature for sampling
    pub temperature: f32,
    /// Max tokens in response
    pub max_tokens: u32,
    /// Initial value of the privacy flag
    pub include_personal_data: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            include_personal_data: false,
        }
    }
}

impl ConversationConfig {
    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn with_personal_data(mut self, include: bool) -> Self {
        self.include_personal_data = include;
        self
    }
}

/// Whether a request is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The input was empty after trimming.
    EmptyInput,
    /// Another request was still in flight.
    Busy,
}

/// What a call to [`ConversationManager::send_message`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was appended and nothing was sent.
    Ignored(IgnoreReason),
    /// The backend replied; the reply was appended.
    Replied(Message),
    /// The backend answered in an unknown shape; a notice was appended.
    UnexpectedFormat(Message),
    /// The exchange failed; an apology was appended.
    Failed(Message),
}

impl SendOutcome {
    /// The assistant message appended by this call, if any.
    #[must_use]
    pub const fn reply(&self) -> Option<&Message> {
        match self {
            Self::Ignored(_) => None,
            Self::Replied(message) | Self::UnexpectedFormat(message) | Self::Failed(message) => {
                Some(message)
            }
        }
    }
}

/// Holds the `sending` flag for the duration of one turn.
///
/// Dropping the guard always returns the manager to idle, including when the
/// turn's future is dropped before it finishes.
struct SendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Multi-turn conversation manager.
///
/// Allows one request in flight at a time. A submission made while a request
/// is pending is dropped, not queued.
pub struct ConversationManager<B = Arc<dyn ChatBackend>, S = Arc<dyn ConversationStorage>> {
    backend: B,
    store: Mutex<MessageStore<S>>,
    snapshot_source: Option<Arc<dyn SnapshotSource>>,
    include_personal_data: AtomicBool,
    sending: AtomicBool,
    config: ConversationConfig,
}

impl<B, S> ConversationManager<B, S>
where
    B: ChatBackend,
    S: ConversationStorage,
{
    /// Create a manager and hydrate its history from `storage`.
    pub async fn new(backend: B, storage: S, config: ConversationConfig) -> Self {
        let mut store = MessageStore::new(storage);
        store.load().await;

        info!(
            "Creating conversation manager: {} stored messages, conversation id {:?}",
            store.message_count(),
            store.conversation_id()
        );

        Self {
            backend,
            store: Mutex::new(store),
            snapshot_source: None,
            include_personal_data: AtomicBool::new(config.include_personal_data),
            sending: AtomicBool::new(false),
            config,
        }
    }

    /// Attach the provider of financial snapshots.
    #[must_use]
    pub fn with_snapshot_source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.snapshot_source = Some(source);
        self
    }

    /// Process one user submission.
    ///
    /// Empty input and submissions made while another request is pending are
    /// ignored. Otherwise the user turn is appended, one request is sent, and
    /// exactly one assistant turn (reply, format notice or apology) follows.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let content = text.trim();
        if content.is_empty() {
            debug!("Ignoring empty submission");
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }

        let Some(_sending) = SendingGuard::acquire(&self.sending) else {
            debug!("Request already in flight, dropping submission");
            return SendOutcome::Ignored(IgnoreReason::Busy);
        };

        let (history, conversation_id) = {
            let mut store = self.store.lock().await;
            let history = store.all().to_vec();
            store.append(Message::user(content)).await;
            (history, store.conversation_id().map(str::to_string))
        };

        let request = ChatRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            conversation_id,
            messages: build_llm_messages(&self.system_prompt(), &history, content),
        };

        info!(
            "Processing turn {} (conversation id {:?})",
            history.len() / 2 + 1,
            request.conversation_id
        );

        let result = self.backend.send(&request).await;

        let mut store = self.store.lock().await;
        let outcome = match result {
            Ok(reply) => {
                let adopted = reply
                    .conversation_id
                    .is_some_and(|id| store.adopt_conversation_id(id));
                if adopted {
                    info!("Conversation id assigned: {:?}", store.conversation_id());
                }

                if let Some(text) = reply.content {
                    SendOutcome::Replied(Message::assistant(text))
                } else {
                    warn!("Unexpected response format from chat backend");
                    SendOutcome::UnexpectedFormat(Message::assistant(UNEXPECTED_FORMAT_REPLY))
                }
            }
            Err(e) => {
                warn!("Error communicating with chat backend: {e:#}");
                SendOutcome::Failed(Message::assistant(FAILURE_REPLY))
            }
        };

        if let Some(reply) = outcome.reply() {
            store.append(reply.clone()).await;
        }

        debug!("Turn completed with {} messages", store.message_count());
        outcome
    }

    /// The system prompt the next turn would send.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let include = self.include_personal_data();
        let snapshot = if include {
            self.snapshot_source
                .as_ref()
                .and_then(|source| source.snapshot())
        } else {
            None
        };
        build_system_prompt(snapshot.as_ref(), include)
    }

    #[must_use]
    pub fn include_personal_data(&self) -> bool {
        self.include_personal_data.load(Ordering::Acquire)
    }

    pub fn set_include_personal_data(&self, include: bool) {
        info!("Personal data in prompts: {include}");
        self.include_personal_data.store(include, Ordering::Release);
    }

    #[must_use]
    pub fn state(&self) -> TurnState {
        if self.sending.load(Ordering::Acquire) {
            TurnState::Sending
        } else {
            TurnState::Idle
        }
    }

    /// Snapshot of the message log, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.store.lock().await.all().to_vec()
    }

    pub async fn conversation_id(&self) -> Option<String> {
        self.store
            .lock()
            .await
            .conversation_id()
            .map(str::to_string)
    }

    #[must_use]
    pub const fn config(&self) -> &ConversationConfig {
        &self.config
    }
}
