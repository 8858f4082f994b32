//! In-memory message log backed by durable storage.
//!
//! The log only grows: entries are appended at the end and never edited,
//! removed or reordered. Every append is followed by a save.

use finchat_core::{Conversation, ConversationStorage, Message};
use tracing::{debug, warn};

/// Ordered log of turns plus the conversation id, mirrored to storage.
#[derive(Debug)]
pub struct MessageStore<S> {
    storage: S,
    conversation: Conversation,
}

impl<S: ConversationStorage> MessageStore<S> {
    /// Create an empty store. Call [`Self::load`] to hydrate it.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            conversation: Conversation::default(),
        }
    }

    /// Replace the in-memory state with what storage holds.
    ///
    /// Missing or unreadable state leaves the store empty.
    pub async fn load(&mut self) {
        self.conversation = self.storage.load().await;
        debug!(
            "Hydrated message store with {} messages",
            self.conversation.messages.len()
        );
    }

    /// Add a message at the end of the log and save.
    ///
    /// A failed save is logged; the message stays in memory.
    pub async fn append(&mut self, message: Message) {
        self.conversation.messages.push(message);
        self.persist().await;
    }

    /// Every message, oldest first.
    #[must_use]
    pub fn all(&self) -> &[Message] {
        &self.conversation.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.conversation.messages.last()
    }

    #[must_use]
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation.conversation_id.as_deref()
    }

    /// Take `id` as the conversation id unless one is already held.
    ///
    /// Returns whether the id was adopted. The new id reaches storage with the
    /// next save.
    pub fn adopt_conversation_id(&mut self, id: String) -> bool {
        if self.conversation.conversation_id.is_some() {
            return false;
        }
        debug!("Adopting conversation id {id}");
        self.conversation.conversation_id = Some(id);
        true
    }

    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[must_use]
    pub const fn message_count(&self) -> usize {
        self.conversation.messages.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.conversation.messages.is_empty()
    }

    async fn persist(&self) {
        if let Err(e) = self.storage.save(&self.conversation).await {
            warn!("Failed to save conversation: {e:#}");
        }
    }
}
