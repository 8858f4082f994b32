use async_trait::async_trait;
use finchat_core::{Conversation, ConversationStorage, Message};
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::kv::KeyValueStore;

/// Key holding the JSON array of messages.
pub const MESSAGES_KEY: &str = "chat_messages";

/// Key holding the raw conversation id string.
pub const CONVERSATION_ID_KEY: &str = "conversation_id";

/// Conversation persistence on top of a [`KeyValueStore`].
///
/// The message log and the conversation id live under independent keys and
/// are read independently, so a damaged log does not cost the id and vice
/// versa.
#[derive(Debug)]
pub struct LocalConversationStorage<K> {
    store: K,
}

impl<K: KeyValueStore> LocalConversationStorage<K> {
    pub const fn new(store: K) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &K {
        &self.store
    }

    async fn load_messages(&self) -> Vec<Message> {
        let raw = match self.store.get(MESSAGES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read saved chat messages: {e:#}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Error parsing saved chat messages, starting empty: {e}");
                Vec::new()
            }
        }
    }

    async fn load_conversation_id(&self) -> Option<String> {
        match self.store.get(CONVERSATION_ID_KEY).await {
            Ok(Some(raw)) if raw.trim().is_empty() => {
                debug!("Ignoring blank saved conversation id");
                None
            }
            Ok(Some(raw)) => Some(raw),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read saved conversation id: {e:#}");
                None
            }
        }
    }
}

#[async_trait]
impl<K: KeyValueStore> ConversationStorage for LocalConversationStorage<K> {
    async fn load(&self) -> Conversation {
        let conversation = Conversation {
            messages: self.load_messages().await,
            conversation_id: self.load_conversation_id().await,
        };

        info!(
            "Loaded conversation: {} messages, id {:?}",
            conversation.messages.len(),
            conversation.conversation_id
        );
        conversation
    }

    async fn save(&self, conversation: &Conversation) -> anyhow::Result<()> {
        let messages_json =
            serde_json::to_string(&conversation.messages).map_err(StorageError::from)?;
        self.store.set(MESSAGES_KEY, &messages_json).await?;

        if let Some(id) = &conversation.conversation_id {
            self.store.set(CONVERSATION_ID_KEY, id).await?;
        }

        debug!("Saved {} messages", conversation.messages.len());
        Ok(())
    }
}
