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

//! Durable storage for the chat history.
//!
//! Storage is split in two layers, the way a browser splits local storage
//! from the code that uses it:
//! - a [`KeyValueStore`] holds opaque strings under string keys;
//! - [`LocalConversationStorage`] maps a conversation onto two keys of
//!   such a store and implements `ConversationStorage`.

mod error;
mod file;
mod kv;
mod local;

pub use error::{Result, StorageError};
pub use file::FileKeyValueStore;
pub use kv::{KeyValueStore, MemoryKeyValueStore};
pub use local::{CONVERSATION_ID_KEY, LocalConversationStorage, MESSAGES_KEY};
