//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input type, so
//! dispatch in `main` is fully static.

use std::time::Duration;

use finchat_config::Config;
use finchat_providers::HttpChatBackend;
use finchat_storage::{FileKeyValueStore, LocalConversationStorage};
use tracing::info;

mod chat;
mod history;
mod info;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use history::HistoryStrategy;
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Conversation storage rooted at the configured directory.
fn open_storage(config: &Config) -> anyhow::Result<LocalConversationStorage<FileKeyValueStore>> {
    let dir = config.storage_dir()?;
    info!("Conversation storage: {}", dir.display());
    Ok(LocalConversationStorage::new(FileKeyValueStore::new(dir)))
}

/// HTTP backend for the configured endpoint, with the optional timeout.
fn build_backend(config: &Config) -> anyhow::Result<HttpChatBackend> {
    let backend = HttpChatBackend::new(config.backend.endpoint.clone());
    match config.backend.timeout_secs {
        Some(secs) => Ok(backend.with_timeout(Duration::from_secs(secs))?),
        None => Ok(backend),
    }
}

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
