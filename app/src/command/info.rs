use finchat_config::Config;
use finchat_core::ConversationStorage;

use super::open_storage;

/// Strategy for displaying configuration and conversation state.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== finchat Configuration ===\n");

        println!("Backend:");
        println!("  Endpoint: {}", config.backend.endpoint);
        match config.backend.timeout_secs {
            Some(secs) => println!("  Timeout: {secs}s"),
            None => println!("  Timeout: none"),
        }
        println!();

        println!("Chat:");
        println!("  Model: {}", config.chat.model);
        println!("  Temperature: {}", config.chat.temperature);
        println!("  Max tokens: {}", config.chat.max_tokens);
        println!(
            "  Include personal data: {}",
            config.chat.include_personal_data
        );
        println!();

        let storage_dir = config.storage_dir()?;
        let conversation = open_storage(&config)?.load().await;

        println!("Conversation:");
        println!("  Storage: {}", storage_dir.display());
        println!("  Messages: {}", conversation.messages.len());
        println!(
            "  Conversation id: {}",
            conversation.conversation_id.as_deref().unwrap_or("(not assigned)")
        );

        Ok(())
    }
}
