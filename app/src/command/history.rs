use chrono::{DateTime, Local};
use finchat_config::Config;
use finchat_core::{ConversationStorage, Message, Sender};

use super::open_storage;

/// Strategy for printing the saved transcript.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStrategy;

impl super::CommandStrategy for HistoryStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let conversation = open_storage(&config)?.load().await;

        if conversation.is_empty() {
            println!("No saved conversation.");
            return Ok(());
        }

        if let Some(id) = &conversation.conversation_id {
            println!("Conversation: {id}\n");
        }

        for message in &conversation.messages {
            println!("{}", format_line(message));
        }

        Ok(())
    }
}

fn format_line(message: &Message) -> String {
    let speaker = match message.sender {
        Sender::User => "You",
        Sender::Assistant => "Assistant",
    };
    format!(
        "[{}] {speaker}: {}",
        format_time(&message.timestamp),
        message.content
    )
}

/// Local `HH:MM`, or the raw value when it is not RFC 3339.
fn format_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| timestamp.to_string(),
        |t| t.with_timezone(&Local).format("%H:%M").to_string(),
    )
}
