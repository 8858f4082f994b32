//! Conversation command, single-shot or interactive.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use finchat_config::Config;
use finchat_conversation::{ConversationManager, SendOutcome};
use finchat_core::{ChatBackend, ConversationStorage, FinancialSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::{build_backend, open_storage};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Optional model override
    pub model: Option<String>,
    /// Turn the privacy flag on from the start
    pub personal_data: bool,
    /// JSON file with accounts, budgets and transactions
    pub snapshot: Option<PathBuf>,
}

/// Strategy for executing the Chat command.
///
/// Resumes the saved conversation, sends one message or runs a prompt loop,
/// and leaves the updated history on disk.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        let mut conversation_config = config.conversation_config();
        if let Some(model) = input.model {
            conversation_config = conversation_config.with_model(model);
        }
        if input.personal_data {
            conversation_config = conversation_config.with_personal_data(true);
        }

        let mut manager = ConversationManager::new(
            build_backend(&config)?,
            open_storage(&config)?,
            conversation_config,
        )
        .await;

        if let Some(path) = input.snapshot {
            let snapshot = load_snapshot(&path)?;
            info!(
                "Loaded snapshot from {}: {} accounts, {} budgets, {} transactions",
                path.display(),
                snapshot.accounts.len(),
                snapshot.budgets.len(),
                snapshot.transactions.len()
            );
            manager = manager.with_snapshot_source(Arc::new(snapshot));
        }

        if let Some(msg) = input.message {
            print_outcome(&manager.send_message(&msg).await);
        } else {
            run_interactive(&manager).await?;
        }

        Ok(())
    }
}

fn load_snapshot(path: &Path) -> anyhow::Result<FinancialSnapshot> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read snapshot {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

fn print_outcome(outcome: &SendOutcome) {
    if let Some(reply) = outcome.reply() {
        println!("\n{}\n", reply.content);
    }
}

async fn run_interactive<B, S>(manager: &ConversationManager<B, S>) -> anyhow::Result<()>
where
    B: ChatBackend,
    S: ConversationStorage,
{
    println!("=== finchat ===");
    println!("How can I help you today?");
    println!("Commands: /data on|off, /prompt, exit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "exit" | "quit" | "q" => break,
            "/data on" => {
                manager.set_include_personal_data(true);
                println!("Financial data will be included in requests.");
            }
            "/data off" => {
                manager.set_include_personal_data(false);
                println!("Financial data will not be included in requests.");
            }
            "/prompt" => println!("{}", manager.system_prompt()),
            _ => print_outcome(&manager.send_message(input).await),
        }
    }

    println!(
        "\nSession ended. {} messages saved.",
        manager.messages().await.len()
    );
    Ok(())
}
