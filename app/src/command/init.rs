use std::path::Path;

use finchat_config::Config;

/// Strategy for first-time setup.
///
/// Writes the template to `~/finchat/config.json`, prepares the conversation
/// directory, and reports where requests will go.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        Config::create_config()?;

        let config = Config::load()?;
        let storage_dir = config.storage_dir()?;
        std::fs::create_dir_all(&storage_dir)?;

        for line in setup_summary(&config, &storage_dir) {
            println!("{line}");
        }
        Ok(())
    }
}

fn setup_summary(config: &Config, storage_dir: &Path) -> Vec<String> {
    vec![
        format!("Requests go to: {}", config.backend.endpoint),
        format!("Conversation is saved in: {}", storage_dir.display()),
        "Edit backend.endpoint if your chat proxy runs elsewhere.".to_string(),
    ]
}
