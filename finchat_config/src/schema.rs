use finchat_conversation::ConversationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatDefaults,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    #[serde(default = "BackendConfig::default_endpoint")]
    pub endpoint: String,
    /// Whole-request timeout enforced by the HTTP client. None waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    fn default_endpoint() -> String {
        "http://127.0.0.1:5000/api/chat".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChatDefaults {
    #[serde(default = "ChatDefaults::default_model")]
    pub model: String,
    #[serde(default = "ChatDefaults::default_temperature")]
    pub temperature: f32,
    #[serde(default = "ChatDefaults::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub include_personal_data: bool,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            max_tokens: Self::default_max_tokens(),
            include_personal_data: false,
        }
    }
}

impl ChatDefaults {
    fn default_model() -> String {
        "gpt-3.5-turbo".to_string()
    }

    const fn default_temperature() -> f32 {
        0.7
    }

    const fn default_max_tokens() -> u32 {
        1000
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding the saved conversation. Defaults to
    /// `~/finchat/conversation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("finchat"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'finchat init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = serde_json::from_str(&content)?;

        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Where the conversation is persisted.
    pub fn storage_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.storage.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("conversation")),
        }
    }

    #[must_use]
    pub fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig::default()
            .with_model(self.chat.model.clone())
            .with_temperature(self.chat.temperature)
            .with_max_tokens(self.chat.max_tokens)
            .with_personal_data(self.chat.include_personal_data)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        let config_path = config_dir.join("config.json");

        Self::create_config_at(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Point backend.endpoint at your chat proxy");
        println!("   2. Run 'finchat chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - chat.model: model identifier sent with every request");
        println!("   - chat.include_personal_data: summarize your finances into the prompt");
        println!("   - backend.timeout_secs: give up on a request after this many seconds");
        println!();
        Ok(())
    }

    /// Write the template to `config_path`, refusing to replace an existing file.
    pub fn create_config_at(config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let config_template = r#"{
  "backend": {
    "endpoint": "http://127.0.0.1:5000/api/chat",
    "timeout_secs": 60
  },
  "chat": {
    "model": "gpt-3.5-turbo",
    "temperature": 0.7,
    "max_tokens": 1000,
    "include_personal_data": false
  },
  "storage": {}
}"#;

        std::fs::write(config_path, config_template)?;
        Ok(())
    }
}
