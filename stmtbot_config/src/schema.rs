use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// The conversation section is owned by the engine; reuse it as-is.
use stmtbot_core::ConversationConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub conversation: ConversationConfig,
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    #[serde(default = "SheetsConfig::default_range")]
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "SheetsConfig::default_base_url")]
    pub base_url: String,
}

impl SheetsConfig {
    fn default_range() -> String {
        "A:M".to_string()
    }

    fn default_base_url() -> String {
        "https://sheets.googleapis.com".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
}

const CONFIG_TEMPLATE: &str = r#"{
  "conversation": {
    "trigger_phrase": "@hikstatement",
    "bot_name": "HikStatement",
    "warn_after_secs": 2400,
    "terminate_after_secs": 2400,
    "operators": ["123456789"]
  },
  "sheets": {
    "spreadsheet_id": "your-spreadsheet-id-here",
    "range": "A:M",
    "api_key": "your-google-api-key-here"
  },
  "telegram": {
    "enabled": true,
    "token": "your-telegram-bot-token-here"
  }
}"#;

impl Config {
    fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("stmtbot"))
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
                "Config file not found at: {}. Please run 'stmtbot init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.conversation.trigger_phrase.trim().is_empty() {
            anyhow::bail!("conversation.trigger_phrase must not be empty");
        }
        if self.conversation.warn_after_secs == 0 || self.conversation.terminate_after_secs == 0 {
            anyhow::bail!("conversation idle intervals must be greater than zero");
        }
        if self.sheets.spreadsheet_id.trim().is_empty() {
            anyhow::bail!("sheets.spreadsheet_id must not be empty");
        }
        Ok(())
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");
        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set sheets.spreadsheet_id and a Google API key or access token");
        println!("   2. Set telegram.token to your bot token");
        println!("   3. List operator chat ids under conversation.operators");
        println!("   4. Run 'stmtbot run' to start the bot");
        println!();
        Ok(())
    }

    pub fn write_template(config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(config_path, CONFIG_TEMPLATE)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_template_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        Config::write_template(&path).expect("write template");
        let config = Config::load_from(&path).expect("load template");

        assert_eq!(config.conversation.trigger_phrase, "@hikstatement");
        assert_eq!(config.conversation.operators, vec!["123456789"]);
        assert_eq!(config.sheets.range, "A:M");
        assert_eq!(config.sheets.base_url, "https://sheets.googleapis.com");
        assert!(config.telegram.enabled);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_template_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        Config::write_template(&path).expect("write template");
        assert!(Config::write_template(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::load_from(Path::new("/nonexistent/stmtbot/config.json"))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("stmtbot init"));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_minimal_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"sheets": {"spreadsheet_id": "abc"}}"#).expect("parse");
        assert!(config.validate().is_ok());
        assert_eq!(config.conversation.warn_after_secs, 2400);
        assert!(config.conversation.operators.is_empty());
        assert!(!config.telegram.enabled);
        assert!(config.sheets.api_key.is_none());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_zero_interval_rejected() {
        let config: Config = serde_json::from_str(
            r#"{"conversation": {"warn_after_secs": 0}, "sheets": {"spreadsheet_id": "abc"}}"#,
        )
        .expect("parse");
        assert!(config.validate().is_err());
    }
}
