use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conversation behaviour shared by the engine and the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Substring that opens a new conversation (matched case-insensitively)
    #[serde(default = "ConversationConfig::default_trigger_phrase")]
    pub trigger_phrase: String,
    /// Name the bot introduces itself with
    #[serde(default = "ConversationConfig::default_bot_name")]
    pub bot_name: String,
    /// Idle time before the "are you still there?" probe
    #[serde(default = "ConversationConfig::default_interval_secs")]
    pub warn_after_secs: u64,
    /// Idle time after the probe before the chat is closed
    #[serde(default = "ConversationConfig::default_interval_secs")]
    pub terminate_after_secs: u64,
    /// Operators receiving free-text requests, in round-robin order
    #[serde(default)]
    pub operators: Vec<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            trigger_phrase: Self::default_trigger_phrase(),
            bot_name: Self::default_bot_name(),
            warn_after_secs: Self::default_interval_secs(),
            terminate_after_secs: Self::default_interval_secs(),
            operators: Vec::new(),
        }
    }
}

impl ConversationConfig {
    fn default_trigger_phrase() -> String {
        "@hikstatement".to_string()
    }

    fn default_bot_name() -> String {
        "HikStatement".to_string()
    }

    const fn default_interval_secs() -> u64 {
        40 * 60
    }

    #[must_use]
    pub const fn warn_after(&self) -> Duration {
        Duration::from_secs(self.warn_after_secs)
    }

    #[must_use]
    pub const fn terminate_after(&self) -> Duration {
        Duration::from_secs(self.terminate_after_secs)
    }

    /// Whether `text` contains the trigger phrase, ignoring case.
    #[must_use]
    pub fn is_trigger(&self, text: &str) -> bool {
        let phrase = self.trigger_phrase.trim().to_lowercase();
        !phrase.is_empty() && text.to_lowercase().contains(&phrase)
    }
}
