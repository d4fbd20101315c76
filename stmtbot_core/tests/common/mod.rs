//! In-memory collaborators for driving the engine without I/O.

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stmtbot_core::{
    ConversationConfig, ConversationEngine, DocumentExporter, ExportError, Identity, LookupError,
    LookupService, Messenger, TabularArtifact, XLSX_MIME,
};

pub const SENDER: &str = "573001112233";
pub const PRIMARY_KEY: &str = "900111222";
pub const VERIFICATION_KEY: &str = "4455";
pub const DISPLAY_NAME: &str = "Comercializadora Andina";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text { target: String, text: String },
    File { target: String, file_name: String, caption: String },
}

/// Records everything the engine sends.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Outbound>>,
    failing_targets: Mutex<HashSet<String>>,
    fail_files: AtomicBool,
}

impl RecordingMessenger {
    pub fn fail_for(&self, target: &str) {
        self.failing_targets.lock().unwrap().insert(target.to_string());
    }

    pub fn fail_files(&self) {
        self.fail_files.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts delivered to `target`, in order.
    pub fn texts_to(&self, target: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                Outbound::Text { target: t, text } if t == target => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn files_to(&self, target: &str) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                Outbound::File {
                    target: t,
                    file_name,
                    caption,
                } if t == target => Some((file_name, caption)),
                _ => None,
            })
            .collect()
    }

    pub fn last_text_to(&self, target: &str) -> Option<String> {
        self.texts_to(target).pop()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, target: &str, text: &str) -> anyhow::Result<()> {
        if self.failing_targets.lock().unwrap().contains(target) {
            anyhow::bail!("target {target} unreachable");
        }
        self.sent.lock().unwrap().push(Outbound::Text {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_file(
        &self,
        target: &str,
        artifact: &TabularArtifact,
        caption: &str,
    ) -> anyhow::Result<()> {
        if self.fail_files.load(Ordering::SeqCst) {
            anyhow::bail!("attachment rejected");
        }
        self.sent.lock().unwrap().push(Outbound::File {
            target: target.to_string(),
            file_name: artifact.file_name.clone(),
            caption: caption.to_string(),
        });
        Ok(())
    }
}

/// Lookup backed by `(primary, verification, name)` tuples.
#[derive(Default)]
pub struct StaticLookup {
    rows: Vec<(String, String, String)>,
    unavailable: AtomicBool,
    delay: Option<Duration>,
}

impl StaticLookup {
    pub fn with_customer() -> Self {
        Self {
            rows: vec![(
                PRIMARY_KEY.to_string(),
                VERIFICATION_KEY.to_string(),
                DISPLAY_NAME.to_string(),
            )],
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn go_down(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    async fn check(&self) -> Result<(), LookupError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LookupError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LookupService for StaticLookup {
    async fn find_by_key(&self, primary_key: &str) -> Result<Option<Identity>, LookupError> {
        self.check().await?;
        Ok(self
            .rows
            .iter()
            .find(|(pk, _, _)| pk == primary_key.trim())
            .map(|(_, _, name)| Identity {
                display_name: name.clone(),
            }))
    }

    async fn verify(
        &self,
        primary_key: &str,
        verification_key: &str,
    ) -> Result<Option<Identity>, LookupError> {
        self.check().await?;
        Ok(self
            .rows
            .iter()
            .find(|(pk, vk, _)| pk == primary_key.trim() && vk == verification_key.trim())
            .map(|(_, _, name)| Identity {
                display_name: name.clone(),
            }))
    }
}

/// Exporter that yields a fixed artifact, nothing, or an error.
pub enum StaticExporter {
    Rows,
    Empty,
    Broken,
}

#[async_trait]
impl DocumentExporter for StaticExporter {
    async fn export(
        &self,
        _primary_key: &str,
        _verification_key: &str,
    ) -> Result<Option<TabularArtifact>, ExportError> {
        match self {
            Self::Rows => Ok(Some(TabularArtifact {
                file_name: "estado_cuenta_Comercializadora_Andina.xlsx".to_string(),
                mime_type: XLSX_MIME.to_string(),
                bytes: vec![0x50, 0x4b, 0x03, 0x04],
            })),
            Self::Empty => Ok(None),
            Self::Broken => Err(ExportError::Render("disk full".to_string())),
        }
    }
}

pub fn test_config(operators: &[&str]) -> ConversationConfig {
    ConversationConfig {
        trigger_phrase: "@hikstatement".to_string(),
        bot_name: "HikStatement".to_string(),
        warn_after_secs: 60,
        terminate_after_secs: 60,
        operators: operators.iter().map(ToString::to_string).collect(),
    }
}

pub struct Harness {
    pub engine: ConversationEngine,
    pub messenger: Arc<RecordingMessenger>,
    pub lookup: Arc<StaticLookup>,
}

pub fn harness(lookup: StaticLookup, exporter: StaticExporter, operators: &[&str]) -> Harness {
    let messenger = Arc::new(RecordingMessenger::default());
    let lookup = Arc::new(lookup);
    let engine = ConversationEngine::new(
        test_config(operators),
        messenger.clone(),
        lookup.clone(),
        Arc::new(exporter),
    );
    Harness {
        engine,
        messenger,
        lookup,
    }
}

/// Walk a sender through greeting and both keys into the main menu.
pub async fn reach_menu(h: &Harness, sender: &str) {
    h.engine.handle(sender, "@hikstatement").await;
    h.engine.handle(sender, PRIMARY_KEY).await;
    h.engine.handle(sender, VERIFICATION_KEY).await;
}
