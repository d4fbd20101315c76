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

use async_trait::async_trait;

pub mod config;
pub mod engine;
pub mod error;
pub mod replies;
pub mod router;

pub use config::ConversationConfig;
pub use engine::{ConversationEngine, ConversationEvent, ConversationState, SessionData};
pub use error::{EngineError, ExportError, LookupError};
pub use router::OperatorRouter;

/// MIME type of the workbooks produced by a `DocumentExporter`.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Identity resolved from the tabular store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
}

/// A generated spreadsheet ready to be attached to a message.
#[derive(Debug, Clone)]
pub struct TabularArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Outbound side of the messaging transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, target: &str, text: &str) -> anyhow::Result<()>;
    async fn send_file(
        &self,
        target: &str,
        artifact: &TabularArtifact,
        caption: &str,
    ) -> anyhow::Result<()>;
}

/// Resolves identity keys against the tabular store.
///
/// Keys are compared as trimmed, case-sensitive strings. `Ok(None)` means
/// the key (or key pair) is not present; `Err` means the store could not
/// be consulted at all.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn find_by_key(&self, primary_key: &str) -> Result<Option<Identity>, LookupError>;
    async fn verify(
        &self,
        primary_key: &str,
        verification_key: &str,
    ) -> Result<Option<Identity>, LookupError>;
}

/// Renders the rows matching a key pair into a downloadable artifact.
#[async_trait]
pub trait DocumentExporter: Send + Sync {
    /// Returns `Ok(None)` when no row matches both keys.
    async fn export(
        &self,
        primary_key: &str,
        verification_key: &str,
    ) -> Result<Option<TabularArtifact>, ExportError>;
}
