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

//! Spreadsheet-backed implementations of the engine's lookup and export
//! capabilities.

pub mod client;
pub mod export;
pub mod lookup;

pub use client::SheetsClient;
pub use export::SheetExporter;
pub use lookup::SheetLookup;

use async_trait::async_trait;
use std::sync::Arc;
use stmtbot_core::LookupError;

/// Column holding the primary key (tax id).
pub const PRIMARY_KEY_COLUMN: usize = 0;
/// Column holding the verification key (customer code).
pub const VERIFICATION_KEY_COLUMN: usize = 1;
/// Column holding the display name.
pub const NAME_COLUMN: usize = 2;

/// One data row with trimmed cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<String>);

impl Row {
    #[must_use]
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            cells
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .collect(),
        )
    }

    /// Cell at `index`, empty when the row is shorter.
    #[must_use]
    pub fn cell(&self, index: usize) -> &str {
        self.0.get(index).map_or("", String::as_str)
    }

    /// Blank keys never match, so empty rows inside the range stay invisible.
    #[must_use]
    pub fn matches_key(&self, primary_key: &str) -> bool {
        cell_matches(self.cell(PRIMARY_KEY_COLUMN), primary_key)
    }

    #[must_use]
    pub fn matches_pair(&self, primary_key: &str, verification_key: &str) -> bool {
        self.matches_key(primary_key)
            && cell_matches(self.cell(VERIFICATION_KEY_COLUMN), verification_key)
    }
}

fn cell_matches(cell: &str, key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && cell == key
}

/// Anything that can produce the current data rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Row>, LookupError>;
}

#[async_trait]
impl<S: RowSource + ?Sized> RowSource for Arc<S> {
    async fn fetch_rows(&self) -> Result<Vec<Row>, LookupError> {
        (**self).fetch_rows().await
    }
}

#[async_trait]
impl RowSource for Vec<Row> {
    async fn fetch_rows(&self) -> Result<Vec<Row>, LookupError> {
        Ok(self.clone())
    }
}
