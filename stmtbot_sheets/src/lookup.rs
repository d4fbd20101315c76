use async_trait::async_trait;
use stmtbot_core::{Identity, LookupError, LookupService};
use tracing::debug;

use crate::{NAME_COLUMN, Row, RowSource};

/// `LookupService` over rows of the statement sheet.
pub struct SheetLookup<S> {
    source: S,
}

impl<S: RowSource> SheetLookup<S> {
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    fn identity(row: &Row) -> Identity {
        Identity {
            display_name: row.cell(NAME_COLUMN).to_string(),
        }
    }
}

#[async_trait]
impl<S: RowSource> LookupService for SheetLookup<S> {
    async fn find_by_key(&self, primary_key: &str) -> Result<Option<Identity>, LookupError> {
        let rows = self.source.fetch_rows().await?;
        let found = rows.iter().find(|row| row.matches_key(primary_key));
        if found.is_none() {
            debug!("Primary key not present in sheet");
        }
        Ok(found.map(Self::identity))
    }

    async fn verify(
        &self,
        primary_key: &str,
        verification_key: &str,
    ) -> Result<Option<Identity>, LookupError> {
        let rows = self.source.fetch_rows().await?;
        let found = rows
            .iter()
            .find(|row| row.matches_pair(primary_key, verification_key));
        if found.is_none() {
            debug!("Verification key does not match primary key");
        }
        Ok(found.map(Self::identity))
    }
}
