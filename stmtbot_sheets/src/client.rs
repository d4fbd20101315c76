use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use stmtbot_core::LookupError;
use tracing::{debug, info};

use crate::{Row, RowSource};

/// Reads rows through the Google Sheets values API.
///
/// Every call fetches the whole range; the store is small and must always
/// reflect the latest edits.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    api_key: Option<String>,
    access_token: Option<String>,
    header_rows: usize,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsClient {
    #[must_use]
    pub fn new(spreadsheet_id: impl Into<String>, range: impl Into<String>) -> Self {
        let spreadsheet_id = spreadsheet_id.into();
        info!("Creating SheetsClient for spreadsheet {spreadsheet_id}");
        Self {
            client: Client::new(),
            base_url: "https://sheets.googleapis.com".to_string(),
            spreadsheet_id,
            range: range.into(),
            api_key: None,
            access_token: None,
            header_rows: 1,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token.filter(|t| !t.is_empty());
        self
    }

    /// Number of leading rows treated as headers and skipped.
    #[must_use]
    pub const fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    fn values_url(&self) -> Result<Url, LookupError> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|e| LookupError::Transport(format!("invalid base url: {e}")))?;

        url.path_segments_mut()
            .map_err(|()| LookupError::Transport("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);

        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn cell_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn transport(e: &reqwest::Error) -> LookupError {
    LookupError::Transport(e.to_string())
}

#[async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self) -> Result<Vec<Row>, LookupError> {
        let url = self.values_url()?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| transport(&e))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LookupError::Unauthorized(format!(
                "spreadsheet {} answered {status}",
                self.spreadsheet_id
            )));
        }
        let response = response.error_for_status().map_err(|e| transport(&e))?;

        let range: ValueRange = response.json().await.map_err(|e| {
            if e.is_decode() {
                LookupError::Malformed(e.to_string())
            } else {
                transport(&e)
            }
        })?;

        let rows: Vec<Row> = range
            .values
            .iter()
            .skip(self.header_rows)
            .map(|cells| Row::new(cells.iter().map(Self::cell_text)))
            .collect();

        debug!("Fetched {} rows from spreadsheet", rows.len());
        Ok(rows)
    }
}
