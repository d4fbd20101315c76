use stmtbot_config::Config;
use stmtbot_sheets::{RowSource, SheetsClient};
use tracing::info;

use super::mask_secret;

/// Strategy for displaying configuration information.
///
/// Prints the conversation settings, the spreadsheet source (checking that
/// it can be read) and the Telegram settings, with secrets masked.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== stmtbot Configuration ===\n");

        let conversation = &config.conversation;
        println!("Conversation:");
        println!("  Trigger Phrase: {}", conversation.trigger_phrase);
        println!("  Bot Name: {}", conversation.bot_name);
        println!("  Warn After: {}s", conversation.warn_after_secs);
        println!("  Terminate After: {}s", conversation.terminate_after_secs);
        if conversation.operators.is_empty() {
            println!("  Operators: (none - requests are not handed off)");
        } else {
            println!("  Operators: {}", conversation.operators.join(", "));
        }
        println!();

        let sheets = &config.sheets;
        println!("Spreadsheet:");
        println!("  Id: {}", sheets.spreadsheet_id);
        println!("  Range: {}", sheets.range);
        println!("  Base URL: {}", sheets.base_url);
        println!(
            "  API Key: {}",
            mask_secret(sheets.api_key.as_deref().unwrap_or_default())
        );
        println!(
            "  Access Token: {}",
            mask_secret(sheets.access_token.as_deref().unwrap_or_default())
        );

        info!("Testing spreadsheet access");
        let client = SheetsClient::new(sheets.spreadsheet_id.clone(), sheets.range.clone())
            .with_base_url(sheets.base_url.clone())
            .with_api_key(sheets.api_key.clone())
            .with_access_token(sheets.access_token.clone());
        match client.fetch_rows().await {
            Ok(rows) => println!("  Status: Reachable ({} rows)", rows.len()),
            Err(e) => {
                println!("  Status: Unreachable");
                println!("  Error: {e}");
            }
        }
        println!();

        println!("Telegram:");
        println!("  Enabled: {}", config.telegram.enabled);
        println!("  Token: {}", mask_secret(&config.telegram.token));

        Ok(())
    }
}
