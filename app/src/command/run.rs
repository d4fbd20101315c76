use crate::command::CommandStrategy;
use std::sync::Arc;
use std::time::Duration;
use stmtbot_config::Config;
use stmtbot_core::{ConversationEngine, ConversationEvent};
use stmtbot_sheets::{SheetExporter, SheetLookup, SheetsClient};
use stmtbot_telegram::{TelegramBot, TelegramMessenger};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{info, warn};

/// How often finished conversations are dropped from memory.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Input for the run command.
pub struct RunInput {
    /// Optional bot token (overrides config)
    pub token: Option<String>,
}

/// Strategy for running the Telegram bot.
pub struct RunStrategy;

/// Log engine events. Timeouts are recovered in-process, so the supervisor
/// only records them.
async fn supervise(mut events: Receiver<ConversationEvent>) {
    loop {
        match events.recv().await {
            Ok(ConversationEvent::TimedOut { sender }) => {
                warn!("Conversation with {sender} closed after inactivity");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Supervisor lagged, {skipped} events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Periodically forget senders whose conversation is over.
async fn sweep(engine: ConversationEngine) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        engine.prune_ended().await;
    }
}

fn sheets_client(config: &Config) -> SheetsClient {
    SheetsClient::new(config.sheets.spreadsheet_id.clone(), config.sheets.range.clone())
        .with_base_url(config.sheets.base_url.clone())
        .with_api_key(config.sheets.api_key.clone())
        .with_access_token(config.sheets.access_token.clone())
}

impl CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        if !config.telegram.enabled {
            anyhow::bail!("Telegram is not enabled in config. Set \"telegram.enabled\": true");
        }

        let token = input.token.unwrap_or_else(|| config.telegram.token.clone());
        let bot = TelegramBot::bot_from_token(&token)?;

        info!("Starting statement bot...");

        let source = Arc::new(sheets_client(&config));
        let engine = ConversationEngine::new(
            config.conversation.clone(),
            Arc::new(TelegramMessenger::new(bot.clone())),
            Arc::new(SheetLookup::new(Arc::clone(&source))),
            Arc::new(SheetExporter::new(source)),
        );

        if engine.router().is_empty() {
            warn!("No operators configured; free-text requests will not be handed off");
        }

        tokio::spawn(supervise(engine.subscribe()));
        tokio::spawn(sweep(engine.clone()));

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        TelegramBot::new(bot, engine).run().await?;

        Ok(())
    }
}
