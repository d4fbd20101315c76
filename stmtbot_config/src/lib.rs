mod schema;

pub use schema::{Config, SheetsConfig, TelegramConfig};
