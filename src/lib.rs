//! Gastos Bot Library
//!
//! Telegram bot that turns short free-text messages into expense rows in a
//! Google Sheets workbook:
//! - `gasto <amount> <category> ['description']`
//! - `<category> <amount> ['description']` for known categories
//! - `/start` and `/categorias` for help
//!
//! Only allow-listed Telegram users get any response.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    AuthorizationGate, CategoryRegistry, ChatTransport, Dispatcher, ExpenseBot, RecordSink,
};
pub use models::{AppError, AppResult, BotConfig, ErrorCode, ParseOutcome, ParsedExpense};
pub use utils::telemetry::{BotStats, StatsSnapshot};
