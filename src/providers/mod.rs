//! Providers Module - External Services
//!
//! Telegram Bot API for chat, Google Sheets (plus Drive lookup) for storage.

pub mod google_auth;
pub mod sheets;
pub mod telegram;

pub use google_auth::{GoogleAuth, ServiceAccountKey};
pub use sheets::SheetsClient;
pub use telegram::TelegramClient;
