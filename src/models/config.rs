//! Configuration module for the expense bot
//!
//! Everything comes from environment variables (a `.env` file is loaded by
//! `main` before this runs). Validation happens here, once, so a bot with a
//! missing token or a placeholder allow-list never starts.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::UserId;
use crate::utils::constants::{
    DEFAULT_POLL_TIMEOUT_SECS, PLACEHOLDER_USER_ID, TOKEN_PLACEHOLDERS,
};

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_AUTHORIZED_USERS: &str = "AUTHORIZED_USERS";
pub const ENV_SPREADSHEET_NAME: &str = "SPREADSHEET_NAME";
pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";
pub const ENV_EXPENSES_SHEET: &str = "EXPENSES_SHEET";
pub const ENV_CATEGORIES_SHEET: &str = "CATEGORIES_SHEET";
pub const ENV_CREDENTIALS: &str = "GOOGLE_CREDENTIALS_JSON";
pub const ENV_POLL_TIMEOUT: &str = "POLL_TIMEOUT_SECS";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HEALTH_PORT: &str = "HEALTH_PORT";
pub const ENV_STATS_DIR: &str = "STATS_DIR";

/// How the workbook is located
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetRef {
    /// Known id, used as-is
    Id(String),
    /// File name, resolved through Drive at startup
    Name(String),
}

/// Google Sheets side of the configuration
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet: SpreadsheetRef,
    /// Tab that receives expense rows
    pub expenses_sheet: String,
    /// Tab whose column A lists the categories (row 1 is a header)
    pub categories_sheet: String,
    /// Service-account JSON key file
    pub credentials_path: PathBuf,
}

/// Configuration for the whole process
#[derive(Clone)]
pub struct BotConfig {
    /// Never logged
    pub telegram_token: String,
    pub authorized_users: HashSet<UserId>,
    pub sheets: SheetsConfig,
    /// Long-poll timeout for getUpdates
    pub poll_timeout: Duration,
    /// Directory for the log file
    pub log_dir: PathBuf,
    /// Health endpoint port, disabled when absent
    pub http_port: Option<u16>,
    /// Where to write the stats JSON at shutdown
    pub stats_dir: Option<PathBuf>,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"***HIDDEN***")
            .field("authorized_users", &self.authorized_users.len())
            .field("sheets", &self.sheets)
            .field("poll_timeout", &self.poll_timeout)
            .field("log_dir", &self.log_dir)
            .field("http_port", &self.http_port)
            .field("stats_dir", &self.stats_dir)
            .finish()
    }
}

impl BotConfig {
    /// Read and validate configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read and validate configuration from any key/value lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Treat blank values as missing
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| AppError::missing_env(key));

        let telegram_token = require(ENV_TELEGRAM_TOKEN)?;
        if is_placeholder_token(&telegram_token) {
            return Err(AppError::placeholder(ENV_TELEGRAM_TOKEN));
        }
        info!("🔑 {} configured (token hidden)", ENV_TELEGRAM_TOKEN);

        let authorized_users = parse_user_list(&require(ENV_AUTHORIZED_USERS)?)?;

        let spreadsheet = match (get(ENV_SPREADSHEET_ID), get(ENV_SPREADSHEET_NAME)) {
            (Some(id), _) => SpreadsheetRef::Id(id),
            (None, Some(name)) => SpreadsheetRef::Name(name),
            (None, None) => return Err(AppError::missing_env(ENV_SPREADSHEET_NAME)),
        };

        let sheets = SheetsConfig {
            spreadsheet,
            expenses_sheet: require(ENV_EXPENSES_SHEET)?,
            categories_sheet: require(ENV_CATEGORIES_SHEET)?,
            credentials_path: PathBuf::from(require(ENV_CREDENTIALS)?),
        };

        let poll_timeout = match get(ENV_POLL_TIMEOUT) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| AppError::invalid_config(ENV_POLL_TIMEOUT, &raw))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        };

        // Railway-style PORT wins over HEALTH_PORT
        let http_port = match get(ENV_PORT).or_else(|| get(ENV_HEALTH_PORT)) {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|_| AppError::invalid_config(ENV_PORT, &raw))?,
            ),
            None => None,
        };

        Ok(Self {
            telegram_token,
            authorized_users,
            sheets,
            poll_timeout,
            log_dir: log_dir_from(&lookup),
            http_port,
            stats_dir: get(ENV_STATS_DIR).map(PathBuf::from),
        })
    }
}

/// `LOG_DIR`, blank or unset meaning the working directory. Read on its own
/// by `main` so logging is up before the rest of the config is validated.
pub fn log_dir_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_LOG_DIR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn log_dir_from_env() -> PathBuf {
    log_dir_from(|key| std::env::var(key).ok())
}

fn is_placeholder_token(token: &str) -> bool {
    TOKEN_PLACEHOLDERS.iter().any(|p| token.contains(p)) || token.contains("YOUR_")
}

/// Parse `"111, 222,333"` into a set of ids
pub fn parse_user_list(raw: &str) -> AppResult<HashSet<UserId>> {
    let mut users = HashSet::new();

    for entry in raw.split(',').map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let id: UserId = entry
            .parse()
            .map_err(|_| AppError::invalid_config(ENV_AUTHORIZED_USERS, format!("'{}' is not an integer id", entry)))?;
        if id == PLACEHOLDER_USER_ID {
            return Err(AppError::placeholder(ENV_AUTHORIZED_USERS));
        }
        users.insert(id);
    }

    if users.is_empty() {
        return Err(AppError::missing_env(ENV_AUTHORIZED_USERS));
    }

    Ok(users)
}
