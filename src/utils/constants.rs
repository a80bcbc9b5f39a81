//! Constants Module - Single Source of Truth
//!
//! Endpoints, defaults and the handful of literals the parser matches on.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "GastosBot";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("GastosBot/", env!("CARGO_PKG_VERSION"));

/// Log file written next to stdout logging
pub const LOG_FILE_NAME: &str = "bot_gastos.log";

// ============================================
// PARSER CONSTANTS
// ============================================

/// Keyword that opens the standard form: `gasto <amount> <category...>`
pub const EXPENSE_KEYWORD: &str = "gasto";

/// Timestamp format of the first sheet column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================
// COMMANDS
// ============================================

pub const COMMAND_START: &str = "start";
pub const COMMAND_CATEGORIES: &str = "categorias";
/// English alias, not advertised in the command menu
pub const COMMAND_CATEGORIES_ALIAS: &str = "categories";

// ============================================
// TELEGRAM CONSTANTS
// ============================================

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default long-poll timeout for getUpdates (seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Extra slack on the HTTP timeout over the long-poll timeout
pub const POLL_HTTP_GRACE_SECS: u64 = 10;

/// Poll retry backoff: 1s→2s→4s→...→64s with jitter
pub const POLL_BASE_RETRY_MS: u64 = 1000;
pub const POLL_MAX_RETRY_MS: u64 = 64000;
pub const RETRY_JITTER_PERCENT: u64 = 20;

// ============================================
// GOOGLE CONSTANTS
// ============================================

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for the service account
pub const GOOGLE_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";

pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Lifetime requested for the signed JWT assertion (seconds)
pub const JWT_LIFETIME_SECS: i64 = 3600;

/// Refresh the access token this many seconds before it expires
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Default timeout for Google requests (seconds)
pub const DEFAULT_GOOGLE_TIMEOUT_SECS: u64 = 20;

// ============================================
// CONFIG PLACEHOLDERS
// ============================================

/// Token values shipped in setup docs that must be replaced
pub const TOKEN_PLACEHOLDERS: [&str; 2] = ["TU_TOKEN_REAL_AQUI", "YOUR_BOT_TOKEN"];

/// Example user id from the setup docs
pub const PLACEHOLDER_USER_ID: i64 = 123456789;
