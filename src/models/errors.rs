//! Centralized Error Handling Module
//!
//! Every failure that leaves a component carries a unique error code so the
//! log lines of a hosted bot can be grepped and alerted on.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - CFG_xxx: Configuration errors
//! - GOOGLE_AUTH_xxx: Service-account authentication errors
//! - SHEETS_xxx: Google Sheets / Drive errors
//! - TELEGRAM_xxx: Bot API errors
//! - REGISTRY_xxx: Category registry errors
//!
//! User-caused parse problems are NOT errors: they travel as
//! [`crate::models::types::Rejection`] values.

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Value left at its documentation placeholder
    ConfigPlaceholder,

    // ============================================
    // Google Auth Errors
    // ============================================
    /// Credentials file unreadable or malformed
    GoogleAuthCredentials,
    /// JWT signing failed (bad private key)
    GoogleAuthSigning,
    /// Token endpoint rejected the assertion
    GoogleAuthTokenExchange,

    // ============================================
    // Sheets Errors
    // ============================================
    /// No spreadsheet with the configured name/id
    SheetsSpreadsheetNotFound,
    /// Worksheet (tab) missing from the spreadsheet
    SheetsWorksheetNotFound,
    /// Sheets/Drive returned a non-success status
    SheetsRequestFailed,
    /// Sheets/Drive response could not be decoded
    SheetsInvalidResponse,

    // ============================================
    // Telegram Errors
    // ============================================
    /// Transport-level failure talking to the Bot API
    TelegramConnectionFailed,
    /// Bot API answered `ok: false`
    TelegramApiError,
    /// Bot API rate limited (HTTP 429)
    TelegramRateLimited,
    /// Bot API response could not be decoded
    TelegramInvalidResponse,

    // ============================================
    // Registry Errors
    // ============================================
    /// Category listing could not be fetched at startup
    RegistryLoadFailed,

    // ============================================
    // Generic Errors
    // ============================================
    /// External service timeout
    ExternalTimeout,
    /// Could not open a connection to an external service
    ExternalConnectionFailed,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigPlaceholder => "CFG_PLACEHOLDER",

            Self::GoogleAuthCredentials => "GOOGLE_AUTH_CREDENTIALS",
            Self::GoogleAuthSigning => "GOOGLE_AUTH_SIGNING",
            Self::GoogleAuthTokenExchange => "GOOGLE_AUTH_TOKEN_EXCHANGE",

            Self::SheetsSpreadsheetNotFound => "SHEETS_SPREADSHEET_NOT_FOUND",
            Self::SheetsWorksheetNotFound => "SHEETS_WORKSHEET_NOT_FOUND",
            Self::SheetsRequestFailed => "SHEETS_REQUEST_FAILED",
            Self::SheetsInvalidResponse => "SHEETS_INVALID_RESPONSE",

            Self::TelegramConnectionFailed => "TELEGRAM_CONNECTION_FAILED",
            Self::TelegramApiError => "TELEGRAM_API_ERROR",
            Self::TelegramRateLimited => "TELEGRAM_RATE_LIMITED",
            Self::TelegramInvalidResponse => "TELEGRAM_INVALID_RESPONSE",

            Self::RegistryLoadFailed => "REGISTRY_LOAD_FAILED",

            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::ExternalConnectionFailed => "EXTERNAL_CONNECTION_FAILED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Check if error is retryable (used by the long-poll backoff only)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TelegramConnectionFailed
                | Self::TelegramRateLimited
                | Self::TelegramInvalidResponse
                | Self::ExternalTimeout
                | Self::ExternalConnectionFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Missing environment variable
    pub fn missing_env(var: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", var),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(var: &str, msg: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {}", var, msg),
        )
    }

    /// Placeholder left in configuration
    pub fn placeholder(var: &str) -> Self {
        Self::new(
            ErrorCode::ConfigPlaceholder,
            format!("{} still holds a placeholder value; replace it with real data", var),
        )
    }

    /// Sheets request failed
    pub fn sheets_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SheetsRequestFailed, msg)
    }

    /// Worksheet missing
    pub fn worksheet_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::SheetsWorksheetNotFound,
            format!("Worksheet '{}' not found", name),
        )
    }

    /// Telegram API returned ok=false
    pub fn telegram_api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TelegramApiError, msg)
    }

    /// Registry load failure, wrapping whatever the source reported
    pub fn registry_load_failed(cause: AppError) -> Self {
        Self::with_source(
            ErrorCode::RegistryLoadFailed,
            format!("Could not load categories: {}", cause.message),
            cause,
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ExternalConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::SheetsInvalidResponse, "JSON parse error", err)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::with_source(ErrorCode::GoogleAuthSigning, "JWT signing failed", err)
    }
}
