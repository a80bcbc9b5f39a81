//! Google Sheets client
//!
//! Plays two roles for the bot:
//! - [`CategorySource`]: reads column A of the categories worksheet at startup
//! - [`RecordSink`]: appends one row per expense to the expenses worksheet
//!
//! API: https://sheets.googleapis.com/v4/spreadsheets/{id}/values/{range}
//! The workbook can be located by id or by file name (Drive `files.list`).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::registry::CategorySource;
use crate::core::sink::{expense_row, RecordSink};
use crate::models::config::{SheetsConfig, SpreadsheetRef};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::ParsedExpense;
use crate::providers::google_auth::{GoogleAuth, ServiceAccountKey};
use crate::utils::constants::{
    DEFAULT_GOOGLE_TIMEOUT_SECS, DRIVE_FILES_URL, SHEETS_API_BASE, SPREADSHEET_MIME_TYPE,
    USER_AGENT as USER_AGENT_CONST,
};

// ============================================
// API response shapes
// ============================================

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// `values.get` body. Cells come back as strings with the default render option.
#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    /// First column, as read with `majorDimension=COLUMNS`
    pub fn first_column(self) -> Vec<String> {
        self.values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|cell| match cell {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect()
    }
}

// ============================================
// Client
// ============================================

pub struct SheetsClient {
    client: reqwest::Client,
    auth: GoogleAuth,
    spreadsheet_id: String,
    expenses_sheet: String,
    categories_sheet: String,
}

impl SheetsClient {
    /// Authenticate, locate the workbook and check both worksheets exist.
    /// Any failure here should stop startup.
    pub async fn connect(config: &SheetsConfig) -> AppResult<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials_path)?;
        let client = Self::build_client()?;
        let auth = GoogleAuth::new(key, client.clone())?;

        let spreadsheet_id = match &config.spreadsheet {
            SpreadsheetRef::Id(id) => id.clone(),
            SpreadsheetRef::Name(name) => Self::find_by_name(&client, &auth, name).await?,
        };

        let sheets = Self {
            client,
            auth,
            spreadsheet_id,
            expenses_sheet: config.expenses_sheet.clone(),
            categories_sheet: config.categories_sheet.clone(),
        };

        let titles = sheets.worksheet_titles().await?;
        for wanted in [&sheets.expenses_sheet, &sheets.categories_sheet] {
            if !titles.iter().any(|t| t == wanted) {
                return Err(AppError::worksheet_not_found(wanted));
            }
        }

        info!(
            "📗 Connected to spreadsheet {} (expenses: '{}', categories: '{}')",
            sheets.spreadsheet_id, sheets.expenses_sheet, sheets.categories_sheet
        );
        Ok(sheets)
    }

    fn build_client() -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_GOOGLE_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .map_err(|e| AppError::sheets_failed(format!("Failed to build HTTP client: {}", e)))
    }

    /// Resolve a workbook file name to its id through Drive
    async fn find_by_name(
        client: &reqwest::Client,
        auth: &GoogleAuth,
        name: &str,
    ) -> AppResult<String> {
        info!("🔍 Looking up spreadsheet '{}' in Drive", name);

        let response = client
            .get(DRIVE_FILES_URL)
            .bearer_auth(auth.access_token().await?)
            .query(&[
                ("q", drive_name_query(name).as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "10"),
            ])
            .send()
            .await?;
        let list: DriveFileList = check_status(response, Call::Lookup).await?.json().await?;

        match list.files.as_slice() {
            [] => Err(AppError::new(
                ErrorCode::SheetsSpreadsheetNotFound,
                format!("No spreadsheet named '{}' is shared with the service account", name),
            )),
            [first, rest @ ..] => {
                if !rest.is_empty() {
                    debug!("{} spreadsheets named '{}', using {}", rest.len() + 1, first.name, first.id);
                }
                Ok(first.id.clone())
            }
        }
    }

    async fn worksheet_titles(&self) -> AppResult<Vec<String>> {
        let url = self.spreadsheet_url(&[])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.access_token().await?)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = check_status(response, Call::Lookup).await?.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// `{SHEETS_API_BASE}/{id}/{segments...}` with each segment percent-encoded
    fn spreadsheet_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| AppError::sheets_failed(format!("Bad Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::sheets_failed("Sheets base URL cannot take path segments"))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl CategorySource for SheetsClient {
    async fn fetch_category_column(&self) -> AppResult<Vec<String>> {
        let range = a1_range(&self.categories_sheet, "A:A");
        let url = self.spreadsheet_url(&["values", &range])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.access_token().await?)
            .query(&[("majorDimension", "COLUMNS")])
            .send()
            .await?;
        let values: ValueRange = check_status(response, Call::Data).await?.json().await?;
        Ok(values.first_column())
    }
}

#[async_trait]
impl RecordSink for SheetsClient {
    async fn append_expense(&self, expense: &ParsedExpense) -> AppResult<()> {
        let range = format!("{}:append", a1_range(&self.expenses_sheet, "A1"));
        let url = self.spreadsheet_url(&["values", &range])?;
        let row = expense_row(expense);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.access_token().await?)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        check_status(response, Call::Data).await?;

        debug!("📝 Row appended to '{}'", self.expenses_sheet);
        Ok(())
    }
}

// ============================================
// Helpers
// ============================================

/// Which call a response belongs to; decides what a 404 means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    /// Locating the workbook: 404 means it does not exist for us
    Lookup,
    /// Reading or writing a worksheet of an already located workbook
    Data,
}

/// Pass 2xx responses through, turn anything else into a coded error with the body attached
async fn check_status(response: reqwest::Response, call: Call) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body, call))
}

fn status_error(status: reqwest::StatusCode, body: &str, call: Call) -> AppError {
    let code = match (status, call) {
        (reqwest::StatusCode::NOT_FOUND, Call::Lookup) => ErrorCode::SheetsSpreadsheetNotFound,
        _ => ErrorCode::SheetsRequestFailed,
    };
    AppError::new(code, format!("Google API returned {}: {}", status, body))
}

/// A1 notation with the sheet name quoted: `'Mis Gastos'!A:A`
pub fn a1_range(sheet: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cells)
}

/// Drive search query for a spreadsheet with exactly this name
pub fn drive_name_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}
