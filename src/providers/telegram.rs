//! Telegram Bot API transport
//!
//! Long polling with `getUpdates`, replies with `sendMessage`, command menu
//! with `setMyCommands`. Only text messages are surfaced; everything else in
//! an update is skipped.
//!
//! API: https://api.telegram.org/bot{token}/{method}

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::bot::ChatTransport;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{InboundMessage, MessageKind, Reply, ReplyFormat, Sender};
use crate::utils::constants::{
    POLL_BASE_RETRY_MS, POLL_HTTP_GRACE_SECS, POLL_MAX_RETRY_MS, RETRY_JITTER_PERCENT,
    TELEGRAM_API_BASE, USER_AGENT as USER_AGENT_CONST,
};

// ============================================
// Bot API types (only the fields we read)
// ============================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Serialize)]
struct BotCommand<'a> {
    command: &'a str,
    description: &'a str,
}

// ============================================
// Update -> InboundMessage
// ============================================

/// Reduce a Bot API message to what the dispatcher consumes.
///
/// A message is a command only when a `bot_command` entity starts at offset 0.
/// `/cmd@OtherBot` is dropped; `/cmd@ThisBot` is kept.
pub fn to_inbound(message: &Message, bot_username: &str) -> Option<InboundMessage> {
    let text = message.text.as_deref()?;
    let from = message.from.as_ref()?;

    let sender = Sender {
        id: from.id,
        display_name: from.first_name.clone(),
    };

    let is_command = message
        .entities
        .iter()
        .any(|e| e.kind == "bot_command" && e.offset == 0);

    let kind = if is_command {
        let (head, args) = match text.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (text, ""),
        };
        let head = head.trim_start_matches('/');
        let name = match head.split_once('@') {
            Some((name, target)) => {
                if !target.eq_ignore_ascii_case(bot_username) {
                    debug!("Command addressed to @{}, ignoring", target);
                    return None;
                }
                name
            }
            None => head,
        };
        MessageKind::Command {
            name: name.to_lowercase(),
            args: args.to_string(),
        }
    } else {
        MessageKind::Text(text.to_string())
    };

    Some(InboundMessage {
        chat_id: message.chat.id,
        sender,
        kind,
    })
}

/// Exponential backoff with ±jitter: 1s→2s→4s→...→64s
pub fn retry_delay(attempt: u32) -> Duration {
    let base_delay = POLL_BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt));
    let capped_delay = base_delay.min(POLL_MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    Duration::from_millis((capped_delay as i64 + jitter).max(100) as u64)
}

/// Wait before the next poll: our backoff, or longer if Telegram asked for it
pub fn backoff_delay(attempt: u32, retry_after: Option<Duration>) -> Duration {
    retry_delay(attempt).max(retry_after.unwrap_or_default())
}

/// Map a Bot API `error_code` to ours: auth/config problems are fatal, the rest retryable
fn classify_api_error(error_code: Option<u16>) -> ErrorCode {
    match error_code {
        Some(429) => ErrorCode::TelegramRateLimited,
        Some(401) | Some(403) | Some(404) => ErrorCode::TelegramApiError,
        Some(400) => ErrorCode::TelegramApiError,
        // 409 (another poller), 5xx, or nothing at all
        _ => ErrorCode::TelegramConnectionFailed,
    }
}

/// A failed Bot API call plus the `retry_after` Telegram sent with it, if any
#[derive(Debug)]
struct CallError {
    error: AppError,
    retry_after: Option<Duration>,
}

impl From<AppError> for CallError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl From<CallError> for AppError {
    fn from(failure: CallError) -> Self {
        failure.error
    }
}

/// Unwrap the `{ok, result, ...}` envelope
fn into_result<T>(method: &str, body: ApiResponse<T>) -> Result<T, CallError> {
    if !body.ok {
        let retry_after = body.parameters.and_then(|p| p.retry_after);
        let mut message = format!(
            "{} failed: {}",
            method,
            body.description.unwrap_or_else(|| "no description".to_string())
        );
        if let Some(secs) = retry_after {
            message.push_str(&format!(" (retry after {}s)", secs));
        }
        return Err(CallError {
            error: AppError::new(classify_api_error(body.error_code), message),
            retry_after: retry_after.map(Duration::from_secs),
        });
    }

    body.result.ok_or_else(|| {
        AppError::new(
            ErrorCode::TelegramInvalidResponse,
            format!("{} returned ok without a result", method),
        )
        .into()
    })
}

// ============================================
// Client
// ============================================

pub struct TelegramClient {
    client: reqwest::Client,
    /// `https://api.telegram.org/bot<token>`, never logged
    base_url: String,
    poll_timeout: Duration,
    /// Next update id to ask for
    offset: AtomicI64,
    bot_username: String,
}

impl TelegramClient {
    /// Build the client and check the token with `getMe`
    pub async fn connect(token: &str, poll_timeout: Duration) -> AppResult<Self> {
        let mut telegram = Self {
            client: Self::build_client(poll_timeout)?,
            base_url: format!("{}/bot{}", TELEGRAM_API_BASE, token),
            poll_timeout,
            offset: AtomicI64::new(0),
            bot_username: String::new(),
        };

        let me: User = telegram.call("getMe", json!({})).await?;
        telegram.bot_username = me.username.unwrap_or_default();
        info!("🤖 Connected to Telegram as @{}", telegram.bot_username);

        Ok(telegram)
    }

    fn build_client(poll_timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        reqwest::Client::builder()
            .default_headers(headers)
            // Must outlive the server-side long poll
            .timeout(poll_timeout + Duration::from_secs(POLL_HTTP_GRACE_SECS))
            .build()
            .map_err(|e| {
                AppError::new(
                    ErrorCode::TelegramConnectionFailed,
                    format!("Failed to build HTTP client: {}", e),
                )
            })
    }

    /// Register the command menu shown by chat clients
    pub async fn register_commands(&self, commands: &[(&str, &str)]) -> AppResult<()> {
        let commands: Vec<BotCommand> = commands
            .iter()
            .map(|(command, description)| BotCommand {
                command,
                description,
            })
            .collect();
        let _: bool = self
            .call("setMyCommands", json!({ "commands": commands }))
            .await?;
        info!("📋 Registered {} bot commands", commands.len());
        Ok(())
    }

    /// One `getUpdates` round trip
    async fn get_updates(&self) -> Result<Vec<Update>, CallError> {
        let params = json!({
            "offset": self.offset.load(Ordering::Relaxed),
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", params).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, CallError> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            // reqwest errors embed the URL, which embeds the token
            .map_err(|e| {
                let code = if e.is_timeout() {
                    ErrorCode::ExternalTimeout
                } else {
                    ErrorCode::TelegramConnectionFailed
                };
                AppError::new(code, format!("{} request failed", method))
            })?;

        let body: ApiResponse<T> = response.json().await.map_err(|_| {
            AppError::new(
                ErrorCode::TelegramInvalidResponse,
                format!("{} returned an unreadable body", method),
            )
        })?;

        into_result(method, body)
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    /// Blocks until at least one update arrives or the long poll times out.
    /// Retryable failures are retried here with backoff; the rest are returned.
    async fn next_messages(&self) -> AppResult<Vec<InboundMessage>> {
        let mut attempt = 0u32;
        let updates = loop {
            match self.get_updates().await {
                Ok(updates) => break updates,
                Err(failure) if failure.error.code.is_retryable() => {
                    let delay = backoff_delay(attempt, failure.retry_after);
                    warn!(
                        code = failure.error.code_str(),
                        "⏳ Polling failed ({}), retrying in {}ms",
                        failure.error.message,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(failure) => return Err(failure.into()),
            }
        };

        // Acknowledge everything we received, including skipped updates
        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(last + 1, Ordering::Relaxed);
        }

        Ok(updates
            .iter()
            .filter_map(|u| u.message.as_ref())
            .filter_map(|m| to_inbound(m, &self.bot_username))
            .collect())
    }

    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> AppResult<()> {
        let mut params = json!({
            "chat_id": chat_id,
            "text": reply.text,
        });
        if reply.format == ReplyFormat::Html {
            params["parse_mode"] = json!("HTML");
        }
        let _: Message = self.call("sendMessage", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str, entities: Vec<MessageEntity>) -> Message {
        Message {
            message_id: 1,
            chat: Chat { id: 42 },
            from: Some(User {
                id: 7,
                first_name: "Ana".into(),
                username: None,
            }),
            text: Some(text.into()),
            entities,
        }
    }

    fn command_entity(length: usize) -> Vec<MessageEntity> {
        vec![MessageEntity {
            kind: "bot_command".into(),
            offset: 0,
            length,
        }]
    }

    #[test]
    fn test_plain_text() {
        let inbound = to_inbound(&message("comida 12", vec![]), "GastosBot").unwrap();
        assert_eq!(inbound.chat_id, 42);
        assert_eq!(inbound.sender.display_name, "Ana");
        assert_eq!(inbound.kind, MessageKind::Text("comida 12".into()));
    }

    #[test]
    fn test_command_with_bot_suffix() {
        let inbound =
            to_inbound(&message("/Categorias@GastosBot", command_entity(20)), "gastosbot").unwrap();
        assert_eq!(
            inbound.kind,
            MessageKind::Command {
                name: "categorias".into(),
                args: String::new()
            }
        );
    }

    #[test]
    fn test_command_for_other_bot_is_dropped() {
        assert!(to_inbound(&message("/start@OtherBot", command_entity(15)), "GastosBot").is_none());
    }

    #[test]
    fn test_slash_without_entity_is_text() {
        let inbound = to_inbound(&message("/start", vec![]), "GastosBot").unwrap();
        assert_eq!(inbound.kind, MessageKind::Text("/start".into()));
    }

    #[test]
    fn test_non_text_is_skipped() {
        let mut m = message("", vec![]);
        m.text = None;
        assert!(to_inbound(&m, "GastosBot").is_none());
    }

    #[test]
    fn test_update_deserialization() {
        let body = r#"{"ok":true,"result":[{"update_id":10,"message":{"message_id":3,"date":0,
            "chat":{"id":5,"type":"private"},"from":{"id":7,"is_bot":false,"first_name":"Ana"},
            "text":"/start","entities":[{"type":"bot_command","offset":0,"length":6}]}}]}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let updates = parsed.result.unwrap();
        let inbound = to_inbound(updates[0].message.as_ref().unwrap(), "GastosBot").unwrap();
        assert_eq!(
            inbound.kind,
            MessageKind::Command {
                name: "start".into(),
                args: String::new()
            }
        );
    }

    #[test]
    fn test_retry_delay_bounds() {
        for attempt in 0..12 {
            let ms = retry_delay(attempt).as_millis() as u64;
            assert!(ms >= 100);
            assert!(ms <= POLL_MAX_RETRY_MS + POLL_MAX_RETRY_MS * RETRY_JITTER_PERCENT / 100);
        }
        let first = retry_delay(0).as_millis() as u64;
        assert!((800..=1200).contains(&first));
    }

    #[test]
    fn test_rate_limit_wait_is_honoured() {
        let body = r#"{"ok":false,"error_code":429,
            "description":"Too Many Requests: retry after 35","parameters":{"retry_after":35}}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        let failure = into_result("getUpdates", parsed).unwrap_err();

        assert_eq!(failure.error.code, ErrorCode::TelegramRateLimited);
        assert_eq!(failure.retry_after, Some(Duration::from_secs(35)));
        for attempt in 0..3 {
            assert!(backoff_delay(attempt, failure.retry_after) >= Duration::from_secs(35));
        }
        assert!(backoff_delay(0, None) <= Duration::from_millis(1200));
        // Our own schedule wins once it is already longer
        assert!(backoff_delay(8, Some(Duration::from_secs(1))) >= Duration::from_millis(51_200));
    }

    #[test]
    fn test_ok_without_result() {
        let parsed: ApiResponse<bool> = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        let err: AppError = into_result("setMyCommands", parsed).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::TelegramInvalidResponse);
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(classify_api_error(Some(429)), ErrorCode::TelegramRateLimited);
        assert_eq!(classify_api_error(Some(401)), ErrorCode::TelegramApiError);
        assert!(classify_api_error(Some(409)).is_retryable());
        assert!(classify_api_error(Some(502)).is_retryable());
    }
}
