//! Core data types for the expense bot

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::constants::TIMESTAMP_FORMAT;

// ============================================
// Inbound / outbound messages
// ============================================

/// Opaque numeric identity of a chat user
pub type UserId = i64;

/// Who sent an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    /// First name as shown by the chat client; written to the sheet as the actor
    pub display_name: String,
}

/// Command vs free text, as decided by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// `/name args...` (name without slash or `@bot` suffix, lowercased)
    Command { name: String, args: String },
    /// Anything else with text
    Text(String),
}

/// One inbound chat event, reduced to the fields the core consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Where the reply goes
    pub chat_id: i64,
    pub sender: Sender,
    pub kind: MessageKind,
}

impl InboundMessage {
    pub fn text(chat_id: i64, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender,
            kind: MessageKind::Text(text.into()),
        }
    }

    pub fn command(chat_id: i64, sender: Sender, name: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender,
            kind: MessageKind::Command {
                name: name.into(),
                args: String::new(),
            },
        }
    }
}

/// How the transport should render a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Plain,
    Html,
}

/// Exactly one of these is sent per handled message (or none, for silent drops)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Html,
        }
    }
}

// ============================================
// Parse results
// ============================================

/// Per-message inputs the parser needs besides the text itself.
/// Passing them in keeps `parse_message` free of clocks and globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub actor: String,
    pub received_at: NaiveDateTime,
}

/// A fully validated expense, ready for the record sink.
///
/// `amount` is always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedExpense {
    pub timestamp: NaiveDateTime,
    pub amount: Decimal,
    /// Display form, first letter upper-cased
    pub category: String,
    pub actor: String,
    /// Empty when the message had no quoted span
    pub description: String,
}

impl ParsedExpense {
    /// Timestamp in the sheet's column format
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Why a message that looked like an expense was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionKind {
    /// Category shortcut with nothing after it
    MalformedShortcut { category: String },
    /// Amount token is not a plain decimal literal
    InvalidAmount { token: String },
    /// Amount parsed but is zero or negative
    NonPositiveAmount { token: String },
    /// `gasto` with fewer than two tokens after it
    MalformedExpense,
}

impl RejectionKind {
    /// Stable key for counters and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedShortcut { .. } => "malformed_shortcut",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::NonPositiveAmount { .. } => "non_positive_amount",
            Self::MalformedExpense => "malformed_expense",
        }
    }
}

/// A refusal plus the corrective text shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reply: Reply,
}

/// Result of interpreting one line of user text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Expense(ParsedExpense),
    Rejected(Rejection),
    /// Not an expense at all; answered with a pointer to /start
    Unrecognized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[test]
    fn test_timestamp_string_matches_sheet_format() {
        let expense = ParsedExpense {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(7, 5, 0)
                .unwrap(),
            amount: Decimal::from_str("12.50").unwrap(),
            category: "Comida".to_string(),
            actor: "Ana".to_string(),
            description: String::new(),
        };
        assert_eq!(expense.timestamp_string(), "2024-03-09 07:05:00");
        assert!(!expense.has_description());
    }

    #[test]
    fn test_rejection_kind_keys() {
        assert_eq!(RejectionKind::MalformedExpense.as_str(), "malformed_expense");
        assert_eq!(
            RejectionKind::InvalidAmount { token: "abc".into() }.as_str(),
            "invalid_amount"
        );
    }
}
