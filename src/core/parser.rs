//! Message Parser
//!
//! Turns one line of user text into a [`ParseOutcome`]. Pure: no I/O, no
//! clock, no shared state. Same text + same registry + same context always
//! gives the same outcome.
//!
//! Steps, in order:
//! 1. Pull the first `'quoted span'` out as the description.
//! 2. Shortcut: if the first word is a known category, rewrite
//!    `<category> <rest>` as `gasto <rest> <category>`.
//! 3. Standard form: `gasto <amount> <category text...>`.
//! 4. Anything else is `Unrecognized`.
//!
//! The standard form does not check the category against the registry, only
//! the shortcut does. Existing users rely on free-form categories there.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::registry::CategoryRegistry;
use crate::core::replies;
use crate::models::types::{
    MessageContext, ParseOutcome, ParsedExpense, Rejection, RejectionKind,
};
use crate::utils::constants::EXPENSE_KEYWORD;
use crate::utils::text::capitalize;

lazy_static! {
    /// Shortest single-quoted span; `.` stops at newlines
    static ref DESCRIPTION_RE: Regex = Regex::new(r"'(.*?)'").expect("valid description regex");
}

/// Interpret one message
pub fn parse_message(
    raw: &str,
    categories: &CategoryRegistry,
    ctx: &MessageContext,
) -> ParseOutcome {
    let (working, description) = extract_description(raw);

    let text = match expand_shortcut(&working, categories) {
        Shortcut::NotApplicable => working,
        Shortcut::Expanded(rewritten) => rewritten,
        Shortcut::MissingAmount(category) => {
            return reject(RejectionKind::MalformedShortcut { category });
        }
    };

    parse_standard_form(&text, description, ctx)
}

/// Split off the first quoted span. Returns (text without the span, trimmed inner text).
pub fn extract_description(raw: &str) -> (String, String) {
    match DESCRIPTION_RE.captures(raw) {
        Some(caps) => {
            // Group 0 always exists on a match
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let inner = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let mut working = String::with_capacity(raw.len());
            working.push_str(&raw[..whole.start]);
            working.push_str(&raw[whole.end..]);
            (working, inner.to_string())
        }
        None => (raw.to_string(), String::new()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Shortcut {
    NotApplicable,
    Expanded(String),
    /// Category word with nothing after it
    MissingAmount(String),
}

fn expand_shortcut(text: &str, categories: &CategoryRegistry) -> Shortcut {
    let trimmed = text.trim();
    let (first, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (trimmed, ""),
    };

    if first.is_empty() {
        return Shortcut::NotApplicable;
    }

    let first_word = first.to_lowercase();
    if !categories.contains(&first_word) {
        return Shortcut::NotApplicable;
    }

    if rest.is_empty() {
        Shortcut::MissingAmount(first_word)
    } else {
        Shortcut::Expanded(format!("{} {} {}", EXPENSE_KEYWORD, rest, first_word))
    }
}

fn parse_standard_form(text: &str, description: String, ctx: &MessageContext) -> ParseOutcome {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    match tokens.first() {
        Some(keyword) if keyword.to_lowercase() == EXPENSE_KEYWORD => {}
        _ => return ParseOutcome::Unrecognized,
    }

    if tokens.len() < 3 {
        return reject(RejectionKind::MalformedExpense);
    }

    let amount_token = tokens[1];
    let amount = match parse_amount(amount_token) {
        Some(amount) => amount,
        None => {
            return reject(RejectionKind::InvalidAmount {
                token: amount_token.to_string(),
            })
        }
    };
    if amount <= Decimal::ZERO {
        return reject(RejectionKind::NonPositiveAmount {
            token: amount_token.to_string(),
        });
    }

    ParseOutcome::Expense(ParsedExpense {
        timestamp: ctx.received_at,
        amount,
        category: capitalize(&tokens[2..].join(" ")),
        actor: ctx.actor.clone(),
        description,
    })
}

/// Plain decimal literal: optional sign, digits, at most one point.
/// Exponents, `inf`, `nan`, separators and the like are refused.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) || int_part.len() + frac_part.len() == 0 {
        return None;
    }

    // ".5" and "5." are accepted; hand the decimal crate the canonical spelling
    let mut canonical = String::with_capacity(token.len() + 2);
    if negative {
        canonical.push('-');
    }
    canonical.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        canonical.push('.');
        canonical.push_str(frac_part);
    }

    // Too many digits for 96 bits also lands here
    Decimal::from_str(&canonical).ok()
}

fn reject(kind: RejectionKind) -> ParseOutcome {
    let reply = replies::rejection(&kind);
    ParseOutcome::Rejected(Rejection { kind, reply })
}
