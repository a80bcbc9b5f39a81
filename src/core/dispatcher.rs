//! Command Dispatcher
//!
//! Entry point for every inbound message. Runs the authorization gate first,
//! then routes `/start` and `/categorias` to their handlers and everything
//! else to the parser. Returns the single reply to send, or `None` for a
//! silent drop.

use chrono::Local;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::core::auth::AuthorizationGate;
use crate::core::parser::parse_message;
use crate::core::registry::CategoryRegistry;
use crate::core::replies;
use crate::core::sink::RecordSink;
use crate::models::types::{
    InboundMessage, MessageContext, MessageKind, ParseOutcome, Reply, Sender,
};
use crate::utils::constants::{COMMAND_CATEGORIES, COMMAND_CATEGORIES_ALIAS, COMMAND_START};
use crate::utils::telemetry::BotStats;

/// Commands the dispatcher owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Categories,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            COMMAND_START => Some(Self::Start),
            COMMAND_CATEGORIES | COMMAND_CATEGORIES_ALIAS => Some(Self::Categories),
            _ => None,
        }
    }

    /// (name, description) pairs for the chat client's command menu
    pub fn menu() -> [(&'static str, &'static str); 2] {
        [
            (COMMAND_START, "Ver cómo registrar gastos"),
            (COMMAND_CATEGORIES, "Ver las categorías válidas"),
        ]
    }
}

pub struct Dispatcher {
    gate: AuthorizationGate,
    registry: Arc<CategoryRegistry>,
    sink: Arc<dyn RecordSink>,
    stats: Arc<BotStats>,
    /// Shown in the success reply
    expenses_sheet: String,
}

impl Dispatcher {
    pub fn new(
        gate: AuthorizationGate,
        registry: Arc<CategoryRegistry>,
        sink: Arc<dyn RecordSink>,
        stats: Arc<BotStats>,
        expenses_sheet: impl Into<String>,
    ) -> Self {
        Self {
            gate,
            registry,
            sink,
            stats,
            expenses_sheet: expenses_sheet.into(),
        }
    }

    /// Handle one message to completion, sink write included
    pub async fn handle(&self, message: &InboundMessage) -> Option<Reply> {
        match &message.kind {
            MessageKind::Command { name, .. } => self.handle_command(&message.sender, name),
            MessageKind::Text(text) => self.handle_text(&message.sender, text).await,
        }
    }

    fn handle_command(&self, sender: &Sender, name: &str) -> Option<Reply> {
        let Some(command) = Command::from_name(name) else {
            // Unregistered commands fall through to the transport default: nothing
            debug!(
                user_id = sender.id,
                user_name = %sender.display_name,
                "Ignoring unknown command /{}",
                name
            );
            return None;
        };

        self.stats.record_message();
        if !self.gate.admit(sender, &format!("/{}", name)) {
            self.stats.record_denied();
            return None;
        }
        self.stats.record_command();

        match command {
            Command::Start => {
                info!(
                    user_id = sender.id,
                    user_name = %sender.display_name,
                    "Authorized user sent /start"
                );
                Some(replies::start(&sender.display_name))
            }
            Command::Categories => Some(replies::categories(&self.registry.all())),
        }
    }

    async fn handle_text(&self, sender: &Sender, text: &str) -> Option<Reply> {
        self.stats.record_message();
        if !self.gate.admit(sender, &format!("message: '{}'", text)) {
            self.stats.record_denied();
            return None;
        }

        let ctx = MessageContext {
            actor: sender.display_name.clone(),
            received_at: Local::now().naive_local(),
        };

        match parse_message(text, &self.registry, &ctx) {
            ParseOutcome::Expense(expense) => match self.sink.append_expense(&expense).await {
                Ok(()) => {
                    info!(
                        user_id = sender.id,
                        user_name = %sender.display_name,
                        amount = %expense.amount,
                        category = %expense.category,
                        "Expense recorded in '{}'",
                        self.expenses_sheet
                    );
                    self.stats
                        .record_expense(self.registry.contains(&expense.category));
                    Some(replies::recorded(&expense, &self.expenses_sheet))
                }
                Err(e) => {
                    error!(
                        user_id = sender.id,
                        user_name = %sender.display_name,
                        code = e.code_str(),
                        "Error writing expense to the sheet: {}",
                        e
                    );
                    self.stats.record_sink_failure();
                    Some(replies::sink_failure())
                }
            },
            ParseOutcome::Rejected(rejection) => {
                warn!(
                    user_id = sender.id,
                    user_name = %sender.display_name,
                    kind = rejection.kind.as_str(),
                    "Rejected message: '{}'",
                    text
                );
                self.stats.record_rejection(rejection.kind.as_str());
                Some(rejection.reply)
            }
            ParseOutcome::Unrecognized => {
                info!(
                    user_id = sender.id,
                    user_name = %sender.display_name,
                    "Unrecognized message: '{}'",
                    text
                );
                self.stats.record_unrecognized();
                Some(replies::unrecognized())
            }
        }
    }
}
