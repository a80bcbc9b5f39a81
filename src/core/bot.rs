//! Bot loop: pull messages from the chat transport, dispatch, reply.
//!
//! Messages are handled one at a time, in arrival order. A batch that has
//! started is always finished before shutdown is honoured, so an expense is
//! never written without its confirmation being attempted.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::dispatcher::Dispatcher;
use crate::models::errors::AppResult;
use crate::models::types::{InboundMessage, Reply};

/// Chat platform seam
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Wait for the next batch of messages. An empty batch is a normal poll timeout.
    async fn next_messages(&self) -> AppResult<Vec<InboundMessage>>;

    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> AppResult<()>;
}

pub struct ExpenseBot<T: ChatTransport> {
    transport: T,
    dispatcher: Arc<Dispatcher>,
}

impl<T: ChatTransport> ExpenseBot<T> {
    pub fn new(transport: T, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    /// Poll until `shutdown` resolves or the transport fails in a way it
    /// could not recover from on its own.
    pub async fn run_until<F>(&self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!("🚀 Bot is polling for messages");
        tokio::pin!(shutdown);

        loop {
            let batch = tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Shutdown requested, leaving poll loop");
                    return Ok(());
                }
                batch = self.transport.next_messages() => batch,
            };

            match batch {
                Ok(messages) => self.process_batch(&messages).await,
                Err(e) => {
                    error!(code = e.code_str(), "❌ Chat transport failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Handle each message in order and send whatever reply it produced
    pub async fn process_batch(&self, messages: &[InboundMessage]) {
        for message in messages {
            let Some(reply) = self.dispatcher.handle(message).await else {
                continue;
            };
            if let Err(e) = self.transport.send_reply(message.chat_id, &reply).await {
                warn!(
                    chat_id = message.chat_id,
                    code = e.code_str(),
                    "⚠️ Failed to deliver reply: {}",
                    e
                );
            }
        }
    }
}
