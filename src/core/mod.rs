//! Core Module - Bot Logic
//!
//! Authorization, category registry, message parsing, dispatch and the
//! poll loop. Nothing here talks HTTP directly; providers plug in through
//! the `CategorySource`, `RecordSink` and `ChatTransport` traits.

pub mod auth;
pub mod bot;
pub mod dispatcher;
pub mod parser;
pub mod registry;
pub mod replies;
pub mod sink;

pub use auth::AuthorizationGate;
pub use bot::{ChatTransport, ExpenseBot};
pub use dispatcher::{Command, Dispatcher};
pub use parser::parse_message;
pub use registry::{CategoryRegistry, CategorySource};
pub use sink::RecordSink;
