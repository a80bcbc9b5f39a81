//! Status API
//!
//! Optional HTTP surface for liveness probes and counters. Enabled when a
//! port is configured; the bot runs the same without it.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
