//! Utils Module - Helper Functions & Shared Utilities

pub mod constants;
pub mod logging;
pub mod telemetry;
pub mod text;

pub use constants::*;
pub use telemetry::*;
pub use text::*;
