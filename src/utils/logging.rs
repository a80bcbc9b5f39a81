//! File log sink for `bot_gastos.log`

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::models::config::ENV_LOG_DIR;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::LOG_FILE_NAME;

/// Append-only `bot_gastos.log` in `dir`, never rotated.
/// Fails instead of panicking when the directory can't be created or written.
pub fn log_file_appender(dir: &Path) -> AppResult<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
        .map_err(|e| {
            AppError::with_source(
                ErrorCode::ConfigInvalidValue,
                format!("{}: cannot open {} in {}", ENV_LOG_DIR, LOG_FILE_NAME, dir.display()),
                e,
            )
        })
}
