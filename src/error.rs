//! Application-level error with a process exit code.
//!
//! Exit codes:
//! - `2`: invalid configuration or unreadable input
//! - `3`: no model converged
//! - `4`: internal or output failure (e.g. writing the metrics CSV)
//!
//! Per-model solver failures are not `AppError`s; they are recorded as
//! `FitOutcome::Failed` and the run continues.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}
