//! Error types for the scheduler

use thiserror::Error;

/// Main error type for the scheduler
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
