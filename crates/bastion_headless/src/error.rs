//! Error types for the headless adapter.

use thiserror::Error;

use bastion_core::error::EngineError;

/// Result type alias using [`HeadlessError`].
pub type Result<T> = std::result::Result<T, HeadlessError>;

/// Everything that can stop a headless match.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Reading input or writing replies failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A protocol line was not valid JSON for its expected shape.
    #[error("Malformed protocol line: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine configuration file was not valid RON.
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// The decision core rejected its input.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A well-formed line carried values the protocol does not allow.
    #[error("Protocol violation: {0}")]
    Protocol(String),
}
