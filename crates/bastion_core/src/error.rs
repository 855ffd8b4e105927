//! Error types for the decision core.

use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for the decision core.
///
/// Everything here is a configuration or wiring fault upstream of the
/// core. Recoverable conditions (unaffordable placements, unreachable
/// paths, missing telemetry) never surface as errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine's unit table did not list the expected number of kinds.
    #[error("Unit table has {found} entries, expected at least {expected}")]
    UnitTableTooShort {
        /// Number of entries required.
        expected: usize,
        /// Number of entries supplied.
        found: usize,
    },

    /// A short code appears more than once in the unit table.
    #[error("Duplicate unit short code: {0}")]
    DuplicateShortCode(String),

    /// A unit index outside the resolved table.
    #[error("Unknown unit index: {0}")]
    UnknownUnitIndex(u8),

    /// A short code that was never resolved at game start.
    #[error("Unknown unit short code: {0}")]
    UnknownShortCode(String),

    /// A movement record named a kind that cannot move.
    #[error("Unit index {index} ({kind}) is not a mobile unit")]
    NotMobile {
        /// Raw unit index from the event record.
        index: u8,
        /// Resolved kind name.
        kind: &'static str,
    },

    /// Configuration data failed to parse.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but holds an unusable value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid engine state.
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}
