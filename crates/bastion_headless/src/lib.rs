//! Headless protocol adapter for the Bastion decision core.
//!
//! This crate connects [`bastion_core`] to the game engine's JSON-lines
//! channel:
//!
//! - **Live play**: the engine pipes state frames to stdin and reads our
//!   build and deploy lists from stdout
//! - **Replay**: a recorded transcript is fed through the same loop offline
//!
//! # Protocol
//!
//! - **stdin**: game config, then one state frame per line
//! - **stdout**: two reply lines per deploy phase
//! - **stderr**: logs (human-readable)
//!
//! See [`protocol`] module for the line formats.
//!
//! # Example
//!
//! ```bash
//! # Play against the engine
//! cargo run -p bastion_headless -- play --config tuning.ron
//!
//! # Replay a recorded match
//! cargo run -p bastion_headless -- replay --transcript match.jsonl --output replies.jsonl
//! ```

pub mod board;
pub mod error;
pub mod protocol;
pub mod runner;

pub use board::LiveBoard;
pub use error::{HeadlessError, Result};
pub use protocol::{GameConfig, StateFrame, TurnSubmission};
pub use runner::{LineOutcome, MatchRunner, RunSummary};

use std::path::Path;

use bastion_core::config::EngineConfig;

/// Load engine thresholds from a RON file, or defaults when no path is given.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let config: EngineConfig = ron::from_str(&text)?;
    config.validate()?;
    tracing::info!(path = %path.display(), "Loaded engine configuration");
    Ok(config)
}
