//! # Bastion Core
//!
//! Deterministic per-round decision core for a two-player grid
//! tower-defense contest.
//!
//! This crate contains **only** decision logic:
//! - No IO (the adapter owns stdin/stdout and files)
//! - No randomness
//! - No floating-point math in decisions (uses fixed-point)
//!
//! Everything the core asks of the outside world goes through the
//! [`board::GameBoard`] trait, so the same engine runs against the live
//! protocol, a recorded transcript or a scripted test board.
//!
//! ## Crate Structure
//!
//! - [`arena`] - Diamond geometry, regions and edges
//! - [`telemetry`] - Round snapshots and incursion traces
//! - [`damage`] - Regional damage scoring
//! - [`classifier`] - Funnel and maze detection
//! - [`defense`] / [`blueprint`] - Zone reinforcement and static layout
//! - [`attack`] - Reactive, proactive and opening strikes
//! - [`counters`] - Archetype responses
//! - [`engine`] - Round orchestrator and match session

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arena;
pub mod attack;
pub mod blueprint;
pub mod board;
pub mod classifier;
pub mod config;
pub mod counters;
pub mod damage;
pub mod defense;
pub mod engine;
pub mod error;
pub mod math;
pub mod pathfinding;
pub mod telemetry;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arena::{Edge, Flank, FrontZone, PlayerSide, Position, Region, ZoneMap};
    pub use crate::board::{
        Command, CommandBatch, Deployment, GameBoard, ResourceState, Structure,
    };
    pub use crate::config::EngineConfig;
    pub use crate::engine::{DecisionEngine, MatchSession, RoundDecision, RoundPhase, TurnReport};
    pub use crate::error::{EngineError, Result};
    pub use crate::math::Fixed;
    pub use crate::telemetry::{ActionFrame, BreachRecord, MoveRecord, RoundSnapshot};
    pub use crate::units::{UnitCatalog, UnitKind, UnitTableEntry};
}
