//! The engine-facing board interface.
//!
//! This module defines the [`GameBoard`] trait through which every
//! decision reaches the external simulation engine. Planners never talk to
//! a board directly: they go through a [`Deployment`], which forwards each
//! placement to the board and records it in the round's [`CommandBatch`].
//!
//! - **One channel:** all spawns and removals pass through `Deployment`,
//!   so the recorded batch is exactly what the engine was asked to do.
//! - **Engine is authoritative:** the board decides legality and debits
//!   resources. Affordability checks made here are advisory only.
//! - **Idempotent structures:** placing a structure on an occupied cell is
//!   a silent no-op and is not recorded.

use serde::{Deserialize, Serialize};

use crate::arena::{Edge, PlayerSide, Position};
use crate::math::Fixed;
use crate::units::UnitKind;

/// A stationary unit standing on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    /// Kind of structure.
    pub kind: UnitKind,
    /// Remaining stability.
    pub stability: Fixed,
}

impl Structure {
    /// Create a structure record.
    #[must_use]
    pub const fn new(kind: UnitKind, stability: Fixed) -> Self {
        Self { kind, stability }
    }
}

/// The two replenishing resource pools of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceState {
    /// Funds mobile units.
    pub tempo: Fixed,
    /// Funds structures.
    pub build: Fixed,
}

impl ResourceState {
    /// Create a resource sample.
    #[must_use]
    pub const fn new(tempo: Fixed, build: Fixed) -> Self {
        Self { tempo, build }
    }
}

/// Operations the external engine exposes during the deploy phase.
///
/// Implementations wrap the engine's per-round state document. All
/// queries reflect placements accepted earlier in the same round.
pub trait GameBoard {
    /// Zero-based round index.
    fn turn_number(&self) -> u32;

    /// Remaining health of a player.
    fn health(&self, side: PlayerSide) -> u32;

    /// Current resource pools of a player.
    fn resources(&self, side: PlayerSide) -> ResourceState;

    /// Structure standing on a cell, if any.
    fn structure_at(&self, pos: Position) -> Option<Structure>;

    /// Whether a cell holds a structure.
    fn contains_stationary_unit(&self, pos: Position) -> bool {
        self.structure_at(pos).is_some()
    }

    /// Ask the engine to place `count` units; returns how many it accepted.
    fn attempt_spawn(&mut self, kind: UnitKind, pos: Position, count: u32) -> u32;

    /// Ask the engine to remove our structure on a cell.
    fn attempt_remove(&mut self, pos: Position) -> bool;

    /// How many units of a kind the current pools can pay for.
    fn number_affordable(&self, kind: UnitKind) -> u32;

    /// Legality probe that spends nothing.
    fn can_spawn(&self, kind: UnitKind, pos: Position) -> bool;

    /// Path a mobile unit starting at `start` would walk towards `edge`.
    ///
    /// Returns an empty path when the start cell is blocked.
    fn find_path_to_edge(&self, start: Position, edge: Edge) -> Vec<Position>;

    /// Hand the finished command batch to the engine.
    fn submit_turn(&mut self, batch: &CommandBatch);
}

/// A single accepted instruction in a round's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Place units.
    Spawn {
        /// Kind placed.
        kind: UnitKind,
        /// Target cell.
        pos: Position,
        /// Number accepted by the engine.
        count: u32,
    },
    /// Remove our structure.
    Remove {
        /// Target cell.
        pos: Position,
    },
}

/// Ordered commands issued during one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBatch {
    /// Round the batch belongs to.
    pub turn: u32,
    /// Commands in issue order.
    pub commands: Vec<Command>,
}

impl CommandBatch {
    /// Empty batch for a round.
    #[must_use]
    pub fn new(turn: u32) -> Self {
        Self {
            turn,
            commands: Vec::new(),
        }
    }

    /// Total number of units of a kind spawned in this batch.
    #[must_use]
    pub fn spawned(&self, kind: UnitKind) -> u32 {
        self.commands
            .iter()
            .map(|c| match c {
                Command::Spawn { kind: k, count, .. } if *k == kind => *count,
                _ => 0,
            })
            .sum()
    }

    /// Whether any mobile unit was spawned.
    #[must_use]
    pub fn has_mobile_spawn(&self) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, Command::Spawn { kind, .. } if kind.is_mobile()))
    }

    /// Spawn commands only, in order.
    pub fn spawns(&self) -> impl Iterator<Item = (UnitKind, Position, u32)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            Command::Spawn { kind, pos, count } => Some((kind, pos, count)),
            Command::Remove { .. } => None,
        })
    }

    /// Removal targets only, in order.
    pub fn removals(&self) -> impl Iterator<Item = Position> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            Command::Remove { pos } => Some(pos),
            Command::Spawn { .. } => None,
        })
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Round-scoped wrapper that forwards to a board and records the batch.
pub struct Deployment<'b, B: GameBoard + ?Sized> {
    board: &'b mut B,
    batch: CommandBatch,
}

impl<'b, B: GameBoard + ?Sized> Deployment<'b, B> {
    /// Open a deployment for the board's current round.
    pub fn new(board: &'b mut B) -> Self {
        let turn = board.turn_number();
        Self {
            board,
            batch: CommandBatch::new(turn),
        }
    }

    /// Read-only access to the wrapped board.
    pub fn board(&self) -> &B {
        &*self.board
    }

    /// Commands recorded so far.
    pub fn batch(&self) -> &CommandBatch {
        &self.batch
    }

    /// Place units of any kind.
    ///
    /// Structures aimed at an occupied cell are skipped without asking the
    /// engine. Zero counts are skipped. Returns the accepted count.
    pub fn spawn(&mut self, kind: UnitKind, pos: Position, count: u32) -> u32 {
        if count == 0 {
            return 0;
        }
        if kind.is_structure() && self.board.contains_stationary_unit(pos) {
            return 0;
        }
        let accepted = self.board.attempt_spawn(kind, pos, count);
        if accepted > 0 {
            self.batch.commands.push(Command::Spawn {
                kind,
                pos,
                count: accepted,
            });
        } else {
            tracing::trace!(%kind, %pos, "Placement rejected by engine");
        }
        accepted
    }

    /// Place a single unit.
    pub fn spawn_one(&mut self, kind: UnitKind, pos: Position) -> bool {
        self.spawn(kind, pos, 1) > 0
    }

    /// Place as many units as the pools currently afford.
    ///
    /// The count is queried immediately before the spawn.
    pub fn spawn_affordable(&mut self, kind: UnitKind, pos: Position) -> u32 {
        let count = self.board.number_affordable(kind);
        self.spawn(kind, pos, count)
    }

    /// Remove our structure on a cell.
    pub fn remove(&mut self, pos: Position) -> bool {
        let accepted = self.board.attempt_remove(pos);
        if accepted {
            self.batch.commands.push(Command::Remove { pos });
        }
        accepted
    }

    /// Place a wall and immediately schedule its removal.
    ///
    /// The opponent's cached paths are recomputed around the wall this
    /// round while the structure itself is refunded next round. A structure
    /// already standing on the cell is left alone.
    pub fn sacrificial_wall(&mut self, pos: Position) -> bool {
        self.spawn_one(UnitKind::Wall, pos) && self.remove(pos)
    }

    /// Make sure a cell ends up holding a structure of `kind`.
    ///
    /// An occupant of another kind is scheduled for removal; an empty cell
    /// gets a new structure.
    pub fn ensure_structure(&mut self, kind: UnitKind, pos: Position) {
        match self.board.structure_at(pos) {
            Some(existing) if existing.kind != kind => {
                self.remove(pos);
            }
            Some(_) => {}
            None => {
                self.spawn_one(kind, pos);
            }
        }
    }

    /// Affordable count for a kind.
    pub fn affordable(&self, kind: UnitKind) -> u32 {
        self.board.number_affordable(kind)
    }

    /// Legality probe for a kind on a cell.
    pub fn can_spawn(&self, kind: UnitKind, pos: Position) -> bool {
        self.board.can_spawn(kind, pos)
    }

    /// Structure on a cell.
    pub fn structure_at(&self, pos: Position) -> Option<Structure> {
        self.board.structure_at(pos)
    }

    /// Whether a cell holds a structure.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.board.contains_stationary_unit(pos)
    }

    /// Pathfinding oracle.
    pub fn path_to_edge(&self, start: Position, edge: Edge) -> Vec<Position> {
        self.board.find_path_to_edge(start, edge)
    }

    /// Submit the batch to the engine and hand it back.
    pub fn submit(self) -> CommandBatch {
        tracing::debug!(
            turn = self.batch.turn,
            commands = self.batch.commands.len(),
            "Submitting turn"
        );
        self.board.submit_turn(&self.batch);
        self.batch
    }
}
