//! [`GameBoard`] over one deploy-phase state frame.
//!
//! The adapter's model of the engine is deliberately shallow: it knows the
//! placement rules well enough to avoid asking for impossible spawns, debits
//! our pools as placements are accepted and keeps new structures visible for
//! the rest of the round. The engine still has the final word when the
//! reply is applied.

use std::collections::{BTreeMap, BTreeSet};

use bastion_core::arena::{Edge, PlayerSide, Position, HALF_ARENA};
use bastion_core::board::{CommandBatch, GameBoard, ResourceState, Structure};
use bastion_core::math::Fixed;
use bastion_core::pathfinding::{find_path_to_edge, NavGrid};
use bastion_core::units::{UnitCatalog, UnitKind};

use crate::error::Result;
use crate::protocol::{StateFrame, TurnSubmission, UnitCosts};

/// Board for one deploy phase.
#[derive(Debug, Clone)]
pub struct LiveBoard {
    catalog: UnitCatalog,
    costs: UnitCosts,
    turn: u32,
    health: [u32; 2],
    resources: [ResourceState; 2],
    structures: BTreeMap<Position, (PlayerSide, Structure)>,
    removals: BTreeSet<Position>,
    submission: Option<TurnSubmission>,
}

const fn slot(side: PlayerSide) -> usize {
    match side {
        PlayerSide::Friendly => 0,
        PlayerSide::Opponent => 1,
    }
}

impl LiveBoard {
    /// Build from a deploy-phase frame.
    pub fn from_frame(frame: &StateFrame, catalog: &UnitCatalog, costs: &UnitCosts) -> Result<Self> {
        let mut structures = BTreeMap::new();
        for side in [PlayerSide::Friendly, PlayerSide::Opponent] {
            for (pos, structure) in frame.structures(side)? {
                structures.insert(pos, (side, structure));
            }
        }
        Ok(Self {
            catalog: catalog.clone(),
            costs: costs.clone(),
            turn: frame.turn()?,
            health: [
                frame.health(PlayerSide::Friendly)?,
                frame.health(PlayerSide::Opponent)?,
            ],
            resources: [
                frame.resources(PlayerSide::Friendly)?,
                frame.resources(PlayerSide::Opponent)?,
            ],
            structures,
            removals: BTreeSet::new(),
            submission: None,
        })
    }

    /// Reply lines produced by the last [`GameBoard::submit_turn`].
    pub fn take_submission(&mut self) -> Option<TurnSubmission> {
        self.submission.take()
    }

    fn pool_mut(&mut self, kind: UnitKind) -> &mut Fixed {
        let pools = &mut self.resources[slot(PlayerSide::Friendly)];
        if kind.is_structure() {
            &mut pools.build
        } else {
            &mut pools.tempo
        }
    }

    fn placeable(&self, kind: UnitKind, pos: Position) -> bool {
        if !pos.in_bounds() || pos.y >= HALF_ARENA || self.structures.contains_key(&pos) {
            return false;
        }
        // Mobile units enter from our two back edges only.
        kind.is_structure() || Edge::BottomLeft.contains(pos) || Edge::BottomRight.contains(pos)
    }
}

impl GameBoard for LiveBoard {
    fn turn_number(&self) -> u32 {
        self.turn
    }

    fn health(&self, side: PlayerSide) -> u32 {
        self.health[slot(side)]
    }

    fn resources(&self, side: PlayerSide) -> ResourceState {
        self.resources[slot(side)]
    }

    fn structure_at(&self, pos: Position) -> Option<Structure> {
        self.structures.get(&pos).map(|(_, s)| *s)
    }

    fn attempt_spawn(&mut self, kind: UnitKind, pos: Position, count: u32) -> u32 {
        if !self.placeable(kind, pos) {
            return 0;
        }
        let wanted = if kind.is_structure() { count.min(1) } else { count };
        let accepted = wanted.min(self.number_affordable(kind));
        if accepted == 0 {
            return 0;
        }
        let price = self.costs.of(kind) * Fixed::from_num(accepted);
        *self.pool_mut(kind) -= price;
        if kind.is_structure() {
            let stability = self.catalog.base_stability(kind);
            self.structures
                .insert(pos, (PlayerSide::Friendly, Structure::new(kind, stability)));
        }
        accepted
    }

    fn attempt_remove(&mut self, pos: Position) -> bool {
        match self.structures.get(&pos) {
            Some((PlayerSide::Friendly, _)) => self.removals.insert(pos),
            _ => false,
        }
    }

    fn number_affordable(&self, kind: UnitKind) -> u32 {
        let price = self.costs.of(kind);
        if price <= Fixed::ZERO {
            return u32::MAX;
        }
        let pools = self.resources[slot(PlayerSide::Friendly)];
        let pool = if kind.is_structure() {
            pools.build
        } else {
            pools.tempo
        };
        (pool / price).floor().to_num::<i64>().clamp(0, i64::from(u32::MAX)) as u32
    }

    fn can_spawn(&self, kind: UnitKind, pos: Position) -> bool {
        self.placeable(kind, pos) && self.number_affordable(kind) > 0
    }

    fn find_path_to_edge(&self, start: Position, edge: Edge) -> Vec<Position> {
        find_path_to_edge(&NavGrid::from_board(self), start, edge)
    }

    fn submit_turn(&mut self, batch: &CommandBatch) {
        self.submission = Some(TurnSubmission::from_batch(batch, &self.catalog));
    }
}
