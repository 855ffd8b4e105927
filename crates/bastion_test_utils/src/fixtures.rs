//! Test fixtures and helpers.
//!
//! [`ScriptedBoard`] stands in for the external engine: it keeps both
//! layouts in memory, debits the friendly pools on every accepted spawn and
//! schedules removals for the next round. Paths come from the core's own
//! A* unless a test pins one with [`ScriptedBoard::with_path`].

use std::collections::{BTreeMap, BTreeSet};

use bastion_core::arena::{Edge, PlayerSide, Position, HALF_ARENA};
use bastion_core::board::{CommandBatch, GameBoard, ResourceState, Structure};
use bastion_core::math::Fixed;
use bastion_core::pathfinding::{find_path_to_edge, NavGrid};
use bastion_core::telemetry::{ActionFrame, BreachRecord, MoveRecord, StructureLayout};
use bastion_core::units::UnitKind;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Decision code never uses floats; this only shortens test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Engine price of one unit, paid from build (structures) or tempo (mobile).
#[must_use]
pub fn unit_cost(kind: UnitKind) -> Fixed {
    match kind {
        UnitKind::Wall | UnitKind::SwarmUnit | UnitKind::SupportUnit => fixed(1),
        UnitKind::Turret | UnitKind::ArmorUnit => fixed(3),
        UnitKind::Shield => fixed(4),
    }
}

/// Layout of undamaged structures.
#[must_use]
pub fn layout(cells: &[(UnitKind, i32, i32)]) -> StructureLayout {
    cells
        .iter()
        .map(|&(kind, x, y)| {
            (
                Position::new(x, y),
                Structure::new(kind, kind.default_base_stability()),
            )
        })
        .collect()
}

/// Opponent move record for an action frame.
#[must_use]
pub fn opponent_move(id: &str, kind: UnitKind, from: (i32, i32), to: (i32, i32)) -> MoveRecord {
    MoveRecord {
        from: Position::new(from.0, from.1),
        to: Position::new(to.0, to.1),
        unit_index: kind.index(),
        unit_id: id.to_string(),
        owner: PlayerSide::Opponent,
    }
}

/// Action frame carrying only moves.
#[must_use]
pub fn frame(frame: u32, moves: Vec<MoveRecord>) -> ActionFrame {
    ActionFrame {
        frame,
        moves,
        breaches: Vec::new(),
    }
}

/// Action frame carrying only opponent breaches.
#[must_use]
pub fn breach_frame(frame: u32, cells: &[(i32, i32)]) -> ActionFrame {
    ActionFrame {
        frame,
        moves: Vec::new(),
        breaches: cells
            .iter()
            .map(|&(x, y)| BreachRecord {
                pos: Position::new(x, y),
                owner: PlayerSide::Opponent,
            })
            .collect(),
    }
}

/// Opponent trace that walks a straight list of cells, one move per frame.
#[must_use]
pub fn walk(id: &str, kind: UnitKind, cells: &[(i32, i32)]) -> Vec<ActionFrame> {
    cells
        .windows(2)
        .enumerate()
        .map(|(i, pair)| frame(i as u32, vec![opponent_move(id, kind, pair[0], pair[1])]))
        .collect()
}

const fn side_index(side: PlayerSide) -> usize {
    match side {
        PlayerSide::Friendly => 0,
        PlayerSide::Opponent => 1,
    }
}

/// In-memory engine stand-in.
#[derive(Debug, Clone)]
pub struct ScriptedBoard {
    turn: u32,
    health: [u32; 2],
    resources: [ResourceState; 2],
    structures: BTreeMap<Position, (PlayerSide, Structure)>,
    pending_removals: BTreeSet<Position>,
    pinned_paths: BTreeMap<(Position, Edge), Vec<Position>>,
    submitted: Vec<CommandBatch>,
}

impl ScriptedBoard {
    /// Empty board at a round index with 30 health a side and no pools.
    #[must_use]
    pub fn new(turn: u32) -> Self {
        Self {
            turn,
            health: [30, 30],
            resources: [ResourceState::default(); 2],
            structures: BTreeMap::new(),
            pending_removals: BTreeSet::new(),
            pinned_paths: BTreeMap::new(),
            submitted: Vec::new(),
        }
    }

    /// Set a player's health.
    #[must_use]
    pub fn with_health(mut self, side: PlayerSide, health: u32) -> Self {
        self.health[side_index(side)] = health;
        self
    }

    /// Set a player's pools.
    #[must_use]
    pub fn with_resources(mut self, side: PlayerSide, tempo: i32, build: i32) -> Self {
        self.resources[side_index(side)] = ResourceState::new(fixed(tempo), fixed(build));
        self
    }

    /// Place an undamaged structure.
    #[must_use]
    pub fn with_structure(self, side: PlayerSide, kind: UnitKind, x: i32, y: i32) -> Self {
        self.with_damaged(side, kind, x, y, kind.default_base_stability())
    }

    /// Place a structure at a given stability.
    #[must_use]
    pub fn with_damaged(
        mut self,
        side: PlayerSide,
        kind: UnitKind,
        x: i32,
        y: i32,
        stability: Fixed,
    ) -> Self {
        self.structures
            .insert(Position::new(x, y), (side, Structure::new(kind, stability)));
        self
    }

    /// Place every structure of a layout on one side.
    #[must_use]
    pub fn with_layout(mut self, side: PlayerSide, layout: &StructureLayout) -> Self {
        for (pos, structure) in layout.iter() {
            self.structures.insert(pos, (side, *structure));
        }
        self
    }

    /// Force the path returned for a start cell and edge.
    #[must_use]
    pub fn with_path(mut self, start: (i32, i32), edge: Edge, path: &[(i32, i32)]) -> Self {
        let cells = path.iter().map(|&(x, y)| Position::new(x, y)).collect();
        self.pinned_paths
            .insert((Position::new(start.0, start.1), edge), cells);
        self
    }

    /// Move to another round: scheduled removals take effect.
    pub fn advance_to(&mut self, turn: u32) {
        let removals = std::mem::take(&mut self.pending_removals);
        tracing::debug!(
            from = self.turn,
            to = turn,
            removed = removals.len(),
            "Advancing scripted board"
        );
        for pos in removals {
            self.structures.remove(&pos);
        }
        self.turn = turn;
    }

    /// Set a player's pools in place.
    pub fn set_resources(&mut self, side: PlayerSide, tempo: i32, build: i32) {
        self.resources[side_index(side)] = ResourceState::new(fixed(tempo), fixed(build));
    }

    /// Set a player's health in place.
    pub fn set_health(&mut self, side: PlayerSide, health: u32) {
        self.health[side_index(side)] = health;
    }

    /// Every batch submitted so far.
    #[must_use]
    pub fn submitted(&self) -> &[CommandBatch] {
        &self.submitted
    }

    /// Owner of a structure.
    #[must_use]
    pub fn owner_at(&self, pos: Position) -> Option<PlayerSide> {
        self.structures.get(&pos).map(|(side, _)| *side)
    }

    /// Whether a removal is scheduled for a cell.
    #[must_use]
    pub fn removal_pending(&self, pos: Position) -> bool {
        self.pending_removals.contains(&pos)
    }

    /// Structures owned by one side.
    #[must_use]
    pub fn structures_of(&self, side: PlayerSide) -> StructureLayout {
        self.structures
            .iter()
            .filter(|(_, (owner, _))| *owner == side)
            .map(|(pos, (_, s))| (*pos, *s))
            .collect()
    }

    fn pool(&self, kind: UnitKind) -> Fixed {
        let pools = self.resources[side_index(PlayerSide::Friendly)];
        if kind.is_structure() {
            pools.build
        } else {
            pools.tempo
        }
    }

    fn debit(&mut self, kind: UnitKind, count: u32) {
        let cost = unit_cost(kind) * Fixed::from_num(count);
        let pools = &mut self.resources[side_index(PlayerSide::Friendly)];
        if kind.is_structure() {
            pools.build -= cost;
        } else {
            pools.tempo -= cost;
        }
    }

    fn placement_legal(&self, kind: UnitKind, pos: Position) -> bool {
        if !pos.in_bounds() || pos.y >= HALF_ARENA || self.structures.contains_key(&pos) {
            return false;
        }
        kind.is_structure() || Edge::BottomLeft.contains(pos) || Edge::BottomRight.contains(pos)
    }
}

impl GameBoard for ScriptedBoard {
    fn turn_number(&self) -> u32 {
        self.turn
    }

    fn health(&self, side: PlayerSide) -> u32 {
        self.health[side_index(side)]
    }

    fn resources(&self, side: PlayerSide) -> ResourceState {
        self.resources[side_index(side)]
    }

    fn structure_at(&self, pos: Position) -> Option<Structure> {
        self.structures.get(&pos).map(|(_, s)| *s)
    }

    fn attempt_spawn(&mut self, kind: UnitKind, pos: Position, count: u32) -> u32 {
        if !self.placement_legal(kind, pos) {
            return 0;
        }
        let count = if kind.is_structure() { count.min(1) } else { count };
        let accepted = count.min(self.number_affordable(kind));
        if accepted == 0 {
            return 0;
        }
        self.debit(kind, accepted);
        if kind.is_structure() {
            self.structures.insert(
                pos,
                (
                    PlayerSide::Friendly,
                    Structure::new(kind, kind.default_base_stability()),
                ),
            );
        }
        accepted
    }

    fn attempt_remove(&mut self, pos: Position) -> bool {
        match self.structures.get(&pos) {
            Some((PlayerSide::Friendly, _)) => self.pending_removals.insert(pos),
            _ => false,
        }
    }

    fn number_affordable(&self, kind: UnitKind) -> u32 {
        let whole = (self.pool(kind) / unit_cost(kind)).floor();
        whole.to_num::<i64>().max(0) as u32
    }

    fn can_spawn(&self, kind: UnitKind, pos: Position) -> bool {
        self.placement_legal(kind, pos) && self.number_affordable(kind) > 0
    }

    fn find_path_to_edge(&self, start: Position, edge: Edge) -> Vec<Position> {
        if let Some(path) = self.pinned_paths.get(&(start, edge)) {
            return path.clone();
        }
        find_path_to_edge(&NavGrid::from_board(self), start, edge)
    }

    fn submit_turn(&mut self, batch: &CommandBatch) {
        self.submitted.push(batch.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_debits_and_blocks() {
        let mut board = ScriptedBoard::new(3).with_resources(PlayerSide::Friendly, 5, 7);
        assert_eq!(board.attempt_spawn(UnitKind::Turret, Position::new(13, 11), 1), 1);
        assert_eq!(board.resources(PlayerSide::Friendly).build, fixed(4));
        assert_eq!(board.attempt_spawn(UnitKind::Wall, Position::new(13, 11), 1), 0);
        assert_eq!(board.attempt_spawn(UnitKind::SwarmUnit, Position::new(13, 0), 9), 5);
        assert_eq!(board.number_affordable(UnitKind::SwarmUnit), 0);
    }

    #[test]
    fn test_mobile_units_need_a_friendly_edge() {
        let board = ScriptedBoard::new(1).with_resources(PlayerSide::Friendly, 10, 0);
        assert!(board.can_spawn(UnitKind::ArmorUnit, Position::new(3, 10)));
        assert!(!board.can_spawn(UnitKind::ArmorUnit, Position::new(13, 11)));
        assert!(!board.can_spawn(UnitKind::ArmorUnit, Position::new(13, 27)));
    }

    #[test]
    fn test_removal_is_deferred() {
        let mut board = ScriptedBoard::new(4).with_structure(
            PlayerSide::Friendly,
            UnitKind::Wall,
            9,
            12,
        );
        let pos = Position::new(9, 12);
        assert!(board.attempt_remove(pos));
        assert!(board.contains_stationary_unit(pos));
        board.advance_to(5);
        assert!(!board.contains_stationary_unit(pos));
    }

    #[test]
    fn test_cannot_remove_opponent_structures() {
        let mut board =
            ScriptedBoard::new(4).with_structure(PlayerSide::Opponent, UnitKind::Wall, 9, 16);
        assert!(!board.attempt_remove(Position::new(9, 16)));
    }

    #[test]
    fn test_walk_builds_consecutive_frames() {
        let frames = walk("7", UnitKind::SwarmUnit, &[(14, 27), (14, 26), (14, 25)]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].frame, 1);
        assert_eq!(frames[1].moves[0].to, Position::new(14, 25));
    }
}
