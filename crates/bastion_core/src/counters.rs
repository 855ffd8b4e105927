//! Responses to the two recognised opponent archetypes.
//!
//! A funnel leaves one corner of the opponent's half open and pulls every
//! mobile unit through it, so we fortify the matching corner of our half
//! and keep a channel free for our own swarm. A maze stacks wall rows
//! behind the midline; we thin out the structures its walls make useless,
//! plug the paths the opponent actually uses and strike through the gaps.

use crate::arena::{Edge, Flank, Position, ARENA_SIZE, HALF_ARENA};
use crate::attack::turret_exposure;
use crate::board::{Deployment, GameBoard};
use crate::classifier::MazeVerdict;
use crate::config::{AttackTuning, CounterTuning, OpeningTuning};
use crate::math::{int, Fixed};
use crate::telemetry::{IncursionLog, StructureLayout};
use crate::units::UnitKind;

/// Round state the counters read.
#[derive(Debug, Clone, Copy)]
pub struct CounterContext<'a> {
    /// Round index.
    pub turn: u32,
    /// Our tempo pool.
    pub tempo: Fixed,
    /// Whether we lost any health since last round.
    pub health_dropped: bool,
    /// Opponent layout this round.
    pub opponent: &'a StructureLayout,
    /// Opponent incursions and launch history.
    pub incursions: &'a IncursionLog,
}

/// Cells used to answer a funnel on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelTables {
    /// Turret diagonal closing the corner.
    pub corner: Vec<Position>,
    /// Diagonal extension built after losing health.
    pub extension: Vec<Position>,
    /// Turrets behind the corner.
    pub aux_turrets: Vec<Position>,
    /// Shields boosting our swarm as it leaves.
    pub shields: Vec<Position>,
    /// Second row of shields.
    pub aux_shields: Vec<Position>,
    /// Cells kept free for our swarm.
    pub channel: Vec<Position>,
    /// Launch cell of our swarm.
    pub attack_point: Position,
}

impl FunnelTables {
    /// Tables for a funnel on `side`.
    #[must_use]
    pub fn for_side(side: Flank) -> Self {
        let left = Self::left();
        match side {
            Flank::Left => left,
            Flank::Right => left.mirrored(),
        }
    }

    fn left() -> Self {
        let cells = |v: &[(i32, i32)]| -> Vec<Position> {
            v.iter().map(|&(x, y)| Position::new(x, y)).collect()
        };
        Self {
            corner: (0..4).map(|i| Position::new(i, 13 - i)).collect(),
            extension: (0..4).map(|i| Position::new(4 + i, 9 - i)).collect(),
            aux_turrets: cells(&[(3, 13), (4, 13)]),
            shields: cells(&[(4, 12), (5, 11), (6, 10)]),
            aux_shields: cells(&[(5, 12), (6, 11)]),
            channel: (0..14)
                .map(|i| Position::new(1 + i, 13 - i))
                .chain((0..13).map(|i| Position::new(2 + i, 13 - i)))
                .collect(),
            attack_point: Position::new(14, 0),
        }
    }

    fn mirrored(&self) -> Self {
        let flip = |v: &[Position]| -> Vec<Position> {
            v.iter().map(|p| p.mirrored()).collect()
        };
        Self {
            corner: flip(&self.corner),
            extension: flip(&self.extension),
            aux_turrets: flip(&self.aux_turrets),
            shields: flip(&self.shields),
            aux_shields: flip(&self.aux_shields),
            channel: flip(&self.channel),
            attack_point: self.attack_point.mirrored(),
        }
    }
}

/// What the funnel response did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelReport {
    /// Whether the channel was already free of our structures.
    pub channel_clear: bool,
    /// Whether a swarm strike was launched.
    pub struck: bool,
}

/// Fortify the corner facing an opponent funnel.
pub fn respond_to_funnel<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    side: Flank,
    ctx: &CounterContext<'_>,
    tuning: &CounterTuning,
) -> FunnelReport {
    let tables = FunnelTables::for_side(side);
    let rich = ctx.tempo >= tuning.funnel_tempo;

    let mut channel_clear = true;
    for &cell in &tables.channel {
        if deploy.is_occupied(cell) {
            channel_clear = false;
            deploy.remove(cell);
        }
    }

    // Weak key turrets get replaced next round.
    for cell in [tables.corner[0], tables.aux_turrets[0]] {
        if let Some(s) = deploy.structure_at(cell) {
            if s.kind != UnitKind::Turret || s.stability <= tuning.weak_turret_stability {
                deploy.remove(cell);
            }
        }
    }

    for &cell in &tables.corner {
        deploy.ensure_structure(UnitKind::Turret, cell);
    }
    if rich {
        for &cell in &tables.shields {
            deploy.ensure_structure(UnitKind::Shield, cell);
        }
    }
    for &cell in &tables.aux_turrets {
        deploy.spawn_one(UnitKind::Turret, cell);
    }
    if ctx.health_dropped {
        for &cell in &tables.extension {
            if cell.y % 2 == 0 {
                deploy.ensure_structure(UnitKind::Turret, cell);
            } else {
                deploy.spawn_one(UnitKind::Wall, cell);
            }
        }
    }
    if rich {
        for &cell in &tables.aux_shields {
            deploy.spawn_one(UnitKind::Shield, cell);
        }
    }

    let struck = rich && channel_clear;
    if struck {
        let count = deploy.spawn_affordable(UnitKind::SwarmUnit, tables.attack_point);
        tracing::info!(?side, count, "Swarm strike through funnel channel");
    } else {
        tracing::debug!(?side, channel_clear, tempo = %ctx.tempo, "Funnel strike held back");
    }
    FunnelReport {
        channel_clear,
        struck,
    }
}

/// Offsets tried around a path cell, first level then second.
const LEVEL_ONE: [(i32, i32); 2] = [(-1, 0), (0, -1)];
const LEVEL_TWO: [(i32, i32); 3] = [(-1, -1), (-2, 0), (0, -2)];

/// Lowest breach height the diagonal walls start from.
const MIN_BREACH_ROW: i32 = 1;

/// Lowest row of the diagonal walls.
const DIAGONAL_FLOOR: i32 = 2;

/// Maze strike decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MazeStrike {
    /// Swarm units launched.
    Swarm,
    /// Armor and support launched.
    Armored,
    /// Tempo below the reserve.
    Saving,
    /// Our route is too short to be trusted.
    Stuck,
}

/// What the maze response did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeReport {
    /// Opponent corner attacked.
    pub target: Flank,
    /// Columns just outside the front wall segments.
    pub defense_columns: Vec<i32>,
    /// Opponent paths to our left and right edges that were reinforced.
    pub threat_paths: (usize, usize),
    /// Highest breach rows on the left and right.
    pub breach_rows: (i32, i32),
    /// Strike decision.
    pub strike: MazeStrike,
}

/// Counter an opponent maze.
pub fn respond_to_maze<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    verdict: &MazeVerdict,
    ctx: &CounterContext<'_>,
    counters: &CounterTuning,
    attack: &AttackTuning,
    opening: &OpeningTuning,
) -> MazeReport {
    let Some(front_row) = verdict.front_row() else {
        tracing::warn!("Maze response without wall segments");
        return MazeReport {
            target: Flank::Left,
            defense_columns: Vec::new(),
            threat_paths: (0, 0),
            breach_rows: (MIN_BREACH_ROW, MIN_BREACH_ROW),
            strike: MazeStrike::Saving,
        };
    };
    let depth = front_row - HALF_ARENA;
    let row_span = depth..ARENA_SIZE - depth;

    let mut defense_columns = Vec::new();
    let (mut left_bounds, mut right_bounds) = (0, 0);
    for wall in verdict.front_walls() {
        for column in [wall.left - 1, wall.right + 1] {
            if !row_span.contains(&column) {
                continue;
            }
            if column < HALF_ARENA {
                left_bounds += 1;
            } else {
                right_bounds += 1;
            }
            if !defense_columns.contains(&column) {
                defense_columns.push(column);
            }
        }
        clear_behind_wall(deploy, front_row, wall.left..=wall.right);
    }

    let target = choose_target(ctx.incursions, left_bounds, right_bounds);
    tracing::debug!(front_row, ?defense_columns, ?target, "Maze layout read");

    let threats = ThreatPaths::trace(deploy, ctx.incursions);
    let breach_rows = if threats.is_empty() {
        tracing::warn!("Opponent has no discoverable attack path, guarding wall gaps");
        for &x in &defense_columns {
            deploy.ensure_structure(UnitKind::Turret, Position::new(x, HALF_ARENA - 1));
        }
        (MIN_BREACH_ROW, MIN_BREACH_ROW)
    } else {
        threats.reinforce(deploy)
    };
    build_diagonals(deploy, breach_rows);

    let strike = maze_strike(deploy, target, ctx, counters, attack, opening);
    MazeReport {
        target,
        defense_columns,
        threat_paths: (threats.left.len(), threats.right.len()),
        breach_rows,
        strike,
    }
}

fn clear_behind_wall<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    front_row: i32,
    columns: std::ops::RangeInclusive<i32>,
) {
    for x in columns {
        for y in front_row - 2..front_row {
            let cell = Position::new(x, y);
            if y < HALF_ARENA
                && deploy
                    .structure_at(cell)
                    .is_some_and(|s| s.kind != UnitKind::Turret)
            {
                deploy.remove(cell);
            }
        }
        for y in front_row - 4..front_row - 2 {
            let cell = Position::new(x, y);
            if y < HALF_ARENA && cell.in_bounds() && deploy.is_occupied(cell) {
                deploy.remove(cell);
            }
        }
    }
}

fn choose_target(incursions: &IncursionLog, left_bounds: u32, right_bounds: u32) -> Flank {
    let (mut left_entries, mut right_entries) = (0u32, 0u32);
    for (_, trace) in incursions.traces() {
        for cell in trace.our_cells().filter(|c| c.y == HALF_ARENA - 1) {
            if cell.x < HALF_ARENA {
                left_entries += 1;
            } else {
                right_entries += 1;
            }
        }
    }

    if left_entries != right_entries {
        if left_entries > right_entries {
            Flank::Left
        } else {
            Flank::Right
        }
    } else if right_bounds > left_bounds {
        Flank::Right
    } else {
        Flank::Left
    }
}

/// Opponent routes onto our back edges, clipped to our half.
struct ThreatPaths {
    left: Vec<Vec<Position>>,
    right: Vec<Vec<Position>>,
}

impl ThreatPaths {
    fn trace<B: GameBoard + ?Sized>(deploy: &Deployment<'_, B>, incursions: &IncursionLog) -> Self {
        let mut paths = Self {
            left: Vec::new(),
            right: Vec::new(),
        };
        for &start in incursions.launch_history() {
            let (goal, bucket) = if Edge::TopLeft.contains(start) {
                (Edge::BottomRight, &mut paths.right)
            } else if Edge::TopRight.contains(start) {
                (Edge::BottomLeft, &mut paths.left)
            } else {
                continue;
            };
            let path = deploy.path_to_edge(start, goal);
            if path.last().is_some_and(|end| goal.contains(*end)) {
                bucket.push(path.into_iter().filter(|p| p.y < HALF_ARENA).collect());
            }
        }
        paths.left.retain(|p: &Vec<Position>| !p.is_empty());
        paths.right.retain(|p: &Vec<Position>| !p.is_empty());
        paths
    }

    fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Place turrets beside each path, round-robin, and return the highest
    /// breach rows on each side.
    fn reinforce<B: GameBoard + ?Sized>(&self, deploy: &mut Deployment<'_, B>) -> (i32, i32) {
        let longest = self
            .left
            .iter()
            .chain(&self.right)
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let mut breach = (MIN_BREACH_ROW, MIN_BREACH_ROW);
        let mut finished_left = Vec::new();
        let mut finished_right = Vec::new();
        for i in 0..longest {
            for path in &self.left {
                if let Some(y) = reinforce_step(deploy, path, i, 1, &mut finished_left) {
                    breach.0 = breach.0.max(y);
                }
            }
            for path in &self.right {
                if let Some(y) = reinforce_step(deploy, path, i, -1, &mut finished_right) {
                    breach.1 = breach.1.max(y);
                }
            }
        }
        breach
    }
}

/// Reinforce the `i`-th step of a path, wrapping around. Returns the
/// breach row when the step is the path's last.
fn reinforce_step<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    path: &[Position],
    i: usize,
    x_sign: i32,
    finished: &mut Vec<Position>,
) -> Option<i32> {
    let idx = i % path.len();
    let cell = path[idx];
    if finished.contains(&cell) {
        return None;
    }
    finished.push(cell);

    if idx == path.len() - 1 {
        return Some(cell.y);
    }

    let ahead = &path[idx + 1..];
    let candidate = |&(dx, dy): &(i32, i32)| {
        let c = cell.offset(dx * x_sign, dy);
        (c.in_bounds() && !ahead.contains(&c)).then_some(c)
    };

    if let Some(target) = LEVEL_ONE.iter().find_map(candidate) {
        if guard_cell(deploy, target) {
            return None;
        }
    }
    if let Some(target) = LEVEL_TWO.iter().find_map(candidate) {
        guard_cell(deploy, target);
    }
    None
}

/// Put a turret on a cell; returns whether a new one was placed.
fn guard_cell<B: GameBoard + ?Sized>(deploy: &mut Deployment<'_, B>, cell: Position) -> bool {
    match deploy.structure_at(cell) {
        Some(s) => {
            if s.kind != UnitKind::Turret {
                deploy.remove(cell);
            }
            false
        }
        None => {
            deploy.spawn_one(UnitKind::Turret, cell);
            true
        }
    }
}

/// Walls along both back diagonals from the breach rows down.
fn build_diagonals<B: GameBoard + ?Sized>(deploy: &mut Deployment<'_, B>, breach: (i32, i32)) {
    for (kind, cell) in diagonal_cells(breach) {
        deploy.spawn_one(kind, cell);
    }
}

/// Diagonal cells in placement order.
///
/// Each side counts down from its own breach row and the two sides
/// alternate step by step; even rows get walls, odd rows turrets.
fn diagonal_cells(breach: (i32, i32)) -> Vec<(UnitKind, Position)> {
    let kind_for = |y: i32| {
        if y % 2 == 0 {
            UnitKind::Wall
        } else {
            UnitKind::Turret
        }
    };
    let steps = (breach.0.max(breach.1) - DIAGONAL_FLOOR + 1).max(0);
    let mut cells = Vec::new();
    for step in 0..steps {
        let y = breach.0 - step;
        if y >= DIAGONAL_FLOOR {
            cells.push((kind_for(y), Position::new(HALF_ARENA - 1 - y, y)));
        }
        let y = breach.1 - step;
        if y >= DIAGONAL_FLOOR {
            cells.push((kind_for(y), Position::new(HALF_ARENA + y, y)));
        }
    }
    cells
}

fn maze_strike<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    target: Flank,
    ctx: &CounterContext<'_>,
    counters: &CounterTuning,
    attack: &AttackTuning,
    opening: &OpeningTuning,
) -> MazeStrike {
    let (start, edge) = match target {
        Flank::Left => (Position::new(HALF_ARENA, 0), Edge::TopLeft),
        Flank::Right => (Position::new(HALF_ARENA - 1, 0), Edge::TopRight),
    };

    let reserve = counters.maze_tempo + int(i64::from(ctx.turn)) / int(10);
    if ctx.tempo < reserve {
        tracing::debug!(tempo = %ctx.tempo, %reserve, "Maze strike saving tempo");
        return MazeStrike::Saving;
    }

    let path = deploy.path_to_edge(start, edge);
    if path.len() < counters.min_strike_path {
        tracing::warn!(steps = path.len(), "Strike route stuck, holding tempo");
        return MazeStrike::Stuck;
    }

    let armored = match path.last() {
        Some(end) if edge.contains(*end) => {
            let losses = turret_exposure(&path, ctx.opponent, attack.turret_range, opening.turret_hit);
            losses > i64::from(counters.strike_damage_limit)
        }
        _ => {
            tracing::info!("Route cannot reach the edge, sending armor");
            true
        }
    };

    if armored {
        deploy.spawn_affordable(UnitKind::ArmorUnit, start);
        deploy.spawn_affordable(UnitKind::SupportUnit, start);
        tracing::info!(?target, "Maze armor strike");
        MazeStrike::Armored
    } else {
        deploy.spawn_affordable(UnitKind::SwarmUnit, start);
        tracing::info!(?target, "Maze swarm strike");
        MazeStrike::Swarm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funnel_tables_are_mirrored() {
        let left = FunnelTables::for_side(Flank::Left);
        let right = FunnelTables::for_side(Flank::Right);
        assert_eq!(right.corner[0], Position::new(27, 13));
        assert_eq!(right.extension[0], Position::new(23, 9));
        assert_eq!(right.aux_turrets, vec![Position::new(24, 13), Position::new(23, 13)]);
        assert_eq!(right.attack_point, Position::new(13, 0));
        assert_eq!(left.channel.len(), 27);
        assert_eq!(right.channel[0], Position::new(26, 13));
    }

    #[test]
    fn test_funnel_tables_stay_on_our_half() {
        for side in [Flank::Left, Flank::Right] {
            let t = FunnelTables::for_side(side);
            let all = t
                .corner
                .iter()
                .chain(&t.extension)
                .chain(&t.aux_turrets)
                .chain(&t.shields)
                .chain(&t.aux_shields)
                .chain(&t.channel);
            for cell in all {
                assert!(cell.in_bounds() && cell.y < HALF_ARENA, "{cell}");
            }
        }
    }

    #[test]
    fn test_channel_avoids_fortifications() {
        let t = FunnelTables::for_side(Flank::Left);
        for cell in t.corner.iter().chain(&t.shields).chain(&t.aux_turrets) {
            assert!(!t.channel.contains(cell), "{cell} blocks the channel");
        }
    }

    #[test]
    fn test_diagonals_alternate_from_each_breach_row() {
        let cells = diagonal_cells((5, 3));
        assert_eq!(
            cells,
            vec![
                (UnitKind::Turret, Position::new(8, 5)),
                (UnitKind::Turret, Position::new(17, 3)),
                (UnitKind::Wall, Position::new(9, 4)),
                (UnitKind::Wall, Position::new(16, 2)),
                (UnitKind::Turret, Position::new(10, 3)),
                (UnitKind::Wall, Position::new(11, 2)),
            ]
        );
        assert!(diagonal_cells((1, 1)).is_empty());
    }

    #[test]
    fn test_target_prefers_entries_then_boundaries() {
        let log = IncursionLog::default();
        assert_eq!(choose_target(&log, 0, 0), Flank::Left);
        assert_eq!(choose_target(&log, 1, 2), Flank::Right);
        assert_eq!(choose_target(&log, 2, 1), Flank::Left);
    }
}
