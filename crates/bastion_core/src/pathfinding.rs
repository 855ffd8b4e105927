//! Grid pathfinding towards an arena edge using A*.
//!
//! The engine's own pathfinder is authoritative. This one reproduces its
//! contract closely enough for offline boards: four-directional moves,
//! structures block, and a unit that cannot reach its target edge walks
//! to the reachable cell closest to it instead.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::arena::{Edge, Position, ARENA_SIZE, HALF_ARENA};
use crate::board::GameBoard;

/// Occupancy grid for pathfinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavGrid {
    blocked: Vec<bool>,
}

impl NavGrid {
    /// Grid with no structures.
    #[must_use]
    pub fn open() -> Self {
        Self {
            blocked: vec![false; (ARENA_SIZE * ARENA_SIZE) as usize],
        }
    }

    /// Grid blocked wherever the board holds a structure.
    pub fn from_board<B: GameBoard + ?Sized>(board: &B) -> Self {
        let mut grid = Self::open();
        for y in 0..ARENA_SIZE {
            for x in 0..ARENA_SIZE {
                let pos = Position::new(x, y);
                if pos.in_bounds() && board.contains_stationary_unit(pos) {
                    grid.block(pos);
                }
            }
        }
        grid
    }

    fn index(pos: Position) -> Option<usize> {
        pos.in_bounds()
            .then(|| (pos.y * ARENA_SIZE + pos.x) as usize)
    }

    /// Mark a cell as blocked. Out-of-bounds cells are ignored.
    pub fn block(&mut self, pos: Position) {
        if let Some(i) = Self::index(pos) {
            self.blocked[i] = true;
        }
    }

    /// Whether a unit may stand on a cell.
    #[must_use]
    pub fn is_walkable(&self, pos: Position) -> bool {
        Self::index(pos).is_some_and(|i| !self.blocked[i])
    }
}

impl Default for NavGrid {
    fn default() -> Self {
        Self::open()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct SearchNode {
    pos: Position,
    f_score: u32,
    tie_breaker: u64,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Steps between a cell and the line the edge lies on.
#[inline]
fn edge_distance(pos: Position, edge: Edge) -> u32 {
    let Position { x, y } = pos;
    let d = match edge {
        Edge::TopRight => ARENA_SIZE + HALF_ARENA - 1 - x - y,
        Edge::TopLeft => y - x - HALF_ARENA,
        Edge::BottomLeft => x + y - (HALF_ARENA - 1),
        Edge::BottomRight => x - y - HALF_ARENA,
    };
    d.unsigned_abs()
}

#[inline]
fn tie_breaker(pos: Position) -> u64 {
    ((pos.y as u64) << 32) | (pos.x as u32 as u64)
}

/// Shortest walk from `start` onto `edge`, start cell included.
///
/// Returns an empty path when `start` is blocked or out of bounds. When no
/// edge cell is reachable the path ends on the explored cell nearest the
/// edge.
#[must_use]
pub fn find_path_to_edge(grid: &NavGrid, start: Position, edge: Edge) -> Vec<Position> {
    if !grid.is_walkable(start) {
        return Vec::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(SearchNode {
        pos: start,
        f_score: edge_distance(start, edge),
        tie_breaker: tie_breaker(start),
    });

    let mut closest = (edge_distance(start, edge), tie_breaker(start), start);

    while let Some(current) = open_set.pop() {
        if edge.contains(current.pos) {
            return reconstruct_path(&came_from, current.pos);
        }

        let current_g = g_score.get(&current.pos).copied().unwrap_or(u32::MAX);
        let h = edge_distance(current.pos, edge);
        if (h, tie_breaker(current.pos)) < (closest.0, closest.1) {
            closest = (h, tie_breaker(current.pos), current.pos);
        }

        for (dx, dy) in DIRECTIONS {
            let next = current.pos.offset(dx, dy);
            if !grid.is_walkable(next) {
                continue;
            }
            let tentative_g = current_g + 1;
            if tentative_g < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current.pos);
                g_score.insert(next, tentative_g);
                open_set.push(SearchNode {
                    pos: next,
                    f_score: tentative_g + edge_distance(next, edge),
                    tie_breaker: tie_breaker(next),
                });
            }
        }
    }

    tracing::trace!(%start, ?edge, end = %closest.2, "Edge unreachable, walking to nearest cell");
    reconstruct_path(&came_from, closest.2)
}

fn reconstruct_path(came_from: &HashMap<Position, Position>, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
