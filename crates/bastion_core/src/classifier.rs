//! Opponent defensive archetype detection.
//!
//! Two independent detectors run over the opponent's layout and this
//! round's incursion traces:
//!
//! - **Funnel**: a long diagonal corridor of structures along one side of
//!   the opponent's front, leaving a single open mouth on the other.
//! - **Maze**: one or more long horizontal wall rows just behind the
//!   midline.
//!
//! Both may fire in the same round.

use crate::arena::{Flank, Position, ARENA_SIZE, HALF_ARENA};
use crate::config::ClassifierTuning;
use crate::telemetry::{IncursionLog, StructureLayout};

/// Cells in each corridor diagonal.
const CORRIDOR_CELLS: i32 = 13;

/// Rows scanned for maze walls, counted from the midline.
const MAZE_ROWS: i32 = 4;

/// Deepest row a trace may hold a constant y on and still count as a wall.
const TRACE_WALL_MAX_Y: i32 = 18;

const LEFT_MOUTH: [Position; 7] = [
    Position::new(0, 14),
    Position::new(1, 14),
    Position::new(2, 14),
    Position::new(1, 15),
    Position::new(2, 15),
    Position::new(2, 16),
    Position::new(3, 16),
];

const RIGHT_MOUTH: [Position; 7] = [
    Position::new(25, 14),
    Position::new(26, 14),
    Position::new(27, 14),
    Position::new(25, 15),
    Position::new(26, 15),
    Position::new(24, 16),
    Position::new(25, 16),
];

/// Diagonal corridor cells on one side of the opponent's half.
#[must_use]
pub fn corridor(side: Flank) -> Vec<Position> {
    (0..CORRIDOR_CELLS)
        .map(|i| match side {
            Flank::Left => Position::new(HALF_ARENA - i, ARENA_SIZE - 2 - i),
            Flank::Right => Position::new(HALF_ARENA - 1 + i, ARENA_SIZE - 2 - i),
        })
        .collect()
}

/// Mouth cells an incursion would cross if that corridor were open.
#[must_use]
pub const fn corridor_mouth(side: Flank) -> &'static [Position] {
    match side {
        Flank::Left => &LEFT_MOUTH,
        Flank::Right => &RIGHT_MOUTH,
    }
}

/// Funnel detector result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelVerdict {
    /// Corridor side the opponent built, if any.
    pub side: Option<Flank>,
    /// Occupied left corridor cells.
    pub left_count: usize,
    /// Occupied right corridor cells.
    pub right_count: usize,
}

impl FunnelVerdict {
    /// Whether a funnel was found.
    #[must_use]
    pub const fn detected(&self) -> bool {
        self.side.is_some()
    }
}

/// A horizontal run of opponent structures, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallSegment {
    /// Absolute row.
    pub row: i32,
    /// Leftmost column.
    pub left: i32,
    /// Rightmost column.
    pub right: i32,
}

impl WallSegment {
    /// Number of cells covered.
    #[must_use]
    pub const fn len(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Whether the segment is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.right < self.left
    }
}

/// How a maze verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MazeEvidence {
    /// Walls seen directly in the layout.
    Layout,
    /// Walls inferred from units walking along them.
    Traces,
}

/// Maze detector result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeVerdict {
    /// Wall segments found, in scan order.
    pub walls: Vec<WallSegment>,
    /// Source of the segments, if any were found.
    pub evidence: Option<MazeEvidence>,
}

impl MazeVerdict {
    /// Whether a maze was found.
    #[must_use]
    pub fn detected(&self) -> bool {
        !self.walls.is_empty()
    }

    /// Row of the wall nearest the midline.
    #[must_use]
    pub fn front_row(&self) -> Option<i32> {
        self.walls.iter().map(|w| w.row).min()
    }

    /// Segments on the front row.
    pub fn front_walls(&self) -> impl Iterator<Item = &WallSegment> {
        let row = self.front_row();
        self.walls.iter().filter(move |w| Some(w.row) == row)
    }
}

/// Both detector outputs for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdicts {
    /// Funnel result.
    pub funnel: FunnelVerdict,
    /// Maze result.
    pub maze: MazeVerdict,
}

/// Run both detectors.
#[must_use]
pub fn classify(
    layout: &StructureLayout,
    incursions: &IncursionLog,
    tuning: &ClassifierTuning,
) -> Verdicts {
    Verdicts {
        funnel: detect_funnel(layout, incursions, tuning),
        maze: detect_maze(layout, incursions, tuning),
    }
}

/// Look for a diagonal corridor with an unused mouth.
#[must_use]
pub fn detect_funnel(
    layout: &StructureLayout,
    incursions: &IncursionLog,
    tuning: &ClassifierTuning,
) -> FunnelVerdict {
    let occupied = |side| {
        corridor(side)
            .into_iter()
            .filter(|p| layout.contains(*p))
            .count()
    };
    let left_count = occupied(Flank::Left);
    let right_count = occupied(Flank::Right);

    // A unit that walked through a mouth proves that side is open.
    let falsified = |side| {
        let mouth = corridor_mouth(side);
        incursions
            .traces()
            .any(|(_, t)| t.their_cells().any(|p| mouth.contains(&p)))
    };

    let max = left_count.max(right_count);
    let side = if max < tuning.corridor_length {
        None
    } else if left_count == max && !falsified(Flank::Left) {
        Some(Flank::Left)
    } else if right_count == max && !falsified(Flank::Right) {
        Some(Flank::Right)
    } else {
        None
    };

    if let Some(side) = side {
        tracing::info!(?side, left_count, right_count, "Funnel detected");
    }
    FunnelVerdict {
        side,
        left_count,
        right_count,
    }
}

/// Look for long wall rows behind the midline.
#[must_use]
pub fn detect_maze(
    layout: &StructureLayout,
    incursions: &IncursionLog,
    tuning: &ClassifierTuning,
) -> MazeVerdict {
    let min_len = tuning.wall_length as i32;

    let mut walls = Vec::new();
    for k in 0..MAZE_ROWS {
        let row = HALF_ARENA + k;
        let mut run_start: Option<i32> = None;
        for x in k..=ARENA_SIZE - k {
            let occupied = x < ARENA_SIZE - k && layout.contains(Position::new(x, row));
            match (occupied, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(left)) => {
                    let segment = WallSegment {
                        row,
                        left,
                        right: x - 1,
                    };
                    if segment.len() >= min_len {
                        walls.push(segment);
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    if !walls.is_empty() {
        tracing::info!(segments = walls.len(), "Maze detected from layout");
        return MazeVerdict {
            walls,
            evidence: Some(MazeEvidence::Layout),
        };
    }

    // A horizontal run on row y means a wall one row further forward.
    // The last recorded step is not part of any run.
    for (_, trace) in incursions.traces() {
        let mut cells: Vec<Position> = trace.their_cells().collect();
        cells.pop();
        let mut start = 0;
        while start < cells.len() {
            let row = cells[start].y;
            let end = cells[start..]
                .iter()
                .position(|p| p.y != row)
                .map_or(cells.len(), |n| start + n);
            let run = &cells[start..end];
            start = end;

            if row <= HALF_ARENA || row > TRACE_WALL_MAX_Y || (run.len() as i32) < min_len {
                continue;
            }
            let left = run.iter().map(|p| p.x).min().unwrap_or_default();
            let right = run.iter().map(|p| p.x).max().unwrap_or_default();
            let segment = WallSegment {
                row: row - 1,
                left,
                right,
            };
            if !walls.contains(&segment) {
                walls.push(segment);
            }
        }
    }

    let evidence = if walls.is_empty() {
        None
    } else {
        tracing::info!(segments = walls.len(), "Maze inferred from incursion traces");
        Some(MazeEvidence::Traces)
    };
    MazeVerdict { walls, evidence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Structure;
    use crate::math::int;
    use crate::telemetry::{ActionFrame, MoveRecord, TelemetryCollector};
    use crate::arena::PlayerSide;
    use crate::units::{UnitCatalog, UnitKind};

    fn walls_at(cells: impl IntoIterator<Item = Position>) -> StructureLayout {
        cells
            .into_iter()
            .map(|p| (p, Structure::new(UnitKind::Wall, int(60))))
            .collect()
    }

    fn walk(path: &[(i32, i32)]) -> IncursionLog {
        let mut collector = TelemetryCollector::new();
        let moves = path
            .windows(2)
            .map(|w| MoveRecord {
                from: Position::new(w[0].0, w[0].1),
                to: Position::new(w[1].0, w[1].1),
                unit_index: UnitKind::SwarmUnit.index(),
                unit_id: "7".to_string(),
                owner: PlayerSide::Opponent,
            })
            .collect();
        let frame = ActionFrame {
            frame: 0,
            moves,
            breaches: vec![],
        };
        collector.observe_frame(&frame, &UnitCatalog::standard()).unwrap();
        collector.incursions().clone()
    }

    #[test]
    fn test_corridor_geometry() {
        let left = corridor(Flank::Left);
        assert_eq!(left.first(), Some(&Position::new(14, 26)));
        assert_eq!(left.last(), Some(&Position::new(2, 14)));
        let right = corridor(Flank::Right);
        assert_eq!(right.first(), Some(&Position::new(13, 26)));
        assert_eq!(right.last(), Some(&Position::new(25, 14)));
        assert!(left.iter().chain(&right).all(|p| p.in_bounds()));
    }

    #[test]
    fn test_right_funnel_detected() {
        let layout = walls_at(corridor(Flank::Right).into_iter().take(10));
        let verdict = detect_funnel(&layout, &IncursionLog::default(), &ClassifierTuning::default());
        assert_eq!(verdict.side, Some(Flank::Right));
        assert_eq!(verdict.right_count, 10);
    }

    #[test]
    fn test_short_corridor_is_not_a_funnel() {
        let layout = walls_at(corridor(Flank::Left).into_iter().take(9));
        let verdict = detect_funnel(&layout, &IncursionLog::default(), &ClassifierTuning::default());
        assert!(!verdict.detected());
    }

    #[test]
    fn test_mouth_trace_falsifies_side() {
        let layout = walls_at(corridor(Flank::Right));
        let log = walk(&[(26, 15), (26, 14), (26, 13)]);
        let verdict = detect_funnel(&layout, &log, &ClassifierTuning::default());
        assert_eq!(verdict.side, None);
    }

    #[test]
    fn test_tie_prefers_left() {
        let layout = walls_at(corridor(Flank::Left).into_iter().chain(corridor(Flank::Right)));
        let verdict = detect_funnel(&layout, &IncursionLog::default(), &ClassifierTuning::default());
        assert_eq!(verdict.side, Some(Flank::Left));

        let log = walk(&[(1, 15), (1, 14), (1, 13)]);
        let verdict = detect_funnel(&layout, &log, &ClassifierTuning::default());
        assert_eq!(verdict.side, Some(Flank::Right));
    }

    #[test]
    fn test_maze_rows_from_layout() {
        let layout = walls_at(
            (3..18)
                .map(|x| Position::new(x, 16))
                .chain((20..25).map(|x| Position::new(x, 16)))
                .chain((0..28).map(|x| Position::new(x, 14))),
        );
        let verdict = detect_maze(&layout, &IncursionLog::default(), &ClassifierTuning::default());
        assert_eq!(verdict.evidence, Some(MazeEvidence::Layout));
        assert_eq!(
            verdict.walls,
            vec![
                WallSegment { row: 14, left: 0, right: 27 },
                WallSegment { row: 16, left: 3, right: 17 },
            ]
        );
        assert_eq!(verdict.front_row(), Some(14));
    }

    #[test]
    fn test_maze_from_traces() {
        let path: Vec<(i32, i32)> = (3..17).map(|x| (x, 17)).collect();
        let log = walk(&path);
        let verdict = detect_maze(&StructureLayout::new(), &log, &ClassifierTuning::default());
        assert_eq!(verdict.evidence, Some(MazeEvidence::Traces));
        assert_eq!(verdict.walls, vec![WallSegment { row: 16, left: 3, right: 15 }]);
        assert_eq!(verdict.front_row(), Some(16));
    }

    #[test]
    fn test_first_row_trace_maps_to_front_wall_row() {
        let path: Vec<(i32, i32)> = (3..17).map(|x| (x, 15)).collect();
        let verdict = detect_maze(&StructureLayout::new(), &walk(&path), &ClassifierTuning::default());
        assert_eq!(verdict.walls, vec![WallSegment { row: 14, left: 3, right: 15 }]);
        assert_eq!(verdict.front_row(), Some(HALF_ARENA));
    }

    #[test]
    fn test_final_step_does_not_extend_a_run() {
        // Twelve cells along the row, the twelfth being the last step.
        let path: Vec<(i32, i32)> = (3..15).map(|x| (x, 16)).collect();
        let verdict = detect_maze(&StructureLayout::new(), &walk(&path), &ClassifierTuning::default());
        assert!(!verdict.detected());
    }

    #[test]
    fn test_midline_trace_is_not_a_wall() {
        let path: Vec<(i32, i32)> = (2..16).map(|x| (x, 14)).collect();
        let verdict = detect_maze(&StructureLayout::new(), &walk(&path), &ClassifierTuning::default());
        assert!(!verdict.detected());
    }
}
