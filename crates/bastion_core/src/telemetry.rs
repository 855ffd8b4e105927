//! Per-round snapshots and per-frame incursion traces.
//!
//! The [`TelemetryCollector`] keeps exactly two rounds of board state
//! (current and previous) plus the opponent's mobile-unit traces for the
//! round being replayed. Deploy-phase snapshots arrive once per round;
//! action-phase frames arrive many times per round, frame 0 first.

use std::collections::BTreeMap;

use crate::arena::{half_locations, PlayerSide, Position, HALF_ARENA};
use crate::board::{GameBoard, ResourceState, Structure};
use crate::error::Result;
use crate::units::{UnitCatalog, UnitKind};

/// Stationary layout of one half, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureLayout {
    cells: BTreeMap<Position, Structure>,
}

impl StructureLayout {
    /// Empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture one half of a board.
    pub fn capture<B: GameBoard + ?Sized>(board: &B, side: PlayerSide) -> Self {
        let cells = half_locations(side)
            .into_iter()
            .filter_map(|pos| board.structure_at(pos).map(|s| (pos, s)))
            .collect();
        Self { cells }
    }

    /// Add or replace a structure.
    pub fn insert(&mut self, pos: Position, structure: Structure) {
        self.cells.insert(pos, structure);
    }

    /// Structure on a cell.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<&Structure> {
        self.cells.get(&pos)
    }

    /// Whether a cell is occupied.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains_key(&pos)
    }

    /// All structures in position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Structure)> {
        self.cells.iter().map(|(p, s)| (*p, s))
    }

    /// Structures of one kind, position to stability.
    pub fn of_kind(&self, kind: UnitKind) -> impl Iterator<Item = (Position, &Structure)> {
        self.iter().filter(move |(_, s)| s.kind == kind)
    }

    /// Number of structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the layout is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(Position, Structure)> for StructureLayout {
    fn from_iter<I: IntoIterator<Item = (Position, Structure)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Everything observed about one player at the start of a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideSnapshot {
    /// Remaining health.
    pub health: u32,
    /// Resource pools.
    pub resources: ResourceState,
    /// Stationary layout on this player's half.
    pub layout: StructureLayout,
}

impl SideSnapshot {
    fn capture<B: GameBoard + ?Sized>(board: &B, side: PlayerSide) -> Self {
        Self {
            health: board.health(side),
            resources: board.resources(side),
            layout: StructureLayout::capture(board, side),
        }
    }
}

/// Both players at the start of a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Round index.
    pub turn: u32,
    /// This engine's player.
    pub friendly: SideSnapshot,
    /// The opponent.
    pub opponent: SideSnapshot,
}

impl RoundSnapshot {
    /// Capture both halves of a board.
    pub fn capture<B: GameBoard + ?Sized>(board: &B) -> Self {
        Self {
            turn: board.turn_number(),
            friendly: SideSnapshot::capture(board, PlayerSide::Friendly),
            opponent: SideSnapshot::capture(board, PlayerSide::Opponent),
        }
    }

    /// Snapshot for one side.
    #[must_use]
    pub fn side(&self, side: PlayerSide) -> &SideSnapshot {
        match side {
            PlayerSide::Friendly => &self.friendly,
            PlayerSide::Opponent => &self.opponent,
        }
    }
}

/// A movement record from an action frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Cell the unit occupies.
    pub from: Position,
    /// Cell the unit steps into.
    pub to: Position,
    /// Raw unit-table index.
    pub unit_index: u8,
    /// Engine-assigned unit id.
    pub unit_id: String,
    /// Owner of the unit.
    pub owner: PlayerSide,
}

/// A breach record from an action frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreachRecord {
    /// Edge cell the unit left the arena from.
    pub pos: Position,
    /// Owner of the breaching unit.
    pub owner: PlayerSide,
}

/// One sub-frame of the action-phase replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFrame {
    /// Frame index within the round; 0 is always delivered first.
    pub frame: u32,
    /// Movement records.
    pub moves: Vec<MoveRecord>,
    /// Breach records.
    pub breaches: Vec<BreachRecord>,
}

/// One timestamped step of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceStep {
    /// Cell reached.
    pub pos: Position,
    /// Frame at which the step completes.
    pub frame: u32,
}

/// Recorded route of a single opposing mobile unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackTrace {
    /// Kind of the unit.
    pub kind: UnitKind,
    /// Steps on the opponent's half, starting with the launch cell.
    pub their_half: Vec<TraceStep>,
    /// Steps on our half.
    pub our_half: Vec<TraceStep>,
}

impl AttackTrace {
    fn launched(kind: UnitKind, origin: Position, frame: u32) -> Self {
        Self {
            kind,
            their_half: vec![TraceStep { pos: origin, frame }],
            our_half: Vec::new(),
        }
    }

    /// Cells visited on the opponent's half, in order.
    pub fn their_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.their_half.iter().map(|s| s.pos)
    }

    /// Cells visited on our half, in order.
    pub fn our_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.our_half.iter().map(|s| s.pos)
    }
}

/// Opponent mobile-unit activity.
///
/// Traces and breaches cover the current round only; launch history spans
/// the whole match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncursionLog {
    traces: BTreeMap<String, AttackTrace>,
    breaches: Vec<Position>,
    launch_history: Vec<Position>,
}

impl IncursionLog {
    /// Traces keyed by unit id.
    pub fn traces(&self) -> impl Iterator<Item = (&str, &AttackTrace)> {
        self.traces.iter().map(|(id, t)| (id.as_str(), t))
    }

    /// Trace for one unit id.
    #[must_use]
    pub fn trace(&self, unit_id: &str) -> Option<&AttackTrace> {
        self.traces.get(unit_id)
    }

    /// Distinct breach cells this round, in arrival order.
    #[must_use]
    pub fn breaches(&self) -> &[Position] {
        &self.breaches
    }

    /// Distinct opponent launch cells over the whole match.
    #[must_use]
    pub fn launch_history(&self) -> &[Position] {
        &self.launch_history
    }

    fn clear_round(&mut self) {
        self.traces.clear();
        self.breaches.clear();
    }
}

/// Depth-2 telemetry history plus the round's incursion log.
#[derive(Debug, Clone, Default)]
pub struct TelemetryCollector {
    current: Option<RoundSnapshot>,
    previous: Option<RoundSnapshot>,
    incursions: IncursionLog,
}

impl TelemetryCollector {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate current into previous, then capture the board.
    pub fn refresh<B: GameBoard + ?Sized>(&mut self, board: &B) {
        self.record(RoundSnapshot::capture(board));
    }

    /// Rotate current into previous, then store `snapshot` as current.
    pub fn record(&mut self, snapshot: RoundSnapshot) {
        tracing::debug!(
            turn = snapshot.turn,
            friendly_health = snapshot.friendly.health,
            opponent_health = snapshot.opponent.health,
            tempo = %snapshot.friendly.resources.tempo,
            build = %snapshot.friendly.resources.build,
            friendly_structures = snapshot.friendly.layout.len(),
            opponent_structures = snapshot.opponent.layout.len(),
            "Captured round snapshot"
        );
        self.previous = self.current.replace(snapshot);
    }

    /// Fold one action frame into the incursion log.
    ///
    /// Frame 0 starts a new round of traces. Unit indices that do not name
    /// a mobile kind are a fatal configuration error.
    pub fn observe_frame(&mut self, frame: &ActionFrame, catalog: &UnitCatalog) -> Result<()> {
        if frame.frame == 0 {
            self.incursions.clear_round();
        }

        for record in &frame.moves {
            if record.owner != PlayerSide::Opponent {
                continue;
            }
            let kind = catalog.mobile_kind_at(record.unit_index)?;

            let log = &mut self.incursions;
            if !log.traces.contains_key(&record.unit_id) {
                if !log.launch_history.contains(&record.from) {
                    log.launch_history.push(record.from);
                }
                log.traces.insert(
                    record.unit_id.clone(),
                    AttackTrace::launched(kind, record.from, frame.frame),
                );
            }
            let Some(trace) = log.traces.get_mut(&record.unit_id) else {
                continue;
            };

            let step = TraceStep {
                pos: record.to,
                frame: frame.frame + kind.frames_per_step(),
            };
            if record.to.y < HALF_ARENA {
                trace.our_half.push(step);
            } else {
                trace.their_half.push(step);
            }
        }

        for breach in &frame.breaches {
            if breach.owner == PlayerSide::Opponent && !self.incursions.breaches.contains(&breach.pos)
            {
                self.incursions.breaches.push(breach.pos);
            }
        }

        Ok(())
    }

    /// This round's snapshot.
    #[must_use]
    pub fn current(&self) -> Option<&RoundSnapshot> {
        self.current.as_ref()
    }

    /// Last round's snapshot.
    #[must_use]
    pub fn previous(&self) -> Option<&RoundSnapshot> {
        self.previous.as_ref()
    }

    /// Incursion log.
    #[must_use]
    pub fn incursions(&self) -> &IncursionLog {
        &self.incursions
    }

    /// Health a side lost since last round; zero without history.
    #[must_use]
    pub fn health_lost(&self, side: PlayerSide) -> u32 {
        match (&self.previous, &self.current) {
            (Some(prev), Some(cur)) => prev.side(side).health.saturating_sub(cur.side(side).health),
            _ => 0,
        }
    }

    /// Our resource pools this round.
    #[must_use]
    pub fn friendly_resources(&self) -> ResourceState {
        self.current
            .as_ref()
            .map(|s| s.friendly.resources)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::int;

    fn opponent_move(from: (i32, i32), to: (i32, i32), index: u8, id: &str) -> MoveRecord {
        MoveRecord {
            from: Position::new(from.0, from.1),
            to: Position::new(to.0, to.1),
            unit_index: index,
            unit_id: id.to_string(),
            owner: PlayerSide::Opponent,
        }
    }

    fn snapshot(turn: u32, health: u32) -> RoundSnapshot {
        RoundSnapshot {
            turn,
            friendly: SideSnapshot {
                health,
                ..SideSnapshot::default()
            },
            opponent: SideSnapshot::default(),
        }
    }

    #[test]
    fn test_history_depth_two() {
        let mut collector = TelemetryCollector::new();
        collector.record(snapshot(0, 30));
        assert!(collector.previous().is_none());
        assert_eq!(collector.health_lost(PlayerSide::Friendly), 0);

        collector.record(snapshot(1, 27));
        collector.record(snapshot(2, 21));
        assert_eq!(collector.previous().unwrap().turn, 1);
        assert_eq!(collector.current().unwrap().turn, 2);
        assert_eq!(collector.health_lost(PlayerSide::Friendly), 6);
    }

    #[test]
    fn test_trace_split_by_half() {
        let catalog = UnitCatalog::standard();
        let mut collector = TelemetryCollector::new();
        let frame = ActionFrame {
            frame: 0,
            moves: vec![opponent_move((13, 27), (13, 26), 3, "u1")],
            breaches: vec![],
        };
        collector.observe_frame(&frame, &catalog).unwrap();
        let frame = ActionFrame {
            frame: 2,
            moves: vec![opponent_move((13, 14), (13, 13), 3, "u1")],
            breaches: vec![],
        };
        collector.observe_frame(&frame, &catalog).unwrap();

        let trace = collector.incursions().trace("u1").unwrap();
        assert_eq!(trace.kind, UnitKind::SwarmUnit);
        assert_eq!(
            trace.their_cells().collect::<Vec<_>>(),
            vec![Position::new(13, 27), Position::new(13, 26)]
        );
        assert_eq!(trace.our_half.len(), 1);
        assert_eq!(trace.our_half[0].frame, 4);
        assert_eq!(collector.incursions().launch_history(), &[Position::new(13, 27)]);
    }

    #[test]
    fn test_frame_zero_clears_round_but_not_history() {
        let catalog = UnitCatalog::standard();
        let mut collector = TelemetryCollector::new();
        let frame = ActionFrame {
            frame: 0,
            moves: vec![opponent_move((14, 27), (14, 26), 4, "a")],
            breaches: vec![BreachRecord {
                pos: Position::new(0, 13),
                owner: PlayerSide::Opponent,
            }],
        };
        collector.observe_frame(&frame, &catalog).unwrap();
        assert_eq!(collector.incursions().breaches().len(), 1);

        let next_round = ActionFrame {
            frame: 0,
            moves: vec![],
            breaches: vec![],
        };
        collector.observe_frame(&next_round, &catalog).unwrap();
        assert!(collector.incursions().traces().next().is_none());
        assert!(collector.incursions().breaches().is_empty());
        assert_eq!(collector.incursions().launch_history().len(), 1);
    }

    #[test]
    fn test_friendly_moves_and_breaches_ignored() {
        let catalog = UnitCatalog::standard();
        let mut collector = TelemetryCollector::new();
        let mut ours = opponent_move((13, 0), (13, 1), 3, "mine");
        ours.owner = PlayerSide::Friendly;
        let frame = ActionFrame {
            frame: 0,
            moves: vec![ours],
            breaches: vec![BreachRecord {
                pos: Position::new(27, 14),
                owner: PlayerSide::Friendly,
            }],
        };
        collector.observe_frame(&frame, &catalog).unwrap();
        assert!(collector.incursions().traces().next().is_none());
        assert!(collector.incursions().breaches().is_empty());
    }

    #[test]
    fn test_duplicate_breaches_collapse() {
        let catalog = UnitCatalog::standard();
        let mut collector = TelemetryCollector::new();
        let breach = BreachRecord {
            pos: Position::new(3, 10),
            owner: PlayerSide::Opponent,
        };
        let frame = ActionFrame {
            frame: 0,
            moves: vec![],
            breaches: vec![breach.clone(), breach],
        };
        collector.observe_frame(&frame, &catalog).unwrap();
        assert_eq!(collector.incursions().breaches(), &[Position::new(3, 10)]);
    }

    #[test]
    fn test_structure_index_in_move_is_fatal() {
        let catalog = UnitCatalog::standard();
        let mut collector = TelemetryCollector::new();
        let frame = ActionFrame {
            frame: 0,
            moves: vec![opponent_move((13, 27), (13, 26), 2, "x")],
            breaches: vec![],
        };
        assert!(collector.observe_frame(&frame, &catalog).is_err());
    }

    #[test]
    fn test_layout_queries() {
        let layout: StructureLayout = [
            (Position::new(3, 12), Structure::new(UnitKind::Wall, int(60))),
            (Position::new(6, 11), Structure::new(UnitKind::Turret, int(75))),
        ]
        .into_iter()
        .collect();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.of_kind(UnitKind::Turret).count(), 1);
        assert!(layout.contains(Position::new(3, 12)));
        assert!(!layout.contains(Position::new(4, 12)));
    }
}
