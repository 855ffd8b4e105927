//! Determinism testing utilities.
//!
//! The decision engine must answer identical inputs with identical command
//! batches. Sources of non-determinism it has to avoid:
//!
//! - **Floating-point math**: stabilities, pools and damage use
//!   [`bastion_core::math::Fixed`] throughout.
//! - **HashMap iteration order**: layouts and traces live in `BTreeMap`s and
//!   every ranking uses a stable sort.
//! - **Hidden state**: all multi-round memory lives in the match session and
//!   is reset at game start.
//!
//! A [`RoundScript`] describes a match as a sequence of boards, one per
//! round, plus the action frames observed after each round. The harness
//! replays the script on fresh engines and compares the submitted batches.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use bastion_core::board::{Command, CommandBatch};
use bastion_core::config::EngineConfig;
use bastion_core::engine::DecisionEngine;
use bastion_core::error::Result;
use bastion_core::telemetry::ActionFrame;
use bastion_core::units::UnitCatalog;

use crate::fixtures::ScriptedBoard;

/// One scripted round.
#[derive(Debug, Clone)]
pub struct RoundScript {
    /// Board presented at the start of the deploy phase.
    pub board: ScriptedBoard,
    /// Action frames observed after the batch was submitted.
    pub frames: Vec<ActionFrame>,
}

impl RoundScript {
    /// Round with no action frames.
    #[must_use]
    pub fn quiet(board: ScriptedBoard) -> Self {
        Self {
            board,
            frames: Vec::new(),
        }
    }
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical batches.
    pub is_deterministic: bool,
    /// Digest of each run's batches.
    pub hashes: Vec<u64>,
    /// Rounds played per run.
    pub rounds: usize,
}

impl DeterminismResult {
    /// Assert that every run matched, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if any run produced different batches.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let mut unique = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Decision engine is non-deterministic!\n\
                 Runs: {}\n\
                 Rounds: {}\n\
                 Unique digests: {} (expected 1)\n\
                 All digests: {:?}",
                self.hashes.len(),
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Play a script on a fresh engine and return every submitted batch.
pub fn play_script(config: &EngineConfig, rounds: &[RoundScript]) -> Result<Vec<CommandBatch>> {
    let mut engine = DecisionEngine::new(config.clone());
    engine.on_game_start(UnitCatalog::standard());

    let mut batches = Vec::with_capacity(rounds.len());
    for round in rounds {
        let mut board = round.board.clone();
        let report = engine.on_turn(&mut board)?;
        batches.push(report.batch);
        for frame in &round.frames {
            engine.on_action_frame(frame)?;
        }
    }
    Ok(batches)
}

/// Digest of a batch sequence.
#[must_use]
pub fn batches_hash(batches: &[CommandBatch]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for batch in batches {
        batch.turn.hash(&mut hasher);
        for command in &batch.commands {
            match command {
                Command::Spawn { kind, pos, count } => {
                    (0u8, kind, pos, count).hash(&mut hasher);
                }
                Command::Remove { pos } => {
                    (1u8, pos).hash(&mut hasher);
                }
            }
        }
    }
    hasher.finish()
}

/// Play a script `runs` times in sequence and compare digests.
///
/// A run that errors counts as a digest of zero.
pub fn verify_determinism(
    config: &EngineConfig,
    rounds: &[RoundScript],
    runs: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| play_script(config, rounds).map_or(0, |b| batches_hash(&b)))
        .collect();
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        rounds: rounds.len(),
    }
}

/// Play a script on `runs` scoped threads at once and compare digests.
pub fn verify_parallel_determinism(
    config: &EngineConfig,
    rounds: &[RoundScript],
    runs: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| s.spawn(|| play_script(config, rounds).map_or(0, |b| batches_hash(&b))))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(0))
            .collect()
    });
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        rounds: rounds.len(),
    }
}

/// Proptest strategies for decision-engine inputs.
pub mod strategies {
    use bastion_core::arena::{PlayerSide, Position, HALF_ARENA};
    use bastion_core::units::UnitKind;
    use proptest::prelude::*;

    use crate::fixtures::ScriptedBoard;

    /// Any in-bounds cell on one half of the arena.
    pub fn arb_cell(side: PlayerSide) -> impl Strategy<Value = Position> {
        let rows = match side {
            PlayerSide::Friendly => 0..HALF_ARENA,
            PlayerSide::Opponent => HALF_ARENA..2 * HALF_ARENA,
        };
        (rows, 0..2 * HALF_ARENA)
            .prop_map(|(y, x)| Position::new(x, y))
            .prop_filter("cell must be inside the diamond", |p| p.in_bounds())
    }

    /// Any structure kind.
    pub fn arb_structure_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(UnitKind::STRUCTURES.to_vec())
    }

    /// Up to `max` structures on one half, deduplicated by cell.
    pub fn arb_structures(
        side: PlayerSide,
        max: usize,
    ) -> impl Strategy<Value = Vec<(UnitKind, Position)>> {
        prop::collection::btree_map(arb_cell(side), arb_structure_kind(), 0..max)
            .prop_map(|cells| cells.into_iter().map(|(pos, kind)| (kind, pos)).collect())
    }

    /// A round board with random layouts, pools and health.
    pub fn arb_board(turn: u32) -> impl Strategy<Value = ScriptedBoard> {
        (
            arb_structures(PlayerSide::Friendly, 40),
            arb_structures(PlayerSide::Opponent, 40),
            0i32..40,
            0i32..40,
            1u32..=30,
        )
            .prop_map(move |(ours, theirs, tempo, build, health)| {
                let mut board = ScriptedBoard::new(turn)
                    .with_resources(PlayerSide::Friendly, tempo, build)
                    .with_resources(PlayerSide::Opponent, tempo, build)
                    .with_health(PlayerSide::Friendly, health);
                for (kind, pos) in ours {
                    board = board.with_structure(PlayerSide::Friendly, kind, pos.x, pos.y);
                }
                for (kind, pos) in theirs {
                    board = board.with_structure(PlayerSide::Opponent, kind, pos.x, pos.y);
                }
                board
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::arena::PlayerSide;
    use bastion_core::units::UnitKind;

    fn three_rounds() -> Vec<RoundScript> {
        let opening = ScriptedBoard::new(0).with_resources(PlayerSide::Friendly, 5, 40);
        let probe = ScriptedBoard::new(1)
            .with_resources(PlayerSide::Friendly, 8, 10)
            .with_structure(PlayerSide::Opponent, UnitKind::Turret, 13, 17);
        let steady = ScriptedBoard::new(2)
            .with_resources(PlayerSide::Friendly, 12, 20)
            .with_health(PlayerSide::Friendly, 24);
        vec![
            RoundScript::quiet(opening),
            RoundScript::quiet(probe),
            RoundScript::quiet(steady),
        ]
    }

    #[test]
    fn test_sequential_runs_match() {
        let result = verify_determinism(&EngineConfig::default(), &three_rounds(), 3);
        result.assert_deterministic();
        assert_eq!(result.rounds, 3);
    }

    #[test]
    fn test_parallel_runs_match() {
        let result = verify_parallel_determinism(&EngineConfig::default(), &three_rounds(), 4);
        result.assert_deterministic();
    }

    #[test]
    fn test_digest_depends_on_order() {
        let a = CommandBatch {
            turn: 2,
            commands: vec![
                Command::Remove {
                    pos: bastion_core::arena::Position::new(9, 12),
                },
                Command::Spawn {
                    kind: UnitKind::Wall,
                    pos: bastion_core::arena::Position::new(9, 12),
                    count: 1,
                },
            ],
        };
        let mut b = a.clone();
        b.commands.reverse();
        assert_ne!(batches_hash(&[a]), batches_hash(&[b]));
    }
}
