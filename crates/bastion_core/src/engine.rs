//! Round orchestration.
//!
//! [`DecisionEngine`] is the single entry point the adapter drives. It owns
//! the [`MatchSession`], which holds every piece of multi-round memory:
//! telemetry history, defense levels, the current phase and the last
//! classifier verdicts. A new session is created at game start.
//!
//! Round phases advance purely on the round index:
//!
//! | Round | Phase | Action |
//! |-------|-------|--------|
//! | 0 | Bootstrap | skeleton wave only |
//! | 1 | OpeningStrike | probe and launch one strike |
//! | 2.. | SteadyState | classify, then counter or adapt |

use crate::arena::PlayerSide;
use crate::attack::{opening_strike, plan_attack, AttackOutcome, OpeningOutcome};
use crate::blueprint::SKELETON_WAVE;
use crate::board::{CommandBatch, Deployment, GameBoard};
use crate::classifier::{classify, Verdicts};
use crate::config::EngineConfig;
use crate::counters::{
    respond_to_funnel, respond_to_maze, CounterContext, FunnelReport, MazeReport,
};
use crate::damage::{analyze, ZoneDamage};
use crate::defense::{place_wave, DefenseLeveler, LevelReport};
use crate::error::{EngineError, Result};
use crate::telemetry::{ActionFrame, TelemetryCollector};
use crate::units::UnitCatalog;

/// Phase of the match, derived from the round index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RoundPhase {
    /// Round 0.
    #[default]
    Bootstrap,
    /// Round 1.
    OpeningStrike,
    /// Every later round.
    SteadyState,
}

impl RoundPhase {
    /// Phase for a round index.
    #[must_use]
    pub const fn for_turn(turn: u32) -> Self {
        match turn {
            0 => Self::Bootstrap,
            1 => Self::OpeningStrike,
            _ => Self::SteadyState,
        }
    }
}

/// What the engine decided in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundDecision {
    /// Skeleton wave placed.
    Bootstrap,
    /// Opening strike probed.
    Opening(OpeningOutcome),
    /// One or both archetype counters ran.
    Countered {
        /// Funnel response, if a funnel was found.
        funnel: Option<FunnelReport>,
        /// Maze response, if a maze was found.
        maze: Option<MazeReport>,
    },
    /// No archetype recognised; damage-driven attack and defense.
    Adaptive {
        /// Per-zone damage that drove the round.
        damage: ZoneDamage,
        /// Attack planner result.
        attack: AttackOutcome,
        /// Defense leveler result.
        defense: LevelReport,
    },
}

/// Result of one deploy phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Commands submitted to the engine.
    pub batch: CommandBatch,
    /// Branch taken.
    pub decision: RoundDecision,
}

/// All multi-round memory of one match.
#[derive(Debug, Clone, Default)]
pub struct MatchSession {
    catalog: UnitCatalog,
    telemetry: TelemetryCollector,
    leveler: DefenseLeveler,
    phase: RoundPhase,
    last_turn: Option<u32>,
    last_verdicts: Option<Verdicts>,
}

impl MatchSession {
    /// Fresh session for a match played with `catalog`.
    #[must_use]
    pub fn new(catalog: UnitCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Unit catalog resolved at game start.
    #[must_use]
    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Telemetry history.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Defense levels.
    #[must_use]
    pub fn leveler(&self) -> &DefenseLeveler {
        &self.leveler
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Classifier output from the latest steady-state round.
    #[must_use]
    pub fn last_verdicts(&self) -> Option<&Verdicts> {
        self.last_verdicts.as_ref()
    }
}

/// Per-round decision maker.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
    session: MatchSession,
}

impl DecisionEngine {
    /// Engine with the given thresholds and a default session.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            session: MatchSession::default(),
        }
    }

    /// Thresholds in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    /// Reset all match memory.
    pub fn on_game_start(&mut self, catalog: UnitCatalog) {
        tracing::info!("Starting new match session");
        self.session = MatchSession::new(catalog);
    }

    /// Fold one action-phase frame into telemetry.
    pub fn on_action_frame(&mut self, frame: &ActionFrame) -> Result<()> {
        let session = &mut self.session;
        session.telemetry.observe_frame(frame, &session.catalog)
    }

    /// Decide and submit one round.
    ///
    /// Round indices must not go backwards within a session.
    pub fn on_turn<B: GameBoard + ?Sized>(&mut self, board: &mut B) -> Result<TurnReport> {
        let turn = board.turn_number();
        if let Some(last) = self.session.last_turn {
            if turn < last {
                return Err(EngineError::InvalidState(format!(
                    "round {turn} arrived after round {last}"
                )));
            }
        }
        self.session.last_turn = Some(turn);
        self.session.phase = self.session.phase.max(RoundPhase::for_turn(turn));
        self.session.telemetry.refresh(&*board);

        let mut deploy = Deployment::new(board);
        let decision = match self.session.phase {
            RoundPhase::Bootstrap => {
                place_wave(&mut deploy, SKELETON_WAVE);
                RoundDecision::Bootstrap
            }
            RoundPhase::OpeningStrike => self.opening(&mut deploy),
            RoundPhase::SteadyState => self.steady_state(&mut deploy, turn),
        };

        let batch = deploy.submit();
        tracing::info!(
            turn,
            phase = ?self.session.phase,
            commands = batch.commands.len(),
            "Round decided"
        );
        Ok(TurnReport { batch, decision })
    }

    fn opening<B: GameBoard + ?Sized>(&self, deploy: &mut Deployment<'_, B>) -> RoundDecision {
        let outcome = match self.session.telemetry.current() {
            Some(snapshot) => opening_strike(
                deploy,
                &snapshot.opponent.layout,
                &self.config.opening,
                self.config.attack.turret_range,
            ),
            None => OpeningOutcome::Saved,
        };
        RoundDecision::Opening(outcome)
    }

    fn steady_state<B: GameBoard + ?Sized>(
        &mut self,
        deploy: &mut Deployment<'_, B>,
        turn: u32,
    ) -> RoundDecision {
        let session = &mut self.session;
        let config = &self.config;
        let telemetry = &session.telemetry;
        let Some(current) = telemetry.current() else {
            tracing::warn!(turn, "No snapshot captured, skipping round");
            return RoundDecision::Countered {
                funnel: None,
                maze: None,
            };
        };

        let verdicts = classify(
            &current.opponent.layout,
            telemetry.incursions(),
            &config.classifier,
        );

        let decision = if verdicts.funnel.detected() || verdicts.maze.detected() {
            let ctx = CounterContext {
                turn,
                tempo: current.friendly.resources.tempo,
                health_dropped: telemetry.health_lost(PlayerSide::Friendly) > 0,
                opponent: &current.opponent.layout,
                incursions: telemetry.incursions(),
            };
            let funnel = verdicts
                .funnel
                .side
                .map(|side| respond_to_funnel(deploy, side, &ctx, &config.counters));
            let maze = verdicts.maze.detected().then(|| {
                respond_to_maze(
                    deploy,
                    &verdicts.maze,
                    &ctx,
                    &config.counters,
                    &config.attack,
                    &config.opening,
                )
            });
            RoundDecision::Countered { funnel, maze }
        } else {
            let damage = match telemetry.previous() {
                Some(previous) => analyze(
                    &previous.friendly.layout,
                    &current.friendly.layout,
                    &session.catalog,
                ),
                None => ZoneDamage::none(),
            };
            let attack = plan_attack(deploy, telemetry, &damage, &config.attack);
            let defense = session.leveler.apply(deploy, &damage, &config.defense);
            RoundDecision::Adaptive {
                damage,
                attack,
                defense,
            }
        };

        session.last_verdicts = Some(verdicts);
        decision
    }
}
