//! Match loop over a line-oriented channel.
//!
//! The same loop serves live play (stdin/stdout) and transcript replay
//! (file in, file or stdout out); only the reader and writer differ.

use std::io::{BufRead, Write};

use bastion_core::config::EngineConfig;
use bastion_core::engine::{DecisionEngine, RoundDecision};
use bastion_core::units::UnitCatalog;

use crate::board::LiveBoard;
use crate::error::{HeadlessError, Result};
use crate::protocol::{FramePhase, GameConfig, StateFrame, TurnSubmission, UnitCosts};

/// What one input line led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The game config was read and the session reset.
    Configured,
    /// A deploy phase was decided; these lines must be written back.
    Reply(TurnSubmission),
    /// An action sub-frame was folded into telemetry.
    Observed,
    /// The engine announced the end of the match.
    Finished,
    /// Blank line.
    Skipped,
}

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Deploy phases answered.
    pub rounds: u32,
    /// Action sub-frames observed.
    pub frames: u32,
    /// Rounds that ran an archetype counter.
    pub countered: u32,
    /// Whether an end-of-match frame was seen.
    pub finished: bool,
}

/// Drives a [`DecisionEngine`] from protocol lines.
#[derive(Debug, Clone)]
pub struct MatchRunner {
    engine: DecisionEngine,
    catalog: Option<UnitCatalog>,
    costs: UnitCosts,
    summary: RunSummary,
}

impl MatchRunner {
    /// Runner using the given thresholds.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: DecisionEngine::new(config),
            catalog: None,
            costs: UnitCosts::standard(),
            summary: RunSummary::default(),
        }
    }

    /// The engine being driven.
    #[must_use]
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Totals so far.
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Handle one input line.
    ///
    /// The first non-blank line must be the game config.
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Skipped);
        }

        let Some(catalog) = &self.catalog else {
            let config: GameConfig = serde_json::from_str(line)?;
            let (catalog, costs) = config.resolve()?;
            self.engine.on_game_start(catalog.clone());
            self.catalog = Some(catalog);
            self.costs = costs;
            self.summary = RunSummary::default();
            tracing::info!("Game config received");
            return Ok(LineOutcome::Configured);
        };

        let frame = StateFrame::parse(line)?;
        match frame.phase()? {
            FramePhase::Deploy => {
                let mut board = LiveBoard::from_frame(&frame, catalog, &self.costs)?;
                let report = self.engine.on_turn(&mut board)?;
                self.summary.rounds += 1;
                if matches!(report.decision, RoundDecision::Countered { .. }) {
                    self.summary.countered += 1;
                }
                let reply = board.take_submission().ok_or_else(|| {
                    HeadlessError::Protocol(format!("round {} was not submitted", report.batch.turn))
                })?;
                Ok(LineOutcome::Reply(reply))
            }
            FramePhase::Action => {
                self.engine.on_action_frame(&frame.action_frame()?)?;
                self.summary.frames += 1;
                Ok(LineOutcome::Observed)
            }
            FramePhase::End => {
                self.summary.finished = true;
                tracing::info!(rounds = self.summary.rounds, "Match finished");
                Ok(LineOutcome::Finished)
            }
        }
    }

    /// Process lines until the match ends or input runs out.
    ///
    /// Replies are flushed after every deploy phase.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<RunSummary> {
        for line in input.lines() {
            match self.handle_line(&line?)? {
                LineOutcome::Reply(reply) => {
                    output.write_all(reply.to_lines()?.as_bytes())?;
                    output.flush()?;
                }
                LineOutcome::Finished => break,
                LineOutcome::Configured | LineOutcome::Observed | LineOutcome::Skipped => {}
            }
        }
        if !self.summary.finished {
            tracing::warn!("Input ended before the match did");
        }
        Ok(self.summary.clone())
    }
}

impl Default for MatchRunner {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"unitInformation":[{"shorthand":"FF"},{"shorthand":"EF"},{"shorthand":"DF"},{"shorthand":"PI"},{"shorthand":"EI"},{"shorthand":"SI"},{"shorthand":"RM"}]}"#;

    #[test]
    fn test_state_before_config_is_an_error() {
        let mut runner = MatchRunner::default();
        let err = runner
            .handle_line(r#"{"turnInfo":[0,0,-1],"p1Stats":[30,40,5,0],"p2Stats":[30,40,5,0]}"#)
            .unwrap_err();
        assert!(matches!(err, HeadlessError::Json(_)));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let mut runner = MatchRunner::default();
        assert_eq!(runner.handle_line("  ").unwrap(), LineOutcome::Skipped);
        assert_eq!(runner.handle_line(CONFIG).unwrap(), LineOutcome::Configured);
    }

    #[test]
    fn test_first_round_reply() {
        let mut runner = MatchRunner::default();
        runner.handle_line(CONFIG).unwrap();
        let outcome = runner
            .handle_line(r#"{"turnInfo":[0,0,-1],"p1Stats":[30,40,5,0],"p2Stats":[30,40,5,0]}"#)
            .unwrap();
        let LineOutcome::Reply(reply) = outcome else {
            panic!("expected a reply");
        };
        assert!(!reply.build.is_empty());
        assert!(reply.deploy.is_empty());
        assert_eq!(runner.summary().rounds, 1);
    }

    #[test]
    fn test_end_frame_stops_run() {
        let input = format!(
            "{CONFIG}\n{}\n{}\n",
            r#"{"turnInfo":[2,0,0],"p1Stats":[30,0,0,0],"p2Stats":[0,0,0,0]}"#,
            r#"{"turnInfo":[0,1,-1],"p1Stats":[30,40,5,0],"p2Stats":[30,40,5,0]}"#,
        );
        let mut out = Vec::new();
        let summary = MatchRunner::default()
            .run(input.as_bytes(), &mut out)
            .unwrap();
        assert!(summary.finished);
        assert_eq!(summary.rounds, 0);
        assert!(out.is_empty());
    }
}
