//! JSON-lines protocol spoken with the game engine.
//!
//! The engine writes one JSON object per line on our stdin:
//!
//! 1. The game config, once, before anything else. Only its
//!    `unitInformation` table matters here.
//! 2. A state frame per deploy phase and per action sub-frame. The first
//!    element of `turnInfo` tells them apart.
//!
//! After every deploy-phase frame we answer with exactly two lines: the
//! build list, then the deploy list, each a JSON array of
//! `[code, x, y]` triples.
//!
//! # Example Session
//!
//! ```text
//! <- {"unitInformation":[{"shorthand":"FF","startHealth":60,"cost1":1}, ...]}
//! <- {"turnInfo":[0,0,-1],"p1Stats":[30,40,5,0],"p2Stats":[30,40,5,0],"p1Units":[[],...],...}
//! -> [["DF",6,11],["DF",21,11],["FF",0,13]]
//! -> []
//! <- {"turnInfo":[1,0,0],...,"events":{"move":[[[14,27],[14,26],[0,0],3,"41",2]],"breach":[]}}
//! <- {"turnInfo":[2,12,0],...}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bastion_core::arena::{PlayerSide, Position};
use bastion_core::board::{Command, CommandBatch, ResourceState, Structure};
use bastion_core::math::Fixed;
use bastion_core::telemetry::{ActionFrame, BreachRecord, MoveRecord};
use bastion_core::units::{UnitCatalog, UnitKind, UnitTableEntry};

use crate::error::{HeadlessError, Result};

// ============================================================================
// Game config (first line)
// ============================================================================

/// The game-start configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Ordered unit table.
    #[serde(rename = "unitInformation")]
    pub unit_information: Vec<UnitInfo>,
}

/// One row of the unit table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitInfo {
    /// Short code used in replies and events.
    #[serde(default)]
    pub shorthand: String,
    /// Starting stability.
    #[serde(rename = "startHealth", alias = "stability", default)]
    pub start_health: Option<f64>,
    /// Price in the primary pool of this kind.
    #[serde(alias = "cost", default)]
    pub cost1: Option<f64>,
    /// Price in the secondary pool, when the engine publishes one.
    #[serde(default)]
    pub cost2: Option<f64>,
}

/// Convert an engine decimal into fixed point.
pub fn decimal(value: f64) -> Result<Fixed> {
    Fixed::checked_from_num(value)
        .ok_or_else(|| HeadlessError::Protocol(format!("number out of range: {value}")))
}

/// Price of one unit of each kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCosts([Fixed; 6]);

impl UnitCosts {
    /// Prices the engine ships with.
    #[must_use]
    pub fn standard() -> Self {
        Self(UnitKind::ALL.map(|kind| Fixed::from_num(default_cost(kind))))
    }

    /// Price of a kind, paid from build (structures) or tempo (mobile).
    #[must_use]
    pub fn of(&self, kind: UnitKind) -> Fixed {
        self.0[kind.index() as usize]
    }
}

impl Default for UnitCosts {
    fn default() -> Self {
        Self::standard()
    }
}

const fn default_cost(kind: UnitKind) -> u8 {
    match kind {
        UnitKind::Wall | UnitKind::SwarmUnit | UnitKind::SupportUnit => 1,
        UnitKind::Turret | UnitKind::ArmorUnit => 3,
        UnitKind::Shield => 4,
    }
}

impl GameConfig {
    /// Resolve the unit table into a catalog and a price list.
    pub fn resolve(&self) -> Result<(UnitCatalog, UnitCosts)> {
        let entries = self
            .unit_information
            .iter()
            .map(|info| -> Result<UnitTableEntry> {
                Ok(UnitTableEntry {
                    shorthand: info.shorthand.clone(),
                    stability: info.start_health.map(decimal).transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let catalog = UnitCatalog::from_table(&entries)?;

        let mut costs = UnitCosts::standard();
        for (kind, info) in UnitKind::ALL.iter().zip(&self.unit_information) {
            // Mobile units are priced in the second pool when it exists.
            let price = if kind.is_mobile() {
                info.cost2.or(info.cost1)
            } else {
                info.cost1
            };
            if let Some(price) = price {
                costs.0[kind.index() as usize] = decimal(price)?;
            }
        }
        Ok((catalog, costs))
    }
}

// ============================================================================
// State frames (every later line)
// ============================================================================

/// Which part of a round a state frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// We must answer with a build and a deploy list.
    Deploy,
    /// Telemetry only.
    Action,
    /// The match is over.
    End,
}

/// A structure or mobile unit as listed in `p1Units`/`p2Units`.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitRecord(pub i32, pub i32, pub f64, pub String);

/// A movement event: from, to, unused, unit index, unit id, player.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveEvent(
    pub [i32; 2],
    pub [i32; 2],
    pub [i32; 2],
    pub u8,
    pub String,
    pub u8,
);

/// A breach event: cell, damage, unit index, unit id, player.
#[derive(Debug, Clone, Deserialize)]
pub struct BreachEvent(pub [i32; 2], pub f64, pub u8, pub String, pub u8);

/// Events recorded during an action sub-frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameEvents {
    /// Unit movements.
    #[serde(rename = "move", default)]
    pub moves: Vec<MoveEvent>,
    /// Units reaching a back edge.
    #[serde(rename = "breach", default)]
    pub breaches: Vec<BreachEvent>,
}

/// One per-round or per-sub-frame state document.
#[derive(Debug, Clone, Deserialize)]
pub struct StateFrame {
    /// `[phase, turn, frame]`.
    #[serde(rename = "turnInfo")]
    pub turn_info: Vec<i64>,
    /// `[health, build, tempo, time]` for us.
    #[serde(rename = "p1Stats")]
    pub p1_stats: Vec<f64>,
    /// `[health, build, tempo, time]` for the opponent.
    #[serde(rename = "p2Stats")]
    pub p2_stats: Vec<f64>,
    /// Our units grouped by unit-table index.
    #[serde(rename = "p1Units", default)]
    pub p1_units: Vec<Vec<UnitRecord>>,
    /// Opponent units grouped by unit-table index.
    #[serde(rename = "p2Units", default)]
    pub p2_units: Vec<Vec<UnitRecord>>,
    /// Action-phase events.
    #[serde(default)]
    pub events: FrameEvents,
}

const fn player(id: u8) -> PlayerSide {
    if id == 1 {
        PlayerSide::Friendly
    } else {
        PlayerSide::Opponent
    }
}

impl StateFrame {
    /// Parse one protocol line.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    fn turn_field(&self, index: usize, name: &str) -> Result<i64> {
        self.turn_info
            .get(index)
            .copied()
            .ok_or_else(|| HeadlessError::Protocol(format!("turnInfo has no {name}")))
    }

    /// Phase of this frame.
    pub fn phase(&self) -> Result<FramePhase> {
        match self.turn_field(0, "phase")? {
            0 => Ok(FramePhase::Deploy),
            1 => Ok(FramePhase::Action),
            2 => Ok(FramePhase::End),
            other => Err(HeadlessError::Protocol(format!("unknown phase {other}"))),
        }
    }

    /// Zero-based round index.
    pub fn turn(&self) -> Result<u32> {
        let turn = self.turn_field(1, "turn")?;
        u32::try_from(turn).map_err(|_| HeadlessError::Protocol(format!("bad turn {turn}")))
    }

    /// Action sub-frame index; negative values read as zero.
    pub fn frame(&self) -> Result<u32> {
        Ok(u32::try_from(self.turn_field(2, "frame")?).unwrap_or(0))
    }

    fn stats(&self, side: PlayerSide) -> &[f64] {
        match side {
            PlayerSide::Friendly => &self.p1_stats,
            PlayerSide::Opponent => &self.p2_stats,
        }
    }

    fn stat(&self, side: PlayerSide, index: usize) -> Result<f64> {
        self.stats(side)
            .get(index)
            .copied()
            .ok_or_else(|| HeadlessError::Protocol(format!("stats missing field {index}")))
    }

    /// Remaining health.
    pub fn health(&self, side: PlayerSide) -> Result<u32> {
        Ok(self.stat(side, 0)?.max(0.0) as u32)
    }

    /// Build and tempo pools.
    pub fn resources(&self, side: PlayerSide) -> Result<ResourceState> {
        Ok(ResourceState::new(
            decimal(self.stat(side, 2)?)?,
            decimal(self.stat(side, 1)?)?,
        ))
    }

    /// Structures of one side keyed by cell.
    pub fn structures(&self, side: PlayerSide) -> Result<BTreeMap<Position, Structure>> {
        let groups = match side {
            PlayerSide::Friendly => &self.p1_units,
            PlayerSide::Opponent => &self.p2_units,
        };
        let mut out = BTreeMap::new();
        for kind in UnitKind::STRUCTURES {
            for record in groups.get(kind.index() as usize).into_iter().flatten() {
                out.insert(
                    Position::new(record.0, record.1),
                    Structure::new(kind, decimal(record.2)?),
                );
            }
        }
        Ok(out)
    }

    /// Events of this sub-frame in core form.
    pub fn action_frame(&self) -> Result<ActionFrame> {
        let moves = self
            .events
            .moves
            .iter()
            .map(|MoveEvent(from, to, _, index, id, owner)| MoveRecord {
                from: Position::new(from[0], from[1]),
                to: Position::new(to[0], to[1]),
                unit_index: *index,
                unit_id: id.clone(),
                owner: player(*owner),
            })
            .collect();
        let breaches = self
            .events
            .breaches
            .iter()
            .map(|BreachEvent(pos, _, _, _, owner)| BreachRecord {
                pos: Position::new(pos[0], pos[1]),
                owner: player(*owner),
            })
            .collect();
        Ok(ActionFrame {
            frame: self.frame()?,
            moves,
            breaches,
        })
    }
}

// ============================================================================
// Replies
// ============================================================================

/// One `[code, x, y]` entry of a reply list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement(pub String, pub i32, pub i32);

/// The two reply lines of a deploy phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnSubmission {
    /// Structures and removals.
    pub build: Vec<Placement>,
    /// Mobile units, one entry per unit.
    pub deploy: Vec<Placement>,
}

impl TurnSubmission {
    /// Render a command batch with the match's short codes.
    #[must_use]
    pub fn from_batch(batch: &CommandBatch, catalog: &UnitCatalog) -> Self {
        let mut out = Self::default();
        for command in &batch.commands {
            match *command {
                Command::Spawn { kind, pos, count } => {
                    let entry = Placement(catalog.shorthand(kind).to_string(), pos.x, pos.y);
                    if kind.is_structure() {
                        out.build.push(entry);
                    } else {
                        out.deploy
                            .extend(std::iter::repeat(entry).take(count as usize));
                    }
                }
                Command::Remove { pos } => {
                    out.build.push(Placement(
                        catalog.removal_code().to_string(),
                        pos.x,
                        pos.y,
                    ));
                }
            }
        }
        out
    }

    /// Both reply lines, each terminated by a newline.
    pub fn to_lines(&self) -> Result<String> {
        Ok(format!(
            "{}\n{}\n",
            serde_json::to_string(&self.build)?,
            serde_json::to_string(&self.deploy)?
        ))
    }
}
