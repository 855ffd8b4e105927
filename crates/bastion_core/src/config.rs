//! Tunable decision thresholds.
//!
//! Every numeric threshold the planners compare against lives here rather
//! than inline in control flow. Defaults reproduce the shipped behaviour;
//! a RON document can override any subset of them.
//!
//! **Note:** This module contains no IO - it only parses strings. Reading
//! the file is the adapter's job.
//!
//! # Example RON
//!
//! ```ron
//! EngineConfig(
//!     defense: DefenseTuning(alarm_damage: 12.0),
//!     attack: AttackTuning(health_loss_trigger: 4),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::math::{decimal_serde, int, ratio, Fixed};

/// Complete set of decision thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Defense Leveler thresholds.
    pub defense: DefenseTuning,
    /// Attack Planner thresholds.
    pub attack: AttackTuning,
    /// Opponent Pattern Classifier thresholds.
    pub classifier: ClassifierTuning,
    /// Round-1 opening strike thresholds.
    pub opening: OpeningTuning,
    /// Archetype counter thresholds.
    pub counters: CounterTuning,
}

impl EngineConfig {
    /// Parse a RON document; missing fields keep their defaults.
    pub fn from_ron_str(src: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(src).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the planners cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.opening.swarm_stability == 0 {
            return Err(EngineError::InvalidConfig(
                "opening.swarm_stability must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defense Leveler thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseTuning {
    /// Mean zone damage at or above which a zone is escalated.
    #[serde(with = "decimal_serde")]
    pub alarm_damage: Fixed,
}

impl Default for DefenseTuning {
    fn default() -> Self {
        Self {
            alarm_damage: int(10),
        }
    }
}

/// One step of the armor/support composition schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionTier {
    /// The tier applies while tempo is strictly below this value.
    #[serde(with = "decimal_serde")]
    pub tempo_below: Fixed,
    /// Armor units to launch.
    pub armor: u32,
    /// Support units to launch.
    pub support: u32,
}

impl CompositionTier {
    const fn new(tempo_below: i64, armor: u32, support: u32) -> Self {
        Self {
            tempo_below: int(tempo_below),
            armor,
            support,
        }
    }
}

/// Attack Planner thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackTuning {
    /// Health lost since last round that triggers the reactive flow.
    pub health_loss_trigger: u32,
    /// Tempo at or above which the reactive flow strikes instead of patching.
    #[serde(with = "decimal_serde")]
    pub abundant_tempo: Fixed,
    /// Tempo below which the proactive flow stays idle.
    #[serde(with = "decimal_serde")]
    pub proactive_floor: Fixed,
    /// Armor units in a reactive counter-strike.
    pub reactive_armor: u32,
    /// Corner defense score at or below which swarm units are used.
    pub low_defense: u32,
    /// Corner permeability score at or below which swarm units are used.
    pub low_permeability: u32,
    /// Reach of an opponent turret when scoring corners.
    #[serde(with = "decimal_serde")]
    pub turret_range: Fixed,
    /// Armor/support counts by tempo; beyond the last tier swarm units go.
    pub schedule: Vec<CompositionTier>,
}

impl Default for AttackTuning {
    fn default() -> Self {
        Self {
            health_loss_trigger: 5,
            abundant_tempo: int(10),
            proactive_floor: int(7),
            reactive_armor: 3,
            low_defense: 50,
            low_permeability: 8,
            turret_range: ratio(7, 2),
            schedule: vec![
                CompositionTier::new(8, 2, 1),
                CompositionTier::new(9, 2, 2),
                CompositionTier::new(10, 2, 3),
                CompositionTier::new(11, 3, 1),
                CompositionTier::new(12, 3, 2),
            ],
        }
    }
}

/// Opponent Pattern Classifier thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierTuning {
    /// Occupied corridor cells needed to suspect a funnel.
    pub corridor_length: usize,
    /// Run length that counts as a maze wall.
    pub wall_length: usize,
}

impl Default for ClassifierTuning {
    fn default() -> Self {
        Self {
            corridor_length: 10,
            wall_length: 12,
        }
    }
}

/// Round-1 opening strike thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningTuning {
    /// Paths longer than this are treated as unbounded danger.
    pub max_path_len: usize,
    /// Stability of a single swarm unit.
    pub swarm_stability: u32,
    /// Predicted damage per turret per path step.
    pub turret_hit: u32,
    /// Predicted surviving swarm units needed to launch.
    pub min_survivors: i64,
    /// Reach of an armor unit's attack.
    #[serde(with = "decimal_serde")]
    pub armor_range: Fixed,
    /// Predicted structure damage per cell in armor reach.
    pub armor_hit: u32,
    /// Armor units launched when the armor plan wins.
    pub armor_count: u32,
    /// Support units launched alongside them.
    pub support_count: u32,
}

impl Default for OpeningTuning {
    fn default() -> Self {
        Self {
            max_path_len: 32,
            swarm_stability: 15,
            turret_hit: 8,
            min_survivors: 5,
            armor_range: ratio(11, 2),
            armor_hit: 12,
            armor_count: 2,
            support_count: 2,
        }
    }
}

/// Archetype counter thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterTuning {
    /// Turrets at or below this stability are replaced in the funnel corner.
    #[serde(with = "decimal_serde")]
    pub weak_turret_stability: Fixed,
    /// Tempo needed before shields are placed or a funnel strike launches.
    #[serde(with = "decimal_serde")]
    pub funnel_tempo: Fixed,
    /// Base tempo reserve for a maze strike; grows by a tenth per round.
    #[serde(with = "decimal_serde")]
    pub maze_tempo: Fixed,
    /// Shortest path that still counts as a usable maze strike route.
    pub min_strike_path: usize,
    /// Predicted route damage above which armor replaces swarm units.
    pub strike_damage_limit: u32,
}

impl Default for CounterTuning {
    fn default() -> Self {
        Self {
            weak_turret_stability: ratio(75, 2),
            funnel_tempo: int(10),
            maze_tempo: int(10),
            min_strike_path: 14,
            strike_damage_limit: 50,
        }
    }
}
