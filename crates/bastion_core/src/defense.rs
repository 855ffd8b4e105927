//! Zone reinforcement and the static friendly layout.
//!
//! Each front zone carries a [`DefenseLevel`] that only ever climbs, one
//! step per round at most. Zones that took heavy damage last round get
//! their skeleton rebuilt and the add-on turrets of every tier they have
//! unlocked; afterwards the whole static layout is topped up wave by wave
//! unless the round ran short of build resources.

use serde::{Deserialize, Serialize};

use crate::arena::{FrontZone, Region, ZoneMap};
use crate::blueprint::{self, Placement, WAVES};
use crate::board::{Deployment, GameBoard};
use crate::config::DefenseTuning;
use crate::damage::ZoneDamage;
use crate::units::UnitKind;

/// Reinforcement level of one zone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum DefenseLevel {
    /// Static layout only.
    #[default]
    Base,
    /// First add-on tier unlocked.
    Reinforced,
    /// Second add-on tier unlocked.
    Fortified,
    /// Every add-on tier unlocked.
    Citadel,
}

impl DefenseLevel {
    /// Add-on tiers unlocked at this level.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Base => 0,
            Self::Reinforced => 1,
            Self::Fortified => 2,
            Self::Citadel => 3,
        }
    }

    /// The next level up; the top level stays put.
    #[must_use]
    pub const fn escalated(self) -> Self {
        match self {
            Self::Base => Self::Reinforced,
            Self::Reinforced => Self::Fortified,
            Self::Fortified | Self::Citadel => Self::Citadel,
        }
    }

    /// Whether the level can still climb.
    #[must_use]
    pub const fn is_capped(self) -> bool {
        matches!(self, Self::Citadel)
    }
}

/// What one leveling pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelReport {
    /// Zones whose level went up this round, in processing order.
    pub escalated: Vec<FrontZone>,
    /// Whether an unaffordable turret stopped wall placement.
    pub saving: bool,
}

/// Per-zone escalation state for a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefenseLeveler {
    levels: ZoneMap<DefenseLevel>,
}

impl DefenseLeveler {
    /// All zones at [`DefenseLevel::Base`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a zone.
    #[must_use]
    pub fn level(&self, zone: FrontZone) -> DefenseLevel {
        self.levels[zone]
    }

    /// Levels of every zone.
    #[must_use]
    pub fn levels(&self) -> &ZoneMap<DefenseLevel> {
        &self.levels
    }

    /// Reinforce damaged zones, then top up the static layout.
    ///
    /// Zones are visited by descending damage and the scan stops at the
    /// first one under the alarm threshold. Capped zones are skipped.
    pub fn apply<B: GameBoard + ?Sized>(
        &mut self,
        deploy: &mut Deployment<'_, B>,
        damage: &ZoneDamage,
        tuning: &DefenseTuning,
    ) -> LevelReport {
        let mut report = LevelReport::default();

        for (zone, mean) in damage.ranked() {
            if mean < tuning.alarm_damage {
                break;
            }
            let level = &mut self.levels[zone];
            if level.is_capped() {
                continue;
            }
            *level = level.escalated();
            report.escalated.push(zone);
            let tier = level.tier();
            tracing::debug!(?zone, %mean, tier, "Reinforcing zone");

            let skeleton = blueprint::skeleton(zone);
            for &cell in skeleton.turrets {
                deploy.spawn_one(UnitKind::Turret, cell);
            }
            place_addons(deploy, Region::Front(zone), 1, &mut report.saving);
            if !report.saving {
                for &cell in skeleton.walls {
                    deploy.spawn_one(UnitKind::Wall, cell);
                }
            }
            for t in 2..=tier {
                place_addons(deploy, Region::Front(zone), t, &mut report.saving);
            }
        }

        if report.saving {
            tracing::info!("Saving build resources, static layout deferred");
            return report;
        }

        for wave in WAVES {
            place_wave(deploy, wave);
        }
        for region in Region::ALL {
            for &cell in blueprint::addon_turrets(region, 1) {
                deploy.spawn_one(UnitKind::Turret, cell);
            }
        }
        report
    }
}

fn place_addons<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    region: Region,
    tier: u8,
    saving: &mut bool,
) {
    for &cell in blueprint::addon_turrets(region, tier) {
        if deploy.affordable(UnitKind::Turret) > 0 {
            deploy.spawn_one(UnitKind::Turret, cell);
        } else {
            *saving = true;
        }
    }
}

/// Place one wave of the static layout in table order.
pub fn place_wave<B: GameBoard + ?Sized>(deploy: &mut Deployment<'_, B>, wave: &[Placement]) {
    for placement in wave {
        for &cell in placement.cells {
            deploy.spawn_one(placement.kind, cell);
        }
    }
}
