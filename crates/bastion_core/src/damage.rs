//! Regional damage scoring.
//!
//! Diffs two consecutive friendly layouts and reports the mean damage each
//! front zone absorbed. Rear zones are ignored.

use crate::arena::{FrontZone, PlayerSide, Position, Region, ZoneMap};
use crate::math::{ratio, Fixed};
use crate::telemetry::StructureLayout;
use crate::units::{UnitCatalog, UnitKind};

/// Starting event count of every zone; keeps the mean finite.
pub const EVENT_EPSILON: Fixed = ratio(1, 100_000);

/// Mean damage per front zone for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneDamage {
    means: ZoneMap<Fixed>,
}

impl ZoneDamage {
    /// No damage anywhere.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            means: ZoneMap::splat(Fixed::ZERO),
        }
    }

    /// Build from explicit per-zone means.
    #[must_use]
    pub const fn from_means(means: ZoneMap<Fixed>) -> Self {
        Self { means }
    }

    /// Mean damage of a zone.
    #[must_use]
    pub fn mean(&self, zone: FrontZone) -> Fixed {
        self.means[zone]
    }

    /// Zones by descending damage; ties keep left-to-right zone order.
    #[must_use]
    pub fn ranked(&self) -> Vec<(FrontZone, Fixed)> {
        let mut zones: Vec<_> = self.means.iter().map(|(z, d)| (z, *d)).collect();
        zones.sort_by(|a, b| b.1.cmp(&a.1));
        zones
    }

    /// The worst-hit zone.
    #[must_use]
    pub fn worst(&self) -> FrontZone {
        self.ranked()
            .first()
            .map_or(FrontZone::LeftCorner, |(zone, _)| *zone)
    }
}

impl Default for ZoneDamage {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Copy)]
struct Tally {
    total: Fixed,
    events: Fixed,
}

impl Tally {
    const EMPTY: Self = Self {
        total: Fixed::ZERO,
        events: EVENT_EPSILON,
    };
}

/// Score the damage our structures took between two rounds.
#[must_use]
pub fn analyze(
    previous: &StructureLayout,
    current: &StructureLayout,
    catalog: &UnitCatalog,
) -> ZoneDamage {
    let mut tallies = ZoneMap::splat(Tally::EMPTY);
    let mut record = |pos: Position, damage: Fixed| {
        let Some(zone) = Region::classify(PlayerSide::Friendly, pos).and_then(Region::front) else {
            return;
        };
        let tally = &mut tallies[zone];
        tally.total += damage.max(Fixed::ZERO);
        tally.events += Fixed::ONE;
    };

    for kind in UnitKind::STRUCTURES {
        let base = catalog.base_stability(kind);

        for (pos, before) in previous.of_kind(kind) {
            match current.get(pos).filter(|s| s.kind == kind) {
                None => record(pos, before.stability),
                Some(after) => {
                    let delta = before.stability - after.stability;
                    if delta >= Fixed::ZERO {
                        record(pos, delta);
                    } else {
                        // Destroyed and rebuilt within the round.
                        record(pos, before.stability + (base - after.stability));
                    }
                }
            }
        }

        for (pos, after) in current.of_kind(kind) {
            let existed = previous.get(pos).is_some_and(|s| s.kind == kind);
            if !existed && after.stability < base {
                record(pos, base - after.stability);
            }
        }
    }

    let mut means = ZoneMap::splat(Fixed::ZERO);
    for (zone, tally) in tallies.iter() {
        means[zone] = tally.total / tally.events;
    }
    tracing::debug!(
        left_corner = %means[FrontZone::LeftCorner],
        mid_left = %means[FrontZone::MidLeft],
        mid_right = %means[FrontZone::MidRight],
        right_corner = %means[FrontZone::RightCorner],
        "Zone damage"
    );
    ZoneDamage::from_means(means)
}
