//! Static friendly defense layouts.
//!
//! Pure data: every coordinate the Defense Leveler places lives in these
//! tables, keyed by zone and tier or grouped into priority waves.

use crate::arena::{FrontZone, Position, Region};
use crate::units::UnitKind;

macro_rules! p {
    ($x:expr, $y:expr) => {
        Position { x: $x, y: $y }
    };
}

/// Walls and turrets forming a zone's base layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneSkeleton {
    /// Turret cells.
    pub turrets: &'static [Position],
    /// Wall cells.
    pub walls: &'static [Position],
}

const LEFT_CORNER: ZoneSkeleton = ZoneSkeleton {
    turrets: &[p!(6, 11)],
    walls: &[p!(0, 13), p!(1, 13), p!(2, 12), p!(3, 12), p!(4, 11), p!(5, 10), p!(5, 12)],
};

const MID_LEFT: ZoneSkeleton = ZoneSkeleton {
    turrets: &[p!(10, 9), p!(11, 12), p!(12, 13)],
    walls: &[
        p!(7, 11),
        p!(8, 11),
        p!(11, 9),
        p!(10, 12),
        p!(12, 12),
        p!(13, 12),
        p!(10, 13),
        p!(11, 13),
        p!(13, 13),
    ],
};

const MID_RIGHT: ZoneSkeleton = ZoneSkeleton {
    turrets: &[p!(17, 9), p!(16, 12), p!(15, 13)],
    walls: &[
        p!(20, 11),
        p!(19, 11),
        p!(16, 9),
        p!(17, 12),
        p!(15, 12),
        p!(14, 12),
        p!(17, 13),
        p!(16, 13),
        p!(14, 13),
    ],
};

const RIGHT_CORNER: ZoneSkeleton = ZoneSkeleton {
    turrets: &[p!(21, 11)],
    walls: &[p!(27, 13), p!(26, 13), p!(25, 12), p!(24, 12), p!(23, 11), p!(22, 10), p!(22, 12)],
};

/// Base layer of a front zone.
#[must_use]
pub const fn skeleton(zone: FrontZone) -> ZoneSkeleton {
    match zone {
        FrontZone::LeftCorner => LEFT_CORNER,
        FrontZone::MidLeft => MID_LEFT,
        FrontZone::MidRight => MID_RIGHT,
        FrontZone::RightCorner => RIGHT_CORNER,
    }
}

/// Highest add-on tier.
pub const MAX_TIER: u8 = 3;

/// Extra turret cells unlocked at a tier (1..=3) for a region.
///
/// Rear regions only have a first tier.
#[must_use]
pub const fn addon_turrets(region: Region, tier: u8) -> &'static [Position] {
    match (region, tier) {
        (Region::Front(FrontZone::LeftCorner), 1) => &[p!(1, 12), p!(2, 13)],
        (Region::Front(FrontZone::LeftCorner), 2) => &[p!(2, 11)],
        (Region::Front(FrontZone::LeftCorner), 3) => &[p!(3, 13)],
        (Region::Front(FrontZone::MidLeft), 1) => &[p!(6, 10)],
        (Region::Front(FrontZone::MidLeft), 2) => &[p!(9, 13)],
        (Region::Front(FrontZone::MidLeft), 3) => &[p!(9, 9)],
        (Region::Front(FrontZone::MidRight), 1) => &[p!(21, 10)],
        (Region::Front(FrontZone::MidRight), 2) => &[p!(18, 13)],
        (Region::Front(FrontZone::MidRight), 3) => &[p!(18, 9)],
        (Region::Front(FrontZone::RightCorner), 1) => &[p!(26, 12), p!(25, 13)],
        (Region::Front(FrontZone::RightCorner), 2) => &[p!(25, 11)],
        (Region::Front(FrontZone::RightCorner), 3) => &[p!(24, 13)],
        (Region::RearLeft, 1) => &[p!(8, 7)],
        (Region::RearRight, 1) => &[p!(19, 7)],
        _ => &[],
    }
}

/// A group of placements of one kind inside a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Kind placed.
    pub kind: UnitKind,
    /// Target cells, in order.
    pub cells: &'static [Position],
}

const fn place(kind: UnitKind, cells: &'static [Position]) -> Placement {
    Placement { kind, cells }
}

/// The skeleton wave: corner and centre turrets then the outer walls.
pub const SKELETON_WAVE: &[Placement] = &[
    place(UnitKind::Turret, &[p!(6, 11), p!(21, 11), p!(10, 9), p!(17, 9)]),
    place(
        UnitKind::Wall,
        &[
            p!(0, 13),
            p!(1, 13),
            p!(2, 12),
            p!(3, 12),
            p!(4, 11),
            p!(27, 13),
            p!(26, 13),
            p!(25, 12),
            p!(24, 12),
            p!(23, 11),
            p!(5, 10),
            p!(22, 10),
        ],
    ),
];

/// Every wave of the full layout in priority order, skeleton first.
pub const WAVES: [&[Placement]; 6] = [
    SKELETON_WAVE,
    &[place(UnitKind::Wall, &[p!(7, 11), p!(8, 11), p!(20, 11), p!(19, 11)])],
    &[
        place(
            UnitKind::Wall,
            &[
                p!(10, 12),
                p!(11, 13),
                p!(12, 12),
                p!(13, 12),
                p!(14, 12),
                p!(15, 12),
                p!(16, 13),
                p!(17, 12),
            ],
        ),
        place(UnitKind::Turret, &[p!(11, 12), p!(16, 12)]),
    ],
    &[place(UnitKind::Wall, &[p!(11, 9), p!(16, 9)])],
    &[
        place(UnitKind::Shield, &[p!(13, 8), p!(14, 8)]),
        place(UnitKind::Wall, &[p!(10, 13), p!(13, 13), p!(14, 13), p!(17, 13)]),
        place(UnitKind::Turret, &[p!(12, 13), p!(15, 13)]),
    ],
    &[place(
        UnitKind::Shield,
        &[p!(12, 9), p!(13, 9), p!(14, 9), p!(15, 9), p!(5, 11), p!(22, 11)],
    )],
];
