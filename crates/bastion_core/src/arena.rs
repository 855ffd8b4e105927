//! Static battlefield geometry.
//!
//! The arena is a 28x28 diamond split along the horizontal midline: the
//! friendly half is `y < 14`, the opponent half `y >= 14`. Every query in
//! this module is a pure function of a [`Position`] and these constants.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::math::{distance_squared, Fixed};

/// Width and height of the arena in cells.
pub const ARENA_SIZE: i32 = 28;

/// Row index of the midline; the first opponent row.
pub const HALF_ARENA: i32 = 14;

/// Side length of a region block.
const REGION_SPAN: i32 = 7;

/// Extra reach granted to every range query, measured from cell centres.
const RANGE_SLACK: Fixed = crate::math::ratio(51, 100);

/// Integer grid cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row, counted from the friendly back corner.
    pub y: i32,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by an offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Position reflected across the vertical axis of the arena.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        Self::new(ARENA_SIZE - 1 - self.x, self.y)
    }

    /// Whether this cell lies inside the diamond.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        let Self { x, y } = self;
        if y < 0 || y >= ARENA_SIZE {
            return false;
        }
        if y < HALF_ARENA {
            x >= HALF_ARENA - 1 - y && x <= HALF_ARENA + y
        } else {
            x >= y - HALF_ARENA && x <= ARENA_SIZE + HALF_ARENA - 1 - y
        }
    }

    /// Half of the arena this cell belongs to, if in bounds.
    #[must_use]
    pub const fn half(self) -> Option<PlayerSide> {
        if !self.in_bounds() {
            None
        } else if self.y < HALF_ARENA {
            Some(PlayerSide::Friendly)
        } else {
            Some(PlayerSide::Opponent)
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// The two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSide {
    /// This engine's player; owns `y < 14`.
    Friendly,
    /// The other player; owns `y >= 14`.
    Opponent,
}

/// Horizontal direction, shared by corridor sides and attack directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flank {
    /// Low-x side.
    Left,
    /// High-x side.
    Right,
}

impl Flank {
    /// The other flank.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// The four diagonal arena edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    /// Opponent back edge, low x.
    TopLeft,
    /// Opponent back edge, high x.
    TopRight,
    /// Friendly back edge, low x.
    BottomLeft,
    /// Friendly back edge, high x.
    BottomRight,
}

impl Edge {
    /// Cells along this edge, ordered from the midline outwards.
    #[must_use]
    pub fn locations(self) -> Vec<Position> {
        (0..HALF_ARENA)
            .map(|n| match self {
                Self::TopLeft => Position::new(HALF_ARENA - 1 - n, ARENA_SIZE - 1 - n),
                Self::TopRight => Position::new(HALF_ARENA + n, ARENA_SIZE - 1 - n),
                Self::BottomLeft => Position::new(HALF_ARENA - 1 - n, n),
                Self::BottomRight => Position::new(HALF_ARENA + n, n),
            })
            .collect()
    }

    /// Whether a cell lies on this edge.
    #[must_use]
    pub const fn contains(self, pos: Position) -> bool {
        let Position { x, y } = pos;
        match self {
            Self::TopLeft => y >= HALF_ARENA && y < ARENA_SIZE && x == y - HALF_ARENA,
            Self::TopRight => {
                y >= HALF_ARENA && y < ARENA_SIZE && x == ARENA_SIZE + HALF_ARENA - 1 - y
            }
            Self::BottomLeft => y >= 0 && y < HALF_ARENA && x == HALF_ARENA - 1 - y,
            Self::BottomRight => y >= 0 && y < HALF_ARENA && x == HALF_ARENA + y,
        }
    }

    /// Edge a mobile unit launched from `start` on the friendly half heads for.
    #[must_use]
    pub const fn target_from(start: Position) -> Self {
        if start.x < HALF_ARENA {
            Self::TopRight
        } else {
            Self::TopLeft
        }
    }
}

/// Every in-bounds cell within `radius` of `center`.
///
/// A cell counts when its centre is strictly closer than `radius + 0.51`.
#[must_use]
pub fn locations_in_range(center: Position, radius: Fixed) -> Vec<Position> {
    let reach = radius + RANGE_SLACK;
    let limit = reach * reach;
    let span = radius.to_num::<i32>() + 1;

    let mut found = Vec::new();
    for x in (center.x - span)..=(center.x + span) {
        for y in (center.y - span)..=(center.y + span) {
            let pos = Position::new(x, y);
            if !pos.in_bounds() {
                continue;
            }
            let d2 = Fixed::from_num(distance_squared(center.x, center.y, x, y));
            if d2 < limit {
                found.push(pos);
            }
        }
    }
    found
}

/// Every in-bounds cell on one half, in row-major order.
#[must_use]
pub fn half_locations(side: PlayerSide) -> Vec<Position> {
    let rows = match side {
        PlayerSide::Friendly => 0..HALF_ARENA,
        PlayerSide::Opponent => HALF_ARENA..ARENA_SIZE,
    };
    rows.flat_map(|y| (0..ARENA_SIZE).map(move |x| Position::new(x, y)))
        .filter(|p| p.in_bounds())
        .collect()
}

/// One of the four zones along the midline on either half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrontZone {
    /// Columns 0..7.
    LeftCorner,
    /// Columns 7..14.
    MidLeft,
    /// Columns 14..21.
    MidRight,
    /// Columns 21..28.
    RightCorner,
}

impl FrontZone {
    /// All front zones, left to right.
    pub const ALL: [Self; 4] = [
        Self::LeftCorner,
        Self::MidLeft,
        Self::MidRight,
        Self::RightCorner,
    ];

    /// Position of this zone in [`FrontZone::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Which flank this zone sits on.
    #[must_use]
    pub const fn flank(self) -> Flank {
        match self {
            Self::LeftCorner | Self::MidLeft => Flank::Left,
            Self::MidRight | Self::RightCorner => Flank::Right,
        }
    }

    /// Whether this is one of the two outer corner zones.
    #[must_use]
    pub const fn is_corner(self) -> bool {
        matches!(self, Self::LeftCorner | Self::RightCorner)
    }

    /// Corner zone on a flank.
    #[must_use]
    pub const fn corner(flank: Flank) -> Self {
        match flank {
            Flank::Left => Self::LeftCorner,
            Flank::Right => Self::RightCorner,
        }
    }
}

/// Region of one player's half.
///
/// Front zones border the midline; the two rear zones sit behind the
/// middle front zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// One of the four midline zones.
    Front(FrontZone),
    /// Rear zone behind [`FrontZone::MidLeft`].
    RearLeft,
    /// Rear zone behind [`FrontZone::MidRight`].
    RearRight,
}

impl Region {
    /// Every region, front zones first.
    pub const ALL: [Self; 6] = [
        Self::Front(FrontZone::LeftCorner),
        Self::Front(FrontZone::MidLeft),
        Self::Front(FrontZone::MidRight),
        Self::Front(FrontZone::RightCorner),
        Self::RearLeft,
        Self::RearRight,
    ];

    /// Classify a cell on the given side's half.
    ///
    /// Returns `None` for out-of-bounds cells and for cells on the other
    /// half.
    #[must_use]
    pub fn classify(side: PlayerSide, pos: Position) -> Option<Self> {
        if pos.half() != Some(side) {
            tracing::trace!(%pos, ?side, "Cell outside half, no region");
            return None;
        }

        let column = pos.x / REGION_SPAN;
        // Depth counts blocks away from the midline.
        let depth = match side {
            PlayerSide::Friendly => 1 - pos.y / REGION_SPAN,
            PlayerSide::Opponent => (pos.y - HALF_ARENA) / REGION_SPAN,
        };

        match (depth, column) {
            (0, 0) => Some(Self::Front(FrontZone::LeftCorner)),
            (0, 1) => Some(Self::Front(FrontZone::MidLeft)),
            (0, 2) => Some(Self::Front(FrontZone::MidRight)),
            (0, 3) => Some(Self::Front(FrontZone::RightCorner)),
            (1, 1) => Some(Self::RearLeft),
            (1, 2) => Some(Self::RearRight),
            _ => {
                tracing::debug!(%pos, ?side, "In-bounds cell outside every region");
                None
            }
        }
    }

    /// Front zone of this region, if it is one.
    #[must_use]
    pub const fn front(self) -> Option<FrontZone> {
        match self {
            Self::Front(zone) => Some(zone),
            Self::RearLeft | Self::RearRight => None,
        }
    }
}

/// Fixed-size map keyed by [`FrontZone`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneMap<T>([T; 4]);

impl<T> ZoneMap<T> {
    /// Build from values in [`FrontZone::ALL`] order.
    #[must_use]
    pub const fn new(values: [T; 4]) -> Self {
        Self(values)
    }

    /// Iterate `(zone, value)` pairs left to right.
    pub fn iter(&self) -> impl Iterator<Item = (FrontZone, &T)> {
        FrontZone::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T: Copy> ZoneMap<T> {
    /// Map with every zone set to `value`.
    #[must_use]
    pub const fn splat(value: T) -> Self {
        Self([value; 4])
    }
}

impl<T> Index<FrontZone> for ZoneMap<T> {
    type Output = T;

    fn index(&self, zone: FrontZone) -> &T {
        &self.0[zone.index()]
    }
}

impl<T> IndexMut<FrontZone> for ZoneMap<T> {
    fn index_mut(&mut self, zone: FrontZone) -> &mut T {
        &mut self.0[zone.index()]
    }
}
