//! Closed unit-kind enumeration and the per-match unit catalog.
//!
//! The engine identifies unit kinds by short codes and by their index in
//! the game-start unit table. Both are resolved exactly once into
//! [`UnitKind`] through a [`UnitCatalog`]; nothing downstream ever looks at
//! a short code or a raw index again.
//!
//! # Example
//!
//! ```
//! use bastion_core::units::{UnitCatalog, UnitKind};
//!
//! let catalog = UnitCatalog::standard();
//! assert_eq!(catalog.kind_at(2).unwrap(), UnitKind::Turret);
//! assert_eq!(catalog.shorthand(UnitKind::Wall), "FF");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::math::{int, Fixed};

/// Every unit kind the engine can field.
///
/// Declaration order matches the engine's unit table order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Cheap blocking structure.
    Wall,
    /// Structure that shields friendly mobile units passing nearby.
    Shield,
    /// Structure that fires on opposing mobile units in range.
    Turret,
    /// Fast, fragile mobile unit that scores breaches.
    SwarmUnit,
    /// Slow, long-range mobile unit that demolishes structures.
    ArmorUnit,
    /// Mobile unit that intercepts opposing mobile units.
    SupportUnit,
}

impl UnitKind {
    /// All kinds, in unit-table order.
    pub const ALL: [Self; 6] = [
        Self::Wall,
        Self::Shield,
        Self::Turret,
        Self::SwarmUnit,
        Self::ArmorUnit,
        Self::SupportUnit,
    ];

    /// Stationary kinds, in unit-table order.
    pub const STRUCTURES: [Self; 3] = [Self::Wall, Self::Shield, Self::Turret];

    /// Position of this kind in the engine's unit table.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Wall => 0,
            Self::Shield => 1,
            Self::Turret => 2,
            Self::SwarmUnit => 3,
            Self::ArmorUnit => 4,
            Self::SupportUnit => 5,
        }
    }

    /// Kind at a unit-table index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Wall),
            1 => Some(Self::Shield),
            2 => Some(Self::Turret),
            3 => Some(Self::SwarmUnit),
            4 => Some(Self::ArmorUnit),
            5 => Some(Self::SupportUnit),
            _ => None,
        }
    }

    /// Whether this kind is a stationary structure.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(self, Self::Wall | Self::Shield | Self::Turret)
    }

    /// Whether this kind is a mobile unit.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        !self.is_structure()
    }

    /// Stable lowercase name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Shield => "shield",
            Self::Turret => "turret",
            Self::SwarmUnit => "swarm",
            Self::ArmorUnit => "armor",
            Self::SupportUnit => "support",
        }
    }

    /// Stability a freshly placed unit of this kind starts with.
    #[must_use]
    pub const fn default_base_stability(self) -> Fixed {
        match self {
            Self::Wall => int(60),
            Self::Shield => int(30),
            Self::Turret => int(75),
            Self::SwarmUnit => int(15),
            Self::ArmorUnit => int(5),
            Self::SupportUnit => int(40),
        }
    }

    /// Frames a mobile unit spends per grid step.
    ///
    /// Structures never move and report zero.
    #[must_use]
    pub const fn frames_per_step(self) -> u32 {
        match self {
            Self::SwarmUnit => 2,
            Self::ArmorUnit | Self::SupportUnit => 4,
            Self::Wall | Self::Shield | Self::Turret => 0,
        }
    }

    /// Default engine short code.
    #[must_use]
    pub const fn default_shorthand(self) -> &'static str {
        match self {
            Self::Wall => "FF",
            Self::Shield => "EF",
            Self::Turret => "DF",
            Self::SwarmUnit => "PI",
            Self::ArmorUnit => "EI",
            Self::SupportUnit => "SI",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the engine's game-start unit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTableEntry {
    /// Short code the engine uses for this row.
    pub shorthand: String,
    /// Starting stability, if the engine publishes one.
    pub stability: Option<Fixed>,
}

impl UnitTableEntry {
    /// Entry with only a short code.
    #[must_use]
    pub fn code(shorthand: impl Into<String>) -> Self {
        Self {
            shorthand: shorthand.into(),
            stability: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UnitSpec {
    shorthand: String,
    base_stability: Fixed,
}

/// Short-code and stability lookup resolved once per match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCatalog {
    specs: Vec<UnitSpec>,
    removal_code: String,
}

/// Short code of the engine's removal pseudo-unit when none is published.
pub const DEFAULT_REMOVAL_CODE: &str = "RM";

impl UnitCatalog {
    /// Catalog with the engine's default codes and stabilities.
    #[must_use]
    pub fn standard() -> Self {
        let specs = UnitKind::ALL
            .iter()
            .map(|kind| UnitSpec {
                shorthand: kind.default_shorthand().to_string(),
                base_stability: kind.default_base_stability(),
            })
            .collect();
        Self {
            specs,
            removal_code: DEFAULT_REMOVAL_CODE.to_string(),
        }
    }

    /// Resolve the engine's ordered unit table.
    ///
    /// The first six rows map onto [`UnitKind::ALL`]; an optional seventh
    /// row names the removal pseudo-unit.
    pub fn from_table(entries: &[UnitTableEntry]) -> Result<Self> {
        let expected = UnitKind::ALL.len();
        if entries.len() < expected {
            return Err(EngineError::UnitTableTooShort {
                expected,
                found: entries.len(),
            });
        }

        let mut specs: Vec<UnitSpec> = Vec::with_capacity(expected);
        for (kind, entry) in UnitKind::ALL.iter().zip(entries) {
            if specs.iter().any(|s| s.shorthand == entry.shorthand) {
                return Err(EngineError::DuplicateShortCode(entry.shorthand.clone()));
            }
            specs.push(UnitSpec {
                shorthand: entry.shorthand.clone(),
                base_stability: entry
                    .stability
                    .unwrap_or_else(|| kind.default_base_stability()),
            });
        }

        let removal_code = entries
            .get(expected)
            .map_or_else(|| DEFAULT_REMOVAL_CODE.to_string(), |e| e.shorthand.clone());

        tracing::debug!(
            codes = ?specs.iter().map(|s| s.shorthand.as_str()).collect::<Vec<_>>(),
            removal = %removal_code,
            "Resolved unit catalog"
        );

        Ok(Self {
            specs,
            removal_code,
        })
    }

    /// Kind at a raw unit-table index.
    pub fn kind_at(&self, index: u8) -> Result<UnitKind> {
        UnitKind::from_index(index).ok_or(EngineError::UnknownUnitIndex(index))
    }

    /// Kind at a raw unit-table index, which must be mobile.
    pub fn mobile_kind_at(&self, index: u8) -> Result<UnitKind> {
        let kind = self.kind_at(index)?;
        if kind.is_mobile() {
            Ok(kind)
        } else {
            Err(EngineError::NotMobile {
                index,
                kind: kind.name(),
            })
        }
    }

    /// Kind for an engine short code.
    pub fn kind_for_code(&self, code: &str) -> Result<UnitKind> {
        self.specs
            .iter()
            .position(|s| s.shorthand == code)
            .and_then(|i| UnitKind::from_index(i as u8))
            .ok_or_else(|| EngineError::UnknownShortCode(code.to_string()))
    }

    /// Engine short code for a kind.
    #[must_use]
    pub fn shorthand(&self, kind: UnitKind) -> &str {
        &self.specs[kind.index() as usize].shorthand
    }

    /// Starting stability for a kind.
    #[must_use]
    pub fn base_stability(&self, kind: UnitKind) -> Fixed {
        self.specs[kind.index() as usize].base_stability
    }

    /// Short code of the removal pseudo-unit.
    #[must_use]
    pub fn removal_code(&self) -> &str {
        &self.removal_code
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
