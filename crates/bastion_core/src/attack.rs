//! Mobile-unit strikes.
//!
//! One strike decision is made per round:
//!
//! - **Reactive**: we just lost health. Counter-strike from the flank that
//!   was hit if tempo is abundant, otherwise patch the hole locally.
//! - **Proactive**: nothing urgent. Score the opponent's two corners and
//!   hit the weaker one.
//!
//! Round 1 instead runs [`opening_strike`], which simulates a handful of
//! candidate launch cells against the opponent's first layout.

use crate::arena::{locations_in_range, Edge, Flank, FrontZone, PlayerSide, Position, Region};
use crate::board::{Deployment, GameBoard};
use crate::config::{AttackTuning, OpeningTuning};
use crate::damage::ZoneDamage;
use crate::math::Fixed;
use crate::telemetry::{StructureLayout, TelemetryCollector};
use crate::units::UnitKind;

/// Launch cells for a strike on one opponent corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikePoints {
    /// Armor and swarm units launch here.
    pub primary: Position,
    /// Support units launch here.
    pub support: Position,
    /// Sacrificial wall cell that redirects opponent pathing.
    pub decoy: Position,
}

impl StrikePoints {
    /// Launch cells for hitting the opponent's `target` corner.
    ///
    /// Units cross the arena diagonally, so hitting the left corner means
    /// launching from our right.
    #[must_use]
    pub const fn against(target: Flank) -> Self {
        match target {
            Flank::Left => Self {
                primary: Position::new(24, 10),
                support: Position::new(23, 9),
                decoy: Position::new(18, 12),
            },
            Flank::Right => Self {
                primary: Position::new(3, 10),
                support: Position::new(4, 9),
                decoy: Position::new(9, 12),
            },
        }
    }
}

/// Units sent in a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    /// As many swarm units as affordable.
    Swarm,
    /// Armor at the primary point, support at the support point.
    Armored {
        /// Armor units requested.
        armor: u32,
        /// Support units requested; `None` means as many as affordable.
        support: Option<u32>,
    },
}

/// Opponent corner scores used to pick a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CornerScore {
    /// Turret coverage: in-range cells of every opponent turret that land
    /// in this corner.
    pub defense: u32,
    /// Structure count in this corner.
    pub permeability: u32,
}

impl CornerScore {
    /// Combined score.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.defense + self.permeability
    }
}

/// Scores of both opponent corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CornerScores {
    /// Opponent's low-x corner.
    pub left: CornerScore,
    /// Opponent's high-x corner.
    pub right: CornerScore,
}

impl CornerScores {
    /// Corner with the lower combined score; ties go left.
    #[must_use]
    pub const fn weaker(&self) -> Flank {
        if self.left.total() <= self.right.total() {
            Flank::Left
        } else {
            Flank::Right
        }
    }

    /// Score of one corner.
    #[must_use]
    pub const fn corner(&self, flank: Flank) -> CornerScore {
        match flank {
            Flank::Left => self.left,
            Flank::Right => self.right,
        }
    }
}

/// Score the opponent's corners from their layout.
#[must_use]
pub fn score_corners(layout: &StructureLayout, turret_range: Fixed) -> CornerScores {
    let mut scores = CornerScores::default();
    for (pos, structure) in layout.iter() {
        if let Some(score) = corner_slot(&mut scores, pos) {
            score.permeability += 1;
        }
        if structure.kind == UnitKind::Turret {
            for cell in locations_in_range(pos, turret_range) {
                if let Some(score) = corner_slot(&mut scores, cell) {
                    score.defense += 1;
                }
            }
        }
    }
    scores
}

fn corner_slot(scores: &mut CornerScores, pos: Position) -> Option<&mut CornerScore> {
    match Region::classify(PlayerSide::Opponent, pos)?.front()? {
        FrontZone::LeftCorner => Some(&mut scores.left),
        FrontZone::RightCorner => Some(&mut scores.right),
        FrontZone::MidLeft | FrontZone::MidRight => None,
    }
}

/// What the attack planner did this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Counter-strike after losing health.
    Counterstrike {
        /// Zone that took the most damage.
        zone: FrontZone,
        /// Opponent corner targeted.
        target: Flank,
    },
    /// Local patch after losing health with too little tempo.
    Patched {
        /// Zone patched.
        zone: FrontZone,
    },
    /// Strike on the weaker opponent corner.
    Proactive {
        /// Opponent corner targeted.
        target: Flank,
        /// Units sent.
        composition: Composition,
    },
    /// Not enough tempo to strike.
    Idle,
}

/// Pick and execute this round's strike.
pub fn plan_attack<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    telemetry: &TelemetryCollector,
    damage: &ZoneDamage,
    tuning: &AttackTuning,
) -> AttackOutcome {
    let tempo = telemetry.friendly_resources().tempo;
    let lost = telemetry.health_lost(PlayerSide::Friendly);

    if lost >= tuning.health_loss_trigger {
        return react(deploy, damage.worst(), tempo, tuning);
    }
    if tempo < tuning.proactive_floor {
        tracing::debug!(%tempo, "Tempo below proactive floor");
        return AttackOutcome::Idle;
    }

    let scores = telemetry
        .current()
        .map(|s| score_corners(&s.opponent.layout, tuning.turret_range))
        .unwrap_or_default();
    let target = scores.weaker();
    let corner = scores.corner(target);
    let composition = if corner.defense <= tuning.low_defense
        && corner.permeability <= tuning.low_permeability
    {
        Composition::Swarm
    } else {
        armored_composition(tempo, tuning)
    };

    let points = StrikePoints::against(target);
    deploy.sacrificial_wall(points.decoy);
    launch(deploy, points, composition);

    tracing::info!(
        ?target,
        ?composition,
        left = scores.left.total(),
        right = scores.right.total(),
        "Proactive strike"
    );
    AttackOutcome::Proactive {
        target,
        composition,
    }
}

/// Turret cells tried, in order, when patching the left corner.
const CORNER_PATCH: [Position; 2] = [Position::new(0, 13), Position::new(1, 13)];

fn react<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    zone: FrontZone,
    tempo: Fixed,
    tuning: &AttackTuning,
) -> AttackOutcome {
    // The flank we were hit on faces the opponent corner on the same side.
    let target = zone.flank();

    if tempo >= tuning.abundant_tempo {
        let points = StrikePoints::against(target);
        launch(
            deploy,
            points,
            Composition::Armored {
                armor: tuning.reactive_armor,
                support: None,
            },
        );
        tracing::info!(?zone, ?target, "Counter-strike after health loss");
        return AttackOutcome::Counterstrike { zone, target };
    }

    match zone {
        FrontZone::LeftCorner | FrontZone::RightCorner => {
            let [primary, fallback] = if zone == FrontZone::LeftCorner {
                CORNER_PATCH
            } else {
                CORNER_PATCH.map(Position::mirrored)
            };
            let cell = if deploy.can_spawn(UnitKind::Turret, primary) {
                primary
            } else {
                fallback
            };
            deploy.spawn_one(UnitKind::Turret, cell);
        }
        FrontZone::MidLeft => {
            deploy.sacrificial_wall(Position::new(9, 12));
        }
        FrontZone::MidRight => {
            deploy.sacrificial_wall(Position::new(18, 12));
        }
    }
    tracing::info!(?zone, %tempo, "Patched zone after health loss");
    AttackOutcome::Patched { zone }
}

fn armored_composition(tempo: Fixed, tuning: &AttackTuning) -> Composition {
    tuning
        .schedule
        .iter()
        .find(|tier| tempo < tier.tempo_below)
        .map_or(Composition::Swarm, |tier| Composition::Armored {
            armor: tier.armor,
            support: Some(tier.support),
        })
}

fn launch<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    points: StrikePoints,
    composition: Composition,
) {
    match composition {
        Composition::Swarm => {
            deploy.spawn_affordable(UnitKind::SwarmUnit, points.primary);
        }
        Composition::Armored { armor, support } => {
            deploy.spawn(UnitKind::ArmorUnit, points.primary, armor);
            match support {
                Some(count) => deploy.spawn(UnitKind::SupportUnit, points.support, count),
                None => deploy.spawn_affordable(UnitKind::SupportUnit, points.support),
            };
        }
    }
}

/// Round-1 strike result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningOutcome {
    /// Swarm units launched from a start cell.
    Swarm {
        /// Launch cell.
        start: Position,
        /// Units accepted.
        count: u32,
    },
    /// Armor and support units launched.
    Armored {
        /// Armor launch cell.
        start: Position,
    },
    /// Nothing looked worthwhile.
    Saved,
}

const SWARM_STARTS: [Position; 4] = [
    Position::new(13, 0),
    Position::new(12, 1),
    Position::new(14, 0),
    Position::new(15, 1),
];

const ARMOR_STARTS: [(Position, Position); 4] = [
    (Position::new(3, 10), Position::new(4, 9)),
    (Position::new(13, 0), Position::new(12, 1)),
    (Position::new(24, 10), Position::new(23, 9)),
    (Position::new(14, 0), Position::new(15, 1)),
];

/// Rows this close to the midline are within reach of opponent turrets.
const EXPOSED_ROW: i32 = crate::arena::HALF_ARENA - 3;

/// Predicted losses of units walking `path` past opponent turrets.
pub(crate) fn turret_exposure(
    path: &[Position],
    opponent: &StructureLayout,
    turret_range: Fixed,
    hit: u32,
) -> i64 {
    let turrets: Vec<Position> = opponent.of_kind(UnitKind::Turret).map(|(p, _)| p).collect();
    let mut losses = 0i64;
    for &step in path.iter().filter(|s| s.y >= EXPOSED_ROW) {
        let reach = locations_in_range(step, turret_range);
        let hits = turrets.iter().filter(|t| reach.contains(t)).count() as i64;
        losses += hits * i64::from(hit);
    }
    losses
}

/// Predicted swarm losses along a path; `None` when the path is unusable.
fn swarm_losses(
    path: &[Position],
    opponent: &StructureLayout,
    tuning: &OpeningTuning,
    turret_range: Fixed,
) -> Option<i64> {
    if path.is_empty() || path.len() > tuning.max_path_len {
        return None;
    }
    Some(turret_exposure(path, opponent, turret_range, tuning.turret_hit))
}

/// Predicted structure damage of an armor walk; `None` when rejected.
fn armor_yield(path: &[Position], opponent: &StructureLayout, tuning: &OpeningTuning) -> Option<i64> {
    // Units must travel along our side before crossing.
    if path.len() < 3 || path[1].y >= EXPOSED_ROW || path[2].y >= EXPOSED_ROW {
        return None;
    }
    let mut total = 0i64;
    for &step in path {
        let covered = locations_in_range(step, tuning.armor_range)
            .into_iter()
            .filter(|c| c.half() == Some(PlayerSide::Opponent) && opponent.contains(*c))
            .count() as i64;
        total += covered * i64::from(tuning.armor_hit);
    }
    Some(total)
}

/// Probe candidate launch cells and strike if one looks profitable.
pub fn opening_strike<B: GameBoard + ?Sized>(
    deploy: &mut Deployment<'_, B>,
    opponent: &StructureLayout,
    tuning: &OpeningTuning,
    turret_range: Fixed,
) -> OpeningOutcome {
    let mut best_swarm: Option<(i64, Position)> = None;
    for start in SWARM_STARTS {
        let path = deploy.path_to_edge(start, Edge::target_from(start));
        let losses = swarm_losses(&path, opponent, tuning, turret_range);
        tracing::debug!(%start, steps = path.len(), ?losses, "Swarm candidate");
        if let Some(losses) = losses {
            if best_swarm.map_or(true, |(best, _)| losses < best) {
                best_swarm = Some((losses, start));
            }
        }
    }

    let available = deploy.affordable(UnitKind::SwarmUnit);
    if let Some((losses, start)) = best_swarm {
        let stability = i64::from(tuning.swarm_stability);
        let survivors = (i64::from(available) * stability - losses).checked_div_euclid(stability);
        if survivors.is_some_and(|n| n >= tuning.min_survivors) {
            let count = deploy.spawn(UnitKind::SwarmUnit, start, available);
            tracing::info!(%start, count, ?survivors, "Opening swarm strike");
            return OpeningOutcome::Swarm { start, count };
        }
    }

    let mut best_armor: Option<(i64, Position, Position)> = None;
    for (start, support) in ARMOR_STARTS {
        let path = deploy.path_to_edge(start, Edge::target_from(start));
        let Some(score) = armor_yield(&path, opponent, tuning) else {
            continue;
        };
        if best_armor.map_or(true, |(best, _, _)| score > best) {
            best_armor = Some((score, start, support));
        }
    }

    match best_armor {
        Some((score, start, support)) if score > 0 => {
            deploy.spawn(UnitKind::ArmorUnit, start, tuning.armor_count);
            deploy.spawn(UnitKind::SupportUnit, support, tuning.support_count);
            tracing::info!(%start, score, "Opening armor strike");
            OpeningOutcome::Armored { start }
        }
        _ => {
            tracing::info!("No profitable opening strike, saving tempo");
            OpeningOutcome::Saved
        }
    }
}
