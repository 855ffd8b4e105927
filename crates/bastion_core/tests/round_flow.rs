//! End-to-end rounds through the decision engine on a scripted board.

use bastion_core::arena::{Flank, FrontZone, PlayerSide, Position, ZoneMap};
use bastion_core::attack::{AttackOutcome, Composition};
use bastion_core::blueprint::SKELETON_WAVE;
use bastion_core::board::{Command, Deployment};
use bastion_core::classifier::corridor;
use bastion_core::config::{DefenseTuning, EngineConfig};
use bastion_core::counters::MazeStrike;
use bastion_core::damage::ZoneDamage;
use bastion_core::defense::{DefenseLevel, DefenseLeveler};
use bastion_core::engine::{DecisionEngine, RoundDecision, RoundPhase};
use bastion_core::error::EngineError;
use bastion_core::units::{UnitCatalog, UnitKind};
use bastion_test_utils::fixtures::{fixed, frame, opponent_move, ScriptedBoard};

fn engine() -> DecisionEngine {
    let mut engine = DecisionEngine::new(EngineConfig::default());
    engine.on_game_start(UnitCatalog::standard());
    engine
}

fn spawned_at(batch: &bastion_core::board::CommandBatch, kind: UnitKind, pos: Position) -> u32 {
    batch
        .spawns()
        .filter(|&(k, p, _)| k == kind && p == pos)
        .map(|(_, _, n)| n)
        .sum()
}

#[test]
fn test_round_zero_places_only_the_skeleton() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(0)
        .with_resources(PlayerSide::Friendly, 5, 40)
        .with_resources(PlayerSide::Opponent, 5, 40);

    let report = engine.on_turn(&mut board).expect("round 0");

    assert_eq!(report.decision, RoundDecision::Bootstrap);
    assert!(!report.batch.has_mobile_spawn());
    assert_eq!(report.batch.removals().count(), 0);

    let skeleton: Vec<(UnitKind, Position)> = SKELETON_WAVE
        .iter()
        .flat_map(|p| p.cells.iter().map(move |c| (p.kind, *c)))
        .collect();
    let placed: Vec<(UnitKind, Position)> =
        report.batch.spawns().map(|(k, p, _)| (k, p)).collect();
    assert_eq!(placed, skeleton);
    assert_eq!(board.submitted().len(), 1);
}

#[test]
fn test_health_drop_on_left_corner_counterstrikes() {
    let mut engine = engine();

    let mut quiet = ScriptedBoard::new(2)
        .with_resources(PlayerSide::Friendly, 0, 0)
        .with_structure(PlayerSide::Friendly, UnitKind::Turret, 3, 12);
    engine.on_turn(&mut quiet).expect("round 2");

    let mut hit = ScriptedBoard::new(3)
        .with_resources(PlayerSide::Friendly, 12, 0)
        .with_health(PlayerSide::Friendly, 24)
        .with_damaged(PlayerSide::Friendly, UnitKind::Turret, 3, 12, fixed(35));
    let report = engine.on_turn(&mut hit).expect("round 3");

    let RoundDecision::Adaptive { damage, attack, .. } = &report.decision else {
        panic!("expected adaptive round, got {:?}", report.decision);
    };
    assert_eq!(damage.worst(), FrontZone::LeftCorner);
    assert_eq!(
        *attack,
        AttackOutcome::Counterstrike {
            zone: FrontZone::LeftCorner,
            target: Flank::Left,
        }
    );

    let batch = &report.batch;
    assert_eq!(spawned_at(batch, UnitKind::ArmorUnit, Position::new(24, 10)), 3);
    assert_eq!(spawned_at(batch, UnitKind::SupportUnit, Position::new(23, 9)), 3);
    assert_eq!(batch.spawned(UnitKind::SwarmUnit), 0);
    // No decoy wall, so the proactive flow did not run.
    assert_eq!(batch.removals().count(), 0);
}

#[test]
fn test_small_health_drop_stays_proactive() {
    let mut engine = engine();
    let mut first = ScriptedBoard::new(2);
    engine.on_turn(&mut first).expect("round 2");

    let mut second = ScriptedBoard::new(3)
        .with_resources(PlayerSide::Friendly, 8, 2)
        .with_health(PlayerSide::Friendly, 26);
    let report = engine.on_turn(&mut second).expect("round 3");

    let RoundDecision::Adaptive { attack, .. } = report.decision else {
        panic!("expected adaptive round");
    };
    assert!(matches!(attack, AttackOutcome::Proactive { .. }));
}

#[test]
fn test_empty_opponent_gets_a_left_swarm() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(2).with_resources(PlayerSide::Friendly, 8, 5);

    let report = engine.on_turn(&mut board).expect("round 2");

    let RoundDecision::Adaptive { attack, .. } = report.decision else {
        panic!("expected adaptive round");
    };
    assert_eq!(
        attack,
        AttackOutcome::Proactive {
            target: Flank::Left,
            composition: Composition::Swarm,
        }
    );

    let decoy = Position::new(18, 12);
    let commands = &report.batch.commands;
    assert_eq!(
        commands[..2],
        [
            Command::Spawn {
                kind: UnitKind::Wall,
                pos: decoy,
                count: 1,
            },
            Command::Remove { pos: decoy },
        ]
    );
    assert_eq!(spawned_at(&report.batch, UnitKind::SwarmUnit, Position::new(24, 10)), 8);
    assert!(board.removal_pending(decoy));
}

#[test]
fn test_right_funnel_triggers_funnel_response() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(2).with_resources(PlayerSide::Friendly, 12, 30);
    for cell in corridor(Flank::Right) {
        board = board.with_structure(PlayerSide::Opponent, UnitKind::Wall, cell.x, cell.y);
    }

    let report = engine.on_turn(&mut board).expect("round 2");

    let verdicts = engine.session().last_verdicts().expect("verdicts");
    assert_eq!(verdicts.funnel.side, Some(Flank::Right));
    assert_eq!(verdicts.funnel.right_count, 13);

    let RoundDecision::Countered { funnel, maze } = report.decision else {
        panic!("expected counter round");
    };
    assert!(maze.is_none());
    let funnel = funnel.expect("funnel report");
    assert!(funnel.channel_clear);
    assert!(funnel.struck);
    assert_eq!(spawned_at(&report.batch, UnitKind::Turret, Position::new(27, 13)), 1);
    assert!(spawned_at(&report.batch, UnitKind::SwarmUnit, Position::new(13, 0)) > 0);
}

#[test]
fn test_funnel_channel_is_cleared_before_striking() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(2)
        .with_resources(PlayerSide::Friendly, 12, 30)
        .with_structure(PlayerSide::Friendly, UnitKind::Wall, 2, 12);
    for cell in corridor(Flank::Left) {
        board = board.with_structure(PlayerSide::Opponent, UnitKind::Wall, cell.x, cell.y);
    }

    let report = engine.on_turn(&mut board).expect("round 2");

    let RoundDecision::Countered { funnel, .. } = report.decision else {
        panic!("expected counter round");
    };
    let funnel = funnel.expect("funnel report");
    assert!(!funnel.channel_clear);
    assert!(!funnel.struck);
    assert!(board.removal_pending(Position::new(2, 12)));
    assert_eq!(report.batch.spawned(UnitKind::SwarmUnit), 0);
}

#[test]
fn test_maze_wall_gets_guarded_and_struck() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(2).with_resources(PlayerSide::Friendly, 12, 10);
    for x in 3..=24 {
        board = board.with_structure(PlayerSide::Opponent, UnitKind::Wall, x, 15);
    }

    let report = engine.on_turn(&mut board).expect("round 2");

    let RoundDecision::Countered { funnel, maze } = report.decision else {
        panic!("expected counter round");
    };
    assert!(funnel.is_none());
    let maze = maze.expect("maze report");
    assert_eq!(maze.target, Flank::Left);
    assert_eq!(maze.defense_columns, vec![2, 25]);
    assert_eq!(maze.threat_paths, (0, 0));
    assert_eq!(maze.strike, MazeStrike::Swarm);
    assert_eq!(spawned_at(&report.batch, UnitKind::Turret, Position::new(2, 13)), 1);
    assert_eq!(spawned_at(&report.batch, UnitKind::Turret, Position::new(25, 13)), 1);
    assert_eq!(spawned_at(&report.batch, UnitKind::SwarmUnit, Position::new(14, 0)), 12);
}

#[test]
fn test_maze_strike_waits_for_reserve() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(40).with_resources(PlayerSide::Friendly, 12, 10);
    for x in 3..=24 {
        board = board.with_structure(PlayerSide::Opponent, UnitKind::Wall, x, 15);
    }

    let report = engine.on_turn(&mut board).expect("round 40");

    let RoundDecision::Countered { maze, .. } = report.decision else {
        panic!("expected counter round");
    };
    // Reserve is 10 + 40 / 10 = 14.
    assert_eq!(maze.expect("maze report").strike, MazeStrike::Saving);
    assert!(!report.batch.has_mobile_spawn());
}

#[test]
fn test_opening_round_probes_and_strikes() {
    let mut engine = engine();
    let mut board = ScriptedBoard::new(1).with_resources(PlayerSide::Friendly, 8, 0);

    let report = engine.on_turn(&mut board).expect("round 1");

    assert_eq!(engine.session().phase(), RoundPhase::OpeningStrike);
    let RoundDecision::Opening(outcome) = report.decision else {
        panic!("expected opening round");
    };
    assert!(matches!(
        outcome,
        bastion_core::attack::OpeningOutcome::Swarm { count: 8, .. }
    ));
    assert_eq!(report.batch.spawned(UnitKind::SwarmUnit), 8);
}

#[test]
fn test_levels_only_climb_across_rounds() {
    let mut engine = engine();
    let mut history = Vec::new();
    for turn in 2..8 {
        // Every round the left-corner turret is found badly damaged again.
        let mut board = ScriptedBoard::new(turn)
            .with_resources(PlayerSide::Friendly, 0, 30)
            .with_damaged(
                PlayerSide::Friendly,
                UnitKind::Turret,
                3,
                12,
                fixed(if turn % 2 == 0 { 75 } else { 10 }),
            );
        engine.on_turn(&mut board).expect("round");
        history.push(engine.session().leveler().level(FrontZone::LeftCorner));
    }
    assert!(history.windows(2).all(|w| w[0] <= w[1]));
    assert!(history
        .windows(2)
        .all(|w| w[1].tier() - w[0].tier() <= 1));
    assert_eq!(history.first(), Some(&DefenseLevel::Base));
    assert!(*history.last().expect("levels") > DefenseLevel::Base);
}

#[test]
fn test_round_index_cannot_go_back() {
    let mut engine = engine();
    engine
        .on_turn(&mut ScriptedBoard::new(5))
        .expect("round 5");
    let err = engine
        .on_turn(&mut ScriptedBoard::new(4))
        .expect_err("regression");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[test]
fn test_action_frames_feed_the_session() {
    let mut engine = engine();
    engine.on_turn(&mut ScriptedBoard::new(2)).expect("round 2");
    engine
        .on_action_frame(&frame(
            0,
            vec![opponent_move("11", UnitKind::SwarmUnit, (14, 27), (14, 26))],
        ))
        .expect("frame");

    let log = engine.session().telemetry().incursions();
    assert_eq!(log.launch_history(), &[Position::new(14, 27)]);
    assert!(log.trace("11").is_some());
}

#[test]
fn test_structure_index_in_move_event_is_fatal() {
    let mut engine = engine();
    let mut bad = opponent_move("3", UnitKind::SwarmUnit, (14, 27), (14, 26));
    bad.unit_index = UnitKind::Turret.index();
    let err = engine
        .on_action_frame(&frame(0, vec![bad]))
        .expect_err("non-mobile index");
    assert!(matches!(err, EngineError::NotMobile { .. }));
}

fn zone_damage(hits: &[(FrontZone, i32)]) -> ZoneDamage {
    let mut means = ZoneMap::splat(fixed(0));
    for &(zone, mean) in hits {
        means[zone] = fixed(mean);
    }
    ZoneDamage::from_means(means)
}

#[test]
fn test_leveler_saves_when_turrets_run_out() {
    let mut board = ScriptedBoard::new(6).with_resources(PlayerSide::Friendly, 0, 3);
    let mut leveler = DefenseLeveler::new();
    let mut deploy = Deployment::new(&mut board);

    let report = leveler.apply(
        &mut deploy,
        &zone_damage(&[(FrontZone::MidLeft, 20)]),
        &DefenseTuning::default(),
    );
    let batch = deploy.submit();

    assert!(report.saving);
    assert_eq!(report.escalated, vec![FrontZone::MidLeft]);
    assert_eq!(leveler.level(FrontZone::MidLeft), DefenseLevel::Reinforced);
    // The only affordable turret went to the zone skeleton; no walls follow.
    assert_eq!(spawned_at(&batch, UnitKind::Turret, Position::new(10, 9)), 1);
    assert_eq!(batch.spawned(UnitKind::Wall), 0);
    assert_eq!(batch.commands.len(), 1);
}

#[test]
fn test_leveler_stops_at_first_quiet_zone() {
    let mut board = ScriptedBoard::new(6).with_resources(PlayerSide::Friendly, 0, 100);
    let mut leveler = DefenseLeveler::new();
    let mut deploy = Deployment::new(&mut board);

    let report = leveler.apply(
        &mut deploy,
        &zone_damage(&[(FrontZone::LeftCorner, 15), (FrontZone::RightCorner, 5)]),
        &DefenseTuning::default(),
    );
    let batch = deploy.submit();

    assert!(!report.saving);
    assert_eq!(report.escalated, vec![FrontZone::LeftCorner]);
    assert_eq!(leveler.level(FrontZone::RightCorner), DefenseLevel::Base);
    assert_eq!(spawned_at(&batch, UnitKind::Turret, Position::new(1, 12)), 1);
    assert_eq!(spawned_at(&batch, UnitKind::Wall, Position::new(5, 12)), 1);
    // The static layout is topped up afterwards.
    assert_eq!(spawned_at(&batch, UnitKind::Wall, Position::new(7, 11)), 1);
}

#[test]
fn test_capped_zone_leaves_the_blueprint_alone() {
    let mut leveler = DefenseLeveler::new();
    let hit = zone_damage(&[(FrontZone::LeftCorner, 20)]);
    for round in 0..3 {
        let mut rich = ScriptedBoard::new(round).with_resources(PlayerSide::Friendly, 0, 500);
        let mut deploy = Deployment::new(&mut rich);
        leveler.apply(&mut deploy, &hit, &DefenseTuning::default());
    }
    assert_eq!(leveler.level(FrontZone::LeftCorner), DefenseLevel::Citadel);

    // Walls are affordable, turrets are not.
    let mut board = ScriptedBoard::new(3).with_resources(PlayerSide::Friendly, 0, 2);
    let mut deploy = Deployment::new(&mut board);
    let report = leveler.apply(&mut deploy, &hit, &DefenseTuning::default());
    let batch = deploy.submit();

    assert!(!report.saving);
    assert!(report.escalated.is_empty());
    assert_eq!(leveler.level(FrontZone::LeftCorner), DefenseLevel::Citadel);
    assert_eq!(batch.spawned(UnitKind::Wall), 2);
    assert_eq!(spawned_at(&batch, UnitKind::Wall, Position::new(0, 13)), 1);
    assert_eq!(spawned_at(&batch, UnitKind::Wall, Position::new(1, 13)), 1);
}

#[test]
fn test_leveler_saves_even_when_addon_cell_is_taken() {
    let mut board = ScriptedBoard::new(6)
        .with_resources(PlayerSide::Friendly, 0, 0)
        .with_structure(PlayerSide::Friendly, UnitKind::Turret, 6, 10);
    let mut leveler = DefenseLeveler::new();
    let mut deploy = Deployment::new(&mut board);

    let report = leveler.apply(
        &mut deploy,
        &zone_damage(&[(FrontZone::MidLeft, 20)]),
        &DefenseTuning::default(),
    );
    let batch = deploy.submit();

    assert!(report.saving);
    assert!(batch.commands.is_empty());
}
