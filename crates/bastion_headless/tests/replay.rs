//! Transcript replay through files.

use std::fs;
use std::io::{BufReader, Write};

use bastion_headless::protocol::Placement;
use bastion_headless::{load_engine_config, HeadlessError, MatchRunner};

const CONFIG: &str = r#"{"unitInformation":[{"shorthand":"FF","startHealth":60,"cost1":1},{"shorthand":"EF","startHealth":30,"cost1":4},{"shorthand":"DF","startHealth":75,"cost1":3},{"shorthand":"PI","cost2":1},{"shorthand":"EI","cost2":3},{"shorthand":"SI","cost2":1},{"shorthand":"RM"}]}"#;

fn transcript() -> String {
    [
        CONFIG,
        r#"{"turnInfo":[0,0,-1],"p1Stats":[30,40,5,0],"p2Stats":[30,40,5,0],"p1Units":[[],[],[],[],[],[],[]],"p2Units":[[],[],[],[],[],[],[]]}"#,
        r#"{"turnInfo":[1,0,0],"p1Stats":[30,16,5,0],"p2Stats":[30,40,5,0],"events":{"move":[[[14,27],[14,26],[0,0],3,"90",2]],"breach":[]}}"#,
        r#"{"turnInfo":[1,0,2],"p1Stats":[30,16,5,0],"p2Stats":[30,40,5,0],"events":{"move":[[[14,26],[14,25],[0,0],3,"90",2]],"breach":[[[13,0],1,3,"77",1]]}}"#,
        r#"{"turnInfo":[0,1,-1],"p1Stats":[30,20,8,0],"p2Stats":[30,30,8,0],"p1Units":[[[0,13,60,"1"]],[],[[6,11,75,"2"]]],"p2Units":[]}"#,
        r#"{"turnInfo":[0,2,-1],"p1Stats":[30,20,8,0],"p2Stats":[30,30,8,0],"p1Units":[[[0,13,60,"1"]],[],[[6,11,75,"2"]]],"p2Units":[]}"#,
        r#"{"turnInfo":[2,2,0],"p1Stats":[30,0,0,0],"p2Stats":[0,0,0,0]}"#,
    ]
    .join("\n")
}

fn write_temp(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn test_replay_writes_two_lines_per_round() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_temp(&dir, "match.jsonl", &transcript());
    let output = dir.path().join("replies.jsonl");

    let mut runner = MatchRunner::default();
    let summary = runner
        .run(
            BufReader::new(fs::File::open(&input).unwrap()),
            fs::File::create(&output).unwrap(),
        )
        .unwrap();

    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.frames, 2);
    assert!(summary.finished);

    let replies = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = replies.lines().collect();
    assert_eq!(lines.len(), 6);

    let round_zero_build: Vec<Placement> = serde_json::from_str(lines[0]).unwrap();
    let round_zero_deploy: Vec<Placement> = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(round_zero_build[0], Placement("DF".into(), 6, 11));
    assert!(round_zero_deploy.is_empty());

    // The opening round launches mobile units only.
    let opening_deploy: Vec<Placement> = serde_json::from_str(lines[3]).unwrap();
    assert!(!opening_deploy.is_empty());
    assert!(opening_deploy.iter().all(|p| p.0 == "PI" || p.0 == "EI" || p.0 == "SI"));
}

#[test]
fn test_replay_records_incursions() {
    let mut runner = MatchRunner::default();
    runner.run(transcript().as_bytes(), std::io::sink()).unwrap();

    let log = runner.engine().session().telemetry().incursions();
    let trace = log.trace("90").expect("opponent trace");
    assert_eq!(trace.their_half.len(), 3);
    // Our own breach is not an opponent incursion.
    assert!(log.breaches().is_empty());
}

#[test]
fn test_config_file_overrides_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "tuning.ron",
        "EngineConfig(defense: DefenseTuning(alarm_damage: 12.5), attack: AttackTuning(health_loss_trigger: 3))",
    );
    let config = load_engine_config(Some(&path)).unwrap();
    assert_eq!(config.attack.health_loss_trigger, 3);
    assert_eq!(config.defense.alarm_damage, bastion_core::math::Fixed::from_num(12.5));
    assert_eq!(config.opening, bastion_core::config::OpeningTuning::default());
}

#[test]
fn test_bad_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "broken.ron", "EngineConfig(defense: [");
    assert!(matches!(
        load_engine_config(Some(&path)),
        Err(HeadlessError::Config(_))
    ));
    assert!(matches!(
        load_engine_config(Some(&dir.path().join("missing.ron"))),
        Err(HeadlessError::Io(_))
    ));
}

#[test]
fn test_zero_swarm_stability_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "zero.ron",
        "EngineConfig(opening: OpeningTuning(swarm_stability: 0))",
    );
    assert!(matches!(
        load_engine_config(Some(&path)),
        Err(HeadlessError::Engine(bastion_core::error::EngineError::InvalidConfig(_)))
    ));
}

#[test]
fn test_unknown_unit_index_is_fatal() {
    let input = [
        CONFIG,
        r#"{"turnInfo":[1,0,0],"p1Stats":[30,0,0,0],"p2Stats":[30,0,0,0],"events":{"move":[[[14,27],[14,26],[0,0],9,"5",2]]}}"#,
    ]
    .join("\n");
    let err = MatchRunner::default()
        .run(input.as_bytes(), std::io::sink())
        .unwrap_err();
    assert!(matches!(err, HeadlessError::Engine(_)));
}
