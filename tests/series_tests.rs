use pokemon_battle_arena::series::{battle_seed, first_battle_replay, run_series, TeamsFile};
use pokemon_battle_arena::{load_teams, run, CliOptions};
use pokemon_battle_core::config::Ruleset;
use pokemon_battle_core::team::{MemberSpec, TeamSpec};
use std::path::PathBuf;

fn member(species: &str, moves: &[&str]) -> MemberSpec {
    MemberSpec {
        species: species.to_string(),
        moves: moves.iter().map(|m| m.to_string()).collect(),
        ..MemberSpec::default()
    }
}

fn teams() -> TeamsFile {
    TeamsFile {
        p1: TeamSpec {
            name: Some("rain".to_string()),
            members: vec![
                member("gyarados", &["waterfall", "dragon-dance", "protect"]),
                member("jolteon", &["thunderbolt", "volt-switch", "thunder-wave"]),
            ],
        },
        p2: TeamSpec {
            name: Some("sand".to_string()),
            members: vec![
                member("tyranitar", &["crunch", "stone-edge", "stealth-rock"]),
                member("garchomp", &["earthquake", "dragon-claw", "swords-dance"]),
            ],
        },
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pokemon-battle-arena-{}-{name}", std::process::id()))
}

#[test]
fn series_counts_every_battle() {
    let summary = run_series(&teams(), 24, 7, &Ruleset::default()).expect("series runs");
    assert_eq!(summary.battles(), 24);
    assert!(summary.average_turns >= 1.0);
}

#[test]
fn series_is_deterministic_per_seed() {
    let first = run_series(&teams(), 16, 99, &Ruleset::default()).expect("series runs");
    let second = run_series(&teams(), 16, 99, &Ruleset::default()).expect("series runs");
    assert_eq!(first, second);
}

#[test]
fn battle_seeds_differ_by_index() {
    assert_ne!(battle_seed(1, 0), battle_seed(1, 1));
    assert_eq!(battle_seed(1, 5), battle_seed(1, 5));
}

#[test]
fn zero_battles_is_rejected() {
    assert!(run_series(&teams(), 0, 1, &Ruleset::default()).is_err());
}

#[test]
fn oversized_team_is_rejected() {
    let mut teams = teams();
    teams.p1.members = vec![member("pikachu", &["tackle"]); 7];
    let err = run_series(&teams, 1, 1, &Ruleset::default()).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid p1 team"));
}

#[test]
fn first_replay_reconstructs() {
    let replay = first_battle_replay(&teams(), 3, &Ruleset::default()).expect("battle runs");
    assert!(replay.meta.result.is_some());
    assert!(replay.meta.finished_at.is_some());
    let rebuilt = replay.reconstruct().expect("log is consistent");
    assert_eq!(rebuilt.result, replay.meta.result);
    assert_eq!(rebuilt.turn, replay.meta.turns);
}

#[test]
fn run_reads_files_and_writes_replay() {
    let teams_path = temp_path("teams.json");
    let replay_path = temp_path("replay.json");
    std::fs::write(&teams_path, serde_json::to_string(&teams()).expect("serializes")).expect("writable");
    let summary = run(CliOptions {
        teams_path: teams_path.clone(),
        ruleset_path: None,
        battles: 4,
        seed: 11,
        replay_path: Some(replay_path.clone()),
    })
    .expect("run succeeds");
    assert_eq!(summary.battles(), 4);
    let raw = std::fs::read_to_string(&replay_path).expect("replay written");
    assert!(raw.contains("\"event_log\""));
    std::fs::remove_file(teams_path).ok();
    std::fs::remove_file(replay_path).ok();
}

#[test]
fn missing_teams_file_reports_path() {
    let err = load_teams(&temp_path("missing.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read teams file"));
}
