pub mod series;

use crate::series::{first_battle_replay, run_series, TeamsFile};
use anyhow::Context;
use pokemon_battle_core::config::Ruleset;
use std::path::{Path, PathBuf};

pub use crate::series::SeriesSummary;

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub teams_path: PathBuf,
    pub ruleset_path: Option<PathBuf>,
    pub battles: usize,
    pub seed: u64,
    pub replay_path: Option<PathBuf>,
}

pub fn load_teams(path: &Path) -> anyhow::Result<TeamsFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read teams file at {}", path.display()))?;
    let parsed: TeamsFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(parsed)
}

pub fn run(opts: CliOptions) -> anyhow::Result<SeriesSummary> {
    let teams = load_teams(&opts.teams_path)?;
    let ruleset = match &opts.ruleset_path {
        Some(path) => Ruleset::load(path)?,
        None => Ruleset::default(),
    };
    let summary = run_series(&teams, opts.battles, opts.seed, &ruleset)?;
    println!(
        "{} battles: p1 {} / p2 {} / draws {} (avg {:.1} turns)",
        summary.battles(),
        summary.p1_wins,
        summary.p2_wins,
        summary.draws,
        summary.average_turns
    );
    if let Some(path) = &opts.replay_path {
        first_battle_replay(&teams, opts.seed, &ruleset)?.save(path)?;
        println!("Wrote replay of battle 1 to {}", path.display());
    }
    Ok(summary)
}
