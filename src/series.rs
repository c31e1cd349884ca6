use anyhow::Context;
use chrono::Utc;
use pokemon_battle_core::config::Ruleset;
use pokemon_battle_core::data::builtin;
use pokemon_battle_core::engine::BattleEngine;
use pokemon_battle_core::error::EngineError;
use pokemon_battle_core::replay::Replay;
use pokemon_battle_core::sim::ai::HeuristicBot;
use pokemon_battle_core::sim::{BattleResult, Combatant};
use pokemon_battle_core::team::{materialize_team, TeamSpec};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Both rosters of a series.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamsFile {
    pub p1: TeamSpec,
    pub p2: TeamSpec,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleRecord {
    pub seed: u64,
    pub result: BattleResult,
    pub turns: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub draws: usize,
    pub average_turns: f64,
}

impl SeriesSummary {
    pub fn from_records(records: &[BattleRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.result {
                BattleResult::P1Wins => summary.p1_wins += 1,
                BattleResult::P2Wins => summary.p2_wins += 1,
                BattleResult::Draw => summary.draws += 1,
            }
        }
        if !records.is_empty() {
            let turns: u64 = records.iter().map(|r| u64::from(r.turns)).sum();
            summary.average_turns = turns as f64 / records.len() as f64;
        }
        summary
    }

    pub fn battles(&self) -> usize {
        self.p1_wins + self.p2_wins + self.draws
    }
}

/// Seed of the `index`-th battle of a series.
pub fn battle_seed(series_seed: u64, index: usize) -> u64 {
    SmallRng::seed_from_u64(series_seed ^ ((index as u64) << 32)).gen()
}

fn materialize_both(
    teams: &TeamsFile,
    ruleset: &Ruleset,
) -> anyhow::Result<(Vec<Combatant>, Vec<Combatant>)> {
    let catalog = builtin()?;
    let p1 = materialize_team(catalog.as_ref(), &teams.p1, ruleset).context("Invalid p1 team")?;
    let p2 = materialize_team(catalog.as_ref(), &teams.p2, ruleset).context("Invalid p2 team")?;
    Ok((p1, p2))
}

/// Plays one bot-vs-bot battle to the end and hands back the finished engine.
pub fn play_battle(
    p1: &[Combatant],
    p2: &[Combatant],
    ruleset: &Ruleset,
    seed: u64,
) -> Result<BattleEngine, EngineError> {
    let mut engine = BattleEngine::new(p1.to_vec(), p2.to_vec(), ruleset.clone(), seed)?;
    let mut bot_p1 = HeuristicBot::from_ruleset(ruleset);
    let mut bot_p2 = HeuristicBot::from_ruleset(ruleset);
    let result = engine.run_to_completion(&mut bot_p1, &mut bot_p2);
    tracing::debug!(seed, ?result, turns = engine.state().turn, "battle finished");
    Ok(engine)
}

/// Plays `battles` independent battles in parallel.
pub fn run_series(
    teams: &TeamsFile,
    battles: usize,
    seed: u64,
    ruleset: &Ruleset,
) -> anyhow::Result<SeriesSummary> {
    if battles == 0 {
        anyhow::bail!("--battles must be > 0");
    }
    let (p1, p2) = materialize_both(teams, ruleset)?;
    let records = (0..battles)
        .into_par_iter()
        .map(|index| {
            let seed = battle_seed(seed, index);
            let engine = play_battle(&p1, &p2, ruleset, seed)?;
            Ok(BattleRecord {
                seed,
                result: engine.outcome().unwrap_or(BattleResult::Draw),
                turns: engine.state().turn,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    let summary = SeriesSummary::from_records(&records);
    tracing::info!(
        battles,
        p1_wins = summary.p1_wins,
        p2_wins = summary.p2_wins,
        draws = summary.draws,
        "series finished"
    );
    Ok(summary)
}

/// Replays the first battle of a series and archives it.
pub fn first_battle_replay(
    teams: &TeamsFile,
    seed: u64,
    ruleset: &Ruleset,
) -> anyhow::Result<Replay> {
    let (p1, p2) = materialize_both(teams, ruleset)?;
    let created_at = Utc::now();
    let engine = play_battle(&p1, &p2, ruleset, battle_seed(seed, 0))?;
    Ok(Replay::capture(engine.state(), [p1, p2], created_at, Some(Utc::now())))
}
