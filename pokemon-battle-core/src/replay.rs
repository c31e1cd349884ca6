//! Archived battles and their reconstruction from the event log.

use crate::config::Ruleset;
use crate::error::ReplayError;
use crate::events::{BattleEvent, EventLog};
use crate::sim::battle::{BattleResult, BattleState, SideId};
use crate::sim::combatant::Combatant;
use crate::sim::hazards::{HazardKind, SideHazards};
use crate::sim::status::{PrimaryStatus, StatusKind, MAX_SLEEP_TURNS};
use crate::sim::weather_field::{FieldCondition, Terrain, Weather};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayMeta {
    pub winner: Option<SideId>,
    pub result: Option<BattleResult>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub turns: u32,
    pub ruleset: Ruleset,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub meta: ReplayMeta,
    /// Rosters exactly as they were before the leads were sent out.
    pub initial_teams: [Vec<Combatant>; 2],
    pub event_log: EventLog,
}

/// One side as rebuilt from a replay.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplaySide {
    pub roster: Vec<Combatant>,
    pub active: usize,
    pub hazards: SideHazards,
}

impl ReplaySide {
    pub fn active(&self) -> &Combatant {
        &self.roster[self.active]
    }

    fn roster_active_mut(&mut self) -> &mut Combatant {
        &mut self.roster[self.active]
    }
}

/// Battle state as far as the event log describes it. Status counters and
/// field durations are not part of the log and carry starting values.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedBattle {
    pub sides: [ReplaySide; 2],
    pub turn: u32,
    pub weather: Option<Weather>,
    pub terrain: Option<Terrain>,
    pub result: Option<BattleResult>,
}

impl ReconstructedBattle {
    pub fn side(&self, id: SideId) -> &ReplaySide {
        &self.sides[id.index()]
    }
}

impl Replay {
    /// Archives `state`; `initial_teams` must be the rosters it started from.
    pub fn capture(
        state: &BattleState,
        initial_teams: [Vec<Combatant>; 2],
        created_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            meta: ReplayMeta {
                winner: state.winner,
                result: state.result,
                created_at,
                finished_at,
                turns: state.turn,
                ruleset: state.ruleset.clone(),
            },
            initial_teams,
            event_log: state.log.clone(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize replay")
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("Failed to parse replay JSON")
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write replay to {}", path.display()))
    }

    /// Replays every event in order against the initial teams.
    pub fn reconstruct(&self) -> Result<ReconstructedBattle, ReplayError> {
        let [p1, p2] = self.initial_teams.clone();
        let side = |roster| ReplaySide {
            roster,
            active: 0,
            hazards: SideHazards::default(),
        };
        let mut battle = ReconstructedBattle {
            sides: [side(p1), side(p2)],
            turn: 0,
            weather: None,
            terrain: None,
            result: None,
        };
        for (index, event) in self.event_log.as_slice().iter().enumerate() {
            apply_event(&mut battle, index, event)?;
        }
        Ok(battle)
    }
}

fn status_from_kind(kind: StatusKind) -> PrimaryStatus {
    match kind {
        StatusKind::Burn => PrimaryStatus::Burn,
        StatusKind::Poison => PrimaryStatus::Poison,
        StatusKind::Toxic => PrimaryStatus::Toxic { counter: 1 },
        StatusKind::Paralysis => PrimaryStatus::Paralysis,
        StatusKind::Sleep => PrimaryStatus::Sleep {
            turns: MAX_SLEEP_TURNS,
        },
        StatusKind::Freeze => PrimaryStatus::Freeze,
    }
}

fn diverged(index: usize, detail: String) -> ReplayError {
    ReplayError::Diverged { index, detail }
}

fn lose(battle: &mut ReconstructedBattle, index: usize, side: SideId, amount: u16) -> Result<(), ReplayError> {
    let mon = battle.sides[side.index()].roster_active_mut();
    if amount > mon.current_hp {
        return Err(diverged(
            index,
            format!("{} lost {amount} hp with {} left", mon.species, mon.current_hp),
        ));
    }
    mon.take_damage(amount);
    Ok(())
}

fn gain(battle: &mut ReconstructedBattle, index: usize, side: SideId, amount: u16) -> Result<(), ReplayError> {
    let mon = battle.sides[side.index()].roster_active_mut();
    if mon.is_fainted()
        || mon
            .current_hp
            .checked_add(amount)
            .map_or(true, |hp| hp > mon.max_hp())
    {
        return Err(diverged(
            index,
            format!("{} cannot heal {amount} hp from {}", mon.species, mon.current_hp),
        ));
    }
    mon.heal(amount);
    Ok(())
}

fn apply_event(battle: &mut ReconstructedBattle, index: usize, event: &BattleEvent) -> Result<(), ReplayError> {
    match event {
        BattleEvent::SwitchOk {
            side,
            index: slot,
            species,
        } => {
            let team = &mut battle.sides[side.index()];
            let Some(incoming) = team.roster.get(*slot) else {
                return Err(ReplayError::UnknownSlot {
                    index,
                    side: *side,
                    slot: *slot,
                });
            };
            if &incoming.species != species {
                return Err(diverged(index, format!("slot {slot} holds {}, not {species}", incoming.species)));
            }
            team.roster_active_mut().reset_on_switch();
            team.active = *slot;
        }
        BattleEvent::MoveMade { side, move_id } => {
            let mon = battle.sides[side.index()].roster_active_mut();
            // Struggle is not in the moveset and spends no PP.
            if let Some(slot) = mon.move_index(move_id) {
                let slot = &mut mon.moves[slot];
                slot.current_pp = slot.current_pp.saturating_sub(1);
            }
        }
        BattleEvent::Damage { side, amount, .. }
        | BattleEvent::StatusTick { side, amount, .. }
        | BattleEvent::WeatherChip { side, amount, .. }
        | BattleEvent::Hazard { side, amount, .. } => lose(battle, index, *side, *amount)?,
        BattleEvent::Heal { side, amount, .. } | BattleEvent::ItemHeal { side, amount, .. } => {
            gain(battle, index, *side, *amount)?
        }
        BattleEvent::StatusApplied { side, status } => {
            battle.sides[side.index()].roster_active_mut().status = Some(status_from_kind(*status));
        }
        BattleEvent::StatusCured { side, .. } => {
            battle.sides[side.index()].roster_active_mut().status = None;
        }
        BattleEvent::StatChange { side, stat, delta, stage } => {
            let mon = battle.sides[side.index()].roster_active_mut();
            mon.stages.apply(*stat, *delta);
            if mon.stages.get(*stat) != *stage {
                return Err(diverged(index, format!("{} {stat:?} stage is not {stage}", mon.species)));
            }
        }
        BattleEvent::ItemRemoved { side, .. } => {
            battle.sides[side.index()].roster_active_mut().consume_item();
        }
        BattleEvent::HazardSet { side, hazard, layers } => {
            let hazards = &mut battle.sides[side.index()].hazards;
            match hazard {
                HazardKind::StealthRock => hazards.stealth_rock = true,
                HazardKind::Spikes => hazards.spikes = *layers,
                HazardKind::ToxicSpikes => hazards.toxic_spikes = *layers,
            }
        }
        BattleEvent::HazardsCleared { side } => battle.sides[side.index()].hazards.clear(),
        BattleEvent::HazardRemoved { side, hazard } => {
            let hazards = &mut battle.sides[side.index()].hazards;
            match hazard {
                HazardKind::StealthRock => hazards.stealth_rock = false,
                HazardKind::Spikes => hazards.spikes = 0,
                HazardKind::ToxicSpikes => hazards.toxic_spikes = 0,
            }
        }
        BattleEvent::FieldSet { condition, .. } => match condition {
            FieldCondition::Weather(kind) => battle.weather = Some(*kind),
            FieldCondition::Terrain(kind) => battle.terrain = Some(*kind),
        },
        BattleEvent::FieldEnded { condition } => match condition {
            FieldCondition::Weather(_) => battle.weather = None,
            FieldCondition::Terrain(_) => battle.terrain = None,
        },
        BattleEvent::PokemonFainted { side, index: slot, .. } => {
            let team = &battle.sides[side.index()];
            match team.roster.get(*slot) {
                None => {
                    return Err(ReplayError::UnknownSlot {
                        index,
                        side: *side,
                        slot: *slot,
                    })
                }
                Some(mon) if !mon.is_fainted() => {
                    return Err(diverged(index, format!("{} still has {} hp", mon.species, mon.current_hp)));
                }
                Some(_) => {}
            }
        }
        BattleEvent::TurnEnd { turn } => battle.turn = *turn,
        BattleEvent::BattleEnd { result, .. } => battle.result = Some(*result),
        BattleEvent::Miss { .. }
        | BattleEvent::SubstituteHit { .. }
        | BattleEvent::VolatileStarted { .. }
        | BattleEvent::VolatileEnded { .. }
        | BattleEvent::Message { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BattleEngine;
    use crate::events::HealSource;
    use crate::sim::ai::HeuristicBot;
    use crate::sim::combatant::tests::make_combatant;

    fn finished_replay(seed: u64) -> (BattleEngine, Replay) {
        let p1 = vec![
            make_combatant("ferrothorn", &["stealth-rock", "leech-seed", "iron-head"]),
            make_combatant("charizard", &["flamethrower", "air-slash"]),
        ];
        let p2 = vec![
            make_combatant("toxapex", &["toxic", "toxic-spikes", "sludge-bomb"]),
            make_combatant("tyranitar", &["sandstorm", "crunch", "stone-edge"]),
        ];
        let initial_teams = [p1.clone(), p2.clone()];
        let mut engine = BattleEngine::new(p1, p2, Ruleset::default(), seed).expect("valid rosters");
        engine.run_to_completion(&mut HeuristicBot::default(), &mut HeuristicBot::default());
        let replay = Replay::capture(engine.state(), initial_teams, Utc::now(), Some(Utc::now()));
        (engine, replay)
    }

    #[test]
    fn reconstruction_matches_the_live_battle() {
        for seed in [3, 11, 29] {
            let (engine, replay) = finished_replay(seed);
            let rebuilt = replay.reconstruct().expect("log is consistent");
            let live = engine.state();
            assert_eq!(rebuilt.result, live.result);
            assert_eq!(rebuilt.turn, live.turn);
            assert_eq!(rebuilt.weather, live.field.weather());
            assert_eq!(rebuilt.terrain, live.field.terrain());
            for id in SideId::ALL {
                let (ours, theirs) = (rebuilt.side(id), live.side(id));
                assert_eq!(ours.active, theirs.active, "seed {seed}");
                assert_eq!(ours.hazards, theirs.hazards, "seed {seed}");
                for (a, b) in ours.roster.iter().zip(&theirs.roster) {
                    assert_eq!(a.current_hp, b.current_hp, "seed {seed}: {}", a.species);
                    assert_eq!(a.fainted, b.fainted);
                    assert_eq!(
                        a.status.as_ref().map(PrimaryStatus::kind),
                        b.status.as_ref().map(PrimaryStatus::kind)
                    );
                    assert_eq!(a.item_consumed, b.item_consumed);
                    let pp = |mon: &Combatant| mon.moves.iter().map(|m| m.current_pp).collect::<Vec<_>>();
                    assert_eq!(pp(a), pp(b));
                }
            }
        }
    }

    #[test]
    fn json_round_trip_keeps_the_log() {
        let (_, replay) = finished_replay(5);
        let parsed = Replay::from_json_str(&replay.to_json().expect("serializable")).expect("parses");
        assert_eq!(parsed.event_log, replay.event_log);
        assert_eq!(parsed.meta.turns, replay.meta.turns);
    }

    #[test]
    fn tampered_log_is_rejected() {
        let (_, mut replay) = finished_replay(7);
        let mut events = replay.event_log.as_slice().to_vec();
        events.insert(
            2,
            BattleEvent::PokemonFainted {
                side: SideId::P1,
                index: 0,
                species: "Ferrothorn".to_string(),
            },
        );
        replay.event_log = EventLog::new();
        replay.event_log.extend(events);
        assert!(matches!(
            replay.reconstruct(),
            Err(ReplayError::Diverged { index: 2, .. })
        ));
    }

    #[test]
    fn oversized_heal_is_rejected() {
        let (_, mut replay) = finished_replay(3);
        let mut events = replay.event_log.as_slice()[..2].to_vec();
        events.push(BattleEvent::Heal {
            side: SideId::P1,
            amount: u16::MAX,
            source: HealSource::Move,
        });
        replay.event_log = EventLog::new();
        replay.event_log.extend(events);
        assert!(matches!(
            replay.reconstruct(),
            Err(ReplayError::Diverged { index: 2, .. })
        ));
    }
}
