use crate::config::Ruleset;
use crate::data::moves::{EffectTarget, HazardScope, MoveData, MoveEffect};
use crate::data::types::Type;
use crate::sim::battle::{Action, BattleState, SideId};
use crate::sim::damage::type_effectiveness;
use crate::sim::hazards::HazardKind;
use crate::sim::moves::resolve_choice;
use crate::sim::volatiles::VolatileKind;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Picks one action for `side` out of `valid_actions`. Implementations draw
/// randomness only from the rng they are handed.
pub trait BattleAI {
    fn choose_action(
        &mut self,
        state: &BattleState,
        side: SideId,
        valid_actions: &[Action],
        rng: &mut SmallRng,
    ) -> Action;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomAI;

impl BattleAI for RandomAI {
    fn choose_action(
        &mut self,
        state: &BattleState,
        side: SideId,
        valid_actions: &[Action],
        rng: &mut SmallRng,
    ) -> Action {
        valid_actions
            .choose(rng)
            .copied()
            .unwrap_or_else(|| state.fallback_action(side))
    }
}

/// Single-ply heuristic: bail out when low, otherwise use the best scoring move.
#[derive(Clone, Copy, Debug)]
pub struct HeuristicBot {
    pub switch_threshold: f64,
    pub switch_chance: f64,
}

impl Default for HeuristicBot {
    fn default() -> Self {
        Self::from_ruleset(&Ruleset::default())
    }
}

impl HeuristicBot {
    pub fn from_ruleset(ruleset: &Ruleset) -> Self {
        Self {
            switch_threshold: ruleset.bot_switch_threshold,
            switch_chance: ruleset.bot_switch_chance,
        }
    }

    /// Healthiest bench member among the offered switches.
    fn best_switch(state: &BattleState, side: SideId, valid_actions: &[Action]) -> Option<Action> {
        let roster = &state.side(side).roster;
        valid_actions
            .iter()
            .copied()
            .filter_map(|action| match action {
                Action::Switch(index) => Some((action, roster[index].hp_ratio())),
                Action::Move(_) => None,
            })
            .fold(None, |best: Option<(Action, f64)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })
            .map(|(action, _)| action)
    }
}

impl BattleAI for HeuristicBot {
    fn choose_action(
        &mut self,
        state: &BattleState,
        side: SideId,
        valid_actions: &[Action],
        rng: &mut SmallRng,
    ) -> Action {
        let active = state.active(side);
        if active.is_fainted() {
            return Self::best_switch(state, side, valid_actions)
                .unwrap_or_else(|| state.fallback_action(side));
        }
        if active.hp_ratio() < self.switch_threshold && rng.gen_bool(self.switch_chance) {
            if let Some(action) = Self::best_switch(state, side, valid_actions) {
                return action;
            }
        }

        let best = valid_actions
            .iter()
            .copied()
            .filter_map(|action| match action {
                Action::Move(index) => Some((action, score_move(state, side, index))),
                Action::Switch(_) => None,
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        // With every slot dry the pick is arbitrary; the engine struggles.
        best.map(|(action, _)| action)
            .unwrap_or_else(|| state.fallback_action(side))
    }
}

/// Move score with its tie-breakers, compared lexicographically.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct MoveScore {
    pub value: f64,
    pub accuracy: u8,
    pub priority: i8,
}

pub fn score_move(state: &BattleState, side: SideId, index: usize) -> MoveScore {
    let mon = state.active(side);
    let Some(slot) = mon.moves.get(index) else {
        return MoveScore {
            value: f64::NEG_INFINITY,
            accuracy: 0,
            priority: 0,
        };
    };
    // Encore and choice lock decide what actually comes out.
    let data = resolve_choice(state.side(side), index).data;
    let value = if slot.current_pp == 0 {
        f64::NEG_INFINITY
    } else if data.is_status() {
        status_score(state, side, &data)
    } else {
        let defender = state.active(side.opponent());
        data.power as f64 * type_effectiveness(defender, data.move_type)
    };
    MoveScore {
        value,
        // Never-miss moves rank above 100% ones.
        accuracy: data.accuracy.unwrap_or(101),
        priority: data.priority,
    }
}

const ALREADY_SET: f64 = 1.0;
const SETUP_CEILING: i8 = 2;

fn status_score(state: &BattleState, side: SideId, data: &MoveData) -> f64 {
    let mine = state.side(side);
    let foe = state.side(side.opponent());
    let target = foe.active();
    data.effects
        .iter()
        .map(|effect| match effect {
            MoveEffect::SetHazard { hazard } if foe.hazards.can_add(*hazard) => match hazard {
                HazardKind::StealthRock => 20.0,
                HazardKind::Spikes => 18.0,
                HazardKind::ToxicSpikes => 16.0,
            },
            MoveEffect::ClearHazards { scope } => {
                let worth = match scope {
                    HazardScope::User | HazardScope::Both => !mine.hazards.is_empty(),
                    HazardScope::Target => !foe.hazards.is_empty(),
                };
                if worth {
                    14.0
                } else {
                    ALREADY_SET
                }
            }
            MoveEffect::LeechSeed
                if !target.has_type(Type::Grass) && !target.volatiles.has(VolatileKind::LeechSeed) =>
            {
                12.0
            }
            MoveEffect::StatChange {
                target: EffectTarget::User,
                stat,
                stages,
                ..
            } if *stages > 0 => {
                if mine.active().stages.get(*stat) < SETUP_CEILING {
                    10.0
                } else {
                    ALREADY_SET
                }
            }
            MoveEffect::Protect => 4.0,
            MoveEffect::Ailment { .. } if target.status.is_some() => ALREADY_SET,
            MoveEffect::SetWeather { weather } if state.field.weather() == Some(*weather) => {
                ALREADY_SET
            }
            MoveEffect::SetTerrain { terrain } if state.field.terrain() == Some(*terrain) => {
                ALREADY_SET
            }
            MoveEffect::Heal { .. } | MoveEffect::Rest if mine.active().hp_ratio() >= 1.0 => {
                ALREADY_SET
            }
            MoveEffect::SetHazard { .. } | MoveEffect::LeechSeed => ALREADY_SET,
            _ => 5.0,
        })
        .fold(ALREADY_SET, f64::max)
}
