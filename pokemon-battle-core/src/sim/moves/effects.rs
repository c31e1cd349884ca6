//! Declarative move effects, applied in list order after the move connects.

use crate::data::moves::{EffectTarget, HazardScope, MoveData, MoveEffect};
use crate::data::types::Type;
use crate::events::{BattleEvent, DamageCause, HealSource};
use crate::sim::battle::{BattleState, SideId};
use crate::sim::hazards::HazardKind;
use crate::sim::stats::Stat;
use crate::sim::status::{PrimaryStatus, StatusKind, REST_SLEEP_TURNS};
use crate::sim::turn::{gain_hp, lose_hp, TurnContext};
use crate::sim::volatiles::{
    Volatile, VolatileKind, MAX_CONFUSION_TURNS, MIN_CONFUSION_TURNS, SUBSTITUTE_DIVISOR,
};
use crate::sim::weather_field::FieldCondition;
use rand::Rng;

/// What the caller still has to do once the effects ran.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EffectOutcome {
    pub force_switch: bool,
    pub self_switch: bool,
    /// A status move where no effect took hold.
    pub failed: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EffectScope {
    /// Hp the move took off the target, for drain and recoil.
    pub dealt: u16,
    /// False when the target fainted or a substitute took the hit.
    pub target_reachable: bool,
}

pub fn apply_effects(
    state: &mut BattleState,
    user: SideId,
    move_data: &MoveData,
    scope: EffectScope,
    ctx: &mut TurnContext,
) -> EffectOutcome {
    let mut outcome = EffectOutcome::default();
    let mut succeeded = false;
    for effect in &move_data.effects {
        if state.active(user).is_fainted() {
            break;
        }
        succeeded |= apply_effect(state, user, effect, scope, ctx, &mut outcome);
    }
    if move_data.is_status() && !succeeded {
        ctx.message("But it failed!");
        outcome.failed = true;
    }
    outcome
}

fn percent_of(amount: u16, percent: u8) -> u16 {
    if amount == 0 {
        return 0;
    }
    ((amount as u32 * percent as u32 / 100) as u16).max(1)
}

fn apply_effect(
    state: &mut BattleState,
    user: SideId,
    effect: &MoveEffect,
    scope: EffectScope,
    ctx: &mut TurnContext,
    outcome: &mut EffectOutcome,
) -> bool {
    let foe = user.opponent();
    match *effect {
        MoveEffect::Ailment { status, chance } => {
            if !scope.target_reachable || !ctx.chance(chance) {
                return false;
            }
            let applied = state.active_mut(foe).apply_status(status, ctx.rng);
            if applied {
                ctx.emit(BattleEvent::StatusApplied { side: foe, status });
            }
            applied
        }
        MoveEffect::Confuse { chance } => {
            if !scope.target_reachable || !ctx.chance(chance) {
                return false;
            }
            let turns = ctx.rng.gen_range(MIN_CONFUSION_TURNS..=MAX_CONFUSION_TURNS);
            start_volatile(state, foe, Volatile::Confusion { turns }, ctx)
        }
        MoveEffect::Flinch { chance } => {
            // Only a target that has yet to act can flinch.
            if !scope.target_reachable || ctx.acted[foe.index()] || !ctx.chance(chance) {
                return false;
            }
            state.active_mut(foe).volatiles.apply(Volatile::Flinch)
        }
        MoveEffect::StatChange {
            target,
            stat,
            stages,
            chance,
        } => {
            let side = match target {
                EffectTarget::User => user,
                EffectTarget::Target if scope.target_reachable => foe,
                EffectTarget::Target => return false,
            };
            if !ctx.chance(chance) {
                return false;
            }
            change_stage(state, side, stat, stages, ctx)
        }
        MoveEffect::Drain { percent } => {
            let amount = percent_of(scope.dealt, percent);
            gain_hp(state.side_mut(user), amount, ctx, |amount| BattleEvent::Heal {
                side: user,
                amount,
                source: HealSource::Drain,
            }) > 0
        }
        MoveEffect::Recoil { percent } => {
            let amount = percent_of(scope.dealt, percent);
            lose_hp(state.side_mut(user), amount, ctx, |amount| BattleEvent::Damage {
                side: user,
                amount,
                cause: DamageCause::Recoil,
                critical: false,
                effectiveness: 1.0,
            }) > 0
        }
        MoveEffect::Heal { percent } => {
            let amount = percent_of(state.active(user).max_hp(), percent);
            gain_hp(state.side_mut(user), amount, ctx, |amount| BattleEvent::Heal {
                side: user,
                amount,
                source: HealSource::Move,
            }) > 0
        }
        MoveEffect::Rest => rest(state, user, ctx),
        MoveEffect::Protect => start_volatile(state, user, Volatile::Protect, ctx),
        MoveEffect::Substitute => substitute(state, user, ctx),
        MoveEffect::LeechSeed => {
            let target = state.active(foe);
            if !scope.target_reachable
                || target.has_type(Type::Grass)
                || target.volatiles.has(VolatileKind::LeechSeed)
            {
                return false;
            }
            start_volatile(state, foe, Volatile::LeechSeed { source: user }, ctx)
        }
        MoveEffect::Taunt { turns } => {
            if !scope.target_reachable {
                return false;
            }
            start_volatile(state, foe, Volatile::Taunt { turns }, ctx)
        }
        MoveEffect::Encore { turns } => {
            let target = state.active(foe);
            let Some(move_id) = target.last_move.clone() else {
                return false;
            };
            if !scope.target_reachable || target.move_index(&move_id).is_none() {
                return false;
            }
            start_volatile(state, foe, Volatile::Encore { move_id, turns }, ctx)
        }
        MoveEffect::SetHazard { hazard } => {
            let hazards = &mut state.side_mut(foe).hazards;
            if !hazards.add(hazard) {
                return false;
            }
            let layers = match hazard {
                HazardKind::StealthRock => 1,
                HazardKind::Spikes => hazards.spikes,
                HazardKind::ToxicSpikes => hazards.toxic_spikes,
            };
            ctx.emit(BattleEvent::HazardSet {
                side: foe,
                hazard,
                layers,
            });
            true
        }
        MoveEffect::ClearHazards { scope: clear } => {
            let sides = match clear {
                HazardScope::User => vec![user],
                HazardScope::Target => vec![foe],
                HazardScope::Both => vec![user, foe],
            };
            let mut cleared = false;
            for id in sides {
                let hazards = &mut state.side_mut(id).hazards;
                if !hazards.is_empty() {
                    hazards.clear();
                    ctx.emit(BattleEvent::HazardsCleared { side: id });
                    cleared = true;
                }
            }
            cleared
        }
        MoveEffect::SetWeather { weather } => {
            let turns = state.ruleset.weather_turns;
            state.field.set_weather(weather, turns);
            ctx.emit(BattleEvent::FieldSet {
                condition: FieldCondition::Weather(weather),
                turns,
            });
            true
        }
        MoveEffect::SetTerrain { terrain } => {
            let turns = state.ruleset.terrain_turns;
            state.field.set_terrain(terrain, turns);
            ctx.emit(BattleEvent::FieldSet {
                condition: FieldCondition::Terrain(terrain),
                turns,
            });
            true
        }
        MoveEffect::ForceSwitch => {
            if state.active(foe).is_fainted() || state.side(foe).switch_candidates().is_empty() {
                return false;
            }
            outcome.force_switch = true;
            true
        }
        MoveEffect::SelfSwitch => {
            if state.side(user).switch_candidates().is_empty() {
                return false;
            }
            outcome.self_switch = true;
            true
        }
        MoveEffect::KnockOff => {
            let target = state.active_mut(foe);
            if target.is_fainted() || target.item_consumed {
                return false;
            }
            let Some(item) = target.item.clone() else {
                return false;
            };
            target.consume_item();
            ctx.message(format!("{}'s {item} was knocked off", target.species));
            ctx.emit(BattleEvent::ItemRemoved { side: foe, item });
            true
        }
    }
}

fn start_volatile(
    state: &mut BattleState,
    id: SideId,
    volatile: Volatile,
    ctx: &mut TurnContext,
) -> bool {
    let kind = volatile.kind();
    if !state.active_mut(id).volatiles.apply(volatile) {
        return false;
    }
    ctx.emit(BattleEvent::VolatileStarted {
        side: id,
        volatile: kind,
    });
    true
}

fn change_stage(
    state: &mut BattleState,
    id: SideId,
    stat: Stat,
    stages: i8,
    ctx: &mut TurnContext,
) -> bool {
    let mon = state.active_mut(id);
    let delta = mon.stages.apply(stat, stages);
    if delta == 0 {
        let direction = if stages > 0 { "higher" } else { "lower" };
        ctx.message(format!("{}'s {stat:?} won't go any {direction}", mon.species));
        return false;
    }
    ctx.emit(BattleEvent::StatChange {
        side: id,
        stat,
        delta,
        stage: mon.stages.get(stat),
    });
    true
}

fn rest(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) -> bool {
    let mon = state.active_mut(id);
    if mon.current_hp == mon.max_hp() || mon.has_status(StatusKind::Sleep) {
        return false;
    }
    if let Some(previous) = mon.status.as_ref().map(PrimaryStatus::kind) {
        ctx.emit(BattleEvent::StatusCured {
            side: id,
            status: previous,
        });
    }
    mon.status = Some(PrimaryStatus::Sleep {
        turns: REST_SLEEP_TURNS,
    });
    ctx.emit(BattleEvent::StatusApplied {
        side: id,
        status: StatusKind::Sleep,
    });
    let missing = mon.max_hp() - mon.current_hp;
    gain_hp(state.side_mut(id), missing, ctx, |amount| BattleEvent::Heal {
        side: id,
        amount,
        source: HealSource::Rest,
    });
    true
}

fn substitute(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) -> bool {
    let mon = state.active(id);
    let cost = (mon.max_hp() / SUBSTITUTE_DIVISOR).max(1);
    if mon.volatiles.has(VolatileKind::Substitute) || mon.current_hp <= cost {
        return false;
    }
    lose_hp(state.side_mut(id), cost, ctx, |amount| BattleEvent::Damage {
        side: id,
        amount,
        cause: DamageCause::Substitute,
        critical: false,
        effectiveness: 1.0,
    });
    start_volatile(state, id, Volatile::Substitute { hp: cost }, ctx)
}
