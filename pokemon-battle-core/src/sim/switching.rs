use crate::events::BattleEvent;
use crate::sim::abilities::Ability;
use crate::sim::battle::{BattleState, SideId};
use crate::sim::hazards::{
    spikes_damage, stealth_rock_damage, toxic_spikes_outcome, HazardKind, ToxicSpikesOutcome,
};
use crate::sim::stats::Stat;
use crate::sim::turn::{lose_hp, TurnContext};
use rand::Rng;

/// Puts roster slot `index` in for `id`. The index must already be valid.
pub fn perform_switch(state: &mut BattleState, id: SideId, index: usize, ctx: &mut TurnContext) {
    let side = state.side_mut(id);
    side.active_mut().reset_on_switch();
    side.active = index;
    side.choice_lock = None;
    let species = side.active().species.clone();
    tracing::debug!(side = %id, index, %species, "switch in");
    ctx.emit(BattleEvent::SwitchOk {
        side: id,
        index,
        species,
    });
    apply_entry_hazards(state, id, ctx);
    apply_on_entry_ability(state, id, ctx);
}

/// Drags a random healthy bench member in for `id`. Returns false when the
/// side has nobody to bring in.
pub fn force_random_switch(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) -> bool {
    let candidates = state.side(id).switch_candidates();
    if candidates.is_empty() {
        return false;
    }
    let pick = candidates[ctx.rng.gen_range(0..candidates.len())];
    perform_switch(state, id, pick, ctx);
    true
}

pub fn apply_entry_hazards(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let side = state.side_mut(id);
    let hazards = side.hazards;
    if side.active().is_fainted() {
        return;
    }
    if hazards.stealth_rock {
        let mon = side.active();
        let amount = stealth_rock_damage(mon.max_hp(), &mon.types);
        lose_hp(side, amount, ctx, |amount| BattleEvent::Hazard {
            side: id,
            hazard: HazardKind::StealthRock,
            amount,
        });
    }
    if hazards.spikes > 0 && side.active().is_grounded() {
        let amount = spikes_damage(side.active().max_hp(), hazards.spikes);
        lose_hp(side, amount, ctx, |amount| BattleEvent::Hazard {
            side: id,
            hazard: HazardKind::Spikes,
            amount,
        });
    }
    if side.active().is_fainted() {
        return;
    }
    let mon = side.active();
    let outcome = toxic_spikes_outcome(
        hazards.toxic_spikes,
        &mon.types,
        mon.is_grounded(),
        mon.status.is_some(),
    );
    let species = mon.species.clone();
    match outcome {
        ToxicSpikesOutcome::Absorbed => {
            side.hazards.toxic_spikes = 0;
            ctx.message(format!("{species} absorbed the toxic spikes"));
            ctx.emit(BattleEvent::HazardRemoved {
                side: id,
                hazard: HazardKind::ToxicSpikes,
            });
        }
        ToxicSpikesOutcome::Inflict(kind) => {
            if side.active_mut().apply_status(kind, ctx.rng) {
                ctx.emit(BattleEvent::StatusApplied {
                    side: id,
                    status: kind,
                });
            }
        }
        ToxicSpikesOutcome::NoEffect => {}
    }
}

pub fn apply_on_entry_ability(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let (side, foe) = state.split_mut(id);
    let mon = side.active();
    if mon.is_fainted() || mon.ability() != Some(Ability::Intimidate) {
        return;
    }
    let target = foe.active_mut();
    if target.is_fainted() {
        return;
    }
    let delta = target.stages.apply(Stat::Atk, -1);
    ctx.message(format!("{}'s intimidate", mon.species));
    ctx.emit(BattleEvent::StatChange {
        side: id.opponent(),
        stat: Stat::Atk,
        delta,
        stage: target.stages.get(Stat::Atk),
    });
}
