//! Residual effects applied once both actions have resolved.

use crate::events::{BattleEvent, DamageCause, HealSource};
use crate::sim::battle::{BattleState, SideId};
use crate::sim::items;
use crate::sim::status::{self, sixteenths, StatusKind};
use crate::sim::turn::{check_termination, gain_hp, lose_hp, TurnContext};
use crate::sim::volatiles::LEECH_SEED_DIVISOR;
use crate::sim::weather_field::{weather_chips, Terrain};

type Step = fn(&mut BattleState, SideId, &mut TurnContext);

/// Fixed pipeline order. Every step visits p1 then p2.
const STEPS: [(&str, Step); 7] = [
    ("grassy-terrain", grassy_terrain_heal),
    ("leftovers", item_heal),
    ("status", status_damage),
    ("leech-seed", leech_seed),
    ("volatiles", tick_volatiles),
    ("weather", weather_chip),
    ("sleep", tick_sleep),
];

pub(crate) fn run_end_of_turn(state: &mut BattleState, ctx: &mut TurnContext) {
    for (name, step) in STEPS {
        for id in SideId::ALL {
            if !state.active(id).is_fainted() {
                step(state, id, ctx);
            }
        }
        if check_termination(state, ctx) {
            tracing::debug!(step = name, "battle ended during end of turn");
            return;
        }
    }
    for condition in state.field.tick() {
        ctx.emit(BattleEvent::FieldEnded { condition });
    }
}

fn grassy_terrain_heal(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let mon = state.active(id);
    if state.field.terrain() != Some(Terrain::Grassy) || !mon.is_grounded() {
        return;
    }
    let amount = sixteenths(mon.max_hp() as u32, 1);
    gain_hp(state.side_mut(id), amount, ctx, |amount| BattleEvent::Heal {
        side: id,
        amount,
        source: HealSource::Terrain,
    });
}

fn item_heal(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let Some(amount) = items::end_of_turn_heal(state.active(id)) else {
        return;
    };
    gain_hp(state.side_mut(id), amount, ctx, |amount| BattleEvent::ItemHeal {
        side: id,
        item: "leftovers".to_string(),
        amount,
    });
}

fn status_damage(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let Some((status, amount)) = status::residual_damage(state.active_mut(id)) else {
        return;
    };
    lose_hp(state.side_mut(id), amount, ctx, |amount| BattleEvent::StatusTick {
        side: id,
        status,
        amount,
    });
}

fn leech_seed(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let mon = state.active(id);
    let Some(source) = mon.volatiles.leech_seed_source() else {
        return;
    };
    let amount = (mon.max_hp() / LEECH_SEED_DIVISOR).max(1);
    let drained = lose_hp(state.side_mut(id), amount, ctx, |amount| BattleEvent::Damage {
        side: id,
        amount,
        cause: DamageCause::LeechSeed,
        critical: false,
        effectiveness: 1.0,
    });
    if drained > 0 && !state.active(source).is_fainted() {
        gain_hp(state.side_mut(source), drained, ctx, |amount| BattleEvent::Heal {
            side: source,
            amount,
            source: HealSource::LeechSeed,
        });
    }
}

fn tick_volatiles(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    for volatile in state.active_mut(id).volatiles.tick() {
        ctx.emit(BattleEvent::VolatileEnded { side: id, volatile });
    }
}

fn weather_chip(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let Some(weather) = state.field.weather() else {
        return;
    };
    let mon = state.active(id);
    if !weather_chips(Some(weather), &mon.types) {
        return;
    }
    let amount = sixteenths(mon.max_hp() as u32, 1);
    lose_hp(state.side_mut(id), amount, ctx, |amount| BattleEvent::WeatherChip {
        side: id,
        weather,
        amount,
    });
}

fn tick_sleep(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    // A sleeper that already spent its turn in the action gate is not ticked twice.
    if ctx.slept[id.index()] {
        return;
    }
    if status::tick_sleep(state.active_mut(id)) {
        ctx.emit(BattleEvent::StatusCured {
            side: id,
            status: StatusKind::Sleep,
        });
    }
}
