pub mod effects;

use crate::data::moves::{MoveData, MoveFlag, STRUGGLE_RECOIL_PERCENT};
use crate::events::{BattleEvent, DamageCause};
use crate::sim::abilities::{self, Immunity};
use crate::sim::battle::{BattleState, Side, SideId};
use crate::sim::combatant::Combatant;
use crate::sim::damage::{calculate_damage, DamageRolls};
use crate::sim::items;
use crate::sim::stats::{accuracy_multiplier, Stat};
use crate::sim::switching::force_random_switch;
use crate::sim::turn::{action_gate, lose_hp, Gate, TurnContext};
use crate::sim::volatiles::VolatileKind;
use crate::sim::weather_field::Terrain;
use rand::rngs::SmallRng;
use rand::Rng;

pub use effects::{apply_effects, EffectOutcome, EffectScope};

/// The move that will actually run for a requested slot.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveChoice {
    /// `None` for struggle.
    pub slot: Option<usize>,
    pub data: MoveData,
}

impl MoveChoice {
    fn struggle() -> Self {
        Self {
            slot: None,
            data: MoveData::struggle(),
        }
    }
}

/// Applies encore and choice lock, then PP. A forced move without PP
/// struggles; a free choice without PP falls back to the first move with PP.
pub fn resolve_choice(side: &Side, requested: usize) -> MoveChoice {
    let mon = side.active();
    let forced = mon
        .volatiles
        .encored_move()
        .and_then(|id| mon.move_index(id))
        .or_else(|| side.choice_lock.as_deref().and_then(|id| mon.move_index(id)));
    let index = forced.unwrap_or(requested);
    match mon.moves.get(index) {
        Some(slot) if slot.current_pp > 0 => MoveChoice {
            slot: Some(index),
            data: slot.data.clone(),
        },
        _ if forced.is_some() => MoveChoice::struggle(),
        _ => match mon.moves.iter().position(|slot| slot.current_pp > 0) {
            Some(fallback) => MoveChoice {
                slot: Some(fallback),
                data: mon.moves[fallback].data.clone(),
            },
            None => MoveChoice::struggle(),
        },
    }
}

/// How a move use ended, for callers and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoveResult {
    /// The action gate stopped the user.
    Skipped,
    ConfusedSelfHit,
    Missed,
    Protected,
    Immune,
    /// Taunt, substitute, psychic terrain or a missing target.
    Blocked,
    Failed,
    Success { damage: u16 },
}

pub fn passes_accuracy(
    move_data: &MoveData,
    attacker: &Combatant,
    defender: &Combatant,
    rng: &mut SmallRng,
) -> bool {
    let Some(accuracy) = move_data.accuracy else {
        return true;
    };
    let modifier = accuracy_multiplier(attacker.stages.get(Stat::Acc))
        / accuracy_multiplier(defender.stages.get(Stat::Eva));
    let final_accuracy = (accuracy as f64 * modifier).clamp(1.0, 100.0);
    rng.gen_range(0.0..100.0) < final_accuracy
}

/// Runs `id`'s move action for the requested slot, from the action gate
/// through forced switches.
pub fn execute_move(
    state: &mut BattleState,
    id: SideId,
    requested: usize,
    ctx: &mut TurnContext,
) -> MoveResult {
    match action_gate(state, id, ctx) {
        Gate::Skip => return MoveResult::Skipped,
        Gate::SelfHit => {
            confusion_self_hit(state, id, ctx);
            return MoveResult::ConfusedSelfHit;
        }
        Gate::Proceed => {}
    }

    let choice = resolve_choice(state.side(id), requested);
    let data = choice.data;
    let move_id = data.id();
    {
        let mon = state.active_mut(id);
        if let Some(index) = choice.slot {
            let slot = &mut mon.moves[index];
            slot.current_pp = slot.current_pp.saturating_sub(1);
        }
        if !data.is_struggle() {
            mon.last_move = Some(move_id.clone());
        }
    }
    tracing::debug!(side = %id, %move_id, "move used");
    ctx.emit(BattleEvent::MoveMade {
        side: id,
        move_id: move_id.clone(),
    });

    let result = run_move(state, id, &data, ctx);
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(result) => return result,
    };

    if choice.slot.is_some() {
        let side = state.side_mut(id);
        if side.choice_lock.is_none()
            && !side.active().is_fainted()
            && items::locks_choice(side.active())
        {
            side.choice_lock = Some(move_id);
        }
    }

    let foe = id.opponent();
    if outcome.effects.force_switch && !state.active(foe).is_fainted() {
        force_random_switch(state, foe, ctx);
    }
    if outcome.effects.self_switch && !state.active(id).is_fainted() {
        force_random_switch(state, id, ctx);
    }
    if outcome.effects.failed {
        MoveResult::Failed
    } else {
        MoveResult::Success {
            damage: outcome.damage,
        }
    }
}

struct RunOutcome {
    damage: u16,
    effects: EffectOutcome,
}

fn run_move(
    state: &mut BattleState,
    id: SideId,
    data: &MoveData,
    ctx: &mut TurnContext,
) -> Result<RunOutcome, MoveResult> {
    let foe = id.opponent();
    if data.is_status() && state.active(id).volatiles.is_taunted() {
        ctx.message(format!("{} can't use {} after the taunt", state.active(id).species, data.name));
        return Err(MoveResult::Blocked);
    }
    if data.target.hits_opponent() {
        let attacker = state.active(id);
        let defender = state.active(foe);
        if defender.is_fainted() {
            ctx.message("But there was no target");
            return Err(MoveResult::Blocked);
        }
        if state.field.terrain() == Some(Terrain::Psychic)
            && data.priority > 0
            && defender.is_grounded()
        {
            ctx.message("Psychic terrain blocked the priority move");
            return Err(MoveResult::Blocked);
        }
        if !passes_accuracy(data, attacker, defender, ctx.rng) {
            ctx.emit(BattleEvent::Miss {
                side: id,
                move_id: data.id(),
            });
            return Err(MoveResult::Missed);
        }
        if let Some(immunity) = abilities::immunity(defender, data.move_type) {
            let species = defender.species.clone();
            match immunity {
                Immunity::Levitate => {
                    ctx.message(format!("It doesn't affect {species}"));
                }
                Immunity::FlashFire => {
                    state.active_mut(foe).flash_fire = true;
                    ctx.message(format!("{species}'s flash fire raised its fire power"));
                }
            }
            return Err(MoveResult::Immune);
        }
        if data.is_status()
            && defender.volatiles.substitute_hp().is_some()
            && !data.has_flag(MoveFlag::Sound)
        {
            ctx.message("But it failed against the substitute");
            return Err(MoveResult::Blocked);
        }
    }

    if data.is_status() {
        let scope = EffectScope {
            dealt: 0,
            target_reachable: !state.active(foe).is_fainted(),
        };
        let effects = apply_effects(state, id, data, scope, ctx);
        return Ok(RunOutcome { damage: 0, effects });
    }
    execute_damaging(state, id, data, ctx)
}

fn execute_damaging(
    state: &mut BattleState,
    id: SideId,
    data: &MoveData,
    ctx: &mut TurnContext,
) -> Result<RunOutcome, MoveResult> {
    let foe = id.opponent();
    let sound = data.has_flag(MoveFlag::Sound);
    {
        let defender = state.active(foe);
        let behind_substitute = defender.volatiles.substitute_hp().is_some() && !sound;
        if defender.volatiles.has(VolatileKind::Protect) && !behind_substitute {
            ctx.message(format!("{} protected itself", defender.species));
            return Err(MoveResult::Protected);
        }
    }

    let hits = data
        .hits
        .map(|range| ctx.rng.gen_range(range.min..=range.max.max(range.min)))
        .unwrap_or(1);
    let mut landed = 0u8;
    let mut dealt = 0u16;
    let mut hit_substitute = false;
    for _ in 0..hits {
        if state.active(foe).is_fainted() || state.active(id).is_fainted() {
            break;
        }
        let rolls = DamageRolls::roll(ctx.rng, &state.ruleset);
        let outcome = calculate_damage(
            state.active(id),
            state.active(foe),
            data,
            &state.field,
            &state.ruleset,
            rolls,
        );
        if outcome.effectiveness == 0.0 {
            ctx.message(format!("It doesn't affect {}", state.active(foe).species));
            break;
        }
        if !sound {
            if let Some(hit) = state.active_mut(foe).volatiles.absorb(outcome.damage) {
                ctx.emit(BattleEvent::SubstituteHit {
                    side: foe,
                    absorbed: hit.absorbed,
                    broke: hit.broke,
                });
                landed += 1;
                hit_substitute = true;
                continue;
            }
        }
        let (damage, sash) = items::focus_sash_cap(state.active(foe), outcome.damage);
        dealt += lose_hp(state.side_mut(foe), damage, ctx, |amount| BattleEvent::Damage {
            side: foe,
            amount,
            cause: DamageCause::Move,
            critical: outcome.critical,
            effectiveness: outcome.effectiveness,
        });
        if sash {
            let target = state.active_mut(foe);
            target.consume_item();
            let species = target.species.clone();
            ctx.emit(BattleEvent::ItemRemoved {
                side: foe,
                item: "focussash".to_string(),
            });
            ctx.message(format!("{species} hung on using its focus sash"));
        }
        landed += 1;
    }
    if landed == 0 {
        return Err(MoveResult::Immune);
    }
    if hits > 1 {
        ctx.message(format!("Hit {landed} time(s)"));
    }

    if data.is_struggle() {
        let recoil = (state.active(id).max_hp() as u32 * STRUGGLE_RECOIL_PERCENT as u32 / 100).max(1);
        lose_hp(state.side_mut(id), recoil as u16, ctx, |amount| BattleEvent::Damage {
            side: id,
            amount,
            cause: DamageCause::Struggle,
            critical: false,
            effectiveness: 1.0,
        });
    } else if let Some(recoil) = items::life_orb_recoil(state.active(id)) {
        lose_hp(state.side_mut(id), recoil, ctx, |amount| BattleEvent::Damage {
            side: id,
            amount,
            cause: DamageCause::LifeOrb,
            critical: false,
            effectiveness: 1.0,
        });
    }

    let scope = EffectScope {
        dealt,
        target_reachable: !hit_substitute && !state.active(foe).is_fainted(),
    };
    let effects = apply_effects(state, id, data, scope, ctx);
    Ok(RunOutcome {
        damage: dealt,
        effects,
    })
}

fn confusion_self_hit(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) {
    let data = MoveData::confusion_hit();
    let rolls = DamageRolls::roll_without_crit(ctx.rng);
    let mon = state.active(id);
    let outcome = calculate_damage(mon, mon, &data, &state.field, &state.ruleset, rolls);
    ctx.message(format!("{} hurt itself in its confusion", mon.species));
    lose_hp(state.side_mut(id), outcome.damage, ctx, |amount| BattleEvent::Damage {
        side: id,
        amount,
        cause: DamageCause::Confusion,
        critical: false,
        effectiveness: 1.0,
    });
}
