//! One round of battle: replacement switches, ordered actions, the
//! end-of-turn pipeline and the termination check.

use crate::error::{EngineError, InvalidActionReason};
use crate::events::BattleEvent;
use crate::sim::battle::{Action, BattleResult, BattleState, Side, SideId};
use crate::sim::end_of_turn::run_end_of_turn;
use crate::sim::items;
use crate::sim::moves::{execute_move, resolve_choice};
use crate::sim::stats::{stage_multiplier, Stat};
use crate::sim::status::{self, PrimaryStatus, StatusKind, FREEZE_THAW_CHANCE, PARALYSIS_SKIP_CHANCE};
use crate::sim::switching::perform_switch;
use crate::sim::volatiles::CONFUSION_SELF_HIT_CHANCE;
use rand::rngs::SmallRng;
use rand::Rng;
use std::cmp::Ordering;

/// Scratch state for one turn. Events are buffered here and only reach the
/// battle log once the whole turn has resolved.
pub struct TurnContext<'a> {
    pub events: Vec<BattleEvent>,
    pub rng: &'a mut SmallRng,
    /// Sides whose action has already run this turn.
    pub acted: [bool; 2],
    /// Sides whose sleeper already spent a sleep turn in the action gate.
    pub slept: [bool; 2],
}

impl<'a> TurnContext<'a> {
    pub fn new(rng: &'a mut SmallRng) -> Self {
        Self {
            events: Vec::new(),
            rng,
            acted: [false; 2],
            slept: [false; 2],
        }
    }

    pub fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn message(&mut self, text: impl Into<String>) {
        self.events.push(BattleEvent::message(text));
    }

    /// Rolls a percentage chance; 100 and above never touch the rng.
    pub fn chance(&mut self, percent: u8) -> bool {
        percent >= 100 || self.rng.gen_range(0..100) < percent as u32
    }
}

/// Removes hp from the side's active combatant. `event` builds the record for
/// the amount actually lost; a faint record follows if this finished it.
pub(crate) fn lose_hp(
    side: &mut Side,
    amount: u16,
    ctx: &mut TurnContext,
    event: impl FnOnce(u16) -> BattleEvent,
) -> u16 {
    let index = side.active;
    let side_id = side.id;
    let mon = side.active_mut();
    let was_fainted = mon.is_fainted();
    let applied = mon.take_damage(amount);
    if applied > 0 {
        ctx.emit(event(applied));
    }
    if !was_fainted && mon.is_fainted() {
        tracing::debug!(side = %side_id, species = %mon.species, "fainted");
        let species = mon.species.clone();
        ctx.emit(BattleEvent::PokemonFainted {
            side: side_id,
            index,
            species,
        });
    }
    applied
}

pub(crate) fn gain_hp(
    side: &mut Side,
    amount: u16,
    ctx: &mut TurnContext,
    event: impl FnOnce(u16) -> BattleEvent,
) -> u16 {
    let applied = side.active_mut().heal(amount);
    if applied > 0 {
        ctx.emit(event(applied));
    }
    applied
}

/// Ends the battle once a side has nothing left standing. Both sides
/// running out at the same check is a draw.
pub(crate) fn check_termination(state: &mut BattleState, ctx: &mut TurnContext) -> bool {
    if state.battle_over {
        return true;
    }
    let p1_alive = state.side(SideId::P1).has_healthy();
    let p2_alive = state.side(SideId::P2).has_healthy();
    let result = match (p1_alive, p2_alive) {
        (true, true) => return false,
        (true, false) => BattleResult::P1Wins,
        (false, true) => BattleResult::P2Wins,
        (false, false) => BattleResult::Draw,
    };
    finish(state, ctx, result);
    true
}

pub(crate) fn finish(state: &mut BattleState, ctx: &mut TurnContext, result: BattleResult) {
    state.battle_over = true;
    state.result = Some(result);
    state.winner = result.winner();
    tracing::info!(?result, turn = state.turn, "battle finished");
    ctx.emit(BattleEvent::BattleEnd {
        winner: state.winner,
        result,
    });
}

pub fn effective_speed(side: &Side) -> u32 {
    let mon = side.active();
    let mut speed = mon.stats.spe as f64 * stage_multiplier(mon.stages.get(Stat::Spe));
    if matches!(mon.status, Some(PrimaryStatus::Paralysis)) {
        speed *= 0.5;
    }
    speed *= items::speed_modifier(mon);
    speed.floor() as u32
}

fn action_priority(state: &BattleState, id: SideId, action: Action) -> i8 {
    match action {
        Action::Switch(_) => 0,
        Action::Move(index) => resolve_choice(state.side(id), index).data.priority,
    }
}

/// Orders the two sides' actions: priority, then effective speed, then p1.
pub fn determine_order(state: &BattleState, actions: [Action; 2]) -> [SideId; 2] {
    let p1 = (
        action_priority(state, SideId::P1, actions[0]),
        effective_speed(state.side(SideId::P1)),
    );
    let p2 = (
        action_priority(state, SideId::P2, actions[1]),
        effective_speed(state.side(SideId::P2)),
    );
    match p2.cmp(&p1) {
        Ordering::Greater => [SideId::P2, SideId::P1],
        _ => [SideId::P1, SideId::P2],
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Gate {
    Proceed,
    Skip,
    SelfHit,
}

/// Flinch, sleep, freeze, paralysis and confusion, in that order.
pub(crate) fn action_gate(state: &mut BattleState, id: SideId, ctx: &mut TurnContext) -> Gate {
    let mon = state.active_mut(id);
    if mon.volatiles.take_flinch() {
        ctx.message(format!("{} flinched and couldn't move", mon.species));
        return Gate::Skip;
    }
    match mon.status {
        Some(PrimaryStatus::Sleep { .. }) => {
            ctx.slept[id.index()] = true;
            if status::tick_sleep(mon) {
                ctx.emit(BattleEvent::StatusCured {
                    side: id,
                    status: StatusKind::Sleep,
                });
            } else {
                ctx.message(format!("{} is fast asleep", mon.species));
                return Gate::Skip;
            }
        }
        Some(PrimaryStatus::Freeze) => {
            if ctx.rng.gen_bool(FREEZE_THAW_CHANCE) {
                mon.status = None;
                ctx.emit(BattleEvent::StatusCured {
                    side: id,
                    status: StatusKind::Freeze,
                });
            } else {
                ctx.message(format!("{} is frozen solid", mon.species));
                return Gate::Skip;
            }
        }
        _ => {}
    }
    if matches!(mon.status, Some(PrimaryStatus::Paralysis)) && ctx.rng.gen_bool(PARALYSIS_SKIP_CHANCE)
    {
        ctx.message(format!("{} is fully paralyzed", mon.species));
        return Gate::Skip;
    }
    if mon.volatiles.is_confused() && ctx.rng.gen_bool(CONFUSION_SELF_HIT_CHANCE) {
        return Gate::SelfHit;
    }
    Gate::Proceed
}

fn resolve_actions(
    state: &BattleState,
    submitted: [Option<Action>; 2],
) -> Result<[Action; 2], EngineError> {
    if state.battle_over {
        return Err(EngineError::invalid(SideId::P1, InvalidActionReason::BattleOver));
    }
    let mut resolved = [Action::Move(0); 2];
    for id in SideId::ALL {
        resolved[id.index()] = match submitted[id.index()] {
            Some(action) => {
                state
                    .validate_action(id, action)
                    .map_err(|reason| EngineError::invalid(id, reason))?;
                action
            }
            None => state.fallback_action(id),
        };
    }
    Ok(resolved)
}

/// Resolves one full turn. Invalid input is rejected before anything is
/// mutated; otherwise the turn's events are appended to the log and returned.
pub fn resolve_turn(
    state: &mut BattleState,
    submitted: [Option<Action>; 2],
    rng: &mut SmallRng,
) -> Result<Vec<BattleEvent>, EngineError> {
    let actions = resolve_actions(state, submitted)?;
    state.turn += 1;
    state.pending = [None, None];
    let mut ctx = TurnContext::new(rng);

    // Replacements for fainted actives go in before anything else.
    for id in SideId::ALL {
        if !state.battle_over && state.active(id).is_fainted() {
            if let Action::Switch(index) = actions[id.index()] {
                perform_switch(state, id, index, &mut ctx);
                ctx.acted[id.index()] = true;
                check_termination(state, &mut ctx);
            }
        }
    }

    let order = determine_order(state, actions);
    let starting_active = [state.side(SideId::P1).active, state.side(SideId::P2).active];
    for id in order {
        if state.battle_over || ctx.acted[id.index()] {
            continue;
        }
        run_action(state, id, actions[id.index()], starting_active[id.index()], &mut ctx);
        ctx.acted[id.index()] = true;
        check_termination(state, &mut ctx);
    }

    if !state.battle_over {
        run_end_of_turn(state, &mut ctx);
    }
    for side in state.sides.iter_mut() {
        side.active_mut().volatiles.clear_turn_scoped();
    }
    if !state.battle_over && state.turn >= state.ruleset.turn_limit {
        finish(state, &mut ctx, BattleResult::Draw);
    }
    ctx.emit(BattleEvent::TurnEnd { turn: state.turn });
    tracing::debug!(turn = state.turn, events = ctx.events.len(), "turn resolved");

    let events = ctx.events;
    state.log.extend(events.iter().cloned());
    Ok(events)
}

fn run_action(
    state: &mut BattleState,
    id: SideId,
    action: Action,
    starting_active: usize,
    ctx: &mut TurnContext,
) {
    match action {
        Action::Switch(index) => {
            // A forced switch earlier in the turn may have changed the picture.
            if let Err(reason) = state.side(id).validate_switch(index) {
                tracing::debug!(side = %id, %reason, "switch no longer possible");
                return;
            }
            perform_switch(state, id, index, ctx);
        }
        Action::Move(index) => {
            let side = state.side(id);
            // The combatant that chose this move fainted or was dragged out.
            if side.active != starting_active || side.active().is_fainted() {
                return;
            }
            execute_move(state, id, index, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::battle::tests::make_state;
    use rand::SeedableRng;

    #[test]
    fn higher_priority_moves_first() {
        // Snorlax is far slower but quick attack has +1 priority.
        let state = make_state(&["snorlax:quick-attack"], &["jolteon:thunderbolt"]);
        assert_eq!(
            determine_order(&state, [Action::Move(0), Action::Move(0)]),
            [SideId::P1, SideId::P2]
        );
    }

    #[test]
    fn faster_side_moves_first_at_equal_priority() {
        let state = make_state(&["snorlax:tackle"], &["jolteon:thunderbolt"]);
        assert_eq!(
            determine_order(&state, [Action::Move(0), Action::Move(0)]),
            [SideId::P2, SideId::P1]
        );
    }

    #[test]
    fn exact_speed_tie_goes_to_p1() {
        let state = make_state(&["snorlax:tackle"], &["snorlax:tackle"]);
        assert_eq!(
            determine_order(&state, [Action::Move(0), Action::Move(0)]),
            [SideId::P1, SideId::P2]
        );
    }

    #[test]
    fn paralysis_and_scarf_change_speed() {
        let mut state = make_state(&["snorlax:tackle"], &["snorlax:tackle"]);
        let base = effective_speed(state.side(SideId::P1));
        state.sides[0].roster[0].status = Some(PrimaryStatus::Paralysis);
        assert_eq!(effective_speed(state.side(SideId::P1)), base / 2);
        state.sides[1].roster[0].item = Some("choicescarf".to_string());
        assert_eq!(
            effective_speed(state.side(SideId::P2)),
            (base as f64 * 1.5).floor() as u32
        );
        assert_eq!(
            determine_order(&state, [Action::Move(0), Action::Move(0)]),
            [SideId::P2, SideId::P1]
        );
    }

    #[test]
    fn invalid_action_leaves_state_untouched() {
        let mut state = make_state(&["pikachu:tackle", "snorlax:tackle"], &["snorlax:tackle"]);
        let before = state.clone();
        let mut rng = SmallRng::seed_from_u64(1);
        let err = resolve_turn(&mut state, [Some(Action::Switch(0)), None], &mut rng).unwrap_err();
        assert!(err.is_invalid_action());
        assert_eq!(state, before);
    }

    #[test]
    fn turn_events_reach_the_log_and_end_with_turn_end() {
        let mut state = make_state(&["pikachu:tackle"], &["snorlax:tackle"]);
        let mut rng = SmallRng::seed_from_u64(2);
        let events = resolve_turn(&mut state, [None, None], &mut rng).expect("turn resolves");
        assert_eq!(events.last(), Some(&BattleEvent::TurnEnd { turn: 1 }));
        assert_eq!(state.log.as_slice(), events.as_slice());
        assert_eq!(state.turn, 1);
    }

    #[test]
    fn turn_limit_ends_in_a_draw() {
        let mut state = make_state(&["snorlax:protect"], &["snorlax:protect"]);
        state.ruleset.turn_limit = 3;
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..3 {
            resolve_turn(&mut state, [None, None], &mut rng).expect("turn resolves");
        }
        assert!(state.battle_over);
        assert_eq!(state.result, Some(BattleResult::Draw));
        assert_eq!(state.winner, None);
    }
}
