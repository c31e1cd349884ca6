//! Owning wrapper around a battle state and its rng.

use crate::config::Ruleset;
use crate::error::{EngineError, InvalidActionReason};
use crate::events::BattleEvent;
use crate::sim::ai::BattleAI;
use crate::sim::battle::{Action, BattleResult, BattleState, SideId};
use crate::sim::combatant::Combatant;
use crate::sim::switching::apply_on_entry_ability;
use crate::sim::turn::{finish, resolve_turn, TurnContext};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Step-based battle engine. All randomness, including bot choices, is drawn
/// from the one seeded rng.
#[derive(Clone, Debug)]
pub struct BattleEngine {
    state: BattleState,
    rng: SmallRng,
}

impl BattleEngine {
    /// Sends out both leads and applies their entry abilities.
    pub fn new(
        p1: Vec<Combatant>,
        p2: Vec<Combatant>,
        ruleset: Ruleset,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let mut state = BattleState::new(p1, p2, ruleset)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ctx = TurnContext::new(&mut rng);
        for id in SideId::ALL {
            let side = state.side(id);
            ctx.emit(BattleEvent::SwitchOk {
                side: id,
                index: side.active,
                species: side.active().species.clone(),
            });
        }
        for id in SideId::ALL {
            apply_on_entry_ability(&mut state, id, &mut ctx);
        }
        let events = ctx.events;
        state.log.extend(events);
        tracing::debug!(seed, "battle engine created");
        Ok(Self { state, rng })
    }

    /// Resolves one turn with explicit actions; `None` takes the fallback.
    pub fn step(&mut self, actions: [Option<Action>; 2]) -> Result<Vec<BattleEvent>, EngineError> {
        resolve_turn(&mut self.state, actions, &mut self.rng)
    }

    /// Queues an action for the next turn after validating it.
    pub fn submit(&mut self, side: SideId, action: Action) -> Result<(), EngineError> {
        if self.state.battle_over {
            return Err(EngineError::invalid(side, InvalidActionReason::BattleOver));
        }
        if self.state.pending[side.index()].is_some() {
            return Err(EngineError::invalid(side, InvalidActionReason::AlreadySubmitted));
        }
        self.state
            .validate_action(side, action)
            .map_err(|reason| EngineError::invalid(side, reason))?;
        self.state.pending[side.index()] = Some(action);
        Ok(())
    }

    pub fn pending(&self, side: SideId) -> Option<Action> {
        self.state.pending[side.index()]
    }

    /// Drops the queued action for `side`, if any.
    pub fn withdraw(&mut self, side: SideId) -> Option<Action> {
        self.state.pending[side.index()].take()
    }

    pub fn is_ready(&self) -> bool {
        self.state.pending.iter().all(Option::is_some)
    }

    /// Resolves the queued actions; empty slots take the fallback.
    pub fn resolve_pending(&mut self) -> Result<Vec<BattleEvent>, EngineError> {
        let actions = self.state.pending;
        self.step(actions)
    }

    /// Lets `ai` pick an action for `side` from its legal options.
    pub fn choose_with(&mut self, ai: &mut dyn BattleAI, side: SideId) -> Action {
        let actions = self.state.legal_actions(side);
        ai.choose_action(&self.state, side, &actions, &mut self.rng)
    }

    /// Ends the battle in the opponent's favour.
    pub fn forfeit(&mut self, side: SideId) -> Result<Vec<BattleEvent>, EngineError> {
        if self.state.battle_over {
            return Err(EngineError::invalid(side, InvalidActionReason::BattleOver));
        }
        let mut ctx = TurnContext::new(&mut self.rng);
        ctx.message(format!("{side} forfeited"));
        finish(&mut self.state, &mut ctx, BattleResult::win_for(side.opponent()));
        self.state.pending = [None, None];
        let events = ctx.events;
        self.state.log.extend(events.iter().cloned());
        Ok(events)
    }

    /// Plays bot against bot until the battle ends.
    pub fn run_to_completion(
        &mut self,
        p1: &mut dyn BattleAI,
        p2: &mut dyn BattleAI,
    ) -> BattleResult {
        while !self.is_terminal() {
            let actions = [
                Some(self.choose_with(p1, SideId::P1)),
                Some(self.choose_with(p2, SideId::P2)),
            ];
            if let Err(err) = self.step(actions) {
                // Bots only pick from legal actions; fall back regardless.
                tracing::warn!(%err, "bot action rejected, using fallbacks");
                if self.step([None, None]).is_err() {
                    break;
                }
            }
        }
        self.outcome().unwrap_or(BattleResult::Draw)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.battle_over
    }

    pub fn outcome(&self) -> Option<BattleResult> {
        self.state.result
    }

    pub fn legal_actions(&self, side: SideId) -> Vec<Action> {
        self.state.legal_actions(side)
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::{HeuristicBot, RandomAI};
    use crate::sim::combatant::tests::make_combatant;

    fn engine(seed: u64) -> BattleEngine {
        let p1 = vec![
            make_combatant("gyarados", &["waterfall", "dragon-dance"]),
            make_combatant("pikachu", &["thunderbolt", "quick-attack"]),
        ];
        let p2 = vec![
            make_combatant("snorlax", &["tackle", "rest"]),
            make_combatant("garchomp", &["earthquake", "dragon-claw"]),
        ];
        BattleEngine::new(p1, p2, Ruleset::default(), seed).expect("valid rosters")
    }

    #[test]
    fn leads_are_announced_and_intimidate_fires() {
        let engine = engine(1);
        let log = engine.state().log.as_slice();
        assert!(matches!(log[0], BattleEvent::SwitchOk { side: SideId::P1, index: 0, .. }));
        assert!(matches!(log[1], BattleEvent::SwitchOk { side: SideId::P2, index: 0, .. }));
        assert_eq!(engine.state().active(SideId::P2).stages.atk, -1);
    }

    #[test]
    fn submit_rejects_duplicates() {
        let mut engine = engine(1);
        engine.submit(SideId::P1, Action::Move(0)).expect("legal");
        let err = engine.submit(SideId::P1, Action::Move(1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidAction {
                reason: InvalidActionReason::AlreadySubmitted,
                ..
            }
        ));
        assert!(!engine.is_ready());
        engine.submit(SideId::P2, Action::Switch(1)).expect("legal");
        assert!(engine.is_ready());
        engine.resolve_pending().expect("turn resolves");
        assert_eq!(engine.pending(SideId::P1), None);
        assert_eq!(engine.state().turn, 1);
    }

    #[test]
    fn forfeit_ends_the_battle() {
        let mut engine = engine(1);
        engine.forfeit(SideId::P2).expect("battle running");
        assert_eq!(engine.outcome(), Some(BattleResult::P1Wins));
        assert!(engine.forfeit(SideId::P1).is_err());
        assert!(engine.step([None, None]).is_err());
        assert!(engine.legal_actions(SideId::P1).is_empty());
    }

    #[test]
    fn bots_finish_and_seeds_replay_identically() {
        let mut first = engine(42);
        let mut second = engine(42);
        let a = first.run_to_completion(&mut HeuristicBot::default(), &mut RandomAI);
        let b = second.run_to_completion(&mut HeuristicBot::default(), &mut RandomAI);
        assert_eq!(a, b);
        assert_eq!(first.state(), second.state());
        first.state().check_invariants().expect("invariants hold");
    }
}
