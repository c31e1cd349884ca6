use crate::config::Ruleset;
use crate::error::{EngineError, InvalidActionReason, InvariantViolation};
use crate::events::EventLog;
use crate::sim::combatant::Combatant;
use crate::sim::hazards::SideHazards;
use crate::sim::weather_field::FieldState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideId {
    P1,
    P2,
}

impl SideId {
    pub const ALL: [SideId; 2] = [SideId::P1, SideId::P2];

    pub fn opponent(self) -> Self {
        match self {
            SideId::P1 => SideId::P2,
            SideId::P2 => SideId::P1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SideId::P1 => 0,
            SideId::P2 => 1,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideId::P1 => f.write_str("p1"),
            SideId::P2 => f.write_str("p2"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum Action {
    /// Index into the active combatant's move list.
    Move(usize),
    /// Index into the side's roster.
    Switch(usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BattleResult {
    P1Wins,
    P2Wins,
    Draw,
}

impl BattleResult {
    pub fn winner(self) -> Option<SideId> {
        match self {
            BattleResult::P1Wins => Some(SideId::P1),
            BattleResult::P2Wins => Some(SideId::P2),
            BattleResult::Draw => None,
        }
    }

    pub fn win_for(side: SideId) -> Self {
        match side {
            SideId::P1 => BattleResult::P1Wins,
            SideId::P2 => BattleResult::P2Wins,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub id: SideId,
    pub roster: Vec<Combatant>,
    pub active: usize,
    pub hazards: SideHazards,
    /// Move id the active combatant is locked into by a choice item.
    pub choice_lock: Option<String>,
}

impl Side {
    pub fn new(id: SideId, roster: Vec<Combatant>) -> Self {
        Self {
            id,
            roster,
            active: 0,
            hazards: SideHazards::default(),
            choice_lock: None,
        }
    }

    pub fn active(&self) -> &Combatant {
        &self.roster[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Combatant {
        &mut self.roster[self.active]
    }

    pub fn has_healthy(&self) -> bool {
        self.roster.iter().any(|mon| !mon.is_fainted())
    }

    /// Roster indices that could switch in right now.
    pub fn switch_candidates(&self) -> Vec<usize> {
        self.roster
            .iter()
            .enumerate()
            .filter(|(idx, mon)| *idx != self.active && !mon.is_fainted())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn first_switch_candidate(&self) -> Option<usize> {
        self.switch_candidates().into_iter().next()
    }

    pub fn needs_replacement(&self) -> bool {
        self.active().is_fainted() && self.first_switch_candidate().is_some()
    }

    pub fn validate_switch(&self, index: usize) -> Result<(), InvalidActionReason> {
        let Some(target) = self.roster.get(index) else {
            return Err(InvalidActionReason::SwitchIndexOutOfRange(index));
        };
        if target.is_fainted() {
            return Err(InvalidActionReason::SwitchTargetFainted(index));
        }
        if index == self.active {
            return Err(InvalidActionReason::SwitchTargetActive(index));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub sides: [Side; 2],
    pub turn: u32,
    pub field: FieldState,
    pub pending: [Option<Action>; 2],
    pub battle_over: bool,
    pub winner: Option<SideId>,
    pub result: Option<BattleResult>,
    pub ruleset: Ruleset,
    pub log: EventLog,
}

impl BattleState {
    pub fn new(
        p1: Vec<Combatant>,
        p2: Vec<Combatant>,
        ruleset: Ruleset,
    ) -> Result<Self, EngineError> {
        ruleset
            .validate()
            .map_err(|err| EngineError::InvalidRuleset(format!("{err:#}")))?;
        for (id, roster) in [(SideId::P1, &p1), (SideId::P2, &p2)] {
            if roster.is_empty() {
                return Err(EngineError::InvalidTeam(format!("{id} has an empty roster")));
            }
            if roster.len() > ruleset.max_team_size {
                return Err(EngineError::InvalidTeam(format!(
                    "{id} has {} members, limit is {}",
                    roster.len(),
                    ruleset.max_team_size
                )));
            }
        }
        Ok(Self {
            sides: [Side::new(SideId::P1, p1), Side::new(SideId::P2, p2)],
            turn: 0,
            field: FieldState::default(),
            pending: [None, None],
            battle_over: false,
            winner: None,
            result: None,
            ruleset,
            log: EventLog::new(),
        })
    }

    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.index()]
    }

    pub fn side_mut(&mut self, id: SideId) -> &mut Side {
        &mut self.sides[id.index()]
    }

    /// Mutable access to `id` and its opponent at once.
    pub fn split_mut(&mut self, id: SideId) -> (&mut Side, &mut Side) {
        let (first, second) = self.sides.split_at_mut(1);
        match id {
            SideId::P1 => (&mut first[0], &mut second[0]),
            SideId::P2 => (&mut second[0], &mut first[0]),
        }
    }

    pub fn active(&self, id: SideId) -> &Combatant {
        self.side(id).active()
    }

    pub fn active_mut(&mut self, id: SideId) -> &mut Combatant {
        self.side_mut(id).active_mut()
    }

    /// Checks `action` for `side` without touching the state.
    pub fn validate_action(&self, id: SideId, action: Action) -> Result<(), InvalidActionReason> {
        if self.battle_over {
            return Err(InvalidActionReason::BattleOver);
        }
        let side = self.side(id);
        match action {
            Action::Switch(index) => side.validate_switch(index),
            Action::Move(index) => {
                let active = side.active();
                if active.is_fainted() {
                    return Err(InvalidActionReason::MustSwitch);
                }
                let Some(slot) = active.moves.get(index) else {
                    return Err(InvalidActionReason::MoveIndexOutOfRange(index));
                };
                let slot_id = slot.id();
                let locked = side
                    .choice_lock
                    .as_ref()
                    .filter(|locked| active.move_index(locked).is_some());
                if let Some(locked) = locked {
                    if *locked != slot_id {
                        return Err(InvalidActionReason::ChoiceLocked(locked.clone()));
                    }
                }
                // A drained locked move, or a fully drained moveset, becomes struggle.
                if slot.current_pp == 0 && locked.is_none() && active.has_usable_move() {
                    return Err(InvalidActionReason::NoPpLeft(slot_id));
                }
                Ok(())
            }
        }
    }

    pub fn legal_actions(&self, id: SideId) -> Vec<Action> {
        if self.battle_over {
            return Vec::new();
        }
        let side = self.side(id);
        let mut actions: Vec<Action> = (0..side.active().moves.len())
            .map(Action::Move)
            .filter(|action| self.validate_action(id, *action).is_ok())
            .collect();
        actions.extend(side.switch_candidates().into_iter().map(Action::Switch));
        actions
    }

    /// Deterministic stand-in for a side that submitted nothing.
    pub fn fallback_action(&self, id: SideId) -> Action {
        let side = self.side(id);
        let active = side.active();
        if !active.is_fainted() {
            if let Some(locked) = side.choice_lock.as_deref().and_then(|m| active.move_index(m)) {
                if active.moves[locked].current_pp > 0 {
                    return Action::Move(locked);
                }
            } else if let Some(index) = active.moves.iter().position(|slot| slot.current_pp > 0) {
                return Action::Move(index);
            }
        }
        match side.first_switch_candidate() {
            Some(index) => Action::Switch(index),
            // Nothing left to switch to: struggle.
            None => Action::Move(0),
        }
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for side in &self.sides {
            for mon in &side.roster {
                mon.check_invariants()?;
            }
        }
        Ok(())
    }
}
