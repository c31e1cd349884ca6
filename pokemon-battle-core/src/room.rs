//! Room control surface: action collection, bot seat, snapshots and the
//! repository rooms live in.

use crate::config::Ruleset;
use crate::data::Catalog;
use crate::engine::BattleEngine;
use crate::error::{EngineError, InvalidActionReason};
use crate::events::BattleEvent;
use crate::replay::Replay;
use crate::sim::ai::BattleAI;
use crate::sim::battle::{Action, BattleResult, BattleState, SideId};
use crate::sim::combatant::Combatant;
use crate::sim::hazards::SideHazards;
use crate::sim::stats::StatStages;
use crate::sim::status::StatusKind;
use crate::sim::volatiles::VolatileKind;
use crate::sim::weather_field::FieldState;
use crate::team::{materialize_team, TeamSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveView {
    pub id: String,
    pub name: String,
    pub current_pp: u8,
    pub max_pp: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatantView {
    pub species: String,
    pub level: u8,
    pub current_hp: u16,
    pub max_hp: u16,
    pub fainted: bool,
    pub status: Option<StatusKind>,
    pub stages: StatStages,
    pub ability: String,
    /// Hidden once consumed or knocked off.
    pub item: Option<String>,
    pub moves: Vec<MoveView>,
    pub volatiles: Vec<VolatileKind>,
}

impl From<&Combatant> for CombatantView {
    fn from(mon: &Combatant) -> Self {
        Self {
            species: mon.species.clone(),
            level: mon.level,
            current_hp: mon.current_hp,
            max_hp: mon.max_hp(),
            fainted: mon.fainted,
            status: mon.status.as_ref().map(|status| status.kind()),
            stages: mon.stages,
            ability: mon.ability.clone(),
            item: mon.item.clone().filter(|_| !mon.item_consumed),
            moves: mon
                .moves
                .iter()
                .map(|slot| MoveView {
                    id: slot.id(),
                    name: slot.data.name.clone(),
                    current_pp: slot.current_pp,
                    max_pp: slot.data.pp,
                })
                .collect(),
            volatiles: mon.volatiles.kinds().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideView {
    pub id: SideId,
    pub active: usize,
    pub hazards: SideHazards,
    pub choice_lock: Option<String>,
    /// Whether an action is waiting for the other side.
    pub submitted: bool,
    pub roster: Vec<CombatantView>,
}

/// Serializable view of a room after any interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub room_id: String,
    pub turn: u32,
    pub sides: [SideView; 2],
    pub field: FieldState,
    pub battle_over: bool,
    pub winner: Option<SideId>,
    pub result: Option<BattleResult>,
    /// The trailing `Ruleset::log_window` events.
    pub recent_events: Vec<BattleEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Empty while the room is still waiting for the other side.
    pub events: Vec<BattleEvent>,
    pub snapshot: BattleSnapshot,
}

struct BotSeat {
    side: SideId,
    ai: Box<dyn BattleAI + Send>,
}

pub struct BattleRoom {
    id: String,
    engine: BattleEngine,
    bot: Option<BotSeat>,
    seed: u64,
    initial_teams: [Vec<Combatant>; 2],
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl BattleRoom {
    pub fn new(
        p1: Vec<Combatant>,
        p2: Vec<Combatant>,
        ruleset: Ruleset,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let initial_teams = [p1.clone(), p2.clone()];
        let engine = BattleEngine::new(p1, p2, ruleset, seed)?;
        Ok(Self {
            id: String::new(),
            engine,
            bot: None,
            seed,
            initial_teams,
            created_at: Utc::now(),
            finished_at: None,
        })
    }

    pub fn from_specs(
        catalog: &dyn Catalog,
        teams: [&TeamSpec; 2],
        ruleset: Ruleset,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let p1 = materialize_team(catalog, teams[0], &ruleset)?;
        let p2 = materialize_team(catalog, teams[1], &ruleset)?;
        Self::new(p1, p2, ruleset, seed)
    }

    /// Hands `side` to a bot. The bot answers whenever the other side submits.
    pub fn with_bot(mut self, side: SideId, ai: Box<dyn BattleAI + Send>) -> Self {
        self.bot = Some(BotSeat { side, ai });
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &BattleState {
        self.engine.state()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_terminal(&self) -> bool {
        self.engine.is_terminal()
    }

    /// Queues `action` for `side` and resolves the turn once both sides have
    /// an action. Rejected actions leave the room untouched.
    pub fn submit_action(&mut self, side: SideId, action: Action) -> Result<TurnReport, EngineError> {
        if self.bot.as_ref().is_some_and(|bot| bot.side == side) && !self.is_terminal() {
            return Err(EngineError::invalid(side, InvalidActionReason::NotYourSide));
        }
        if let Err(err) = self.engine.submit(side, action) {
            tracing::warn!(room = %self.id, %err, "action rejected");
            return Err(err);
        }
        if let Some(bot) = self.bot.as_mut() {
            if self.engine.pending(bot.side).is_none() {
                let choice = self.engine.choose_with(bot.ai.as_mut(), bot.side);
                if let Err(err) = self.engine.submit(bot.side, choice) {
                    self.engine.withdraw(side);
                    tracing::warn!(room = %self.id, %err, "bot action rejected");
                    return Err(err);
                }
            }
        }
        if !self.engine.is_ready() {
            return Ok(self.report(Vec::new()));
        }
        let events = self.engine.resolve_pending()?;
        Ok(self.after_turn(events))
    }

    /// Resolves the turn with fallbacks for every side that has not submitted.
    pub fn resolve_timeout(&mut self) -> Result<TurnReport, EngineError> {
        let events = self.engine.resolve_pending()?;
        tracing::info!(room = %self.id, "turn resolved on timeout");
        Ok(self.after_turn(events))
    }

    pub fn forfeit(&mut self, side: SideId) -> Result<TurnReport, EngineError> {
        let events = self.engine.forfeit(side)?;
        tracing::info!(room = %self.id, %side, "side forfeited");
        Ok(self.after_turn(events))
    }

    /// Restarts the room from the initial teams with a fresh seed. The bot
    /// seat carries over.
    pub fn rematch(&mut self) -> Result<BattleSnapshot, EngineError> {
        let [p1, p2] = self.initial_teams.clone();
        let ruleset = self.engine.state().ruleset.clone();
        self.seed = self.seed.wrapping_add(1);
        self.engine = BattleEngine::new(p1, p2, ruleset, self.seed)?;
        self.created_at = Utc::now();
        self.finished_at = None;
        tracing::info!(room = %self.id, seed = self.seed, "rematch started");
        Ok(self.snapshot())
    }

    /// The archived battle, once it is over.
    pub fn replay(&self) -> Option<Replay> {
        let state = self.engine.state();
        if !state.battle_over {
            return None;
        }
        Some(Replay::capture(
            state,
            self.initial_teams.clone(),
            self.created_at,
            self.finished_at,
        ))
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let state = self.engine.state();
        let side_view = |id: SideId| {
            let side = state.side(id);
            SideView {
                id,
                active: side.active,
                hazards: side.hazards,
                choice_lock: side.choice_lock.clone(),
                submitted: state.pending[id.index()].is_some(),
                roster: side.roster.iter().map(CombatantView::from).collect(),
            }
        };
        BattleSnapshot {
            room_id: self.id.clone(),
            turn: state.turn,
            sides: [side_view(SideId::P1), side_view(SideId::P2)],
            field: state.field,
            battle_over: state.battle_over,
            winner: state.winner,
            result: state.result,
            recent_events: state.log.tail(state.ruleset.log_window).to_vec(),
        }
    }

    fn after_turn(&mut self, events: Vec<BattleEvent>) -> TurnReport {
        let state = self.engine.state();
        tracing::info!(room = %self.id, turn = state.turn, events = events.len(), "turn resolved");
        if state.battle_over && self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
            tracing::info!(room = %self.id, result = ?state.result, "room finished");
        }
        self.report(events)
    }

    fn report(&self, events: Vec<BattleEvent>) -> TurnReport {
        TurnReport {
            events,
            snapshot: self.snapshot(),
        }
    }
}

pub type SharedRoom = Arc<Mutex<BattleRoom>>;

/// Where live rooms are kept. Injected at the boundary.
pub trait RoomRepository: Send + Sync {
    /// Stores `room` and returns its new id.
    fn create(&self, room: BattleRoom) -> String;

    fn get(&self, id: &str) -> Result<SharedRoom, EngineError>;

    fn delete(&self, id: &str) -> Result<(), EngineError>;
}

/// In-memory repository with one lock per room.
#[derive(Default)]
pub struct SharedRoomRepository {
    rooms: Mutex<HashMap<String, SharedRoom>>,
    next_id: AtomicU64,
}

impl SharedRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, SharedRoom>> {
        // The map is only touched by insert/remove/clone, none of which can
        // leave it half-written.
        self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with the room locked. A room whose lock was poisoned by a
    /// panicking turn is reported as unavailable.
    pub fn with_room<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut BattleRoom) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let room = self.get(id)?;
        let mut guard = room
            .lock()
            .map_err(|_| EngineError::RoomUnavailable(id.to_string()))?;
        f(&mut guard)
    }

    pub fn len(&self) -> usize {
        self.rooms().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms().is_empty()
    }
}

impl RoomRepository for SharedRoomRepository {
    fn create(&self, mut room: BattleRoom) -> String {
        let id = format!("room-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        room.id = id.clone();
        tracing::info!(room = %id, "room created");
        self.rooms().insert(id.clone(), Arc::new(Mutex::new(room)));
        id
    }

    fn get(&self, id: &str) -> Result<SharedRoom, EngineError> {
        self.rooms()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::RoomNotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<(), EngineError> {
        self.rooms()
            .remove(id)
            .map(|_| tracing::info!(room = %id, "room deleted"))
            .ok_or_else(|| EngineError::RoomNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::HeuristicBot;
    use crate::sim::combatant::tests::make_combatant;
    use rand::rngs::SmallRng;

    fn room() -> BattleRoom {
        let p1 = vec![
            make_combatant("pikachu", &["thunderbolt", "quick-attack"]),
            make_combatant("snorlax", &["tackle", "rest"]),
        ];
        let p2 = vec![make_combatant("gyarados", &["waterfall"])];
        BattleRoom::new(p1, p2, Ruleset::default(), 7).expect("valid rosters")
    }

    #[test]
    fn turn_waits_for_both_sides() {
        let mut room = room();
        let report = room.submit_action(SideId::P1, Action::Move(1)).expect("legal");
        assert!(report.events.is_empty());
        assert!(report.snapshot.sides[0].submitted);
        let report = room.submit_action(SideId::P2, Action::Move(0)).expect("legal");
        assert_eq!(report.snapshot.turn, 1);
        assert!(matches!(report.events.last(), Some(BattleEvent::TurnEnd { turn: 1 })));
        assert!(!report.snapshot.sides[0].submitted);
    }

    #[test]
    fn bot_answers_immediately() {
        let mut room = room().with_bot(SideId::P2, Box::new(HeuristicBot::default()));
        let report = room.submit_action(SideId::P1, Action::Move(1)).expect("legal");
        assert_eq!(report.snapshot.turn, 1);
        let err = room.submit_action(SideId::P2, Action::Move(0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidAction {
                reason: InvalidActionReason::NotYourSide,
                ..
            }
        ));
    }

    #[test]
    fn rejected_action_changes_nothing() {
        let mut room = room();
        let before = room.snapshot();
        assert!(room.submit_action(SideId::P1, Action::Switch(0)).is_err());
        assert!(room.submit_action(SideId::P1, Action::Move(9)).is_err());
        assert_eq!(room.snapshot(), before);
    }

    struct OutOfRangeBot;

    impl BattleAI for OutOfRangeBot {
        fn choose_action(
            &mut self,
            _state: &BattleState,
            _side: SideId,
            _valid_actions: &[Action],
            _rng: &mut SmallRng,
        ) -> Action {
            Action::Move(9)
        }
    }

    #[test]
    fn failed_bot_submit_leaves_no_pending_action() {
        let mut room = room().with_bot(SideId::P2, Box::new(OutOfRangeBot));
        assert!(room.submit_action(SideId::P1, Action::Move(1)).is_err());
        assert_eq!(room.state().pending, [None, None]);
        assert_eq!(room.state().turn, 0);
        let err = room.submit_action(SideId::P1, Action::Move(1)).unwrap_err();
        assert!(!matches!(
            err,
            EngineError::InvalidAction {
                reason: InvalidActionReason::AlreadySubmitted,
                ..
            }
        ));
    }

    #[test]
    fn timeout_uses_fallbacks() {
        let mut room = room();
        room.submit_action(SideId::P1, Action::Switch(1)).expect("legal");
        let report = room.resolve_timeout().expect("resolves");
        assert_eq!(report.snapshot.turn, 1);
        assert_eq!(report.snapshot.sides[0].active, 1);
        assert!(report
            .events
            .iter()
            .any(|event| matches!(event, BattleEvent::MoveMade { side: SideId::P2, .. })));
    }

    #[test]
    fn forfeit_rematch_and_replay() {
        let mut room = room();
        assert!(room.replay().is_none());
        let report = room.forfeit(SideId::P1).expect("running");
        assert_eq!(report.snapshot.winner, Some(SideId::P2));
        assert!(room.finished_at().is_some());
        let err = room.submit_action(SideId::P1, Action::Move(0)).unwrap_err();
        assert!(err.is_invalid_action());

        let replay = room.replay().expect("finished");
        assert_eq!(replay.meta.result, Some(BattleResult::P2Wins));
        replay.reconstruct().expect("consistent log");

        let snapshot = room.rematch().expect("fresh battle");
        assert!(!snapshot.battle_over);
        assert_eq!(snapshot.turn, 0);
        assert!(room.finished_at().is_none());
    }

    #[test]
    fn repository_lifecycle() {
        let repo = SharedRoomRepository::new();
        let id = repo.create(room());
        assert_eq!(repo.len(), 1);
        let turn = repo
            .with_room(&id, |room| {
                room.submit_action(SideId::P1, Action::Move(1))?;
                room.submit_action(SideId::P2, Action::Move(0))
            })
            .expect("room exists")
            .snapshot
            .turn;
        assert_eq!(turn, 1);
        assert_eq!(repo.get(&id).expect("exists").lock().expect("unpoisoned").id(), id);
        repo.delete(&id).expect("exists");
        assert!(matches!(repo.get(&id), Err(EngineError::RoomNotFound(_))));
        assert!(matches!(repo.delete(&id), Err(EngineError::RoomNotFound(_))));
    }

    #[test]
    fn poisoned_room_is_unavailable_alone() {
        let repo = SharedRoomRepository::new();
        let broken = repo.create(room());
        let healthy = repo.create(room());
        let shared = repo.get(&broken).expect("exists");
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().expect("unpoisoned");
            panic!("turn blew up");
        })
        .join();
        let err = repo.with_room(&broken, |room| Ok(room.snapshot())).unwrap_err();
        assert!(matches!(err, EngineError::RoomUnavailable(_)));
        assert!(repo.with_room(&healthy, |room| Ok(room.snapshot())).is_ok());
    }
}
