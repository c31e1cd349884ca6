use crate::sim::battle::SideId;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordKind {
    Species,
    Move,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Species => f.write_str("species"),
            RecordKind::Move => f.write_str("move"),
        }
    }
}

/// Why a submitted action was refused. The battle state is untouched in
/// every case.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidActionReason {
    #[error("the battle is already over")]
    BattleOver,
    #[error("an action was already submitted this turn")]
    AlreadySubmitted,
    #[error("this side is controlled by the bot")]
    NotYourSide,
    #[error("move slot {0} does not exist")]
    MoveIndexOutOfRange(usize),
    #[error("move `{0}` has no PP left")]
    NoPpLeft(String),
    #[error("locked into `{0}` by a choice item")]
    ChoiceLocked(String),
    #[error("the active combatant has fainted and must be replaced")]
    MustSwitch,
    #[error("roster slot {0} does not exist")]
    SwitchIndexOutOfRange(usize),
    #[error("roster slot {0} has fainted")]
    SwitchTargetFainted(usize),
    #[error("roster slot {0} is already active")]
    SwitchTargetActive(usize),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid action for {side}: {reason}")]
    InvalidAction {
        side: SideId,
        reason: InvalidActionReason,
    },
    #[error("catalog has no {kind} `{id}`")]
    DataUnavailable { kind: RecordKind, id: String },
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    #[error("room `{0}` is unavailable after a failed turn")]
    RoomUnavailable(String),
    #[error("invalid team: {0}")]
    InvalidTeam(String),
    #[error("invalid ruleset: {0}")]
    InvalidRuleset(String),
}

impl EngineError {
    pub fn invalid(side: SideId, reason: InvalidActionReason) -> Self {
        EngineError::InvalidAction { side, reason }
    }

    pub fn is_invalid_action(&self) -> bool {
        matches!(self, EngineError::InvalidAction { .. })
    }
}

/// A broken combatant invariant. Only reachable through a programming error.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invariant violated for {species}: {detail}")]
pub struct InvariantViolation {
    pub species: String,
    pub detail: String,
}

/// A replay whose events do not fit its initial teams.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ReplayError {
    #[error("event {index} names roster slot {slot} which {side} does not have")]
    UnknownSlot { index: usize, side: SideId, slot: usize },
    #[error("event {index} diverges from the reconstructed state: {detail}")]
    Diverged { index: usize, detail: String },
}
