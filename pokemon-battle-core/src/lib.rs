//! Turn-based creature battle engine.
//!
//! [`sim::turn::resolve_turn`] is the pure core: a battle state plus one
//! action per side in, events out. [`engine::BattleEngine`] owns a state and
//! its rng, and [`room::BattleRoom`] adds action collection, a bot seat and
//! replays on top.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod replay;
pub mod room;
pub mod sim;
pub mod team;

pub use team::{parse_team_text, TeamSpec};

/// Commonly used exports for external consumers.
pub mod prelude {
    pub use crate::config::Ruleset;
    pub use crate::data::{builtin, Catalog, MemoryCatalog};
    pub use crate::engine::BattleEngine;
    pub use crate::error::{EngineError, InvalidActionReason};
    pub use crate::events::{BattleEvent, EventLog};
    pub use crate::replay::Replay;
    pub use crate::room::{BattleRoom, BattleSnapshot, RoomRepository, SharedRoomRepository, TurnReport};
    pub use crate::sim::ai::{BattleAI, HeuristicBot, RandomAI};
    pub use crate::sim::{resolve_turn, Action, BattleResult, BattleState, Combatant, SideId};
    pub use crate::team::{materialize_team, MemberSpec, TeamSpec};
}
