//! Battle simulation: state, mechanics and the turn engine.

pub mod abilities;
pub mod ai;
pub mod battle;
pub mod combatant;
pub mod damage;
pub mod end_of_turn;
pub mod hazards;
pub mod items;
pub mod moves;
pub mod stats;
pub mod status;
pub mod switching;
pub mod turn;
pub mod volatiles;
pub mod weather_field;

pub use battle::{Action, BattleResult, BattleState, Side, SideId};
pub use combatant::Combatant;
pub use turn::resolve_turn;
