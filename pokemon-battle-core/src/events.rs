//! Typed battle events. The serialized shapes are the wire contract consumed
//! by transports and stored in replays.

use crate::sim::battle::{BattleResult, SideId};
use crate::sim::hazards::HazardKind;
use crate::sim::stats::Stat;
use crate::sim::status::StatusKind;
use crate::sim::volatiles::VolatileKind;
use crate::sim::weather_field::{FieldCondition, Weather};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DamageCause {
    Move,
    Confusion,
    Recoil,
    LifeOrb,
    Struggle,
    Substitute,
    LeechSeed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealSource {
    Move,
    Drain,
    Rest,
    LeechSeed,
    Terrain,
}

/// Every hp change is reported exactly once with the amount actually applied.
/// `side` always names the side whose active combatant is affected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BattleEvent {
    SwitchOk {
        side: SideId,
        index: usize,
        species: String,
    },
    MoveMade {
        side: SideId,
        #[serde(rename = "move")]
        move_id: String,
    },
    Miss {
        side: SideId,
        #[serde(rename = "move")]
        move_id: String,
    },
    Damage {
        side: SideId,
        amount: u16,
        cause: DamageCause,
        #[serde(default)]
        critical: bool,
        #[serde(default = "neutral")]
        effectiveness: f64,
    },
    Heal {
        side: SideId,
        amount: u16,
        source: HealSource,
    },
    SubstituteHit {
        side: SideId,
        absorbed: u16,
        broke: bool,
    },
    StatusApplied {
        side: SideId,
        status: StatusKind,
    },
    StatusCured {
        side: SideId,
        status: StatusKind,
    },
    StatusTick {
        side: SideId,
        status: StatusKind,
        amount: u16,
    },
    VolatileStarted {
        side: SideId,
        volatile: VolatileKind,
    },
    VolatileEnded {
        side: SideId,
        volatile: VolatileKind,
    },
    StatChange {
        side: SideId,
        stat: Stat,
        delta: i8,
        stage: i8,
    },
    ItemHeal {
        side: SideId,
        item: String,
        amount: u16,
    },
    ItemRemoved {
        side: SideId,
        item: String,
    },
    WeatherChip {
        side: SideId,
        weather: Weather,
        amount: u16,
    },
    Hazard {
        side: SideId,
        hazard: HazardKind,
        amount: u16,
    },
    HazardSet {
        side: SideId,
        hazard: HazardKind,
        layers: u8,
    },
    HazardsCleared {
        side: SideId,
    },
    /// One hazard lifted on its own, such as toxic spikes absorbed on entry.
    HazardRemoved {
        side: SideId,
        hazard: HazardKind,
    },
    FieldSet {
        condition: FieldCondition,
        turns: u8,
    },
    FieldEnded {
        condition: FieldCondition,
    },
    PokemonFainted {
        side: SideId,
        index: usize,
        species: String,
    },
    TurnEnd {
        turn: u32,
    },
    BattleEnd {
        winner: Option<SideId>,
        result: BattleResult,
    },
    Message {
        text: String,
    },
}

fn neutral() -> f64 {
    1.0
}

impl BattleEvent {
    pub fn message(text: impl Into<String>) -> Self {
        BattleEvent::Message { text: text.into() }
    }
}

/// Append-only record of every published event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = BattleEvent>) {
        self.events.extend(events);
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[BattleEvent] {
        &self.events
    }

    /// The trailing `count` events.
    pub fn tail(&self, count: usize) -> &[BattleEvent] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kebab_case_tags() {
        let event = BattleEvent::SwitchOk {
            side: SideId::P2,
            index: 3,
            species: "Gengar".to_string(),
        };
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["type"], "switch-ok");
        assert_eq!(json["side"], "p2");

        let fainted = BattleEvent::PokemonFainted {
            side: SideId::P1,
            index: 0,
            species: "Pikachu".to_string(),
        };
        let json = serde_json::to_value(&fainted).expect("serializable");
        assert_eq!(json["type"], "pokemon-fainted");

        let chip = BattleEvent::WeatherChip {
            side: SideId::P1,
            weather: Weather::Sand,
            amount: 9,
        };
        let json = serde_json::to_value(&chip).expect("serializable");
        assert_eq!(json["type"], "weather-chip");
        assert_eq!(json["weather"], "sand");
    }

    #[test]
    fn move_events_use_move_key() {
        let raw = r#"{ "type": "move-made", "side": "p1", "move": "tackle" }"#;
        let event: BattleEvent = serde_json::from_str(raw).expect("valid event");
        assert_eq!(
            event,
            BattleEvent::MoveMade {
                side: SideId::P1,
                move_id: "tackle".to_string()
            }
        );
    }

    #[test]
    fn log_tail_is_bounded() {
        let mut log = EventLog::new();
        for turn in 1..=5 {
            log.push(BattleEvent::TurnEnd { turn });
        }
        assert_eq!(log.tail(2), &[
            BattleEvent::TurnEnd { turn: 4 },
            BattleEvent::TurnEnd { turn: 5 },
        ]);
        assert_eq!(log.tail(50).len(), 5);
    }
}
