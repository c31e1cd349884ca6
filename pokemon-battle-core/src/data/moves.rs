use crate::data::normalize_id;
use crate::data::types::Type;
use crate::sim::hazards::HazardKind;
use crate::sim::stats::Stat;
use crate::sim::status::StatusKind;
use crate::sim::weather_field::{Terrain, Weather};
use serde::{Deserialize, Serialize};

pub const STRUGGLE_POWER: u16 = 50;
/// Percent of the user's max hp lost after struggling.
pub const STRUGGLE_RECOIL_PERCENT: u8 = 25;
pub const CONFUSION_HIT_POWER: u16 = 40;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveTarget {
    #[default]
    Opponent,
    User,
    OpponentSide,
    UserSide,
    Field,
}

impl MoveTarget {
    /// Targets that put a substitute or protect in the way.
    pub fn hits_opponent(self) -> bool {
        matches!(self, MoveTarget::Opponent)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveFlag {
    Contact,
    Sound,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HitRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectTarget {
    User,
    Target,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardScope {
    User,
    Target,
    Both,
}

fn always() -> u8 {
    100
}

/// One declarative step of a move. A move's effects run in list order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MoveEffect {
    Ailment {
        status: StatusKind,
        #[serde(default = "always")]
        chance: u8,
    },
    Confuse {
        #[serde(default = "always")]
        chance: u8,
    },
    Flinch {
        chance: u8,
    },
    StatChange {
        target: EffectTarget,
        stat: Stat,
        stages: i8,
        #[serde(default = "always")]
        chance: u8,
    },
    Drain {
        percent: u8,
    },
    Recoil {
        percent: u8,
    },
    Heal {
        percent: u8,
    },
    Rest,
    Protect,
    Substitute,
    LeechSeed,
    Taunt {
        turns: u8,
    },
    Encore {
        turns: u8,
    },
    SetHazard {
        hazard: HazardKind,
    },
    ClearHazards {
        scope: HazardScope,
    },
    SetWeather {
        weather: Weather,
    },
    SetTerrain {
        terrain: Terrain,
    },
    ForceSwitch,
    SelfSwitch,
    KnockOff,
}

fn default_accuracy() -> Option<u8> {
    Some(100)
}

fn default_pp() -> u8 {
    10
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub name: String,
    /// `None` for typeless hits (struggle, confusion).
    #[serde(rename = "type", default)]
    pub move_type: Option<Type>,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u16,
    /// `None` never misses.
    #[serde(default = "default_accuracy")]
    pub accuracy: Option<u8>,
    #[serde(default = "default_pp")]
    pub pp: u8,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub target: MoveTarget,
    #[serde(default)]
    pub hits: Option<HitRange>,
    #[serde(default)]
    pub flags: Vec<MoveFlag>,
    #[serde(default)]
    pub effects: Vec<MoveEffect>,
}

impl MoveData {
    pub fn id(&self) -> String {
        normalize_id(&self.name)
    }

    pub fn is_status(&self) -> bool {
        matches!(self.category, MoveCategory::Status)
    }

    pub fn has_flag(&self, flag: MoveFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_struggle(&self) -> bool {
        self.id() == "struggle"
    }

    /// Fallback attack once every move is out of PP, and the stand-in for
    /// any move the catalog cannot provide.
    pub fn struggle() -> Self {
        Self {
            name: "struggle".to_string(),
            move_type: None,
            category: MoveCategory::Physical,
            power: STRUGGLE_POWER,
            accuracy: None,
            pp: 1,
            priority: 0,
            target: MoveTarget::Opponent,
            hits: None,
            flags: vec![MoveFlag::Contact],
            effects: Vec::new(),
        }
    }

    pub fn confusion_hit() -> Self {
        Self {
            name: "confusion".to_string(),
            move_type: None,
            category: MoveCategory::Physical,
            power: CONFUSION_HIT_POWER,
            accuracy: None,
            pp: 1,
            priority: 0,
            target: MoveTarget::User,
            hits: None,
            flags: Vec::new(),
            effects: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_deserialize_from_tagged_json() {
        let raw = r#"{
            "name": "Thunderbolt",
            "type": "electric",
            "category": "special",
            "power": 90,
            "pp": 15,
            "effects": [{ "kind": "ailment", "status": "paralysis", "chance": 10 }]
        }"#;
        let data: MoveData = serde_json::from_str(raw).expect("valid move json");
        assert_eq!(data.id(), "thunderbolt");
        assert_eq!(data.accuracy, Some(100));
        assert_eq!(data.target, MoveTarget::Opponent);
        assert_eq!(
            data.effects,
            vec![MoveEffect::Ailment {
                status: StatusKind::Paralysis,
                chance: 10
            }]
        );
    }

    #[test]
    fn null_accuracy_never_misses() {
        let raw = r#"{ "name": "Protect", "type": "normal", "category": "status",
                       "accuracy": null, "priority": 4, "target": "user",
                       "effects": [{ "kind": "protect" }] }"#;
        let data: MoveData = serde_json::from_str(raw).expect("valid move json");
        assert_eq!(data.accuracy, None);
        assert!(data.is_status());
    }

    #[test]
    fn struggle_is_typeless() {
        let struggle = MoveData::struggle();
        assert!(struggle.is_struggle());
        assert!(struggle.move_type.is_none());
        assert_eq!(struggle.power, STRUGGLE_POWER);
    }
}
