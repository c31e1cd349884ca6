use crate::data::types::Type;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Rain,
    Sun,
    Sand,
    Hail,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Electric,
    Grassy,
    Psychic,
    Misty,
}

impl Terrain {
    /// Move type boosted for grounded attackers.
    pub fn boosted_type(self) -> Type {
        match self {
            Terrain::Electric => Type::Electric,
            Terrain::Grassy => Type::Grass,
            Terrain::Psychic => Type::Psychic,
            Terrain::Misty => Type::Fairy,
        }
    }
}

/// Either kind of field condition, as reported in events.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "kind", rename_all = "lowercase")]
pub enum FieldCondition {
    Weather(Weather),
    Terrain(Terrain),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Timed<T> {
    pub kind: T,
    pub turns_left: u8,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub weather: Option<Timed<Weather>>,
    pub terrain: Option<Timed<Terrain>>,
}

impl FieldState {
    pub fn weather(&self) -> Option<Weather> {
        self.weather.map(|timed| timed.kind)
    }

    pub fn terrain(&self) -> Option<Terrain> {
        self.terrain.map(|timed| timed.kind)
    }

    /// Replaces any current weather and restarts the duration.
    pub fn set_weather(&mut self, kind: Weather, turns: u8) {
        self.weather = Some(Timed {
            kind,
            turns_left: turns,
        });
    }

    pub fn set_terrain(&mut self, kind: Terrain, turns: u8) {
        self.terrain = Some(Timed {
            kind,
            turns_left: turns,
        });
    }

    /// One end-of-turn decrement. Returns the conditions that expired.
    pub fn tick(&mut self) -> Vec<FieldCondition> {
        let mut ended = Vec::new();
        if let Some(kind) = tick_timed(&mut self.weather) {
            ended.push(FieldCondition::Weather(kind));
        }
        if let Some(kind) = tick_timed(&mut self.terrain) {
            ended.push(FieldCondition::Terrain(kind));
        }
        ended
    }
}

fn tick_timed<T: Copy>(slot: &mut Option<Timed<T>>) -> Option<T> {
    let timed = slot.as_mut()?;
    timed.turns_left = timed.turns_left.saturating_sub(1);
    if timed.turns_left == 0 {
        let kind = timed.kind;
        *slot = None;
        return Some(kind);
    }
    None
}

pub fn weather_damage_modifier(weather: Option<Weather>, move_type: Type) -> f64 {
    match weather {
        Some(Weather::Sun) => match move_type {
            Type::Fire => 1.5,
            Type::Water => 0.5,
            _ => 1.0,
        },
        Some(Weather::Rain) => match move_type {
            Type::Water => 1.5,
            Type::Fire => 0.5,
            _ => 1.0,
        },
        _ => 1.0,
    }
}

pub fn terrain_damage_modifier(
    terrain: Option<Terrain>,
    attacker_grounded: bool,
    move_type: Type,
) -> f64 {
    match terrain {
        Some(terrain) if attacker_grounded && terrain.boosted_type() == move_type => 1.3,
        _ => 1.0,
    }
}

/// Whether end-of-turn weather chip hits a combatant with these types.
pub fn weather_chips(weather: Option<Weather>, types: &[Type]) -> bool {
    match weather {
        Some(Weather::Sand) => !types
            .iter()
            .any(|t| matches!(t, Type::Rock | Type::Ground | Type::Steel)),
        Some(Weather::Hail) => !types.contains(&Type::Ice),
        _ => false,
    }
}
