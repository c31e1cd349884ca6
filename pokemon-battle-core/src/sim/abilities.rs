use crate::data::normalize_id;
use crate::data::types::Type;
use crate::sim::combatant::Combatant;

pub const PINCH_BOOST: f64 = 1.5;
pub const GUTS_MULTIPLIER: f64 = 1.5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ability {
    Intimidate,
    Levitate,
    FlashFire,
    Overgrow,
    Blaze,
    Torrent,
    Guts,
}

static ABILITY_IDS: phf::Map<&'static str, Ability> = phf::phf_map! {
    "intimidate" => Ability::Intimidate,
    "levitate" => Ability::Levitate,
    "flashfire" => Ability::FlashFire,
    "overgrow" => Ability::Overgrow,
    "blaze" => Ability::Blaze,
    "torrent" => Ability::Torrent,
    "guts" => Ability::Guts,
};

impl Ability {
    pub fn from_id(id: &str) -> Option<Self> {
        ABILITY_IDS.get(normalize_id(id).as_str()).copied()
    }

    /// Type boosted while the holder is at or below a third of max hp.
    pub fn pinch_type(self) -> Option<Type> {
        match self {
            Ability::Overgrow => Some(Type::Grass),
            Ability::Blaze => Some(Type::Fire),
            Ability::Torrent => Some(Type::Water),
            _ => None,
        }
    }
}

/// How an ability answers an incoming move type before damage is computed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Immunity {
    Levitate,
    FlashFire,
}

pub fn immunity(defender: &Combatant, move_type: Option<Type>) -> Option<Immunity> {
    match (defender.ability(), move_type?) {
        (Some(Ability::Levitate), Type::Ground) => Some(Immunity::Levitate),
        (Some(Ability::FlashFire), Type::Fire) => Some(Immunity::FlashFire),
        _ => None,
    }
}

/// Extra 1.5x from a pinch ability or a standing flash fire boost.
pub fn power_boost(attacker: &Combatant, move_type: Type) -> f64 {
    let Some(ability) = attacker.ability() else {
        return 1.0;
    };
    let pinched = attacker.current_hp as u32 * 3 <= attacker.max_hp() as u32;
    if pinched && ability.pinch_type() == Some(move_type) {
        return PINCH_BOOST;
    }
    if ability == Ability::FlashFire && attacker.flash_fire && move_type == Type::Fire {
        return PINCH_BOOST;
    }
    1.0
}
