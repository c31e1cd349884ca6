use crate::data::normalize_id;
use crate::sim::combatant::Combatant;

pub const LIFE_ORB_MULTIPLIER: f64 = 1.3;
/// Life orb recoil is 1/10 of max hp per move use.
pub const LIFE_ORB_RECOIL_DIVISOR: u16 = 10;
pub const LEFTOVERS_DIVISOR: u16 = 16;
pub const CHOICE_SCARF_SPEED: f64 = 1.5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Item {
    Leftovers,
    ChoiceScarf,
    FocusSash,
    LifeOrb,
}

static ITEM_IDS: phf::Map<&'static str, Item> = phf::phf_map! {
    "leftovers" => Item::Leftovers,
    "choicescarf" => Item::ChoiceScarf,
    "focussash" => Item::FocusSash,
    "lifeorb" => Item::LifeOrb,
};

impl Item {
    pub fn from_id(id: &str) -> Option<Self> {
        ITEM_IDS.get(normalize_id(id).as_str()).copied()
    }
}

pub fn speed_modifier(holder: &Combatant) -> f64 {
    match holder.held_item() {
        Some(Item::ChoiceScarf) => CHOICE_SCARF_SPEED,
        _ => 1.0,
    }
}

pub fn damage_modifier(holder: &Combatant) -> f64 {
    match holder.held_item() {
        Some(Item::LifeOrb) => LIFE_ORB_MULTIPLIER,
        _ => 1.0,
    }
}

/// Leftovers recovery for this end of turn, if any.
pub fn end_of_turn_heal(holder: &Combatant) -> Option<u16> {
    if holder.is_fainted() || holder.current_hp >= holder.max_hp() {
        return None;
    }
    match holder.held_item() {
        Some(Item::Leftovers) => Some((holder.max_hp() / LEFTOVERS_DIVISOR).max(1)),
        _ => None,
    }
}

pub fn life_orb_recoil(holder: &Combatant) -> Option<u16> {
    match holder.held_item() {
        Some(Item::LifeOrb) => Some((holder.max_hp() / LIFE_ORB_RECOIL_DIVISOR).max(1)),
        _ => None,
    }
}

/// Caps `damage` so a focus sash holder at full hp survives at 1 hp.
/// Returns the adjusted damage and whether the sash was spent.
pub fn focus_sash_cap(holder: &Combatant, damage: u16) -> (u16, bool) {
    let full = holder.current_hp == holder.max_hp();
    if full && damage >= holder.current_hp && holder.held_item() == Some(Item::FocusSash) {
        return (holder.current_hp.saturating_sub(1), true);
    }
    (damage, false)
}

pub fn locks_choice(holder: &Combatant) -> bool {
    holder.held_item() == Some(Item::ChoiceScarf)
}
