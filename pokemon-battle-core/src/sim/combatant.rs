use crate::data::moves::MoveData;
use crate::data::normalize_id;
use crate::data::species::SpeciesData;
use crate::data::types::Type;
use crate::error::InvariantViolation;
use crate::sim::abilities::Ability;
use crate::sim::items::Item;
use crate::sim::stats::{StatStages, StatsSet};
use crate::sim::status::{self, PrimaryStatus, StatusKind};
use crate::sim::volatiles::VolatileSet;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub data: MoveData,
    pub current_pp: u8,
}

impl MoveSlot {
    pub fn new(data: MoveData) -> Self {
        let current_pp = data.pp;
        Self { data, current_pp }
    }

    pub fn id(&self) -> String {
        self.data.id()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub species: String,
    pub level: u8,
    pub types: Vec<Type>,
    pub stats: StatsSet,
    pub current_hp: u16,
    pub fainted: bool,
    pub status: Option<PrimaryStatus>,
    pub stages: StatStages,
    pub ability: String,
    pub item: Option<String>,
    pub item_consumed: bool,
    pub moves: Vec<MoveSlot>,
    pub volatiles: VolatileSet,
    /// Standing fire boost earned by absorbing a fire move with flash fire.
    pub flash_fire: bool,
    /// Id of the last move actually used, for encore.
    pub last_move: Option<String>,
}

impl Combatant {
    pub fn new(
        species: &SpeciesData,
        level: u8,
        moves: Vec<MoveData>,
        ability: impl Into<String>,
        item: Option<String>,
    ) -> Self {
        let stats = StatsSet::from_base(&species.base_stats, level);
        Self {
            species: species.name.clone(),
            level,
            types: species.types.clone(),
            stats,
            current_hp: stats.hp,
            fainted: false,
            status: None,
            stages: StatStages::default(),
            ability: normalize_id(&ability.into()),
            item: item.map(|id| normalize_id(&id)),
            item_consumed: false,
            moves: moves.into_iter().map(MoveSlot::new).collect(),
            volatiles: VolatileSet::default(),
            flash_fire: false,
            last_move: None,
        }
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp() == 0 {
            return 0.0;
        }
        self.current_hp as f64 / self.max_hp() as f64
    }

    pub fn is_fainted(&self) -> bool {
        self.fainted
    }

    pub fn has_type(&self, kind: Type) -> bool {
        self.types.contains(&kind)
    }

    pub fn ability(&self) -> Option<Ability> {
        Ability::from_id(&self.ability)
    }

    /// The held item, or `None` once it has been consumed or knocked off.
    pub fn held_item(&self) -> Option<Item> {
        if self.item_consumed {
            return None;
        }
        self.item.as_deref().and_then(Item::from_id)
    }

    pub fn consume_item(&mut self) {
        self.item_consumed = true;
    }

    pub fn is_grounded(&self) -> bool {
        !self.has_type(Type::Flying) && self.ability() != Some(Ability::Levitate)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status.map(|status| status.kind()) == Some(kind)
    }

    pub fn apply_status(&mut self, kind: StatusKind, rng: &mut SmallRng) -> bool {
        status::try_apply(self, kind, rng)
    }

    pub fn move_index(&self, move_id: &str) -> Option<usize> {
        let wanted = normalize_id(move_id);
        self.moves.iter().position(|slot| slot.id() == wanted)
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves.iter().any(|slot| slot.current_pp > 0)
    }

    /// Removes up to `amount` hp and returns what was actually lost.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        if self.fainted {
            return 0;
        }
        let applied = amount.min(self.current_hp);
        self.current_hp -= applied;
        if self.current_hp == 0 {
            self.fainted = true;
        }
        applied
    }

    /// Restores up to `amount` hp and returns what was actually gained.
    pub fn heal(&mut self, amount: u16) -> u16 {
        if self.fainted {
            return 0;
        }
        let applied = amount.min(self.max_hp() - self.current_hp);
        self.current_hp += applied;
        applied
    }

    /// Stages, volatiles and the flash fire boost do not survive a switch.
    pub fn reset_on_switch(&mut self) {
        self.stages.reset();
        self.volatiles.clear();
        self.flash_fire = false;
        self.last_move = None;
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let violation = |detail: String| InvariantViolation {
            species: self.species.clone(),
            detail,
        };
        if self.current_hp > self.max_hp() {
            return Err(violation(format!(
                "hp {} exceeds max {}",
                self.current_hp,
                self.max_hp()
            )));
        }
        if self.fainted != (self.current_hp == 0) {
            return Err(violation(format!(
                "fainted flag {} with hp {}",
                self.fainted, self.current_hp
            )));
        }
        if !self.stages.all_in_range() {
            return Err(violation(format!("stages out of range: {:?}", self.stages)));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{builtin, Catalog};

    /// Level-50 combatant from the bundled catalog with its first ability.
    pub(crate) fn make_combatant(species: &str, moves: &[&str]) -> Combatant {
        let catalog = builtin().expect("bundled catalog parses");
        let species = catalog.species(species).expect("species exists");
        let moves = moves
            .iter()
            .map(|id| catalog.move_data(id).expect("move exists"))
            .collect();
        let ability = species.abilities.first().cloned().unwrap_or_default();
        Combatant::new(&species, 50, moves, ability, None)
    }

    #[test]
    fn new_combatant_starts_healthy() {
        let mon = make_combatant("charizard", &["flamethrower", "air-slash"]);
        assert_eq!(mon.current_hp, mon.max_hp());
        assert_eq!(mon.max_hp(), 78 + 50 + 10);
        assert_eq!(mon.moves[0].current_pp, mon.moves[0].data.pp);
        assert_eq!(mon.ability, "blaze");
        assert!(!mon.is_grounded());
        assert!(mon.check_invariants().is_ok());
    }

    #[test]
    fn damage_and_heal_keep_hp_in_range() {
        let mut mon = make_combatant("snorlax", &["tackle"]);
        let max = mon.max_hp();
        assert_eq!(mon.heal(50), 0);
        assert_eq!(mon.take_damage(30), 30);
        assert_eq!(mon.heal(100), 30);
        assert_eq!(mon.take_damage(u16::MAX), max);
        assert!(mon.is_fainted());
        assert_eq!(mon.take_damage(10), 0);
        assert_eq!(mon.heal(10), 0);
        assert!(mon.check_invariants().is_ok());
    }

    #[test]
    fn levitate_is_not_grounded() {
        assert!(!make_combatant("gengar", &["shadowball"]).is_grounded());
        assert!(make_combatant("garchomp", &["earthquake"]).is_grounded());
    }

    #[test]
    fn invariant_check_flags_corruption() {
        let mut mon = make_combatant("snorlax", &["tackle"]);
        mon.current_hp = 0;
        assert!(mon.check_invariants().is_err());
        mon.fainted = true;
        assert!(mon.check_invariants().is_ok());
        mon.stages.atk = 9;
        assert!(mon.check_invariants().is_err());
    }
}
