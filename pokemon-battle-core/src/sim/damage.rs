use crate::config::Ruleset;
use crate::data::moves::{MoveCategory, MoveData};
use crate::data::types::{effectiveness_against, Type};
use crate::sim::abilities::{self, Ability, GUTS_MULTIPLIER};
use crate::sim::combatant::Combatant;
use crate::sim::items;
use crate::sim::stats::{stage_multiplier, Stat};
use crate::sim::status::StatusKind;
use crate::sim::weather_field::{terrain_damage_modifier, weather_damage_modifier, FieldState};
use rand::rngs::SmallRng;
use rand::Rng;

pub const STAB_MULTIPLIER: f64 = 1.5;
pub const MIN_RANDOM_FACTOR: f64 = 0.85;

/// Multipliers applied on top of the base damage, all neutral at 1.0.
#[derive(Clone, Copy, Debug)]
pub struct DamageModifiers {
    pub ability: f64,
    pub weather: f64,
    pub terrain: f64,
    pub crit: f64,
    pub item: f64,
}

impl Default for DamageModifiers {
    fn default() -> Self {
        Self {
            ability: 1.0,
            weather: 1.0,
            terrain: 1.0,
            crit: 1.0,
            item: 1.0,
        }
    }
}

/// The random inputs of one damage roll, drawn before the pure calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRolls {
    pub critical: bool,
    pub random_factor: f64,
}

impl DamageRolls {
    pub fn neutral() -> Self {
        Self {
            critical: false,
            random_factor: 1.0,
        }
    }

    pub fn roll(rng: &mut SmallRng, ruleset: &Ruleset) -> Self {
        Self {
            critical: rng.gen::<f64>() < ruleset.crit_chance,
            random_factor: rng.gen_range(MIN_RANDOM_FACTOR..=1.0),
        }
    }

    /// Confusion self-hits never crit.
    pub fn roll_without_crit(rng: &mut SmallRng) -> Self {
        Self {
            critical: false,
            random_factor: rng.gen_range(MIN_RANDOM_FACTOR..=1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    pub damage: u16,
    pub effectiveness: f64,
    pub critical: bool,
}

fn compute_base_damage(level: u8, attack: f64, defense: f64, power: u16) -> f64 {
    let level_factor = 2.0 * level as f64 / 5.0 + 2.0;
    (level_factor * power as f64 * attack / defense.max(1.0) / 50.0).floor() + 2.0
}

/// Core formula over already-resolved stats: floor of the chained product,
/// at least 1, and exactly 0 when the move has no effect.
pub fn calculate_damage_with_modifiers(
    attacker_level: u8,
    attack: f64,
    defense: f64,
    move_power: u16,
    type_effectiveness: f64,
    stab: bool,
    random_factor: f64,
    modifiers: DamageModifiers,
) -> u16 {
    if type_effectiveness == 0.0 || move_power == 0 {
        return 0;
    }
    let base = compute_base_damage(attacker_level, attack, defense, move_power);
    let stab = if stab { STAB_MULTIPLIER } else { 1.0 };
    let total = base
        * stab
        * modifiers.ability
        * type_effectiveness
        * modifiers.weather
        * modifiers.terrain
        * modifiers.crit
        * random_factor.clamp(MIN_RANDOM_FACTOR, 1.0)
        * modifiers.item;
    (total.floor() as u32).clamp(1, u16::MAX as u32) as u16
}

pub fn type_effectiveness(defender: &Combatant, move_type: Option<Type>) -> f64 {
    let Some(move_type) = move_type else {
        return 1.0;
    };
    if move_type == Type::Ground && defender.ability() == Some(Ability::Levitate) {
        return 0.0;
    }
    effectiveness_against(move_type, &defender.types)
}

fn attacking_stat(attacker: &Combatant, category: MoveCategory) -> f64 {
    let (raw, stage) = match category {
        MoveCategory::Special => (attacker.stats.spa, attacker.stages.get(Stat::Spa)),
        _ => (attacker.stats.atk, attacker.stages.get(Stat::Atk)),
    };
    let mut attack = raw as f64 * stage_multiplier(stage);
    if category == MoveCategory::Physical {
        let guts = attacker.ability() == Some(Ability::Guts);
        if guts && attacker.status.is_some() {
            attack *= GUTS_MULTIPLIER;
        } else if !guts && attacker.has_status(StatusKind::Burn) {
            attack *= 0.5;
        }
    }
    attack
}

fn defending_stat(defender: &Combatant, category: MoveCategory) -> f64 {
    let (raw, stage) = match category {
        MoveCategory::Special => (defender.stats.spd, defender.stages.get(Stat::Spd)),
        _ => (defender.stats.def, defender.stages.get(Stat::Def)),
    };
    raw as f64 * stage_multiplier(stage)
}

/// Pure damage of one hit of `move_data` from `attacker` to `defender`.
///
/// Typeless hits (struggle, confusion) ignore STAB, abilities, weather,
/// terrain and items.
pub fn calculate_damage(
    attacker: &Combatant,
    defender: &Combatant,
    move_data: &MoveData,
    field: &FieldState,
    ruleset: &Ruleset,
    rolls: DamageRolls,
) -> DamageOutcome {
    let effectiveness = type_effectiveness(defender, move_data.move_type);
    let mut modifiers = DamageModifiers {
        crit: if rolls.critical {
            ruleset.crit_multiplier
        } else {
            1.0
        },
        ..DamageModifiers::default()
    };
    let mut stab = false;
    if let Some(move_type) = move_data.move_type {
        stab = attacker.has_type(move_type);
        modifiers.ability = abilities::power_boost(attacker, move_type);
        modifiers.weather = weather_damage_modifier(field.weather(), move_type);
        modifiers.terrain =
            terrain_damage_modifier(field.terrain(), attacker.is_grounded(), move_type);
        modifiers.item = items::damage_modifier(attacker);
    }
    let damage = calculate_damage_with_modifiers(
        attacker.level,
        attacking_stat(attacker, move_data.category),
        defending_stat(defender, move_data.category),
        move_data.power,
        effectiveness,
        stab,
        rolls.random_factor,
        modifiers,
    );
    DamageOutcome {
        damage,
        effectiveness,
        critical: rolls.critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{builtin, Catalog};
    use crate::sim::combatant::tests::make_combatant;
    use crate::sim::status::PrimaryStatus;
    use crate::sim::weather_field::Weather;
    use rand::SeedableRng;

    fn neutral_hit(random_factor: f64) -> u16 {
        calculate_damage_with_modifiers(
            50,
            100.0,
            100.0,
            80,
            1.0,
            false,
            random_factor,
            DamageModifiers::default(),
        )
    }

    #[test]
    fn level_fifty_neutral_hit_band() {
        assert_eq!(neutral_hit(1.0), 37);
        assert_eq!(neutral_hit(MIN_RANDOM_FACTOR), 31);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..1_000 {
            let roll = DamageRolls::roll_without_crit(&mut rng);
            assert!((31..=37).contains(&neutral_hit(roll.random_factor)));
        }
    }

    #[test]
    fn crit_roll_tolerates_unvalidated_chances() {
        let mut rng = SmallRng::seed_from_u64(2);
        let always = Ruleset {
            crit_chance: 2.0,
            ..Ruleset::default()
        };
        let never = Ruleset {
            crit_chance: -1.0,
            ..Ruleset::default()
        };
        for _ in 0..100 {
            assert!(DamageRolls::roll(&mut rng, &always).critical);
            assert!(!DamageRolls::roll(&mut rng, &never).critical);
        }
    }

    #[test]
    fn zero_effectiveness_is_exactly_zero() {
        let damage = calculate_damage_with_modifiers(
            100,
            500.0,
            1.0,
            250,
            0.0,
            true,
            1.0,
            DamageModifiers {
                crit: 1.5,
                ..DamageModifiers::default()
            },
        );
        assert_eq!(damage, 0);
    }

    #[test]
    fn weak_hits_still_deal_one() {
        let damage = calculate_damage_with_modifiers(
            1,
            5.0,
            500.0,
            10,
            0.25,
            false,
            MIN_RANDOM_FACTOR,
            DamageModifiers::default(),
        );
        assert_eq!(damage, 1);
    }

    #[test]
    fn random_matchups_respect_damage_floor() {
        let catalog = builtin().expect("bundled catalog parses");
        let mut ids: Vec<&str> = catalog.move_ids().collect();
        ids.sort_unstable();
        let attacker = make_combatant("pikachu", &["tackle"]);
        let field = FieldState::default();
        let ruleset = Ruleset::default();
        let mut rng = SmallRng::seed_from_u64(5);
        for species in ["snorlax", "skarmory", "gengar", "toxapex", "garchomp"] {
            let defender = make_combatant(species, &["tackle"]);
            for id in &ids {
                let data = catalog.move_data(id).expect("listed move");
                if data.power == 0 {
                    continue;
                }
                let rolls = DamageRolls::roll(&mut rng, &ruleset);
                let outcome =
                    calculate_damage(&attacker, &defender, &data, &field, &ruleset, rolls);
                if outcome.effectiveness == 0.0 {
                    assert_eq!(outcome.damage, 0, "{id} into {species}");
                } else {
                    assert!(outcome.damage >= 1, "{id} into {species}");
                }
            }
        }
    }

    #[test]
    fn levitate_nullifies_ground() {
        let catalog = builtin().expect("bundled catalog parses");
        let attacker = make_combatant("garchomp", &["earthquake"]);
        let defender = make_combatant("weezing", &["tackle"]);
        let earthquake = catalog.move_data("earthquake").expect("earthquake");
        let outcome = calculate_damage(
            &attacker,
            &defender,
            &earthquake,
            &FieldState::default(),
            &Ruleset::default(),
            DamageRolls::neutral(),
        );
        assert_eq!(outcome.effectiveness, 0.0);
        assert_eq!(outcome.damage, 0);
    }

    #[test]
    fn rain_boosts_water_and_stab_applies() {
        let catalog = builtin().expect("bundled catalog parses");
        let attacker = make_combatant("blastoise", &["surf"]);
        let defender = make_combatant("snorlax", &["tackle"]);
        let surf = catalog.move_data("surf").expect("surf");
        let ruleset = Ruleset::default();
        let mut field = FieldState::default();
        let dry = calculate_damage(&attacker, &defender, &surf, &field, &ruleset, DamageRolls::neutral());
        field.set_weather(Weather::Rain, 5);
        let wet = calculate_damage(&attacker, &defender, &surf, &field, &ruleset, DamageRolls::neutral());
        assert!(wet.damage > dry.damage);
        assert!((wet.damage as f64 / dry.damage as f64 - 1.5).abs() < 0.05);
    }

    #[test]
    fn burn_halves_physical_unless_guts() {
        let catalog = builtin().expect("bundled catalog parses");
        let cross_chop = catalog.move_data("cross-chop").expect("cross chop");
        let defender = make_combatant("snorlax", &["tackle"]);
        let field = FieldState::default();
        let ruleset = Ruleset::default();

        let mut machamp = make_combatant("machamp", &["cross-chop"]);
        let healthy = calculate_damage(&machamp, &defender, &cross_chop, &field, &ruleset, DamageRolls::neutral());
        machamp.status = Some(PrimaryStatus::Burn);
        let guts = calculate_damage(&machamp, &defender, &cross_chop, &field, &ruleset, DamageRolls::neutral());
        assert!(guts.damage > healthy.damage);

        machamp.ability = "noability".to_string();
        let burned = calculate_damage(&machamp, &defender, &cross_chop, &field, &ruleset, DamageRolls::neutral());
        assert!(burned.damage < healthy.damage);
    }

    #[test]
    fn critical_hits_use_ruleset_multiplier() {
        let catalog = builtin().expect("bundled catalog parses");
        let attacker = make_combatant("dragonite", &["dragon-claw"]);
        let defender = make_combatant("snorlax", &["tackle"]);
        let claw = catalog.move_data("dragon-claw").expect("dragon claw");
        let ruleset = Ruleset::default();
        let field = FieldState::default();
        let normal = calculate_damage(&attacker, &defender, &claw, &field, &ruleset, DamageRolls::neutral());
        let crit = calculate_damage(
            &attacker,
            &defender,
            &claw,
            &field,
            &ruleset,
            DamageRolls {
                critical: true,
                random_factor: 1.0,
            },
        );
        assert!(crit.critical);
        assert!(crit.damage > normal.damage);
    }
}
