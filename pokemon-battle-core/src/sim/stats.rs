use crate::data::species::BaseStats;
use serde::{Deserialize, Serialize};

pub const MIN_STAGE: i8 = -6;
pub const MAX_STAGE: i8 = 6;

/// Stats that carry a stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
    Acc,
    Eva,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatsSet {
    pub hp: u16,
    pub atk: u16,
    pub def: u16,
    pub spa: u16,
    pub spd: u16,
    pub spe: u16,
}

impl StatsSet {
    pub fn from_base(base: &BaseStats, level: u8) -> Self {
        Self {
            hp: calc_hp(base.hp, level),
            atk: calc_stat(base.atk, level),
            def: calc_stat(base.def, level),
            spa: calc_stat(base.spa, level),
            spd: calc_stat(base.spd, level),
            spe: calc_stat(base.spe, level),
        }
    }
}

pub fn calc_hp(base: u16, level: u8) -> u16 {
    let scaled = (2 * base as u32 * level as u32) / 100;
    (scaled + level as u32 + 10) as u16
}

pub fn calc_stat(base: u16, level: u8) -> u16 {
    let scaled = (2 * base as u32 * level as u32) / 100;
    (scaled + 5) as u16
}

pub fn stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(MIN_STAGE, MAX_STAGE) as i32;
    if stage >= 0 {
        (2 + stage) as f64 / 2.0
    } else {
        2.0 / (2 - stage) as f64
    }
}

pub fn accuracy_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(MIN_STAGE, MAX_STAGE) as i32;
    if stage >= 0 {
        (3 + stage) as f64 / 3.0
    } else {
        3.0 / (3 - stage) as f64
    }
}

/// Stages for every staged stat, always within [-6, 6].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatStages {
    pub atk: i8,
    pub def: i8,
    pub spa: i8,
    pub spd: i8,
    pub spe: i8,
    pub acc: i8,
    pub eva: i8,
}

impl StatStages {
    pub fn get(&self, stat: Stat) -> i8 {
        match stat {
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
            Stat::Acc => self.acc,
            Stat::Eva => self.eva,
        }
    }

    fn slot_mut(&mut self, stat: Stat) -> &mut i8 {
        match stat {
            Stat::Atk => &mut self.atk,
            Stat::Def => &mut self.def,
            Stat::Spa => &mut self.spa,
            Stat::Spd => &mut self.spd,
            Stat::Spe => &mut self.spe,
            Stat::Acc => &mut self.acc,
            Stat::Eva => &mut self.eva,
        }
    }

    /// Applies `delta` with saturation and returns the change actually made.
    pub fn apply(&mut self, stat: Stat, delta: i8) -> i8 {
        let slot = self.slot_mut(stat);
        let current = *slot;
        let next = current.saturating_add(delta).clamp(MIN_STAGE, MAX_STAGE);
        *slot = next;
        next - current
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn all_in_range(&self) -> bool {
        [self.atk, self.def, self.spa, self.spd, self.spe, self.acc, self.eva]
            .iter()
            .all(|stage| (MIN_STAGE..=MAX_STAGE).contains(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn derived_stats_follow_level_formula() {
        // Charizard base 78 hp / 84 atk at level 50.
        assert_eq!(calc_hp(78, 50), 78 + 50 + 10);
        assert_eq!(calc_stat(84, 50), 84 + 5);
        assert_eq!(calc_hp(35, 100), 70 + 100 + 10);
        assert_eq!(calc_stat(55, 37), (2 * 55 * 37) / 100 + 5);
    }

    #[test]
    fn stage_multipliers_match_tables() {
        assert_eq!(stage_multiplier(0), 1.0);
        assert_eq!(stage_multiplier(2), 2.0);
        assert_eq!(stage_multiplier(6), 4.0);
        assert_eq!(stage_multiplier(-2), 0.5);
        assert_eq!(stage_multiplier(-6), 0.25);
        assert_eq!(accuracy_multiplier(3), 2.0);
        assert_eq!(accuracy_multiplier(-3), 0.5);
    }

    #[test]
    fn repeated_boosts_saturate() {
        let mut stages = StatStages::default();
        for _ in 0..5 {
            stages.apply(Stat::Atk, 2);
        }
        assert_eq!(stages.atk, MAX_STAGE);
        assert_eq!(stages.apply(Stat::Atk, 1), 0);
        for _ in 0..10 {
            stages.apply(Stat::Atk, -3);
        }
        assert_eq!(stages.atk, MIN_STAGE);
        assert_eq!(stages.apply(Stat::Atk, i8::MIN), 0);
    }

    #[test]
    fn random_stage_sequences_stay_in_range() {
        let stats = [
            Stat::Atk,
            Stat::Def,
            Stat::Spa,
            Stat::Spd,
            Stat::Spe,
            Stat::Acc,
            Stat::Eva,
        ];
        let mut rng = SmallRng::seed_from_u64(11);
        let mut stages = StatStages::default();
        for _ in 0..5_000 {
            let stat = stats[rng.gen_range(0..stats.len())];
            let delta = rng.gen_range(-12..=12);
            let before = stages.get(stat);
            let applied = stages.apply(stat, delta);
            assert_eq!(stages.get(stat), before + applied);
            assert!(stages.all_in_range());
        }
    }
}
