//! Tunable ruleset shared by every room.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Probability of a critical hit on any damaging hit.
pub const CRIT_CHANCE: f64 = 1.0 / 16.0;
pub const CRIT_MULTIPLIER: f64 = 1.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub name: String,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub weather_turns: u8,
    pub terrain_turns: u8,
    /// Hp ratio under which the bot considers switching out.
    pub bot_switch_threshold: f64,
    pub bot_switch_chance: f64,
    pub max_team_size: usize,
    pub max_moves: usize,
    /// Generations whose species may be fielded. Empty allows all of them.
    pub generations: Vec<u8>,
    pub default_level: u8,
    /// Number of trailing events included in a snapshot.
    pub log_window: usize,
    /// Battles still running after this many turns end in a draw.
    pub turn_limit: u32,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            name: "singles-standard".to_string(),
            crit_chance: CRIT_CHANCE,
            crit_multiplier: CRIT_MULTIPLIER,
            weather_turns: 5,
            terrain_turns: 5,
            bot_switch_threshold: 0.3,
            bot_switch_chance: 0.5,
            max_team_size: 6,
            max_moves: 4,
            generations: Vec::new(),
            default_level: 50,
            log_window: 40,
            turn_limit: 1000,
        }
    }
}

impl Ruleset {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let ruleset: Ruleset = serde_json::from_str(raw).context("Failed to parse ruleset JSON")?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ruleset at {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("Invalid ruleset in {}", path.display()))
    }

    /// Range checks for every probability and size field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.crit_chance) {
            anyhow::bail!("crit_chance must be within [0, 1], got {}", self.crit_chance);
        }
        if !(0.0..=1.0).contains(&self.bot_switch_chance) {
            anyhow::bail!(
                "bot_switch_chance must be within [0, 1], got {}",
                self.bot_switch_chance
            );
        }
        if self.max_team_size == 0 || self.max_moves == 0 {
            anyhow::bail!("max_team_size and max_moves must be positive");
        }
        if let Some(generation) = self.generations.iter().find(|g| !(1..=9).contains(*g)) {
            anyhow::bail!("generations must be within 1..=9, got {generation}");
        }
        if self.default_level == 0 || self.default_level > 100 {
            anyhow::bail!("default_level must be within 1..=100");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let ruleset = Ruleset::from_json_str(r#"{ "weather_turns": 8 }"#).expect("valid json");
        assert_eq!(ruleset.weather_turns, 8);
        assert_eq!(ruleset.terrain_turns, 5);
        assert_eq!(ruleset.crit_chance, CRIT_CHANCE);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(Ruleset::from_json_str(r#"{ "crit_chance": 2.0 }"#).is_err());
        assert!(Ruleset::from_json_str(r#"{ "default_level": 0 }"#).is_err());
        assert!(Ruleset::from_json_str(r#"{ "generations": [1, 12] }"#).is_err());
        assert!(Ruleset::from_json_str("not json").is_err());
    }
}
