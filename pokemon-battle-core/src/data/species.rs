use crate::data::normalize_id;
use crate::data::types::Type;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub atk: u16,
    pub def: u16,
    pub spa: u16,
    pub spd: u16,
    pub spe: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub name: String,
    /// National dex number, 0 when unknown.
    #[serde(default)]
    pub dex: u16,
    pub types: Vec<Type>,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Move ids this species may know. Empty means unrestricted.
    #[serde(default)]
    pub learnset: Vec<String>,
}

/// Inclusive dex ranges introduced by each generation.
const GENERATION_RANGES: [(u8, u16, u16); 9] = [
    (1, 1, 151),
    (2, 152, 251),
    (3, 252, 386),
    (4, 387, 493),
    (5, 494, 649),
    (6, 650, 721),
    (7, 722, 809),
    (8, 810, 905),
    (9, 906, 1025),
];

impl SpeciesData {
    pub fn id(&self) -> String {
        normalize_id(&self.name)
    }

    pub fn generation(&self) -> Option<u8> {
        GENERATION_RANGES
            .iter()
            .find(|(_, first, last)| (*first..=*last).contains(&self.dex))
            .map(|(generation, _, _)| *generation)
    }

    pub fn can_learn(&self, move_id: &str) -> bool {
        let wanted = normalize_id(move_id);
        self.learnset.is_empty() || self.learnset.iter().any(|known| normalize_id(known) == wanted)
    }

    /// Neutral stand-in used when the catalog has no record for `name`.
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dex: 0,
            types: vec![Type::Normal],
            base_stats: BaseStats {
                hp: 70,
                atk: 70,
                def: 70,
                spa: 70,
                spd: 70,
                spe: 70,
            },
            abilities: Vec::new(),
            learnset: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_follows_dex_number() {
        let mut species = SpeciesData::placeholder("Missingmon");
        assert_eq!(species.generation(), None);
        species.dex = 151;
        assert_eq!(species.generation(), Some(1));
        species.dex = 445;
        assert_eq!(species.generation(), Some(4));
        species.dex = 1025;
        assert_eq!(species.generation(), Some(9));
    }

    #[test]
    fn empty_learnset_allows_anything() {
        let mut species = SpeciesData::placeholder("Missingmon");
        assert!(species.can_learn("earthquake"));
        species.learnset = vec!["tackle".to_string(), "leech-seed".to_string()];
        assert!(species.can_learn("Leech Seed"));
        assert!(!species.can_learn("earthquake"));
    }
}
