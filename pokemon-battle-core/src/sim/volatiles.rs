//! Switch-scoped effects keyed by kind, independent of primary status.

use crate::sim::battle::SideId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONFUSION_SELF_HIT_CHANCE: f64 = 1.0 / 3.0;
pub const MIN_CONFUSION_TURNS: u8 = 1;
pub const MAX_CONFUSION_TURNS: u8 = 4;
/// Substitute costs and stores this share of max hp.
pub const SUBSTITUTE_DIVISOR: u16 = 4;
pub const LEECH_SEED_DIVISOR: u16 = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolatileKind {
    Protect,
    Substitute,
    Confusion,
    Flinch,
    LeechSeed,
    Taunt,
    Encore,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Volatile {
    Protect,
    Substitute { hp: u16 },
    Confusion { turns: u8 },
    Flinch,
    LeechSeed { source: SideId },
    Taunt { turns: u8 },
    Encore { move_id: String, turns: u8 },
}

impl Volatile {
    pub fn kind(&self) -> VolatileKind {
        match self {
            Volatile::Protect => VolatileKind::Protect,
            Volatile::Substitute { .. } => VolatileKind::Substitute,
            Volatile::Confusion { .. } => VolatileKind::Confusion,
            Volatile::Flinch => VolatileKind::Flinch,
            Volatile::LeechSeed { .. } => VolatileKind::LeechSeed,
            Volatile::Taunt { .. } => VolatileKind::Taunt,
            Volatile::Encore { .. } => VolatileKind::Encore,
        }
    }

    /// Counter ticked at end of turn, for the kinds that carry one.
    fn turns_mut(&mut self) -> Option<&mut u8> {
        match self {
            Volatile::Confusion { turns }
            | Volatile::Taunt { turns }
            | Volatile::Encore { turns, .. } => Some(turns),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SubstituteHit {
    pub absorbed: u16,
    pub broke: bool,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolatileSet(BTreeMap<VolatileKind, Volatile>);

impl VolatileSet {
    /// Adds `volatile` unless one of the same kind is already active.
    pub fn apply(&mut self, volatile: Volatile) -> bool {
        let kind = volatile.kind();
        if self.0.contains_key(&kind) {
            return false;
        }
        self.0.insert(kind, volatile);
        true
    }

    /// Adds or overwrites.
    pub fn set(&mut self, volatile: Volatile) {
        self.0.insert(volatile.kind(), volatile);
    }

    pub fn has(&self, kind: VolatileKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn get(&self, kind: VolatileKind) -> Option<&Volatile> {
        self.0.get(&kind)
    }

    pub fn remove(&mut self, kind: VolatileKind) -> Option<Volatile> {
        self.0.remove(&kind)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn kinds(&self) -> impl Iterator<Item = VolatileKind> + '_ {
        self.0.keys().copied()
    }

    pub fn substitute_hp(&self) -> Option<u16> {
        match self.get(VolatileKind::Substitute) {
            Some(Volatile::Substitute { hp }) => Some(*hp),
            _ => None,
        }
    }

    pub fn is_confused(&self) -> bool {
        matches!(self.get(VolatileKind::Confusion), Some(Volatile::Confusion { turns }) if *turns > 0)
    }

    pub fn is_taunted(&self) -> bool {
        matches!(self.get(VolatileKind::Taunt), Some(Volatile::Taunt { turns }) if *turns > 0)
    }

    pub fn encored_move(&self) -> Option<&str> {
        match self.get(VolatileKind::Encore) {
            Some(Volatile::Encore { move_id, turns }) if *turns > 0 => Some(move_id.as_str()),
            _ => None,
        }
    }

    pub fn leech_seed_source(&self) -> Option<SideId> {
        match self.get(VolatileKind::LeechSeed) {
            Some(Volatile::LeechSeed { source }) => Some(*source),
            _ => None,
        }
    }

    /// Consumes the flinch flag. Returns whether it was set.
    pub fn take_flinch(&mut self) -> bool {
        self.remove(VolatileKind::Flinch).is_some()
    }

    /// Routes `damage` into the substitute. Removes it once its budget is
    /// spent. Returns `None` when no substitute is up.
    pub fn absorb(&mut self, damage: u16) -> Option<SubstituteHit> {
        let Some(Volatile::Substitute { hp }) = self.0.get_mut(&VolatileKind::Substitute) else {
            return None;
        };
        let absorbed = damage.min(*hp);
        *hp -= absorbed;
        let broke = *hp == 0;
        if broke {
            self.0.remove(&VolatileKind::Substitute);
        }
        Some(SubstituteHit { absorbed, broke })
    }

    /// End-of-turn decrement of the counted volatiles. Returns the kinds
    /// that ran out.
    pub fn tick(&mut self) -> Vec<VolatileKind> {
        let mut ended = Vec::new();
        for (kind, volatile) in self.0.iter_mut() {
            if let Some(turns) = volatile.turns_mut() {
                *turns = turns.saturating_sub(1);
                if *turns == 0 {
                    ended.push(*kind);
                }
            }
        }
        for kind in &ended {
            self.0.remove(kind);
        }
        ended
    }

    /// Drops the effects that never outlive the turn they were set in.
    pub fn clear_turn_scoped(&mut self) {
        self.0.remove(&VolatileKind::Protect);
        self.0.remove(&VolatileKind::Flinch);
    }
}
