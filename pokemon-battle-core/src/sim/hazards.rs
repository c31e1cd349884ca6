//! Per-side entry hazards and their switch-in arithmetic.

use crate::data::types::{effectiveness_against, Type};
use crate::sim::status::StatusKind;
use serde::{Deserialize, Serialize};

pub const MAX_SPIKES: u8 = 3;
pub const MAX_TOXIC_SPIKES: u8 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HazardKind {
    StealthRock,
    Spikes,
    ToxicSpikes,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SideHazards {
    pub stealth_rock: bool,
    pub spikes: u8,
    pub toxic_spikes: u8,
}

impl SideHazards {
    /// Adds one layer. Returns false when the hazard is already at its cap.
    pub fn add(&mut self, kind: HazardKind) -> bool {
        match kind {
            HazardKind::StealthRock => !std::mem::replace(&mut self.stealth_rock, true),
            HazardKind::Spikes => bump(&mut self.spikes, MAX_SPIKES),
            HazardKind::ToxicSpikes => bump(&mut self.toxic_spikes, MAX_TOXIC_SPIKES),
        }
    }

    pub fn is_set(&self, kind: HazardKind) -> bool {
        match kind {
            HazardKind::StealthRock => self.stealth_rock,
            HazardKind::Spikes => self.spikes > 0,
            HazardKind::ToxicSpikes => self.toxic_spikes > 0,
        }
    }

    /// Whether another layer of `kind` can still be laid.
    pub fn can_add(&self, kind: HazardKind) -> bool {
        match kind {
            HazardKind::StealthRock => !self.stealth_rock,
            HazardKind::Spikes => self.spikes < MAX_SPIKES,
            HazardKind::ToxicSpikes => self.toxic_spikes < MAX_TOXIC_SPIKES,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn bump(layers: &mut u8, cap: u8) -> bool {
    if *layers >= cap {
        return false;
    }
    *layers += 1;
    true
}

/// `round(max_hp / 8 * rock effectiveness)`, at least 1 and never lethal
/// from full hp.
pub fn stealth_rock_damage(max_hp: u16, types: &[Type]) -> u16 {
    let eff = effectiveness_against(Type::Rock, types);
    let raw = (max_hp as f64 * 0.125 * eff).round() as u16;
    raw.max(1).min(max_hp.saturating_sub(1).max(1))
}

pub fn spikes_damage(max_hp: u16, layers: u8) -> u16 {
    let divisor = match layers {
        0 => return 0,
        1 => 8,
        2 => 6,
        _ => 4,
    };
    (max_hp / divisor).max(1)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToxicSpikesOutcome {
    /// Any poison type soaks up every layer, airborne or not.
    Absorbed,
    Inflict(StatusKind),
    NoEffect,
}

pub fn toxic_spikes_outcome(
    layers: u8,
    types: &[Type],
    grounded: bool,
    has_status: bool,
) -> ToxicSpikesOutcome {
    if layers == 0 {
        return ToxicSpikesOutcome::NoEffect;
    }
    if types.contains(&Type::Poison) {
        return ToxicSpikesOutcome::Absorbed;
    }
    if !grounded || has_status || types.contains(&Type::Steel) {
        return ToxicSpikesOutcome::NoEffect;
    }
    if layers >= 2 {
        ToxicSpikesOutcome::Inflict(StatusKind::Toxic)
    } else {
        ToxicSpikesOutcome::Inflict(StatusKind::Poison)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_stop_at_their_caps() {
        let mut hazards = SideHazards::default();
        assert!(hazards.add(HazardKind::StealthRock));
        assert!(!hazards.add(HazardKind::StealthRock));
        for _ in 0..MAX_SPIKES {
            assert!(hazards.add(HazardKind::Spikes));
        }
        assert!(!hazards.add(HazardKind::Spikes));
        assert!(hazards.add(HazardKind::ToxicSpikes));
        assert!(hazards.add(HazardKind::ToxicSpikes));
        assert!(!hazards.can_add(HazardKind::ToxicSpikes));
        hazards.clear();
        assert!(hazards.is_empty());
    }

    #[test]
    fn stealth_rock_scales_with_rock_weakness() {
        // Charizard is fire/flying: 4x weak.
        assert_eq!(stealth_rock_damage(153, &[Type::Fire, Type::Flying]), 77);
        assert_eq!(stealth_rock_damage(200, &[Type::Normal]), 25);
        // Steel/ground resists 4x.
        assert_eq!(stealth_rock_damage(200, &[Type::Steel, Type::Ground]), 6);
        // 1/8 * 4 of a tiny pool never reaches the full bar.
        assert_eq!(stealth_rock_damage(2, &[Type::Ice, Type::Flying]), 1);
    }

    #[test]
    fn spikes_tiers_by_layer() {
        assert_eq!(spikes_damage(240, 0), 0);
        assert_eq!(spikes_damage(240, 1), 30);
        assert_eq!(spikes_damage(240, 2), 40);
        assert_eq!(spikes_damage(240, 3), 60);
    }

    #[test]
    fn toxic_spikes_respect_typing_and_grounding() {
        assert_eq!(
            toxic_spikes_outcome(1, &[Type::Poison, Type::Water], true, false),
            ToxicSpikesOutcome::Absorbed
        );
        assert_eq!(
            toxic_spikes_outcome(2, &[Type::Normal], false, false),
            ToxicSpikesOutcome::NoEffect
        );
        assert_eq!(
            toxic_spikes_outcome(1, &[Type::Ghost, Type::Poison], false, false),
            ToxicSpikesOutcome::Absorbed
        );
        assert_eq!(
            toxic_spikes_outcome(2, &[Type::Steel], true, false),
            ToxicSpikesOutcome::NoEffect
        );
        assert_eq!(
            toxic_spikes_outcome(1, &[Type::Normal], true, true),
            ToxicSpikesOutcome::NoEffect
        );
        assert_eq!(
            toxic_spikes_outcome(1, &[Type::Normal], true, false),
            ToxicSpikesOutcome::Inflict(StatusKind::Poison)
        );
        assert_eq!(
            toxic_spikes_outcome(2, &[Type::Normal], true, false),
            ToxicSpikesOutcome::Inflict(StatusKind::Toxic)
        );
    }
}
