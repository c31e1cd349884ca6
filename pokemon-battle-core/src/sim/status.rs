//! Primary status state machine: `none -> {burn, poison, toxic, paralysis,
//! sleep, freeze} -> none`.

use crate::data::types::Type;
use crate::sim::combatant::Combatant;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PARALYSIS_SKIP_CHANCE: f64 = 0.25;
pub const FREEZE_THAW_CHANCE: f64 = 0.2;
pub const MIN_SLEEP_TURNS: u8 = 1;
pub const MAX_SLEEP_TURNS: u8 = 3;
pub const REST_SLEEP_TURNS: u8 = 2;
/// Toxic damage stops ramping at 15/16 of max hp.
pub const TOXIC_CAP: u8 = 15;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Burn,
    Poison,
    Toxic,
    Paralysis,
    Sleep,
    Freeze,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PrimaryStatus {
    Burn,
    Poison,
    /// `counter` is the numerator of the next residual tick, in sixteenths.
    Toxic { counter: u8 },
    Paralysis,
    Sleep { turns: u8 },
    Freeze,
}

impl PrimaryStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            PrimaryStatus::Burn => StatusKind::Burn,
            PrimaryStatus::Poison => StatusKind::Poison,
            PrimaryStatus::Toxic { .. } => StatusKind::Toxic,
            PrimaryStatus::Paralysis => StatusKind::Paralysis,
            PrimaryStatus::Sleep { .. } => StatusKind::Sleep,
            PrimaryStatus::Freeze => StatusKind::Freeze,
        }
    }
}

pub fn is_type_immune(types: &[Type], kind: StatusKind) -> bool {
    match kind {
        StatusKind::Poison | StatusKind::Toxic => types
            .iter()
            .any(|t| matches!(t, Type::Poison | Type::Steel)),
        StatusKind::Burn => types.contains(&Type::Fire),
        StatusKind::Freeze => types.contains(&Type::Ice),
        StatusKind::Paralysis | StatusKind::Sleep => false,
    }
}

/// Attempts to inflict `kind`. Fails while any primary status is active or
/// when the target's typing is immune.
pub fn try_apply(target: &mut Combatant, kind: StatusKind, rng: &mut SmallRng) -> bool {
    if target.is_fainted() || target.status.is_some() {
        return false;
    }
    if is_type_immune(&target.types, kind) {
        return false;
    }
    target.status = Some(match kind {
        StatusKind::Burn => PrimaryStatus::Burn,
        StatusKind::Poison => PrimaryStatus::Poison,
        StatusKind::Toxic => PrimaryStatus::Toxic { counter: 1 },
        StatusKind::Paralysis => PrimaryStatus::Paralysis,
        StatusKind::Sleep => PrimaryStatus::Sleep {
            turns: rng.gen_range(MIN_SLEEP_TURNS..=MAX_SLEEP_TURNS),
        },
        StatusKind::Freeze => PrimaryStatus::Freeze,
    });
    true
}

/// Residual damage for poison, toxic and burn. Advances the toxic counter.
pub fn residual_damage(target: &mut Combatant) -> Option<(StatusKind, u16)> {
    let max_hp = target.stats.hp as u32;
    match target.status.as_mut()? {
        PrimaryStatus::Poison => Some((StatusKind::Poison, sixteenths(max_hp, 1))),
        PrimaryStatus::Burn => Some((StatusKind::Burn, sixteenths(max_hp, 1))),
        PrimaryStatus::Toxic { counter } => {
            let amount = sixteenths(max_hp, (*counter).min(TOXIC_CAP) as u32);
            *counter = counter.saturating_add(1).min(TOXIC_CAP);
            Some((StatusKind::Toxic, amount))
        }
        _ => None,
    }
}

/// Ticks one sleep turn. Returns true when the combatant wakes up.
pub fn tick_sleep(target: &mut Combatant) -> bool {
    let Some(PrimaryStatus::Sleep { turns }) = target.status.as_mut() else {
        return false;
    };
    *turns = turns.saturating_sub(1);
    if *turns == 0 {
        target.status = None;
        return true;
    }
    false
}

pub(crate) fn sixteenths(max_hp: u32, numerator: u32) -> u16 {
    (max_hp * numerator / 16).max(1) as u16
}
