//! Permanent upgrade catalog and per-episode stack state
//!
//! The catalog is an immutable table of identities and stacking rules. All
//! gameplay effects are read from stack levels each tick through the curve
//! functions below; nothing here dispatches behavior.

use serde::{Deserialize, Serialize};

/// Number of distinct upgrades
pub const UPGRADE_COUNT: usize = 8;

/// Stack reference used to normalize levels in the observation
pub const MAX_STACK_REFERENCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum UpgradeId {
    RingOfFire,
    BigShot,
    PiercingRounds,
    FrostRounds,
    FastHands,
    ExtendedMag,
    Cardio,
    SecondWind,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; UPGRADE_COUNT] = [
        UpgradeId::RingOfFire,
        UpgradeId::BigShot,
        UpgradeId::PiercingRounds,
        UpgradeId::FrostRounds,
        UpgradeId::FastHands,
        UpgradeId::ExtendedMag,
        UpgradeId::Cardio,
        UpgradeId::SecondWind,
    ];

    /// Catalog index; clamps out-of-range values to the last entry
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx.min(UPGRADE_COUNT - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Catalog entry: identity and stacking rules, no behavior
#[derive(Debug, Clone, Copy)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: &'static str,
    pub unique: bool,
    pub max_stacks: u8,
}

/// Process-wide immutable catalog, indexed by `UpgradeId`
pub const CATALOG: [UpgradeDef; UPGRADE_COUNT] = [
    UpgradeDef {
        id: UpgradeId::RingOfFire,
        name: "Ring of Fire",
        unique: false,
        max_stacks: 5,
    },
    UpgradeDef {
        id: UpgradeId::BigShot,
        name: "Big Shot",
        unique: false,
        max_stacks: 3,
    },
    UpgradeDef {
        id: UpgradeId::PiercingRounds,
        name: "Piercing Rounds",
        unique: false,
        max_stacks: 3,
    },
    UpgradeDef {
        id: UpgradeId::FrostRounds,
        name: "Frost Rounds",
        unique: false,
        max_stacks: 4,
    },
    UpgradeDef {
        id: UpgradeId::FastHands,
        name: "Fast Hands",
        unique: false,
        max_stacks: 4,
    },
    UpgradeDef {
        id: UpgradeId::ExtendedMag,
        name: "Extended Mag",
        unique: false,
        max_stacks: 5,
    },
    UpgradeDef {
        id: UpgradeId::Cardio,
        name: "Cardio",
        unique: false,
        max_stacks: 5,
    },
    UpgradeDef {
        id: UpgradeId::SecondWind,
        name: "Second Wind",
        unique: true,
        max_stacks: 1,
    },
];

/// Per-episode stack levels plus the one-shot revival flag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeState {
    levels: [u8; UPGRADE_COUNT],
    second_wind_used: bool,
}

impl UpgradeState {
    pub fn level(&self, id: UpgradeId) -> u32 {
        self.levels[id.index()] as u32
    }

    pub fn levels(&self) -> &[u8; UPGRADE_COUNT] {
        &self.levels
    }

    /// Raise the stack level by one; saturates at the catalog cap and is
    /// never an error
    pub fn apply(&mut self, id: UpgradeId) {
        let def = &CATALOG[id.index()];
        let level = &mut self.levels[id.index()];
        if *level >= def.max_stacks {
            return;
        }
        *level += 1;
    }

    pub fn second_wind_available(&self) -> bool {
        self.level(UpgradeId::SecondWind) > 0 && !self.second_wind_used
    }

    pub fn consume_second_wind(&mut self) {
        self.second_wind_used = true;
    }
}

// Effect curves: stack level in, gameplay parameter out. The tick pipeline
// reads these every step.

pub fn fire_aura_radius(level: u32) -> f32 {
    70.0 + 16.0 * level as f32
}

pub fn fire_aura_dps(level: u32) -> f32 {
    18.0 + 7.0 * level as f32
}

pub fn bullet_radius(level: u32) -> f32 {
    4.0 + level as f32
}

pub fn bullet_damage(level: u32) -> f32 {
    22.0 + 9.0 * level as f32
}

pub fn shoot_cooldown(level: u32) -> f32 {
    0.17 + 0.06 * level as f32
}

pub fn frost_slow_duration(level: u32) -> f32 {
    if level == 0 {
        0.0
    } else {
        0.4 + 0.3 * level as f32
    }
}

pub fn reload_time(level: u32) -> f32 {
    (1.2 - 0.15 * level as f32).max(0.35)
}

pub fn mag_capacity(level: u32) -> i32 {
    12 + 3 * level as i32
}

pub fn max_stamina(level: u32) -> f32 {
    100.0 + 12.0 * level as f32
}

pub fn sprint_drain(level: u32) -> f32 {
    22.0 - 2.0 * level as f32
}

pub fn stamina_regen(level: u32) -> f32 {
    14.0 + 2.5 * level as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_match_their_index() {
        for (idx, def) in CATALOG.iter().enumerate() {
            assert_eq!(def.id.index(), idx);
        }
    }

    #[test]
    fn apply_saturates_at_max_stacks() {
        let mut state = UpgradeState::default();
        for _ in 0..10 {
            state.apply(UpgradeId::BigShot);
        }
        assert_eq!(state.level(UpgradeId::BigShot), 3);
    }

    #[test]
    fn second_wind_never_exceeds_one_stack() {
        let mut state = UpgradeState::default();
        state.apply(UpgradeId::SecondWind);
        state.apply(UpgradeId::SecondWind);
        state.apply(UpgradeId::SecondWind);
        assert_eq!(state.level(UpgradeId::SecondWind), 1);
        assert!(state.second_wind_available());
        state.consume_second_wind();
        assert!(!state.second_wind_available());
    }

    #[test]
    fn reload_time_floors_at_minimum() {
        assert!((reload_time(0) - 1.2).abs() < 1e-6);
        assert!((reload_time(4) - 0.6).abs() < 1e-6);
        assert!((reload_time(10) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn from_index_clamps_out_of_range() {
        assert_eq!(UpgradeId::from_index(0), UpgradeId::RingOfFire);
        assert_eq!(UpgradeId::from_index(7), UpgradeId::SecondWind);
        assert_eq!(UpgradeId::from_index(99), UpgradeId::SecondWind);
    }
}
