//! Overrun - a deterministic top-down horde-survival arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, combat, upgrades, spawning)
//! - `env`: reset/step boundary consumed by external drivers
//! - `agent`: line-based JSON TCP transport for a remote decision process

pub mod agent;
pub mod env;
pub mod sim;

pub use env::{Env, StepInfo, StepResult};
pub use sim::{Action, GameState, PlayState};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Arena dimensions (pixels)
    pub const ARENA_WIDTH: f32 = 1400.0;
    pub const ARENA_HEIGHT: f32 = 900.0;

    /// Entity radii
    pub const PLAYER_RADIUS: f32 = 11.0;
    pub const ZOMBIE_RADIUS: f32 = 10.0;

    /// Player spawn point, clear of every obstacle
    pub const PLAYER_SPAWN_X: f32 = 700.0;
    pub const PLAYER_SPAWN_Y: f32 = 450.0;

    /// Player movement
    pub const PLAYER_ACCEL: f32 = 900.0;
    pub const PLAYER_FRICTION: f32 = 7.5;
    pub const SPRINT_MULTIPLIER: f32 = 1.55;

    /// Bullet muzzle speed (pixels/s)
    pub const BULLET_SPEED: f32 = 760.0;

    /// Zombies shamble early and ramp hard with difficulty
    pub const ZOMBIE_BASE_SPEED: f32 = 12.0;
    pub const ZOMBIE_SPEED_PER_DIFFICULTY: f32 = 54.0;
    /// Speed multiplier while a frost slow is active
    pub const FROST_SLOW_FACTOR: f32 = 0.62;
    pub const ZOMBIE_HP_BASE: f32 = 26.0;
    pub const ZOMBIE_HP_PER_DIFFICULTY: f32 = 3.0;

    /// Contact combat
    pub const CONTACT_DAMAGE: f32 = 10.0;
    /// Per-zombie cooldown between bites (seconds)
    pub const TOUCH_COOLDOWN: f32 = 0.25;
    /// Player invulnerability window after a bite (seconds)
    pub const HIT_INVULN: f32 = 0.45;

    /// Second-wind revival: health fraction restored and invulnerability
    pub const SECOND_WIND_RESTORE: f32 = 0.6;
    pub const SECOND_WIND_INVULN: f32 = 2.0;

    /// Elapsed seconds that map to one unit of difficulty
    pub const DIFFICULTY_TIME_SCALE: f32 = 90.0;

    /// Spawning
    pub const SPAWN_RATE_BASE: f32 = 1.0;
    pub const SPAWN_RATE_PER_DIFFICULTY: f32 = 1.2;
    pub const MAX_ALIVE_BASE: usize = 16;
    pub const MAX_ALIVE_PER_DIFFICULTY: f32 = 18.0;
    /// Zombies avoid spawning inside this radius around the player
    pub const SPAWN_EXCLUSION_RADIUS: f32 = 250.0;
    pub const SPAWN_ATTEMPTS: u32 = 4;

    /// Separation pushes are capped per pair per tick so dense piles
    /// resolve over a few ticks instead of exploding
    pub const SEPARATION_PUSH_CAP: f32 = 3.0;
    /// Zombies may press this far into the player's contact ring; keeps
    /// the attack range reachable after separation
    pub const CONTACT_SLACK: f32 = 4.0;

    /// Episode length before truncation (seconds)
    pub const EPISODE_LIMIT_SECONDS: f32 = 180.0;

    /// Upgrade offer cadence, counted in whole ticks (20 s at 60 Hz)
    pub const UPGRADE_OFFER_INTERVAL_TICKS: u32 = 1200;
    /// Consecutive invalid choice ticks before the first card is forced
    pub const FORCED_CHOICE_TICKS: u32 = 300;

    /// Observation encoding shape
    pub const ZOMBIE_OBS_SLOTS: usize = 8;
    pub const RAY_COUNT: usize = 16;
    pub const RAY_RANGE: f32 = 320.0;
}

/// Deterministic unit vector for breaking exact-overlap ties.
///
/// Derived from a hash of the two entity indices so the same pair always
/// separates the same way without consuming the simulation RNG stream.
#[inline]
pub fn hash_direction(a: u32, b: u32) -> Vec2 {
    let hash = a.wrapping_mul(2654435761).wrapping_add(b.wrapping_mul(7919));
    let angle = (hash % 1024) as f32 / 1024.0 * std::f32::consts::TAU;
    Vec2::new(angle.cos(), angle.sin())
}
