//! World state and core simulation types
//!
//! Everything that must be reproducible from (seed, action sequence) lives
//! here. The state is mutated in place once per tick and replaced wholesale
//! on reset.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::upgrades::{UPGRADE_COUNT, UpgradeId, UpgradeState};
use crate::consts::*;

/// Current phase of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    /// Active gameplay
    Playing,
    /// Gameplay paused while a 3-card upgrade offer awaits a pick
    ChoosingUpgrade,
    /// Run ended; terminal
    Dead,
}

/// Seeded RNG wrapper; the single source of run-to-run variability.
///
/// Serializes as its seed, so a deserialized state replays the stream from
/// the start of the episode rather than resuming mid-stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "u64", from = "u64")]
pub struct SimRng {
    seed: u64,
    inner: Pcg32,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.inner = Pcg32::seed_from_u64(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in [lo, hi)
    pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        self.inner.random_range(lo..hi)
    }

    /// Uniform integer in [lo, hi] (inclusive)
    pub fn uniform_int(&mut self, lo: i32, hi: i32) -> i32 {
        self.inner.random_range(lo..=hi)
    }
}

impl From<u64> for SimRng {
    fn from(seed: u64) -> Self {
        Self::new(seed)
    }
}

impl From<SimRng> for u64 {
    fn from(rng: SimRng) -> u64 {
        rng.seed
    }
}

/// The controllable survivor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub mag: i32,
    pub mag_capacity: i32,
    pub reserve: i32,
    pub shoot_cd: f32,
    pub reload_timer: f32,
    pub invuln_timer: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y),
            vel: Vec2::ZERO,
            health: 100.0,
            max_health: 100.0,
            stamina: 100.0,
            max_stamina: 100.0,
            mag: 12,
            mag_capacity: 12,
            reserve: 120,
            shoot_cd: 0.0,
            reload_timer: 0.0,
            invuln_timer: 0.0,
        }
    }
}

/// A horde member. Removed in place when hp reaches zero, so indices are
/// not stable across ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zombie {
    pub pos: Vec2,
    pub vel: Vec2,
    pub hp: f32,
    pub slow_timer: f32,
    pub touch_cd: f32,
}

/// A projectile. One bullet may damage several zombies in a tick while
/// pierce remains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub pierce: i32,
}

/// Static axis-aligned blocker
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Obstacle {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }
}

/// Cumulative episode counters; monotone within an episode. Reward deltas
/// are computed against a snapshot of this struct.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RuntimeStats {
    pub kills: u32,
    pub damage_taken: f32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
}

/// Complete world state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Episode seed for reproducibility
    pub seed: u64,
    pub rng: SimRng,
    /// Ticks advanced while playing
    pub tick: u64,
    /// In-game seconds, recomputed from the tick counter each step
    pub episode_time_s: f32,
    pub play_state: PlayState,
    /// Elapsed time divided by the difficulty time scale; unbounded
    pub difficulty: f32,
    pub player: Player,
    pub zombies: Vec<Zombie>,
    pub bullets: Vec<Bullet>,
    pub obstacles: Vec<Obstacle>,
    pub upgrades: UpgradeState,
    /// The three cards currently on offer
    pub upgrade_offer: [UpgradeId; 3],
    /// Fractional accumulator converting spawn rate into discrete spawns
    pub spawn_budget: f32,
    /// Ticks since the last resolved upgrade offer
    pub offer_clock_ticks: u32,
    /// Consecutive invalid-choice ticks while an offer is pending
    pub choice_stall_ticks: u32,
    pub stats: RuntimeStats,
}

impl GameState {
    /// Fresh episode state for the given seed
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: SimRng::new(seed),
            tick: 0,
            episode_time_s: 0.0,
            play_state: PlayState::Playing,
            difficulty: 0.0,
            player: Player::default(),
            zombies: Vec::new(),
            bullets: Vec::new(),
            obstacles: arena_obstacles(),
            upgrades: UpgradeState::default(),
            upgrade_offer: [
                UpgradeId::RingOfFire,
                UpgradeId::BigShot,
                UpgradeId::PiercingRounds,
            ],
            spawn_budget: 0.0,
            offer_clock_ticks: 0,
            choice_stall_ticks: 0,
            stats: RuntimeStats::default(),
        };
        state.roll_upgrade_offer();
        state
    }

    /// Draw a fresh 3-card offer from the episode RNG
    pub fn roll_upgrade_offer(&mut self) {
        for slot in self.upgrade_offer.iter_mut() {
            let idx = self.rng.uniform_int(0, UPGRADE_COUNT as i32 - 1);
            *slot = UpgradeId::from_index(idx as usize);
        }
    }

    /// Distance from the player to the closest zombie, `f32::MAX` when the
    /// arena is empty
    pub fn nearest_zombie_distance(&self) -> f32 {
        self.zombies
            .iter()
            .map(|z| z.pos.distance(self.player.pos))
            .fold(f32::MAX, f32::min)
    }
}

/// Fixed obstacle layout; created once per episode, never mutated
pub fn arena_obstacles() -> Vec<Obstacle> {
    vec![
        Obstacle::new(220.0, 150.0, 180.0, 60.0),
        Obstacle::new(470.0, 260.0, 140.0, 50.0),
        Obstacle::new(640.0, 90.0, 80.0, 220.0),
        Obstacle::new(920.0, 170.0, 150.0, 60.0),
        Obstacle::new(1080.0, 330.0, 120.0, 120.0),
        Obstacle::new(180.0, 420.0, 200.0, 70.0),
        Obstacle::new(440.0, 520.0, 60.0, 200.0),
        Obstacle::new(620.0, 600.0, 200.0, 80.0),
        Obstacle::new(860.0, 560.0, 180.0, 60.0),
        Obstacle::new(1140.0, 520.0, 80.0, 200.0),
        Obstacle::new(250.0, 700.0, 220.0, 70.0),
        Obstacle::new(560.0, 760.0, 140.0, 60.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_streams_repeat_for_equal_seeds() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..64 {
            assert_eq!(a.uniform(0.0, 1.0).to_bits(), b.uniform(0.0, 1.0).to_bits());
            assert_eq!(a.uniform_int(0, 100), b.uniform_int(0, 100));
        }
    }

    #[test]
    fn rng_reseed_restarts_the_stream() {
        let mut rng = SimRng::new(99);
        let first = rng.uniform(0.0, 1.0);
        rng.uniform(0.0, 1.0);
        rng.reseed(99);
        assert_eq!(first.to_bits(), rng.uniform(0.0, 1.0).to_bits());
    }

    #[test]
    fn uniform_int_is_inclusive() {
        let mut rng = SimRng::new(3);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let v = rng.uniform_int(0, 3);
            assert!((0..=3).contains(&v));
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn player_spawn_is_clear_of_obstacles() {
        use super::super::collision::circle_overlaps_box;
        let spawn = Vec2::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y);
        for rect in arena_obstacles() {
            assert!(!circle_overlaps_box(spawn, PLAYER_RADIUS, &rect));
        }
    }

    #[test]
    fn fresh_state_has_a_rolled_offer() {
        let a = GameState::new(5);
        let b = GameState::new(5);
        assert_eq!(a.upgrade_offer, b.upgrade_offer);
        assert_eq!(a.play_state, PlayState::Playing);
        assert!(a.zombies.is_empty());
        assert!(a.bullets.is_empty());
        assert_eq!(a.obstacles.len(), 12);
    }

    #[test]
    fn nearest_distance_handles_empty_horde() {
        let mut state = GameState::new(0);
        assert_eq!(state.nearest_zombie_distance(), f32::MAX);
        state.zombies.push(Zombie {
            pos: state.player.pos + Vec2::new(30.0, 40.0),
            vel: Vec2::ZERO,
            hp: 10.0,
            slow_timer: 0.0,
            touch_cd: 0.0,
        });
        assert!((state.nearest_zombie_distance() - 50.0).abs() < 1e-3);
    }
}
