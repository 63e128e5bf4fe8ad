//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order
//! - No rendering or transport dependencies

pub mod collision;
pub mod observation;
pub mod reward;
pub mod state;
pub mod tick;
pub mod upgrades;

pub use observation::{OBS_DIM, build_observation};
pub use reward::shaped_reward;
pub use state::{
    Bullet, GameState, Obstacle, PlayState, Player, RuntimeStats, SimRng, Zombie,
};
pub use tick::{Action, step};
pub use upgrades::{CATALOG, UPGRADE_COUNT, UpgradeId, UpgradeState};
