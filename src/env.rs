//! The reset/step boundary consumed by external drivers
//!
//! Raw numeric inputs are validated and clamped here; the simulator never
//! sees out-of-range values. One `Env` owns one episode's world state
//! exclusively - run parallel episodes by creating one `Env` each.

use serde::Serialize;
use thiserror::Error;

use crate::consts::EPISODE_LIMIT_SECONDS;
use crate::sim::{self, Action, GameState, OBS_DIM, PlayState, build_observation, shaped_reward};

/// Number of scalar action channels in the flat encoding:
/// move_x, move_y, aim_x, aim_y, shoot, sprint, reload, upgrade_choice
pub const ACTION_DIM: usize = 8;

/// Rejection reasons for malformed flat action buffers
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action must have exactly {expected} channels, got {got}")]
    WrongLength { expected: usize, got: usize },
    #[error("action channel {index} is not finite")]
    NonFinite { index: usize },
}

impl Action {
    /// Decode a flat channel buffer, clamping every value into its
    /// documented range. `choosing` nulls the upgrade channel whenever no
    /// offer is pending, so a stale pick can never apply late.
    pub fn from_channels(channels: &[f32], choosing: bool) -> Result<Self, ActionError> {
        if channels.len() != ACTION_DIM {
            return Err(ActionError::WrongLength {
                expected: ACTION_DIM,
                got: channels.len(),
            });
        }
        if let Some(index) = channels.iter().position(|v| !v.is_finite()) {
            return Err(ActionError::NonFinite { index });
        }

        let upgrade_choice = if !choosing || channels[7] < -0.5 {
            -1
        } else {
            channels[7].clamp(0.0, 2.0).round() as i32
        };

        Ok(Self {
            move_x: channels[0].clamp(-1.0, 1.0),
            move_y: channels[1].clamp(-1.0, 1.0),
            aim_x: channels[2].clamp(-1.0, 1.0),
            aim_y: channels[3].clamp(-1.0, 1.0),
            shoot: channels[4] >= 0.5,
            sprint: channels[5] >= 0.5,
            reload: channels[6] >= 0.5,
            upgrade_choice,
        })
    }
}

/// Diagnostic bundle reported with every step
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub kills: u32,
    pub damage_taken: f32,
    pub damage_dealt: f32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub accuracy: f32,
    pub difficulty: f32,
    pub zombies_alive: usize,
    pub nearest_zombie_distance: f32,
    pub episode_time_s: f32,
    pub choosing_upgrade: bool,
}

/// Everything a driver learns from one step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// One independent episode; owns its world state and RNG exclusively
#[derive(Debug, Clone)]
pub struct Env {
    state: GameState,
}

impl Env {
    pub fn new(seed: u64) -> Self {
        Self {
            state: GameState::new(seed),
        }
    }

    /// Reinitialize deterministically from `seed` and return the first
    /// observation
    pub fn reset(&mut self, seed: u64) -> Vec<f32> {
        log::info!("episode reset, seed={seed}");
        self.state = GameState::new(seed);
        build_observation(&self.state)
    }

    /// Read-only view of the world between ticks
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub const fn observation_dim() -> usize {
        OBS_DIM
    }

    pub const fn action_dim() -> usize {
        ACTION_DIM
    }

    /// Advance one tick and report the outcome
    pub fn step(&mut self, action: &Action) -> StepResult {
        let prev_stats = self.state.stats;
        sim::step(&mut self.state, action);

        let nearest = self.state.nearest_zombie_distance();
        let stats = &self.state.stats;
        let info = StepInfo {
            kills: stats.kills,
            damage_taken: stats.damage_taken,
            damage_dealt: stats.damage_dealt,
            shots_fired: stats.shots_fired,
            shots_hit: stats.shots_hit,
            accuracy: if stats.shots_fired > 0 {
                stats.shots_hit as f32 / stats.shots_fired as f32
            } else {
                0.0
            },
            difficulty: self.state.difficulty,
            zombies_alive: self.state.zombies.len(),
            nearest_zombie_distance: nearest,
            episode_time_s: self.state.episode_time_s,
            choosing_upgrade: self.state.play_state == PlayState::ChoosingUpgrade,
        };

        StepResult {
            observation: build_observation(&self.state),
            reward: shaped_reward(&prev_stats, stats, nearest),
            terminated: self.state.play_state == PlayState::Dead,
            truncated: self.state.episode_time_s >= EPISODE_LIMIT_SECONDS,
            info,
        }
    }

    /// Decode-and-step convenience for flat-buffer callers
    pub fn step_channels(&mut self, channels: &[f32]) -> Result<StepResult, ActionError> {
        let choosing = self.state.play_state == PlayState::ChoosingUpgrade;
        let action = Action::from_channels(channels, choosing)?;
        Ok(self.step(&action))
    }
}
