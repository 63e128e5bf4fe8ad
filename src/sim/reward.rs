//! Dense per-tick reward shaping
//!
//! Every term is a delta against the stats snapshot taken at the start of
//! the tick, so the signal reflects only this tick's events, never lifetime
//! totals.

use super::state::RuntimeStats;

/// Flat bonus for surviving one more tick
const SURVIVAL_BONUS: f32 = 0.02;
/// Bonus per kill
const KILL_BONUS: f32 = 1.45;
/// Bonus per confirmed hit
const HIT_BONUS: f32 = 0.03;
/// Bonus per point of damage dealt
const DAMAGE_DEALT_BONUS: f32 = 0.002;
/// Penalty per point of damage taken
const DAMAGE_TAKEN_PENALTY: f32 = 0.05;
/// Distance under which the nearest zombie starts costing reward
const PROXIMITY_THRESHOLD: f32 = 120.0;
const PROXIMITY_PENALTY_RATE: f32 = 0.0008;
/// Penalty per shot on a tick where nothing landed
const WHIFF_PENALTY: f32 = 0.008;

/// Shaped reward for one tick given the pre-tick stats snapshot and the
/// current nearest-zombie distance
pub fn shaped_reward(prev: &RuntimeStats, now: &RuntimeStats, nearest_zombie: f32) -> f32 {
    let kills = (now.kills - prev.kills) as f32;
    let hits = (now.shots_hit - prev.shots_hit) as f32;
    let shots = (now.shots_fired - prev.shots_fired) as f32;
    let damage_dealt = now.damage_dealt - prev.damage_dealt;
    let damage_taken = now.damage_taken - prev.damage_taken;

    let mut reward = SURVIVAL_BONUS;
    reward += KILL_BONUS * kills;
    reward += HIT_BONUS * hits;
    reward += DAMAGE_DEALT_BONUS * damage_dealt;
    reward -= DAMAGE_TAKEN_PENALTY * damage_taken;
    if nearest_zombie < PROXIMITY_THRESHOLD {
        reward -= (PROXIMITY_THRESHOLD - nearest_zombie) * PROXIMITY_PENALTY_RATE;
    }
    if shots > 0.0 && hits <= 0.0 {
        reward -= WHIFF_PENALTY * shots;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(kills: u32, taken: f32, fired: u32, hit: u32, dealt: f32) -> RuntimeStats {
        RuntimeStats {
            kills,
            damage_taken: taken,
            shots_fired: fired,
            shots_hit: hit,
            damage_dealt: dealt,
        }
    }

    #[test]
    fn idle_tick_earns_the_survival_bonus() {
        let s = stats(0, 0.0, 0, 0, 0.0);
        let r = shaped_reward(&s, &s, f32::MAX);
        assert!((r - 0.02).abs() < 1e-6);
    }

    #[test]
    fn a_kill_dominates_the_signal() {
        let prev = stats(3, 0.0, 10, 8, 100.0);
        let now = stats(4, 0.0, 10, 8, 100.0);
        let r = shaped_reward(&prev, &now, f32::MAX);
        assert!((r - (0.02 + 1.45)).abs() < 1e-5);
    }

    #[test]
    fn hits_and_damage_dealt_add_up() {
        let prev = stats(0, 0.0, 0, 0, 0.0);
        let now = stats(0, 0.0, 1, 2, 44.0);
        let r = shaped_reward(&prev, &now, f32::MAX);
        assert!((r - (0.02 + 2.0 * 0.03 + 44.0 * 0.002)).abs() < 1e-5);
    }

    #[test]
    fn damage_taken_is_penalized() {
        let prev = stats(0, 10.0, 0, 0, 0.0);
        let now = stats(0, 20.0, 0, 0, 0.0);
        let r = shaped_reward(&prev, &now, f32::MAX);
        assert!((r - (0.02 - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn proximity_penalty_ramps_inside_the_threshold() {
        let s = stats(0, 0.0, 0, 0, 0.0);
        let far = shaped_reward(&s, &s, 200.0);
        let near = shaped_reward(&s, &s, 20.0);
        assert!((far - 0.02).abs() < 1e-6);
        assert!((near - (0.02 - 100.0 * 0.0008)).abs() < 1e-5);
    }

    #[test]
    fn whiffed_shots_cost_reward() {
        let prev = stats(0, 0.0, 0, 0, 0.0);
        let missed = stats(0, 0.0, 2, 0, 0.0);
        let r = shaped_reward(&prev, &missed, f32::MAX);
        assert!((r - (0.02 - 2.0 * 0.008)).abs() < 1e-5);

        // A landed hit cancels the whiff penalty
        let landed = stats(0, 0.0, 2, 1, 22.0);
        let r = shaped_reward(&prev, &landed, f32::MAX);
        assert!(r > 0.02);
    }

    #[test]
    fn deltas_ignore_lifetime_totals() {
        let prev = stats(50, 500.0, 900, 700, 9000.0);
        let now = prev;
        let r = shaped_reward(&prev, &now, f32::MAX);
        assert!((r - 0.02).abs() < 1e-6);
    }
}
