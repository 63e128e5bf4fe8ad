//! Fixed-length observation encoding
//!
//! Projects world state into `OBS_DIM` normalized floats for an external
//! decision process. Element order and normalization constants are a wire
//! contract: changing either silently breaks every trained consumer.

use glam::Vec2;

use super::collision::{ray_intersect_box, ray_intersect_circle};
use super::state::{GameState, PlayState};
use super::upgrades::{MAX_STACK_REFERENCE, UPGRADE_COUNT};
use crate::consts::*;

/// Reference speed used to normalize velocities
const VEL_SCALE: f32 = 400.0;
/// Reference distance for the nearest-zombie feature blocks
const ZOMBIE_DIST_SCALE: f32 = 500.0;
/// Reserve-ammo normalization reference
const RESERVE_SCALE: f32 = 300.0;

/// Total observation length: player scalars, zombie blocks, ray pairs,
/// difficulty, choice flag, offer ids, upgrade levels
pub const OBS_DIM: usize = 11 + ZOMBIE_OBS_SLOTS * 5 + RAY_COUNT * 2 + 2 + 3 + UPGRADE_COUNT;

/// Encode the world into the fixed observation vector
pub fn build_observation(state: &GameState) -> Vec<f32> {
    let mut obs = Vec::with_capacity(OBS_DIM);
    let p = &state.player;

    obs.push(p.pos.x / ARENA_WIDTH);
    obs.push(p.pos.y / ARENA_HEIGHT);
    obs.push(p.vel.x / VEL_SCALE);
    obs.push(p.vel.y / VEL_SCALE);
    obs.push(p.health / p.max_health.max(1.0));
    obs.push(p.stamina / p.max_stamina.max(1.0));
    obs.push(p.mag as f32 / p.mag_capacity.max(1) as f32);
    obs.push(p.reserve as f32 / RESERVE_SCALE);
    obs.push(p.shoot_cd);
    obs.push(p.reload_timer);
    obs.push(p.invuln_timer);

    // Nearest zombies by squared distance, zero-padded empty slots
    let mut order: Vec<usize> = (0..state.zombies.len()).collect();
    order.sort_by(|&a, &b| {
        let da = state.zombies[a].pos.distance_squared(p.pos);
        let db = state.zombies[b].pos.distance_squared(p.pos);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    for slot in 0..ZOMBIE_OBS_SLOTS {
        if let Some(&idx) = order.get(slot) {
            let z = &state.zombies[idx];
            let rel = z.pos - p.pos;
            obs.push(rel.x / ARENA_WIDTH);
            obs.push(rel.y / ARENA_HEIGHT);
            obs.push(rel.length() / ZOMBIE_DIST_SCALE);
            obs.push((z.vel.x - p.vel.x) / VEL_SCALE);
            obs.push((z.vel.y - p.vel.y) / VEL_SCALE);
        } else {
            obs.extend_from_slice(&[0.0, 0.0, 1.0, 0.0, 0.0]);
        }
    }

    // Radial ray fan: per ray, nearest obstacle fraction (arena walls
    // included) and nearest zombie fraction; 1.0 means clear to max range
    for i in 0..RAY_COUNT {
        let theta = i as f32 / RAY_COUNT as f32 * std::f32::consts::TAU;
        let dir = Vec2::new(theta.cos(), theta.sin());

        let mut obstacle_t = boundary_distance(p.pos, dir);
        for rect in &state.obstacles {
            obstacle_t = obstacle_t.min(ray_intersect_box(p.pos, dir, rect));
        }

        let mut zombie_t = f32::INFINITY;
        for z in &state.zombies {
            zombie_t = zombie_t.min(ray_intersect_circle(p.pos, dir, z.pos, ZOMBIE_RADIUS));
        }

        obs.push((obstacle_t / RAY_RANGE).clamp(0.0, 1.0));
        obs.push((zombie_t / RAY_RANGE).clamp(0.0, 1.0));
    }

    obs.push(state.difficulty);

    let choosing = state.play_state == PlayState::ChoosingUpgrade;
    obs.push(if choosing { 1.0 } else { 0.0 });
    for slot in 0..3 {
        if choosing {
            let id = state.upgrade_offer[slot].index() as f32;
            obs.push((id + 0.5) / UPGRADE_COUNT as f32);
        } else {
            obs.push(0.0);
        }
    }

    for &level in state.upgrades.levels() {
        obs.push(level as f32 / MAX_STACK_REFERENCE);
    }

    debug_assert_eq!(obs.len(), OBS_DIM);
    obs
}

/// Distance to the arena boundary along `dir` from an interior origin
fn boundary_distance(origin: Vec2, dir: Vec2) -> f32 {
    let mut best = f32::INFINITY;
    if dir.x > 1e-6 {
        best = best.min((ARENA_WIDTH - origin.x) / dir.x);
    }
    if dir.x < -1e-6 {
        best = best.min(-origin.x / dir.x);
    }
    if dir.y > 1e-6 {
        best = best.min((ARENA_HEIGHT - origin.y) / dir.y);
    }
    if dir.y < -1e-6 {
        best = best.min(-origin.y / dir.y);
    }
    best.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::super::state::Zombie;
    use super::super::tick::{Action, step};
    use super::*;

    #[test]
    fn observation_has_the_declared_length() {
        let state = GameState::new(42);
        assert_eq!(build_observation(&state).len(), OBS_DIM);
    }

    #[test]
    fn length_is_stable_across_play_states() {
        let mut state = GameState::new(42);
        state.play_state = PlayState::ChoosingUpgrade;
        assert_eq!(build_observation(&state).len(), OBS_DIM);
        state.play_state = PlayState::Dead;
        assert_eq!(build_observation(&state).len(), OBS_DIM);
    }

    #[test]
    fn empty_zombie_slots_use_the_padding_pattern() {
        let state = GameState::new(1);
        let obs = build_observation(&state);
        for slot in 0..ZOMBIE_OBS_SLOTS {
            let base = 11 + slot * 5;
            assert_eq!(&obs[base..base + 5], &[0.0, 0.0, 1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn zombie_slots_sort_by_distance() {
        let mut state = GameState::new(1);
        let p = state.player.pos;
        state.zombies.push(Zombie {
            pos: p + glam::Vec2::new(200.0, 0.0),
            vel: glam::Vec2::ZERO,
            hp: 30.0,
            slow_timer: 0.0,
            touch_cd: 0.0,
        });
        state.zombies.push(Zombie {
            pos: p + glam::Vec2::new(-50.0, 0.0),
            vel: glam::Vec2::ZERO,
            hp: 30.0,
            slow_timer: 0.0,
            touch_cd: 0.0,
        });
        let obs = build_observation(&state);
        // Closest first: the -50 zombie occupies slot 0
        assert!((obs[11] - (-50.0 / ARENA_WIDTH)).abs() < 1e-5);
        assert!((obs[13] - 50.0 / 500.0).abs() < 1e-5);
        assert!((obs[16] - 200.0 / ARENA_WIDTH).abs() < 1e-5);
    }

    #[test]
    fn ray_features_stay_in_unit_range() {
        let mut state = GameState::new(7);
        for _ in 0..240 {
            step(&mut state, &Action::default());
        }
        let obs = build_observation(&state);
        let ray_base = 11 + ZOMBIE_OBS_SLOTS * 5;
        for i in 0..RAY_COUNT * 2 {
            let v = obs[ray_base + i];
            assert!((0.0..=1.0).contains(&v), "ray feature {i} out of range: {v}");
        }
    }

    #[test]
    fn straight_up_ray_reports_the_known_obstacle() {
        // From spawn, the ray toward -Y crosses the box at (640, 90, 80, 220)
        // whose lower face sits 140 units away
        let state = GameState::new(3);
        let obs = build_observation(&state);
        let ray_base = 11 + ZOMBIE_OBS_SLOTS * 5;
        let up_ray = ray_base + 12 * 2;
        assert!((obs[up_ray] - 140.0 / RAY_RANGE).abs() < 1e-3);
        // No zombies yet: the paired zombie fraction is clear
        assert_eq!(obs[up_ray + 1], 1.0);
    }

    #[test]
    fn offer_ids_are_zeroed_until_a_choice_is_pending() {
        let mut state = GameState::new(9);
        let tail = OBS_DIM - UPGRADE_COUNT;
        let obs = build_observation(&state);
        assert_eq!(&obs[tail - 3..tail], &[0.0, 0.0, 0.0]);
        assert_eq!(obs[tail - 4], 0.0);

        state.play_state = PlayState::ChoosingUpgrade;
        let obs = build_observation(&state);
        assert_eq!(obs[tail - 4], 1.0);
        for v in &obs[tail - 3..tail] {
            assert!(*v > 0.0 && *v < 1.0);
        }
    }

    #[test]
    fn upgrade_levels_normalize_against_the_stack_reference() {
        let mut state = GameState::new(9);
        state.upgrades.apply(super::super::upgrades::UpgradeId::Cardio);
        state.upgrades.apply(super::super::upgrades::UpgradeId::Cardio);
        let obs = build_observation(&state);
        let levels_base = OBS_DIM - UPGRADE_COUNT;
        let cardio = super::super::upgrades::UpgradeId::Cardio.index();
        assert!((obs[levels_base + cardio] - 2.0 / 5.0).abs() < 1e-6);
    }
}
