//! Fixed timestep simulation tick
//!
//! Advances the arena by exactly one step. Everything in here must stay
//! deterministic: fixed dt, seeded RNG only, stable iteration order. The
//! tick never fails; inputs arrive pre-clamped from the boundary and any
//! non-finite position is neutralized before the tick returns.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{circle_overlaps_box, resolve_circle_box};
use super::state::{Bullet, GameState, Obstacle, PlayState, SimRng, Zombie};
use super::upgrades::{self, UpgradeId};
use crate::consts::*;
use crate::hash_direction;

/// Driver commands for a single tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Movement intent; the boundary clamps each axis to [-1, 1]
    pub move_x: f32,
    pub move_y: f32,
    /// Aim direction; a near-zero vector falls back to facing +X
    pub aim_x: f32,
    pub aim_y: f32,
    pub shoot: bool,
    pub sprint: bool,
    pub reload: bool,
    /// Offered-card index 0..=2, or -1 for no pick
    pub upgrade_choice: i32,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            move_x: 0.0,
            move_y: 0.0,
            aim_x: 1.0,
            aim_y: 0.0,
            shoot: false,
            sprint: false,
            reload: false,
            upgrade_choice: -1,
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn step(state: &mut GameState, action: &Action) {
    if state.play_state == PlayState::ChoosingUpgrade {
        resolve_upgrade_choice(state, action);
    }
    if state.play_state != PlayState::Playing {
        return;
    }

    update_player(state, action);
    update_zombies(state);
    update_bullets(state);
    apply_fire_aura(state);
    sweep_dead_zombies(state);
    apply_contact_damage(state);
    check_player_death(state);
    update_spawning(state);
    update_offer_clock(state);
    sanitize_positions(state);

    state.tick += 1;
    state.episode_time_s = state.tick as f32 * SIM_DT;
}

/// Apply a pending card pick. An invalid pick leaves the offer open, but a
/// driver that never answers gets the first card forced after a bounded
/// stall so the episode keeps moving.
fn resolve_upgrade_choice(state: &mut GameState, action: &Action) {
    let pick = if (0..=2).contains(&action.upgrade_choice) {
        Some(action.upgrade_choice as usize)
    } else if state.choice_stall_ticks >= FORCED_CHOICE_TICKS {
        Some(0)
    } else {
        state.choice_stall_ticks += 1;
        None
    };

    if let Some(slot) = pick {
        let chosen = state.upgrade_offer[slot];
        state.upgrades.apply(chosen);
        log::debug!(
            "upgrade applied: {:?} (level {})",
            chosen,
            state.upgrades.level(chosen)
        );
        state.play_state = PlayState::Playing;
        state.offer_clock_ticks = 0;
        state.choice_stall_ticks = 0;
        state.roll_upgrade_offer();
    }
}

fn update_player(state: &mut GameState, action: &Action) {
    let p = &mut state.player;
    p.shoot_cd = (p.shoot_cd - SIM_DT).max(0.0);
    p.invuln_timer = (p.invuln_timer - SIM_DT).max(0.0);

    let cardio = state.upgrades.level(UpgradeId::Cardio);
    p.max_stamina = upgrades::max_stamina(cardio);

    let mut sprint_mul = 1.0;
    if action.sprint && p.stamina > 1.0 {
        sprint_mul = SPRINT_MULTIPLIER;
        p.stamina = (p.stamina - upgrades::sprint_drain(cardio) * SIM_DT).max(0.0);
    } else {
        p.stamina = (p.stamina + upgrades::stamina_regen(cardio) * SIM_DT).min(p.max_stamina);
    }

    let mut wish = Vec2::new(action.move_x, action.move_y);
    if wish.length_squared() > 1.0 {
        wish = wish.normalize();
    }
    p.vel += wish * PLAYER_ACCEL * sprint_mul * SIM_DT;
    p.vel *= 1.0 - PLAYER_FRICTION * SIM_DT;

    let prev = p.pos;
    p.pos += p.vel * SIM_DT;
    resolve_world(&mut p.pos, PLAYER_RADIUS, &state.obstacles);
    if (prev.x - p.pos.x).abs() < 1e-4 {
        p.vel.x = 0.0;
    }
    if (prev.y - p.pos.y).abs() < 1e-4 {
        p.vel.y = 0.0;
    }

    let ext_mag = state.upgrades.level(UpgradeId::ExtendedMag);
    p.mag_capacity = upgrades::mag_capacity(ext_mag);
    if p.mag > p.mag_capacity {
        // Capacity shrank under us: excess rounds go back to reserve
        p.reserve += p.mag - p.mag_capacity;
        p.mag = p.mag_capacity;
    }

    // A reload in flight refills the magazine the tick its timer runs out
    if p.reload_timer > 0.0 {
        p.reload_timer -= SIM_DT;
        if p.reload_timer <= 0.0 {
            p.reload_timer = 0.0;
            let moved = (p.mag_capacity - p.mag).min(p.reserve);
            p.mag += moved;
            p.reserve -= moved;
        }
    }

    let fast_hands = state.upgrades.level(UpgradeId::FastHands);
    let wants_reload = action.reload || p.mag == 0;
    if wants_reload && p.reload_timer <= 0.0 && p.mag < p.mag_capacity && p.reserve > 0 {
        p.reload_timer = upgrades::reload_time(fast_hands);
    }

    if action.shoot && p.shoot_cd <= 0.0 && p.reload_timer <= 0.0 && p.mag > 0 {
        let dir = Vec2::new(action.aim_x, action.aim_y)
            .try_normalize()
            .unwrap_or(Vec2::X);
        let big_shot = state.upgrades.level(UpgradeId::BigShot);
        let pierce = state.upgrades.level(UpgradeId::PiercingRounds);
        state.bullets.push(Bullet {
            pos: p.pos,
            vel: dir * BULLET_SPEED,
            radius: upgrades::bullet_radius(big_shot),
            damage: upgrades::bullet_damage(big_shot),
            pierce: pierce as i32,
        });
        p.mag -= 1;
        p.shoot_cd = upgrades::shoot_cooldown(big_shot);
        state.stats.shots_fired += 1;
    }
}

fn update_zombies(state: &mut GameState) {
    let player_pos = state.player.pos;
    let base_speed = ZOMBIE_BASE_SPEED + state.difficulty * ZOMBIE_SPEED_PER_DIFFICULTY;

    for z in &mut state.zombies {
        z.slow_timer = (z.slow_timer - SIM_DT).max(0.0);
        z.touch_cd = (z.touch_cd - SIM_DT).max(0.0);

        let dir = (player_pos - z.pos).try_normalize().unwrap_or(Vec2::ZERO);
        let mut speed = base_speed;
        if z.slow_timer > 0.0 {
            speed *= FROST_SLOW_FACTOR;
        }
        z.vel = dir * speed;

        let prev = z.pos;
        z.pos += z.vel * SIM_DT;
        resolve_world(&mut z.pos, ZOMBIE_RADIUS, &state.obstacles);
        if (prev.x - z.pos.x).abs() < 1e-4 {
            z.vel.x = 0.0;
        }
        if (prev.y - z.pos.y).abs() < 1e-4 {
            z.vel.y = 0.0;
        }
    }

    separate_zombies(state);
    separate_from_player(state);
}

/// Single pairwise pass pushing overlapping zombies apart along the
/// connecting normal. Exactly coincident pairs separate along a
/// hash-derived direction so the tie breaks the same way every run.
fn separate_zombies(state: &mut GameState) {
    let min_sep = ZOMBIE_RADIUS * 2.0;
    let count = state.zombies.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let delta = state.zombies[j].pos - state.zombies[i].pos;
            let dist = delta.length();
            if dist >= min_sep {
                continue;
            }
            let normal = if dist > 1e-4 {
                delta / dist
            } else {
                hash_direction(i as u32, j as u32)
            };
            let push = ((min_sep - dist) * 0.5).min(SEPARATION_PUSH_CAP);
            state.zombies[i].pos -= normal * push;
            state.zombies[j].pos += normal * push;
            resolve_world(&mut state.zombies[i].pos, ZOMBIE_RADIUS, &state.obstacles);
            resolve_world(&mut state.zombies[j].pos, ZOMBIE_RADIUS, &state.obstacles);
        }
    }
}

/// Keep zombies from stacking on the player. The enforced gap is slightly
/// inside the contact ring so bites still land while pressed.
fn separate_from_player(state: &mut GameState) {
    let min_sep = PLAYER_RADIUS + ZOMBIE_RADIUS - CONTACT_SLACK;
    let player_pos = state.player.pos;
    for (i, z) in state.zombies.iter_mut().enumerate() {
        let delta = z.pos - player_pos;
        let dist = delta.length();
        if dist >= min_sep {
            continue;
        }
        let normal = if dist > 1e-4 {
            delta / dist
        } else {
            hash_direction(i as u32, u32::MAX)
        };
        let push = (min_sep - dist).min(SEPARATION_PUSH_CAP);
        z.pos += normal * push;
        resolve_world(&mut z.pos, ZOMBIE_RADIUS, &state.obstacles);
    }
}

fn update_bullets(state: &mut GameState) {
    let frost = state.upgrades.level(UpgradeId::FrostRounds);
    let mut survivors = Vec::with_capacity(state.bullets.len());

    for mut b in state.bullets.drain(..) {
        b.pos += b.vel * SIM_DT;

        let mut destroyed = !b.pos.is_finite()
            || b.pos.x < 0.0
            || b.pos.x > ARENA_WIDTH
            || b.pos.y < 0.0
            || b.pos.y > ARENA_HEIGHT;

        if !destroyed {
            destroyed = state
                .obstacles
                .iter()
                .any(|rect| circle_overlaps_box(b.pos, b.radius, rect));
        }

        if !destroyed {
            for z in &mut state.zombies {
                if z.pos.distance(b.pos) <= ZOMBIE_RADIUS + b.radius {
                    z.hp -= b.damage;
                    if frost > 0 {
                        z.slow_timer = z.slow_timer.max(upgrades::frost_slow_duration(frost));
                    }
                    state.stats.shots_hit += 1;
                    state.stats.damage_dealt += b.damage;
                    b.pierce -= 1;
                    if b.pierce < 0 {
                        destroyed = true;
                        break;
                    }
                }
            }
        }

        if !destroyed {
            survivors.push(b);
        }
    }

    state.bullets = survivors;
}

/// Continuous damage to everything inside the fire aura, when owned
fn apply_fire_aura(state: &mut GameState) {
    let level = state.upgrades.level(UpgradeId::RingOfFire);
    if level == 0 {
        return;
    }
    let radius = upgrades::fire_aura_radius(level);
    let tick_damage = upgrades::fire_aura_dps(level) * SIM_DT;
    let player_pos = state.player.pos;
    for z in &mut state.zombies {
        if z.pos.distance(player_pos) <= radius {
            z.hp -= tick_damage;
            state.stats.damage_dealt += tick_damage;
        }
    }
}

fn sweep_dead_zombies(state: &mut GameState) {
    let before = state.zombies.len();
    state.zombies.retain(|z| z.hp > 0.0);
    let killed = before - state.zombies.len();
    if killed > 0 {
        state.stats.kills += killed as u32;
        log::debug!("{} down, {} total kills", killed, state.stats.kills);
    }
}

fn apply_contact_damage(state: &mut GameState) {
    let contact = PLAYER_RADIUS + ZOMBIE_RADIUS;
    for z in &mut state.zombies {
        if z.touch_cd <= 0.0
            && state.player.invuln_timer <= 0.0
            && z.pos.distance(state.player.pos) < contact
        {
            state.player.health = (state.player.health - CONTACT_DAMAGE).max(0.0);
            state.stats.damage_taken += CONTACT_DAMAGE;
            z.touch_cd = TOUCH_COOLDOWN;
            state.player.invuln_timer = HIT_INVULN;
        }
    }
}

fn check_player_death(state: &mut GameState) {
    if state.player.health > 0.0 {
        return;
    }
    if state.upgrades.second_wind_available() {
        state.upgrades.consume_second_wind();
        state.player.health = state.player.max_health * SECOND_WIND_RESTORE;
        state.player.invuln_timer = SECOND_WIND_INVULN;
        log::info!("second wind consumed, restored to {:.0} hp", state.player.health);
        return;
    }
    state.play_state = PlayState::Dead;
    log::info!(
        "player down at t={:.1}s, kills={}",
        state.episode_time_s,
        state.stats.kills
    );
}

fn update_spawning(state: &mut GameState) {
    state.difficulty = state.episode_time_s / DIFFICULTY_TIME_SCALE;
    let spawn_rate = SPAWN_RATE_BASE + state.difficulty * SPAWN_RATE_PER_DIFFICULTY;
    let max_alive = MAX_ALIVE_BASE + (state.difficulty * MAX_ALIVE_PER_DIFFICULTY) as usize;

    state.spawn_budget += spawn_rate * SIM_DT;
    while state.spawn_budget > 1.0 && state.zombies.len() < max_alive {
        state.spawn_budget -= 1.0;
        spawn_zombie(state);
    }
}

fn spawn_zombie(state: &mut GameState) {
    let mut pos = random_edge_point(&mut state.rng);
    // A few retries to land outside the exclusion radius around the player;
    // the last draw stands if every attempt is too close
    for _ in 1..SPAWN_ATTEMPTS {
        if pos.distance(state.player.pos) >= SPAWN_EXCLUSION_RADIUS {
            break;
        }
        pos = random_edge_point(&mut state.rng);
    }
    resolve_world(&mut pos, ZOMBIE_RADIUS, &state.obstacles);

    state.zombies.push(Zombie {
        pos,
        vel: Vec2::ZERO,
        hp: ZOMBIE_HP_BASE + state.difficulty * ZOMBIE_HP_PER_DIFFICULTY,
        slow_timer: 0.0,
        touch_cd: 0.0,
    });
}

/// Random point along a random arena edge
fn random_edge_point(rng: &mut SimRng) -> Vec2 {
    match rng.uniform_int(0, 3) {
        0 => Vec2::new(
            ZOMBIE_RADIUS,
            rng.uniform(ZOMBIE_RADIUS, ARENA_HEIGHT - ZOMBIE_RADIUS),
        ),
        1 => Vec2::new(
            ARENA_WIDTH - ZOMBIE_RADIUS,
            rng.uniform(ZOMBIE_RADIUS, ARENA_HEIGHT - ZOMBIE_RADIUS),
        ),
        2 => Vec2::new(
            rng.uniform(ZOMBIE_RADIUS, ARENA_WIDTH - ZOMBIE_RADIUS),
            ZOMBIE_RADIUS,
        ),
        _ => Vec2::new(
            rng.uniform(ZOMBIE_RADIUS, ARENA_WIDTH - ZOMBIE_RADIUS),
            ARENA_HEIGHT - ZOMBIE_RADIUS,
        ),
    }
}

fn update_offer_clock(state: &mut GameState) {
    state.offer_clock_ticks += 1;
    if state.offer_clock_ticks >= UPGRADE_OFFER_INTERVAL_TICKS {
        state.play_state = PlayState::ChoosingUpgrade;
        state.choice_stall_ticks = 0;
    }
}

/// Last line of defense: every position must leave the tick finite and in
/// bounds no matter what the physics upstream produced.
fn sanitize_positions(state: &mut GameState) {
    if !state.player.pos.is_finite() {
        log::warn!("non-finite player position, resetting to spawn");
        state.player.pos = Vec2::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y);
    }
    if !state.player.vel.is_finite() {
        state.player.vel = Vec2::ZERO;
    }
    clamp_to_arena(&mut state.player.pos, PLAYER_RADIUS);

    let player_pos = state.player.pos;
    for z in &mut state.zombies {
        if !z.pos.is_finite() {
            log::warn!("non-finite zombie position, snapping to player");
            z.pos = player_pos;
        }
        if !z.vel.is_finite() {
            z.vel = Vec2::ZERO;
        }
        clamp_to_arena(&mut z.pos, ZOMBIE_RADIUS);
    }
}

/// Clamp into arena bounds, push out of every obstacle, clamp again
fn resolve_world(center: &mut Vec2, radius: f32, obstacles: &[Obstacle]) {
    clamp_to_arena(center, radius);
    for rect in obstacles {
        resolve_circle_box(center, radius, rect);
    }
    clamp_to_arena(center, radius);
}

fn clamp_to_arena(center: &mut Vec2, radius: f32) {
    center.x = center.x.clamp(radius, ARENA_WIDTH - radius);
    center.y = center.y.clamp(radius, ARENA_HEIGHT - radius);
}
