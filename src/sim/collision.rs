//! Circle-vs-AABB resolution and ray casts
//!
//! Pure geometry shared by movement, combat, and the observation rays. The
//! only mutating operation is `resolve_circle_box`, which pushes a circle
//! center out of an overlapping box.

use glam::Vec2;

use super::state::Obstacle;

const EPSILON: f32 = 1e-6;

/// Clamp a point into the box extent on each axis
#[inline]
pub fn closest_point_on_box(point: Vec2, rect: &Obstacle) -> Vec2 {
    Vec2::new(
        point.x.clamp(rect.x, rect.max_x()),
        point.y.clamp(rect.y, rect.max_y()),
    )
}

/// Push `center` fully outside `rect` if the circle overlaps it.
///
/// Returns whether a correction was applied. A center inside the box is
/// pushed along the axis of least penetration, sides checked in the order
/// left, right, top, bottom.
pub fn resolve_circle_box(center: &mut Vec2, radius: f32, rect: &Obstacle) -> bool {
    let closest = closest_point_on_box(*center, rect);
    let delta = *center - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return false;
    }

    if dist_sq > EPSILON {
        let dist = dist_sq.sqrt();
        *center += delta / dist * (radius - dist);
        return true;
    }

    // Center on or inside the box: closest point degenerates, so pick the
    // cheapest side to exit through
    let left = center.x - rect.x;
    let right = rect.max_x() - center.x;
    let top = center.y - rect.y;
    let bottom = rect.max_y() - center.y;
    let min_pen = left.min(right).min(top).min(bottom);
    if min_pen == left {
        center.x = rect.x - radius;
    } else if min_pen == right {
        center.x = rect.max_x() + radius;
    } else if min_pen == top {
        center.y = rect.y - radius;
    } else {
        center.y = rect.max_y() + radius;
    }
    true
}

/// Overlap test without mutation; used for bullet-obstacle contact
#[inline]
pub fn circle_overlaps_box(center: Vec2, radius: f32, rect: &Obstacle) -> bool {
    let closest = closest_point_on_box(center, rect);
    center.distance_squared(closest) <= radius * radius
}

/// Slab intersection of a ray against a box.
///
/// Returns the smallest non-negative hit distance along `dir`, or infinity
/// on a miss. Direction components near zero are treated as parallel to the
/// axis and reject when the origin lies outside the slab.
pub fn ray_intersect_box(origin: Vec2, dir: Vec2, rect: &Obstacle) -> f32 {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    if dir.x.abs() < EPSILON {
        if origin.x < rect.x || origin.x > rect.max_x() {
            return f32::INFINITY;
        }
    } else {
        let tx1 = (rect.x - origin.x) / dir.x;
        let tx2 = (rect.max_x() - origin.x) / dir.x;
        tmin = tmin.max(tx1.min(tx2));
        tmax = tmax.min(tx1.max(tx2));
    }

    if dir.y.abs() < EPSILON {
        if origin.y < rect.y || origin.y > rect.max_y() {
            return f32::INFINITY;
        }
    } else {
        let ty1 = (rect.y - origin.y) / dir.y;
        let ty2 = (rect.max_y() - origin.y) / dir.y;
        tmin = tmin.max(ty1.min(ty2));
        tmax = tmax.min(ty1.max(ty2));
    }

    if tmax < 0.0 || tmin > tmax {
        return f32::INFINITY;
    }
    if tmin >= 0.0 {
        return tmin;
    }
    if tmax >= 0.0 {
        return tmax;
    }
    f32::INFINITY
}

/// Ray-circle intersection for a unit-length `dir`.
///
/// Returns 0 when the origin is already inside the circle, otherwise the
/// nearest non-negative root, or infinity when the ray misses.
pub fn ray_intersect_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> f32 {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;

    if c <= 0.0 {
        return 0.0;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return f32::INFINITY;
    }

    let sqrt_disc = disc.sqrt();
    let t0 = -b - sqrt_disc;
    if t0 >= 0.0 {
        return t0;
    }
    let t1 = -b + sqrt_disc;
    if t1 >= 0.0 {
        return t1;
    }
    f32::INFINITY
}
