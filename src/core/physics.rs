//! Falling / thrown body physics
//!
//! Discrete per-frame integration: gravity with a terminal velocity, wall and
//! ceiling restitution, horizontal friction, and progressively damped floor
//! bounces. Invoked only while the behavior state is Falling.

use glam::Vec2;
use rand::Rng;

use super::state::{Bounds, CompanionBody};
use crate::consts::*;

/// Advance the falling body by one frame. Returns `true` when the body has
/// come to rest on the floor; the caller must stop invoking the engine until
/// the next drop.
pub fn step(body: &mut CompanionBody, bounds: Bounds) -> bool {
    // Horizontal: advance with friction, bounce off the side walls
    if body.vx.abs() > MIN_VELOCITY {
        body.x += body.vx;
        body.vx *= FRICTION;
        if body.x < 0.0 {
            body.x = 0.0;
            body.vx = -body.vx * WALL_RESTITUTION;
        } else if body.x > bounds.max_x {
            body.x = bounds.max_x;
            body.vx = -body.vx * WALL_RESTITUTION;
        }
    } else {
        body.vx = 0.0;
    }

    // Vertical: gravity pulls downward (positive vy), capped at terminal
    body.vy = (body.vy + GRAVITY).min(TERMINAL_VELOCITY);
    body.y -= body.vy;

    // Ceiling: a hard throw can push the body above the usable height
    if body.y > bounds.max_y {
        body.y = bounds.max_y;
        body.vy = -body.vy * WALL_RESTITUTION;
    }

    // Floor
    if body.y <= 0.0 {
        body.y = 0.0;
        if body.vy.abs() > MIN_BOUNCE_VELOCITY {
            body.bounce_count += 1;
            let damping = (BOUNCE_BASE_DAMPING
                + body.bounce_count as f32 * BOUNCE_DAMPING_INCREMENT)
                .min(BOUNCE_MAX_DAMPING);
            body.vy = -body.vy * (1.0 - damping);
        } else {
            body.vx = 0.0;
            body.vy = 0.0;
            body.bounce_count = 0;
            return true;
        }
    }

    false
}

/// Derive initial throw velocities from the pointer's most recent per-frame
/// displacement. Screen-space `delta.y` grows downward, matching the
/// positive-down convention of `CompanionBody::vy`.
pub fn throw_velocity(frame_delta: Vec2) -> (f32, f32) {
    let vx = (frame_delta.x * THROW_SCALE).clamp(-THROW_MAX, THROW_MAX);
    let vy = (frame_delta.y * THROW_SCALE).clamp(-THROW_MAX, THROW_MAX);
    (vx, vy)
}

/// Cosmetic landing shake: a random lateral jitter scaled by the remaining
/// fraction of the shake window so it decays to zero. Purely visual.
pub fn shake_jitter<R: Rng>(rng: &mut R, remaining: f32) -> f32 {
    let remaining = remaining.clamp(0.0, 1.0);
    rng.random_range(-SHAKE_AMPLITUDE..=SHAKE_AMPLITUDE) * remaining
}
