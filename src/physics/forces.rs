//! The individual passes of one integration step.
//!
//! Each pass walks the node buffers once and skips inactive slots.

use super::params::{BOUNCE_RESTITUTION, DISTANCE_EPSILON};
use crate::graph::{Bodies, Springs};

/// Hooke springs. Each active spring between two active nodes pushes its
/// endpoints toward the rest length with equal and opposite impulses.
/// Springs shorter than [`DISTANCE_EPSILON`] are skipped.
pub fn apply_spring_forces(springs: &Springs<'_>, bodies: &mut Bodies<'_>, dt: f32) {
    for (a, b, spring) in springs.iter() {
        if !spring.state.is_active() || !bodies.is_active(a) || !bodies.is_active(b) {
            continue;
        }

        let dx = bodies.x[b] - bodies.x[a];
        let dy = bodies.y[b] - bodies.y[a];
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < DISTANCE_EPSILON {
            continue;
        }

        let force = spring.stiffness * (dist - spring.rest_length);
        let fx = force * dx / dist;
        let fy = force * dy / dist;

        bodies.vx[a] += (fx / bodies.mass[a]) * dt;
        bodies.vy[a] += (fy / bodies.mass[a]) * dt;
        bodies.vx[b] -= (fx / bodies.mass[b]) * dt;
        bodies.vy[b] -= (fy / bodies.mass[b]) * dt;
    }
}

/// Constant downward acceleration.
pub fn apply_gravity(bodies: &mut Bodies<'_>, gravity: f32, dt: f32) {
    for i in 0..bodies.len() {
        if bodies.is_active(i) {
            bodies.vy[i] += gravity * dt;
        }
    }
}

/// Multiply every active velocity by `factor`.
pub fn apply_damping(bodies: &mut Bodies<'_>, factor: f32) {
    for i in 0..bodies.len() {
        if bodies.is_active(i) {
            bodies.vx[i] *= factor;
            bodies.vy[i] *= factor;
        }
    }
}

/// Semi-implicit Euler position update from the current velocities.
pub fn integrate_positions(bodies: &mut Bodies<'_>, dt: f32) {
    for i in 0..bodies.len() {
        if bodies.is_active(i) {
            bodies.x[i] += bodies.vx[i] * dt;
            bodies.y[i] += bodies.vy[i] * dt;
        }
    }
}

/// Keep every active node's disc inside the canvas, reflecting the
/// offending velocity component with [`BOUNCE_RESTITUTION`].
pub fn constrain_to_bounds(bodies: &mut Bodies<'_>, width: f32, height: f32) {
    for i in 0..bodies.len() {
        if !bodies.is_active(i) {
            continue;
        }
        let r = bodies.radius[i] as f32;

        if bodies.x[i] - r < 0.0 {
            bodies.x[i] = r;
            bodies.vx[i] *= -BOUNCE_RESTITUTION;
        }
        if bodies.x[i] + r > width {
            bodies.x[i] = width - r;
            bodies.vx[i] *= -BOUNCE_RESTITUTION;
        }

        if bodies.y[i] - r < 0.0 {
            bodies.y[i] = r;
            bodies.vy[i] *= -BOUNCE_RESTITUTION;
        }
        if bodies.y[i] + r > height {
            bodies.y[i] = height - r;
            bodies.vy[i] *= -BOUNCE_RESTITUTION;
        }
    }
}
