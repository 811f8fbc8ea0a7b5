//! Simulation parameters and engine configuration.

use serde::{Deserialize, Serialize};

use crate::graph::{DEFAULT_EDGE_CAPACITY, DEFAULT_NODE_CAPACITY};

/// Minimum separation (in canvas units) for a pairwise force to apply.
pub const DISTANCE_EPSILON: f32 = 0.1;

/// Fixed velocity decay applied after position integration, on top of the
/// configurable damping.
pub const SETTLE_DAMPING: f32 = 0.995;

/// Fraction of speed kept when a node bounces off a canvas edge.
pub const BOUNCE_RESTITUTION: f32 = 0.8;

/// Inset from the canvas edges used by `randomize_positions`.
pub const RANDOMIZE_MARGIN: u32 = 20;

/// Per-engine tunables, read on every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Velocity multiplier per step, in (0, 1].
    pub damping: f32,
    /// Downward acceleration.
    pub gravity: f32,
    /// Step size used by `update` and by impulses.
    pub time_step: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            damping: 0.95,
            gravity: 0.0,
            time_step: 0.01,
        }
    }
}

impl SimulationParams {
    /// Set the damping coefficient. Values above 1 are clamped to 1;
    /// non-positive or non-finite values are ignored.
    pub fn set_damping(&mut self, damping: f32) {
        if damping.is_finite() && damping > 0.0 {
            self.damping = damping.min(1.0);
        }
    }

    /// Set gravity. Non-finite values are ignored.
    pub fn set_gravity(&mut self, gravity: f32) {
        if gravity.is_finite() {
            self.gravity = gravity;
        }
    }

    /// Set the step size. Negative or non-finite values are ignored.
    pub fn set_time_step(&mut self, time_step: f32) {
        if time_step.is_finite() && time_step >= 0.0 {
            self.time_step = time_step;
        }
    }

    /// Apply every field of `other` through the validating setters.
    pub fn merge(&mut self, other: &SimulationParams) {
        self.set_damping(other.damping);
        self.set_gravity(other.gravity);
        self.set_time_step(other.time_step);
    }
}

/// Configuration for a [`PhysicsEngine`](super::PhysicsEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canvas width; nodes are kept within `[radius, width - radius]`.
    pub width: u16,
    /// Canvas height.
    pub height: u16,
    /// Node table capacity.
    pub max_nodes: usize,
    /// Edge table capacity.
    pub max_edges: usize,
    /// Seed for `randomize_positions`.
    pub seed: u64,
    /// Initial simulation parameters.
    pub params: SimulationParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            max_nodes: DEFAULT_NODE_CAPACITY,
            max_edges: DEFAULT_EDGE_CAPACITY,
            seed: 0,
            params: SimulationParams::default(),
        }
    }
}
