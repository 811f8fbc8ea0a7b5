//! Spring-mass physics.
//!
//! - `params`: tunables and engine configuration
//! - `forces`: the per-pass force, integration and boundary functions
//! - `engine`: [`PhysicsEngine`], which owns the graph and runs the passes

mod engine;
mod forces;
mod params;

pub use engine::PhysicsEngine;
pub use forces::{
    apply_damping, apply_gravity, apply_spring_forces, constrain_to_bounds, integrate_positions,
};
pub use params::{
    BOUNCE_RESTITUTION, DISTANCE_EPSILON, EngineConfig, RANDOMIZE_MARGIN, SETTLE_DAMPING,
    SimulationParams,
};
