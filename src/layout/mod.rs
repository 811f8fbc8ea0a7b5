//! Graph construction presets.
//!
//! Builds common spring topologies on a
//! [`PhysicsEngine`](crate::physics::PhysicsEngine) and assigns node colors
//! from a fixed palette.

pub mod palette;
pub mod topology;

pub use palette::{DEMO_PALETTE, PALETTE, color_for_index, demo_color_for_index};
pub use topology::{DEFAULT_DEMO_SPRING_STRENGTH, Topology};
