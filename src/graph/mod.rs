//! Graph data structures and operations.
//!
//! This module provides the fixed-capacity node and edge tables using
//! petgraph's StableGraph for the spring topology, with Structure of Arrays
//! (SoA) layout for positions and velocities so the integrator walks them
//! linearly.

mod edge;
mod engine;
mod node;

pub use edge::{Edge, EdgeId, EdgeState, Spring};
pub use engine::{
    Bodies, DEFAULT_EDGE_CAPACITY, DEFAULT_EDGE_COLOR, DEFAULT_NODE_CAPACITY, GraphEngine, Springs,
};
pub use node::{Node, NodeId, NodeState};
