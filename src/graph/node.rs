//! Node type and related structures.
//!
//! Nodes are the point masses of the graph. Each node has:
//! - A stable unique identifier (its slot in the node table, never reused)
//! - Position (x, y) in canvas space
//! - Velocity (vx, vy) for the spring simulation
//! - Mass, visual radius and color
//! - Active state (inactive nodes are skipped by physics and rendering)

use std::fmt;

use crate::raster::Rgb565;

/// Stable node identifier.
///
/// Identifiers are assigned in creation order and index the node table
/// directly. Nodes are deactivated rather than removed, so an id always
/// refers to the same logical node for the lifetime of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot index into the SoA buffers.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const ACTIVE: u8 = 0b0000_0001;

    /// Create the state of a freshly added node (active).
    #[inline]
    pub fn new() -> Self {
        Self { flags: Self::ACTIVE }
    }

    /// Check if the node takes part in simulation and rendering.
    #[inline]
    pub fn is_active(self) -> bool {
        self.flags & Self::ACTIVE != 0
    }

    /// Set the active state.
    #[inline]
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.flags |= Self::ACTIVE;
        } else {
            self.flags &= !Self::ACTIVE;
        }
    }
}

/// Copy of a single node's record, as returned by table queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub mass: f32,
    pub radius: u8,
    pub color: Rgb565,
    pub active: bool,
}
