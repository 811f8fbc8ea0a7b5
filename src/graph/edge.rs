//! Edge type and related structures.
//!
//! Edges are springs connecting two nodes. Each edge has:
//! - A stable unique identifier
//! - Source and target node IDs
//! - Spring constant and rest length for the force pass
//! - Color and active state

use std::fmt;

use super::node::NodeId;
use crate::raster::Rgb565;

/// Stable edge identifier.
///
/// Edges are never removed from the table, only deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    #[inline]
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

/// Edge state flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeState {
    flags: u8,
}

impl EdgeState {
    const ACTIVE: u8 = 0b0000_0001;

    /// Create the state of a freshly added edge (active).
    #[inline]
    pub fn new() -> Self {
        Self { flags: Self::ACTIVE }
    }

    /// Check if the edge contributes forces and is drawn.
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

/// Spring parameters stored as the petgraph edge weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// Stable identifier of this edge.
    pub id: EdgeId,
    /// Hooke constant `k`.
    pub stiffness: f32,
    /// Separation at which the spring exerts no force.
    pub rest_length: f32,
    /// Line color used by the renderer.
    pub color: Rgb565,
    /// Active flag.
    pub state: EdgeState,
}

/// Copy of a single edge's record, as returned by table queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub stiffness: f32,
    pub rest_length: f32,
    pub color: Rgb565,
    pub active: bool,
}
