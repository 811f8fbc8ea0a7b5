//! Spatial indexing for pointer hit testing.
//!
//! An R-tree over the active nodes answers nearest-node and
//! node-under-cursor queries for the pointer drag controller.

mod rtree;

pub use rtree::{NodeDisc, SpatialIndex};
