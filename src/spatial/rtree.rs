//! R-tree based spatial index using the rstar crate.
//!
//! Nodes are indexed as discs (center + drawn radius) so pointer queries
//! can ask both "which node is closest" and "which node is under the
//! cursor".

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::{GraphEngine, NodeId};

/// A node disc stored in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDisc {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl NodeDisc {
    pub fn new(id: NodeId, x: f32, y: f32, radius: f32) -> Self {
        Self { id, x, y, radius }
    }

    /// Whether `(x, y)` lies on or inside the disc.
    pub fn covers(&self, x: f32, y: f32) -> bool {
        self.distance_2(&[x, y]) <= self.radius * self.radius
    }
}

impl RTreeObject for NodeDisc {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodeDisc {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over the active nodes of a graph.
///
/// The index is a snapshot; call [`SpatialIndex::rebuild_from`] after the
/// simulation has moved nodes.
pub struct SpatialIndex {
    tree: RTree<NodeDisc>,
    max_radius: f32,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            max_radius: 0.0,
        }
    }

    /// Build an index from the active nodes of `graph`.
    pub fn from_graph(graph: &GraphEngine) -> Self {
        let mut index = Self::new();
        index.rebuild_from(graph);
        index
    }

    /// Replace the contents with the active nodes of `graph`.
    pub fn rebuild_from(&mut self, graph: &GraphEngine) {
        let discs: Vec<_> = graph
            .nodes()
            .filter(|node| node.active)
            .map(|node| NodeDisc::new(node.id, node.x, node.y, node.radius as f32))
            .collect();
        self.rebuild(discs);
    }

    /// Bulk-load the index from a list of discs.
    pub fn rebuild(&mut self, discs: Vec<NodeDisc>) {
        self.max_radius = discs.iter().map(|d| d.radius).fold(0.0, f32::max);
        self.tree = RTree::bulk_load(discs);
    }

    /// Find the node whose center is nearest to a point.
    pub fn nearest(&self, x: f32, y: f32) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[x, y]).map(|disc| disc.id)
    }

    /// Find the nearest node whose center is within `max_distance`.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|disc| disc.distance_2(&[x, y]) <= max_distance_sq)
            .map(|disc| disc.id)
    }

    /// Find the node drawn under a point: the closest disc that covers it.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        let reach = self.max_radius * self.max_radius;
        self.tree
            .locate_within_distance([x, y], reach)
            .filter(|disc| disc.covers(x, y))
            .min_by(|a, b| a.distance_2(&[x, y]).total_cmp(&b.distance_2(&[x, y])))
            .map(|disc| disc.id)
    }

    /// Find all nodes whose centers lie inside a rectangle.
    pub fn in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<NodeId> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|disc| disc.id)
            .collect()
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.max_radius = 0.0;
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
