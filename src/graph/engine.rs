//! GraphEngine - node and edge tables for the spring simulation.
//!
//! The GraphEngine stores the spring topology using petgraph's StableGraph
//! and keeps SoA (Structure of Arrays) buffers for positions, velocities and
//! per-node attributes so the integrator can walk them linearly and the
//! wasm facade can hand them to JavaScript without copying.
//!
//! Both tables are fixed-capacity. Adds beyond capacity are dropped, and
//! nodes/edges are deactivated instead of removed, so ids stay stable.

use petgraph::Undirected;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};

use super::edge::{Edge, EdgeId, EdgeState, Spring};
use super::node::{Node, NodeId, NodeState};
use crate::console;
use crate::raster::Rgb565;

/// Default node table capacity, sized for a small embedded panel.
pub const DEFAULT_NODE_CAPACITY: usize = 8;

/// Default edge table capacity.
pub const DEFAULT_EDGE_CAPACITY: usize = 32;

/// Color given to every new edge.
pub const DEFAULT_EDGE_COLOR: Rgb565 = Rgb565::GRAY;

type SpringGraph = StableGraph<NodeId, Spring, Undirected>;

/// The node/edge tables.
///
/// This struct manages:
/// - Spring topology via petgraph
/// - Position/velocity buffers in SoA layout
/// - Mass, radius, color and active state per node
/// - Explicit node and edge capacities
pub struct GraphEngine {
    /// The underlying graph structure.
    /// Nodes store their stable NodeId, edges store their spring.
    graph: SpringGraph,

    /// Maximum number of nodes the table accepts.
    node_capacity: usize,

    /// Maximum number of edges the table accepts.
    edge_capacity: usize,

    /// X positions (SoA layout)
    pos_x: Vec<f32>,

    /// Y positions (SoA layout)
    pos_y: Vec<f32>,

    /// X velocities (SoA layout)
    vel_x: Vec<f32>,

    /// Y velocities (SoA layout)
    vel_y: Vec<f32>,

    /// Node masses, always positive.
    mass: Vec<f32>,

    /// Visual radii in pixels.
    radius: Vec<u8>,

    /// Node colors.
    color: Vec<Rgb565>,

    /// Node states (active flag)
    states: Vec<NodeState>,
}

/// Mutable view of the per-node SoA buffers used by the integrator.
pub struct Bodies<'a> {
    pub x: &'a mut [f32],
    pub y: &'a mut [f32],
    pub vx: &'a mut [f32],
    pub vy: &'a mut [f32],
    pub mass: &'a [f32],
    pub radius: &'a [u8],
    pub states: &'a [NodeState],
}

impl Bodies<'_> {
    /// Number of node slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the table holds no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Whether slot `i` is active.
    #[inline]
    pub fn is_active(&self, i: usize) -> bool {
        self.states[i].is_active()
    }
}

/// Read-only view of the spring list, borrowed alongside [`Bodies`].
pub struct Springs<'a> {
    graph: &'a SpringGraph,
}

impl<'a> Springs<'a> {
    /// Iterate `(source slot, target slot, spring)` in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &'a Spring)> + 'a {
        let graph = self.graph;
        graph.edge_indices().filter_map(move |index| {
            let (a, b) = graph.edge_endpoints(index)?;
            let spring = graph.edge_weight(index)?;
            Some((a.index(), b.index(), spring))
        })
    }
}

impl GraphEngine {
    /// Create an empty engine with the default capacities (8 nodes, 32 edges).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NODE_CAPACITY, DEFAULT_EDGE_CAPACITY)
    }

    /// Create an engine whose tables hold at most the given number of entries.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            node_capacity,
            edge_capacity,
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            vel_x: Vec::with_capacity(node_capacity),
            vel_y: Vec::with_capacity(node_capacity),
            mass: Vec::with_capacity(node_capacity),
            radius: Vec::with_capacity(node_capacity),
            color: Vec::with_capacity(node_capacity),
            states: Vec::with_capacity(node_capacity),
        }
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node at rest at the specified position.
    ///
    /// Returns `None` when the node table is full, or when the position is
    /// not finite or the mass is not a positive finite number. Nothing is
    /// modified in that case.
    pub fn add_node(&mut self, x: f32, y: f32, mass: f32, color: Rgb565, radius: u8) -> Option<NodeId> {
        if self.node_count() >= self.node_capacity {
            console::warn(&format!(
                "node table full ({} slots), dropping node at ({x}, {y})",
                self.node_capacity
            ));
            return None;
        }
        if !x.is_finite() || !y.is_finite() || !mass.is_finite() || mass <= 0.0 {
            console::warn(&format!("rejecting node at ({x}, {y}) with mass {mass}"));
            return None;
        }

        let id = NodeId(self.states.len() as u32);
        self.graph.add_node(id);

        self.pos_x.push(x);
        self.pos_y.push(y);
        self.vel_x.push(0.0);
        self.vel_y.push(0.0);
        self.mass.push(mass);
        self.radius.push(radius);
        self.color.push(color);
        self.states.push(NodeState::new());

        Some(id)
    }

    /// Deactivate a node. Its edges stay in the table but are skipped.
    ///
    /// Returns true if the node existed and was active.
    pub fn deactivate_node(&mut self, id: NodeId) -> bool {
        match self.states.get_mut(id.index()) {
            Some(state) if state.is_active() => {
                state.set_active(false);
                true
            }
            _ => false,
        }
    }

    /// Number of nodes ever added, active or not.
    pub fn node_count(&self) -> usize {
        self.states.len()
    }

    /// Number of nodes still active.
    pub fn active_node_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_active()).count()
    }

    /// Node table capacity.
    pub fn node_capacity(&self) -> usize {
        self.node_capacity
    }

    /// Check whether `id` names a node in the table.
    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.states.len()
    }

    /// Check whether `id` names an active node.
    pub fn is_node_active(&self, id: NodeId) -> bool {
        self.states
            .get(id.index())
            .map(|state| state.is_active())
            .unwrap_or(false)
    }

    /// Get a copy of a node's record.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        let i = id.index();
        let state = self.states.get(i)?;
        Some(Node {
            id,
            x: self.pos_x[i],
            y: self.pos_y[i],
            vx: self.vel_x[i],
            vy: self.vel_y[i],
            mass: self.mass[i],
            radius: self.radius[i],
            color: self.color[i],
            active: state.is_active(),
        })
    }

    /// Iterate over every node record in id order.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        (0..self.states.len() as u32).filter_map(move |i| self.node(NodeId(i)))
    }

    /// Get a node's position.
    pub fn node_position(&self, id: NodeId) -> Option<(f32, f32)> {
        let i = id.index();
        (i < self.states.len()).then(|| (self.pos_x[i], self.pos_y[i]))
    }

    /// Move a node. No-op for unknown ids.
    pub fn set_node_position(&mut self, id: NodeId, x: f32, y: f32) {
        let i = id.index();
        if i < self.states.len() && x.is_finite() && y.is_finite() {
            self.pos_x[i] = x;
            self.pos_y[i] = y;
        }
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a spring between two nodes with the default edge color.
    ///
    /// Both endpoints must name active nodes. `source == target` is accepted;
    /// such a spring has zero length and never produces a force. Returns
    /// `None` when the edge table is full, an endpoint is invalid, or the
    /// spring parameters are negative or not finite.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        stiffness: f32,
        rest_length: f32,
    ) -> Option<EdgeId> {
        if self.edge_count() >= self.edge_capacity {
            console::warn(&format!(
                "edge table full ({} slots), dropping edge {source} - {target}",
                self.edge_capacity
            ));
            return None;
        }
        if !self.is_node_active(source) || !self.is_node_active(target) {
            console::warn(&format!("dropping edge with invalid endpoints {source} - {target}"));
            return None;
        }
        if !stiffness.is_finite() || stiffness < 0.0 || !rest_length.is_finite() || rest_length < 0.0 {
            console::warn(&format!(
                "dropping edge {source} - {target} with invalid spring ({stiffness}, {rest_length})"
            ));
            return None;
        }

        let id = EdgeId(self.graph.edge_count() as u32);
        let spring = Spring {
            id,
            stiffness,
            rest_length,
            color: DEFAULT_EDGE_COLOR,
            state: EdgeState::new(),
        };
        self.graph.add_edge(
            NodeIndex::new(source.index()),
            NodeIndex::new(target.index()),
            spring,
        );

        Some(id)
    }

    /// Deactivate an edge.
    ///
    /// Returns true if the edge existed and was active.
    pub fn deactivate_edge(&mut self, id: EdgeId) -> bool {
        match self.graph.edge_weight_mut(EdgeIndex::new(id.0 as usize)) {
            Some(spring) if spring.state.is_active() => {
                spring.state.set_active(false);
                true
            }
            _ => false,
        }
    }

    /// Change an edge's line color. No-op for unknown ids.
    pub fn set_edge_color(&mut self, id: EdgeId, color: Rgb565) {
        if let Some(spring) = self.graph.edge_weight_mut(EdgeIndex::new(id.0 as usize)) {
            spring.color = color;
        }
    }

    /// Number of edges ever added, active or not.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edge table capacity.
    pub fn edge_capacity(&self) -> usize {
        self.edge_capacity
    }

    /// Get a copy of an edge's record.
    pub fn edge(&self, id: EdgeId) -> Option<Edge> {
        let index = EdgeIndex::new(id.0 as usize);
        let (a, b) = self.graph.edge_endpoints(index)?;
        let spring = self.graph.edge_weight(index)?;
        Some(Edge {
            id,
            source: NodeId(a.index() as u32),
            target: NodeId(b.index() as u32),
            stiffness: spring.stiffness,
            rest_length: spring.rest_length,
            color: spring.color,
            active: spring.state.is_active(),
        })
    }

    /// Iterate over every edge record in creation order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph
            .edge_indices()
            .filter_map(move |index| self.edge(EdgeId(index.index() as u32)))
    }

    /// Get the nodes sharing an edge with `id`, regardless of edge state.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains_node(id) {
            return Vec::new();
        }
        self.graph
            .neighbors(NodeIndex::new(id.index()))
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    /// Get X velocities slice.
    pub fn velocities_x(&self) -> &[f32] {
        &self.vel_x
    }

    /// Get Y velocities slice.
    pub fn velocities_y(&self) -> &[f32] {
        &self.vel_y
    }

    /// Mutable view of the node buffers.
    pub fn bodies_mut(&mut self) -> Bodies<'_> {
        Bodies {
            x: &mut self.pos_x,
            y: &mut self.pos_y,
            vx: &mut self.vel_x,
            vy: &mut self.vel_y,
            mass: &self.mass,
            radius: &self.radius,
            states: &self.states,
        }
    }

    /// Borrow the spring list and the node buffers at the same time.
    pub fn split_mut(&mut self) -> (Springs<'_>, Bodies<'_>) {
        (
            Springs { graph: &self.graph },
            Bodies {
                x: &mut self.pos_x,
                y: &mut self.pos_y,
                vx: &mut self.vel_x,
                vy: &mut self.vel_y,
                mass: &self.mass,
                radius: &self.radius,
                states: &self.states,
            },
        )
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Get the bounding box of all active nodes.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for (i, state) in self.states.iter().enumerate() {
            if !state.is_active() {
                continue;
            }
            min_x = min_x.min(self.pos_x[i]);
            max_x = max_x.max(self.pos_x[i]);
            min_y = min_y.min(self.pos_y[i]);
            max_y = max_y.max(self.pos_y[i]);
        }

        if min_x == f32::INFINITY {
            return None;
        }

        Some((min_x, min_y, max_x, max_y))
    }

    /// Drop all nodes and edges and start numbering ids from zero again.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.pos_x.clear();
        self.pos_y.clear();
        self.vel_x.clear();
        self.vel_y.clear();
        self.mass.clear();
        self.radius.clear();
        self.color.clear();
        self.states.clear();
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}
