//! Topology presets.
//!
//! Each preset places nodes on the engine's canvas and wires them with
//! springs tuned for that shape. Everything goes through
//! [`PhysicsEngine::add_node`] and [`PhysicsEngine::add_edge`], so the
//! engine's capacities apply: nodes past capacity are dropped and edges
//! touching a dropped node are skipped.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::palette::{color_for_index, demo_color_for_index};
use crate::console;
use crate::graph::NodeId;
use crate::physics::PhysicsEngine;
use crate::raster::Rgb565;

/// Spring stiffness the demo network starts with.
pub const DEFAULT_DEMO_SPRING_STRENGTH: f32 = 0.15;

/// A named graph shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Every pair connected, nodes on a circle of radius 50.
    Complete { nodes: usize },
    /// Outer nodes on a circle of radius 60, each tied to a heavier hub.
    Star { outer: usize },
    /// Evenly spaced horizontal line.
    Chain { nodes: usize },
    /// Circle of radius 60, each node tied to the next.
    Ring { nodes: usize },
    /// Fixed three-level binary tree of seven nodes.
    BinaryTree,
    /// `cols x rows` lattice with right and down neighbors connected.
    Grid { cols: usize, rows: usize },
    /// Random positions with `edges` random attempts at connecting pairs.
    Random { nodes: usize, edges: usize },
    /// Six-node ring around a hub: spokes at `spring_strength`, rim at half.
    Demo { spring_strength: f32 },
}

impl Topology {
    /// Add this shape to `engine`. Returns the ids of the nodes that made
    /// it into the table.
    pub fn build(self, engine: &mut PhysicsEngine) -> Vec<NodeId> {
        let mut builder = Builder::new(engine);
        match self {
            Topology::Complete { nodes } => complete(&mut builder, nodes),
            Topology::Star { outer } => star(&mut builder, outer),
            Topology::Chain { nodes } => chain(&mut builder, nodes),
            Topology::Ring { nodes } => ring(&mut builder, nodes),
            Topology::BinaryTree => binary_tree(&mut builder),
            Topology::Grid { cols, rows } => grid(&mut builder, cols, rows),
            Topology::Random { nodes, edges } => random(&mut builder, nodes, edges),
            Topology::Demo { spring_strength } => demo(&mut builder, spring_strength),
        }
        let ids = builder.finish();
        console::log(&format!("built {self:?} with {} nodes", ids.len()));
        ids
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Demo {
            spring_strength: DEFAULT_DEMO_SPRING_STRENGTH,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Tracks the preset-local node order so edges can be declared by position
/// even when some adds were dropped.
struct Builder<'a> {
    engine: &'a mut PhysicsEngine,
    slots: Vec<Option<NodeId>>,
}

impl<'a> Builder<'a> {
    fn new(engine: &'a mut PhysicsEngine) -> Self {
        Self {
            engine,
            slots: Vec::new(),
        }
    }

    fn width(&self) -> f32 {
        self.engine.width() as f32
    }

    fn height(&self) -> f32 {
        self.engine.height() as f32
    }

    fn center(&self) -> (f32, f32) {
        (self.width() / 2.0, self.height() / 2.0)
    }

    /// Node slots left in the engine's table.
    fn room(&self) -> usize {
        let graph = self.engine.graph();
        graph.node_capacity().saturating_sub(graph.node_count())
    }

    /// Clamp a requested node count to what the table can still take.
    fn fit(&self, count: usize) -> usize {
        count.min(self.room())
    }

    fn edges_full(&self) -> bool {
        let graph = self.engine.graph();
        graph.edge_count() >= graph.edge_capacity()
    }

    fn node(&mut self, x: f32, y: f32, mass: f32, color: Rgb565, radius: u8) {
        let id = self.engine.add_node(x, y, mass, color, radius);
        self.slots.push(id);
    }

    /// Place `count` nodes evenly on a circle around the canvas center.
    /// Angles follow `count` even when only some of them fit.
    fn circle(&mut self, count: usize, radius: f32, color: fn(usize) -> Rgb565, mass: f32, size: u8) {
        let (cx, cy) = self.center();
        for i in 0..self.fit(count) {
            let angle = (2.0 * PI * i as f32) / count as f32;
            self.node(cx + radius * angle.cos(), cy + radius * angle.sin(), mass, color(i), size);
        }
    }

    fn edge(&mut self, a: usize, b: usize, stiffness: f32, rest_length: f32) {
        let (Some(Some(a)), Some(Some(b))) = (self.slots.get(a), self.slots.get(b)) else {
            return;
        };
        self.engine.add_edge(*a, *b, stiffness, rest_length);
    }

    fn finish(self) -> Vec<NodeId> {
        self.slots.into_iter().flatten().collect()
    }
}

// ============================================================================
// Shapes
// ============================================================================
//
// Requested sizes come straight from JS, so every loop runs over the nodes
// that actually fit and stops once the edge table is full.

fn complete(b: &mut Builder<'_>, nodes: usize) {
    b.circle(nodes, 50.0, color_for_index, 1.0, 4);
    let placed = b.slots.len();
    for i in 0..placed {
        for j in (i + 1)..placed {
            if b.edges_full() {
                return;
            }
            b.edge(i, j, 0.05, 80.0);
        }
    }
}

fn star(b: &mut Builder<'_>, outer: usize) {
    b.circle(outer, 60.0, color_for_index, 1.0, 4);
    // The hub only fits when every outer node did.
    if b.slots.len() < outer {
        return;
    }
    let (cx, cy) = b.center();
    b.node(cx, cy, 2.0, Rgb565::YELLOW, 5);
    for i in 0..outer {
        if b.edges_full() {
            return;
        }
        b.edge(i, outer, 0.2, 60.0);
    }
}

fn chain(b: &mut Builder<'_>, nodes: usize) {
    // Integer spacing keeps nodes on whole pixels.
    let spacing = (b.engine.width() as usize / nodes.saturating_add(1)) as f32;
    let y = b.height() / 2.0;
    for i in 0..b.fit(nodes) {
        b.node(spacing * (i + 1) as f32, y, 1.0, color_for_index(i), 4);
    }
    for i in 1..b.slots.len() {
        if b.edges_full() {
            return;
        }
        b.edge(i - 1, i, 0.3, 50.0);
    }
}

fn ring(b: &mut Builder<'_>, nodes: usize) {
    b.circle(nodes, 60.0, color_for_index, 1.0, 4);
    for i in 0..b.slots.len() {
        if b.edges_full() {
            return;
        }
        b.edge(i, (i + 1) % nodes, 0.25, 70.0);
    }
}

fn binary_tree(b: &mut Builder<'_>) {
    let w = b.width();
    b.node(w / 2.0, 30.0, 1.5, Rgb565::RED, 4);

    b.node(w / 4.0, 80.0, 1.2, Rgb565::ORANGE, 4);
    b.node(3.0 * w / 4.0, 80.0, 1.2, Rgb565::ORANGE, 4);

    for k in [1.0, 3.0, 5.0, 7.0] {
        b.node(k * w / 8.0, 130.0, 1.0, Rgb565::YELLOW, 4);
    }

    for (parent, child) in [(0, 1), (0, 2), (1, 3), (1, 4), (2, 5), (2, 6)] {
        b.edge(parent, child, 0.2, 50.0);
    }
}

fn grid(b: &mut Builder<'_>, cols: usize, rows: usize) {
    if cols == 0 || rows == 0 {
        return;
    }
    let dx = (b.engine.width() as usize / cols.saturating_add(1)) as f32;
    let dy = (b.engine.height() as usize / rows.saturating_add(1)) as f32;

    // Row-major, so the cells that fit are a prefix of the lattice.
    let cells = b.fit(cols.saturating_mul(rows));
    for idx in 0..cells {
        let (x, y) = (idx % cols, idx / cols);
        b.node(dx * (x + 1) as f32, dy * (y + 1) as f32, 1.0, color_for_index(x + y), 3);
    }

    for idx in 0..cells {
        if b.edges_full() {
            return;
        }
        let (x, y) = (idx % cols, idx / cols);
        if x + 1 < cols {
            b.edge(idx, idx + 1, 0.2, dx);
        }
        if y + 1 < rows {
            if let Some(below) = idx.checked_add(cols) {
                b.edge(idx, below, 0.2, dy);
            }
        }
    }
}

fn random(b: &mut Builder<'_>, nodes: usize, edges: usize) {
    for i in 0..b.fit(nodes) {
        let (x, y) = b.engine.random_position();
        b.node(x, y, 1.0, color_for_index(i), 4);
    }
    let placed = b.slots.len();
    if placed == 0 {
        return;
    }
    for _ in 0..edges.min(placed.saturating_mul(placed)) {
        if b.edges_full() {
            return;
        }
        let n1 = b.engine.random_index(placed);
        let n2 = b.engine.random_index(placed);
        if n1 != n2 {
            b.edge(n1, n2, 0.15, 70.0);
        }
    }
}

fn demo(b: &mut Builder<'_>, spring_strength: f32) {
    const RING: usize = 6;

    b.circle(RING, 60.0, demo_color_for_index, 1.5, 4);
    let (cx, cy) = b.center();
    b.node(cx, cy, 2.0, Rgb565::YELLOW, 5);

    for i in 0..RING {
        b.edge(i, RING, spring_strength, 60.0);
    }
    for i in 0..RING {
        b.edge(i, (i + 1) % RING, spring_strength * 0.5, 80.0);
    }
}
