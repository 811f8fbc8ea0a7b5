//! PhysicsEngine - spring-mass simulation over the graph tables.
//!
//! One call to [`PhysicsEngine::step`] runs, in order: the spring pass,
//! gravity, the configurable damping, position integration, the fixed
//! settle damping and the boundary bounce. Integration is not sub-stepped;
//! callers decide how many steps to run per frame.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::forces::{
    apply_damping, apply_gravity, apply_spring_forces, constrain_to_bounds, integrate_positions,
};
use super::params::{
    DISTANCE_EPSILON, EngineConfig, RANDOMIZE_MARGIN, SETTLE_DAMPING, SimulationParams,
};
use crate::graph::{EdgeId, GraphEngine, NodeId};
use crate::raster::Rgb565;

/// Owns the node/edge tables, the simulation parameters and the canvas
/// bounds the nodes are confined to.
pub struct PhysicsEngine {
    graph: GraphEngine,
    params: SimulationParams,
    width: u16,
    height: u16,
    seed: u64,
    rng: ChaCha8Rng,
}

impl PhysicsEngine {
    /// Create an engine from a configuration.
    pub fn new(config: &EngineConfig) -> Self {
        let mut params = SimulationParams::default();
        params.merge(&config.params);
        Self {
            graph: GraphEngine::with_capacity(config.max_nodes, config.max_edges),
            params,
            width: config.width,
            height: config.height,
            seed: config.seed,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Create an engine with the default 320x240 canvas and capacities.
    pub fn with_defaults() -> Self {
        Self::new(&EngineConfig::default())
    }

    /// The node/edge tables.
    pub fn graph(&self) -> &GraphEngine {
        &self.graph
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    // =========================================================================
    // Graph Construction
    // =========================================================================

    /// Add a node at rest. Returns `None` once the node table is full.
    pub fn add_node(&mut self, x: f32, y: f32, mass: f32, color: Rgb565, radius: u8) -> Option<NodeId> {
        self.graph.add_node(x, y, mass, color, radius)
    }

    /// Add a spring between two active nodes. Returns `None` when an
    /// endpoint is invalid or the edge table is full.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, stiffness: f32, rest_length: f32) -> Option<EdgeId> {
        self.graph.add_edge(a, b, stiffness, rest_length)
    }

    /// See [`GraphEngine::deactivate_node`].
    pub fn deactivate_node(&mut self, id: NodeId) -> bool {
        self.graph.deactivate_node(id)
    }

    /// See [`GraphEngine::deactivate_edge`].
    pub fn deactivate_edge(&mut self, id: EdgeId) -> bool {
        self.graph.deactivate_edge(id)
    }

    /// See [`GraphEngine::set_edge_color`].
    pub fn set_edge_color(&mut self, id: EdgeId, color: Rgb565) {
        self.graph.set_edge_color(id, color);
    }

    /// Move a node without touching its velocity. No-op for unknown ids.
    pub fn set_node_position(&mut self, id: NodeId, x: f32, y: f32) {
        self.graph.set_node_position(id, x, y);
    }

    /// Drop every node and edge and reseed the random generator.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Replace parameters, field by field through the validating setters.
    pub fn set_params(&mut self, params: &SimulationParams) {
        self.params.merge(params);
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.params.set_damping(damping);
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.params.set_gravity(gravity);
    }

    pub fn set_time_step(&mut self, time_step: f32) {
        self.params.set_time_step(time_step);
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance the simulation by `dt`. Non-finite deltas are ignored.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() {
            return;
        }
        let SimulationParams { damping, gravity, .. } = self.params;
        let (width, height) = (self.width as f32, self.height as f32);

        let (springs, mut bodies) = self.graph.split_mut();
        apply_spring_forces(&springs, &mut bodies, dt);
        apply_gravity(&mut bodies, gravity, dt);
        apply_damping(&mut bodies, damping);
        integrate_positions(&mut bodies, dt);
        apply_damping(&mut bodies, SETTLE_DAMPING);
        constrain_to_bounds(&mut bodies, width, height);
    }

    /// Advance the simulation by the configured time step.
    pub fn update(&mut self) {
        self.step(self.params.time_step);
    }

    /// Apply an instantaneous force to one node for one time step.
    /// No-op for unknown or inactive nodes.
    pub fn repel_node(&mut self, id: NodeId, fx: f32, fy: f32) {
        if !self.graph.is_node_active(id) {
            return;
        }
        let dt = self.params.time_step;
        let i = id.index();
        let bodies = self.graph.bodies_mut();
        bodies.vx[i] += (fx / bodies.mass[i]) * dt;
        bodies.vy[i] += (fy / bodies.mass[i]) * dt;
    }

    /// Pull one node toward a point with force `strength / distance`.
    ///
    /// The impulse is not divided by the node's mass. Nothing happens when
    /// the node is within [`DISTANCE_EPSILON`] of the target, or when the
    /// node is unknown or inactive.
    pub fn attract_to_point(&mut self, id: NodeId, tx: f32, ty: f32, strength: f32) {
        if !self.graph.is_node_active(id) {
            return;
        }
        let dt = self.params.time_step;
        let i = id.index();
        let bodies = self.graph.bodies_mut();

        let dx = tx - bodies.x[i];
        let dy = ty - bodies.y[i];
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > DISTANCE_EPSILON {
            let force = strength / dist;
            bodies.vx[i] += (force * dx / dist) * dt;
            bodies.vy[i] += (force * dy / dist) * dt;
        }
    }

    /// Scatter every active node uniformly inside the canvas, inset by a
    /// margin, with a small random velocity in [-0.5, 0.49].
    pub fn randomize_positions(&mut self) {
        for i in 0..self.graph.node_count() {
            if !self.graph.is_node_active(NodeId(i as u32)) {
                continue;
            }
            let (x, y) = self.random_position();
            let vx = (self.rng.gen_range(0..100) - 50) as f32 * 0.01;
            let vy = (self.rng.gen_range(0..100) - 50) as f32 * 0.01;

            let bodies = self.graph.bodies_mut();
            bodies.x[i] = x;
            bodies.y[i] = y;
            bodies.vx[i] = vx;
            bodies.vy[i] = vy;
        }
    }

    /// A whole-pixel position drawn uniformly from the canvas inset by
    /// [`RANDOMIZE_MARGIN`] (or a quarter of the side on small canvases).
    pub(crate) fn random_position(&mut self) -> (f32, f32) {
        let margin_x = RANDOMIZE_MARGIN.min(self.width as u32 / 4);
        let margin_y = RANDOMIZE_MARGIN.min(self.height as u32 / 4);
        let span_x = (self.width as u32).saturating_sub(2 * margin_x).max(1);
        let span_y = (self.height as u32).saturating_sub(2 * margin_y).max(1);

        let x = margin_x + self.rng.gen_range(0..span_x);
        let y = margin_y + self.rng.gen_range(0..span_y);
        (x as f32, y as f32)
    }

    /// A random index in `0..n`. `n` must be non-zero.
    pub(crate) fn random_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Stop every node in place. Positions are left untouched.
    pub fn reset_simulation(&mut self) {
        let bodies = self.graph.bodies_mut();
        bodies.vx.fill(0.0);
        bodies.vy.fill(0.0);
    }
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(damping: f32, gravity: f32) -> PhysicsEngine {
        let mut engine = PhysicsEngine::with_defaults();
        engine.set_damping(damping);
        engine.set_gravity(gravity);
        engine
    }

    fn separation(engine: &PhysicsEngine, a: u32, b: u32) -> f32 {
        let (ax, ay) = engine.graph().node_position(NodeId(a)).unwrap();
        let (bx, by) = engine.graph().node_position(NodeId(b)).unwrap();
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }

    fn three_node_chain(engine: &mut PhysicsEngine) {
        for x in [10.0, 50.0, 90.0] {
            engine.add_node(x, 10.0, 1.0, Rgb565::WHITE, 3).unwrap();
        }
        engine.add_edge(NodeId(0), NodeId(1), 0.1, 20.0).unwrap();
        engine.add_edge(NodeId(1), NodeId(2), 0.1, 20.0).unwrap();
    }

    #[test]
    fn test_single_step_matches_pass_order() {
        let mut engine = engine(0.9, 0.0);
        engine.add_node(10.0, 10.0, 1.0, Rgb565::WHITE, 3);
        engine.add_node(50.0, 10.0, 1.0, Rgb565::WHITE, 3);
        engine.add_edge(NodeId(0), NodeId(1), 0.1, 20.0);

        engine.step(0.016);

        // spring: 2 * 0.016 = 0.032, damping 0.9 -> 0.0288,
        // x += 0.0288 * 0.016, then settle damping 0.995.
        let node = engine.graph().node(NodeId(0)).unwrap();
        assert!((node.vx - 0.0288 * 0.995).abs() < 1e-6);
        assert!((node.x - (10.0 + 0.0288 * 0.016)).abs() < 1e-5);
        assert_eq!(node.vy, 0.0);
    }

    #[test]
    fn test_chain_contracts_toward_rest_length() {
        let mut engine = engine(0.9, 0.0);
        three_node_chain(&mut engine);

        for _ in 0..100 {
            engine.step(0.016);
        }

        let left = separation(&engine, 0, 1);
        let right = separation(&engine, 1, 2);
        assert!(left < 40.0 && left > 20.0, "left separation {left}");
        assert!((left - right).abs() < 1e-3);

        let (mid_x, _) = engine.graph().node_position(NodeId(1)).unwrap();
        assert!((mid_x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_chain_converges_to_rest_length() {
        let mut engine = engine(0.9, 0.0);
        three_node_chain(&mut engine);

        for _ in 0..40_000 {
            engine.step(0.016);
        }

        assert!((separation(&engine, 0, 1) - 20.0).abs() < 2.0);
        assert!((separation(&engine, 1, 2) - 20.0).abs() < 2.0);
    }

    #[test]
    fn test_stiff_pair_settles_at_rest_length() {
        let mut engine = engine(0.98, 0.0);
        engine.add_node(100.0, 120.0, 1.0, Rgb565::WHITE, 3);
        engine.add_node(160.0, 120.0, 1.0, Rgb565::WHITE, 3);
        engine.add_edge(NodeId(0), NodeId(1), 1.0, 20.0);

        for _ in 0..3_000 {
            engine.step(0.016);
        }

        assert!((separation(&engine, 0, 1) - 20.0).abs() < 0.5);
        let node = engine.graph().node(NodeId(0)).unwrap();
        assert!(node.vx.abs() < 0.05);
    }

    #[test]
    fn test_nodes_stay_inside_canvas() {
        let mut engine = engine(1.0, 50.0);
        for i in 0..8 {
            let radius = 2 + i as u8;
            engine.add_node(20.0 + 35.0 * i as f32, 30.0 + 20.0 * i as f32, 1.0, Rgb565::WHITE, radius);
        }
        for i in 0..8 {
            engine.repel_node(NodeId(i), if i % 2 == 0 { 5.0e4 } else { -5.0e4 }, -3.0e4);
        }

        for _ in 0..500 {
            engine.step(0.05);
            for node in engine.graph().nodes() {
                let r = node.radius as f32;
                assert!(node.x >= r && node.x <= 320.0 - r, "x out of bounds: {node:?}");
                assert!(node.y >= r && node.y <= 240.0 - r, "y out of bounds: {node:?}");
            }
        }
    }

    #[test]
    fn test_gravity_accelerates_downward() {
        let mut engine = engine(1.0, 10.0);
        engine.add_node(100.0, 100.0, 1.0, Rgb565::WHITE, 3);
        engine.step(0.1);

        let node = engine.graph().node(NodeId(0)).unwrap();
        assert!(node.vy > 0.0);
        assert!(node.y > 100.0);
        assert_eq!(node.x, 100.0);
    }

    #[test]
    fn test_self_loop_produces_no_force() {
        let mut engine = engine(0.9, 0.0);
        engine.add_node(100.0, 100.0, 1.0, Rgb565::WHITE, 3);
        assert!(engine.add_edge(NodeId(0), NodeId(0), 1.0, 50.0).is_some());

        for _ in 0..10 {
            engine.step(0.016);
        }
        let node = engine.graph().node(NodeId(0)).unwrap();
        assert_eq!((node.x, node.y, node.vx, node.vy), (100.0, 100.0, 0.0, 0.0));
    }

    #[test]
    fn test_inactive_node_is_frozen() {
        let mut engine = engine(0.9, 5.0);
        engine.add_node(10.0, 10.0, 1.0, Rgb565::WHITE, 3);
        engine.add_node(90.0, 10.0, 1.0, Rgb565::WHITE, 3);
        engine.add_edge(NodeId(0), NodeId(1), 1.0, 10.0);
        engine.deactivate_node(NodeId(1));

        for _ in 0..20 {
            engine.step(0.016);
        }
        let frozen = engine.graph().node(NodeId(1)).unwrap();
        assert_eq!((frozen.x, frozen.y, frozen.vx, frozen.vy), (90.0, 10.0, 0.0, 0.0));

        let live = engine.graph().node(NodeId(0)).unwrap();
        assert_eq!(live.vx, 0.0);
        assert!(live.vy > 0.0);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut engine = engine(0.9, 1.0);
        engine.add_node(50.0, 50.0, 1.0, Rgb565::WHITE, 3);
        engine.step(f32::NAN);
        engine.step(f32::INFINITY);
        assert_eq!(engine.graph().node_position(NodeId(0)), Some((50.0, 50.0)));
    }

    #[test]
    fn test_update_uses_configured_time_step() {
        let mut a = engine(1.0, 10.0);
        let mut b = engine(1.0, 10.0);
        a.set_time_step(0.02);
        a.add_node(50.0, 50.0, 1.0, Rgb565::WHITE, 3);
        b.add_node(50.0, 50.0, 1.0, Rgb565::WHITE, 3);

        a.update();
        b.step(0.02);
        assert_eq!(a.graph().node(NodeId(0)), b.graph().node(NodeId(0)));
    }

    #[test]
    fn test_repel_node_impulse() {
        let mut engine = engine(0.9, 0.0);
        engine.add_node(50.0, 50.0, 2.0, Rgb565::WHITE, 3);

        engine.repel_node(NodeId(0), 10.0, -4.0);
        let node = engine.graph().node(NodeId(0)).unwrap();
        assert!((node.vx - 0.05).abs() < 1e-7);
        assert!((node.vy + 0.02).abs() < 1e-7);
        assert_eq!((node.x, node.y), (50.0, 50.0));
    }

    #[test]
    fn test_repel_invalid_or_inactive_is_noop() {
        let mut engine = engine(0.9, 0.0);
        engine.add_node(50.0, 50.0, 1.0, Rgb565::WHITE, 3);
        engine.add_node(60.0, 50.0, 1.0, Rgb565::WHITE, 3);
        engine.deactivate_node(NodeId(1));

        engine.repel_node(NodeId(1), 100.0, 100.0);
        engine.repel_node(NodeId(7), 100.0, 100.0);

        assert!(engine.graph().nodes().all(|n| n.vx == 0.0 && n.vy == 0.0));
    }

    #[test]
    fn test_attract_is_inverse_distance() {
        let mut engine = engine(0.9, 0.0);
        engine.add_node(100.0, 100.0, 4.0, Rgb565::WHITE, 3);

        // distance 5, force 50 / 5 = 10, direction (0.6, 0.8), dt 0.01
        engine.attract_to_point(NodeId(0), 103.0, 104.0, 50.0);
        let node = engine.graph().node(NodeId(0)).unwrap();
        assert!((node.vx - 0.06).abs() < 1e-6);
        assert!((node.vy - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_attract_within_epsilon_is_noop() {
        let mut engine = engine(0.9, 0.0);
        engine.add_node(100.0, 100.0, 1.0, Rgb565::WHITE, 3);
        engine.attract_to_point(NodeId(0), 100.05, 100.0, 1000.0);
        engine.attract_to_point(NodeId(3), 0.0, 0.0, 1000.0);

        let node = engine.graph().node(NodeId(0)).unwrap();
        assert_eq!((node.vx, node.vy), (0.0, 0.0));
    }

    #[test]
    fn test_reset_simulation_keeps_positions() {
        let mut engine = engine(0.9, 3.0);
        three_node_chain(&mut engine);
        for _ in 0..25 {
            engine.step(0.016);
        }
        let before: Vec<_> = engine.graph().nodes().map(|n| (n.x.to_bits(), n.y.to_bits())).collect();

        engine.reset_simulation();

        let after: Vec<_> = engine.graph().nodes().map(|n| (n.x.to_bits(), n.y.to_bits())).collect();
        assert_eq!(before, after);
        assert!(engine.graph().nodes().all(|n| n.vx == 0.0 && n.vy == 0.0));
    }

    #[test]
    fn test_randomize_positions_within_margin() {
        let mut engine = engine(0.9, 0.0);
        for _ in 0..8 {
            engine.add_node(0.0, 0.0, 1.0, Rgb565::WHITE, 3);
        }
        engine.deactivate_node(NodeId(7));

        engine.randomize_positions();

        for node in engine.graph().nodes().filter(|n| n.active) {
            assert!(node.x >= 20.0 && node.x < 300.0);
            assert!(node.y >= 20.0 && node.y < 220.0);
            assert!(node.vx >= -0.5 && node.vx <= 0.49);
            assert!(node.vy >= -0.5 && node.vy <= 0.49);
            assert_eq!(node.x.fract(), 0.0);
        }
        let skipped = engine.graph().node(NodeId(7)).unwrap();
        assert_eq!((skipped.x, skipped.y), (0.0, 0.0));
    }

    #[test]
    fn test_randomize_is_seeded() {
        let config = EngineConfig { seed: 42, ..EngineConfig::default() };
        let mut a = PhysicsEngine::new(&config);
        let mut b = PhysicsEngine::new(&config);
        for engine in [&mut a, &mut b] {
            engine.add_node(0.0, 0.0, 1.0, Rgb565::WHITE, 3);
            engine.add_node(0.0, 0.0, 1.0, Rgb565::WHITE, 3);
            engine.randomize_positions();
        }
        assert_eq!(
            a.graph().nodes().collect::<Vec<_>>(),
            b.graph().nodes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_config_params_are_validated() {
        let config = EngineConfig {
            params: SimulationParams {
                damping: 7.0,
                gravity: 0.5,
                time_step: 0.016,
            },
            ..EngineConfig::default()
        };
        let engine = PhysicsEngine::new(&config);
        assert_eq!(engine.params().damping, 1.0);
        assert_eq!(engine.params().gravity, 0.5);
        assert_eq!(engine.params().time_step, 0.016);
    }
}
