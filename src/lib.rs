//! Springgraph - WASM Module
//!
//! A small force-directed graph: nodes are point masses, edges are springs.
//! Every frame the physics engine advances the simulation, the renderer
//! rasterizes the graph into an RGB565 surface and the surface is flushed
//! through a windowed pixel sink. The core is plain Rust; the
//! `SpringGraphWasm` facade exposes it to JavaScript via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: node/edge tables over petgraph's StableGraph with SoA buffers
//! - `physics`: spring, gravity, damping and boundary passes
//! - `raster`: RGB565 surface, drawing primitives, pixel sinks
//! - `render`: per-frame composition and full or dirty-region flush
//! - `spatial`: R-tree hit testing for pointer interaction
//! - `layout`: topology presets
//! - `controller`: frame loop, animated forces and control commands

use js_sys::{Float32Array, Uint16Array};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

pub mod console;
pub mod controller;
pub mod graph;
pub mod layout;
pub mod physics;
pub mod raster;
pub mod render;
pub mod spatial;

use controller::{ControlCommand, ForceController};
use graph::{EdgeId, NodeId};
use layout::Topology;
use physics::{EngineConfig, PhysicsEngine, SimulationParams};
use raster::{FrameMirror, RasterSurface, Rgb565};
use render::{GraphRenderer, RenderConfig};
use spatial::SpatialIndex;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Configuration accepted by `SpringGraphWasm.withConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringGraphConfig {
    pub engine: EngineConfig,
    pub render: RenderConfig,
}

/// Main entry point for the spring graph.
///
/// Owns the physics engine, the raster surface, the renderer and an
/// in-memory panel that receives every flush. JavaScript reads the panel
/// through `getFramebufferView` and blits it.
#[wasm_bindgen]
pub struct SpringGraphWasm {
    engine: PhysicsEngine,
    surface: RasterSurface,
    renderer: GraphRenderer,
    panel: FrameMirror,
    controller: ForceController,
}

impl SpringGraphWasm {
    fn from_config(config: &SpringGraphConfig) -> Self {
        let engine = PhysicsEngine::new(&config.engine);
        let (width, height) = (config.engine.width, config.engine.height);
        console::log(&format!(
            "springgraph: {width}x{height}, {} nodes / {} edges",
            config.engine.max_nodes, config.engine.max_edges
        ));
        Self {
            controller: ForceController::new(),
            engine,
            surface: RasterSurface::new(width, height),
            renderer: GraphRenderer::new(config.render),
            panel: FrameMirror::new(width, height),
        }
    }

    /// Add a preset to the graph. Returns the number of nodes that fit.
    pub fn load_topology(&mut self, topology: Topology) -> usize {
        topology.build(&mut self.engine).len()
    }
}

#[wasm_bindgen]
impl SpringGraphWasm {
    /// Create a 320x240 graph with room for 8 nodes and 32 edges.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::from_config(&SpringGraphConfig::default())
    }

    /// Create a graph from a plain JS config object. Missing fields take
    /// their defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<SpringGraphWasm, JsValue> {
        let config: SpringGraphConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        Ok(Self::from_config(&config))
    }

    pub fn width(&self) -> u16 {
        self.engine.width()
    }

    pub fn height(&self) -> u16 {
        self.engine.height()
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node at rest.
    ///
    /// Returns the node ID, or None if the table is full or the values are
    /// invalid.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, x: f32, y: f32, mass: f32, color: u16, radius: u8) -> Option<u32> {
        self.engine
            .add_node(x, y, mass, Rgb565(color), radius)
            .map(|id| id.0)
    }

    /// Deactivate a node. Returns true if it was active.
    #[wasm_bindgen(js_name = deactivateNode)]
    pub fn deactivate_node(&mut self, node_id: u32) -> bool {
        self.engine.deactivate_node(NodeId(node_id))
    }

    /// Number of nodes ever added, active or not.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.engine.graph().node_count()
    }

    #[wasm_bindgen(js_name = activeNodeCount)]
    pub fn active_node_count(&self) -> usize {
        self.engine.graph().active_node_count()
    }

    #[wasm_bindgen(js_name = isNodeActive)]
    pub fn is_node_active(&self, node_id: u32) -> bool {
        self.engine.graph().is_node_active(NodeId(node_id))
    }

    /// Get a node's X position.
    #[wasm_bindgen(js_name = getNodeX)]
    pub fn get_node_x(&self, node_id: u32) -> Option<f32> {
        self.engine.graph().node_position(NodeId(node_id)).map(|(x, _)| x)
    }

    /// Get a node's Y position.
    #[wasm_bindgen(js_name = getNodeY)]
    pub fn get_node_y(&self, node_id: u32) -> Option<f32> {
        self.engine.graph().node_position(NodeId(node_id)).map(|(_, y)| y)
    }

    /// Move a node without touching its velocity.
    #[wasm_bindgen(js_name = setNodePosition)]
    pub fn set_node_position(&mut self, node_id: u32, x: f32, y: f32) {
        self.engine.set_node_position(NodeId(node_id), x, y);
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a spring between two active nodes.
    ///
    /// Returns the edge ID, or None if an endpoint is invalid or the table
    /// is full.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, source: u32, target: u32, stiffness: f32, rest_length: f32) -> Option<u32> {
        self.engine
            .add_edge(NodeId(source), NodeId(target), stiffness, rest_length)
            .map(|id| id.0)
    }

    /// Deactivate an edge. Returns true if it was active.
    #[wasm_bindgen(js_name = deactivateEdge)]
    pub fn deactivate_edge(&mut self, edge_id: u32) -> bool {
        self.engine.deactivate_edge(EdgeId(edge_id))
    }

    #[wasm_bindgen(js_name = setEdgeColor)]
    pub fn set_edge_color(&mut self, edge_id: u32, color: u16) {
        self.engine.set_edge_color(EdgeId(edge_id), Rgb565(color));
    }

    /// Number of edges ever added, active or not.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> usize {
        self.engine.graph().edge_count()
    }

    /// Get neighbors of a node.
    ///
    /// Returns a Uint32Array of neighbor node IDs.
    #[wasm_bindgen(js_name = getNeighbors)]
    pub fn get_neighbors(&self, node_id: u32) -> Vec<u32> {
        self.engine
            .graph()
            .neighbors(NodeId(node_id))
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    /// Build a preset topology from a `{ kind, ... }` object.
    ///
    /// Returns the number of nodes that fit in the table.
    #[wasm_bindgen(js_name = loadPreset)]
    pub fn load_preset(&mut self, preset: JsValue) -> Result<usize, JsValue> {
        let topology: Topology = serde_wasm_bindgen::from_value(preset)
            .map_err(|e| JsValue::from_str(&format!("Invalid preset: {}", e)))?;
        Ok(self.load_topology(topology))
    }

    /// Build the demo network at the controller's spring strength.
    #[wasm_bindgen(js_name = loadDemo)]
    pub fn load_demo(&mut self) -> usize {
        self.load_topology(self.controller.demo_topology())
    }

    /// Clear all nodes and edges. The next frame is a full redraw.
    pub fn clear(&mut self) {
        self.engine.clear();
        self.controller.pointer_up();
        self.renderer.invalidate();
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance the simulation by `dt`.
    pub fn step(&mut self, dt: f32) {
        self.engine.step(dt);
    }

    /// Advance the simulation by the configured time step.
    pub fn update(&mut self) {
        self.engine.update();
    }

    /// Run one driver frame: physics steps, animated forces, pointer drag.
    pub fn frame(&mut self) {
        self.controller.frame(&mut self.engine);
    }

    #[wasm_bindgen(js_name = setTimeForces)]
    pub fn set_time_forces(&mut self, enabled: bool) {
        self.controller.set_time_forces(enabled);
    }

    #[wasm_bindgen(js_name = repelNode)]
    pub fn repel_node(&mut self, node_id: u32, fx: f32, fy: f32) {
        self.engine.repel_node(NodeId(node_id), fx, fy);
    }

    #[wasm_bindgen(js_name = attractToPoint)]
    pub fn attract_to_point(&mut self, node_id: u32, x: f32, y: f32, strength: f32) {
        self.engine.attract_to_point(NodeId(node_id), x, y, strength);
    }

    #[wasm_bindgen(js_name = randomizePositions)]
    pub fn randomize_positions(&mut self) {
        self.engine.randomize_positions();
    }

    /// Stop every node in place.
    #[wasm_bindgen(js_name = resetSimulation)]
    pub fn reset_simulation(&mut self) {
        self.engine.reset_simulation();
    }

    /// Apply a single-key command (r, s, d, u, +, -, g, n).
    ///
    /// Returns false for unknown keys.
    pub fn command(&mut self, key: char) -> bool {
        match ControlCommand::from_key(key) {
            Some(command) => {
                self.controller.handle(command, &mut self.engine);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    #[wasm_bindgen(js_name = setDamping)]
    pub fn set_damping(&mut self, damping: f32) {
        self.engine.set_damping(damping);
    }

    #[wasm_bindgen(js_name = setGravity)]
    pub fn set_gravity(&mut self, gravity: f32) {
        self.engine.set_gravity(gravity);
    }

    #[wasm_bindgen(js_name = setTimeStep)]
    pub fn set_time_step(&mut self, time_step: f32) {
        self.engine.set_time_step(time_step);
    }

    /// Merge `{ damping, gravity, time_step }` into the current parameters.
    /// Invalid values are ignored field by field.
    #[wasm_bindgen(js_name = setParams)]
    pub fn set_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let params: SimulationParams = serde_wasm_bindgen::from_value(params)
            .map_err(|e| JsValue::from_str(&format!("Invalid params: {}", e)))?;
        self.engine.set_params(&params);
        Ok(())
    }

    #[wasm_bindgen(js_name = getParams)]
    pub fn get_params(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.engine.params())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = setRenderConfig)]
    pub fn set_render_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: RenderConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid render config: {}", e)))?;
        self.renderer.set_config(config);
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the graph and flush it to the framebuffer.
    pub fn draw(&mut self) {
        let Ok(()) = self
            .renderer
            .draw(self.engine.graph(), &mut self.surface, &mut self.panel);
    }

    /// Get a zero-copy view of the RGB565 framebuffer, row-major.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for blitting, do not store.
    #[wasm_bindgen(js_name = getFramebufferView)]
    pub fn get_framebuffer_view(&self) -> Uint16Array {
        unsafe { Uint16Array::view(self.panel.memory()) }
    }

    /// Get a pointer to the framebuffer.
    ///
    /// Used for creating views after WASM memory growth.
    #[wasm_bindgen(js_name = framebufferPtr)]
    pub fn framebuffer_ptr(&self) -> *const u16 {
        self.panel.memory().as_ptr()
    }

    // =========================================================================
    // Position Buffer Access (Zero-Copy)
    // =========================================================================

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.graph().positions_x()) }
    }

    /// Get a zero-copy view of Y positions.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.graph().positions_y()) }
    }

    #[wasm_bindgen(js_name = getVelocitiesXView)]
    pub fn get_velocities_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.graph().velocities_x()) }
    }

    #[wasm_bindgen(js_name = getVelocitiesYView)]
    pub fn get_velocities_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.graph().velocities_y()) }
    }

    /// Get the length of the position buffers.
    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.engine.graph().positions_x().len()
    }

    /// Get the bounding box of all active nodes.
    ///
    /// Returns [min_x, min_y, max_x, max_y], or None if no node is active.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.engine
            .graph()
            .bounds()
            .map(|(min_x, min_y, max_x, max_y)| vec![min_x, min_y, max_x, max_y])
    }

    // =========================================================================
    // Pointer Interaction
    // =========================================================================

    /// Find the node drawn under a point.
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, x: f32, y: f32) -> Option<u32> {
        SpatialIndex::from_graph(self.engine.graph())
            .hit_test(x, y)
            .map(|id| id.0)
    }

    /// Find the nearest active node to a point.
    #[wasm_bindgen(js_name = findNearestNode)]
    pub fn find_nearest_node(&self, x: f32, y: f32) -> Option<u32> {
        SpatialIndex::from_graph(self.engine.graph())
            .nearest(x, y)
            .map(|id| id.0)
    }

    /// Find all active nodes whose centers lie in a rectangular region.
    ///
    /// Returns a Uint32Array of node IDs in ascending order.
    #[wasm_bindgen(js_name = findNodesInRect)]
    pub fn find_nodes_in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<u32> {
        let mut ids: Vec<u32> = SpatialIndex::from_graph(self.engine.graph())
            .in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(|id| id.0)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Find the nearest active node within a maximum distance.
    #[wasm_bindgen(js_name = findNearestNodeWithin)]
    pub fn find_nearest_node_within(&self, x: f32, y: f32, max_distance: f32) -> Option<u32> {
        SpatialIndex::from_graph(self.engine.graph())
            .nearest_within(x, y, max_distance)
            .map(|id| id.0)
    }

    /// Start dragging the node at the pointer. Returns its ID.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<u32> {
        self.controller.pointer_down(&self.engine, x, y).map(|id| id.0)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.controller.pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }
}

impl Default for SpringGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::raster::{PixelSink, RecordingSink};
    use crate::render::RenderMode;

    /// Full pipeline: preset → controller frames → renderer → panel.
    /// Same path as the facade's `frame` + `draw`, without JS types.
    #[test]
    fn test_demo_pipeline_keeps_nodes_on_canvas() {
        let mut app = SpringGraphWasm::new();
        app.set_gravity(0.5);
        app.set_damping(0.92);
        app.set_time_step(0.016);
        assert_eq!(app.load_demo(), 7);
        assert_eq!(app.edge_count(), 12);

        for _ in 0..300 {
            app.frame();
            app.draw();

            for node in app.engine.graph().nodes() {
                let r = node.radius as f32;
                assert!(node.x >= r && node.x <= 320.0 - r);
                assert!(node.y >= r && node.y <= 240.0 - r);
            }
        }

        let panel: Vec<u16> = app.surface.pixels().iter().map(|p| p.raw()).collect();
        assert_eq!(app.panel.memory(), &panel[..]);
        assert!(app.panel.memory().contains(&Rgb565::YELLOW.raw()));
    }

    #[test]
    fn test_capacity_saturation_through_facade() {
        let mut app = SpringGraphWasm::new();
        for i in 0..10 {
            let id = app.add_node(20.0 + i as f32 * 25.0, 50.0, 1.0, 0xFFFF, 3);
            assert_eq!(id.is_some(), i < 8);
        }
        assert_eq!(app.node_count(), 8);
        assert_eq!(app.get_node_x(7), Some(195.0));

        assert_eq!(app.add_edge(0, 9, 0.1, 20.0), None);
        assert_eq!(app.edge_count(), 0);
    }

    #[test]
    fn test_three_node_scenario_draws_deterministically() {
        let mut engine = PhysicsEngine::with_defaults();
        engine.set_damping(0.9);
        for x in [10.0, 50.0, 90.0] {
            engine.add_node(x, 10.0, 1.0, Rgb565::CYAN, 3);
        }
        assert!(engine.add_edge(NodeId(0), NodeId(5), 0.1, 20.0).is_none());
        engine.add_edge(NodeId(0), NodeId(1), 0.1, 20.0);
        engine.add_edge(NodeId(1), NodeId(2), 0.1, 20.0);
        for _ in 0..100 {
            engine.step(0.016);
        }

        let mut renderer = GraphRenderer::default();
        let mut first = RecordingSink::new();
        let mut second = RecordingSink::new();
        renderer
            .draw(engine.graph(), &mut RasterSurface::new(320, 240), &mut first)
            .unwrap();
        renderer
            .draw(engine.graph(), &mut RasterSurface::new(320, 240), &mut second)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.windows(), vec![(0, 0, 319, 239)]);
        assert_eq!(first.pixel_count(), 320 * 240);
    }

    #[test]
    fn test_dirty_mode_panel_matches_full_mode() {
        let dirty_config = SpringGraphConfig {
            render: RenderConfig {
                mode: RenderMode::Dirty,
                ..RenderConfig::default()
            },
            ..SpringGraphConfig::default()
        };
        let mut full = SpringGraphWasm::new();
        let mut dirty = SpringGraphWasm::from_config(&dirty_config);

        for app in [&mut full, &mut dirty] {
            app.load_topology(Topology::Ring { nodes: 6 });
            app.set_gravity(0.5);
        }

        for frame in 0..120 {
            if frame == 60 {
                full.command('r');
                dirty.command('r');
            }
            for app in [&mut full, &mut dirty] {
                app.frame();
                app.draw();
            }
            assert_eq!(full.panel.memory(), dirty.panel.memory(), "frame {frame}");
        }
    }

    #[test]
    fn test_pointer_drag_moves_node_toward_pointer() {
        let mut app = SpringGraphWasm::new();
        app.set_time_forces(false);
        app.add_node(100.0, 120.0, 1.0, 0xF800, 5);
        app.add_node(220.0, 120.0, 1.0, 0x07E0, 5);

        assert_eq!(app.hit_test(102.0, 121.0), Some(0));
        assert_eq!(app.pointer_down(102.0, 121.0), Some(0));
        app.pointer_move(160.0, 60.0);
        for _ in 0..30 {
            app.frame();
        }
        app.pointer_up();

        let x = app.get_node_x(0).unwrap();
        let y = app.get_node_y(0).unwrap();
        assert!(x > 100.0 && y < 120.0);
        assert_eq!(app.get_node_x(1), Some(220.0));
    }

    #[test]
    fn test_draw_with_far_off_canvas_node() {
        let mut app = SpringGraphWasm::new();
        app.set_time_forces(false);
        let far = app.add_node(-3.0e9, 10.0, 1.0, 0xFFFF, 3).unwrap();
        let near = app.add_node(40.0, 10.0, 1.0, 0xF800, 3).unwrap();
        app.add_edge(far, near, 0.1, 20.0);
        app.draw();

        assert!(!app.panel.memory().contains(&0xFFFF));
        assert_eq!(app.panel.memory()[10 * 320], Rgb565::GRAY.raw());

        app.frame();
        app.draw();
        for id in [far, near] {
            let x = app.get_node_x(id).unwrap();
            assert!((0.0..=320.0).contains(&x), "node {id} at {x}");
        }
    }

    #[test]
    fn test_spatial_queries_skip_inactive_nodes() {
        let mut app = SpringGraphWasm::new();
        app.add_node(40.0, 40.0, 1.0, 0xF800, 4);
        app.add_node(60.0, 50.0, 1.0, 0x07E0, 4);
        app.add_node(200.0, 200.0, 1.0, 0x001F, 4);

        assert_eq!(app.find_nearest_node(45.0, 42.0), Some(0));
        assert_eq!(app.find_nodes_in_rect(0.0, 0.0, 100.0, 100.0), vec![0, 1]);

        app.deactivate_node(0);
        assert_eq!(app.find_nearest_node(45.0, 42.0), Some(1));
        assert_eq!(app.find_nodes_in_rect(0.0, 0.0, 100.0, 100.0), vec![1]);
        assert_eq!(app.find_nearest_node_within(45.0, 42.0, 5.0), None);
    }

    #[test]
    fn test_clear_resets_graph_and_redraws() {
        let mut app = SpringGraphWasm::new();
        app.load_demo();
        app.draw();
        app.clear();
        assert_eq!(app.node_count(), 0);
        assert_eq!(app.edge_count(), 0);

        app.draw();
        assert!(app.panel.memory().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let mut app = SpringGraphWasm::new();
        assert!(!app.command('?'));
        assert!(app.command('d'));
        assert!((app.engine.params().damping - 0.96).abs() < 1e-6);
    }

    #[test]
    fn test_damping_command_steps_from_set_damping() {
        let mut app = SpringGraphWasm::new();
        app.set_damping(0.92);
        assert!(app.command('d'));
        assert!((app.engine.params().damping - 0.93).abs() < 1e-6);

        assert!(app.command('u'));
        assert!(app.command('u'));
        assert!((app.engine.params().damping - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_sink_trait_object_flush() {
        let mut surface = RasterSurface::new(4, 2);
        surface.fill_rect(1, 0, 2, 2, Rgb565::RED);
        let mut recording = RecordingSink::new();
        {
            let sink: &mut dyn PixelSink<Error = std::convert::Infallible> = &mut recording;
            surface.flush(&mut &mut *sink).unwrap();
        }
        assert_eq!(recording.pixel_count(), 8);
    }
}
