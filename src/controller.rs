//! Force controller - the per-frame driver around the physics engine.
//!
//! Runs the fixed number of physics steps per frame, injects the animated
//! time-based forces, turns pointer drags into attraction toward the
//! pointer and applies discrete control commands.

use serde::{Deserialize, Serialize};

use crate::console;
use crate::graph::NodeId;
use crate::layout::{DEFAULT_DEMO_SPRING_STRENGTH, Topology};
use crate::physics::{DISTANCE_EPSILON, PhysicsEngine};
use crate::spatial::SpatialIndex;

/// Simulated seconds that pass per frame.
pub const FRAME_TIME: f32 = 0.016;

/// Physics steps run per frame.
pub const STEPS_PER_FRAME: usize = 2;

/// Radius of the rotating attractor around the canvas center.
pub const ATTRACTOR_RADIUS: f32 = 50.0;

/// Strength of the rotating attractor.
pub const ATTRACTOR_STRENGTH: f32 = 50.0;

/// A pointer press further than this from every node picks nothing.
pub const DRAG_PICK_RADIUS: f32 = 12.0;

/// Attraction strength pulling a dragged node toward the pointer.
pub const DRAG_STRENGTH: f32 = 5000.0;

const DAMPING_STEP: f32 = 0.01;
const DAMPING_MIN: f32 = 0.8;
const DAMPING_MAX: f32 = 0.99;
const SPRING_STEP: f32 = 0.01;
const SPRING_MIN: f32 = 0.01;
const GRAVITY_ON: f32 = 0.5;

/// A discrete control input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    /// Scatter the nodes.
    Randomize,
    /// Zero every velocity.
    Stop,
    DampingUp,
    DampingDown,
    /// Stiffen the springs of the next demo network.
    SpringUp,
    SpringDown,
    GravityOn,
    GravityOff,
}

impl ControlCommand {
    /// Map a single-key command to its action.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'r' => Some(Self::Randomize),
            's' => Some(Self::Stop),
            'd' => Some(Self::DampingUp),
            'u' => Some(Self::DampingDown),
            '+' => Some(Self::SpringUp),
            '-' => Some(Self::SpringDown),
            'g' => Some(Self::GravityOn),
            'n' => Some(Self::GravityOff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    node: NodeId,
    x: f32,
    y: f32,
}

/// Drives a [`PhysicsEngine`] frame by frame.
pub struct ForceController {
    time: f32,
    spring_strength: f32,
    time_forces: bool,
    drag: Option<Drag>,
    index: SpatialIndex,
}

impl ForceController {
    /// Create a controller at time zero with the default demo spring
    /// strength.
    pub fn new() -> Self {
        Self {
            time: 0.0,
            spring_strength: DEFAULT_DEMO_SPRING_STRENGTH,
            time_forces: true,
            drag: None,
            index: SpatialIndex::new(),
        }
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn spring_strength(&self) -> f32 {
        self.spring_strength
    }

    /// Enable or disable the pulse and rotating attractor.
    pub fn set_time_forces(&mut self, enabled: bool) {
        self.time_forces = enabled;
    }

    /// The demo network at the current spring strength.
    pub fn demo_topology(&self) -> Topology {
        Topology::Demo {
            spring_strength: self.spring_strength,
        }
    }

    /// Node currently held by the pointer.
    pub fn dragged_node(&self) -> Option<NodeId> {
        self.drag.map(|drag| drag.node)
    }

    // =========================================================================
    // Frame Loop
    // =========================================================================

    /// Advance one frame: physics steps, then external forces, then the
    /// clock.
    pub fn frame(&mut self, engine: &mut PhysicsEngine) {
        for _ in 0..STEPS_PER_FRAME {
            engine.update();
        }
        if self.time_forces {
            apply_time_forces(engine, self.time);
        }
        if let Some(drag) = self.drag {
            engine.attract_to_point(drag.node, drag.x, drag.y, DRAG_STRENGTH);
        }
        self.time += FRAME_TIME;
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    /// Grab the node under the pointer, or the closest one within
    /// [`DRAG_PICK_RADIUS`].
    pub fn pointer_down(&mut self, engine: &PhysicsEngine, x: f32, y: f32) -> Option<NodeId> {
        self.index.rebuild_from(engine.graph());
        let node = self
            .index
            .hit_test(x, y)
            .or_else(|| self.index.nearest_within(x, y, DRAG_PICK_RADIUS))?;
        self.drag = Some(Drag { node, x, y });
        Some(node)
    }

    /// Move the drag target. No-op when nothing is held.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(drag) = self.drag.as_mut() {
            drag.x = x;
            drag.y = y;
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Apply one control command.
    pub fn handle(&mut self, command: ControlCommand, engine: &mut PhysicsEngine) {
        match command {
            ControlCommand::Randomize => {
                engine.randomize_positions();
                console::log("positions randomized");
            }
            ControlCommand::Stop => {
                engine.reset_simulation();
                console::log("simulation reset");
            }
            ControlCommand::DampingUp | ControlCommand::DampingDown => {
                let delta = if command == ControlCommand::DampingUp {
                    DAMPING_STEP
                } else {
                    -DAMPING_STEP
                };
                let damping = (engine.params().damping + delta).clamp(DAMPING_MIN, DAMPING_MAX);
                engine.set_damping(damping);
                console::log(&format!("damping: {damping}"));
            }
            ControlCommand::SpringUp => {
                self.spring_strength += SPRING_STEP;
                console::log(&format!("spring strength: {}", self.spring_strength));
            }
            ControlCommand::SpringDown => {
                self.spring_strength = (self.spring_strength - SPRING_STEP).max(SPRING_MIN);
                console::log(&format!("spring strength: {}", self.spring_strength));
            }
            ControlCommand::GravityOn => engine.set_gravity(GRAVITY_ON),
            ControlCommand::GravityOff => engine.set_gravity(0.0),
        }
    }
}

impl Default for ForceController {
    fn default() -> Self {
        Self::new()
    }
}

/// Animated forces at simulated time `t`.
///
/// During even half-seconds every node but the last is pushed radially
/// from the canvas center by `sin(2t) * 0.1`, so the push reverses into a
/// pull when the sine is negative. Every node is also drawn toward a point
/// circling the center at angular rate 2.
pub fn apply_time_forces(engine: &mut PhysicsEngine, t: f32) {
    let pulse = (t * 2.0).sin() * 100.0;
    let cx = engine.width() as f32 / 2.0;
    let cy = engine.height() as f32 / 2.0;
    let count = engine.graph().node_count();

    if (t * 2.0) as i32 % 2 == 0 {
        for i in 0..count.saturating_sub(1) {
            let id = NodeId(i as u32);
            let Some((x, y)) = engine.graph().node_position(id) else {
                continue;
            };
            let (dx, dy) = (x - cx, y - cy);
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > DISTANCE_EPSILON {
                let force = pulse * 0.001;
                engine.repel_node(id, dx / dist * force, dy / dist * force);
            }
        }
    }

    let angle = t * 2.0;
    let tx = cx + ATTRACTOR_RADIUS * angle.cos();
    let ty = cy + ATTRACTOR_RADIUS * angle.sin();
    for i in 0..count {
        engine.attract_to_point(NodeId(i as u32), tx, ty, ATTRACTOR_STRENGTH);
    }
}
