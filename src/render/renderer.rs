//! GraphRenderer - composes the graph onto a raster surface each frame.

use serde::{Deserialize, Serialize};

use crate::graph::GraphEngine;
use crate::raster::{PixelSink, RasterSurface, Rect, Rgb565};

/// How a frame reaches the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Clear and send the whole surface every frame.
    #[default]
    Full,
    /// Erase only last frame's footprint and send the touched region.
    /// The panel ends up identical to [`RenderMode::Full`].
    Dirty,
}

/// Renderer configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clear color.
    pub background: Rgb565,
    pub mode: RenderMode,
}

/// Draws edges then nodes and flushes the result.
///
/// Node and edge coordinates are truncated toward zero when converted to
/// pixels. A node is drawn as an outlined circle of its radius plus a
/// filled `radius x radius` square whose top-left corner sits at
/// `(x - radius/2, y - radius/2)`.
#[derive(Debug, Default)]
pub struct GraphRenderer {
    config: RenderConfig,
    /// Pixel footprint of the last dirty-mode frame. `None` until the
    /// first dirty-mode frame has been fully flushed.
    footprint: Option<Option<Rect>>,
}

impl GraphRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            footprint: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replace the configuration. The next frame is a full redraw.
    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
        self.invalidate();
    }

    /// Forget what the panel shows so the next frame is a full redraw.
    /// Call this after drawing to the surface or sink outside the renderer.
    pub fn invalidate(&mut self) {
        self.footprint = None;
    }

    /// Render one frame of `graph` and flush it to `sink`.
    pub fn draw<S: PixelSink>(
        &mut self,
        graph: &GraphEngine,
        surface: &mut RasterSurface,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        match self.config.mode {
            RenderMode::Full => {
                self.footprint = None;
                surface.fill_screen(self.config.background);
                self.compose(graph, surface);
                surface.flush(sink)
            }
            RenderMode::Dirty => self.draw_dirty(graph, surface, sink),
        }
    }

    fn draw_dirty<S: PixelSink>(
        &mut self,
        graph: &GraphEngine,
        surface: &mut RasterSurface,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        let background = self.config.background;
        let footprint = footprint(graph, surface.width(), surface.height());

        match self.footprint {
            Some(previous) => {
                surface.clear_dirty();
                if let Some(rect) = previous {
                    surface.fill_rect(rect.x as i32, rect.y as i32, rect.w as i32, rect.h as i32, background);
                }
                self.compose(graph, surface);
                surface.flush_dirty(sink)?;
            }
            None => {
                surface.set_dirty_tracking(true);
                surface.fill_screen(background);
                self.compose(graph, surface);
                surface.flush(sink)?;
            }
        }

        self.footprint = Some(footprint);
        Ok(())
    }

    /// Draw edges, then nodes, onto an already cleared surface.
    fn compose(&self, graph: &GraphEngine, surface: &mut RasterSurface) {
        for edge in graph.edges().filter(|edge| edge.active) {
            let (Some(a), Some(b)) = (graph.node(edge.source), graph.node(edge.target)) else {
                continue;
            };
            if !a.active || !b.active {
                continue;
            }
            surface.draw_line(a.x as i32, a.y as i32, b.x as i32, b.y as i32, edge.color);
        }

        for node in graph.nodes().filter(|node| node.active) {
            let (x, y, r) = (node.x as i32, node.y as i32, node.radius as i32);
            surface.draw_circle(x, y, r, node.color);
            surface.fill_rect(x.saturating_sub(r / 2), y.saturating_sub(r / 2), r, r, node.color);
        }
    }
}

/// Clipped bounding box of every pixel `compose` can touch: the union of
/// the active nodes' circles. Edges run between node centers, so they are
/// inside it too.
fn footprint(graph: &GraphEngine, width: u16, height: u16) -> Option<Rect> {
    let (mut x0, mut y0, mut x1, mut y1) = (i64::MAX, i64::MAX, i64::MIN, i64::MIN);
    for node in graph.nodes().filter(|node| node.active) {
        let (x, y, r) = (node.x as i32 as i64, node.y as i32 as i64, node.radius as i64);
        x0 = x0.min(x - r);
        y0 = y0.min(y - r);
        x1 = x1.max(x + r);
        y1 = y1.max(y + r);
    }
    let (x0, y0) = (x0.max(0), y0.max(0));
    let (x1, y1) = (x1.min(width as i64 - 1), y1.min(height as i64 - 1));
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0 + 1) as u16, (y1 - y0 + 1) as u16))
}
