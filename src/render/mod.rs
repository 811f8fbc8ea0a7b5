//! Frame composition.
//!
//! [`GraphRenderer`] turns the graph tables into pixels on a
//! [`RasterSurface`](crate::raster::RasterSurface) and pushes them to a
//! [`PixelSink`](crate::raster::PixelSink), either as a full frame or as
//! the region that changed.

mod renderer;

pub use renderer::{GraphRenderer, RenderConfig, RenderMode};
