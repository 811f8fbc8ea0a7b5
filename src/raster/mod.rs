//! Software raster pipeline.
//!
//! - `color`: RGB565 packing
//! - `surface`: the pixel buffer and its drawing primitives
//! - `dirty`: rectangles and the dirty-region tracker
//! - `sink`: the device-facing [`PixelSink`] trait and in-memory sinks

mod color;
mod dirty;
mod sink;
mod surface;

pub use color::{Rgb565, rgb};
pub use dirty::{DirtyRegion, Rect};
pub use sink::{FrameMirror, PixelSink, RecordingSink, SinkCall};
pub use surface::RasterSurface;
