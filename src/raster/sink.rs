//! Pixel sinks: the device side of a flush.
//!
//! A sink accepts an inclusive address window followed by a stream of
//! pixels in row-major order inside that window, the way a windowed
//! display controller's memory write works. Command encoding, chip select
//! and transport live behind the trait.

use std::convert::Infallible;

use super::color::Rgb565;

/// Destination of surface flushes.
pub trait PixelSink {
    /// Transport error. Surfaces never inspect it, only propagate it.
    type Error;

    /// Set the inclusive target window for the following pixel writes.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Self::Error>;

    /// Stream one pixel into the current window.
    fn write_pixel(&mut self, color: Rgb565) -> Result<(), Self::Error>;

    /// Stream a run of pixels into the current window.
    fn write_pixels(&mut self, colors: &[Rgb565]) -> Result<(), Self::Error> {
        for &color in colors {
            self.write_pixel(color)?;
        }
        Ok(())
    }
}

impl<S: PixelSink + ?Sized> PixelSink for &mut S {
    type Error = S::Error;

    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Self::Error> {
        (**self).set_window(x0, y0, x1, y1)
    }

    fn write_pixel(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        (**self).write_pixel(color)
    }

    fn write_pixels(&mut self, colors: &[Rgb565]) -> Result<(), Self::Error> {
        (**self).write_pixels(colors)
    }
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Window { x0: u16, y0: u16, x1: u16, y1: u16 },
    Pixel(Rgb565),
}

/// Sink that records every call, for golden-output comparisons.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls in the order they arrived.
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// The windows that were set, in order.
    pub fn windows(&self) -> Vec<(u16, u16, u16, u16)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                SinkCall::Window { x0, y0, x1, y1 } => Some((x0, y0, x1, y1)),
                SinkCall::Pixel(_) => None,
            })
            .collect()
    }

    /// Number of pixel writes received.
    pub fn pixel_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, SinkCall::Pixel(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl PixelSink for RecordingSink {
    type Error = Infallible;

    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Infallible> {
        self.calls.push(SinkCall::Window { x0, y0, x1, y1 });
        Ok(())
    }

    fn write_pixel(&mut self, color: Rgb565) -> Result<(), Infallible> {
        self.calls.push(SinkCall::Pixel(color));
        Ok(())
    }
}

/// In-memory model of the display's graphics RAM.
///
/// Pixel writes land at a cursor that walks the current window row by row
/// and wraps back to the window origin after its last pixel. Windows are
/// clamped to the panel size. The wasm facade exposes this memory so the
/// host page can blit it.
pub struct FrameMirror {
    width: u16,
    height: u16,
    memory: Vec<u16>,
    window: (u16, u16, u16, u16),
    cursor: (u16, u16),
}

impl FrameMirror {
    /// Create a blank panel. The initial window covers the whole panel.
    pub fn new(width: u16, height: u16) -> Self {
        let (max_x, max_y) = (width.saturating_sub(1), height.saturating_sub(1));
        Self {
            width,
            height,
            memory: vec![0; width as usize * height as usize],
            window: (0, 0, max_x, max_y),
            cursor: (0, 0),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw panel memory, row-major.
    pub fn memory(&self) -> &[u16] {
        &self.memory
    }

    /// Read back one panel pixel.
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgb565(self.memory[y as usize * self.width as usize + x as usize]))
    }
}

impl PixelSink for FrameMirror {
    type Error = Infallible;

    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Infallible> {
        let max_x = self.width.saturating_sub(1);
        let max_y = self.height.saturating_sub(1);
        let (x0, x1) = (x0.min(x1).min(max_x), x0.max(x1).min(max_x));
        let (y0, y1) = (y0.min(y1).min(max_y), y0.max(y1).min(max_y));
        self.window = (x0, y0, x1, y1);
        self.cursor = (x0, y0);
        Ok(())
    }

    fn write_pixel(&mut self, color: Rgb565) -> Result<(), Infallible> {
        if self.memory.is_empty() {
            return Ok(());
        }
        let (x0, y0, x1, y1) = self.window;
        let (x, y) = self.cursor;
        self.memory[y as usize * self.width as usize + x as usize] = color.0;

        self.cursor = if x < x1 {
            (x + 1, y)
        } else if y < y1 {
            (x0, y + 1)
        } else {
            (x0, y0)
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.set_window(1, 2, 3, 4).unwrap();
        sink.write_pixels(&[Rgb565::RED, Rgb565::BLUE]).unwrap();

        assert_eq!(
            sink.calls(),
            &[
                SinkCall::Window { x0: 1, y0: 2, x1: 3, y1: 4 },
                SinkCall::Pixel(Rgb565::RED),
                SinkCall::Pixel(Rgb565::BLUE),
            ]
        );
        assert_eq!(sink.windows(), vec![(1, 2, 3, 4)]);
        assert_eq!(sink.pixel_count(), 2);
    }

    #[test]
    fn test_mirror_fills_window_row_major() {
        let mut mirror = FrameMirror::new(4, 4);
        mirror.set_window(1, 1, 2, 2).unwrap();
        for color in [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE] {
            mirror.write_pixel(color).unwrap();
        }

        assert_eq!(mirror.pixel(1, 1), Some(Rgb565::RED));
        assert_eq!(mirror.pixel(2, 1), Some(Rgb565::GREEN));
        assert_eq!(mirror.pixel(1, 2), Some(Rgb565::BLUE));
        assert_eq!(mirror.pixel(2, 2), Some(Rgb565::WHITE));
        assert_eq!(mirror.pixel(0, 0), Some(Rgb565::BLACK));
        assert_eq!(mirror.pixel(3, 3), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_mirror_wraps_to_window_origin() {
        let mut mirror = FrameMirror::new(4, 4);
        mirror.set_window(0, 0, 0, 0).unwrap();
        mirror.write_pixel(Rgb565::RED).unwrap();
        mirror.write_pixel(Rgb565::CYAN).unwrap();

        assert_eq!(mirror.pixel(0, 0), Some(Rgb565::CYAN));
        assert_eq!(mirror.pixel(1, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_mirror_clamps_window() {
        let mut mirror = FrameMirror::new(4, 4);
        mirror.set_window(3, 3, 9, 9).unwrap();
        mirror.write_pixel(Rgb565::YELLOW).unwrap();
        mirror.write_pixel(Rgb565::ORANGE).unwrap();

        assert_eq!(mirror.pixel(3, 3), Some(Rgb565::ORANGE));
    }
}
