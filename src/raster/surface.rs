//! In-memory RGB565 raster surface.
//!
//! All drawing operations mutate the buffer only. The device is touched by
//! the flush family alone, which sets a window on a [`PixelSink`] and then
//! streams the window's pixels row by row.

use super::color::Rgb565;
use super::dirty::{DirtyRegion, Rect};
use super::sink::PixelSink;

/// A `width` x `height` row-major buffer of RGB565 pixels.
pub struct RasterSurface {
    width: u16,
    height: u16,
    pixels: Vec<Rgb565>,
    /// Present when dirty-region tracking is enabled.
    dirty: Option<DirtyRegion>,
}

impl RasterSurface {
    /// Create a black surface without dirty tracking.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width as usize * height as usize],
            dirty: None,
        }
    }

    /// Create a black surface that records the bounds of every write.
    pub fn with_dirty_tracking(width: u16, height: u16) -> Self {
        let mut surface = Self::new(width, height);
        surface.set_dirty_tracking(true);
        surface
    }

    /// Enable or disable dirty-region tracking. Enabling starts clean.
    pub fn set_dirty_tracking(&mut self, enabled: bool) {
        self.dirty = enabled.then(DirtyRegion::new);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The whole buffer, row-major.
    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    /// Bounds written since the last flush, if tracking is enabled.
    pub fn dirty_region(&self) -> Option<Rect> {
        self.dirty.as_ref().and_then(DirtyRegion::bounds)
    }

    /// Forget tracked writes without flushing them.
    pub fn clear_dirty(&mut self) {
        if let Some(dirty) = self.dirty.as_mut() {
            dirty.clear();
        }
    }

    #[inline]
    fn offset(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Read one pixel.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.pixels[self.offset(x as u16, y as u16)])
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Write one pixel. Writes outside the surface are discarded.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let (x, y) = (x as u16, y as u16);
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
        if let Some(dirty) = self.dirty.as_mut() {
            dirty.mark_pixel(x, y);
        }
    }

    /// Fill a rectangle, clipped so that it never runs past the buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) {
        let Some(rect) = Rect::clipped(x, y, w, h, self.width, self.height) else {
            return;
        };
        for row in rect.y..=rect.bottom() {
            let start = self.offset(rect.x, row);
            self.pixels[start..start + rect.w as usize].fill(color);
        }
        if let Some(dirty) = self.dirty.as_mut() {
            dirty.mark(rect);
        }
    }

    /// Fill the whole surface.
    pub fn fill_screen(&mut self, color: Rgb565) {
        self.fill_rect(0, 0, self.width as i32, self.height as i32, color);
    }

    /// Draw a line with Bresenham's algorithm. Both endpoints are plotted.
    ///
    /// A line with an endpoint off the surface is first clipped to it, so
    /// the walk never leaves the buffer.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb565) {
        let Some((mut x0, mut y0, x1, y1)) = self.clip_line(x0, y0, x1, y1) else {
            return;
        };
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.set_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x0 += sx;
            }
            if e2 < dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Cohen-Sutherland clip of a segment to the pixel grid.
    ///
    /// Segments with both ends on the surface come back unchanged; the
    /// others are clipped in `f64` and rounded back onto the grid.
    fn clip_line(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<(i32, i32, i32, i32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let on_surface = |x: i32, y: i32| x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32;
        if on_surface(x0, y0) && on_surface(x1, y1) {
            return Some((x0, y0, x1, y1));
        }

        const LEFT: u8 = 1;
        const RIGHT: u8 = 2;
        const TOP: u8 = 4;
        const BOTTOM: u8 = 8;

        let (x_max, y_max) = (self.width as f64 - 1.0, self.height as f64 - 1.0);
        let outcode = |x: f64, y: f64| {
            let mut code = 0;
            if x < 0.0 {
                code |= LEFT;
            } else if x > x_max {
                code |= RIGHT;
            }
            if y < 0.0 {
                code |= TOP;
            } else if y > y_max {
                code |= BOTTOM;
            }
            code
        };

        let (mut ax, mut ay, mut bx, mut by) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        let (mut code_a, mut code_b) = (outcode(ax, ay), outcode(bx, by));

        // Each pass moves one endpoint onto a boundary.
        for _ in 0..8 {
            if code_a | code_b == 0 {
                break;
            }
            if code_a & code_b != 0 {
                return None;
            }
            let code = if code_a != 0 { code_a } else { code_b };
            let (x, y) = if code & TOP != 0 {
                (ax + (bx - ax) * (0.0 - ay) / (by - ay), 0.0)
            } else if code & BOTTOM != 0 {
                (ax + (bx - ax) * (y_max - ay) / (by - ay), y_max)
            } else if code & RIGHT != 0 {
                (x_max, ay + (by - ay) * (x_max - ax) / (bx - ax))
            } else {
                (0.0, ay + (by - ay) * (0.0 - ax) / (bx - ax))
            };
            if code == code_a {
                (ax, ay) = (x, y);
                code_a = outcode(ax, ay);
            } else {
                (bx, by) = (x, y);
                code_b = outcode(bx, by);
            }
        }
        if code_a & code_b != 0 {
            return None;
        }

        let snap = |v: f64, max: f64| v.round().clamp(0.0, max) as i32;
        Some((snap(ax, x_max), snap(ay, y_max), snap(bx, x_max), snap(by, y_max)))
    }

    /// Draw a rectangle outline as four lines.
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) {
        if w <= 0 || h <= 0 {
            return;
        }
        let (right, bottom) = (x.saturating_add(w - 1), y.saturating_add(h - 1));
        self.draw_line(x, y, right, y, color);
        self.draw_line(right, y, right, bottom, color);
        self.draw_line(x, bottom, right, bottom, color);
        self.draw_line(x, y, x, bottom, color);
    }

    /// Draw a circle outline with the midpoint circle algorithm.
    ///
    /// Circles whose bounding box misses the surface are skipped.
    pub fn draw_circle(&mut self, x0: i32, y0: i32, r: i32, color: Rgb565) {
        if r < 0 {
            return;
        }
        let (cx, cy, r) = (x0 as i64, y0 as i64, r as i64);
        if cx + r < 0 || cy + r < 0 || cx - r >= self.width as i64 || cy - r >= self.height as i64 {
            return;
        }

        let mut x = 0;
        let mut y = r;
        let mut dp = 1 - r;

        while x <= y {
            for (px, py) in [
                (cx + x, cy + y),
                (cx - x, cy + y),
                (cx + x, cy - y),
                (cx - x, cy - y),
                (cx + y, cy + x),
                (cx - y, cy + x),
                (cx + y, cy - x),
                (cx - y, cy - x),
            ] {
                self.plot(px, py, color);
            }

            if dp < 0 {
                dp += 2 * x + 3;
            } else {
                dp += 2 * (x - y) + 5;
                y -= 1;
            }
            x += 1;
        }
    }

    #[inline]
    fn plot(&mut self, x: i64, y: i64, color: Rgb565) {
        if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
            self.set_pixel(x, y, color);
        }
    }

    /// Draw a triangle outline as three lines.
    pub fn draw_triangle(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb565) {
        self.draw_line(x0, y0, x1, y1, color);
        self.draw_line(x1, y1, x2, y2, color);
        self.draw_line(x2, y2, x0, y0, color);
    }

    // =========================================================================
    // Region Access
    // =========================================================================

    /// Copy out a clipped region, row-major.
    pub fn read_region(&self, x: i32, y: i32, w: i32, h: i32) -> Vec<Rgb565> {
        let Some(rect) = Rect::clipped(x, y, w, h, self.width, self.height) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(rect.area());
        for row in rect.y..=rect.bottom() {
            let start = self.offset(rect.x, row);
            out.extend_from_slice(&self.pixels[start..start + rect.w as usize]);
        }
        out
    }

    /// Blit a `w` x `h` row-major block at (x, y). Parts outside the
    /// surface are dropped; a short `src` writes only the rows it covers.
    pub fn write_region(&mut self, x: i32, y: i32, w: i32, h: i32, src: &[Rgb565]) {
        if w <= 0 || h <= 0 {
            return;
        }
        for (row, line) in src.chunks(w as usize).take(h as usize).enumerate() {
            for (col, &color) in line.iter().enumerate() {
                self.set_pixel(x + col as i32, y + row as i32, color);
            }
        }
    }

    // =========================================================================
    // Flush
    // =========================================================================

    /// Send the whole surface to the sink and reset dirty tracking.
    pub fn flush<S: PixelSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        self.flush_region(sink, 0, 0, self.width as i32, self.height as i32)?;
        self.clear_dirty();
        Ok(())
    }

    /// Send a clipped sub-rectangle to the sink. Nothing is sent when the
    /// rectangle misses the surface.
    pub fn flush_region<S: PixelSink>(
        &self,
        sink: &mut S,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    ) -> Result<(), S::Error> {
        match Rect::clipped(x, y, w, h, self.width, self.height) {
            Some(rect) => self.send_rect(sink, rect),
            None => Ok(()),
        }
    }

    /// Send only the region written since the last flush, then reset the
    /// tracker. Without tracking this is a full flush.
    ///
    /// Returns whether anything was sent.
    pub fn flush_dirty<S: PixelSink>(&mut self, sink: &mut S) -> Result<bool, S::Error> {
        let Some(dirty) = self.dirty.as_mut() else {
            self.flush(sink)?;
            return Ok(true);
        };
        match dirty.take() {
            Some(rect) => {
                self.send_rect(sink, rect)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn send_rect<S: PixelSink>(&self, sink: &mut S, rect: Rect) -> Result<(), S::Error> {
        sink.set_window(rect.x, rect.y, rect.right(), rect.bottom())?;
        for row in rect.y..=rect.bottom() {
            let start = self.offset(rect.x, row);
            sink.write_pixels(&self.pixels[start..start + rect.w as usize])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::sink::{FrameMirror, RecordingSink, SinkCall};

    fn lit(surface: &RasterSurface, color: Rgb565) -> Vec<(i32, i32)> {
        let mut points = Vec::new();
        for y in 0..surface.height() as i32 {
            for x in 0..surface.width() as i32 {
                if surface.get_pixel(x, y) == Some(color) {
                    points.push((x, y));
                }
            }
        }
        points
    }

    #[test]
    fn test_new_surface_is_black() {
        let surface = RasterSurface::new(8, 4);
        assert_eq!(surface.pixels().len(), 32);
        assert!(surface.pixels().iter().all(|&p| p == Rgb565::BLACK));
    }

    #[test]
    fn test_set_pixel_clips() {
        let mut surface = RasterSurface::new(4, 4);
        surface.set_pixel(-1, 0, Rgb565::RED);
        surface.set_pixel(4, 0, Rgb565::RED);
        surface.set_pixel(0, 4, Rgb565::RED);
        surface.set_pixel(3, 3, Rgb565::RED);

        assert_eq!(lit(&surface, Rgb565::RED), vec![(3, 3)]);
    }

    #[test]
    fn test_fill_rect_clamps_to_bounds() {
        let mut surface = RasterSurface::new(6, 5);
        surface.fill_rect(4, 3, 10, 10, Rgb565::GREEN);

        assert_eq!(lit(&surface, Rgb565::GREEN), vec![(4, 3), (5, 3), (4, 4), (5, 4)]);
    }

    #[test]
    fn test_horizontal_line() {
        let mut surface = RasterSurface::new(8, 8);
        surface.draw_line(1, 2, 4, 2, Rgb565::WHITE);
        assert_eq!(lit(&surface, Rgb565::WHITE), vec![(1, 2), (2, 2), (3, 2), (4, 2)]);
    }

    #[test]
    fn test_diagonal_line_is_symmetric() {
        let mut forward = RasterSurface::new(8, 8);
        forward.draw_line(0, 0, 3, 3, Rgb565::WHITE);
        let mut backward = RasterSurface::new(8, 8);
        backward.draw_line(3, 3, 0, 0, Rgb565::WHITE);

        let expected = vec![(0, 0), (1, 1), (2, 2), (3, 3)];
        assert_eq!(lit(&forward, Rgb565::WHITE), expected);
        assert_eq!(lit(&backward, Rgb565::WHITE), expected);
    }

    #[test]
    fn test_shallow_line_steps() {
        let mut surface = RasterSurface::new(8, 4);
        surface.draw_line(0, 0, 4, 2, Rgb565::WHITE);
        assert_eq!(
            lit(&surface, Rgb565::WHITE),
            vec![(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)]
        );
    }

    #[test]
    fn test_single_point_line() {
        let mut surface = RasterSurface::new(4, 4);
        surface.draw_line(2, 2, 2, 2, Rgb565::WHITE);
        assert_eq!(lit(&surface, Rgb565::WHITE), vec![(2, 2)]);
    }

    #[test]
    fn test_far_off_surface_lines_are_clipped() {
        let mut surface = RasterSurface::new(8, 4);
        surface.draw_line(i32::MIN, 2, i32::MAX, 2, Rgb565::WHITE);
        assert_eq!(lit(&surface, Rgb565::WHITE), (0..8).map(|x| (x, 2)).collect::<Vec<_>>());

        let mut surface = RasterSurface::new(8, 8);
        surface.draw_line(-1_000_000_000, -1_000_000_000, 1_000_000_000, 1_000_000_000, Rgb565::WHITE);
        assert_eq!(lit(&surface, Rgb565::WHITE), (0..8).map(|i| (i, i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_line_missing_surface_draws_nothing() {
        let mut surface = RasterSurface::with_dirty_tracking(8, 8);
        surface.draw_line(-50, -10, -5, 100, Rgb565::WHITE);
        surface.draw_line(i32::MIN, i32::MIN, i32::MAX, i32::MIN, Rgb565::WHITE);
        assert!(lit(&surface, Rgb565::WHITE).is_empty());
        assert_eq!(surface.dirty_region(), None);
    }

    #[test]
    fn test_extreme_shapes_do_not_overflow() {
        let mut surface = RasterSurface::new(8, 8);
        surface.draw_circle(i32::MIN, 4, 3, Rgb565::RED);
        surface.draw_circle(i32::MAX, i32::MAX, 255, Rgb565::RED);
        surface.draw_rect(i32::MAX - 1, 0, 10, 10, Rgb565::RED);
        surface.fill_rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, Rgb565::RED);
        surface.draw_triangle(i32::MIN, 0, i32::MAX, 0, 0, i32::MAX, Rgb565::RED);
        assert!(lit(&surface, Rgb565::RED).contains(&(4, 0)));
    }

    #[test]
    fn test_draw_rect_outline() {
        let mut surface = RasterSurface::new(5, 5);
        surface.draw_rect(1, 1, 3, 3, Rgb565::BLUE);

        let outline = lit(&surface, Rgb565::BLUE);
        assert_eq!(outline.len(), 8);
        assert!(!outline.contains(&(2, 2)));
        assert!(outline.contains(&(1, 1)));
        assert!(outline.contains(&(3, 3)));
    }

    #[test]
    fn test_circle_radius_two() {
        let mut surface = RasterSurface::new(8, 8);
        surface.draw_circle(3, 3, 2, Rgb565::RED);

        let mut expected = vec![
            (3, 5), (3, 1), (5, 3), (1, 3),
            (4, 5), (2, 5), (4, 1), (2, 1),
            (5, 4), (1, 4), (5, 2), (1, 2),
        ];
        expected.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(lit(&surface, Rgb565::RED), expected);
    }

    #[test]
    fn test_circle_near_edge_is_clipped() {
        let mut surface = RasterSurface::new(4, 4);
        surface.draw_circle(0, 0, 3, Rgb565::RED);
        assert!(!lit(&surface, Rgb565::RED).is_empty());
    }

    #[test]
    fn test_triangle() {
        let mut surface = RasterSurface::new(8, 8);
        surface.draw_triangle(0, 0, 4, 0, 0, 4, Rgb565::CYAN);

        let points = lit(&surface, Rgb565::CYAN);
        assert!(points.contains(&(0, 0)));
        assert!(points.contains(&(4, 0)));
        assert!(points.contains(&(0, 4)));
        assert!(points.contains(&(2, 2)));
        assert!(!points.contains(&(1, 1)));
    }

    #[test]
    fn test_read_write_region() {
        let mut surface = RasterSurface::new(4, 4);
        let block = [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE];
        surface.write_region(1, 1, 2, 2, &block);

        assert_eq!(surface.read_region(1, 1, 2, 2), block.to_vec());
        assert_eq!(surface.read_region(3, 3, 5, 5), vec![Rgb565::BLACK]);
        assert!(surface.read_region(9, 9, 1, 1).is_empty());
    }

    #[test]
    fn test_full_flush_streams_row_major() {
        let mut surface = RasterSurface::new(3, 2);
        surface.set_pixel(2, 0, Rgb565::RED);
        surface.set_pixel(0, 1, Rgb565::BLUE);

        let mut sink = RecordingSink::new();
        surface.flush(&mut sink).unwrap();

        let b = SinkCall::Pixel(Rgb565::BLACK);
        assert_eq!(
            sink.calls(),
            &[
                SinkCall::Window { x0: 0, y0: 0, x1: 2, y1: 1 },
                b,
                b,
                SinkCall::Pixel(Rgb565::RED),
                SinkCall::Pixel(Rgb565::BLUE),
                b,
                b,
            ]
        );
    }

    #[test]
    fn test_flush_region_clips_window() {
        let surface = RasterSurface::new(10, 10);
        let mut sink = RecordingSink::new();
        surface.flush_region(&mut sink, 8, 7, 5, 5).unwrap();

        assert_eq!(sink.windows(), vec![(8, 7, 9, 9)]);
        assert_eq!(sink.pixel_count(), 6);

        sink.clear();
        surface.flush_region(&mut sink, 20, 20, 5, 5).unwrap();
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_flush_dirty_sends_union_once() {
        let mut surface = RasterSurface::with_dirty_tracking(20, 20);
        surface.set_pixel(2, 3, Rgb565::RED);
        surface.fill_rect(5, 6, 2, 2, Rgb565::GREEN);

        let mut sink = RecordingSink::new();
        assert!(surface.flush_dirty(&mut sink).unwrap());
        assert_eq!(sink.windows(), vec![(2, 3, 6, 7)]);
        assert_eq!(sink.pixel_count(), 5 * 5);

        sink.clear();
        assert!(!surface.flush_dirty(&mut sink).unwrap());
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_flush_dirty_without_tracking_is_full() {
        let mut surface = RasterSurface::new(4, 3);
        let mut sink = RecordingSink::new();
        assert!(surface.flush_dirty(&mut sink).unwrap());
        assert_eq!(sink.windows(), vec![(0, 0, 3, 2)]);
        assert_eq!(sink.pixel_count(), 12);
    }

    #[test]
    fn test_flush_into_mirror_reproduces_buffer() {
        let mut surface = RasterSurface::new(16, 12);
        surface.draw_circle(8, 6, 4, Rgb565::YELLOW);
        surface.draw_line(0, 0, 15, 11, Rgb565::GRAY);

        let mut mirror = FrameMirror::new(16, 12);
        surface.flush(&mut mirror).unwrap();

        let raw: Vec<u16> = surface.pixels().iter().map(|p| p.raw()).collect();
        assert_eq!(mirror.memory(), raw.as_slice());
    }
}
