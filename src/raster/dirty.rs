//! Rectangles and dirty-region tracking for partial flushes.

/// An axis-aligned pixel rectangle. `w` and `h` are never zero for
/// rectangles produced by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Clip a signed rectangle to a `width` x `height` surface.
    ///
    /// Returns `None` when nothing of it is visible.
    pub fn clipped(x: i32, y: i32, w: i32, h: i32, width: u16, height: u16) -> Option<Rect> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(width as i32);
        let y1 = y.saturating_add(h).min(height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
    }

    /// Inclusive right column.
    #[inline]
    pub fn right(&self) -> u16 {
        self.x + self.w - 1
    }

    /// Inclusive bottom row.
    #[inline]
    pub fn bottom(&self) -> u16 {
        self.y + self.h - 1
    }

    /// Number of pixels covered.
    #[inline]
    pub fn area(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// Bounding box union.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }
}

/// Bounding box of every pixel written since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRegion {
    bounds: Option<Rect>,
}

impl DirtyRegion {
    pub fn new() -> Self {
        Self { bounds: None }
    }

    /// Mark a single pixel dirty.
    #[inline]
    pub fn mark_pixel(&mut self, x: u16, y: u16) {
        self.mark(Rect::new(x, y, 1, 1));
    }

    /// Merge a rectangle into the dirty region.
    pub fn mark(&mut self, rect: Rect) {
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.union(&rect),
            None => rect,
        });
    }

    /// Current dirty bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Return the dirty bounds and reset the tracker.
    pub fn take(&mut self) -> Option<Rect> {
        self.bounds.take()
    }

    /// Forget all dirty pixels.
    pub fn clear(&mut self) {
        self.bounds = None;
    }
}
