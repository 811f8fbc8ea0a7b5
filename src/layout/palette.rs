//! Index-based node colors.

use crate::raster::Rgb565;

/// Nine-entry cycle used by the topology presets.
pub const PALETTE: [Rgb565; 9] = [
    Rgb565::RED,
    Rgb565::GREEN,
    Rgb565::BLUE,
    Rgb565::CYAN,
    Rgb565::MAGENTA,
    Rgb565::YELLOW,
    Rgb565::ORANGE,
    Rgb565::WHITE,
    Rgb565::GRAY,
];

/// Six-entry cycle used by the demo network. Yellow is left out so the
/// hub stands apart from the ring.
pub const DEMO_PALETTE: [Rgb565; 6] = [
    Rgb565::RED,
    Rgb565::GREEN,
    Rgb565::BLUE,
    Rgb565::CYAN,
    Rgb565::MAGENTA,
    Rgb565::ORANGE,
];

/// Color for the node at `index` in [`PALETTE`].
pub fn color_for_index(index: usize) -> Rgb565 {
    PALETTE[index % PALETTE.len()]
}

/// Color for the node at `index` in [`DEMO_PALETTE`].
pub fn demo_color_for_index(index: usize) -> Rgb565 {
    DEMO_PALETTE[index % DEMO_PALETTE.len()]
}
