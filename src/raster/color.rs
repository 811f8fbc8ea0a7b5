//! RGB565 color values.

use serde::{Deserialize, Serialize};

/// Pack 8-bit components into a 16-bit 5/6/5 value.
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565((((r & 0xF8) as u16) << 8) | (((g & 0xFC) as u16) << 3) | ((b >> 3) as u16))
}

/// A 16-bit packed color: 5 bits red, 6 bits green, 5 bits blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Rgb565 = Rgb565(0x0000);
    pub const BLUE: Rgb565 = Rgb565(0x001F);
    pub const RED: Rgb565 = Rgb565(0xF800);
    pub const GREEN: Rgb565 = Rgb565(0x07E0);
    pub const CYAN: Rgb565 = Rgb565(0x07FF);
    pub const MAGENTA: Rgb565 = Rgb565(0xF81F);
    pub const YELLOW: Rgb565 = Rgb565(0xFFE0);
    pub const WHITE: Rgb565 = Rgb565(0xFFFF);
    pub const GRAY: Rgb565 = Rgb565(0x8410);
    pub const ORANGE: Rgb565 = Rgb565(0xFDA0);

    /// Get the raw packed value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Expand back to 8-bit components, replicating the high bits.
    pub const fn to_rgb888(self) -> (u8, u8, u8) {
        let r5 = ((self.0 >> 11) & 0x1F) as u8;
        let g6 = ((self.0 >> 5) & 0x3F) as u8;
        let b5 = (self.0 & 0x1F) as u8;
        ((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
    }
}

impl From<u16> for Rgb565 {
    #[inline]
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Rgb565> for u16 {
    #[inline]
    fn from(color: Rgb565) -> Self {
        color.0
    }
}
