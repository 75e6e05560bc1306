//! Fixed point colour policy shared by every conversion and blending realization.
//!
//! Source colours are 15 bit BGR (`0bxBBBBBGGGGGRRRRR`, red in the low bits), destination colours are
//! RGB565 (`0bRRRRRGGGGGGBBBBB`). All arithmetic here is integer only, the batched realizations in
//! [crate::simd] must reproduce it bit for bit.
use crate::utils::BitOps;

pub const MAX_5BIT: u16 = 0x1F;
pub const MAX_6BIT: u16 = 0x3F;

pub const RGB565_RED_MASK: u16 = 0xF800;
pub const RGB565_GREEN_MASK: u16 = 0x07E0;
pub const RGB565_BLUE_MASK: u16 = 0x001F;

/// Masks selecting the top 5/6/5 bits of the 8 bit channels in an `0x00RRGGBB` word.
pub const RGB32_RED_MASK: u32 = 0x00F8_0000;
pub const RGB32_GREEN_MASK: u32 = 0x0000_FC00;
pub const RGB32_BLUE_MASK: u32 = 0x0000_00F8;

/// Individual channels of a colour, each stored in the low bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Channels {
    /// Split a 15 bit BGR colour into its three 5 bit channels.
    #[inline(always)]
    pub fn from_bgr15(color: u16) -> Self {
        Channels {
            red: color.get_bits(0, 4),
            green: color.get_bits(5, 9),
            blue: color.get_bits(10, 14),
        }
    }

    /// Split an RGB565 colour into its 5/6/5 bit channels.
    #[inline(always)]
    pub fn from_rgb565(color: u16) -> Self {
        Channels {
            red: color.get_bits(11, 15),
            green: color.get_bits(5, 10),
            blue: color.get_bits(0, 4),
        }
    }

    /// Apply the display colour correction matrix.
    ///
    /// The weights of every row sum to 16 (or 4 for green) so a saturated input stays saturated, the clamp
    /// only guards the channel widths.
    #[inline(always)]
    pub fn corrected(self) -> Self {
        let Channels { red, green, blue } = self;

        Channels {
            red: ((red * 13 + green * 2 + blue) >> 4).min(MAX_5BIT),
            green: ((green * 3 + blue) >> 2).min(MAX_6BIT),
            blue: ((red * 3 + green * 2 + blue * 11) >> 4).min(MAX_5BIT),
        }
    }

    /// Move a 5 bit green channel into the top of the 6 bit RGB565 slot.
    #[inline(always)]
    pub fn widened(self) -> Self {
        Channels {
            green: self.green << 1,
            ..self
        }
    }

    /// Pack into RGB565, `green` is expected to already be a 6 bit value.
    #[inline(always)]
    pub fn to_rgb565(self) -> u16 {
        (self.red << 11) | (self.green << 5) | self.blue
    }
}

/// Convert a 15 bit BGR colour to RGB565 with colour correction.
#[inline(always)]
pub fn bgr15_to_rgb565_corrected(color: u16) -> u16 {
    Channels::from_bgr15(color).corrected().to_rgb565()
}

/// Convert a 15 bit BGR colour to RGB565 without correction.
///
/// Green keeps its 5 bit value in the top of the 6 bit slot, so the lowest green bit of the output is always zero.
#[inline(always)]
pub fn bgr15_to_rgb565(color: u16) -> u16 {
    Channels::from_bgr15(color).widened().to_rgb565()
}

/// Truncate an `0x00RRGGBB` colour to RGB565.
#[inline(always)]
pub fn rgb32_to_rgb565(color: u32) -> u16 {
    let red = (color & RGB32_RED_MASK) >> 8;
    let green = (color & RGB32_GREEN_MASK) >> 5;
    let blue = (color & RGB32_BLUE_MASK) >> 3;

    (red | green | blue) as u16
}
