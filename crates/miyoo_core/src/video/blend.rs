//! Temporal blending of successive RGB565 frames.
//!
//! The destination buffer doubles as the one frame history: it holds the previous frame on entry and the blended
//! frame on exit, ready to be used as the previous frame of the next call.
use crate::color::Channels;
use crate::simd::{self, BLEND_BATCH};

/// Blend factor which reproduces the current frame exactly.
pub const BLEND_MAX: u16 = 256;

/// Blend `src` (current frame) into `dest` (previous frame) in place.
///
/// Per channel `out = (cur * factor + prev * (256 - factor)) >> 8`. `factor` is clamped to [BLEND_MAX], `256` yields
/// `src` and `0` leaves `dest` untouched.
///
/// # Panics
///
/// If `dest` and `src` have different lengths.
#[profiling::function]
pub fn blend_frames(dest: &mut [u16], src: &[u16], factor: u16) {
    assert_eq!(dest.len(), src.len(), "Current and previous frames differ in length");
    let factor = factor.min(BLEND_MAX);
    let batched = simd::aligned_len(dest.len(), BLEND_BATCH);

    simd::active::blend(&mut dest[..batched], &src[..batched], factor);
    scalar::blend_frames(&mut dest[batched..], &src[batched..], factor);
}

/// Blend a single pixel, `factor` must be at most [BLEND_MAX].
#[inline(always)]
pub fn blend_pixel(cur: u16, prev: u16, factor: u16) -> u16 {
    let inverse = BLEND_MAX - factor;
    let cur = Channels::from_rgb565(cur);
    let prev = Channels::from_rgb565(prev);

    Channels {
        red: (cur.red * factor + prev.red * inverse) >> 8,
        green: (cur.green * factor + prev.green * inverse) >> 8,
        blue: (cur.blue * factor + prev.blue * inverse) >> 8,
    }
    .to_rgb565()
}

pub mod scalar {
    use super::{blend_pixel, BLEND_MAX};

    pub fn blend_frames(dest: &mut [u16], src: &[u16], factor: u16) {
        let factor = factor.min(BLEND_MAX);

        for (prev, &cur) in dest.iter_mut().zip(src) {
            *prev = blend_pixel(cur, *prev, factor);
        }
    }
}
