//! Multiply-accumulate stage of the output resampler.
//!
//! Samples are interleaved stereo (`L, R, L, R, ..`), one kernel coefficient is applied per stereo frame. The running
//! sums live in caller owned [Accumulator]s of which only lane `0` carries meaning, the remaining lanes exist so the
//! accumulator matches the width of a vector register group and are never read or written here.
//!
//! All 32 bit arithmetic wraps. Staying inside the `i32` range for a given kernel length is the caller's concern,
//! but wrapping keeps the batched and scalar realizations bit identical even when it isn't.
use crate::simd::{self, MAC_BATCH};

/// A running per channel sum, lane `0` holds the value.
pub type Accumulator = [i32; MAC_BATCH];

/// Create an accumulator with every lane zeroed, ready for a new accumulation pass.
pub const fn new_accumulator() -> Accumulator {
    [0; MAC_BATCH]
}

/// Zero every lane of `accumulator`.
pub fn reset(accumulator: &mut Accumulator) {
    *accumulator = new_accumulator();
}

/// Accumulate `count` stereo frames of `samples`, weighted by the first `count` taps of `kernel`.
///
/// For every `i < count`: `left[0] += samples[2i] * kernel[i]` and `right[0] += samples[2i + 1] * kernel[i]`.
///
/// # Panics
///
/// If `kernel` holds fewer than `count` taps or `samples` fewer than `count` stereo frames.
#[profiling::function]
pub fn mac_resample(left: &mut Accumulator, right: &mut Accumulator, samples: &[i16], kernel: &[i16], count: usize) {
    let kernel = &kernel[..count];
    let samples = &samples[..count * 2];
    let batched = simd::aligned_len(count, MAC_BATCH);

    let (batch_left, batch_right) = simd::active::mac(&samples[..batched * 2], &kernel[..batched]);
    left[0] = left[0].wrapping_add(batch_left);
    right[0] = right[0].wrapping_add(batch_right);

    scalar::mac_resample(left, right, &samples[batched * 2..], &kernel[batched..]);
}

pub mod scalar {
    use super::Accumulator;

    /// Accumulate every tap of `kernel` against the matching stereo frame of `samples` into lane `0`.
    pub fn mac_resample(left: &mut Accumulator, right: &mut Accumulator, samples: &[i16], kernel: &[i16]) {
        for (frame, &tap) in samples.chunks_exact(2).zip(kernel) {
            let tap = tap as i32;
            left[0] = left[0].wrapping_add(frame[0] as i32 * tap);
            right[0] = right[0].wrapping_add(frame[1] as i32 * tap);
        }
    }
}
