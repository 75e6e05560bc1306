//! Batched realizations of the pixel, audio and copy kernels.
//!
//! Every function in the backends operates on a batch aligned prefix only, the remainder is always handled by the
//! scalar reference of the owning module. Two realizations exist:
//!
//! * `neon`: `std::arch::aarch64` intrinsics, compiled when the target has NEON and `no-neon` is off.
//! * `portable`: fixed width lane arrays which the compiler is free to auto-vectorise. Always compiled so it can be
//!   checked against the scalar reference on every host.
//!
//! Whichever is selected at build time is re-exported as `active`.

/// Pixels converted per batch.
pub const CONVERT_BATCH: usize = 4;
/// Pixels blended per batch.
pub const BLEND_BATCH: usize = 8;
/// Kernel taps consumed per batch by the resampler.
pub const MAC_BATCH: usize = 4;
/// Bytes copied per block.
pub const COPY_BLOCK: usize = 64;

#[cfg(all(target_arch = "aarch64", target_feature = "neon", not(feature = "no-neon")))]
pub(crate) mod neon;
// Still compiled on NEON targets so the conformance tests can check it.
#[cfg_attr(
    all(target_arch = "aarch64", target_feature = "neon", not(feature = "no-neon")),
    allow(dead_code)
)]
pub(crate) mod portable;

#[cfg(all(target_arch = "aarch64", target_feature = "neon", not(feature = "no-neon")))]
pub(crate) use self::neon as active;
#[cfg(not(all(target_arch = "aarch64", target_feature = "neon", not(feature = "no-neon"))))]
pub(crate) use self::portable as active;

/// Name of the batch realization compiled into this build.
pub const BACKEND: &str = if cfg!(all(target_arch = "aarch64", target_feature = "neon", not(feature = "no-neon"))) {
    "neon"
} else {
    "portable"
};

/// Length of the longest prefix of `len` elements that consists of whole batches.
#[inline(always)]
pub(crate) const fn aligned_len(len: usize, batch: usize) -> usize {
    len - len % batch
}

/// Horizontally sum accumulator lanes, wrapping like the 32 bit vector adds do.
#[inline(always)]
pub(crate) fn fold_lanes(lanes: [i32; MAC_BATCH]) -> i32 {
    lanes.iter().fold(0i32, |acc, &lane| acc.wrapping_add(lane))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_len() {
        assert_eq!(aligned_len(0, CONVERT_BATCH), 0);
        assert_eq!(aligned_len(3, CONVERT_BATCH), 0);
        assert_eq!(aligned_len(4, CONVERT_BATCH), 4);
        assert_eq!(aligned_len(37, BLEND_BATCH), 32);
        assert_eq!(aligned_len(200, COPY_BLOCK), 192);
    }

    #[test]
    fn test_fold_lanes_wraps() {
        assert_eq!(fold_lanes([1, 2, 3, 4]), 10);
        assert_eq!(fold_lanes([i32::MAX, 1, 0, 0]), i32::MIN);
    }
}
