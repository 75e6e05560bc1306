use crate::simd::{self, CONVERT_BATCH};

/// Convert 15 bit BGR pixels into RGB565, applying the display colour correction.
///
/// Whole batches of [CONVERT_BATCH] pixels go through the vector realization, the rest through [scalar].
///
/// # Panics
///
/// If `src` and `dst` have different lengths.
#[profiling::function]
pub fn convert_with_correction(src: &[u16], dst: &mut [u16]) {
    assert_eq!(src.len(), dst.len(), "Source and destination frames differ in length");
    let batched = simd::aligned_len(src.len(), CONVERT_BATCH);

    simd::active::convert_corrected(&src[..batched], &mut dst[..batched]);
    scalar::convert_with_correction(&src[batched..], &mut dst[batched..]);
}

/// Convert 15 bit BGR pixels into RGB565 without colour correction.
///
/// # Panics
///
/// If `src` and `dst` have different lengths.
#[profiling::function]
pub fn convert_no_correction(src: &[u16], dst: &mut [u16]) {
    assert_eq!(src.len(), dst.len(), "Source and destination frames differ in length");
    let batched = simd::aligned_len(src.len(), CONVERT_BATCH);

    simd::active::convert_plain(&src[..batched], &mut dst[..batched]);
    scalar::convert_no_correction(&src[batched..], &mut dst[batched..]);
}

/// Convert `0x00RRGGBB` pixels into RGB565 by truncating every channel.
///
/// # Panics
///
/// If `src` and `dst` have different lengths.
#[profiling::function]
pub fn convert_rgb32_to_rgb565(src: &[u32], dst: &mut [u16]) {
    assert_eq!(src.len(), dst.len(), "Source and destination frames differ in length");
    let batched = simd::aligned_len(src.len(), CONVERT_BATCH);

    simd::active::convert_rgb32(&src[..batched], &mut dst[..batched]);
    scalar::convert_rgb32_to_rgb565(&src[batched..], &mut dst[batched..]);
}

/// Pixel at a time reference realization.
///
/// Used for the tail of every batched call, and as the ground truth the vector paths are tested against.
pub mod scalar {
    use crate::color;

    pub fn convert_with_correction(src: &[u16], dst: &mut [u16]) {
        for (out, &color) in dst.iter_mut().zip(src) {
            *out = color::bgr15_to_rgb565_corrected(color);
        }
    }

    pub fn convert_no_correction(src: &[u16], dst: &mut [u16]) {
        for (out, &color) in dst.iter_mut().zip(src) {
            *out = color::bgr15_to_rgb565(color);
        }
    }

    pub fn convert_rgb32_to_rgb565(src: &[u32], dst: &mut [u16]) {
        for (out, &color) in dst.iter_mut().zip(src) {
            *out = color::rgb32_to_rgb565(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_bgr15() -> Vec<u16> {
        (0..0x8000u16).collect()
    }

    fn scalar_reference(src: &[u16], convert: fn(&[u16], &mut [u16])) -> Vec<u16> {
        let mut expected = vec![0; src.len()];
        convert(src, &mut expected);
        expected
    }

    #[test]
    fn test_portable_corrected_matches_scalar() {
        let src = all_bgr15();
        let expected = scalar_reference(&src, scalar::convert_with_correction);
        let mut output = vec![0; src.len()];

        simd::portable::convert_corrected(&src, &mut output);

        assert_eq!(output, expected);
    }

    #[test]
    fn test_portable_plain_matches_scalar() {
        let src = all_bgr15();
        let expected = scalar_reference(&src, scalar::convert_no_correction);
        let mut output = vec![0; src.len()];

        simd::portable::convert_plain(&src, &mut output);

        assert_eq!(output, expected);
    }

    #[test]
    fn test_portable_rgb32_matches_scalar() {
        let src: Vec<u32> = (0..0x4000u32).map(|i| i.wrapping_mul(0x9E37_79B9)).collect();
        let mut expected = vec![0; src.len()];
        let mut output = vec![0; src.len()];

        scalar::convert_rgb32_to_rgb565(&src, &mut expected);
        simd::portable::convert_rgb32(&src, &mut output);

        assert_eq!(output, expected);
    }

    #[test]
    fn test_unused_top_bit_is_ignored() {
        let src: Vec<u16> = all_bgr15().into_iter().map(|c| c | 0x8000).collect();
        let expected = scalar_reference(&all_bgr15(), scalar::convert_with_correction);
        let mut output = vec![0; src.len()];

        convert_with_correction(&src, &mut output);

        assert_eq!(output, expected);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_lengths_panic() {
        let src = [0u16; 8];
        let mut dst = [0u16; 7];

        convert_with_correction(&src, &mut dst);
    }

    #[cfg(all(target_arch = "aarch64", target_feature = "neon", not(feature = "no-neon")))]
    #[test]
    fn test_neon_matches_scalar() {
        let src = all_bgr15();
        let mut output = vec![0; src.len()];

        simd::neon::convert_corrected(&src, &mut output);
        assert_eq!(output, scalar_reference(&src, scalar::convert_with_correction));

        simd::neon::convert_plain(&src, &mut output);
        assert_eq!(output, scalar_reference(&src, scalar::convert_no_correction));

        let rgb32: Vec<u32> = (0..0x4000u32).map(|i| i.wrapping_mul(0x9E37_79B9)).collect();
        let mut expected = vec![0; rgb32.len()];
        let mut output = vec![0; rgb32.len()];
        scalar::convert_rgb32_to_rgb565(&rgb32, &mut expected);
        simd::neon::convert_rgb32(&rgb32, &mut output);
        assert_eq!(output, expected);
    }
}
