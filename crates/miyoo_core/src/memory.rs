//! Block wise buffer duplication.
use crate::simd::{self, COPY_BLOCK};

/// Copy `src` into `dest` byte for byte.
///
/// Whole [COPY_BLOCK] sized blocks are moved through the vector realization, anything smaller through a byte loop.
///
/// # Panics
///
/// If `dest` and `src` have different lengths.
#[profiling::function]
pub fn copy_bytes(dest: &mut [u8], src: &[u8]) {
    assert_eq!(dest.len(), src.len(), "Copy buffers differ in length");
    let blocks = simd::aligned_len(src.len(), COPY_BLOCK);

    simd::active::copy(&mut dest[..blocks], &src[..blocks]);

    for (out, &byte) in dest[blocks..].iter_mut().zip(&src[blocks..]) {
        *out = byte;
    }
}

/// Copy a RGB565 frame, routed through [copy_bytes].
///
/// # Panics
///
/// If `dest` and `src` have different lengths.
pub fn copy_pixels(dest: &mut [u16], src: &[u16]) {
    assert_eq!(dest.len(), src.len(), "Copy buffers differ in length");
    let byte_len = std::mem::size_of_val(src);

    // SAFETY: `u16` has no padding and every byte pattern is valid, a byte view only relaxes alignment. Both views
    // cover exactly the memory of their source slice.
    let (dest, src) = unsafe {
        (
            std::slice::from_raw_parts_mut(dest.as_mut_ptr() as *mut u8, byte_len),
            std::slice::from_raw_parts(src.as_ptr() as *const u8, byte_len),
        )
    };

    copy_bytes(dest, src);
}
