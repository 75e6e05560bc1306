//! Lane array realization of the batched kernels.
//!
//! Each batch is split into per channel lane arrays first and only then combined, mirroring the data flow of the
//! vector registers in the NEON realization.
use super::{fold_lanes, BLEND_BATCH, CONVERT_BATCH, COPY_BLOCK, MAC_BATCH};
use crate::color::{MAX_5BIT, MAX_6BIT, RGB32_BLUE_MASK, RGB32_GREEN_MASK, RGB32_RED_MASK};
use crate::video::BLEND_MAX;

type Lanes<const N: usize> = [u16; N];

#[inline(always)]
fn split_bgr15<const N: usize>(src: &[u16]) -> (Lanes<N>, Lanes<N>, Lanes<N>) {
    let mut red = [0; N];
    let mut green = [0; N];
    let mut blue = [0; N];

    for lane in 0..N {
        red[lane] = src[lane] & MAX_5BIT;
        green[lane] = (src[lane] >> 5) & MAX_5BIT;
        blue[lane] = (src[lane] >> 10) & MAX_5BIT;
    }

    (red, green, blue)
}

#[inline(always)]
fn split_rgb565<const N: usize>(src: &[u16]) -> (Lanes<N>, Lanes<N>, Lanes<N>) {
    let mut red = [0; N];
    let mut green = [0; N];
    let mut blue = [0; N];

    for lane in 0..N {
        red[lane] = src[lane] >> 11;
        green[lane] = (src[lane] >> 5) & MAX_6BIT;
        blue[lane] = src[lane] & MAX_5BIT;
    }

    (red, green, blue)
}

#[inline(always)]
fn pack_rgb565<const N: usize>(red: Lanes<N>, green: Lanes<N>, blue: Lanes<N>, dst: &mut [u16]) {
    for lane in 0..N {
        dst[lane] = (red[lane] << 11) | (green[lane] << 5) | blue[lane];
    }
}

pub(crate) fn convert_corrected(src: &[u16], dst: &mut [u16]) {
    for (src, dst) in src.chunks_exact(CONVERT_BATCH).zip(dst.chunks_exact_mut(CONVERT_BATCH)) {
        let (red, green, blue) = split_bgr15::<CONVERT_BATCH>(src);
        let mut red_out = [0; CONVERT_BATCH];
        let mut green_out = [0; CONVERT_BATCH];
        let mut blue_out = [0; CONVERT_BATCH];

        for lane in 0..CONVERT_BATCH {
            let green_x2 = green[lane] << 1;
            red_out[lane] = ((red[lane] * 13 + green_x2 + blue[lane]) >> 4).min(MAX_5BIT);
            green_out[lane] = ((green[lane] * 3 + blue[lane]) >> 2).min(MAX_6BIT);
            blue_out[lane] = ((red[lane] * 3 + green_x2 + blue[lane] * 11) >> 4).min(MAX_5BIT);
        }

        pack_rgb565(red_out, green_out, blue_out, dst);
    }
}

pub(crate) fn convert_plain(src: &[u16], dst: &mut [u16]) {
    for (src, dst) in src.chunks_exact(CONVERT_BATCH).zip(dst.chunks_exact_mut(CONVERT_BATCH)) {
        let (red, mut green, blue) = split_bgr15::<CONVERT_BATCH>(src);

        for lane in green.iter_mut() {
            *lane <<= 1;
        }

        pack_rgb565(red, green, blue, dst);
    }
}

pub(crate) fn convert_rgb32(src: &[u32], dst: &mut [u16]) {
    for (src, dst) in src.chunks_exact(CONVERT_BATCH).zip(dst.chunks_exact_mut(CONVERT_BATCH)) {
        let mut packed = [0u32; CONVERT_BATCH];

        for lane in 0..CONVERT_BATCH {
            packed[lane] = ((src[lane] & RGB32_RED_MASK) >> 8)
                | ((src[lane] & RGB32_GREEN_MASK) >> 5)
                | ((src[lane] & RGB32_BLUE_MASK) >> 3);
        }

        for lane in 0..CONVERT_BATCH {
            dst[lane] = packed[lane] as u16;
        }
    }
}

pub(crate) fn blend(dest: &mut [u16], src: &[u16], factor: u16) {
    let inverse = BLEND_MAX - factor;

    for (prev, cur) in dest.chunks_exact_mut(BLEND_BATCH).zip(src.chunks_exact(BLEND_BATCH)) {
        let (cur_red, cur_green, cur_blue) = split_rgb565::<BLEND_BATCH>(cur);
        let (prev_red, prev_green, prev_blue) = split_rgb565::<BLEND_BATCH>(prev);
        let mut red = [0; BLEND_BATCH];
        let mut green = [0; BLEND_BATCH];
        let mut blue = [0; BLEND_BATCH];

        for lane in 0..BLEND_BATCH {
            red[lane] = (cur_red[lane] * factor + prev_red[lane] * inverse) >> 8;
            green[lane] = (cur_green[lane] * factor + prev_green[lane] * inverse) >> 8;
            blue[lane] = (cur_blue[lane] * factor + prev_blue[lane] * inverse) >> 8;
        }

        pack_rgb565(red, green, blue, prev);
    }
}

pub(crate) fn mac(samples: &[i16], kernel: &[i16]) -> (i32, i32) {
    let mut left = [0i32; MAC_BATCH];
    let mut right = [0i32; MAC_BATCH];

    for (frames, taps) in samples.chunks_exact(MAC_BATCH * 2).zip(kernel.chunks_exact(MAC_BATCH)) {
        for lane in 0..MAC_BATCH {
            let tap = taps[lane] as i32;
            left[lane] = left[lane].wrapping_add(frames[lane * 2] as i32 * tap);
            right[lane] = right[lane].wrapping_add(frames[lane * 2 + 1] as i32 * tap);
        }
    }

    (fold_lanes(left), fold_lanes(right))
}

pub(crate) fn copy(dest: &mut [u8], src: &[u8]) {
    for (dest, src) in dest.chunks_exact_mut(COPY_BLOCK).zip(src.chunks_exact(COPY_BLOCK)) {
        dest.copy_from_slice(src);
    }
}
