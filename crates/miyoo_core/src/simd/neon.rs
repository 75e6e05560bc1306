//! NEON realization of the batched kernels.
//!
//! Only compiled for `aarch64` targets with the `neon` target feature, so every intrinsic used here is available.
//! All loads and stores go through slices produced by `chunks_exact`, which guarantees the lane counts.
use std::arch::aarch64::*;

use super::{fold_lanes, BLEND_BATCH, CONVERT_BATCH, COPY_BLOCK, MAC_BATCH};
use crate::color::{MAX_5BIT, MAX_6BIT, RGB32_BLUE_MASK, RGB32_GREEN_MASK, RGB32_RED_MASK};
use crate::video::BLEND_MAX;

/// Split four BGR15 pixels into red, green and blue lanes.
#[inline(always)]
unsafe fn split_bgr15(bgr15: uint16x4_t) -> (uint16x4_t, uint16x4_t, uint16x4_t) {
    let mask = vdup_n_u16(MAX_5BIT);

    (
        vand_u16(bgr15, mask),
        vand_u16(vshr_n_u16::<5>(bgr15), mask),
        vand_u16(vshr_n_u16::<10>(bgr15), mask),
    )
}

#[inline(always)]
unsafe fn pack_rgb565(red: uint16x4_t, green: uint16x4_t, blue: uint16x4_t) -> uint16x4_t {
    vorr_u16(vshl_n_u16::<11>(red), vorr_u16(vshl_n_u16::<5>(green), blue))
}

pub(crate) fn convert_corrected(src: &[u16], dst: &mut [u16]) {
    for (src, dst) in src.chunks_exact(CONVERT_BATCH).zip(dst.chunks_exact_mut(CONVERT_BATCH)) {
        // SAFETY: Both chunks hold exactly four `u16` lanes.
        unsafe {
            let (red, green, blue) = split_bgr15(vld1_u16(src.as_ptr()));
            let green_x2 = vshl_n_u16::<1>(green);

            let red_out = vshr_n_u16::<4>(vadd_u16(vadd_u16(vmul_n_u16(red, 13), green_x2), blue));
            let green_out = vshr_n_u16::<2>(vadd_u16(vmul_n_u16(green, 3), blue));
            let blue_out = vshr_n_u16::<4>(vadd_u16(vadd_u16(vmul_n_u16(red, 3), green_x2), vmul_n_u16(blue, 11)));

            let red_out = vmin_u16(red_out, vdup_n_u16(MAX_5BIT));
            let green_out = vmin_u16(green_out, vdup_n_u16(MAX_6BIT));
            let blue_out = vmin_u16(blue_out, vdup_n_u16(MAX_5BIT));

            vst1_u16(dst.as_mut_ptr(), pack_rgb565(red_out, green_out, blue_out));
        }
    }
}

pub(crate) fn convert_plain(src: &[u16], dst: &mut [u16]) {
    for (src, dst) in src.chunks_exact(CONVERT_BATCH).zip(dst.chunks_exact_mut(CONVERT_BATCH)) {
        // SAFETY: Both chunks hold exactly four `u16` lanes.
        unsafe {
            let (red, green, blue) = split_bgr15(vld1_u16(src.as_ptr()));

            vst1_u16(dst.as_mut_ptr(), pack_rgb565(red, vshl_n_u16::<1>(green), blue));
        }
    }
}

pub(crate) fn convert_rgb32(src: &[u32], dst: &mut [u16]) {
    for (src, dst) in src.chunks_exact(CONVERT_BATCH).zip(dst.chunks_exact_mut(CONVERT_BATCH)) {
        // SAFETY: `src` holds four `u32` lanes, `dst` four `u16` lanes.
        unsafe {
            let rgb32 = vld1q_u32(src.as_ptr());

            let red = vshrq_n_u32::<8>(vandq_u32(rgb32, vdupq_n_u32(RGB32_RED_MASK)));
            let green = vshrq_n_u32::<5>(vandq_u32(rgb32, vdupq_n_u32(RGB32_GREEN_MASK)));
            let blue = vshrq_n_u32::<3>(vandq_u32(rgb32, vdupq_n_u32(RGB32_BLUE_MASK)));

            vst1_u16(dst.as_mut_ptr(), vmovn_u32(vorrq_u32(vorrq_u32(red, green), blue)));
        }
    }
}

#[inline(always)]
unsafe fn blend_channel(cur: uint16x8_t, prev: uint16x8_t, factor: uint16x8_t, inverse: uint16x8_t) -> uint16x8_t {
    vshrq_n_u16::<8>(vaddq_u16(vmulq_u16(cur, factor), vmulq_u16(prev, inverse)))
}

pub(crate) fn blend(dest: &mut [u16], src: &[u16], factor: u16) {
    for (prev, cur) in dest.chunks_exact_mut(BLEND_BATCH).zip(src.chunks_exact(BLEND_BATCH)) {
        // SAFETY: Both chunks hold exactly eight `u16` lanes.
        unsafe {
            let factor_lanes = vdupq_n_u16(factor);
            let inverse_lanes = vdupq_n_u16(BLEND_MAX - factor);
            let mask_5 = vdupq_n_u16(MAX_5BIT);
            let mask_6 = vdupq_n_u16(MAX_6BIT);

            let cur_px = vld1q_u16(cur.as_ptr());
            let prev_px = vld1q_u16(prev.as_ptr());

            let red = blend_channel(
                vshrq_n_u16::<11>(cur_px),
                vshrq_n_u16::<11>(prev_px),
                factor_lanes,
                inverse_lanes,
            );
            let green = blend_channel(
                vandq_u16(vshrq_n_u16::<5>(cur_px), mask_6),
                vandq_u16(vshrq_n_u16::<5>(prev_px), mask_6),
                factor_lanes,
                inverse_lanes,
            );
            let blue = blend_channel(
                vandq_u16(cur_px, mask_5),
                vandq_u16(prev_px, mask_5),
                factor_lanes,
                inverse_lanes,
            );

            let result = vorrq_u16(vshlq_n_u16::<11>(red), vorrq_u16(vshlq_n_u16::<5>(green), blue));
            vst1q_u16(prev.as_mut_ptr(), result);
        }
    }
}

pub(crate) fn mac(samples: &[i16], kernel: &[i16]) -> (i32, i32) {
    let mut left = [0i32; MAC_BATCH];
    let mut right = [0i32; MAC_BATCH];

    // SAFETY: Every `frames` chunk holds four interleaved stereo frames, every `taps` chunk four coefficients.
    unsafe {
        let mut acc_left = vdupq_n_s32(0);
        let mut acc_right = vdupq_n_s32(0);

        for (frames, taps) in samples.chunks_exact(MAC_BATCH * 2).zip(kernel.chunks_exact(MAC_BATCH)) {
            let stereo = vld2_s16(frames.as_ptr());
            let coefficients = vld1_s16(taps.as_ptr());

            acc_left = vmlal_s16(acc_left, stereo.0, coefficients);
            acc_right = vmlal_s16(acc_right, stereo.1, coefficients);
        }

        vst1q_s32(left.as_mut_ptr(), acc_left);
        vst1q_s32(right.as_mut_ptr(), acc_right);
    }

    (fold_lanes(left), fold_lanes(right))
}

pub(crate) fn copy(dest: &mut [u8], src: &[u8]) {
    for (dest, src) in dest.chunks_exact_mut(COPY_BLOCK).zip(src.chunks_exact(COPY_BLOCK)) {
        // SAFETY: Both blocks are exactly 64 bytes, read and written as four 16 byte registers.
        unsafe {
            let from = src.as_ptr();
            let to = dest.as_mut_ptr();

            let q0 = vld1q_u8(from);
            let q1 = vld1q_u8(from.add(16));
            let q2 = vld1q_u8(from.add(32));
            let q3 = vld1q_u8(from.add(48));

            vst1q_u8(to, q0);
            vst1q_u8(to.add(16), q1);
            vst1q_u8(to.add(32), q2);
            vst1q_u8(to.add(48), q3);
        }
    }
}
