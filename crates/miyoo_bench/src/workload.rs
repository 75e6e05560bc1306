//! Synthetic per frame work, standing in for what the emulation core hands over each frame.
use std::f64::consts::PI;
use std::time::{Duration, Instant};

use miyoo_core::{audio, memory, video};

use crate::config::PixelSource;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
pub const SCREEN_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Output samples produced per frame, 48 kHz at ~60 fps.
pub const SAMPLES_PER_FRAME: usize = 800;
/// Input runs at twice the output rate.
pub const DECIMATION: usize = 2;
/// Odd on purpose, so every output sample exercises the scalar tail.
pub const KERNEL_TAPS: usize = 35;
/// Kernel coefficients are Q14 fixed point.
const KERNEL_SHIFT: u32 = 14;

#[derive(Debug, Default, Clone, Copy)]
pub struct KernelTimings {
    pub convert: Duration,
    pub blend: Duration,
    pub resample: Duration,
    pub copy: Duration,
}

pub struct Workload {
    source: PixelSource,
    blend_factor: u16,
    frame: u32,

    bgr15: Vec<u16>,
    rgb32: Vec<u32>,
    converted: Vec<u16>,
    /// Blended output, doubles as the previous frame.
    history: Vec<u16>,
    presented: Vec<u16>,

    input_audio: Vec<i16>,
    kernel: Vec<i16>,
    mixed: Vec<i16>,

    pub timings: KernelTimings,
}

impl Workload {
    pub fn new(source: PixelSource, blend_factor: u16) -> Self {
        Self {
            source,
            blend_factor,
            frame: 0,
            bgr15: vec![0; SCREEN_PIXELS],
            rgb32: vec![0; SCREEN_PIXELS],
            converted: vec![0; SCREEN_PIXELS],
            history: vec![0; SCREEN_PIXELS],
            presented: vec![0; SCREEN_PIXELS],
            input_audio: vec![0; (SAMPLES_PER_FRAME * DECIMATION + KERNEL_TAPS) * 2],
            kernel: lowpass_kernel(KERNEL_TAPS),
            mixed: vec![0; SAMPLES_PER_FRAME * 2],
            timings: KernelTimings::default(),
        }
    }

    /// Produce the next synthetic frame and run it through every kernel.
    #[profiling::function]
    pub fn run_frame(&mut self) {
        self.generate_frame();

        let start = Instant::now();
        match self.source {
            PixelSource::Corrected => video::convert_with_correction(&self.bgr15, &mut self.converted),
            PixelSource::Plain => video::convert_no_correction(&self.bgr15, &mut self.converted),
            PixelSource::Rgb32 => video::convert_rgb32_to_rgb565(&self.rgb32, &mut self.converted),
        }
        let converted = Instant::now();

        video::blend_frames(&mut self.history, &self.converted, self.blend_factor);
        let blended = Instant::now();

        self.resample();
        let resampled = Instant::now();

        memory::copy_pixels(&mut self.presented, &self.history);
        let copied = Instant::now();

        self.timings.convert += converted - start;
        self.timings.blend += blended - converted;
        self.timings.resample += resampled - blended;
        self.timings.copy += copied - resampled;
        self.frame = self.frame.wrapping_add(1);
    }

    /// The frame that would be handed to the display.
    pub fn presented(&self) -> &[u16] {
        &self.presented
    }

    /// The audio chunk mixed during the last frame, interleaved stereo.
    pub fn mixed_audio(&self) -> &[i16] {
        &self.mixed
    }

    fn resample(&mut self) {
        for (i, out) in self.mixed.chunks_exact_mut(2).enumerate() {
            let window = &self.input_audio[i * DECIMATION * 2..];
            let mut left = audio::new_accumulator();
            let mut right = audio::new_accumulator();

            audio::mac_resample(&mut left, &mut right, window, &self.kernel, KERNEL_TAPS);

            out[0] = saturate(left[0] >> KERNEL_SHIFT);
            out[1] = saturate(right[0] >> KERNEL_SHIFT);
        }
    }

    fn generate_frame(&mut self) {
        let phase = self.frame as usize;

        for (i, (bgr15, rgb32)) in self.bgr15.iter_mut().zip(self.rgb32.iter_mut()).enumerate() {
            let x = i % SCREEN_WIDTH;
            let y = i / SCREEN_WIDTH;
            let red = ((x + phase) & 0x1F) as u16;
            let green = ((y + phase / 2) & 0x1F) as u16;
            let blue = ((x ^ y) & 0x1F) as u16;

            *bgr15 = red | (green << 5) | (blue << 10);
            *rgb32 = ((red as u32) << 19) | ((green as u32) << 11) | ((blue as u32) << 3);
        }

        // Two detuned square-ish tones, one per channel
        let base = phase * SAMPLES_PER_FRAME * DECIMATION;
        for (i, frame) in self.input_audio.chunks_exact_mut(2).enumerate() {
            let t = base + i;
            frame[0] = if (t / 37) % 2 == 0 { 8_000 } else { -8_000 };
            frame[1] = if (t / 53) % 2 == 0 { 6_000 } else { -6_000 };
        }
    }
}

/// Hann windowed half band low pass, in Q14.
fn lowpass_kernel(taps: usize) -> Vec<i16> {
    let center = (taps - 1) as f64 / 2.0;
    let scale = (1 << KERNEL_SHIFT) as f64;

    (0..taps)
        .map(|i| {
            // Distance from the center, symmetric taps get bit identical coefficients.
            let distance = (i as f64 - center).abs();
            let x = distance / DECIMATION as f64;
            let sinc = if x == 0.0 { 1.0 } else { (PI * x).sin() / (PI * x) };
            let window = 0.5 + 0.5 * (PI * distance / center).cos();

            (sinc * window * scale / DECIMATION as f64).round() as i16
        })
        .collect()
}

fn saturate(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_is_symmetric_with_unity_gain() {
        let kernel = lowpass_kernel(KERNEL_TAPS);
        let gain: i32 = kernel.iter().map(|&k| k as i32).sum();

        assert!(kernel.iter().eq(kernel.iter().rev()));
        assert!((gain - (1 << KERNEL_SHIFT)).abs() < 1 << (KERNEL_SHIFT - 4), "gain {gain}");
    }

    #[test]
    fn test_full_blend_presents_converted_frame() {
        let mut workload = Workload::new(PixelSource::Plain, video::BLEND_MAX);

        workload.run_frame();

        let mut expected = vec![0; SCREEN_PIXELS];
        video::convert::scalar::convert_no_correction(&workload.bgr15, &mut expected);
        assert_eq!(workload.presented(), &expected[..]);
    }

    #[test]
    fn test_sources_agree_without_correction() {
        // The RGB32 frame carries the same 5 bit channels as the BGR15 one, both must present identically.
        let mut plain = Workload::new(PixelSource::Plain, video::BLEND_MAX);
        let mut rgb32 = Workload::new(PixelSource::Rgb32, video::BLEND_MAX);

        plain.run_frame();
        rgb32.run_frame();

        assert_eq!(plain.presented(), rgb32.presented());
    }

    #[test]
    fn test_audio_is_produced() {
        let mut workload = Workload::new(PixelSource::Corrected, 128);

        workload.run_frame();

        assert_eq!(workload.mixed_audio().len(), SAMPLES_PER_FRAME * 2);
        assert!(workload.mixed_audio().iter().any(|&s| s != 0));
    }
}
