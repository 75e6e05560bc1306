use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use miyoo_core::governor::{ControlSurface, MemorySurface, SysfsSurface};
use miyoo_core::CpuGovernor;

use crate::config::ClapArgs;
use crate::timing::FrameClock;
use crate::workload::{KernelTimings, Workload};

mod config;
mod timing;
mod workload;

fn main() -> anyhow::Result<()> {
    let args = ClapArgs::parse();

    let cfg = simplelog::ConfigBuilder::new().add_filter_allow_str("miyoo").build();
    simplelog::SimpleLogger::init(args.log_level, cfg).context("Failed to initialise the logger")?;

    let config = config::load_config(&args.config)?;
    let blend_factor = args.blend.unwrap_or(config.blend_factor);
    let target = args.fps.map(config::frame_duration_for).unwrap_or_else(|| config.frame_duration());

    let surface: Box<dyn ControlSurface> = if args.dry_run {
        Box::new(MemorySurface::new())
    } else {
        Box::new(SysfsSurface::from_config(&config.governor))
    };
    let mut governor = CpuGovernor::new(surface, config.governor.clone());

    if governor.init().is_err() {
        log::info!("Continuing without dynamic frequency scaling");
    }

    println!(
        "Running {} frames of {:?} pixels with the {} backend, target frame time {:?}",
        args.frames,
        args.source,
        miyoo_core::BACKEND,
        target
    );

    let mut workload = Workload::new(args.source, blend_factor);
    let mut clock = FrameClock::new(target);
    let mut late_frames = 0u32;
    let mut boosts = 0u32;

    let start = Instant::now();

    for _ in 0..args.frames {
        clock.start_frame();
        workload.run_frame();
        let late = clock.frame_finished();

        let was_boosted = governor.is_boosted();
        governor.dynamic_feedback(late);

        late_frames += late as u32;
        boosts += (!was_boosted && governor.is_boosted()) as u32;

        profiling::finish_frame!();
    }

    let elapsed = start.elapsed();
    governor.deinit();

    println!(
        "Executing took {:?} for a total of {:.2} frames per second (last {} frames: {:.2})",
        elapsed,
        args.frames as f64 / elapsed.as_secs_f64(),
        120.min(args.frames),
        clock.fps()
    );
    println!(
        "{} late frames against {:?}, {} boosts",
        late_frames,
        clock.target(),
        boosts
    );
    print_timings(&workload.timings, args.frames);
    println!(
        "Last frame checksum {:#010X}, audio checksum {:#010X}",
        checksum(workload.presented().iter().map(|&px| px as u32)),
        checksum(workload.mixed_audio().iter().map(|&s| s as u16 as u32))
    );

    Ok(())
}

fn print_timings(timings: &KernelTimings, frames: u32) {
    let frames = frames.max(1);
    let per_frame = |total: Duration| total / frames;

    println!("Average per frame:");
    println!("  convert:  {:?}", per_frame(timings.convert));
    println!("  blend:    {:?}", per_frame(timings.blend));
    println!("  resample: {:?}", per_frame(timings.resample));
    println!("  copy:     {:?}", per_frame(timings.copy));
}

fn checksum(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0x811C_9DC5u32, |hash, value| (hash ^ value).wrapping_mul(0x0100_0193))
}
