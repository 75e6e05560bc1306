use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use log::LevelFilter;
use miyoo_core::GovernorConfig;

/// Game Boy refresh rate, ~59.73 Hz.
pub const FRAME_DURATION: Duration = Duration::from_nanos(16_742_706);

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BenchConfig {
    pub governor: GovernorConfig,
    /// Frames per second the host loop aims for, a frame taking longer than `1 / target_fps` is late.
    pub target_fps: f64,
    /// Motion blur strength, `256` disables blending.
    pub blend_factor: u16,
}

impl BenchConfig {
    pub fn frame_duration(&self) -> Duration {
        frame_duration_for(self.target_fps)
    }
}

/// Frame budget for `fps`, falls back to [FRAME_DURATION] when `1 / fps` isn't a representable [Duration].
pub fn frame_duration_for(fps: f64) -> Duration {
    if fps > 0.0 {
        Duration::try_from_secs_f64(1.0 / fps).unwrap_or(FRAME_DURATION)
    } else {
        FRAME_DURATION
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            governor: GovernorConfig::default(),
            target_fps: 1.0 / FRAME_DURATION.as_secs_f64(),
            blend_factor: 160,
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<BenchConfig> {
    if path.exists() {
        let file = std::fs::File::open(path).with_context(|| format!("Failed to open bench config at {:?}", path))?;

        serde_json::from_reader(file).with_context(|| format!("Failed to parse bench config at {:?}", path))
    } else {
        let defaults = BenchConfig::default();
        log::info!("No bench config exists, creating default at: `{:?}`", path);

        let file = std::fs::File::create(path).with_context(|| format!("Failed to create bench config at {:?}", path))?;
        serde_json::to_writer_pretty(file, &defaults).with_context(|| format!("Failed to write bench config at {:?}", path))?;

        Ok(defaults)
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSource {
    /// 15 bit BGR with colour correction
    Corrected,
    /// 15 bit BGR without colour correction
    Plain,
    /// 32 bit `0x00RRGGBB`
    Rgb32,
}

#[derive(clap::Parser, Debug)]
#[command(version, about)]
pub struct ClapArgs {
    /// The amount of frames to run
    #[arg(short, long, default_value = "600")]
    pub frames: u32,
    /// The path of the JSON config, a default one is created if it doesn't exist
    #[arg(short, long, default_value = "./miyoo_bench_conf.json")]
    pub config: PathBuf,
    /// The pixel format the synthetic frames are produced in
    #[arg(short, long, value_enum, default_value_t = PixelSource::Corrected)]
    pub source: PixelSource,
    /// Blend factor in `0..=256`, if not provided the config's value will be used
    #[arg(short, long)]
    pub blend: Option<u16>,
    /// Target frame rate, if not provided the config's value will be used
    #[arg(long)]
    pub fps: Option<f64>,
    /// Drive the governor against an in-memory control surface instead of sysfs
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_duration() {
        let config = BenchConfig::default();
        let delta = config.frame_duration().as_nanos() as i128 - FRAME_DURATION.as_nanos() as i128;

        assert!(delta.abs() <= 1);
    }

    #[test]
    fn test_partial_config() {
        let config: BenchConfig = serde_json::from_str(r#"{ "blend_factor": 256, "governor": { "boost_hold_frames": 4 } }"#).unwrap();

        assert_eq!(config.blend_factor, 256);
        assert_eq!(config.governor.boost_hold_frames, 4);
        assert_eq!(config.governor.default_frequency, GovernorConfig::default().default_frequency);
    }

    #[test]
    fn test_non_positive_fps_falls_back() {
        let config = BenchConfig {
            target_fps: 0.0,
            ..Default::default()
        };

        assert_eq!(config.frame_duration(), FRAME_DURATION);
    }

    #[test]
    fn test_tiny_fps_falls_back() {
        let config = BenchConfig {
            target_fps: 1e-300,
            ..Default::default()
        };

        assert_eq!(config.frame_duration(), FRAME_DURATION);
        assert_eq!(frame_duration_for(f64::MIN_POSITIVE), FRAME_DURATION);
        assert_eq!(frame_duration_for(4.0), Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_config_names_path() {
        let path = std::env::temp_dir().join(format!("miyoo_bench_malformed_{}.json", std::process::id()));
        std::fs::write(&path, "{ \"target_fps\": ").unwrap();

        let err = load_config(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        let message = format!("{:#}", err);

        assert!(message.contains("Failed to parse bench config"), "{}", message);
        assert!(message.contains(&format!("{:?}", path)), "{}", message);
    }
}
