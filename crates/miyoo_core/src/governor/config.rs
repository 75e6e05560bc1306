use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const CPU_FREQ_DEFAULT: Khz = Khz(1_200_000);
pub const CPU_FREQ_BOOST: Khz = Khz(1_500_000);
/// On-time frames to stay boosted after the last late frame.
pub const BOOST_HOLD_FRAMES: u32 = 10;

pub const SCALING_GOVERNOR_PATH: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor";
pub const SCALING_SETSPEED_PATH: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_setspeed";

/// Policy which hands frequency control to userspace.
pub const MANUAL_POLICY: &str = "userspace";
/// Policy restored on teardown.
pub const RESTORE_POLICY: &str = "ondemand";

/// A CPU frequency in kilohertz, the unit cpufreq expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Khz(pub u32);

impl Display for Khz {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kHz", self.0)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GovernorConfig {
    /// Endpoint accepting a scaling governor policy name.
    pub governor_path: PathBuf,
    /// Endpoint accepting a decimal frequency in kHz.
    pub frequency_path: PathBuf,
    pub default_frequency: Khz,
    pub boost_frequency: Khz,
    /// The amount of on-time frames to hold the boost after a late frame.
    /// A value of `0` behaves like `1`.
    pub boost_hold_frames: u32,
    pub manual_policy: String,
    pub restore_policy: String,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            governor_path: PathBuf::from(SCALING_GOVERNOR_PATH),
            frequency_path: PathBuf::from(SCALING_SETSPEED_PATH),
            default_frequency: CPU_FREQ_DEFAULT,
            boost_frequency: CPU_FREQ_BOOST,
            boost_hold_frames: BOOST_HOLD_FRAMES,
            manual_policy: MANUAL_POLICY.to_string(),
            restore_policy: RESTORE_POLICY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GovernorConfig = serde_json::from_str(r#"{ "boost_frequency": 1300000 }"#).unwrap();

        assert_eq!(config.boost_frequency, Khz(1_300_000));
        assert_eq!(config.default_frequency, CPU_FREQ_DEFAULT);
        assert_eq!(config.boost_hold_frames, BOOST_HOLD_FRAMES);
        assert_eq!(config.governor_path, PathBuf::from(SCALING_GOVERNOR_PATH));
    }

    #[test]
    fn test_khz_display() {
        assert_eq!(CPU_FREQ_BOOST.to_string(), "1500000 kHz");
    }
}
