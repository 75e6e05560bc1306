//! The OS facing side of the governor.
//!
//! Everything the governor does to the system goes through [ControlSurface], which lets a host swap the real cpufreq
//! files for a [MemorySurface] on machines without them (or in tests).
use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::governor::config::GovernorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Accepts a policy name, e.g. `userspace`.
    ScalingGovernor,
    /// Accepts a decimal frequency in kHz.
    Frequency,
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::ScalingGovernor => write!(f, "scaling governor"),
            Endpoint::Frequency => write!(f, "frequency"),
        }
    }
}

pub trait ControlSurface {
    /// Check whether `endpoint` exists and can be opened.
    fn is_present(&self, endpoint: Endpoint) -> bool;

    /// Write `value` to `endpoint`.
    fn write(&mut self, endpoint: Endpoint, value: &str) -> std::io::Result<()>;
}

impl<S: ControlSurface + ?Sized> ControlSurface for Box<S> {
    fn is_present(&self, endpoint: Endpoint) -> bool {
        (**self).is_present(endpoint)
    }

    fn write(&mut self, endpoint: Endpoint, value: &str) -> std::io::Result<()> {
        (**self).write(endpoint, value)
    }
}

/// Control surface backed by the cpufreq sysfs files.
#[derive(Debug, Clone)]
pub struct SysfsSurface {
    governor_path: PathBuf,
    frequency_path: PathBuf,
}

impl SysfsSurface {
    pub fn new(governor_path: impl Into<PathBuf>, frequency_path: impl Into<PathBuf>) -> Self {
        Self {
            governor_path: governor_path.into(),
            frequency_path: frequency_path.into(),
        }
    }

    pub fn from_config(config: &GovernorConfig) -> Self {
        Self::new(&config.governor_path, &config.frequency_path)
    }

    pub fn path(&self, endpoint: Endpoint) -> &Path {
        match endpoint {
            Endpoint::ScalingGovernor => &self.governor_path,
            Endpoint::Frequency => &self.frequency_path,
        }
    }
}

impl ControlSurface for SysfsSurface {
    fn is_present(&self, endpoint: Endpoint) -> bool {
        File::open(self.path(endpoint)).is_ok()
    }

    fn write(&mut self, endpoint: Endpoint, value: &str) -> std::io::Result<()> {
        // Never create the file, a missing sysfs node means the kernel doesn't offer the control.
        let mut file = OpenOptions::new().write(true).open(self.path(endpoint))?;
        writeln!(file, "{}", value)
    }
}

/// A write observed by a [MemorySurface].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub endpoint: Endpoint,
    pub value: String,
    pub succeeded: bool,
}

/// In-memory control surface which records every write attempt.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    writes: Vec<RecordedWrite>,
    missing: Vec<Endpoint>,
    failing: Vec<Endpoint>,
}

impl MemorySurface {
    /// A surface where every endpoint exists and accepts writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `endpoint`, it will neither be present nor writable.
    pub fn with_missing(mut self, endpoint: Endpoint) -> Self {
        self.missing.push(endpoint);
        self
    }

    /// Let every write to `endpoint` fail while it stays present.
    pub fn with_failing(mut self, endpoint: Endpoint) -> Self {
        self.set_failing(endpoint, true);
        self
    }

    pub fn set_failing(&mut self, endpoint: Endpoint, failing: bool) {
        self.failing.retain(|e| *e != endpoint);

        if failing {
            self.failing.push(endpoint);
        }
    }

    /// All write attempts, in order.
    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    /// All values written to `endpoint`, including failed attempts.
    pub fn attempts(&self, endpoint: Endpoint) -> impl Iterator<Item = &str> + '_ {
        self.writes
            .iter()
            .filter(move |w| w.endpoint == endpoint)
            .map(|w| w.value.as_str())
    }

    /// The value `endpoint` currently holds, if any write to it ever succeeded.
    pub fn value(&self, endpoint: Endpoint) -> Option<&str> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.endpoint == endpoint && w.succeeded)
            .map(|w| w.value.as_str())
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl ControlSurface for MemorySurface {
    fn is_present(&self, endpoint: Endpoint) -> bool {
        !self.missing.contains(&endpoint)
    }

    fn write(&mut self, endpoint: Endpoint, value: &str) -> std::io::Result<()> {
        let result = if self.missing.contains(&endpoint) {
            Err(std::io::Error::new(ErrorKind::NotFound, format!("{} endpoint missing", endpoint)))
        } else if self.failing.contains(&endpoint) {
            Err(std::io::Error::new(ErrorKind::Other, format!("{} endpoint rejected write", endpoint)))
        } else {
            Ok(())
        };

        self.writes.push(RecordedWrite {
            endpoint,
            value: value.to_string(),
            succeeded: result.is_ok(),
        });

        result
    }
}
