//! Closed loop CPU frequency scaling driven by frame lateness.
//!
//! The host loop reports once per frame whether that frame missed its deadline. A late frame boosts the CPU and
//! latches the boost for a fixed number of on-time frames, so intermittent lateness doesn't cause the frequency to
//! oscillate.
//!
//! The governor is not thread safe and expects to be driven from the main emulation loop only.
pub use config::{GovernorConfig, Khz};
pub use error::GovernorError;
pub use surface::{ControlSurface, Endpoint, MemorySurface, RecordedWrite, SysfsSurface};

pub mod config;
mod error;
pub mod surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorState {
    /// [CpuGovernor::init] has not been called yet.
    Uninitialized,
    /// The governor controls the CPU frequency.
    Available {
        boosted: bool,
        /// On-time frames left before the boost is released.
        hold_frames: u32,
    },
    /// Initialisation failed, every operation is a no-op for the rest of the process.
    Unavailable,
    /// Torn down, the default frequency and policy have been requested.
    Deinitialized,
}

pub struct CpuGovernor<S: ControlSurface> {
    surface: S,
    config: GovernorConfig,
    state: GovernorState,
    /// Whether the manual policy was applied, and therefore has to be handed back on teardown.
    policy_taken: bool,
}

impl CpuGovernor<SysfsSurface> {
    /// Create a governor which talks to the cpufreq files named in `config`.
    pub fn sysfs(config: GovernorConfig) -> Self {
        let surface = SysfsSurface::from_config(&config);
        Self::new(surface, config)
    }
}

impl<S: ControlSurface> CpuGovernor<S> {
    pub fn new(surface: S, config: GovernorConfig) -> Self {
        CpuGovernor {
            surface,
            config,
            state: GovernorState::Uninitialized,
            policy_taken: false,
        }
    }

    /// Take manual control of the CPU frequency and set the default frequency.
    ///
    /// On any failure the governor becomes [GovernorState::Unavailable] for good, the host should carry on without
    /// dynamic frequency scaling.
    pub fn init(&mut self) -> Result<(), GovernorError> {
        if self.state != GovernorState::Uninitialized {
            return Err(GovernorError::AlreadyInitialised);
        }

        match self.take_control() {
            Ok(()) => {
                self.state = GovernorState::Available {
                    boosted: false,
                    hold_frames: 0,
                };
                log::info!(
                    "CPU governor enabled: default {}, boost {}, hold {} frames",
                    self.config.default_frequency,
                    self.config.boost_frequency,
                    self.hold_window()
                );
                Ok(())
            }
            Err(e) => {
                self.state = GovernorState::Unavailable;
                log::warn!("CPU governor unavailable, dynamic frequency scaling disabled: {}", e);
                Err(e)
            }
        }
    }

    fn take_control(&mut self) -> Result<(), GovernorError> {
        if !self.surface.is_present(Endpoint::ScalingGovernor) {
            return Err(GovernorError::NotPresent(Endpoint::ScalingGovernor));
        }

        write_endpoint(&mut self.surface, Endpoint::ScalingGovernor, &self.config.manual_policy)?;
        self.policy_taken = true;

        write_endpoint(
            &mut self.surface,
            Endpoint::Frequency,
            &self.config.default_frequency.0.to_string(),
        )
    }

    /// Request `frequency`.
    ///
    /// A failed write is logged and reported, but leaves the governor available. There is no retry, the next
    /// transition simply issues a new request.
    pub fn set_frequency(&mut self, frequency: Khz) -> Result<(), GovernorError> {
        if !self.is_available() {
            return Err(GovernorError::NotAvailable);
        }

        write_endpoint(&mut self.surface, Endpoint::Frequency, &frequency.0.to_string()).map_err(|e| {
            log::warn!("Failed to set CPU frequency to {}: {}", frequency, e);
            e
        })
    }

    /// Switch to the boost frequency. No-op while already boosted.
    pub fn boost(&mut self) {
        if let GovernorState::Available { boosted: false, .. } = self.state {
            let _ = self.set_frequency(self.config.boost_frequency);
            self.set_boosted(true);
            log::debug!("CPU boosted to {}", self.config.boost_frequency);
        }
    }

    /// Return to the default frequency. No-op unless boosted.
    pub fn unboost(&mut self) {
        if let GovernorState::Available { boosted: true, .. } = self.state {
            let _ = self.set_frequency(self.config.default_frequency);
            self.set_boosted(false);
            log::debug!("CPU returned to {}", self.config.default_frequency);
        }
    }

    /// Feed the lateness of the frame that just finished.
    #[profiling::function]
    pub fn dynamic_feedback(&mut self, frame_was_late: bool) {
        let GovernorState::Available { hold_frames, .. } = self.state else {
            return;
        };

        if frame_was_late {
            self.boost();
            self.set_hold_frames(self.hold_window());
        } else if hold_frames > 0 {
            let remaining = hold_frames - 1;
            self.set_hold_frames(remaining);

            if remaining == 0 {
                self.unboost();
            }
        }
    }

    /// Release the boost and hand frequency control back to the restore policy.
    ///
    /// Always ends in [GovernorState::Deinitialized], whether or not the restore succeeded.
    pub fn deinit(&mut self) {
        match self.state {
            GovernorState::Deinitialized => return,
            GovernorState::Uninitialized => {
                self.state = GovernorState::Deinitialized;
                return;
            }
            _ => {}
        }

        self.unboost();

        if self.policy_taken {
            self.policy_taken = false;

            if let Err(e) = write_endpoint(&mut self.surface, Endpoint::ScalingGovernor, &self.config.restore_policy) {
                log::warn!("Failed to restore the `{}` CPU governor: {}", self.config.restore_policy, e);
            }
        }

        self.state = GovernorState::Deinitialized;
        log::info!("CPU governor shut down");
    }

    pub fn state(&self) -> GovernorState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, GovernorState::Available { .. })
    }

    pub fn is_boosted(&self) -> bool {
        matches!(self.state, GovernorState::Available { boosted: true, .. })
    }

    /// On-time frames left before the boost is released, `0` when not available.
    pub fn hold_frames(&self) -> u32 {
        match self.state {
            GovernorState::Available { hold_frames, .. } => hold_frames,
            _ => 0,
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn hold_window(&self) -> u32 {
        self.config.boost_hold_frames.max(1)
    }

    fn set_boosted(&mut self, value: bool) {
        if let GovernorState::Available { boosted, .. } = &mut self.state {
            *boosted = value;
        }
    }

    fn set_hold_frames(&mut self, value: u32) {
        if let GovernorState::Available { hold_frames, .. } = &mut self.state {
            *hold_frames = value;
        }
    }
}

impl<S: ControlSurface> Drop for CpuGovernor<S> {
    fn drop(&mut self) {
        self.deinit();
    }
}

fn write_endpoint<S: ControlSurface>(surface: &mut S, endpoint: Endpoint, value: &str) -> Result<(), GovernorError> {
    surface.write(endpoint, value).map_err(|source| GovernorError::Write {
        endpoint,
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(surface: MemorySurface) -> CpuGovernor<MemorySurface> {
        CpuGovernor::new(surface, GovernorConfig::default())
    }

    fn writes(gov: &CpuGovernor<MemorySurface>) -> Vec<(Endpoint, &str)> {
        gov.surface()
            .writes()
            .iter()
            .map(|w| (w.endpoint, w.value.as_str()))
            .collect()
    }

    #[test]
    fn test_init_takes_control() {
        let mut gov = governor(MemorySurface::new());

        gov.init().unwrap();

        assert_eq!(
            gov.state(),
            GovernorState::Available {
                boosted: false,
                hold_frames: 0
            }
        );
        assert_eq!(
            writes(&gov),
            [
                (Endpoint::ScalingGovernor, "userspace"),
                (Endpoint::Frequency, "1200000")
            ]
        );
    }

    #[test]
    fn test_missing_surface_disables_governor() {
        let mut gov = governor(MemorySurface::new().with_missing(Endpoint::ScalingGovernor));

        assert!(matches!(
            gov.init(),
            Err(GovernorError::NotPresent(Endpoint::ScalingGovernor))
        ));
        assert_eq!(gov.state(), GovernorState::Unavailable);

        gov.dynamic_feedback(true);
        gov.boost();

        assert!(!gov.is_boosted());
        assert_eq!(gov.surface().attempts(Endpoint::Frequency).count(), 0);
        assert!(matches!(gov.set_frequency(Khz(1)), Err(GovernorError::NotAvailable)));
        assert!(gov.surface().writes().is_empty());
    }

    #[test]
    fn test_failed_default_frequency_disables_governor() {
        let mut gov = governor(MemorySurface::new().with_failing(Endpoint::Frequency));

        assert!(matches!(
            gov.init(),
            Err(GovernorError::Write {
                endpoint: Endpoint::Frequency,
                ..
            })
        ));
        assert_eq!(gov.state(), GovernorState::Unavailable);

        // The policy was switched, so teardown hands it back.
        gov.deinit();
        assert_eq!(gov.surface().value(Endpoint::ScalingGovernor), Some("ondemand"));
        assert_eq!(gov.state(), GovernorState::Deinitialized);
    }

    #[test]
    fn test_failed_policy_write_disables_governor() {
        let mut gov = governor(MemorySurface::new().with_failing(Endpoint::ScalingGovernor));

        assert!(gov.init().is_err());
        assert_eq!(gov.state(), GovernorState::Unavailable);
        assert_eq!(gov.surface().attempts(Endpoint::Frequency).count(), 0);

        gov.deinit();
        // Nothing was taken, nothing to restore.
        assert_eq!(gov.surface().writes().len(), 1);
    }

    #[test]
    fn test_init_only_once() {
        let mut gov = governor(MemorySurface::new().with_missing(Endpoint::ScalingGovernor));
        let _ = gov.init();

        assert!(matches!(gov.init(), Err(GovernorError::AlreadyInitialised)));
        assert_eq!(gov.state(), GovernorState::Unavailable);
    }

    #[test]
    fn test_boost_hysteresis() {
        let mut gov = governor(MemorySurface::new());
        gov.init().unwrap();

        gov.dynamic_feedback(true);
        assert!(gov.is_boosted());
        assert_eq!(gov.hold_frames(), 10);
        assert_eq!(gov.surface().value(Endpoint::Frequency), Some("1500000"));

        for _ in 0..9 {
            gov.dynamic_feedback(false);
            assert!(gov.is_boosted());
        }

        gov.dynamic_feedback(false);
        assert!(!gov.is_boosted());
        assert_eq!(gov.hold_frames(), 0);
        assert_eq!(gov.surface().value(Endpoint::Frequency), Some("1200000"));

        // Further on-time frames are no-ops.
        let write_count = gov.surface().writes().len();
        gov.dynamic_feedback(false);
        assert_eq!(gov.surface().writes().len(), write_count);
    }

    #[test]
    fn test_late_frame_restarts_hold() {
        let mut gov = governor(MemorySurface::new());
        gov.init().unwrap();

        gov.dynamic_feedback(true);
        for _ in 0..5 {
            gov.dynamic_feedback(false);
        }
        assert_eq!(gov.hold_frames(), 5);

        gov.dynamic_feedback(true);
        assert_eq!(gov.hold_frames(), 10);
        // Still a single boost request
        assert_eq!(gov.surface().attempts(Endpoint::Frequency).filter(|v| *v == "1500000").count(), 1);
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let mut gov = governor(MemorySurface::new());
        gov.init().unwrap();
        gov.surface_mut().set_failing(Endpoint::Frequency, true);

        gov.dynamic_feedback(true);

        assert!(gov.is_available());
        assert!(gov.is_boosted());
        assert_eq!(gov.surface().value(Endpoint::Frequency), Some("1200000"));

        gov.surface_mut().set_failing(Endpoint::Frequency, false);
        for _ in 0..10 {
            gov.dynamic_feedback(false);
        }

        assert!(!gov.is_boosted());
        assert_eq!(gov.surface().value(Endpoint::Frequency), Some("1200000"));
    }

    #[test]
    fn test_zero_hold_window_releases_next_frame() {
        let config = GovernorConfig {
            boost_hold_frames: 0,
            ..Default::default()
        };
        let mut gov = CpuGovernor::new(MemorySurface::new(), config);
        gov.init().unwrap();

        gov.dynamic_feedback(true);
        assert!(gov.is_boosted());
        gov.dynamic_feedback(false);
        assert!(!gov.is_boosted());
    }

    #[test]
    fn test_deinit_unboosts_before_restore() {
        let mut gov = governor(MemorySurface::new());
        gov.init().unwrap();
        gov.dynamic_feedback(true);
        gov.surface_mut().clear();
        gov.surface_mut().set_failing(Endpoint::ScalingGovernor, true);

        gov.deinit();

        assert_eq!(
            writes(&gov),
            [
                (Endpoint::Frequency, "1200000"),
                (Endpoint::ScalingGovernor, "ondemand")
            ]
        );
        assert_eq!(gov.state(), GovernorState::Deinitialized);

        // Second teardown does nothing
        gov.deinit();
        assert_eq!(gov.surface().writes().len(), 2);
    }

    #[test]
    fn test_uninitialized_deinit_is_silent() {
        let mut gov = governor(MemorySurface::new());

        gov.deinit();

        assert_eq!(gov.state(), GovernorState::Deinitialized);
        assert!(gov.surface().writes().is_empty());
        assert!(matches!(gov.init(), Err(GovernorError::AlreadyInitialised)));
    }
}
