use std::time::{Duration, Instant};

const WINDOW: usize = 120;

/// Measures frames against a deadline, and keeps a simple moving average of their lengths.
pub struct FrameClock {
    /// The longest a frame may take before it counts as late.
    target: Duration,
    /// The current sum of frame lengths
    frame_sum: Duration,
    /// The saved frame lengths used for the moving average
    frame_lengths: [Duration; WINDOW],
    /// The current index into `frame_lengths`
    index: usize,
    /// The amount of frames recorded so far, saturating at the window size
    recorded: usize,
    frame_start: Instant,
}

impl FrameClock {
    pub fn new(target: Duration) -> Self {
        Self {
            target,
            frame_sum: Duration::ZERO,
            frame_lengths: [Duration::ZERO; WINDOW],
            index: 0,
            recorded: 0,
            frame_start: Instant::now(),
        }
    }

    pub fn start_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Record the frame started by [Self::start_frame], returning `true` if it took longer than the target.
    pub fn frame_finished(&mut self) -> bool {
        self.record(self.frame_start.elapsed())
    }

    fn record(&mut self, delta: Duration) -> bool {
        self.frame_sum -= self.frame_lengths[self.index];
        self.frame_sum += delta;
        self.frame_lengths[self.index] = delta;
        self.index = (self.index + 1) % WINDOW;
        self.recorded = (self.recorded + 1).min(WINDOW);

        delta > self.target
    }

    pub fn fps(&self) -> f32 {
        if self.recorded == 0 || self.frame_sum.is_zero() {
            return 0.0;
        }

        1.0 / (self.frame_sum.as_secs_f32() / self.recorded as f32)
    }

    pub fn target(&self) -> Duration {
        self.target
    }
}
