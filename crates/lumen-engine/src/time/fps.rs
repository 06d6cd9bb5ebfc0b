/// Default number of frames folded into one FPS sample.
pub const DEFAULT_FPS_WINDOW: u32 = 10;

/// Rolling-window frames-per-second estimator.
///
/// Accumulates frame deltas and, once `window` frames have been seen, yields
/// `ceil(1000 * frames / accumulated_ms)` and starts over.
#[derive(Debug, Clone)]
pub struct FpsEstimator {
    window: u32,
    accumulated_ms: f64,
    sample_count: u32,
}

impl FpsEstimator {
    pub fn new(window: u32) -> Self {
        debug_assert!(window > 0);
        Self {
            window: window.max(1),
            accumulated_ms: 0.0,
            sample_count: 0,
        }
    }

    /// Records one frame delta.
    ///
    /// Returns `Some(fps)` when the window completes and the value is finite.
    /// The accumulators reset whenever the window completes, even if nothing
    /// is published (for example when every delta in the window was zero).
    pub fn record(&mut self, delta_ms: f64) -> Option<u32> {
        self.accumulated_ms += delta_ms;
        self.sample_count += 1;

        if self.sample_count < self.window {
            return None;
        }

        let fps = (1000.0 * self.sample_count as f64 / self.accumulated_ms).ceil();
        self.accumulated_ms = 0.0;
        self.sample_count = 0;

        // Published uncapped; only non-finite values are dropped.
        if fps.is_finite() && fps >= 0.0 {
            Some(fps as u32)
        } else {
            None
        }
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

impl Default for FpsEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW)
    }
}

/// Formats an FPS value the way status sinks expect it.
pub fn fps_status(fps: u32) -> String {
    format!("FPS: {fps}")
}
