use std::time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Host-supplied elapsed time, in milliseconds.
    pub elapsed_ms: f64,

    /// Time since the previous frame signal, in milliseconds.
    pub delta_ms: f64,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Turns the host's elapsed-time signal into per-frame deltas.
///
/// The clock starts with `last_elapsed_ms = 0`, so the very first delta equals
/// the first elapsed value. This is intentional; it matches the behavior of a
/// browser animation callback whose timestamp starts at page load.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_elapsed_ms: f64,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock to `elapsed_ms` and returns the frame snapshot.
    pub fn tick(&mut self, elapsed_ms: f64) -> FrameTime {
        let delta_ms = elapsed_ms - self.last_elapsed_ms;
        self.last_elapsed_ms = elapsed_ms;

        let ft = FrameTime {
            elapsed_ms,
            delta_ms,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    /// Elapsed time of the last tick.
    pub fn last_elapsed_ms(&self) -> f64 {
        self.last_elapsed_ms
    }
}

/// Host-side monotonic time source.
///
/// Plays the role of the animation-frame timestamp: milliseconds since the
/// runtime started, never decreasing.
#[derive(Debug, Clone)]
pub struct HostClock {
    start: Instant,
}

impl HostClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Milliseconds since the clock was created.
    pub fn elapsed_ms(&self) -> f64 {
        Instant::now()
            .saturating_duration_since(self.start)
            .as_secs_f64()
            * 1000.0
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delta_is_first_elapsed() {
        let mut clock = FrameClock::new();
        let ft = clock.tick(16.0);
        assert_eq!(ft.delta_ms, 16.0);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn deltas_follow_elapsed() {
        let mut clock = FrameClock::new();
        clock.tick(100.0);
        let ft = clock.tick(133.5);
        assert_eq!(ft.delta_ms, 33.5);
        assert_eq!(ft.frame_index, 1);
        assert_eq!(clock.last_elapsed_ms(), 133.5);
    }

    #[test]
    fn host_clock_is_monotonic() {
        let clock = HostClock::new();
        let a = clock.elapsed_ms();
        let b = clock.elapsed_ms();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
