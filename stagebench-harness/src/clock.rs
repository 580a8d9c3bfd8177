use std::time::Instant;

/// Monotonic time source used to time iterations.
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin.
    fn now_ns(&self) -> u64;

    /// Smallest observable difference between two readings, in nanoseconds.
    fn resolution_ns(&self) -> f64;

    /// Ticks per second, as reported in the line protocol.
    fn frequency_hz(&self) -> f64 {
        1e9
    }
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone)]
pub struct InstantClock {
    origin: Instant,
    resolution_ns: f64,
}

impl InstantClock {
    const RESOLUTION_SAMPLES: usize = 32;

    pub fn new() -> Self {
        let origin = Instant::now();
        let mut clock = Self {
            origin,
            resolution_ns: 1.0,
        };
        clock.resolution_ns = clock.measure_resolution();
        clock
    }

    /// Shortest non-zero step between consecutive readings.
    fn measure_resolution(&self) -> f64 {
        let mut best = u64::MAX;
        for _ in 0..Self::RESOLUTION_SAMPLES {
            let start = self.now_ns();
            let mut next = self.now_ns();
            while next == start {
                next = self.now_ns();
            }
            best = best.min(next - start);
        }
        best.max(1) as f64
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn resolution_ns(&self) -> f64 {
        self.resolution_ns
    }
}
