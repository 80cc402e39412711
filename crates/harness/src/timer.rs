use std::time::Instant;

/// Measures how long a single call takes.
pub trait Timer {
    /// Run `operation` and return its result with the elapsed time in milliseconds.
    fn measure<T>(&mut self, operation: impl FnOnce() -> T) -> (T, f64);
}

/// Wall-clock timer backed by [`Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Timer for WallClock {
    fn measure<T>(&mut self, operation: impl FnOnce() -> T) -> (T, f64) {
        let start = Instant::now();
        let result = operation();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        (result, elapsed_ms)
    }
}
