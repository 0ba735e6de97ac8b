use std::time::{Duration, Instant};

/// The single monotonic clock that drives water animation.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frames: 0,
        }
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Mark a frame and return the elapsed time in seconds.
    pub fn tick(&mut self) -> f32 {
        self.frames += 1;
        self.elapsed().as_secs_f32()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.tick();
        assert!(b > a);
        assert_eq!(clock.frames(), 2);
    }
}
