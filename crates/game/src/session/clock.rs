use std::thread;
use std::time::{Duration, Instant};

/// Longest stall the clock tries to catch up on before resynchronising.
const MAX_LAG: Duration = Duration::from_millis(250);

/// Paces a loop to a fixed number of frames per second.
pub struct FrameClock {
    frame: Duration,
    next: Instant,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            frame: Duration::from_secs(1) / fps,
            next: Instant::now(),
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Sleeps until the next frame is due.
    pub fn tick(&mut self) {
        self.next += self.frame;
        let now = Instant::now();
        if let Some(wait) = self.next.checked_duration_since(now) {
            thread::sleep(wait);
        } else if now.duration_since(self.next) > MAX_LAG {
            self.next = now;
        }
    }

    /// Forgets accumulated lag, e.g. after a blocking score screen.
    pub fn reset(&mut self) {
        self.next = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert_eq!(FrameClock::new(100).frame_duration(), Duration::from_millis(10));
        assert_eq!(FrameClock::new(0).frame_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_tick_paces_frames() {
        let mut clock = FrameClock::new(100);
        let started = Instant::now();
        for _ in 0..5 {
            clock.tick();
        }
        assert!(started.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_lag_is_dropped() {
        let mut clock = FrameClock::new(100);
        thread::sleep(Duration::from_millis(300));
        clock.tick();

        let started = Instant::now();
        clock.tick();
        assert!(started.elapsed() >= Duration::from_millis(5));
    }
}
