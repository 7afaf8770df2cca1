//! Long-press detection for the key.
//!
//! The host only reports press and release edges, so a long press is found by
//! polling: every tick asks [`Detector::check`] whether the key has been held
//! longer than the threshold. A press fires at most once; the key has to be
//! released and pressed again to fire another time.

use std::time::{Duration, Instant};

/// How long the key must be held, strictly exceeded, to trigger.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_secs(1);

/// Press state of one key.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    pressed_at: Option<Instant>,
    fired: bool,
}

impl Detector {
    /// Creates a detector with the key up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press starting at `at`.
    pub fn press(&mut self, at: Instant) {
        self.pressed_at = Some(at);
        self.fired = false;
    }

    /// Records the key going up.
    pub fn release(&mut self) {
        self.pressed_at = None;
        self.fired = false;
    }

    /// True while the key is down.
    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    /// How long the key has been held at `now`, if it is down.
    pub fn held_for(&self, now: Instant) -> Option<Duration> {
        self.pressed_at
            .map(|start| now.saturating_duration_since(start))
    }

    /// Returns true once per press, on the first check past the threshold.
    pub fn check(&mut self, now: Instant) -> bool {
        match self.held_for(now) {
            Some(held) if !self.fired && held > LONG_PRESS_THRESHOLD => {
                self.fired = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_pressed_never_triggers() {
        let mut detector = Detector::new();
        assert!(!detector.is_pressed());
        assert!(!detector.check(Instant::now() + Duration::from_secs(10)));
    }

    #[test]
    fn test_exactly_threshold_does_not_trigger() {
        let start = Instant::now();
        let mut detector = Detector::new();
        detector.press(start);

        assert!(!detector.check(start + Duration::from_millis(1_000)));
        assert!(detector.check(start + Duration::from_millis(1_001)));
    }

    #[test]
    fn test_fires_once_per_press() {
        let start = Instant::now();
        let mut detector = Detector::new();
        detector.press(start);

        assert!(detector.check(start + Duration::from_millis(1_500)));
        assert!(!detector.check(start + Duration::from_millis(2_500)));
        assert!(!detector.check(start + Duration::from_millis(3_500)));

        detector.release();
        let again = start + Duration::from_secs(5);
        detector.press(again);
        assert!(detector.check(again + Duration::from_millis(1_200)));
    }

    #[test]
    fn test_release_clears_press() {
        let start = Instant::now();
        let mut detector = Detector::new();
        detector.press(start);
        detector.release();

        assert!(!detector.is_pressed());
        assert_eq!(detector.held_for(start + Duration::from_secs(2)), None);
        assert!(!detector.check(start + Duration::from_secs(2)));
    }
}
