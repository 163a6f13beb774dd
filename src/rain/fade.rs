// src/rain/fade.rs

//! Startup fade-in of the whole surface.

use crate::clock::Clock;
use crate::config::FadeConfig;
use std::rc::Rc;

/// Quartic ease-in from `base_alpha` to fully opaque over `duration_ms`.
pub struct FadeController {
    start_ms: u64,
    duration_ms: u64,
    base_alpha: u8,
    clock: Rc<dyn Clock>,
}

impl FadeController {
    /// Starts the fade at the clock's current time.
    pub fn new(config: &FadeConfig, clock: Rc<dyn Clock>) -> Self {
        let start_ms = clock.now_ms();
        Self {
            start_ms,
            duration_ms: config.duration_ms,
            base_alpha: config.base_alpha,
            clock,
        }
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    /// Opacity for the current clock reading.
    pub fn opacity(&self) -> u8 {
        self.opacity_at(self.clock.now_ms())
    }

    pub fn is_complete(&self) -> bool {
        self.opacity() == u8::MAX
    }

    /// Opacity at `now_ms`, in `[base_alpha, 255]`.
    pub fn opacity_at(&self, now_ms: u64) -> u8 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let f = if self.duration_ms == 0 {
            1.0
        } else {
            (elapsed as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
        };
        if f >= 1.0 {
            return u8::MAX;
        }
        let base = f64::from(self.base_alpha);
        let alpha = base + ((255.0 - base) * f.powi(4)).round();
        alpha.min(255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use test_log::test;

    fn fade(duration_ms: u64) -> (FadeController, ManualClock) {
        let clock = ManualClock::new(500);
        let config = FadeConfig {
            enabled: true,
            duration_ms,
            base_alpha: 5,
        };
        (FadeController::new(&config, Rc::new(clock.clone())), clock)
    }

    #[test]
    fn test_starts_at_base_alpha() {
        let (f, _clock) = fade(3000);
        assert_eq!(f.opacity(), 5);
        assert_eq!(f.opacity_at(f.start_ms()), 5);
    }

    #[test]
    fn test_opaque_at_and_after_duration() {
        let (f, clock) = fade(3000);
        assert_eq!(f.opacity_at(500 + 3000), 255);
        clock.advance(10_000);
        assert_eq!(f.opacity(), 255);
        assert!(f.is_complete());
    }

    #[test]
    fn test_quartic_midpoint() {
        // f = 0.5 -> 5 + round(250 * 0.0625) = 5 + 16
        let (f, _clock) = fade(1000);
        assert_eq!(f.opacity_at(500 + 500), 21);
    }

    #[test]
    fn test_zero_duration_is_opaque_immediately() {
        let (f, _clock) = fade(0);
        assert_eq!(f.opacity(), 255);
    }

    #[test]
    fn test_time_before_start_clamps_to_base() {
        let (f, _clock) = fade(1000);
        assert_eq!(f.opacity_at(0), 5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_opacity_monotonic(duration in 1u64..20_000, a in 0u64..40_000, b in 0u64..40_000) {
            let config = FadeConfig { enabled: true, duration_ms: duration, base_alpha: 5 };
            let f = FadeController::new(&config, Rc::new(ManualClock::new(0)));
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(f.opacity_at(lo) <= f.opacity_at(hi));
            prop_assert!(f.opacity_at(lo) >= 5);
        }
    }
}
