//! Time-boxed property transitions.

use std::time::Duration;

use style::Value;

use crate::TimePoint;

/// Interpolation curve applied to transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    CubicInOut,
}

impl Easing {
    /// Map raw progress in [0, 1] onto the curve. Both curves are monotonic
    /// and fix the endpoints.
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// An in-flight interpolation between two resolved property values.
///
/// Endpoints are frozen at install time; the declared function is re-applied
/// once the transition completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTransition {
    pub start_value: Value,
    pub end_value: Value,
    pub start: TimePoint,
    pub duration: Duration,
    pub delay: Duration,
    pub easing: Easing,
}

impl ActiveTransition {
    /// Raw progress in [0, 1]. The delay holds progress at zero; a zero
    /// duration jumps straight to one once the delay elapsed.
    pub fn progress(&self, now: TimePoint) -> f64 {
        let elapsed = now.saturating_since(self.start);
        if elapsed < self.delay {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        let after_delay = elapsed - self.delay;
        (after_delay.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now: TimePoint) -> Value {
        let t = self.easing.apply(self.progress(now));
        self.start_value.lerp(&self.end_value, t)
    }

    pub fn is_complete(&self, now: TimePoint) -> bool {
        self.progress(now) >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(duration_ms: u64, delay_ms: u64, easing: Easing) -> ActiveTransition {
        ActiveTransition {
            start_value: Value::Number(0.0),
            end_value: Value::Number(10.0),
            start: TimePoint::from_millis(1000),
            duration: Duration::from_millis(duration_ms),
            delay: Duration::from_millis(delay_ms),
            easing,
        }
    }

    #[test]
    fn linear_endpoints_and_midpoint() {
        let t = transition(400, 0, Easing::Linear);
        assert_eq!(t.sample(TimePoint::from_millis(1000)), Value::Number(0.0));
        assert_eq!(t.sample(TimePoint::from_millis(1200)), Value::Number(5.0));
        assert_eq!(t.sample(TimePoint::from_millis(1400)), Value::Number(10.0));
        assert!(t.is_complete(TimePoint::from_millis(1400)));
    }

    #[test]
    fn delay_holds_the_start_value() {
        let t = transition(400, 100, Easing::Linear);
        assert_eq!(t.sample(TimePoint::from_millis(1099)), Value::Number(0.0));
        assert_eq!(t.sample(TimePoint::from_millis(1100)), Value::Number(0.0));
        assert_eq!(t.sample(TimePoint::from_millis(1300)), Value::Number(5.0));
        assert!(!t.is_complete(TimePoint::from_millis(1499)));
        assert!(t.is_complete(TimePoint::from_millis(1500)));
    }

    #[test]
    fn cubic_fixes_endpoints_and_stays_monotonic() {
        let t = transition(1000, 0, Easing::CubicInOut);
        assert_eq!(t.sample(TimePoint::from_millis(1000)), Value::Number(0.0));
        assert_eq!(t.sample(TimePoint::from_millis(2000)), Value::Number(10.0));
        let mut previous = -1.0;
        for ms in (1000..=2000).step_by(50) {
            let Value::Number(v) = t.sample(TimePoint::from_millis(ms)) else {
                panic!("number expected");
            };
            assert!(v >= previous, "sample regressed at {ms}ms");
            previous = v;
        }
    }

    #[test]
    fn sampling_before_the_start_is_clamped() {
        let t = transition(400, 0, Easing::Linear);
        assert_eq!(t.sample(TimePoint::from_millis(0)), Value::Number(0.0));
    }
}
