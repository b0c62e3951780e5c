//! Easing curves and timed interpolation.
//!
//! A [`Tween`] knows where a value starts, where it ends and how long the
//! transition lasts. Callers feed it elapsed time and read back the eased
//! value, which keeps the interpolation independent of whatever drives the
//! frames.

use std::time::Duration;

use crate::geometry::Point;

/// Linear interpolation (no easing)
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Cubic ease-in-out: slow start, fast middle, slow finish
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Values that can be blended between two endpoints.
pub trait Lerp: Copy {
    /// Returns the value `t` of the way from `self` to `to`.
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Point {
    fn lerp(self, to: Self, t: f32) -> Self {
        Point::new(self.x().lerp(to.x(), t), self.y().lerp(to.y(), t))
    }
}

/// Interpolation of a value over a fixed duration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use typescope_core::tween::{Tween, linear};
///
/// let tween = Tween::new(0.0_f32, 10.0, Duration::from_millis(100)).with_easing(linear);
/// assert_eq!(tween.sample(Duration::from_millis(50)), 5.0);
/// assert_eq!(tween.sample(Duration::from_millis(500)), 10.0);
/// assert!(tween.is_finished(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    duration: Duration,
    easing: fn(f32) -> f32,
}

impl<T: Lerp> Tween<T> {
    /// Creates a tween using [`ease_in_out_cubic`].
    pub fn new(from: T, to: T, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            easing: ease_in_out_cubic,
        }
    }

    /// Replaces the easing curve.
    pub fn with_easing(mut self, easing: fn(f32) -> f32) -> Self {
        self.easing = easing;
        self
    }

    /// Returns the target value.
    pub fn target(&self) -> T {
        self.to
    }

    /// Normalized progress in `0.0..=1.0` after `elapsed`.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Eased value after `elapsed`. Exactly the target once finished.
    pub fn sample(&self, elapsed: Duration) -> T {
        let progress = self.progress(elapsed);
        if progress >= 1.0 {
            return self.to;
        }
        self.from.lerp(self.to, (self.easing)(progress))
    }

    /// Returns true once `elapsed` covers the whole duration.
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        self.progress(elapsed) >= 1.0
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn sample_stays_between_endpoints(
            from in -1000.0f32..1000.0,
            to in -1000.0f32..1000.0,
            elapsed_ms in 0u64..1000,
        ) {
            let tween = Tween::new(from, to, Duration::from_millis(500));
            let value = tween.sample(Duration::from_millis(elapsed_ms));
            let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
            prop_assert!(value >= lo - 0.01 && value <= hi + 0.01);
        }
    }
}
