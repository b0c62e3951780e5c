//! Frame sources for core-driven tweens.
//!
//! Node position tweens are run by the surface, but the viewport's pan and
//! zoom tweens are stepped by the pipeline itself, one frame at a time.

use std::time::Duration;

use futures::future::{self, LocalBoxFuture};

/// Yields animation frames.
pub trait FrameClock {
    /// Resolves at the next frame with the time elapsed since the previous one.
    fn next_frame(&self) -> LocalBoxFuture<'static, Duration>;
}

/// Clock whose frames are always ready and exactly `step` apart.
///
/// Headless runs and tests use it to make tweens deterministic.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step: Duration,
}

impl FixedStepClock {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl FrameClock for FixedStepClock {
    fn next_frame(&self) -> LocalBoxFuture<'static, Duration> {
        Box::pin(future::ready(self.step))
    }
}
