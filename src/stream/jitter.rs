//! Randomness behind character pacing and thinking pauses.

use rand::Rng;
use std::time::Duration;

/// Source of pacing noise.
///
/// `sample` returns a value in `[0, 1)`. Character delays are scaled by
/// [`factor`](Jitter::factor), which is `0.5 + sample()`.
pub trait Jitter: Send + Sync {
    fn sample(&self) -> f64;

    fn factor(&self) -> f64 {
        0.5 + self.sample()
    }
}

/// Thread-local RNG noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&self) -> f64 {
        rand::rng().random_range(0.0..1.0)
    }
}

/// Always the same sample, for tests and for reproducible pacing.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(f64);

impl FixedJitter {
    /// `sample` is clamped into `[0, 1)`.
    pub fn new(sample: f64) -> Self {
        Self(sample.clamp(0.0, 0.999_999))
    }
}

impl Jitter for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// No noise: every factor is exactly 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&self) -> f64 {
        0.5
    }
}

/// `interval × factor`
pub fn scaled(interval: Duration, jitter: &dyn Jitter) -> Duration {
    interval.mul_f64(jitter.factor())
}

/// `base + sample × spread`
pub fn spread(base: Duration, spread: Duration, jitter: &dyn Jitter) -> Duration {
    base + spread.mul_f64(jitter.sample())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_factor_range() {
        let jitter = RandomJitter;
        for _ in 0..1000 {
            let f = jitter.factor();
            assert!((0.5..1.5).contains(&f), "factor out of range: {f}");
        }
    }

    #[test]
    fn test_fixed_and_none() {
        assert_eq!(NoJitter.factor(), 1.0);
        assert_eq!(FixedJitter::new(0.0).factor(), 0.5);
        assert!(FixedJitter::new(7.0).factor() < 1.5);

        let interval = Duration::from_millis(20);
        assert_eq!(scaled(interval, &NoJitter), interval);
        assert_eq!(scaled(interval, &FixedJitter::new(0.0)), Duration::from_millis(10));
        assert_eq!(
            spread(
                Duration::from_millis(200),
                Duration::from_secs(1),
                &FixedJitter::new(0.5)
            ),
            Duration::from_millis(700)
        );
    }
}
