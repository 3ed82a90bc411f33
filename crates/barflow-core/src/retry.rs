//! Retry logic with exponential backoff and additive jitter.

use std::time::Duration;

/// Backoff strategy between failed fetch attempts.
///
/// The first delay is `base`. Each following delay is the previous one
/// multiplied by `factor`, plus a uniform random amount in `[0, jitter)`
/// added after the multiplication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 2.0,
            jitter: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// No sleeping at all; useful for offline tests.
    pub const fn immediate() -> Self {
        Self {
            base: Duration::ZERO,
            factor: 2.0,
            jitter: Duration::ZERO,
        }
    }

    /// Delay that follows `previous` in the sequence.
    pub fn next_delay(self, previous: Duration) -> Duration {
        let grown = previous.as_secs_f64() * self.factor;
        let jitter = self.jitter.as_secs_f64() * fastrand::f64();
        Duration::try_from_secs_f64(grown + jitter).unwrap_or(Duration::MAX)
    }

    /// Infinite delay sequence starting at `base`.
    pub fn schedule(self) -> BackoffSchedule {
        BackoffSchedule {
            backoff: self,
            next: Some(self.base),
        }
    }
}

/// Iterator over successive backoff delays.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    backoff: Backoff,
    next: Option<Duration>,
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = Some(self.backoff.next_delay(current));
        Some(current)
    }
}

/// Retry policy for a single ticker fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Upper bound on wall-clock time spent on one ticker, sleeps included.
    pub deadline: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Backoff::default(),
            deadline: None,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_without_jitter_doubles() {
        let backoff = Backoff {
            base: Duration::from_millis(100),
            factor: 2.0,
            jitter: Duration::ZERO,
        };

        let delays: Vec<Duration> = backoff.schedule().take(4).collect();
        assert_eq!(
            delays,
            [
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn jittered_delay_grows_at_least_geometrically() {
        let backoff = Backoff::default();

        for _ in 0..20 {
            let delays: Vec<Duration> = backoff.schedule().take(6).collect();
            assert_eq!(delays[0], Duration::from_secs(1));

            for pair in delays.windows(2) {
                let (previous, current) = (pair[0].as_secs_f64(), pair[1].as_secs_f64());
                assert!(current + 1e-9 >= 2.0 * previous, "{current} < 2 * {previous}");
                assert!(current < 2.0 * previous + 1.0, "{current} exceeds jitter bound");
            }
        }
    }

    #[test]
    fn immediate_backoff_never_sleeps() {
        assert!(Backoff::immediate()
            .schedule()
            .take(5)
            .all(|delay| delay.is_zero()));
    }

    #[test]
    fn default_retry_config_matches_job_defaults() {
        let config = RetryConfig::default();

        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.backoff, Backoff::default());
        assert_eq!(config.deadline, None);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryConfig::new(0).attempts(), 1);
        assert_eq!(RetryConfig::new(3).attempts(), 3);
    }
}
