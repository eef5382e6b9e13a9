//! Delay between failed connection attempts.

use std::time::Duration;

/// Decides how long to wait after a failed attempt.
pub trait BackoffPolicy: Send {
    /// Delay before the next attempt, given the number of consecutive
    /// failures so far (starting at 1).
    fn next_delay(&mut self, failures: u32) -> Duration;

    /// Called after a successful connection.
    fn reset(&mut self) {}
}

/// The same delay after every failure, forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl BackoffPolicy for FixedBackoff {
    fn next_delay(&mut self, _failures: u32) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ignores_failure_count() {
        let mut b = FixedBackoff::default();
        assert_eq!(b.next_delay(1), Duration::from_secs(5));
        assert_eq!(b.next_delay(1000), Duration::from_secs(5));
        b.reset();
        assert_eq!(b.next_delay(1), Duration::from_secs(5));
    }
}
