use crate::types::constants::RECONNECT_MULTIPLIER;
use std::time::Duration;

/// Capped exponential backoff for reconnect scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before retry number `attempt` (zero-based): `min(base * 2^attempt, max)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = RECONNECT_MULTIPLIER
            .checked_pow(attempt)
            .unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_from_base() {
        let backoff = Backoff::new(Duration::from_millis(1000), Duration::from_millis(30_000));
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_millis(16_000));
    }

    #[test]
    fn test_delay_is_capped() {
        let backoff = Backoff::new(Duration::from_millis(1000), Duration::from_millis(30_000));
        assert_eq!(backoff.delay_for_attempt(5), Duration::from_millis(30_000));
        assert_eq!(backoff.delay_for_attempt(40), Duration::from_millis(30_000));
        assert_eq!(backoff.delay_for_attempt(u32::MAX), Duration::from_millis(30_000));
    }
}
