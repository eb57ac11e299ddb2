//! Cooldown-based rate limiting.

use std::time::Duration;

use super::RateLimitState;

/// Suppresses notifications sent too soon after the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiter {
    cooldown: f64,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown: cooldown.as_secs_f64(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown)
    }

    /// Whether a notification may be sent at `now` (Unix seconds).
    ///
    /// Sending is suppressed while `0 <= now - last_sent <= cooldown`. A
    /// negative elapsed time means the clock moved backwards; sending is
    /// allowed then.
    pub fn should_send(&self, now: f64, state: &RateLimitState) -> bool {
        let elapsed = now - state.last_sent_timestamp;
        !(0.0..=self.cooldown).contains(&elapsed)
    }

    /// The state to persist after sending at `now`.
    pub fn record_send(&self, now: f64) -> RateLimitState {
        RateLimitState::new(now)
    }

    /// Seconds left in the cooldown window at `now`, or `None` if sending is
    /// allowed.
    pub fn remaining(&self, now: f64, state: &RateLimitState) -> Option<f64> {
        if self.should_send(now, state) {
            None
        } else {
            Some(self.cooldown - (now - state.last_sent_timestamp))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: f64 = 1_700_000_000.0;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(1200))
    }

    #[test]
    fn suppressed_inside_cooldown() {
        let state = RateLimitState::new(NOW - 1000.0);
        assert!(!limiter().should_send(NOW, &state));
        assert_eq!(limiter().remaining(NOW, &state), Some(200.0));
    }

    #[test]
    fn sent_after_cooldown_and_state_updated() {
        let state = RateLimitState::new(NOW - 1300.0);
        assert!(limiter().should_send(NOW, &state));
        assert_eq!(limiter().remaining(NOW, &state), None);

        let next = limiter().record_send(NOW);
        assert_eq!(next.last_sent_timestamp, NOW);
    }

    #[test]
    fn cooldown_boundary_is_suppressed() {
        assert!(!limiter().should_send(NOW, &RateLimitState::new(NOW - 1200.0)));
        assert!(limiter().should_send(NOW, &RateLimitState::new(NOW - 1200.5)));
    }

    #[test]
    fn suppressed_immediately_after_record() {
        let limiter = limiter();
        let state = limiter.record_send(NOW);
        assert!(!limiter.should_send(NOW, &state));
    }

    #[test]
    fn epoch_state_always_sends() {
        assert!(limiter().should_send(NOW, &RateLimitState::default()));
    }

    #[test]
    fn clock_moved_backwards_sends() {
        let state = RateLimitState::new(NOW + 60.0);
        assert!(limiter().should_send(NOW, &state));
    }

    #[test]
    fn property_over_offsets() {
        let limiter = limiter();
        for offset in (-100..=2500).step_by(7) {
            let elapsed = offset as f64;
            let state = RateLimitState::new(NOW - elapsed);
            let expected = !(0.0..=1200.0).contains(&elapsed);
            assert_eq!(limiter.should_send(NOW, &state), expected, "elapsed {}", elapsed);
        }
    }

    #[test]
    fn zero_cooldown_only_blocks_same_instant() {
        let limiter = RateLimiter::new(Duration::ZERO);
        assert!(!limiter.should_send(NOW, &RateLimitState::new(NOW)));
        assert!(limiter.should_send(NOW, &RateLimitState::new(NOW - 0.5)));
    }
}
