//! Retry backoff policy for failed attempts.

use chrono::Duration;

/// Exponential backoff applied between failed attempts.
///
/// The delay before attempt `n + 1` is `base * 2^(n - 1)` capped at `cap`,
/// with no jitter. The constants are a crate decision, not inherited
/// behaviour; embedders needing a different curve construct their own
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    cap: Duration,
}

impl RetryPolicy {
    /// Exponent ceiling; beyond this the cap dominates anyway.
    const MAX_EXPONENT: u32 = 16;

    /// Creates a policy with an explicit base delay and cap.
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Returns the delay to apply after `attempts` failed attempts.
    ///
    /// `attempts` is the count *including* the failure being recorded, so
    /// the first failure passes 1 and waits one base delay.
    #[must_use]
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(Self::MAX_EXPONENT);
        let base_ms = self.base.num_milliseconds();
        let delay_ms = base_ms.saturating_mul(1_i64 << exponent);
        let cap_ms = self.cap.num_milliseconds();
        Duration::milliseconds(delay_ms.min(cap_ms))
    }
}

impl Default for RetryPolicy {
    /// One second base delay, capped at one minute.
    fn default() -> Self {
        Self::new(Duration::seconds(1), Duration::seconds(60))
    }
}
