//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before the next attempt after `attempt` attempts have run.
///
/// Doubles from `base` on every attempt, is capped at `max`, and adds up to
/// 10% jitter on top of the capped value. Attempt 0 waits nothing.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(31));
    let capped = base.saturating_mul(factor).min(max);

    let jitter_range = capped.as_millis() as u64 / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(jitter)
}
