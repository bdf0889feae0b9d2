//! Fixed-interval polling against a wall-clock deadline.

use crate::error::TimedOut;
use crate::traits::Clock;
use std::time::Duration;

/// Call `check` until it returns `true` or `duration` has elapsed.
///
/// The first attempt runs immediately. After each unsuccessful attempt the
/// poller sleeps for `interval`, cut short so it never sleeps past the
/// deadline, and gives up once the deadline is reached. With an instantaneous
/// check this makes between `floor(duration / interval)` and one more
/// attempts. A `duration` too large to form a deadline means there is none:
/// the poller keeps going until `check` succeeds.
///
/// Returns the number of attempts on success.
///
/// # Errors
///
/// Returns [`TimedOut`] when the deadline passes without `check` succeeding.
pub fn retry_until_successful<F>(
    clock: &dyn Clock,
    duration: Duration,
    interval: Duration,
    mut check: F,
) -> Result<u32, TimedOut>
where
    F: FnMut() -> bool,
{
    let deadline = clock.now().checked_add(duration);
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);
        if check() {
            return Ok(attempts);
        }

        let Some(deadline) = deadline else {
            clock.sleep(interval);
            continue;
        };
        let remaining = deadline.saturating_duration_since(clock.now());
        if remaining.is_zero() {
            break;
        }

        clock.sleep(interval.min(remaining));
        if clock.now() >= deadline {
            break;
        }
    }

    Err(TimedOut { duration, attempts })
}
