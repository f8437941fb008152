//! Bounded retry-with-interval primitive.

use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Polls `predicate` every `interval` until it returns true or `timeout`
/// elapses. Returns whether the condition was observed.
///
/// The predicate is always checked at least once, so a zero timeout still
/// succeeds for an already-true condition.
pub async fn await_condition<F>(mut predicate: F, interval: Duration, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(interval).await;
    }
}
