// ABOUTME: Bounded retry with backoff, shared by image pulls and health polling.
// ABOUTME: A policy fixes the attempt count and the wait that follows each failed attempt.

use std::future::Future;
use std::time::Duration;

/// How many times to try, and how long to wait after each failed attempt.
///
/// The wait after attempt `n` (zero-based) is `base * factor^n`. A wait also
/// follows the final failed attempt before the failure is surfaced, so three
/// attempts at 5s base with factor 2 wait 5s, 10s and 20s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    attempts: u32,
    base: Duration,
    factor: u32,
}

impl Backoff {
    /// Exponential backoff doubling from `base`.
    pub fn exponential(attempts: u32, base: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base,
            factor: 2,
        }
    }

    /// Fixed interval between attempts.
    pub fn fixed(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base: interval,
            factor: 1,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait that follows the failed attempt `attempt` (zero-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(self.factor.saturating_pow(attempt))
    }

    /// Every wait the policy can produce, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.attempts).map(|n| self.delay_after(n))
    }

    /// Upper bound on the time spent waiting.
    pub fn total_wait(&self) -> Duration {
        self.delays().fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last: E,
}

/// Run `op` until it succeeds or the policy's attempts run out.
///
/// `op` receives the one-based attempt number.
pub async fn retry<T, E, F, Fut>(policy: &Backoff, mut op: F) -> Result<T, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op(attempt + 1).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let delay = policy.delay_after(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    of = policy.attempts,
                    "attempt failed: {}; waiting {:?}",
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                if attempt >= policy.attempts {
                    return Err(Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn exponential_schedule_doubles() {
        let policy = Backoff::exponential(3, Duration::from_secs(5));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(20)
            ]
        );
        assert_eq!(policy.total_wait(), Duration::from_secs(35));
    }

    #[test]
    fn fixed_schedule_is_flat() {
        let policy = Backoff::fixed(40, Duration::from_secs(3));
        assert!(policy.delays().all(|d| d == Duration::from_secs(3)));
        assert_eq!(policy.total_wait(), Duration::from_secs(120));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(Backoff::fixed(0, Duration::ZERO).attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_operation_runs_exactly_the_attempt_count() {
        let calls = AtomicU32::new(0);
        let policy = Backoff::exponential(3, Duration::from_secs(5));
        let started = Instant::now();

        let result: Result<(), _> = retry(&policy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("registry unavailable") }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, "registry unavailable");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_grow_strictly_between_attempts() {
        let policy = Backoff::exponential(3, Duration::from_secs(5));
        let origin = Instant::now();
        let mut seen = Vec::new();

        let _ = retry(&policy, |_| {
            seen.push(origin.elapsed());
            async { Err::<(), _>("nope") }
        })
        .await;

        assert_eq!(
            seen,
            vec![
                Duration::ZERO,
                Duration::from_secs(5),
                Duration::from_secs(15)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_stops_retrying() {
        let policy = Backoff::exponential(3, Duration::from_secs(5));
        let result = retry(&policy, |attempt| async move {
            if attempt < 2 { Err("flaky") } else { Ok(attempt) }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }
}
