//! Bounded, fixed-delay retry loop.

use std::time::Duration;

/// How many times to try and how long to wait between tries.
///
/// No backoff and no jitter: every gap is exactly `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Same attempt count, no waiting. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    /// 10 attempts, 10 seconds apart.
    fn default() -> Self {
        Self::new(10, Duration::from_secs(10))
    }
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Done(T),
    /// Failed, but another attempt may succeed.
    Retry(E),
    /// Failed for good; stop immediately.
    Abort(E),
}

/// Run `op` until it succeeds, aborts, or the policy's attempts are used up.
///
/// `on_retry` is called with the 1-based attempt number after every failure
/// that will be followed by another attempt, before sleeping. On exhaustion
/// the last failure is returned. A policy with zero attempts is treated as one.
pub fn retry<T, E>(
    policy: RetryPolicy,
    mut op: impl FnMut(u32) -> Attempt<T, E>,
    mut on_retry: impl FnMut(u32, &E),
) -> Result<T, E> {
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Attempt::Done(value) => return Ok(value),
            Attempt::Abort(err) => return Err(err),
            Attempt::Retry(err) => {
                if attempt >= max {
                    return Err(err);
                }
                on_retry(attempt, &err);
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_after_failures() {
        let mut retried = Vec::new();
        let result: Result<u32, &str> = retry(
            RetryPolicy::immediate(5),
            |n| if n < 3 { Attempt::Retry("nope") } else { Attempt::Done(n) },
            |n, _| retried.push(n),
        );
        assert_eq!(result, Ok(3));
        assert_eq!(retried, vec![1, 2]);
    }

    #[test]
    fn exhaustion_returns_last_error() {
        let mut calls = 0;
        let mut notices = 0;
        let result: Result<(), u32> = retry(
            RetryPolicy::immediate(10),
            |n| {
                calls += 1;
                Attempt::Retry(n)
            },
            |_, _| notices += 1,
        );
        assert_eq!(result, Err(10));
        assert_eq!(calls, 10);
        // no notice after the final attempt
        assert_eq!(notices, 9);
    }

    #[test]
    fn abort_stops_immediately() {
        let mut calls = 0;
        let result: Result<(), &str> = retry(
            RetryPolicy::immediate(10),
            |_| {
                calls += 1;
                Attempt::Abort("fatal")
            },
            |_, _| {},
        );
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let result: Result<u8, ()> = retry(RetryPolicy::immediate(0), |_| Attempt::Done(7), |_, _| {});
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 10);
        assert_eq!(p.delay, Duration::from_secs(10));
    }
}
