//! Bounded retry with a fixed pause between attempts.

use std::time::Duration;

/// Something that can pause the current thread. Tests substitute a recorder.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Every attempt failed; carries the error from the final one.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `op` until it succeeds or `max_attempts` is reached. `on_failure` sees each
    /// failed attempt (1-based) before the pause. No pause follows the final attempt.
    pub fn run<T, E, S, F, L>(
        &self,
        sleeper: &mut S,
        mut op: F,
        mut on_failure: L,
    ) -> std::result::Result<T, Exhausted<E>>
    where
        S: Sleeper + ?Sized,
        F: FnMut(u32) -> std::result::Result<T, E>,
        L: FnMut(u32, &E),
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    on_failure(attempt, &err);
                    if attempt >= max {
                        return Err(Exhausted {
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                    sleeper.sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Sleeper;
    use std::time::Duration;

    /// Records requested pauses instead of sleeping.
    #[derive(Debug, Default)]
    pub struct RecordingSleeper {
        pub pauses: Vec<Duration>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.pauses.push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;

    const POLICY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(2));

    #[test]
    fn succeeds_first_time_without_sleeping() {
        let mut sleeper = RecordingSleeper::default();
        let out: Result<u8, Exhausted<&str>> = POLICY.run(&mut sleeper, |_| Ok(7), |_, _| {});
        assert_eq!(out.unwrap(), 7);
        assert!(sleeper.pauses.is_empty());
    }

    #[test]
    fn retries_until_success() {
        let mut sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let mut failures = Vec::new();
        let out = POLICY.run(
            &mut sleeper,
            |attempt| {
                calls += 1;
                if attempt < 3 {
                    Err("bus busy")
                } else {
                    Ok(attempt)
                }
            },
            |attempt, _| failures.push(attempt),
        );
        assert_eq!(out.unwrap(), 3);
        assert_eq!(calls, 3);
        assert_eq!(failures, vec![1, 2]);
        assert_eq!(sleeper.pauses, vec![Duration::from_secs(2); 2]);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let out: Result<(), _> = POLICY.run(
            &mut sleeper,
            |attempt| {
                calls += 1;
                Err(format!("nack {attempt}"))
            },
            |_, _| {},
        );
        let err = out.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "nack 3");
        assert_eq!(calls, 3);
        assert_eq!(sleeper.pauses.len(), 2);
    }
}
