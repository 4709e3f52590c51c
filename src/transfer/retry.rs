/// Fixed-delay retry around any fallible async operation
use std::fmt;
use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every permitted attempt failed
    Exhausted { attempts: u32, last_error: E },
    /// The operation reported an error not worth retrying
    Aborted { attempts: u32, error: E },
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds, it fails with an error `retryable`
    /// rejects, or the attempt ceiling is reached. The same delay separates
    /// every pair of attempts; there is no backoff growth.
    ///
    /// On success returns the value and the number of attempts used.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        retryable: P,
    ) -> Result<(T, u32), RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation(attempt).await {
                Ok(value) => return Ok((value, attempt)),
                Err(error) if !retryable(&error) => {
                    return Err(RetryError::Aborted {
                        attempts: attempt,
                        error,
                    });
                }
                Err(error) => {
                    if attempt >= self.max_attempts {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last_error: error,
                        });
                    }
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label, attempt, self.max_attempts, error, self.delay
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}
