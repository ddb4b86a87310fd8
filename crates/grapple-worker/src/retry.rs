use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Delay schedule between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let exp = attempt.saturating_sub(1) as i32;
                let secs = initial.as_secs_f64() * multiplier.powi(exp);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    *max
                } else {
                    // A negative multiplier can flip the sign; never wait less than zero.
                    Duration::from_secs_f64(secs.max(0.0))
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RetryError {
    #[error("Gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Successful outcome of [`RetryPolicy::poll_until`].
#[derive(Debug, Clone, PartialEq)]
pub struct Polled<T> {
    pub value: T,
    /// 1-based attempt that produced `value`.
    pub attempts: u32,
}

/// Bounded retry policy: at most `max_attempts` attempts, waiting per
/// `backoff` between them (never after the last one).
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: u32, initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                initial,
                multiplier,
                max,
            },
        }
    }

    /// Run `attempt` until it yields `Some`, or the attempt budget runs out.
    ///
    /// The closure receives the 1-based attempt number. Returning `None` means
    /// "not ready yet"; callers fold transient failures into `None` when they
    /// should consume budget rather than abort.
    pub async fn poll_until<F, Fut, T>(&self, mut attempt: F) -> Result<Polled<T>, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for n in 1..=self.max_attempts {
            if let Some(value) = attempt(n).await {
                return Ok(Polled { value, attempts: n });
            }

            if n < self.max_attempts {
                sleep(self.backoff.delay(n)).await;
            }
        }

        Err(RetryError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
