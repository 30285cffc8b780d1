//! Rate Limiter
//!
//! Bounds concurrent generation calls with a semaphore and spaces calls out
//! by a fixed delay. The permit is held through the delay, so the next call
//! through the same limiter cannot start until the spacing has elapsed.
//! One limiter is shared by every run that talks to the same endpoint.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::models::PanelConfig;
use crate::utils::error::{PanelError, PanelResult};

pub const MIN_PERMITS: usize = 1;
pub const MAX_PERMITS: usize = 3;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    permits: usize,
    spacing: Duration,
}

impl RateLimiter {
    pub fn new(permits: usize, spacing: Duration) -> PanelResult<Self> {
        if !(MIN_PERMITS..=MAX_PERMITS).contains(&permits) {
            return Err(PanelError::config(format!(
                "rate limiter permits must be between {} and {}, got {}",
                MIN_PERMITS, MAX_PERMITS, permits
            )));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
            spacing,
        })
    }

    pub fn from_config(config: &PanelConfig) -> PanelResult<Self> {
        Self::new(config.max_concurrent_calls, config.persona_delay())
    }

    /// One call at a time with no spacing.
    pub fn unthrottled() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(MIN_PERMITS)),
            permits: MIN_PERMITS,
            spacing: Duration::ZERO,
        }
    }

    pub fn permits(&self) -> usize {
        self.permits
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Run `call` under a permit, then wait out the spacing before releasing it.
    pub async fn run<F, T>(&self, call: F) -> PanelResult<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| PanelError::internal("rate limiter semaphore closed"))?;

        let output = call.await;

        if !self.spacing.is_zero() {
            tokio::time::sleep(self.spacing).await;
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[test]
    fn test_permit_bounds() {
        assert!(RateLimiter::new(0, Duration::ZERO).is_err());
        assert!(RateLimiter::new(4, Duration::ZERO).is_err());
        assert_eq!(RateLimiter::new(3, Duration::ZERO).unwrap().permits(), 3);
    }

    async fn max_in_flight(limiter: RateLimiter, tasks: usize) -> usize {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..tasks)
            .map(|_| {
                let limiter = limiter.clone();
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    limiter
                        .run(async {
                            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_single_permit_serialises_calls() {
        let limiter = RateLimiter::new(1, Duration::ZERO).unwrap();
        assert_eq!(max_in_flight(limiter, 4).await, 1);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_permits() {
        let limiter = RateLimiter::new(2, Duration::ZERO).unwrap();
        assert!(max_in_flight(limiter, 6).await <= 2);
    }

    #[tokio::test]
    async fn test_spacing_is_applied_between_calls() {
        let limiter = RateLimiter::new(1, Duration::from_millis(25)).unwrap();
        let started = Instant::now();
        limiter.run(async {}).await.unwrap();
        limiter.run(async {}).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
