//! Scoped deadlines.
//!
//! A [`Deadline`] is an absolute instant passed explicitly down the call
//! chain. Each layer may shorten the deadline it inherits but never extend
//! it, so the outermost caller's budget bounds everything beneath it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, AppResult};

/// Absolute point in time by which an operation must finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// The earlier of this deadline and `budget` from now.
    pub fn shorten(self, budget: Duration) -> Self {
        Self {
            at: self.at.min(Instant::now() + budget),
        }
    }

    /// Time left before expiry, zero once passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Drive `fut` until it completes or the deadline fires, whichever comes
    /// first. The losing side is dropped.
    ///
    /// An already-expired deadline fails without polling `fut`.
    pub async fn run<F>(self, fut: F) -> AppResult<F::Output>
    where
        F: Future,
    {
        if self.is_expired() {
            return Err(AppError::Timeout);
        }

        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| AppError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_shorten_never_extends() {
        let outer = Deadline::after(Duration::from_secs(1));

        assert_eq!(outer.shorten(Duration::from_secs(5)), outer);
        assert!(outer.shorten(Duration::from_millis(100)) < outer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_output_before_deadline() {
        let deadline = Deadline::after(Duration::from_secs(1));

        let value = deadline
            .run(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                7
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let deadline = Deadline::after(Duration::from_millis(50));

        let result = deadline
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;

        assert!(matches!(result, Err(AppError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_fails_fast() {
        let deadline = Deadline::after(Duration::from_millis(5));
        tokio::time::advance(Duration::from_millis(10)).await;

        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert!(matches!(deadline.run(async { 1 }).await, Err(AppError::Timeout)));
    }
}
