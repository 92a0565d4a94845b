//! Timers and first-settled timeout races.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{select, Either, LocalBoxFuture};

/// Runtime timer used to bound outbound work.
pub trait Timer {
    /// A future that completes after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

impl<M: Timer + ?Sized> Timer for &M {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        (**self).sleep(duration)
    }
}

/// Error when a timeout is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("Total timeout after {0:?}")]
    Total(Duration),
}

/// Race `future` against `timer.sleep(limit)`.
///
/// Whichever settles first wins. When the timer wins, `future` is dropped
/// without being driven further; its result, if it would ever arrive, is
/// discarded. When both are ready on the same poll, `future` wins.
pub async fn with_timeout<F, M>(timer: &M, limit: Duration, future: F) -> Result<F::Output, TimeoutError>
where
    F: Future,
    M: Timer + ?Sized,
{
    let future = pin!(future);
    match select(future, timer.sleep(limit)).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(TimeoutError::Total(limit)),
    }
}

/// Timer backed by the Tokio runtime, for native builds and tests.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[cfg(not(target_arch = "wasm32"))]
impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_future_wins_race() {
        let result = with_timeout(&TokioTimer, Duration::from_secs(5), async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_timer_wins_race() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            42
        };
        let result = with_timeout(&TokioTimer, Duration::from_millis(10), slow).await;
        assert_eq!(result, Err(TimeoutError::Total(Duration::from_millis(10))));
    }

    #[tokio::test]
    async fn test_pending_future_times_out() {
        let result = with_timeout(
            &TokioTimer,
            Duration::from_millis(5),
            futures::future::pending::<()>(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ready_future_beats_zero_timer() {
        let result = with_timeout(&TokioTimer, Duration::ZERO, async { "ready" }).await;
        assert_eq!(result, Ok("ready"));
    }
}
