//! Latency-bounded job lookup.

use std::time::Duration;

use edge_sdk::edge_data::{with_timeout, TimeoutError, Timer};

use crate::data::JobRecord;
use crate::store::JobStore;

/// Fixed deadline for the store lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a lookup that did not produce a job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no job matches the slug")]
    NotFound,

    #[error("store lookup exceeded {0:?}")]
    Timeout(Duration),

    #[error("store error: {0}")]
    StoreError(String),
}

/// Look up one job by slug, racing the store against `timeout`.
///
/// Whichever settles first decides the outcome. A lookup that loses the race
/// is dropped and never polled again, so a late answer cannot change the
/// result. There are no retries.
pub async fn resolve_job<S, M>(
    store: &S,
    timer: &M,
    slug: &str,
    timeout: Duration,
) -> Result<JobRecord, ResolveError>
where
    S: JobStore + ?Sized,
    M: Timer + ?Sized,
{
    match with_timeout(timer, timeout, store.find_by_slug(slug)).await {
        Err(TimeoutError::Total(limit)) => Err(ResolveError::Timeout(limit)),
        Ok(Ok(Some(job))) => Ok(job),
        Ok(Ok(None)) => Err(ResolveError::NotFound),
        Ok(Err(failure)) if failure.is_no_rows() => Err(ResolveError::NotFound),
        Ok(Err(failure)) => Err(ResolveError::StoreError(failure.message)),
    }
}

/// [`resolve_job`] with the fixed store deadline.
pub async fn resolve_job_default<S, M>(store: &S, timer: &M, slug: &str) -> Result<JobRecord, ResolveError>
where
    S: JobStore + ?Sized,
    M: Timer + ?Sized,
{
    resolve_job(store, timer, slug, LOOKUP_TIMEOUT).await
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use async_trait::async_trait;
    use edge_sdk::edge_data::{DependencyTag, TokioTimer};

    use super::*;
    use crate::store::{InMemoryStore, StoreFailure, NO_ROWS_CODE};

    /// Answers after `delay`, counting how many lookups completed.
    struct SlowStore {
        delay: Duration,
        completed: Cell<u32>,
    }

    #[async_trait(?Send)]
    impl JobStore for SlowStore {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<JobRecord>, StoreFailure> {
            tokio::time::sleep(self.delay).await;
            self.completed.set(self.completed.get() + 1);
            Ok(Some(JobRecord::new(slug, "Late Job")))
        }
    }

    #[test]
    fn test_deadline_matches_store_tag() {
        assert_eq!(LOOKUP_TIMEOUT, DependencyTag::Store.default_timeout());
    }

    #[tokio::test]
    async fn test_found() {
        let store = InMemoryStore::new().with_job(JobRecord::new("rust-dev", "Rust Developer"));
        let job = resolve_job_default(&store, &TokioTimer, "rust-dev").await.unwrap();
        assert_eq!(job.title, "Rust Developer");
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let store = InMemoryStore::new();
        assert_eq!(
            resolve_job_default(&store, &TokioTimer, "missing").await,
            Err(ResolveError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_no_rows_failures_are_not_found() {
        for failure in [
            StoreFailure::new("JSON object requested").with_code(NO_ROWS_CODE),
            StoreFailure::new("No rows found"),
            StoreFailure::new("The result contains 0 rows"),
        ] {
            let store = InMemoryStore::failing(failure);
            assert_eq!(
                resolve_job_default(&store, &TokioTimer, "x").await,
                Err(ResolveError::NotFound)
            );
        }
    }

    #[tokio::test]
    async fn test_other_failures_carry_message() {
        let store = InMemoryStore::failing(StoreFailure::new("permission denied").with_code("42501"));
        assert_eq!(
            resolve_job_default(&store, &TokioTimer, "x").await,
            Err(ResolveError::StoreError("permission denied".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_wins_even_if_store_answers_later() {
        let store = SlowStore {
            delay: Duration::from_secs(30),
            completed: Cell::new(0),
        };

        let result = resolve_job_default(&store, &TokioTimer, "slow").await;
        assert_eq!(result, Err(ResolveError::Timeout(LOOKUP_TIMEOUT)));

        // Let the store's deadline pass; the abandoned lookup stays abandoned.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.completed.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_just_under_deadline() {
        let store = SlowStore {
            delay: Duration::from_millis(9_999),
            completed: Cell::new(0),
        };
        let job = resolve_job_default(&store, &TokioTimer, "quick").await.unwrap();
        assert_eq!(job.slug, "quick");
        assert_eq!(store.completed.get(), 1);
    }
}
