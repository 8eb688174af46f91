//! Bounded worker pool
//!
//! Every fan-out of a run goes through [`run_bounded`]: the dispatcher takes a
//! semaphore permit before spawning, the spawned task holds it until it
//! finishes, and results come back through the task's join handle.

use crate::{Result, SweepError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Runs `f` over every item with at most `limit` tasks in flight
///
/// Results are returned in completion order. The call returns once every
/// spawned task has finished, so consecutive calls form a hard barrier.
///
/// # Arguments
///
/// * `items` - Work items, one task each
/// * `limit` - Maximum number of concurrently running tasks (at least 1)
/// * `cancel` - Token stopping dispatch and abandoning in-flight work
/// * `f` - Builds the task future for one item
///
/// # Returns
///
/// * `Ok(Vec<R>)` - One result per item
/// * `Err(SweepError::Cancelled)` - The token fired before the pool drained
/// * `Err(SweepError::Join)` - A task panicked
pub async fn run_bounded<I, F, Fut, R>(
    items: I,
    limit: usize,
    cancel: &CancellationToken,
    f: F,
) -> Result<Vec<R>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for item in items {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let task = f(item);
        let token = cancel.clone();
        tasks.spawn(async move {
            let _permit = permit;
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                value = task => Some(value),
            }
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        if let Some(value) = joined? {
            results.push(value);
        }
    }

    if cancel.is_cancelled() {
        return Err(SweepError::Cancelled);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_item_produces_a_result() {
        let cancel = CancellationToken::new();
        let mut results = run_bounded(1..=20, 4, &cancel, |n: u32| async move { n * 2 })
            .await
            .unwrap();

        results.sort_unstable();
        assert_eq!(results, (1..=20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_limit_is_respected() {
        let cancel = CancellationToken::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        run_bounded(0..30, 3, &cancel, |_| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let cancel = CancellationToken::new();
        let results: Vec<u8> = run_bounded(Vec::<u8>::new(), 5, &cancel, |n| async move { n })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_pool_reports_cancellation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let result = run_bounded(0..10, 2, &cancel, move |n| {
            let trigger = trigger.clone();
            async move {
                if n == 0 {
                    trigger.cancel();
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
                n
            }
        })
        .await;

        assert!(matches!(result, Err(SweepError::Cancelled)));
    }
}
