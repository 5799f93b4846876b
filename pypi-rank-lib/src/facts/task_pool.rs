use super::progress::Progress;
use core::future::Future;
use core::sync::atomic::{AtomicU64, Ordering};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::sync::Arc;
use tokio::sync::Semaphore;

const LOG_TARGET: &str = "      pool";

/// Runs a batch of independent tasks with bounded parallelism.
///
/// Every item becomes its own tokio task, but at most `width` of them run at any moment.
/// Results are returned in completion order and progress is reported as each task finishes.
#[derive(Debug, Clone)]
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    width: usize,
}

impl TaskPool {
    /// Create a pool that allows at most `width` tasks in flight.
    ///
    /// A width of zero is treated as one.
    #[must_use]
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    /// Run `task` once per item and collect every output.
    ///
    /// A panicking task propagates its panic to the caller.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, label: &'static str, progress: &dyn Progress, task: F) -> Vec<T>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let total = items.len() as u64;
        let completed = Arc::new(AtomicU64::new(0));

        let completed_clone = Arc::clone(&completed);
        progress.set_determinate(Box::new(move || {
            let done = completed_clone.load(Ordering::Relaxed);
            (total, done, format!("{done}/{total} {label}"))
        }));

        log::debug!(target: LOG_TARGET, "Running {total} {label} tasks, {} at a time", self.width);

        let task = Arc::new(task);
        let mut in_flight: FuturesUnordered<_> = items
            .into_iter()
            .map(|item| {
                let semaphore = Arc::clone(&self.semaphore);
                let task = Arc::clone(&task);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
                    (*task)(item).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(in_flight.len());
        while let Some(joined) = in_flight.next().await {
            match joined {
                Ok(output) => results.push(output),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => log::error!(target: LOG_TARGET, "A {label} task was cancelled: {e}"),
            }
            let _ = completed.fetch_add(1, Ordering::Relaxed);
        }

        results
    }
}
