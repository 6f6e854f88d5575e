//! The run-wide worker ceiling.
//!
//! Port attempts, DESCRIBE probes and decoder processes all draw from the
//! same [`WorkerPool`], so the number of open sockets plus child processes
//! never exceeds the configured worker count.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::error;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_flight(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    /// Waits for a free worker. `None` once the run is cancelled.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = self.permits.clone().acquire_owned() => permit.ok(),
        }
    }

    /// Runs `task` for every item with at most [`size`](Self::size) tasks alive.
    ///
    /// Items are pulled lazily, one per free worker. Each task holds its
    /// permit until it finishes or is dropped by cancellation. `on_done` is
    /// the only place results flow through, so it runs on the caller's task
    /// and never concurrently with itself. Returns `false` if cancellation
    /// cut the run short.
    pub async fn run<I, F, Fut>(
        &self,
        cancel: &CancellationToken,
        items: I,
        mut task: F,
        mut on_done: impl FnMut(Fut::Output),
    ) -> bool
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let mut set: JoinSet<Option<Fut::Output>> = JoinSet::new();
        let mut completed = true;

        for item in items {
            let Some(permit) = self.acquire(cancel).await else {
                completed = false;
                break;
            };

            let work = task(item);
            let cancel = cancel.clone();
            set.spawn(async move {
                let _permit = permit;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    output = work => Some(output),
                }
            });

            while let Some(joined) = set.try_join_next() {
                completed &= collect(joined, &mut on_done);
            }
        }

        while let Some(joined) = set.join_next().await {
            completed &= collect(joined, &mut on_done);
        }

        completed && !cancel.is_cancelled()
    }
}

fn collect<T>(joined: Result<Option<T>, tokio::task::JoinError>, on_done: &mut impl FnMut(T)) -> bool {
    match joined {
        Ok(Some(output)) => {
            on_done(output);
            true
        }
        Ok(None) => false,
        Err(e) => {
            error!("worker task failed: {e}");
            true
        }
    }
}
