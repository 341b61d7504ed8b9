//! Tokio task utilities for ingestion

use tokio::task::{JoinError, JoinSet};

/// A wrapper around [`JoinSet`] with fail-fast semantics.
///
/// When any task fails or panics, all remaining tasks are aborted and the
/// failure is returned. Dropping the set aborts every task.
pub struct FailFastJoinSet<T>(JoinSet<T>);

impl<T> Default for FailFastJoinSet<T> {
    fn default() -> Self {
        Self(JoinSet::new())
    }
}

impl<T: Send + 'static> FailFastJoinSet<T> {
    /// Creates a new empty fail-fast join set
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a CPU-bound closure on the blocking pool
    pub fn spawn_blocking<F>(&mut self, task: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.0.spawn_blocking(task);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T, E> FailFastJoinSet<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Waits for all tasks and collects their outputs in completion order.
    ///
    /// On the first error or panic the remaining tasks are aborted and
    /// awaited before the failure is returned.
    pub async fn try_collect(&mut self) -> Result<Vec<T>, TryWaitAllError<E>> {
        let mut outputs = Vec::with_capacity(self.0.len());
        while let Some(result) = self.0.join_next().await {
            match result {
                Ok(Ok(value)) => outputs.push(value),
                Ok(Err(err)) => {
                    self.0.shutdown().await;
                    return Err(TryWaitAllError::Error(err));
                }
                Err(err) if err.is_cancelled() => {
                    tracing::trace!("task {} was cancelled", err.id());
                    continue;
                }
                Err(err) => {
                    tracing::error!(error = %err, "task {} panicked", err.id());
                    self.0.shutdown().await;
                    return Err(TryWaitAllError::Panic(err));
                }
            }
        }
        Ok(outputs)
    }
}

/// The error returned by [`FailFastJoinSet::try_collect`]
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub enum TryWaitAllError<E> {
    /// A task returned an error
    Error(E),

    /// A task panicked
    Panic(JoinError),
}
