// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded pool for heavy, synchronous stage work.
//!
//! Work runs on Tokio's blocking threads, at most `max_concurrency` jobs at a
//! time. The closure receives a [`CancellationToken`] to poll; its result is
//! handed back to the awaiting task, which is the only place that touches
//! caches or the graph.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::errors::ComputeError;
use crate::observability::messages::engine::WorkerPoolCreated;
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl WorkerPool {
    /// Create a pool with the specified concurrency limit
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1); // Ensure at least 1
        WorkerPoolCreated { max_concurrency }.log();
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Create a pool sized to the number of CPU cores
    pub fn with_default_concurrency() -> Self {
        Self::new(default_concurrency())
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Number of jobs that could start right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs `work` on a worker thread once a slot is free.
    ///
    /// Returns [`ComputeError::Canceled`] if `cancel` fires while waiting for a
    /// slot. Once started, the job runs to completion even if the caller stops
    /// waiting; its result is then dropped. A panic inside `work` resumes on
    /// the awaiting task.
    pub async fn run<F, R>(&self, cancel: &CancellationToken, work: F) -> Result<R, ComputeError>
    where
        F: FnOnce(CancellationToken) -> Result<R, ComputeError> + Send + 'static,
        R: Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ComputeError::Canceled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| ComputeError::Canceled)?
            }
        };

        let token = cancel.clone();
        let job = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work(token)
        });

        match job.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ComputeError::Canceled),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_default_concurrency()
    }
}

/// Get the default concurrency level based on system capabilities
///
/// Returns the number of available CPU cores, falling back to 4 if detection fails.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
