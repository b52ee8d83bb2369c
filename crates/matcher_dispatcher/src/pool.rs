use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use matcher_core::engine::MatchingEngine;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use crate::context::WorkerContext;
use crate::error::DispatcherError;
use crate::task::{DispatchTask, TaskKind, TaskOutcome};
use crate::worker::{self, WorkItem};

/// Fixed-size round-robin worker pool fronting a shared `MatchingEngine`.
pub struct WorkerPool {
    senders: Vec<mpsc::Sender<WorkItem>>,
    next: AtomicUsize,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers, each with its own bounded inbox, and
    /// waits for every one to signal readiness before returning. Fails with
    /// `StartupTimeout` if any worker hasn't reported in by `startup_timeout`.
    pub async fn start(
        engine: Arc<MatchingEngine>,
        worker_count: usize,
        queue_capacity: usize,
        startup_timeout: Duration,
    ) -> Result<Self, DispatcherError> {
        let mut senders = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);
        let mut ready_rxs = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let (tx, rx) = mpsc::channel(queue_capacity);
            let (ready_tx, ready_rx) = oneshot::channel();
            let ctx = WorkerContext::new(worker_id, engine.clone());
            handles.push(tokio::spawn(worker::run(ctx, rx, ready_tx)));
            senders.push(tx);
            ready_rxs.push(ready_rx);
        }

        let await_all_ready = async {
            for rx in ready_rxs {
                let _ = rx.await;
            }
        };
        if tokio::time::timeout(startup_timeout, await_all_ready)
            .await
            .is_err()
        {
            return Err(DispatcherError::StartupTimeout);
        }

        info!(worker_count, "worker pool started");
        Ok(Self {
            senders,
            next: AtomicUsize::new(0),
            handles,
        })
    }

    /// Round-robins a task to the next worker and awaits its result.
    pub async fn dispatch(&self, kind: TaskKind) -> Result<TaskOutcome, DispatcherError> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        let (respond_to, response) = oneshot::channel();
        let task = DispatchTask::new(kind);
        self.senders[idx]
            .send(WorkItem { task, respond_to })
            .await
            .map_err(|_| DispatcherError::WorkerPoolTerminated)?;
        response
            .await
            .map_err(|_| DispatcherError::WorkerPoolTerminated)
    }

    /// Closes every worker's inbox and waits for the workers to drain and
    /// exit. Any task still queued at the moment `dispatch` raced this call
    /// resolves with `WorkerPoolTerminated` instead of a result.
    pub async fn shutdown(self) {
        drop(self.senders);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("worker pool terminated");
    }
}
