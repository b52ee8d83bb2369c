use std::sync::Arc;

use matcher_core::engine::MatchingEngine;

/// Handles a single worker owns. Built once per worker at startup rather
/// than reached for through a process-wide global — the engine itself
/// already holds its `Arc<dyn PoolStore>`/`Arc<dyn TripStore>`/`Arc<dyn
/// NotificationBus>` ports, so every worker context wraps the same shared
/// `MatchingEngine`, just tagged with its own worker id for logging.
#[derive(Clone)]
pub struct WorkerContext {
    pub worker_id: usize,
    pub engine: Arc<MatchingEngine>,
}

impl WorkerContext {
    pub fn new(worker_id: usize, engine: Arc<MatchingEngine>) -> Self {
        Self { worker_id, engine }
    }
}
