//! Task Dispatcher: a fixed-size worker pool fronting the Matching Engine.
//! Each worker owns its own `WorkerContext` (constructed once at startup,
//! never a process-wide global) and tasks round-robin across workers,
//! correlated by a generated `TaskId`.

mod context;
mod error;
mod pool;
mod task;
mod worker;

pub use context::WorkerContext;
pub use error::DispatcherError;
pub use pool::WorkerPool;
pub use task::{DispatchTask, TaskId, TaskKind, TaskOutcome};
