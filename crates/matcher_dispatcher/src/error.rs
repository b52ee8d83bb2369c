use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("worker pool did not become ready within the startup timeout")]
    StartupTimeout,

    #[error("worker pool has been shut down")]
    WorkerPoolTerminated,
}
