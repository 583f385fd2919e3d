use thiserror::Error;

/// Errors surfaced by the scheduler.
///
/// Cancellation never fails, so the only error is failing to obtain the
/// thread a worker runs on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
