//! Error types for the limited pool

use std::convert::Infallible;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by pool operations.
///
/// `E` is the error type of the pool's [`Factory`](crate::Factory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError<E = Infallible> {
    #[error("Pool capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Failed to create a pooled object: {0}")]
    Create(E),
}

pub type PoolResult<T, E = Infallible> = Result<T, PoolError<E>>;
