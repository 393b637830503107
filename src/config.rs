//! Pool configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

/// Configuration for limited pool behavior
///
/// # Examples
///
/// ```
/// use esox_limitedpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_capacity(8)
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.capacity, 8);
/// assert_eq!(config.operation_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfiguration {
    /// Maximum number of objects that can be checked out simultaneously
    pub capacity: usize,

    /// Upper bound applied to every `acquire` call, if set
    pub operation_timeout: Option<Duration>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            capacity: 10,
            operation_timeout: None,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_limitedpool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_capacity(3);
    /// assert_eq!(config.capacity, 3);
    /// ```
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set operation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    pub(crate) fn validate<E>(&self) -> PoolResult<(), E> {
        if self.capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }
        Ok(())
    }
}
