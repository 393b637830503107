//! Object factories

use async_trait::async_trait;

/// Creates new instances for a [`Pool`](crate::Pool).
///
/// `create` is always called outside the pool's lock, so it may perform I/O
/// or other slow work. A failed call is reported to the acquiring caller as
/// [`PoolError::Create`](crate::PoolError::Create) and the reserved capacity
/// is given back to the pool.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use esox_limitedpool::Factory;
///
/// struct Connector {
///     url: String,
/// }
///
/// #[async_trait]
/// impl Factory for Connector {
///     type Item = String;
///     type Error = std::io::Error;
///
///     async fn create(&self) -> Result<String, std::io::Error> {
///         Ok(format!("connection to {}", self.url))
///     }
/// }
/// ```
#[async_trait]
pub trait Factory: Send + Sync {
    /// Type of the pooled instances
    type Item: Send;

    /// Error returned when an instance cannot be created
    type Error: Send;

    /// Create a new instance
    async fn create(&self) -> Result<Self::Item, Self::Error>;
}

/// Adapts a plain closure into a [`Factory`].
pub struct FnFactory<F> {
    func: F,
}

impl<F> FnFactory<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, T, E> Factory for FnFactory<F>
where
    F: Fn() -> Result<T, E> + Send + Sync,
    T: Send,
    E: Send,
{
    type Item = T;
    type Error = E;

    async fn create(&self) -> Result<T, E> {
        (self.func)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fn_factory_calls_closure() {
        let calls = AtomicUsize::new(0);
        let factory = FnFactory::new(|| Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst)));

        assert_eq!(factory.create().await, Ok(0));
        assert_eq!(factory.create().await, Ok(1));
    }

    #[tokio::test]
    async fn test_fn_factory_propagates_error() {
        let factory = FnFactory::new(|| Err::<u32, _>("refused"));
        assert_eq!(factory.create().await, Err("refused"));
    }
}
