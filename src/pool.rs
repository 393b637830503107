//! Core limited pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::factory::{Factory, FnFactory};
use crate::waiter::{Grant, Waiter, hand_off};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// A pooled object that automatically returns to the pool when dropped
pub struct PooledObject<T> {
    value: Option<T>,
    return_fn: Arc<dyn Fn(Option<T>) + Send + Sync>,
}

impl<T> PooledObject<T> {
    fn new(value: T, return_fn: Arc<dyn Fn(Option<T>) + Send + Sync>) -> Self {
        Self {
            value: Some(value),
            return_fn,
        }
    }

    /// Take the inner value without returning it to the pool.
    ///
    /// The capacity it occupies stays checked out until the value is handed
    /// back with [`Pool::release`].
    pub fn into_inner(mut this: Self) -> T {
        this.value.take().expect("Value already taken")
    }

    /// Drop the inner value and give its capacity back to the pool.
    ///
    /// Use this for instances that are no longer usable; the next acquirer
    /// gets a freshly created one.
    pub fn discard(mut this: Self) {
        drop(this.value.take());
        (this.return_fn)(None);
    }
}

impl<T> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject").field("value", &self.value).finish()
    }
}

impl<T> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            (self.return_fn)(Some(value));
        }
    }
}

struct State<T> {
    idle: VecDeque<T>,
    in_use: usize,
    waiters: VecDeque<Waiter<T>>,
    next_waiter_id: u64,
}

struct PoolInner<T, E> {
    state: Mutex<State<T>>,
    factory: Box<dyn Factory<Item = T, Error = E>>,
    config: PoolConfiguration,
}

impl<T, E> PoolInner<T, E> {
    fn release(&self, item: T) {
        let mut state = self.state.lock();
        Self::restore(&mut state, Grant::Item(item));
    }

    fn release_slot(&self) {
        let mut state = self.state.lock();
        Self::restore(&mut state, Grant::Slot);
    }

    /// Give a grant back: to the first live waiter, else to the free list.
    fn restore(state: &mut State<T>, grant: Grant<T>) {
        if state.in_use == 0 {
            warn!("release without a matching acquire; dropping the returned object");
            return;
        }
        match hand_off(&mut state.waiters, grant) {
            None => {}
            Some(Grant::Item(item)) => {
                state.idle.push_back(item);
                state.in_use -= 1;
            }
            Some(Grant::Slot) => {
                state.in_use -= 1;
            }
        }
    }
}

/// Capacity reserved for an instance that is being created.
///
/// Given back to the pool unless the creation succeeds.
struct CreationSlot<'a, T, E> {
    inner: &'a PoolInner<T, E>,
    armed: bool,
}

impl<T, E> CreationSlot<'_, T, E> {
    fn fill(mut self) {
        self.armed = false;
    }
}

impl<T, E> Drop for CreationSlot<'_, T, E> {
    fn drop(&mut self) {
        if self.armed {
            debug!("creation abandoned, giving slot back");
            self.inner.release_slot();
        }
    }
}

/// Our side of a queued waiter.
///
/// Dropping it before a grant was received removes the queue entry and
/// re-releases any grant that arrived after we stopped listening.
struct PendingAcquire<'a, T, E> {
    inner: &'a PoolInner<T, E>,
    id: u64,
    rx: oneshot::Receiver<Grant<T>>,
    settled: bool,
}

impl<T, E> PendingAcquire<'_, T, E> {
    async fn wait(mut self, cancel: &CancellationToken) -> PoolResult<Grant<T>, E> {
        let outcome = tokio::select! {
            biased;
            grant = &mut self.rx => grant.ok(),
            _ = cancel.cancelled() => None,
        };
        if let Some(grant) = outcome {
            self.settled = true;
            return Ok(grant);
        }

        // A grant sent before the close still belongs to us.
        self.rx.close();
        match self.rx.try_recv() {
            Ok(grant) => {
                self.settled = true;
                Ok(grant)
            }
            Err(_) => {
                trace!(waiter = self.id, "waiter cancelled");
                Err(PoolError::Cancelled)
            }
        }
    }
}

impl<T, E> Drop for PendingAcquire<'_, T, E> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.rx.close();
        let unclaimed = self.rx.try_recv().ok();
        let mut state = self.inner.state.lock();
        let id = self.id;
        state.waiters.retain(|w| w.id() != id);
        if let Some(grant) = unclaimed {
            trace!(waiter = id, "re-releasing grant that arrived after cancellation");
            PoolInner::<T, E>::restore(&mut state, grant);
        }
    }
}

enum Step<'a, T, E> {
    Reuse(T),
    Create(CreationSlot<'a, T, E>),
    Wait(PendingAcquire<'a, T, E>),
}

/// Bounded object pool with FIFO hand-off to blocked acquirers
///
/// At most `capacity` objects are checked out at any time. Returned objects
/// are reused, new ones are created lazily through the pool's [`Factory`],
/// and acquirers that find the pool exhausted queue up until an object is
/// released or their [`CancellationToken`] fires.
///
/// # Examples
///
/// ```
/// use esox_limitedpool::Pool;
/// use std::convert::Infallible;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = Pool::from_fn(2, || Ok::<_, Infallible>(Vec::<u8>::with_capacity(1024))).unwrap();
/// let cancel = CancellationToken::new();
///
/// let mut buf = pool.acquire(&cancel).await.unwrap();
/// buf.push(1);
/// assert_eq!(pool.count(), (1, 1));
///
/// drop(buf);
/// assert_eq!(pool.count(), (0, 2));
/// # }
/// ```
pub struct Pool<T, E = std::convert::Infallible> {
    inner: Arc<PoolInner<T, E>>,
}

impl<T, E> Clone for Pool<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for Pool<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_use = self.inner.state.lock().in_use;
        f.debug_struct("Pool")
            .field("capacity", &self.inner.config.capacity)
            .field("in_use", &in_use)
            .finish()
    }
}

impl<T: Send + 'static, E: Send + 'static> Pool<T, E> {
    /// Create a new pool around `factory`
    pub fn new<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self, E>
    where
        F: Factory<Item = T, Error = E> + 'static,
    {
        config.validate::<E>()?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(State {
                    idle: VecDeque::with_capacity(config.capacity),
                    in_use: 0,
                    waiters: VecDeque::new(),
                    next_waiter_id: 0,
                }),
                factory: Box::new(factory),
                config,
            }),
        })
    }

    /// Create a pool of `capacity` objects built by a closure
    pub fn from_fn<F>(capacity: usize, func: F) -> PoolResult<Self, E>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self::new(
            FnFactory::new(func),
            PoolConfiguration::new().with_capacity(capacity),
        )
    }

    /// Get an object, waiting for one to be released if the pool is exhausted.
    ///
    /// Returns [`PoolError::Cancelled`] if `cancel` fires before an object
    /// becomes available, and [`PoolError::Create`] if a fresh object was
    /// needed and the factory failed. The configured operation timeout, if
    /// any, applies.
    pub async fn acquire(&self, cancel: &CancellationToken) -> PoolResult<PooledObject<T>, E> {
        match self.inner.config.operation_timeout {
            Some(timeout) => self.acquire_timeout(cancel, timeout).await,
            None => self.acquire_inner(cancel).await,
        }
    }

    /// Get an object, giving up after `timeout`
    pub async fn acquire_timeout(
        &self,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> PoolResult<PooledObject<T>, E> {
        tokio::time::timeout(timeout, self.acquire_inner(cancel))
            .await
            .map_err(|_| PoolError::Timeout(timeout))?
    }

    /// Return an object to the pool.
    ///
    /// `item` must come from [`PooledObject::into_inner`] on an object of this
    /// pool and must not be released twice. The pool does not track identity;
    /// a release with nothing checked out is ignored and the item dropped.
    pub fn release(&self, item: T) {
        self.inner.release(item);
    }

    /// Number of checked out objects and remaining capacity.
    ///
    /// `available` counts acquisitions that could succeed without blocking,
    /// not idle objects. Diagnostic only; the values may be stale on return.
    pub fn count(&self) -> (usize, usize) {
        let state = self.inner.state.lock();
        (state.in_use, self.inner.config.capacity - state.in_use)
    }

    /// Get the configured capacity
    pub fn capacity(&self) -> usize {
        self.inner.config.capacity
    }

    async fn acquire_inner(&self, cancel: &CancellationToken) -> PoolResult<PooledObject<T>, E> {
        let step = {
            let mut state = self.inner.state.lock();
            if let Some(item) = state.idle.pop_front() {
                state.in_use += 1;
                Step::Reuse(item)
            } else if state.in_use < self.inner.config.capacity {
                state.in_use += 1;
                Step::Create(self.reserve())
            } else if cancel.is_cancelled() {
                return Err(PoolError::Cancelled);
            } else {
                let id = state.next_waiter_id;
                state.next_waiter_id += 1;
                let (waiter, rx) = Waiter::new(id, Some(cancel.clone()));
                state.waiters.push_back(waiter);
                trace!(waiter = id, queued = state.waiters.len(), "pool exhausted, waiting");
                Step::Wait(PendingAcquire {
                    inner: &self.inner,
                    id,
                    rx,
                    settled: false,
                })
            }
        };

        match step {
            Step::Reuse(item) => Ok(self.wrap(item)),
            Step::Create(slot) => self.create(slot).await,
            Step::Wait(pending) => match pending.wait(cancel).await? {
                Grant::Item(item) => Ok(self.wrap(item)),
                Grant::Slot => self.create(self.reserve()).await,
            },
        }
    }

    /// Guard for a slot already counted in `in_use`.
    fn reserve(&self) -> CreationSlot<'_, T, E> {
        CreationSlot {
            inner: &self.inner,
            armed: true,
        }
    }

    async fn create(&self, slot: CreationSlot<'_, T, E>) -> PoolResult<PooledObject<T>, E> {
        match self.inner.factory.create().await {
            Ok(item) => {
                slot.fill();
                debug!("created new pooled object");
                Ok(self.wrap(item))
            }
            Err(err) => {
                warn!("factory failed to create pooled object");
                Err(PoolError::Create(err))
            }
        }
    }

    fn wrap(&self, item: T) -> PooledObject<T> {
        PooledObject::new(item, self.make_return_fn())
    }

    fn make_return_fn(&self) -> Arc<dyn Fn(Option<T>) + Send + Sync> {
        let inner = Arc::clone(&self.inner);

        Arc::new(move |item: Option<T>| match item {
            Some(item) => inner.release(item),
            None => inner.release_slot(),
        })
    }

    #[cfg(test)]
    fn waiting(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }
}
