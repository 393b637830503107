//! Queue entries for acquirers blocked on an exhausted pool
//!
//! Each waiter owns a one-shot delivery slot. The releasing side sends into
//! it while holding the pool lock; the waiting side either receives from it
//! or, when it stops listening, closes it and drains whatever was sent before
//! the close. A grant therefore ends up with exactly one party: the waiter, or
//! the releaser that gets it back from a failed send.

use std::collections::VecDeque;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// What a releasing party can hand to a waiter.
#[derive(Debug)]
pub(crate) enum Grant<T> {
    /// A previously created instance
    Item(T),
    /// Reserved capacity; the receiver must create the instance itself
    Slot,
}

/// A pending acquire call, as seen by the releasing side.
pub(crate) struct Waiter<T> {
    id: u64,
    cancel: Option<CancellationToken>,
    delivery: oneshot::Sender<Grant<T>>,
}

impl<T> Waiter<T> {
    pub fn new(id: u64, cancel: Option<CancellationToken>) -> (Self, oneshot::Receiver<Grant<T>>) {
        let (delivery, rx) = oneshot::channel();
        (Self { id, cancel, delivery }, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The waiter no longer wants a grant: its token fired or its receiver is gone.
    pub fn is_abandoned(&self) -> bool {
        self.delivery.is_closed() || self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Try to hand `grant` over. Gives it back if the waiter closed its slot first.
    pub fn offer(self, grant: Grant<T>) -> Result<(), Grant<T>> {
        self.delivery.send(grant)
    }
}

/// Scan `waiters` front to back and deliver `grant` to the first live one.
///
/// Abandoned waiters are dropped on the way; dropping the sender resolves
/// their receiver with "nothing is coming". The waiter also watches its own
/// token, so this pruning only keeps the queue short, it is not what wakes a
/// cancelled waiter up.
///
/// Returns the grant if no waiter took it.
pub(crate) fn hand_off<T>(
    waiters: &mut VecDeque<Waiter<T>>,
    mut grant: Grant<T>,
) -> Option<Grant<T>> {
    while let Some(waiter) = waiters.pop_front() {
        let id = waiter.id();
        if waiter.is_abandoned() {
            tracing::trace!(waiter = id, "pruned abandoned waiter");
            continue;
        }
        match waiter.offer(grant) {
            Ok(()) => {
                tracing::trace!(waiter = id, "handed off to waiter");
                return None;
            }
            Err(returned) => {
                tracing::trace!(waiter = id, "waiter closed its slot during hand-off");
                grant = returned;
            }
        }
    }
    Some(grant)
}
