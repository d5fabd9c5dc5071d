use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};
use std::task::{Context, Poll};

use futures_channel::oneshot;
use option_lock::OptionLock;

const PENDING: u8 = 0;
const DELIVERED: u8 = 1;
const TIMED_OUT: u8 = 2;
const CLOSED: u8 = 3;
const CANCELED: u8 = 4;

/// The reason a `Waiter` resolved without a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitFailed {
    Timeout,
    Closed,
}

struct Slot<R> {
    state: AtomicU8,
    sender: OptionLock<oneshot::Sender<Arc<R>>>,
}

impl<R> Slot<R> {
    /// Move out of the pending state. Only one caller can ever succeed.
    fn resolve(&self, next: u8) -> Option<oneshot::Sender<Arc<R>>> {
        self.state
            .compare_exchange(PENDING, next, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .and_then(|_| self.sender.try_take())
    }

    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }
}

/// Create the two halves of a pending acquisition: the responder is parked in
/// the waiter queue and registered with the timer, while the waiter is polled
/// by the suspended caller.
pub fn waiter_pair<R>() -> (WaitResponder<R>, Waiter<R>) {
    let (sender, receiver) = oneshot::channel();
    let slot = Arc::new(Slot {
        state: AtomicU8::new(PENDING),
        sender: OptionLock::new(sender),
    });
    (
        WaitResponder { slot: slot.clone() },
        Waiter { receiver, slot },
    )
}

pub struct WaitResponder<R> {
    slot: Arc<Slot<R>>,
}

impl<R> WaitResponder<R> {
    /// Deliver a resource. On failure the resource is handed back, either
    /// because the waiter was already resolved or because it went away.
    pub fn send(&self, res: Arc<R>) -> Result<(), Arc<R>> {
        match self.slot.resolve(DELIVERED) {
            Some(sender) => sender.send(res),
            None => Err(res),
        }
    }

    /// Resolve the waiter with a timeout. Returns false if it was already
    /// resolved.
    pub fn timeout(&self) -> bool {
        // dropping the sender wakes the waiter
        self.slot.resolve(TIMED_OUT).is_some()
    }

    /// Resolve the waiter with a closed-pool error.
    pub fn close(&self) -> bool {
        self.slot.resolve(CLOSED).is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.state() != PENDING
    }
}

impl<R> Clone for WaitResponder<R> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<R> Debug for WaitResponder<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitResponder")
            .field("is_resolved", &self.is_resolved())
            .finish()
    }
}

pub struct Waiter<R> {
    receiver: oneshot::Receiver<Arc<R>>,
    slot: Arc<Slot<R>>,
}

impl<R> Waiter<R> {
    /// Withdraw from the queue. If a resource was delivered before the
    /// cancellation took effect, it is returned so the caller can release it.
    pub fn cancel(&mut self) -> Option<Arc<R>> {
        let _ = self.slot.state.compare_exchange(
            PENDING,
            CANCELED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.receiver.close();
        match self.receiver.try_recv() {
            Ok(res) => res,
            Err(_) => None,
        }
    }
}

impl<R> Debug for Waiter<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter").finish()
    }
}

impl<R> Future for Waiter<R> {
    type Output = Result<Arc<R>, WaitFailed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(res)) => Poll::Ready(Ok(res)),
            Poll::Ready(Err(_)) => {
                if self.slot.state() == TIMED_OUT {
                    Poll::Ready(Err(WaitFailed::Timeout))
                } else {
                    // closed, or the responder was dropped with the pool
                    Poll::Ready(Err(WaitFailed::Closed))
                }
            }
        }
    }
}
