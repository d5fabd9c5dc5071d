use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_lite::future::block_on;
use log::warn;

use super::error::AcquireError;
use super::pool::{Pool, TryAcquire};
use super::wait::{WaitFailed, Waiter};
use crate::resource::Resource;

enum AcquireState<R> {
    Init,
    Waiting(Waiter<R>),
}

/// A Future resolving to an acquired resource or an `AcquireError`.
///
/// The acquire timeout is measured from the creation of this future.
pub struct Acquire<R: Resource> {
    pool: Pool<R>,
    start: Instant,
    state: Option<AcquireState<R>>,
}

impl<R: Resource> Acquire<R> {
    pub(crate) fn new(pool: Pool<R>) -> Self {
        Self {
            pool,
            start: Instant::now(),
            state: Some(AcquireState::Init),
        }
    }

    /// Block the current thread until the acquisition resolves.
    pub fn wait(self) -> Result<Arc<R>, AcquireError<R::Error>> {
        block_on(self)
    }
}

impl<R: Resource> Debug for Acquire<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquire")
            .field("start", &self.start)
            .field(
                "waiting",
                &matches!(self.state, Some(AcquireState::Waiting(..))),
            )
            .finish()
    }
}

impl<R: Resource> Future for Acquire<R> {
    type Output = Result<Arc<R>, AcquireError<R::Error>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = match self.state.take() {
            Some(state) => state,
            None => {
                // future already completed
                return Poll::Ready(Err(AcquireError::PoolClosed));
            }
        };

        loop {
            state = match state {
                AcquireState::Init => match self.pool.inner.try_acquire(self.start) {
                    TryAcquire::Ready(result) => return Poll::Ready(result),
                    TryAcquire::Wait(waiter) => AcquireState::Waiting(waiter),
                },

                AcquireState::Waiting(mut waiter) => match Pin::new(&mut waiter).poll(cx) {
                    Poll::Pending => {
                        self.state.replace(AcquireState::Waiting(waiter));
                        return Poll::Pending;
                    }
                    Poll::Ready(Ok(res)) => return Poll::Ready(Ok(res)),
                    Poll::Ready(Err(WaitFailed::Timeout)) => {
                        return Poll::Ready(Err(AcquireError::Timeout))
                    }
                    Poll::Ready(Err(WaitFailed::Closed)) => {
                        return Poll::Ready(Err(AcquireError::PoolClosed))
                    }
                },
            };
        }
    }
}

impl<R: Resource> Drop for Acquire<R> {
    fn drop(&mut self) {
        if let Some(AcquireState::Waiting(mut waiter)) = self.state.take() {
            // A resource may have been delivered after the last poll
            if let Some(res) = waiter.cancel() {
                if let Err(err) = self.pool.release(&res) {
                    warn!("Error returning abandoned resource: {:?}", err);
                }
            }
            self.pool.inner.prune_waiters();
        }
    }
}
