use std::fmt::{self, Debug, Formatter};
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use concurrent_queue::ConcurrentQueue;
use event_listener::Event;
use log::{debug, trace, warn};
use parking_lot::Mutex;

use super::acquire::Acquire;
use super::error::{AcquireError, CloseError, ConfigError, ReleaseError};
use super::manage::Register;
use super::wait::{waiter_pair, Waiter};
use super::waiters::{WaiterOrder, WaiterQueue};
use crate::resource::{Generator, Resource, ResourceSet};
use crate::util::sentinel::Sentinel;

pub(crate) const ACTIVE: u8 = 0;
pub(crate) const SHUTDOWN: u8 = 1;
pub(crate) const STOPPED: u8 = 2;

/// All mutable pool state, guarded by a single mutex.
pub(crate) struct PoolState<R> {
    pub available: ResourceSet<R>,
    pub checked_out: ResourceSet<R>,
    pub closed: bool,
    pub waiters: WaiterQueue<R>,
}

impl<R> PoolState<R> {
    fn managed_count(&self) -> usize {
        self.available.len() + self.checked_out.len()
    }
}

pub(crate) enum TryAcquire<R: Resource> {
    Ready(Result<Arc<R>, AcquireError<R::Error>>),
    Wait(Waiter<R>),
}

pub struct PoolInternal<R: Resource> {
    acquire_timeout: Option<Duration>,
    capacity: usize,
    pub(crate) check_interval: Duration,
    generator: Generator<R>,
    pub(crate) manage_event: Event,
    pub(crate) register_inject: ConcurrentQueue<Register<R>>,
    release_event: Event,
    pub(crate) run_state: AtomicU8,
    pub(crate) state: Mutex<PoolState<R>>,
}

impl<R: Resource> PoolInternal<R> {
    pub fn new(
        acquire_timeout: Option<Duration>,
        capacity: usize,
        check_interval: Duration,
        generator: Generator<R>,
        waiter_order: WaiterOrder,
    ) -> Self {
        let mut available = ResourceSet::with_capacity(capacity);
        for _ in 0..capacity {
            available.push(Arc::new((generator)()));
        }
        Self {
            acquire_timeout,
            capacity,
            check_interval,
            generator,
            manage_event: Event::new(),
            register_inject: ConcurrentQueue::unbounded(),
            release_event: Event::new(),
            run_state: AtomicU8::new(ACTIVE),
            state: Mutex::new(PoolState {
                available,
                checked_out: ResourceSet::with_capacity(capacity),
                closed: false,
                waiters: WaiterQueue::new(waiter_order),
            }),
        }
    }

    fn generate(&self) -> Arc<R> {
        Arc::new((self.generator)())
    }

    /// Close a resource the pool is letting go of, logging any failure.
    fn dispose(&self, res: &Arc<R>) {
        if let Err(err) = res.close() {
            warn!("Error closing discarded resource: {:?}", err);
        }
    }

    /// Pop and probe an available resource, or register a waiter if none is
    /// available. The pop, probe, regeneration and check-out all happen
    /// within one critical section.
    pub(crate) fn try_acquire(&self, started: Instant) -> TryAcquire<R> {
        let mut state = self.state.lock();
        if state.closed {
            return TryAcquire::Ready(Err(AcquireError::PoolClosed));
        }

        if let Some(res) = state.available.pop() {
            let res = match res.alive() {
                Ok(true) => res,
                Ok(false) => {
                    trace!("Replacing dead resource");
                    self.dispose(&res);
                    self.generate()
                }
                Err(err) => {
                    // The resource is discarded, the deficit is refilled by
                    // a later acquire or sweep
                    warn!("Resource liveness check failed: {:?}", err);
                    self.dispose(&res);
                    return TryAcquire::Ready(Err(AcquireError::ResourceError(err)));
                }
            };
            state.checked_out.push(res.clone());
            return TryAcquire::Ready(Ok(res));
        }

        if state.managed_count() < self.capacity {
            let res = self.generate();
            state.checked_out.push(res.clone());
            return TryAcquire::Ready(Ok(res));
        }

        let (responder, waiter) = waiter_pair();
        state.waiters.prune();
        state.waiters.push(responder.clone());
        drop(state);

        // a deadline past the range of `Instant` never expires
        if let Some(expire) = self
            .acquire_timeout
            .and_then(|timeout| started.checked_add(timeout))
        {
            self.register(Register::Waiter(expire, responder));
        }
        TryAcquire::Wait(waiter)
    }

    /// Hand available resources to pending waiters until either runs out.
    fn dispatch(&self, state: &mut PoolState<R>) {
        while !state.available.is_empty() {
            let waiter = match state.waiters.pop_unresolved() {
                Some(waiter) => waiter,
                None => break,
            };
            if let Some(res) = state.available.pop() {
                if waiter.send(res.clone()).is_ok() {
                    trace!("Resource handed to waiter");
                    state.checked_out.push(res);
                } else {
                    // resolved concurrently by its timer or abandoned
                    state.available.push(res);
                }
            }
        }
    }

    pub fn release(&self, res: &Arc<R>) -> Result<(), ReleaseError<R::Error>> {
        let mut state = self.state.lock();
        let res = state
            .checked_out
            .take(res)
            .ok_or(ReleaseError::Unmanaged)?;

        if state.closed {
            drop(state);
            trace!("Closing resource released after shutdown");
            let result = res.close().map_err(ReleaseError::ResourceError);
            self.release_event.notify(usize::MAX);
            return result;
        }

        state.available.push(res);
        self.dispatch(&mut state);
        Ok(())
    }

    pub fn close(&self) -> Result<(), CloseError<R::Error>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(CloseError::AlreadyClosed);
        }
        state.closed = true;
        let resources: Vec<Arc<R>> = state.available.drain().collect();
        let waiters = state.waiters.close_all();
        let outstanding = state.checked_out.len();
        drop(state);

        debug!(
            "Closing pool: {} available, {} outstanding, {} waiters",
            resources.len(),
            outstanding,
            waiters
        );
        self.stop();

        let errors: Vec<R::Error> = resources
            .iter()
            .filter_map(|res| res.close().err())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            warn!("{} resource(s) failed to close", errors.len());
            Err(CloseError::ResourceErrors(errors))
        }
    }

    pub fn drain(&self, timeout: Duration) -> Result<(), CloseError<R::Error>> {
        let result = self.close();
        if let Err(CloseError::AlreadyClosed) = result {
            return result;
        }
        let expire = Instant::now().checked_add(timeout);
        loop {
            let listener = self.release_event.listen();
            if self.checked_out() == 0 {
                debug!("Pool drained");
                return result;
            }
            let notified = match expire {
                Some(expire) => listener.wait_deadline(expire),
                None => {
                    listener.wait();
                    true
                }
            };
            if !notified {
                let outstanding = self.checked_out();
                if outstanding == 0 {
                    return result;
                }
                return Err(CloseError::Timeout { outstanding });
            }
        }
    }

    /// Probe every available resource, replacing dead ones and refilling the
    /// pool to capacity. Resources produced here may go straight to waiters.
    pub(crate) fn sweep(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }

        // drained top first, pushed back bottom first to keep reuse order
        let current: Vec<Arc<R>> = state.available.drain().collect();
        let mut replaced = 0;
        for res in current.into_iter().rev() {
            match res.alive() {
                Ok(true) => state.available.push(res),
                Ok(false) => {
                    self.dispose(&res);
                    state.available.push(self.generate());
                    replaced += 1;
                }
                Err(err) => {
                    warn!("Resource liveness check failed during sweep: {:?}", err);
                    self.dispose(&res);
                }
            }
        }

        let mut created = 0;
        while state.managed_count() < self.capacity {
            state.available.push(self.generate());
            created += 1;
        }
        if replaced > 0 || created > 0 {
            debug!(
                "Sweep replaced {} dead resource(s), created {}",
                replaced, created
            );
        }

        self.dispatch(&mut state);
    }

    /// Drop parked acquisitions which have already been resolved.
    pub(crate) fn prune_waiters(&self) {
        let pruned = self.state.lock().waiters.prune();
        if pruned > 0 {
            trace!("Pruned {} resolved waiter(s)", pruned);
        }
    }

    pub(crate) fn register(&self, reg: Register<R>) {
        if self.register_inject.push(reg).is_err() {
            warn!("Pool manager queue is closed");
        }
        self.manage_event.notify(1);
    }

    /// Signal the maintenance thread to exit.
    pub(crate) fn stop(&self) {
        if self
            .run_state
            .compare_exchange(ACTIVE, SHUTDOWN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.manage_event.notify(1);
        }
    }

    pub fn available(&self) -> usize {
        self.state.lock().available.len()
    }

    pub fn checked_out(&self) -> usize {
        self.state.lock().checked_out.len()
    }

    pub fn manages(&self, res: &Arc<R>) -> bool {
        self.state.lock().checked_out.contains(res)
    }

    pub fn max(&self) -> usize {
        self.capacity
    }

    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

/// A resource pool instance, which hands out shared handles to resources of
/// type `R`.
///
/// Cloning a `Pool` produces another handle to the same pool. When the last
/// handle is dropped the pool is closed.
pub struct Pool<R: Resource> {
    pub(crate) inner: Sentinel<PoolInternal<R>>,
}

impl<R: Resource> Pool<R> {
    pub(crate) fn new(inner: PoolInternal<R>) -> Result<Self, ConfigError> {
        let inner = Arc::new(inner);
        let mgr = inner.clone();
        thread::Builder::new()
            .name("stack-pool-manage".to_owned())
            .spawn(move || mgr.manage())?;
        debug!("Created pool with capacity {}", inner.max());
        let sentinel = Sentinel::new(inner, |inner, count| {
            if count == 0 {
                match inner.close() {
                    Ok(()) | Err(CloseError::AlreadyClosed) => (),
                    Err(err) => warn!("Error closing dropped pool: {:?}", err),
                }
            }
        });
        Ok(Self { inner: sentinel })
    }

    /// Returns an `Acquire<R>`, a `Future` resolving to either an acquired
    /// resource or an `AcquireError`.
    pub fn acquire(&self) -> Acquire<R> {
        Acquire::new(self.clone())
    }

    /// Take a resource, blocking the current thread until one is available
    /// or the acquire timeout elapses.
    pub fn take(&self) -> Result<Arc<R>, AcquireError<R::Error>> {
        self.acquire().wait()
    }

    /// Give a taken resource back to the pool.
    pub fn release(&self, res: &Arc<R>) -> Result<(), ReleaseError<R::Error>> {
        self.inner.release(res)
    }

    /// Shut down the pool, closing every available resource. Resources still
    /// checked out are closed when they are released.
    pub fn close(&self) -> Result<(), CloseError<R::Error>> {
        self.inner.close()
    }

    /// Close the pool, then wait up to `timeout` for every checked out
    /// resource to be released.
    pub fn drain(&self, timeout: Duration) -> Result<(), CloseError<R::Error>> {
        self.inner.drain(timeout)
    }

    /// Check whether a resource is currently checked out from this pool.
    pub fn manages(&self, res: &Arc<R>) -> bool {
        self.inner.manages(res)
    }

    /// Fetch the maximum number of resources managed by this pool.
    pub fn max(&self) -> usize {
        self.inner.max()
    }

    /// Fetch the number of resources ready to be taken.
    pub fn available(&self) -> usize {
        self.inner.available()
    }

    /// Fetch the number of resources currently checked out.
    pub fn checked_out(&self) -> usize {
        self.inner.checked_out()
    }

    /// Fetch the number of parked acquisitions, including any already
    /// resolved but not yet pruned.
    pub fn waiting(&self) -> usize {
        self.inner.waiting()
    }
}

impl<R: Resource> Clone for Pool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> Debug for Pool<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("max", &self.max())
            .field("available", &self.available())
            .field("checked_out", &self.checked_out())
            .finish()
    }
}
