use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{atomic::Ordering, Arc};
use std::time::Instant;

use log::{debug, trace};

use super::pool::{PoolInternal, ACTIVE, STOPPED};
use super::wait::WaitResponder;
use crate::resource::Resource;
use crate::util::sentinel::Sentinel;

/// A request injected into the maintenance thread.
pub(crate) enum Register<R> {
    /// Arm the timeout for a parked acquisition
    Waiter(Instant, WaitResponder<R>),
}

impl<R> Debug for Register<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiter(expire, waiter) => f
                .debug_tuple("Register::Waiter")
                .field(expire)
                .field(waiter)
                .finish(),
        }
    }
}

enum Timer<R> {
    Sweep,
    Waiter(WaitResponder<R>),
}

impl<R: Resource> PoolInternal<R> {
    /// The maintenance loop: fires waiter timeouts and runs the periodic
    /// liveness sweep until the pool is closed or dropped.
    pub(crate) fn manage(self: Arc<Self>) {
        let inner = Sentinel::new(self, |inner, _| {
            // Set the state to Stopped when this thread exits, whether normally
            // or due to a panic.
            inner.run_state.store(STOPPED, Ordering::Release);
        });
        let mut timer_id_source: usize = 0;
        let mut timers = BTreeMap::<(Instant, usize), Timer<R>>::new();
        if let Some(expire) = Instant::now().checked_add(inner.check_interval) {
            timers.insert((expire, timer_id_source), Timer::Sweep);
        }

        loop {
            let remain_timers = timers.split_off(&(Instant::now(), 0));
            let mut timers_fired = false;
            let mut next_sweep = None;
            for (_, timer) in timers {
                match timer {
                    Timer::Sweep => {
                        inner.sweep();
                        next_sweep = Instant::now().checked_add(inner.check_interval);
                    }
                    Timer::Waiter(waiter) => {
                        // Only succeeds if the waiter has not been served
                        // by a release in the meantime
                        if waiter.timeout() {
                            trace!("Acquire timed out");
                            timers_fired = true;
                        }
                    }
                }
            }
            timers = remain_timers;
            if let Some(expire) = next_sweep {
                timer_id_source += 1;
                timers.insert((expire, timer_id_source), Timer::Sweep);
            }
            if timers_fired {
                inner.prune_waiters();
            }

            // Listen before draining the queue, so that a registration made
            // after this point always wakes the thread.
            let listener = inner.manage_event.listen();

            while let Ok(register) = inner.register_inject.pop() {
                match register {
                    Register::Waiter(expire, waiter) => {
                        if !waiter.is_resolved() {
                            timer_id_source += 1;
                            timers.insert((expire, timer_id_source), Timer::Waiter(waiter));
                        }
                    }
                }
            }

            if inner.run_state.load(Ordering::Acquire) != ACTIVE {
                break;
            }

            match timers.keys().next() {
                Some(&(next_check, _)) => {
                    listener.wait_deadline(next_check);
                }
                None => listener.wait(),
            }
        }

        // pending waiters were resolved by the pool close
        debug!("Pool maintenance thread stopped");
    }
}
