use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use stack_pool::Resource;

pub struct AtomicCounter {
    count: AtomicUsize,
}

#[allow(unused)]
impl AtomicCounter {
    pub fn new(val: usize) -> Self {
        Self {
            count: AtomicUsize::new(val),
        }
    }

    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn decrement(&self) -> usize {
        self.count.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub fn value(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

#[derive(Debug, PartialEq)]
pub struct TestError(pub &'static str);

#[derive(Debug)]
pub struct TestResource {
    pub id: usize,
    alive: AtomicBool,
    probe_error: AtomicBool,
    closed: AtomicBool,
    close_error: bool,
}

#[allow(unused)]
impl TestResource {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            alive: AtomicBool::new(true),
            probe_error: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            close_error: false,
        }
    }

    pub fn failing_close(id: usize) -> Self {
        Self {
            close_error: true,
            ..Self::new(id)
        }
    }

    /// Make the liveness probe report the resource as dead.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Make the liveness probe itself fail.
    pub fn break_probe(&self) {
        self.probe_error.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Resource for TestResource {
    type Error = TestError;

    fn alive(&self) -> Result<bool, TestError> {
        if self.probe_error.load(Ordering::SeqCst) {
            Err(TestError("probe"))
        } else {
            Ok(self.alive.load(Ordering::SeqCst))
        }
    }

    fn close(&self) -> Result<(), TestError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.close_error {
            Err(TestError("close"))
        } else {
            Ok(())
        }
    }
}

/// A generator numbering resources from 1, along with the counter of
/// resources created so far.
#[allow(unused)]
pub fn counter_generator() -> (Arc<AtomicCounter>, impl Fn() -> TestResource + Send + Sync) {
    let source = Arc::new(AtomicCounter::default());
    let counter = source.clone();
    (counter, move || TestResource::new(source.increment()))
}

/// Spin until a condition holds, panicking after a generous limit.
#[allow(unused)]
pub fn wait_until<F: Fn() -> bool>(check: F) {
    let expire = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < expire, "condition not reached");
        thread::yield_now();
    }
}
