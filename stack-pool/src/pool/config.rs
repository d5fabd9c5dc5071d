use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use super::error::ConfigError;
use super::pool::{Pool, PoolInternal};
use super::waiters::WaiterOrder;
use crate::resource::{Generator, Resource};

/// The default number of resources in a pool
pub const DEFAULT_CAPACITY: usize = 10;

/// The default maximum wait when taking a resource
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(50);

/// The default period of the background liveness sweep
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(1000);

/// Construction parameters for a [`Pool`].
pub struct PoolConfig<R: Resource> {
    acquire_timeout: Option<Duration>,
    capacity: usize,
    check_interval: Duration,
    generator: Option<Generator<R>>,
    waiter_order: WaiterOrder,
}

impl<R: Resource> PoolConfig<R> {
    pub fn new<G>(generator: G) -> Self
    where
        G: Fn() -> R + Send + Sync + 'static,
    {
        Self::default().generator(generator)
    }

    /// Set the maximum wait for `take`. A zero duration selects the default.
    pub fn acquire_timeout(mut self, val: Duration) -> Self {
        if val.as_micros() > 0 {
            self.acquire_timeout.replace(val);
        } else {
            self.acquire_timeout.replace(DEFAULT_ACQUIRE_TIMEOUT);
        }
        self
    }

    /// Wait indefinitely in `take` for a resource to be released.
    pub fn blocking(mut self) -> Self {
        self.acquire_timeout.take();
        self
    }

    /// Set the number of resources managed by the pool. Zero selects the
    /// default.
    pub fn capacity(mut self, val: usize) -> Self {
        self.capacity = if val == 0 { DEFAULT_CAPACITY } else { val };
        self
    }

    /// Set the period of the background sweep which probes available
    /// resources. A zero duration selects the default.
    pub fn check_interval(mut self, val: Duration) -> Self {
        self.check_interval = if val.as_micros() > 0 {
            val
        } else {
            DEFAULT_CHECK_INTERVAL
        };
        self
    }

    pub fn generator<G>(mut self, generator: G) -> Self
    where
        G: Fn() -> R + Send + Sync + 'static,
    {
        self.generator.replace(Box::new(generator));
        self
    }

    pub fn waiter_order(mut self, val: WaiterOrder) -> Self {
        self.waiter_order = val;
        self
    }

    /// Create the pool, invoking the generator `capacity` times to populate
    /// the available set and starting the maintenance thread.
    pub fn build(self) -> Result<Pool<R>, ConfigError> {
        let generator = self.generator.ok_or(ConfigError::GeneratorRequired)?;
        let inner = PoolInternal::new(
            self.acquire_timeout,
            self.capacity,
            self.check_interval,
            generator,
            self.waiter_order,
        );
        Pool::new(inner)
    }
}

impl<R: Resource> Default for PoolConfig<R> {
    fn default() -> Self {
        Self {
            acquire_timeout: Some(DEFAULT_ACQUIRE_TIMEOUT),
            capacity: DEFAULT_CAPACITY,
            check_interval: DEFAULT_CHECK_INTERVAL,
            generator: None,
            waiter_order: WaiterOrder::default(),
        }
    }
}

impl<R: Resource> Debug for PoolConfig<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("acquire_timeout", &self.acquire_timeout)
            .field("capacity", &self.capacity)
            .field("check_interval", &self.check_interval)
            .field("has_generator", &self.generator.is_some())
            .field("waiter_order", &self.waiter_order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl Resource for Nop {
        type Error = ();

        fn alive(&self) -> Result<bool, ()> {
            Ok(true)
        }

        fn close(&self) -> Result<(), ()> {
            Ok(())
        }
    }

    #[test]
    fn config_defaults() {
        let config = PoolConfig::new(|| Nop);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.acquire_timeout, Some(DEFAULT_ACQUIRE_TIMEOUT));
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
        assert_eq!(config.waiter_order, WaiterOrder::Lifo);
    }

    #[test]
    fn config_zero_values_select_defaults() {
        let config = PoolConfig::new(|| Nop)
            .capacity(0)
            .acquire_timeout(Duration::from_secs(0))
            .check_interval(Duration::from_secs(0));
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.acquire_timeout, Some(DEFAULT_ACQUIRE_TIMEOUT));
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
    }

    #[test]
    fn config_overrides() {
        let config = PoolConfig::new(|| Nop)
            .capacity(5)
            .acquire_timeout(Duration::from_millis(20))
            .check_interval(Duration::from_millis(20))
            .waiter_order(WaiterOrder::Fifo);
        assert_eq!(config.capacity, 5);
        assert_eq!(config.acquire_timeout, Some(Duration::from_millis(20)));
        assert_eq!(config.check_interval, Duration::from_millis(20));
        assert_eq!(config.waiter_order, WaiterOrder::Fifo);
        assert_eq!(config.blocking().acquire_timeout, None);
    }

    #[test]
    fn config_generator_required() {
        match PoolConfig::<Nop>::default().build() {
            Err(ConfigError::GeneratorRequired) => (),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
