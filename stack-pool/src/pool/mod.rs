mod acquire;
pub use acquire::Acquire;

mod config;
pub use config::{PoolConfig, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_CAPACITY, DEFAULT_CHECK_INTERVAL};

mod error;
pub use error::{AcquireError, CloseError, ConfigError, ReleaseError};

mod manage;

mod pool;
pub use pool::Pool;

mod wait;

mod waiters;
pub use waiters::WaiterOrder;
