//! A bounded pool of reusable resources with liveness checking.
//!
//! Resources are created up front by a generator, handed out most recently
//! returned first, and probed before each hand-out. A resource reporting
//! itself dead is replaced transparently. When none are available, callers
//! park until a resource is released or the acquire timeout elapses.
//!
//! ```
//! use stack_pool::{PoolConfig, Resource};
//!
//! struct Conn;
//!
//! impl Resource for Conn {
//!     type Error = ();
//!     fn alive(&self) -> Result<bool, ()> { Ok(true) }
//!     fn close(&self) -> Result<(), ()> { Ok(()) }
//! }
//!
//! let pool = PoolConfig::new(|| Conn).capacity(2).build().unwrap();
//! let conn = pool.take().unwrap();
//! assert!(pool.manages(&conn));
//! pool.release(&conn).unwrap();
//! pool.close().unwrap();
//! ```

mod pool;
pub use self::pool::{
    Acquire, AcquireError, CloseError, ConfigError, Pool, PoolConfig, ReleaseError, WaiterOrder,
    DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_CAPACITY, DEFAULT_CHECK_INTERVAL,
};

mod resource;
pub use self::resource::{Generator, Resource};

mod util;
