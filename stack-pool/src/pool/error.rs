use thiserror::Error;

/// An error during resource acquisition.
#[derive(Debug, Error)]
pub enum AcquireError<E> {
    /// The resource pool is closed
    #[error("the resource pool is closed")]
    PoolClosed,
    /// Wraps an error result from the liveness probe of a popped resource
    #[error("resource error: {0}")]
    ResourceError(E),
    /// No resource became available within the acquire timeout
    #[error("timed out taking resource")]
    Timeout,
}

impl<E> AcquireError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// An error returning a resource to the pool.
#[derive(Debug, Error)]
pub enum ReleaseError<E> {
    /// The resource is not currently checked out from this pool
    #[error("this resource isn't managed by this pool")]
    Unmanaged,
    /// The pool was closed and closing the returned resource failed
    #[error("resource error: {0}")]
    ResourceError(E),
}

/// An error shutting down the pool.
#[derive(Debug, Error)]
pub enum CloseError<E> {
    /// `close` was already called on this pool
    #[error("pool is already closed")]
    AlreadyClosed,
    /// One or more resources failed to close. The pool is closed regardless.
    #[error("error closing resource pool: {} resource(s) failed to close", .0.len())]
    ResourceErrors(Vec<E>),
    /// Resources were still checked out when the drain timeout elapsed
    #[error("closing resource pool timed out with {outstanding} resource(s) outstanding")]
    Timeout { outstanding: usize },
}

/// A configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot create a pool with no generator")]
    GeneratorRequired,
    #[error("failed to start the pool maintenance thread: {0}")]
    Spawn(#[from] std::io::Error),
}
