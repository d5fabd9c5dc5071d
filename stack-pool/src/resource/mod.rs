use std::fmt::Debug;

mod set;
pub use set::ResourceSet;

/// A pooled object exposing a liveness probe and a teardown operation.
///
/// The pool shares each resource as an `Arc<R>`, so both operations take
/// `&self`. Resource identity within the pool is pointer identity.
pub trait Resource: Send + Sync + 'static {
    /// The error type produced by the probe and teardown operations
    type Error: Debug + Send + 'static;

    /// Check whether the resource can still be handed out. `Ok(false)`
    /// causes the pool to replace it with a freshly generated instance.
    fn alive(&self) -> Result<bool, Self::Error>;

    /// Tear down the resource. Called by the pool at most once per instance.
    fn close(&self) -> Result<(), Self::Error>;
}

/// A factory producing new resource instances on demand.
pub type Generator<R> = Box<dyn Fn() -> R + Send + Sync>;
