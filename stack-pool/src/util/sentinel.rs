use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

type DropFn<T> = Box<dyn Fn(&Arc<T>, usize) + Send + Sync>;

struct Shared<T> {
    value: Arc<T>,
    count: AtomicUsize,
    on_drop: DropFn<T>,
}

/// A cloneable handle around an `Arc<T>` which invokes a callback each time a
/// handle is dropped, passing the number of handles remaining. The callback
/// also runs during unwinding, so it can be used to record a thread exit.
pub struct Sentinel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Sentinel<T> {
    pub fn new<F>(value: Arc<T>, on_drop: F) -> Self
    where
        F: Fn(&Arc<T>, usize) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                value,
                count: AtomicUsize::new(1),
                on_drop: Box::new(on_drop),
            }),
        }
    }
}

impl<T> Clone for Sentinel<T> {
    fn clone(&self) -> Self {
        self.shared.count.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Deref for Sentinel<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &*self.shared.value
    }
}

impl<T> Debug for Sentinel<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sentinel")
            .field("count", &self.shared.count.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> Drop for Sentinel<T> {
    fn drop(&mut self) {
        let count = self.shared.count.fetch_sub(1, Ordering::AcqRel) - 1;
        (self.shared.on_drop)(&self.shared.value, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_counts_handles() {
        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let s = seen.clone();
        let fst = Sentinel::new(Arc::new(10u32), move |value, count| {
            assert_eq!(**value, 10);
            s.store(count, Ordering::SeqCst);
        });
        let snd = fst.clone();
        assert_eq!(*snd, 10);
        drop(fst);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        drop(snd);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
