use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// An ordered stack of shared resources. The most recently pushed entry is
/// the top of the stack and the first to be popped.
pub struct ResourceSet<R> {
    items: Vec<Arc<R>>,
}

impl<R> ResourceSet<R> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, res: Arc<R>) {
        self.items.push(res);
    }

    pub fn pop(&mut self) -> Option<Arc<R>> {
        self.items.pop()
    }

    /// Find the position of a specific instance, compared by pointer.
    pub fn index_of(&self, res: &Arc<R>) -> Option<usize> {
        self.items.iter().position(|item| Arc::ptr_eq(item, res))
    }

    pub fn contains(&self, res: &Arc<R>) -> bool {
        self.index_of(res).is_some()
    }

    pub fn remove(&mut self, idx: usize) -> Arc<R> {
        self.items.remove(idx)
    }

    /// Remove a specific instance if present.
    pub fn take(&mut self, res: &Arc<R>) -> Option<Arc<R>> {
        self.index_of(res).map(|idx| self.remove(idx))
    }

    /// Remove every entry, top of the stack first.
    pub fn drain(&mut self) -> impl Iterator<Item = Arc<R>> + '_ {
        self.items.drain(..).rev()
    }
}

impl<R> Debug for ResourceSet<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_stack_order() {
        let mut set = ResourceSet::with_capacity(3);
        let (a, b, c) = (Arc::new(1), Arc::new(2), Arc::new(3));
        set.push(a.clone());
        set.push(b.clone());
        set.push(c.clone());
        assert_eq!(set.len(), 3);
        assert!(Arc::ptr_eq(&set.pop().unwrap(), &c));
        assert!(Arc::ptr_eq(&set.pop().unwrap(), &b));
        set.push(c.clone());
        assert!(Arc::ptr_eq(&set.pop().unwrap(), &c));
        assert!(Arc::ptr_eq(&set.pop().unwrap(), &a));
        assert!(set.pop().is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn set_identity_lookup() {
        let mut set = ResourceSet::with_capacity(3);
        let a = Arc::new(1);
        let b = Arc::new(2);
        // equal value, different instance
        let other = Arc::new(1);
        set.push(a.clone());
        set.push(b.clone());
        assert_eq!(set.index_of(&a), Some(0));
        assert_eq!(set.index_of(&b), Some(1));
        assert_eq!(set.index_of(&other), None);
        assert!(!set.contains(&other));

        let removed = set.remove(0);
        assert!(Arc::ptr_eq(&removed, &a));
        assert_eq!(set.index_of(&b), Some(0));
        assert!(set.take(&a).is_none());
        assert!(set.take(&b).is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn set_drain_top_first() {
        let mut set = ResourceSet::with_capacity(2);
        set.push(Arc::new(1));
        set.push(Arc::new(2));
        let drained: Vec<i32> = set.drain().map(|r| *r).collect();
        assert_eq!(drained, vec![2, 1]);
        assert!(set.is_empty());
    }
}
