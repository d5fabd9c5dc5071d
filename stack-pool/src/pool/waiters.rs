use std::collections::VecDeque;

use super::wait::WaitResponder;

/// The order in which parked acquisitions are served when a resource is
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaiterOrder {
    /// Serve the most recently parked waiter first. Under continuous churn
    /// this can starve long-waiting callers.
    Lifo,
    /// Serve the longest-waiting waiter first.
    Fifo,
}

impl Default for WaiterOrder {
    fn default() -> Self {
        Self::Lifo
    }
}

/// Outstanding acquisition requests awaiting a resource. New entries are
/// pushed to the front; `pop_unresolved` serves from the front (LIFO) or the
/// back (FIFO).
#[derive(Debug)]
pub struct WaiterQueue<R> {
    order: WaiterOrder,
    waiters: VecDeque<WaitResponder<R>>,
}

impl<R> WaiterQueue<R> {
    pub fn new(order: WaiterOrder) -> Self {
        Self {
            order,
            waiters: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn push(&mut self, waiter: WaitResponder<R>) {
        self.waiters.push_front(waiter);
    }

    /// Remove waiters in service order, discarding any already resolved,
    /// and return the first one still pending.
    pub fn pop_unresolved(&mut self) -> Option<WaitResponder<R>> {
        loop {
            let next = match self.order {
                WaiterOrder::Lifo => self.waiters.pop_front(),
                WaiterOrder::Fifo => self.waiters.pop_back(),
            }?;
            if !next.is_resolved() {
                break Some(next);
            }
        }
    }

    /// Drop resolved (timed out or cancelled) entries.
    pub fn prune(&mut self) -> usize {
        let before = self.waiters.len();
        self.waiters.retain(|waiter| !waiter.is_resolved());
        before - self.waiters.len()
    }

    /// Resolve every pending waiter with a closed-pool error.
    pub fn close_all(&mut self) -> usize {
        self.waiters
            .drain(..)
            .filter(|waiter| waiter.close())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::super::wait::waiter_pair;
    use super::*;
    use futures_lite::future::block_on;
    use std::sync::Arc;

    #[test]
    fn queue_lifo_skips_resolved() {
        let mut queue = WaiterQueue::<u32>::new(WaiterOrder::Lifo);
        let (r1, _w1) = waiter_pair();
        let (r2, _w2) = waiter_pair();
        let (r3, _w3) = waiter_pair();
        queue.push(r1.clone());
        queue.push(r2.clone());
        queue.push(r3.clone());
        assert_eq!(queue.len(), 3);

        r3.timeout();
        let next = queue.pop_unresolved().unwrap();
        next.send(Arc::new(1)).unwrap();
        assert!(r2.is_resolved());
        assert!(!r1.is_resolved());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn queue_fifo() {
        let mut queue = WaiterQueue::<u32>::new(WaiterOrder::Fifo);
        let (r1, w1) = waiter_pair();
        let (r2, _w2) = waiter_pair();
        queue.push(r1);
        queue.push(r2.clone());
        let next = queue.pop_unresolved().unwrap();
        next.send(Arc::new(4)).unwrap();
        assert_eq!(*block_on(w1).unwrap(), 4);
        assert!(!r2.is_resolved());
    }

    #[test]
    fn queue_prune_and_close() {
        let mut queue = WaiterQueue::<u32>::new(WaiterOrder::default());
        let (r1, _w1) = waiter_pair();
        let (r2, w2) = waiter_pair();
        queue.push(r1.clone());
        queue.push(r2);
        r1.timeout();
        assert_eq!(queue.prune(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.close_all(), 1);
        assert_eq!(queue.len(), 0);
        assert!(block_on(w2).is_err());
        assert!(queue.pop_unresolved().is_none());
    }
}
