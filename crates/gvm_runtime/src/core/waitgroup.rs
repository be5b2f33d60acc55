//! Wait-groups: a node whose single child is a private number node holding
//! the counter, plus a FIFO of waiting threads per wait-group.

use std::collections::VecDeque;

use super::heap::{Address, Heap, Roots, Tag};
use super::{FastHashMap, fast_map_new};
use crate::errors::VmError;
use crate::vm::ThreadId;

impl Heap {
    pub fn alloc_waitgroup(&mut self, roots: &dyn Roots) -> Result<Address, VmError> {
        let counter = self.alloc_number(0.0, roots)?;
        self.allocating.push(counter);
        let wg = self.allocate(Tag::WaitGroup, 2, roots);
        self.allocating.pop();
        let wg = wg?;
        self.set_child(wg, 1, counter);
        Ok(wg)
    }

    pub fn wg_count(&self, wg: Address) -> f64 {
        self.number(self.child(wg, 1)).unwrap_or(0.0)
    }

    pub(crate) fn set_wg_count(&mut self, wg: Address, n: f64) {
        let counter = self.child(wg, 1);
        self.set_number(counter, n);
    }
}

#[derive(Debug)]
pub struct WaitGroupRegistry {
    waiters: FastHashMap<Address, VecDeque<ThreadId>>,
}

impl Default for WaitGroupRegistry {
    fn default() -> Self {
        Self {
            waiters: fast_map_new(),
        }
    }
}

impl WaitGroupRegistry {
    pub fn reset(&mut self, wg: Address) {
        self.waiters.remove(&wg);
    }

    pub fn block(&mut self, wg: Address, t: ThreadId) {
        self.waiters.entry(wg).or_default().push_back(t);
    }

    pub fn has_waiters(&self, wg: Address) -> bool {
        self.waiters.get(&wg).is_some_and(|q| !q.is_empty())
    }

    /// Every waiter, oldest first.
    pub fn take_all(&mut self, wg: Address) -> Vec<ThreadId> {
        self.waiters
            .remove(&wg)
            .map(Vec::from)
            .unwrap_or_default()
    }
}
