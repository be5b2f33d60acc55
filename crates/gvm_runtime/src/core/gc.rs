//! Mark-sweep collection over the fixed arena.

use super::heap::{Address, Heap, Roots, Tag};

const EMPTY_SLOT: u64 = super::channel::EMPTY_SLOT;

impl Heap {
    /// Full collection. Roots are whatever `roots` reports, the allocating
    /// set, and every live node in the permanent region (the global frame is
    /// mutable, so what it points to must be traced).
    pub fn collect(&mut self, roots: &dyn Roots) {
        let mut pending: Vec<Address> = Vec::with_capacity(64);
        roots.for_each_root(&mut |a| pending.push(a));
        pending.extend(self.allocating.iter().copied());
        let node = gvm_ir::NODE_SIZE;
        let mut a = 0;
        while a < self.bottom {
            if self.tag(Address(a)) != Tag::Free {
                pending.push(Address(a));
            }
            a += node;
        }
        self.mark(pending);
        let freed = self.rebuild_free_list();
        self.collections += 1;
        self.last_freed = freed;
        if self.trace {
            let stats = self.stats();
            eprintln!(
                "gc #{}: freed {} nodes, {} of {} free",
                self.collections, freed, stats.free_nodes, stats.total_nodes
            );
        }
    }

    fn mark(&mut self, mut pending: Vec<Address>) {
        while let Some(a) = pending.pop() {
            if a.0 >= self.words.len() || self.is_marked(a) {
                continue;
            }
            self.set_mark(a, true);
            for i in self.child_words(a) {
                let w = self.word(a, i);
                if w != EMPTY_SLOT {
                    pending.push(Address::from_word(w));
                }
            }
        }
    }
}
