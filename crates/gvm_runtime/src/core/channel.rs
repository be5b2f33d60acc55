//! Ring-buffer channels and their blocking queues.
//!
//! Layout: payload bit 0 is the unbuffered flag, bits 8..16 the element tag
//! recorded by typed channels (`NO_ITEM_TAG` until the first send). Word 1 is
//! the slot count, word 2 the write pointer, word 3 the read pointer, slots
//! start at word 4. An empty slot holds `EMPTY_SLOT`, which is never a valid
//! address.

use std::collections::VecDeque;

use gvm_ir::NODE_SIZE;

use super::heap::{Address, Heap, Roots, Tag};
use super::{FastHashMap, fast_map_new};
use crate::errors::VmError;
use crate::vm::ThreadId;

pub const MAX_CHANNEL_CAPACITY: usize = NODE_SIZE - 4;
pub(crate) const EMPTY_SLOT: u64 = u64::MAX;

const UNBUFFERED: u32 = 1;
const NO_ITEM_TAG: u8 = 0xFF;
const SLOTS: usize = 4;

impl Heap {
    /// Capacity 0 gives an unbuffered channel backed by a single slot.
    pub fn alloc_channel(&mut self, capacity: usize, roots: &dyn Roots) -> Result<Address, VmError> {
        if capacity > MAX_CHANNEL_CAPACITY {
            return Err(VmError::ChannelCapacity(capacity));
        }
        let slots = capacity.max(1);
        let a = self.allocate(Tag::Channel, SLOTS + slots, roots)?;
        let flags = if capacity == 0 { UNBUFFERED } else { 0 };
        self.set_payload(a, flags | ((NO_ITEM_TAG as u32) << 8));
        self.set_word(a, 1, slots as u64);
        self.set_word(a, 2, 0);
        self.set_word(a, 3, 0);
        for i in 0..slots {
            self.set_word(a, SLOTS + i, EMPTY_SLOT);
        }
        Ok(a)
    }

    #[inline]
    fn chan_slots(&self, ch: Address) -> usize {
        self.word(ch, 1) as usize
    }

    pub fn chan_unbuffered(&self, ch: Address) -> bool {
        self.payload(ch) & UNBUFFERED != 0
    }

    pub fn chan_is_full(&self, ch: Address) -> bool {
        let w = self.word(ch, 2) as usize;
        self.word(ch, SLOTS + w) != EMPTY_SLOT
    }

    pub fn chan_is_empty(&self, ch: Address) -> bool {
        let r = self.word(ch, 3) as usize;
        self.word(ch, SLOTS + r) == EMPTY_SLOT
    }

    /// Number of values buffered.
    pub fn chan_len(&self, ch: Address) -> usize {
        (0..self.chan_slots(ch))
            .filter(|i| self.word(ch, SLOTS + i) != EMPTY_SLOT)
            .count()
    }

    /// Caller checks `chan_is_full` first.
    pub fn chan_push(&mut self, ch: Address, v: Address) {
        let w = self.word(ch, 2) as usize;
        self.set_child(ch, SLOTS + w, v);
        self.set_word(ch, 2, ((w + 1) % self.chan_slots(ch)) as u64);
    }

    /// Caller checks `chan_is_empty` first.
    pub fn chan_pop(&mut self, ch: Address) -> Address {
        let r = self.word(ch, 3) as usize;
        let v = self.child(ch, SLOTS + r);
        self.set_word(ch, SLOTS + r, EMPTY_SLOT);
        self.set_word(ch, 3, ((r + 1) % self.chan_slots(ch)) as u64);
        v
    }

    pub(crate) fn chan_item_tag(&self, ch: Address) -> Option<Tag> {
        match (self.payload(ch) >> 8) as u8 {
            NO_ITEM_TAG => None,
            t => Tag::from_u8(t),
        }
    }

    pub(crate) fn set_chan_item_tag(&mut self, ch: Address, tag: Tag) {
        let p = self.payload(ch) & !(0xFF << 8);
        self.set_payload(ch, p | ((tag as u32) << 8));
    }
}

#[derive(Default, Debug)]
struct Waiters {
    readers: VecDeque<ThreadId>,
    writers: VecDeque<ThreadId>,
    /// Unbuffered senders whose value is in the slot, waiting for a reader.
    handoff: VecDeque<ThreadId>,
}

/// Threads blocked on channels, keyed by channel address.
#[derive(Debug)]
pub struct ChannelRegistry {
    map: FastHashMap<Address, Waiters>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self { map: fast_map_new() }
    }
}

impl ChannelRegistry {
    /// Forgets whatever was queued at a recycled address.
    pub fn reset(&mut self, ch: Address) {
        self.map.remove(&ch);
    }

    pub fn block_reader(&mut self, ch: Address, t: ThreadId) {
        self.map.entry(ch).or_default().readers.push_back(t);
    }

    pub fn block_writer(&mut self, ch: Address, t: ThreadId) {
        self.map.entry(ch).or_default().writers.push_back(t);
    }

    pub fn park_sender(&mut self, ch: Address, t: ThreadId) {
        self.map.entry(ch).or_default().handoff.push_back(t);
    }

    pub fn take_reader(&mut self, ch: Address) -> Option<ThreadId> {
        self.map.get_mut(&ch)?.readers.pop_front()
    }

    pub fn take_writer(&mut self, ch: Address) -> Option<ThreadId> {
        self.map.get_mut(&ch)?.writers.pop_front()
    }

    pub fn take_sender(&mut self, ch: Address) -> Option<ThreadId> {
        self.map.get_mut(&ch)?.handoff.pop_front()
    }

    pub fn blocked_on(&self, ch: Address) -> usize {
        self.map
            .get(&ch)
            .map_or(0, |w| w.readers.len() + w.writers.len() + w.handoff.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiters_drain_in_arrival_order() {
        let ch = Address(40);
        let mut reg = ChannelRegistry::default();
        reg.block_reader(ch, ThreadId(1));
        reg.block_reader(ch, ThreadId(2));
        reg.park_sender(ch, ThreadId(3));
        assert_eq!(reg.blocked_on(ch), 3);

        assert_eq!(reg.take_reader(ch), Some(ThreadId(1)));
        assert_eq!(reg.take_sender(ch), Some(ThreadId(3)));
        assert_eq!(reg.take_reader(ch), Some(ThreadId(2)));
        assert_eq!(reg.blocked_on(ch), 0);
        assert_eq!(reg.take_writer(ch), None);

        reg.block_writer(ch, ThreadId(4));
        reg.reset(ch);
        assert_eq!(reg.blocked_on(ch), 0);
    }
}
