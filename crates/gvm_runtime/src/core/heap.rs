//! Fixed arena of tagged nodes.
//!
//! The arena is a `Vec<u64>` carved into `NODE_SIZE`-word blocks. Word 0 of
//! every block is a header:
//!
//! ```text
//!  63            32 31        16 15     8 7      0
//! +----------------+------------+--------+--------+
//! |    payload     |    size    |  mark  |  tag   |
//! +----------------+------------+--------+--------+
//! ```
//!
//! `size` counts the words in use, header included. Child addresses live in
//! the remaining words; which words are children depends on the tag (see
//! `child_words`). Free blocks are linked through their payload.

use std::ops::Range;

use gvm_ir::NODE_SIZE;

use super::{FastHashMap, fast_map_new};
use crate::errors::VmError;

/// Word index of a node's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub usize);

impl Address {
    #[inline]
    pub(crate) fn word(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    pub(crate) fn from_word(w: u64) -> Self {
        Address(w as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Free = 0,
    False,
    True,
    Null,
    Unassigned,
    Undefined,
    Number,
    String,
    Closure,
    Frame,
    Environment,
    Blockframe,
    Callframe,
    Builtin,
    Channel,
    WaitGroup,
}

impl Tag {
    fn from_bits(b: u8) -> Tag {
        match b {
            1 => Tag::False,
            2 => Tag::True,
            3 => Tag::Null,
            4 => Tag::Unassigned,
            5 => Tag::Undefined,
            6 => Tag::Number,
            7 => Tag::String,
            8 => Tag::Closure,
            9 => Tag::Frame,
            10 => Tag::Environment,
            11 => Tag::Blockframe,
            12 => Tag::Callframe,
            13 => Tag::Builtin,
            14 => Tag::Channel,
            15 => Tag::WaitGroup,
            _ => Tag::Free,
        }
    }

    pub(crate) fn from_u8(b: u8) -> Option<Tag> {
        match Tag::from_bits(b) {
            Tag::Free if b != 0 => None,
            t => Some(t),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Free => "free",
            Tag::False | Tag::True => "bool",
            Tag::Null => "null",
            Tag::Unassigned => "unassigned",
            Tag::Undefined => "undefined",
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Closure => "closure",
            Tag::Frame => "frame",
            Tag::Environment => "environment",
            Tag::Blockframe => "blockframe",
            Tag::Callframe => "callframe",
            Tag::Builtin => "builtin",
            Tag::Channel => "channel",
            Tag::WaitGroup => "waitgroup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub tag: Tag,
    pub mark: u8,
    pub size: u16,
    pub payload: u32,
}

impl Header {
    #[inline]
    fn pack(self) -> u64 {
        (self.tag as u64) | ((self.mark as u64) << 8) | ((self.size as u64) << 16) | ((self.payload as u64) << 32)
    }

    #[inline]
    fn unpack(w: u64) -> Self {
        Header {
            tag: Tag::from_bits(w as u8),
            mark: (w >> 8) as u8,
            size: (w >> 16) as u16,
            payload: (w >> 32) as u32,
        }
    }
}

/// Terminates the free list.
const NIL: u32 = u32::MAX;

const SINGLETON_COUNT: usize = 5;

/// Anything that can enumerate GC roots. Allocation takes one so that a
/// collection triggered by exhaustion sees every live register.
pub trait Roots {
    fn for_each_root(&self, f: &mut dyn FnMut(Address));
}

/// No roots beyond the heap's own permanent region and allocating set.
pub struct NoRoots;

impl Roots for NoRoots {
    fn for_each_root(&self, _f: &mut dyn FnMut(Address)) {}
}

#[derive(Debug, Clone, Copy)]
pub struct Singletons {
    pub false_: Address,
    pub true_: Address,
    pub null: Address,
    pub unassigned: Address,
    pub undefined: Address,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub total_nodes: usize,
    pub free_nodes: usize,
    pub permanent_nodes: usize,
    pub collections: usize,
    pub last_freed: usize,
}

pub struct Heap {
    pub(crate) words: Vec<u64>,
    /// Node index of the first free block, or `NIL`.
    free: u32,
    free_count: usize,
    /// Nodes below this word index are never swept.
    pub(crate) bottom: usize,
    /// Text -> node, for interning.
    pub(crate) strings: FastHashMap<String, Address>,
    /// String id -> text. String nodes carry their id in word 1.
    texts: FastHashMap<u64, String>,
    next_string_id: u64,
    /// Half-built composites: children allocated before the parent that will
    /// link them. Treated as roots.
    pub(crate) allocating: Vec<Address>,
    singletons: Singletons,
    pub(crate) collections: usize,
    pub(crate) last_freed: usize,
    pub(crate) trace: bool,
}

impl Heap {
    /// Builds an arena of `words` words (rounded down to whole nodes) and
    /// allocates the canonical singletons at its start.
    pub fn new(words: usize) -> Result<Self, VmError> {
        let nodes = (words / NODE_SIZE).min(NIL as usize);
        if nodes < SINGLETON_COUNT {
            return Err(VmError::HeapExhausted);
        }
        let mut heap = Heap {
            words: vec![0; nodes * NODE_SIZE],
            free: NIL,
            free_count: 0,
            bottom: 0,
            strings: fast_map_new(),
            texts: fast_map_new(),
            next_string_id: 0,
            allocating: Vec::new(),
            singletons: Singletons {
                false_: Address(0),
                true_: Address(0),
                null: Address(0),
                unassigned: Address(0),
                undefined: Address(0),
            },
            collections: 0,
            last_freed: 0,
            trace: false,
        };
        for idx in (0..nodes).rev() {
            heap.push_free(idx);
        }
        heap.singletons = Singletons {
            false_: heap.allocate(Tag::False, 1, &NoRoots)?,
            true_: heap.allocate(Tag::True, 1, &NoRoots)?,
            null: heap.allocate(Tag::Null, 1, &NoRoots)?,
            unassigned: heap.allocate(Tag::Unassigned, 1, &NoRoots)?,
            undefined: heap.allocate(Tag::Undefined, 1, &NoRoots)?,
        };
        heap.seal();
        Ok(heap)
    }

    /// Marks everything allocated so far as permanent.
    pub fn seal(&mut self) {
        self.bottom = if self.free == NIL {
            self.words.len()
        } else {
            self.free as usize * NODE_SIZE
        };
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    #[inline]
    pub fn singletons(&self) -> Singletons {
        self.singletons
    }

    #[inline]
    pub fn undefined(&self) -> Address {
        self.singletons.undefined
    }

    #[inline]
    pub fn unassigned(&self) -> Address {
        self.singletons.unassigned
    }

    #[inline]
    pub fn null(&self) -> Address {
        self.singletons.null
    }

    #[inline]
    pub fn boolean(&self, b: bool) -> Address {
        if b { self.singletons.true_ } else { self.singletons.false_ }
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            total_nodes: self.words.len() / NODE_SIZE,
            free_nodes: self.free_count,
            permanent_nodes: self.bottom / NODE_SIZE,
            collections: self.collections,
            last_freed: self.last_freed,
        }
    }

    fn push_free(&mut self, idx: usize) {
        self.words[idx * NODE_SIZE] = Header {
            tag: Tag::Free,
            mark: 0,
            size: 0,
            payload: self.free,
        }
        .pack();
        self.free = idx as u32;
        self.free_count += 1;
    }

    fn pop_free(&mut self) -> Option<Address> {
        if self.free == NIL {
            return None;
        }
        let addr = Address(self.free as usize * NODE_SIZE);
        self.free = self.header(addr).payload;
        self.free_count -= 1;
        Some(addr)
    }

    /// Allocates a node of `size` words, collecting once if the free list is
    /// empty. Every word after the header starts out as the unassigned
    /// singleton so a collection never reads an uninitialised child.
    pub fn allocate(&mut self, tag: Tag, size: usize, roots: &dyn Roots) -> Result<Address, VmError> {
        if size == 0 || size > NODE_SIZE {
            return Err(VmError::NodeTooLarge(size));
        }
        let addr = match self.pop_free() {
            Some(a) => a,
            None => {
                self.collect(roots);
                self.pop_free().ok_or(VmError::HeapExhausted)?
            }
        };
        self.words[addr.0] = Header {
            tag,
            mark: 0,
            size: size as u16,
            payload: 0,
        }
        .pack();
        let filler = self.singletons.unassigned.word();
        for w in &mut self.words[addr.0 + 1..addr.0 + size] {
            *w = filler;
        }
        Ok(addr)
    }

    #[inline]
    pub(crate) fn header(&self, a: Address) -> Header {
        Header::unpack(self.words[a.0])
    }

    #[inline]
    pub(crate) fn set_header(&mut self, a: Address, h: Header) {
        self.words[a.0] = h.pack();
    }

    #[inline]
    pub fn tag(&self, a: Address) -> Tag {
        self.header(a).tag
    }

    #[inline]
    pub(crate) fn size(&self, a: Address) -> usize {
        self.header(a).size as usize
    }

    #[inline]
    pub(crate) fn payload(&self, a: Address) -> u32 {
        self.header(a).payload
    }

    #[inline]
    pub(crate) fn set_payload(&mut self, a: Address, payload: u32) {
        let mut h = self.header(a);
        h.payload = payload;
        self.set_header(a, h);
    }

    /// Raw word `i` (1-based, word 0 is the header).
    #[inline]
    pub(crate) fn word(&self, a: Address, i: usize) -> u64 {
        self.words[a.0 + i]
    }

    #[inline]
    pub(crate) fn set_word(&mut self, a: Address, i: usize, w: u64) {
        self.words[a.0 + i] = w;
    }

    #[inline]
    pub(crate) fn child(&self, a: Address, i: usize) -> Address {
        Address::from_word(self.word(a, i))
    }

    #[inline]
    pub(crate) fn set_child(&mut self, a: Address, i: usize, child: Address) {
        self.set_word(a, i, child.word());
    }

    /// Words of `a` that hold child addresses.
    pub(crate) fn child_words(&self, a: Address) -> Range<usize> {
        let h = self.header(a);
        let size = h.size as usize;
        match h.tag {
            Tag::Closure => 2..3,
            Tag::Callframe | Tag::Blockframe | Tag::WaitGroup => 1..2,
            Tag::Frame | Tag::Environment => 1..size,
            Tag::Channel => 4..size,
            _ => 0..0,
        }
    }

    #[inline]
    pub(crate) fn is_marked(&self, a: Address) -> bool {
        self.header(a).mark != 0
    }

    #[inline]
    pub(crate) fn set_mark(&mut self, a: Address, on: bool) {
        let mut h = self.header(a);
        h.mark = on as u8;
        self.set_header(a, h);
    }

    pub fn is_permanent(&self, a: Address) -> bool {
        a.0 < self.bottom
    }

    // ---- numbers ---------------------------------------------------------

    pub fn alloc_number(&mut self, n: f64, roots: &dyn Roots) -> Result<Address, VmError> {
        let a = self.allocate(Tag::Number, 2, roots)?;
        self.set_word(a, 1, n.to_bits());
        Ok(a)
    }

    #[inline]
    pub fn number(&self, a: Address) -> Option<f64> {
        match self.tag(a) {
            Tag::Number => Some(f64::from_bits(self.word(a, 1))),
            _ => None,
        }
    }

    /// Overwrites a number node in place. Only for numbers owned by a single
    /// composite, such as a wait-group counter.
    pub(crate) fn set_number(&mut self, a: Address, n: f64) {
        self.set_word(a, 1, n.to_bits());
    }

    #[inline]
    pub fn as_bool(&self, a: Address) -> Option<bool> {
        match self.tag(a) {
            Tag::True => Some(true),
            Tag::False => Some(false),
            _ => None,
        }
    }

    // ---- strings ---------------------------------------------------------

    /// Interns `s`: identical strings share one node.
    pub fn alloc_string(&mut self, s: &str, roots: &dyn Roots) -> Result<Address, VmError> {
        if let Some(&a) = self.strings.get(s) {
            return Ok(a);
        }
        let a = self.allocate(Tag::String, 2, roots)?;
        let id = self.next_string_id;
        self.next_string_id += 1;
        self.set_word(a, 1, id);
        self.strings.insert(s.to_string(), a);
        self.texts.insert(id, s.to_string());
        Ok(a)
    }

    pub fn string(&self, a: Address) -> Option<&str> {
        if self.tag(a) != Tag::String {
            return None;
        }
        self.texts.get(&self.word(a, 1)).map(String::as_str)
    }

    /// Number of live interned strings.
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub(crate) fn evict_string(&mut self, a: Address) {
        if let Some(text) = self.texts.remove(&self.word(a, 1)) {
            if self.strings.get(&text) == Some(&a) {
                self.strings.remove(&text);
            }
        }
    }

    // ---- sweep support ---------------------------------------------------

    /// Rebuilds the free list from every unmarked block at or above the
    /// bottom, lowest address first, and clears all marks.
    pub(crate) fn rebuild_free_list(&mut self) -> usize {
        let nodes = self.words.len() / NODE_SIZE;
        let first = self.bottom / NODE_SIZE;
        for idx in 0..first {
            self.set_mark(Address(idx * NODE_SIZE), false);
        }
        self.free = NIL;
        self.free_count = 0;
        let mut freed = 0;
        for idx in (first..nodes).rev() {
            let a = Address(idx * NODE_SIZE);
            let h = self.header(a);
            if h.mark != 0 {
                self.set_mark(a, false);
                continue;
            }
            match h.tag {
                Tag::Free => {}
                Tag::String => {
                    self.evict_string(a);
                    freed += 1;
                }
                _ => freed += 1,
            }
            self.push_free(idx);
        }
        freed
    }
}
