//! The register machine: thread registers, the machine state shared by all
//! threads, and the instruction dispatch.

mod dispatch;
pub(crate) mod ops;
mod registers;

use std::fmt;

pub(crate) use dispatch::step;
pub use registers::Registers;

use crate::builtins_registry::BuiltinRegistry;
use crate::core::channel::ChannelRegistry;
use crate::core::waitgroup::WaitGroupRegistry;
use crate::core::{Address, FastHashMap, Heap, NoRoots, Roots, Tag, fast_map_new};
use crate::errors::VmError;
use crate::runtime::RuntimeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub const MAIN_THREAD: ThreadId = ThreadId(0);

/// What the scheduler does after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The running thread queued itself on a channel or wait-group.
    Block,
    /// The running thread finished its goroutine.
    Exit,
    /// The main thread reached `Done`; the run is over.
    Finish(Address),
}

/// Roots of a running machine: the live registers plus every suspended
/// thread's snapshot.
struct RootSet<'a> {
    regs: &'a Registers,
    threads: &'a FastHashMap<ThreadId, Registers>,
}

impl Roots for RootSet<'_> {
    fn for_each_root(&self, f: &mut dyn FnMut(Address)) {
        self.regs.for_each_root(f);
        for regs in self.threads.values() {
            regs.for_each_root(f);
        }
    }
}

pub struct Machine {
    pub heap: Heap,
    /// Registers of the running thread.
    pub regs: Registers,
    pub current: ThreadId,
    /// Snapshots of every thread that is not running.
    pub(crate) threads: FastHashMap<ThreadId, Registers>,
    next_thread: u64,
    pub(crate) channels: ChannelRegistry,
    pub(crate) waitgroups: WaitGroupRegistry,
    /// Threads spawned or woken by the last instruction, in order.
    pub(crate) runnable: Vec<ThreadId>,
    pub(crate) builtins: BuiltinRegistry,
    pub output: String,
    typed_channels: bool,
    trace: bool,
}

impl Machine {
    /// Allocates the singletons, the builtins frame and the global
    /// environment, seals them as permanent and points the main thread's
    /// registers at the global environment.
    pub fn new(config: &RuntimeConfig, builtins: BuiltinRegistry) -> Result<Self, VmError> {
        let mut heap = Heap::new(config.heap_words)?;
        heap.set_trace(config.trace);

        let frame = heap.new_frame(builtins.len(), &NoRoots)?;
        heap.allocating.push(frame);
        for id in 0..builtins.len() {
            let b = heap.allocate(Tag::Builtin, 1, &NoRoots)?;
            heap.set_payload(b, id as u32);
            heap.init_slot(frame, id, b);
        }
        let global = heap.allocate(Tag::Environment, 2, &NoRoots)?;
        heap.set_child(global, 1, frame);
        heap.allocating.clear();
        heap.seal();

        Ok(Self {
            heap,
            regs: Registers::new(global),
            current: MAIN_THREAD,
            threads: fast_map_new(),
            next_thread: MAIN_THREAD.0 + 1,
            channels: ChannelRegistry::default(),
            waitgroups: WaitGroupRegistry::default(),
            runnable: Vec::new(),
            builtins,
            output: String::new(),
            typed_channels: config.typed_channels,
            trace: config.trace,
        })
    }

    #[inline]
    pub(crate) fn trace_on(&self) -> bool {
        self.trace
    }

    #[inline]
    pub(crate) fn typed_channels(&self) -> bool {
        self.typed_channels
    }

    /// Runs `f` with the heap and the machine's current root set.
    pub(crate) fn with_roots<R>(&mut self, f: impl FnOnce(&mut Heap, &dyn Roots) -> R) -> R {
        let roots = RootSet {
            regs: &self.regs,
            threads: &self.threads,
        };
        f(&mut self.heap, &roots)
    }

    pub(crate) fn alloc(&mut self, tag: Tag, size: usize) -> Result<Address, VmError> {
        self.with_roots(|heap, roots| heap.allocate(tag, size, roots))
    }

    pub(crate) fn alloc_number(&mut self, n: f64) -> Result<Address, VmError> {
        self.with_roots(|heap, roots| heap.alloc_number(n, roots))
    }

    pub(crate) fn alloc_string(&mut self, s: &str) -> Result<Address, VmError> {
        self.with_roots(|heap, roots| heap.alloc_string(s, roots))
    }

    /// Forces a collection with the machine's roots.
    pub fn collect(&mut self) {
        self.with_roots(|heap, roots| heap.collect(roots));
    }

    // ---- operand stack ----------------------------------------------------

    #[inline]
    pub(crate) fn push(&mut self, a: Address) {
        self.regs.os.push(a);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Result<Address, VmError> {
        self.regs.os.pop().ok_or(VmError::StackUnderflow)
    }

    /// The value `depth` entries below the top, left in place.
    #[inline]
    pub(crate) fn peek(&self, depth: usize) -> Result<Address, VmError> {
        let len = self.regs.os.len();
        if depth >= len {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.regs.os[len - 1 - depth])
    }

    pub(crate) fn drop_n(&mut self, n: usize) -> Result<(), VmError> {
        let len = self.regs.os.len();
        if n > len {
            return Err(VmError::StackUnderflow);
        }
        self.regs.os.truncate(len - n);
        Ok(())
    }

    // ---- threads ----------------------------------------------------------

    /// Registers a new thread. It is rooted from here on and becomes
    /// runnable once the current instruction completes.
    pub(crate) fn spawn(&mut self, regs: Registers) -> ThreadId {
        let id = ThreadId(self.next_thread);
        self.next_thread += 1;
        self.threads.insert(id, regs);
        self.runnable.push(id);
        if self.trace {
            eprintln!("[gvm] spawn {id} from {}", self.current);
        }
        id
    }

    pub(crate) fn wake(&mut self, t: ThreadId) {
        if self.trace {
            eprintln!("[gvm] wake {t}");
        }
        self.runnable.push(t);
    }

    /// Saves the running thread's registers into the thread table.
    pub(crate) fn suspend(&mut self) {
        let regs = std::mem::replace(&mut self.regs, Registers::new(self.heap.undefined()));
        self.threads.insert(self.current, regs);
    }

    /// Discards the running thread.
    pub(crate) fn retire(&mut self) {
        self.regs = Registers::new(self.heap.undefined());
    }

    pub(crate) fn resume(&mut self, t: ThreadId) -> Result<(), VmError> {
        self.regs = self.threads.remove(&t).ok_or(VmError::NoThreads)?;
        self.current = t;
        Ok(())
    }
}
