//! Cooperative round-robin over logical threads with a randomized quantum.
//!
//! Each thread is ready (queued FIFO), running (at most one), or blocked.
//! The scheduler only tracks ids; registers live in the machine's thread
//! table.

use std::collections::VecDeque;

use crate::core::{FastHashSet, fast_set_new};
use crate::errors::VmError;
use crate::vm::ThreadId;

pub struct Scheduler {
    ready: VecDeque<ThreadId>,
    blocked: FastHashSet<ThreadId>,
    running: Option<ThreadId>,
    rng: fastrand::Rng,
    max_quantum: usize,
    trace: bool,
}

impl Scheduler {
    /// `seed` fixes the quantum sequence; `None` seeds from entropy.
    pub fn new(max_quantum: usize, seed: Option<u64>) -> Self {
        Self {
            ready: VecDeque::new(),
            blocked: fast_set_new(),
            running: None,
            rng: seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
            max_quantum: max_quantum.max(1),
            trace: false,
        }
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    /// Instructions the next thread may run: uniform in
    /// `[ceil(max / 2), max]`.
    pub fn draw_quantum(&mut self) -> usize {
        let lo = self.max_quantum.div_ceil(2);
        self.rng.usize(lo..=self.max_quantum)
    }

    /// Queues a new thread, or a blocked one whose condition was satisfied.
    pub fn make_ready(&mut self, t: ThreadId) {
        if self.running == Some(t) || self.ready.contains(&t) {
            return;
        }
        self.blocked.remove(&t);
        self.ready.push_back(t);
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    pub fn running(&self) -> Option<ThreadId> {
        self.running
    }

    /// Moves the head of the ready queue to running. With nothing ready
    /// and threads still blocked, no thread can ever run again.
    pub fn schedule_next(&mut self) -> Result<ThreadId, VmError> {
        match self.ready.pop_front() {
            Some(t) => {
                self.running = Some(t);
                if self.trace {
                    eprintln!("[gvm] switch to {t} ({} ready, {} blocked)", self.ready.len(), self.blocked.len());
                }
                Ok(t)
            }
            None if !self.blocked.is_empty() => Err(VmError::Deadlock),
            None => Err(VmError::NoThreads),
        }
    }

    /// Quantum expired: back of the ready queue.
    pub fn suspend_current(&mut self) {
        if let Some(t) = self.running.take() {
            self.ready.push_back(t);
        }
    }

    pub fn block_current(&mut self) {
        if let Some(t) = self.running.take() {
            if self.trace {
                eprintln!("[gvm] block {t}");
            }
            self.blocked.insert(t);
        }
    }

    pub fn kill_current(&mut self) {
        if let Some(t) = self.running.take() {
            if self.trace {
                eprintln!("[gvm] exit {t}");
            }
        }
    }
}
