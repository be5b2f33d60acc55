//! Drives a program: builds the machine, then alternates between running
//! a thread for its quantum and asking the scheduler for the next one.

mod config;

pub use config::{
    DEFAULT_HEAP_WORDS, DEFAULT_MAX_QUANTUM, ExecResult, Outcome, RuntimeConfig, trace_from_env,
};

use gvm_ir::Program;

use crate::builtins_registry::{BuiltinProvider, BuiltinRegistry, StdBuiltinProvider};
use crate::core::{Address, HeapStats};
use crate::errors::VmError;
use crate::scheduler::Scheduler;
use crate::vm::{self, Machine, Step};

/// Why a thread stopped running.
enum SliceEnd {
    Expired,
    Blocked,
    Exited,
    Finished(Address),
}

pub struct Runtime {
    config: RuntimeConfig,
    output: String,
    heap_stats: Option<HeapStats>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            output: String::new(),
            heap_stats: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
    }

    pub fn set_heap_words(&mut self, words: usize) {
        self.config.heap_words = words;
    }

    pub fn set_max_quantum(&mut self, quantum: usize) {
        self.config.max_quantum = quantum;
    }

    pub fn set_typed_channels(&mut self, on: bool) {
        self.config.typed_channels = on;
    }

    pub fn set_trace(&mut self, on: bool) {
        self.config.trace = on;
    }

    /// Output written by the last run, including a run that failed.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Heap statistics at the end of the last run.
    pub fn heap_stats(&self) -> Option<HeapStats> {
        self.heap_stats
    }

    pub fn run(&mut self, program: &Program) -> Result<ExecResult, VmError> {
        let mut builtins = BuiltinRegistry::new();
        StdBuiltinProvider.install(&mut builtins);
        let mut m = Machine::new(&self.config, builtins)?;
        let mut sched = Scheduler::new(self.config.max_quantum, self.config.seed);
        sched.set_trace(self.config.trace);

        let result = drive(&mut m, &mut sched, program);
        self.output = std::mem::take(&mut m.output);
        self.heap_stats = Some(m.heap.stats());
        if self.config.trace {
            if let Err(e) = &result {
                eprintln!("[gvm] stopped: {e}");
            }
        }
        let value = result?;
        Ok(ExecResult {
            value: m.heap.to_value(value),
            output: self.output.clone(),
            heap: m.heap.stats(),
        })
    }

    /// `run`, with the error folded into the outcome.
    pub fn execute(&mut self, program: &Program) -> Outcome {
        match self.run(program) {
            Ok(r) => Outcome::Finished(r.value),
            Err(e) => Outcome::Error(e.to_string()),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `program` with the default configuration.
pub fn run_program(program: &Program) -> Outcome {
    Runtime::new().execute(program)
}

fn drive(m: &mut Machine, sched: &mut Scheduler, program: &Program) -> Result<Address, VmError> {
    m.suspend();
    sched.make_ready(m.current);
    loop {
        let t = sched.schedule_next()?;
        m.resume(t)?;
        match run_slice(m, sched, program)? {
            SliceEnd::Expired => {
                m.suspend();
                sched.suspend_current();
            }
            SliceEnd::Blocked => {
                m.suspend();
                sched.block_current();
            }
            SliceEnd::Exited => {
                m.retire();
                sched.kill_current();
            }
            SliceEnd::Finished(value) => return Ok(value),
        }
    }
}

/// Runs the resumed thread until it blocks, exits, or uses up its quantum
/// while another thread is ready. With nobody waiting it gets a fresh
/// quantum instead.
fn run_slice(m: &mut Machine, sched: &mut Scheduler, program: &Program) -> Result<SliceEnd, VmError> {
    let mut left = sched.draw_quantum();
    loop {
        let step = vm::step(m, program)?;
        for t in m.runnable.drain(..) {
            sched.make_ready(t);
        }
        match step {
            Step::Continue => {
                left -= 1;
                if left == 0 {
                    if sched.has_ready() {
                        return Ok(SliceEnd::Expired);
                    }
                    left = sched.draw_quantum();
                }
            }
            Step::Block => return Ok(SliceEnd::Blocked),
            Step::Exit => return Ok(SliceEnd::Exited),
            Step::Finish(value) => return Ok(SliceEnd::Finished(value)),
        }
    }
}
