//! gvm runtime: a fixed-arena heap with a mark-sweep collector, a register
//! machine for the instruction set in `gvm_ir`, and a cooperative scheduler
//! that multiplexes goroutines over channels and wait-groups.

#![allow(clippy::new_without_default)]

pub mod core;
pub mod errors;
pub mod scheduler;
pub mod vm;

mod builtins;
pub mod builtins_registry;
mod runtime;

pub use crate::core::heap;
pub use crate::core::{Address, Heap, HeapStats, NoRoots, Roots, Tag, Value};

pub use vm::{MAIN_THREAD, Machine, Registers, Step, ThreadId};

pub use builtins_registry::{Builtin, BuiltinFn, builtin_fn, BuiltinProvider, BuiltinRegistry, StdBuiltinProvider};
pub use errors::VmError;
pub use gvm_ir::{Op, Program};

pub use runtime::{
    DEFAULT_HEAP_WORDS, DEFAULT_MAX_QUANTUM, ExecResult, Outcome, Runtime, RuntimeConfig, run_program,
    trace_from_env,
};
pub use crate::core::channel::MAX_CHANNEL_CAPACITY;
