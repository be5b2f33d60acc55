//! Runtime configuration and result types.

use std::fmt;

use crate::core::{HeapStats, Value};

/// Words in the default arena.
pub const DEFAULT_HEAP_WORDS: usize = 1_000_000;
/// Upper bound of the scheduling quantum, in instructions.
pub const DEFAULT_MAX_QUANTUM: usize = 15;

/// Result of a run that reached `Done`.
#[derive(Debug)]
pub struct ExecResult {
    pub value: Value,
    pub output: String,
    pub heap: HeapStats,
}

/// What a run reports to the host: the final value or the fatal error's
/// message.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Finished(Value),
    Error(String),
}

impl Outcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Finished(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Finished(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Finished(v) => write!(f, "{v}"),
            Outcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Runtime configuration options.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    pub heap_words: usize,
    pub max_quantum: usize,
    /// Fixes the scheduler's quantum sequence; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Reject sends whose value type differs from the channel's first value.
    pub typed_channels: bool,
    /// Scheduling and collection events on stderr.
    pub trace: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heap_words: DEFAULT_HEAP_WORDS,
            max_quantum: DEFAULT_MAX_QUANTUM,
            seed: None,
            typed_channels: false,
            trace: trace_from_env(),
        }
    }
}

/// `GVM_TRACE=1` or `GVM_TRACE=true`.
pub fn trace_from_env() -> bool {
    std::env::var("GVM_TRACE")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
