//! Runtime error type and the message constants shared by the opcode
//! handlers.

use thiserror::Error;

use gvm_ir::NODE_SIZE;

use crate::core::channel::MAX_CHANNEL_CAPACITY;

pub mod messages {
    pub const NOT_A_BOOL: &str = "Not a bool";
    pub const NOT_A_NUMBER: &str = "Not a number";
    pub const NOT_A_STRING: &str = "Not a string";
    pub const NOT_A_CHANNEL: &str = "Not a channel";
    pub const NOT_A_WAITGROUP: &str = "Not a WaitGroup";
    pub const NOT_A_BLOCKFRAME: &str = "Scope exit without a matching block frame";
    pub const BAD_OPERANDS: &str = "Invalid operands for";
    pub const UNBOXABLE: &str = "Value cannot be placed on the heap";
}

/// Every runtime failure is fatal: the run stops and the message is
/// reported as the outcome.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("access of unassigned variable")]
    UnassignedAccess,
    #[error("heap memory exhausted")]
    HeapExhausted,
    #[error("node of {0} words exceeds the node size of {}", NODE_SIZE)]
    NodeTooLarge(usize),
    #[error("all goroutines are asleep - deadlock!")]
    Deadlock,
    #[error("break or continue outside of a loop")]
    OutsideLoop,
    #[error("sync: negative WaitGroup counter")]
    NegativeWaitGroup,
    #[error("sync: WaitGroup misuse: Add called concurrently with Wait")]
    WaitGroupMisuse,
    #[error("channel capacity {0} exceeds the maximum of {}", MAX_CHANNEL_CAPACITY)]
    ChannelCapacity(usize),
    #[error("channel item type mismatch: expected {expected}, got {got}")]
    ChannelItemType { expected: String, got: String },
    #[error("{0}")]
    Type(String),
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("return stack underflow")]
    ReturnStackUnderflow,
    #[error("invalid variable position ({frame}, {slot})")]
    InvalidPosition { frame: usize, slot: usize },
    #[error("not a function: {0}")]
    NotCallable(String),
    #[error("unknown builtin #{0}")]
    UnknownBuiltin(usize),
    #[error("no threads left to run")]
    NoThreads,
}

impl VmError {
    pub(crate) fn type_error(msg: &str, detail: impl std::fmt::Display) -> Self {
        VmError::Type(format!("{msg}: {detail}"))
    }
}
