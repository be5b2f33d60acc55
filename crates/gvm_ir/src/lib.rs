//! Instruction set, syntax tree and builtin table shared by the gvm
//! compiler and runtime.

mod ast;
mod builtins;
mod bytecode;

pub use ast::*;
pub use builtins::*;
pub use bytecode::*;
