//! Lowers a gvm syntax tree into the flat instruction array run by
//! `gvm_runtime`, rejecting programs the interpreter must never see.

mod compiler;
mod error;
mod scope;

pub use compiler::compile_program;
pub use error::CompileError;
