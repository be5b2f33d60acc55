use thiserror::Error;

/// Static errors. A program that fails here never reaches the interpreter.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("undefined identifier: {0}")]
    UndefinedIdentifier(String),
    #[error("cannot assign to constant {0}")]
    AssignToConstant(String),
    #[error("{0} redeclared in this block")]
    Redeclared(String),
    #[error("break is not in a loop")]
    BreakOutsideLoop,
    #[error("continue is not in a loop")]
    ContinueOutsideLoop,
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("too many locals in one scope: {count} (limit {limit})")]
    TooManyLocals { count: usize, limit: usize },
    #[error("scopes nested too deeply (limit {0})")]
    ScopeTooDeep(usize),
    #[error("unknown method {0}")]
    UnknownMethod(String),
    #[error("{method} expects {expected} argument(s), got {got}")]
    MethodArity {
        method: String,
        expected: usize,
        got: usize,
    },
    #[error("expression in go must be a function call")]
    GoWithoutCall,
}
