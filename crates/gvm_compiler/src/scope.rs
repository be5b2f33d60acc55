//! Compile-time mirror of the runtime environment: one `Scope` per frame,
//! outermost (the builtins) first.

use gvm_ir::{BUILTINS, MAX_FRAME_SLOTS, Position, Stmt};

use crate::CompileError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Binding {
    Var,
    Const,
    Func,
    Builtin,
}

impl Binding {
    pub(crate) fn reassignable(self) -> bool {
        matches!(self, Binding::Var)
    }
}

pub(crate) struct Scope {
    names: Vec<(String, Binding)>,
}

impl Scope {
    pub(crate) fn new(names: Vec<(String, Binding)>) -> Result<Self, CompileError> {
        if names.len() > MAX_FRAME_SLOTS {
            return Err(CompileError::TooManyLocals {
                count: names.len(),
                limit: MAX_FRAME_SLOTS,
            });
        }
        for (i, (name, _)) in names.iter().enumerate() {
            if names[..i].iter().any(|(n, _)| n == name) {
                return Err(CompileError::Redeclared(name.clone()));
            }
        }
        Ok(Self { names })
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

pub(crate) struct Scopes {
    stack: Vec<Scope>,
}

impl Scopes {
    pub(crate) fn with_builtins() -> Self {
        let names = BUILTINS
            .iter()
            .map(|b| (b.name.to_string(), Binding::Builtin))
            .collect();
        Self {
            stack: vec![Scope { names }],
        }
    }

    pub(crate) fn push(&mut self, scope: Scope) -> Result<(), CompileError> {
        if self.stack.len() >= MAX_FRAME_SLOTS {
            return Err(CompileError::ScopeTooDeep(MAX_FRAME_SLOTS));
        }
        self.stack.push(scope);
        Ok(())
    }

    pub(crate) fn pop(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<(Position, Binding), CompileError> {
        for (frame, scope) in self.stack.iter().enumerate().rev() {
            if let Some(slot) = scope.names.iter().position(|(n, _)| n == name) {
                return Ok((Position::new(frame, slot), scope.names[slot].1));
            }
        }
        Err(CompileError::UndefinedIdentifier(name.to_string()))
    }
}

/// Names declared directly in a block, ignoring nested blocks.
pub(crate) fn scan(stmts: &[Stmt]) -> Vec<(String, Binding)> {
    stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::Var(v) => Some((v.name.clone(), Binding::Var)),
            Stmt::Const(c) => Some((c.name.clone(), Binding::Const)),
            Stmt::FuncDef(f) => Some((f.name.clone(), Binding::Func)),
            _ => None,
        })
        .collect()
}
