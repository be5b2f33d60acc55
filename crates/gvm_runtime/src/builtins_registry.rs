use gvm_ir::BUILTINS;

use crate::builtins;
use crate::core::Address;
use crate::errors::VmError;
use crate::vm::Machine;

/// Arguments are still on the caller's operand stack while a builtin runs,
/// so a builtin may allocate freely.
pub type BuiltinFn = fn(&mut Machine, &[Address]) -> Result<Address, VmError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub fun: BuiltinFn,
}

/// Builtins in slot order of the global frame; a builtin node's payload is
/// its index here.
pub struct BuiltinRegistry {
    entries: Vec<Builtin>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, arity: usize, fun: BuiltinFn) {
        self.entries.push(Builtin { name, arity, fun });
    }

    pub fn get(&self, id: usize) -> Option<Builtin> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|b| b.name).collect()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        StdBuiltinProvider.install(&mut registry);
        registry
    }
}

pub trait BuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry);
}

/// Implementation behind a builtin name.
pub fn builtin_fn(name: &str) -> Option<BuiltinFn> {
    let fun: BuiltinFn = match name {
        "println" => builtins::builtin_println,
        "print" => builtins::builtin_print,
        "len" => builtins::builtin_len,
        "abs" => builtins::builtin_abs,
        "min" => builtins::builtin_min,
        "max" => builtins::builtin_max,
        "string" => builtins::builtin_string,
        _ => return None,
    };
    Some(fun)
}

/// Installs the table the compiler resolves names against, in its order.
pub struct StdBuiltinProvider;

impl BuiltinProvider for StdBuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry) {
        for spec in BUILTINS {
            // a gap would shift every later payload id off its compiler slot
            let Some(fun) = builtin_fn(spec.name) else {
                unreachable!("builtin `{}` has no implementation", spec.name);
            };
            registry.register(spec.name, spec.arity, fun);
        }
    }
}
