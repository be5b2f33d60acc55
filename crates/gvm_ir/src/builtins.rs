/// A builtin bound in the outermost frame of the global environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub arity: usize,
}

/// Builtins in slot order. The runtime identifies a builtin by its index in
/// this table, the compiler resolves names to `Position { frame: 0, slot }`.
pub const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec { name: "println", arity: 1 },
    BuiltinSpec { name: "print", arity: 1 },
    BuiltinSpec { name: "len", arity: 1 },
    BuiltinSpec { name: "abs", arity: 1 },
    BuiltinSpec { name: "min", arity: 2 },
    BuiltinSpec { name: "max", arity: 2 },
    BuiltinSpec { name: "string", arity: 1 },
];

pub fn builtin_id(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|b| b.name == name)
}
