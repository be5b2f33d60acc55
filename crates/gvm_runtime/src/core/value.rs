//! Host-side view of heap values.

use std::fmt;

use super::heap::{Address, Heap, Roots, Tag};
use crate::errors::{VmError, messages};

/// A heap value converted for the host. Composite values have no host
/// representation and come back as opaque markers.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Str(String),
    Null,
    Undefined,
    Unassigned,
    Closure,
    Builtin(String),
    Channel,
    WaitGroup,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Unassigned => f.write_str("<unassigned>"),
            Value::Closure => f.write_str("<closure>"),
            Value::Builtin(name) => write!(f, "<builtin {name}>"),
            Value::Channel => f.write_str("<channel>"),
            Value::WaitGroup => f.write_str("<waitgroup>"),
        }
    }
}

/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(n as i64).to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "+Inf".to_string() } else { "-Inf".to_string() }
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format_finite(n).to_string()
    }
}

impl Heap {
    /// Boxes a host value. Composite values cannot be created this way.
    pub fn alloc_value(&mut self, v: &Value, roots: &dyn Roots) -> Result<Address, VmError> {
        match v {
            Value::Number(n) => self.alloc_number(*n, roots),
            Value::Bool(b) => Ok(self.boolean(*b)),
            Value::Str(s) => self.alloc_string(s, roots),
            Value::Null => Ok(self.null()),
            Value::Undefined => Ok(self.undefined()),
            Value::Unassigned => Ok(self.unassigned()),
            other => Err(VmError::type_error(messages::UNBOXABLE, other)),
        }
    }

    pub fn to_value(&self, a: Address) -> Value {
        match self.tag(a) {
            Tag::Number => Value::Number(f64::from_bits(self.word(a, 1))),
            Tag::True => Value::Bool(true),
            Tag::False => Value::Bool(false),
            Tag::String => Value::Str(self.string(a).unwrap_or_default().to_string()),
            Tag::Null => Value::Null,
            Tag::Undefined | Tag::Free => Value::Undefined,
            Tag::Unassigned => Value::Unassigned,
            Tag::Closure => Value::Closure,
            Tag::Builtin => Value::Builtin(
                gvm_ir::BUILTINS
                    .get(self.payload(a) as usize)
                    .map(|b| b.name.to_string())
                    .unwrap_or_default(),
            ),
            Tag::Channel => Value::Channel,
            Tag::WaitGroup => Value::WaitGroup,
            Tag::Frame | Tag::Environment | Tag::Blockframe | Tag::Callframe => Value::Undefined,
        }
    }

    /// The form `print` writes.
    pub fn display(&self, a: Address) -> String {
        self.to_value(a).to_string()
    }

    /// Structural equality for `==`: numbers by value, everything else by
    /// identity (strings are interned, so identity is content equality).
    pub fn values_equal(&self, a: Address, b: Address) -> bool {
        if a == b {
            return true;
        }
        match (self.number(a), self.number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_like_go() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(f64::INFINITY), "+Inf");
    }
}
