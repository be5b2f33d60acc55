use crate::core::{Address, Tag};
use crate::errors::{VmError, messages};
use crate::vm::Machine;

pub fn builtin_print(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    for &a in args {
        let s = m.heap.display(a);
        m.output.push_str(&s);
    }
    Ok(m.heap.undefined())
}

pub fn builtin_println(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    builtin_print(m, args)?;
    m.output.push('\n');
    Ok(m.heap.undefined())
}

/// Byte length of a string, or the number of values buffered in a channel.
pub fn builtin_len(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    let a = args[0];
    let n = match m.heap.tag(a) {
        Tag::String => m.heap.string(a).map_or(0, str::len),
        Tag::Channel => m.heap.chan_len(a),
        t => return Err(VmError::type_error(messages::NOT_A_STRING, t.name())),
    };
    m.alloc_number(n as f64)
}

pub fn builtin_string(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    let s = m.heap.display(args[0]);
    m.alloc_string(&s)
}
