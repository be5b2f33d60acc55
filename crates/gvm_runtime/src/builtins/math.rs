use super::common::{to_f64, to_f64_pair};
use crate::core::Address;
use crate::errors::VmError;
use crate::vm::Machine;

pub fn builtin_abs(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    let v = to_f64(m, args[0])?;
    m.alloc_number(v.abs())
}

pub fn builtin_max(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    let (a, b) = to_f64_pair(m, args[0], args[1])?;
    m.alloc_number(a.max(b))
}

pub fn builtin_min(m: &mut Machine, args: &[Address]) -> Result<Address, VmError> {
    let (a, b) = to_f64_pair(m, args[0], args[1])?;
    m.alloc_number(a.min(b))
}
