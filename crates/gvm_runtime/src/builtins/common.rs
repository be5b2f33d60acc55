use crate::core::Address;
use crate::errors::{VmError, messages};
use crate::vm::Machine;

pub(super) fn to_f64(m: &Machine, a: Address) -> Result<f64, VmError> {
    m.heap
        .number(a)
        .ok_or_else(|| VmError::type_error(messages::NOT_A_NUMBER, m.heap.tag(a).name()))
}

pub(super) fn to_f64_pair(m: &Machine, a: Address, b: Address) -> Result<(f64, f64), VmError> {
    Ok((to_f64(m, a)?, to_f64(m, b)?))
}
