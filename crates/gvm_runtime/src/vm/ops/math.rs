use std::cmp::Ordering;

use gvm_ir::{BinOp, UnOp};

use crate::core::Address;
use crate::errors::{VmError, messages};
use crate::vm::Machine;

#[inline(always)]
pub(crate) fn op_unop(m: &mut Machine, op: UnOp) -> Result<(), VmError> {
    let v = m.peek(0)?;
    let out = match op {
        UnOp::Neg => {
            let n = m
                .heap
                .number(v)
                .ok_or_else(|| VmError::type_error(messages::NOT_A_NUMBER, m.heap.tag(v).name()))?;
            m.alloc_number(-n)?
        }
        UnOp::Not => {
            let b = m
                .heap
                .as_bool(v)
                .ok_or_else(|| VmError::type_error(messages::NOT_A_BOOL, m.heap.tag(v).name()))?;
            m.heap.boolean(!b)
        }
    };
    m.pop()?;
    m.push(out);
    m.regs.pc += 1;
    Ok(())
}

enum Operands {
    Numbers(f64, f64),
    Strings(String, String),
    Other,
}

fn classify(m: &Machine, a: Address, b: Address) -> Operands {
    if let (Some(x), Some(y)) = (m.heap.number(a), m.heap.number(b)) {
        return Operands::Numbers(x, y);
    }
    if let (Some(x), Some(y)) = (m.heap.string(a), m.heap.string(b)) {
        return Operands::Strings(x.to_string(), y.to_string());
    }
    Operands::Other
}

fn bad_operands(m: &Machine, op: BinOp, a: Address, b: Address) -> VmError {
    VmError::Type(format!(
        "{} {}: {} and {}",
        messages::BAD_OPERANDS,
        op.symbol(),
        m.heap.tag(a).name(),
        m.heap.tag(b).name()
    ))
}

/// Operands stay on the stack until the result is allocated.
pub(crate) fn op_binop(m: &mut Machine, op: BinOp) -> Result<(), VmError> {
    let rhs = m.peek(0)?;
    let lhs = m.peek(1)?;
    let out = match op {
        BinOp::Eq => m.heap.boolean(m.heap.values_equal(lhs, rhs)),
        BinOp::Ne => m.heap.boolean(!m.heap.values_equal(lhs, rhs)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = match classify(m, lhs, rhs) {
                Operands::Numbers(x, y) => x.partial_cmp(&y),
                Operands::Strings(x, y) => Some(x.cmp(&y)),
                Operands::Other => return Err(bad_operands(m, op, lhs, rhs)),
            };
            let holds = match (op, ord) {
                (_, None) => false,
                (BinOp::Lt, Some(o)) => o == Ordering::Less,
                (BinOp::Le, Some(o)) => o != Ordering::Greater,
                (BinOp::Gt, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            };
            m.heap.boolean(holds)
        }
        BinOp::Add => match classify(m, lhs, rhs) {
            Operands::Numbers(x, y) => m.alloc_number(x + y)?,
            Operands::Strings(x, y) => m.alloc_string(&(x + &y))?,
            Operands::Other => return Err(bad_operands(m, op, lhs, rhs)),
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            let Operands::Numbers(x, y) = classify(m, lhs, rhs) else {
                return Err(bad_operands(m, op, lhs, rhs));
            };
            let n = match op {
                BinOp::Sub => x - y,
                BinOp::Mul => x * y,
                BinOp::Div => x / y,
                _ => x % y,
            };
            m.alloc_number(n)?
        }
    };
    m.drop_n(2)?;
    m.push(out);
    m.regs.pc += 1;
    Ok(())
}
