use gvm_ir::{Literal, Op, Position, Program};

use crate::core::{Address, Tag};
use crate::errors::{VmError, messages};
use crate::vm::{Machine, Step};

#[inline(always)]
pub(crate) fn op_ldc(m: &mut Machine, lit: &Literal) -> Result<(), VmError> {
    let a = match lit {
        Literal::Number(n) => m.alloc_number(*n)?,
        Literal::Str(s) => m.alloc_string(s)?,
        Literal::Bool(b) => m.heap.boolean(*b),
        Literal::Null => m.heap.null(),
        Literal::Undefined => m.heap.undefined(),
    };
    m.push(a);
    m.regs.pc += 1;
    Ok(())
}

#[inline(always)]
pub(crate) fn op_ld(m: &mut Machine, pos: Position) -> Result<(), VmError> {
    let v = m.heap.lookup(m.regs.env, pos)?;
    if v == m.heap.unassigned() {
        return Err(VmError::UnassignedAccess);
    }
    m.push(v);
    m.regs.pc += 1;
    Ok(())
}

#[inline(always)]
pub(crate) fn op_assign(m: &mut Machine, pos: Position) -> Result<(), VmError> {
    let v = m.peek(0)?;
    m.heap.assign(m.regs.env, pos, v)?;
    m.regs.pc += 1;
    Ok(())
}

#[inline(always)]
pub(crate) fn op_jof(m: &mut Machine, to: usize) -> Result<(), VmError> {
    let v = m.pop()?;
    match m.heap.as_bool(v) {
        Some(true) => m.regs.pc += 1,
        Some(false) => m.regs.pc = to,
        None => return Err(VmError::type_error(messages::NOT_A_BOOL, m.heap.tag(v).name())),
    }
    Ok(())
}

fn scope_nodes(m: &mut Machine, slots: usize) -> Result<(Address, Address), VmError> {
    let env = m.regs.env;
    let bf = m.alloc(Tag::Blockframe, 2)?;
    m.heap.set_child(bf, 1, env);
    m.heap.allocating.push(bf);
    let frame = m.with_roots(|heap, roots| heap.new_frame(slots, roots))?;
    m.heap.allocating.push(frame);
    let ext = m.with_roots(|heap, roots| heap.extend_env(env, frame, roots))?;
    Ok((bf, ext))
}

pub(crate) fn op_enter_scope(m: &mut Machine, slots: usize) -> Result<(), VmError> {
    let mark = m.heap.allocating.len();
    let built = scope_nodes(m, slots);
    m.heap.allocating.truncate(mark);
    let (bf, env) = built?;
    m.regs.rts.push(bf);
    m.regs.env = env;
    m.regs.pc += 1;
    Ok(())
}

/// Pops the innermost block frame and restores its environment.
pub(crate) fn exit_scope(m: &mut Machine) -> Result<(), VmError> {
    let bf = m.regs.rts.pop().ok_or(VmError::ReturnStackUnderflow)?;
    if m.heap.tag(bf) != Tag::Blockframe {
        return Err(VmError::Type(messages::NOT_A_BLOCKFRAME.to_string()));
    }
    m.regs.env = m.heap.child(bf, 1);
    Ok(())
}

/// `Break` and `Continue`: walk forward to the enclosing loop's marker,
/// closing every scope opened since the loop body began. Nested loops open a
/// scope before their own marker, so only a marker at depth zero is ours.
/// Function bodies are skipped through the `Goto` that follows their `Ldf`.
pub(crate) fn op_leave_loop(m: &mut Machine, program: &Program, is_break: bool) -> Result<(), VmError> {
    let mut depth = 0usize;
    let mut closed = 0usize;
    let mut pc = m.regs.pc + 1;
    loop {
        match program.ops.get(pc) {
            None | Some(Op::Done) => return Err(VmError::OutsideLoop),
            Some(Op::EnterScope(_)) => depth += 1,
            Some(Op::ExitScope) if depth == 0 => closed += 1,
            Some(Op::ExitScope) => depth -= 1,
            Some(Op::Ldf { .. }) => {
                if let Some(Op::Goto(end)) = program.ops.get(pc + 1) {
                    pc = *end;
                    continue;
                }
            }
            Some(Op::LoopMarker { cont }) if depth == 0 => {
                for _ in 0..closed {
                    exit_scope(m)?;
                }
                m.regs.pc = if is_break { pc + 1 } else { *cont };
                return Ok(());
            }
            Some(_) => {}
        }
        pc += 1;
    }
}

pub(crate) fn op_done(m: &mut Machine) -> Result<Step, VmError> {
    let v = m.regs.os.last().copied().unwrap_or_else(|| m.heap.undefined());
    Ok(Step::Finish(v))
}
