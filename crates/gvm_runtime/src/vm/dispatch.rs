use gvm_ir::{Op, Program};

use super::ops::{call, chan, flow, math, sync};
use super::{Machine, Step};
use crate::errors::VmError;

/// Executes the instruction at the running thread's pc. Instructions that
/// block leave the pc on themselves and their operands on the stack, so a
/// woken thread simply executes them again.
pub(crate) fn step(m: &mut Machine, program: &Program) -> Result<Step, VmError> {
    let Some(op) = program.ops.get(m.regs.pc) else {
        return flow::op_done(m);
    };
    match op {
        Op::Ldc(lit) => flow::op_ldc(m, lit)?,
        Op::Ld(pos) => flow::op_ld(m, *pos)?,
        Op::Assign(pos) => flow::op_assign(m, *pos)?,
        Op::Pop => {
            m.pop()?;
            m.regs.pc += 1;
        }
        Op::Jof(to) => flow::op_jof(m, *to)?,
        Op::Goto(to) => m.regs.pc = *to,
        Op::EnterScope(n) => flow::op_enter_scope(m, *n)?,
        Op::ExitScope => {
            flow::exit_scope(m)?;
            m.regs.pc += 1;
        }
        Op::LoopMarker { .. } => m.regs.pc += 1,
        Op::Break => flow::op_leave_loop(m, program, true)?,
        Op::Continue => flow::op_leave_loop(m, program, false)?,
        Op::Done => return flow::op_done(m),
        Op::Unop(u) => math::op_unop(m, *u)?,
        Op::Binop(b) => math::op_binop(m, *b)?,
        Op::Ldf { arity, addr } => call::op_ldf(m, *arity, *addr)?,
        Op::Call(n) => call::op_call(m, *n, false)?,
        Op::TailCall(n) => call::op_call(m, *n, true)?,
        Op::Reset => call::op_reset(m)?,
        Op::Go(n) => call::op_go(m, *n)?,
        Op::GoEnd => return Ok(Step::Exit),
        Op::NewChan { capacity } => chan::op_new_chan(m, *capacity)?,
        Op::Send => return chan::op_send(m),
        Op::Recv => return chan::op_recv(m),
        Op::NewWaitGroup => sync::op_new_waitgroup(m)?,
        Op::WgAdd => sync::op_wg_add(m)?,
        Op::WgDone => sync::op_wg_done(m)?,
        Op::WgWait => return sync::op_wg_wait(m),
    }
    Ok(Step::Continue)
}
