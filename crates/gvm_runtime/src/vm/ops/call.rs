use smallvec::SmallVec;

use crate::core::{Address, Tag};
use crate::errors::VmError;
use crate::vm::{Machine, Registers};

#[inline(always)]
pub(crate) fn op_ldf(m: &mut Machine, arity: usize, addr: usize) -> Result<(), VmError> {
    let env = m.regs.env;
    let closure = m.alloc(Tag::Closure, 3)?;
    m.heap.set_payload(closure, addr as u32);
    m.heap.set_word(closure, 1, arity as u64);
    m.heap.set_child(closure, 2, env);
    m.push(closure);
    m.regs.pc += 1;
    Ok(())
}

/// `Call(n)` and `TailCall(n)`. The callee sits below its `n` arguments;
/// both stay on the stack until every node the call needs is allocated.
pub(crate) fn op_call(m: &mut Machine, n: usize, tail: bool) -> Result<(), VmError> {
    let f = m.peek(n)?;
    match m.heap.tag(f) {
        Tag::Builtin => call_builtin(m, f, n, tail),
        Tag::Closure => call_closure(m, f, n, tail),
        t => Err(VmError::NotCallable(t.name().to_string())),
    }
}

fn call_builtin(m: &mut Machine, f: Address, n: usize, tail: bool) -> Result<(), VmError> {
    let id = m.heap.payload(f) as usize;
    let builtin = m.builtins.get(id).ok_or(VmError::UnknownBuiltin(id))?;
    if builtin.arity != n {
        return Err(VmError::Arity {
            expected: builtin.arity,
            got: n,
        });
    }
    let start = m.regs.os.len() - n;
    let args: SmallVec<[Address; 4]> = m.regs.os[start..].iter().copied().collect();
    let out = (builtin.fun)(m, &args[..])?;
    m.drop_n(n + 1)?;
    m.push(out);
    if tail {
        op_reset(m)
    } else {
        m.regs.pc += 1;
        Ok(())
    }
}

/// Callframe (unless tail calling), argument frame and the extended
/// environment, each held in the allocating set until the next is built.
fn closure_nodes(
    m: &mut Machine,
    captured: Address,
    n: usize,
    tail: bool,
) -> Result<(Option<Address>, Address), VmError> {
    let cf = if tail {
        None
    } else {
        let env = m.regs.env;
        let cf = m.alloc(Tag::Callframe, 2)?;
        m.heap.set_payload(cf, (m.regs.pc + 1) as u32);
        m.heap.set_child(cf, 1, env);
        m.heap.allocating.push(cf);
        Some(cf)
    };
    let frame = m.with_roots(|heap, roots| heap.new_frame(n, roots))?;
    let start = m.regs.os.len() - n;
    for i in 0..n {
        let arg = m.regs.os[start + i];
        m.heap.init_slot(frame, i, arg);
    }
    m.heap.allocating.push(frame);
    let env = m.with_roots(|heap, roots| heap.extend_env(captured, frame, roots))?;
    Ok((cf, env))
}

fn call_closure(m: &mut Machine, f: Address, n: usize, tail: bool) -> Result<(), VmError> {
    let arity = m.heap.word(f, 1) as usize;
    if arity != n {
        return Err(VmError::Arity { expected: arity, got: n });
    }
    let entry = m.heap.payload(f) as usize;
    let captured = m.heap.child(f, 2);

    let mark = m.heap.allocating.len();
    let built = closure_nodes(m, captured, n, tail);
    m.heap.allocating.truncate(mark);
    let (cf, env) = built?;

    m.drop_n(n + 1)?;
    match cf {
        Some(cf) => m.regs.rts.push(cf),
        None => {
            // The caller's block frames are dead once its call is replaced.
            while let Some(&top) = m.regs.rts.last() {
                if m.heap.tag(top) != Tag::Blockframe {
                    break;
                }
                m.regs.rts.pop();
            }
        }
    }
    m.regs.env = env;
    m.regs.pc = entry;
    Ok(())
}

/// Return: unwind to the nearest call frame and resume the caller.
pub(crate) fn op_reset(m: &mut Machine) -> Result<(), VmError> {
    loop {
        let top = m.regs.rts.pop().ok_or(VmError::ReturnStackUnderflow)?;
        if m.heap.tag(top) == Tag::Callframe {
            m.regs.pc = m.heap.payload(top) as usize;
            m.regs.env = m.heap.child(top, 1);
            return Ok(());
        }
    }
}

/// Moves the callee and its arguments to a new thread that starts at the
/// `Call` after this instruction; the spawner skips the `Call` and `GoEnd`.
pub(crate) fn op_go(m: &mut Machine, n: usize) -> Result<(), VmError> {
    let len = m.regs.os.len();
    if len < n + 1 {
        return Err(VmError::StackUnderflow);
    }
    let mut regs = Registers::new(m.regs.env);
    regs.os = m.regs.os.split_off(len - n - 1);
    regs.pc = m.regs.pc + 1;
    m.spawn(regs);
    let u = m.heap.undefined();
    m.push(u);
    m.regs.pc += 3;
    Ok(())
}
