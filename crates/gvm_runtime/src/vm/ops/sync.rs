use crate::core::{Address, Tag};
use crate::errors::{VmError, messages};
use crate::vm::{Machine, Step};

pub(crate) fn op_new_waitgroup(m: &mut Machine) -> Result<(), VmError> {
    let wg = m.with_roots(|heap, roots| heap.alloc_waitgroup(roots))?;
    m.waitgroups.reset(wg);
    m.push(wg);
    m.regs.pc += 1;
    Ok(())
}

fn expect_waitgroup(m: &Machine, wg: Address) -> Result<(), VmError> {
    match m.heap.tag(wg) {
        Tag::WaitGroup => Ok(()),
        t => Err(VmError::type_error(messages::NOT_A_WAITGROUP, t.name())),
    }
}

/// Applies `delta` to the counter. Reaching zero releases every waiter.
fn adjust(m: &mut Machine, wg: Address, delta: f64) -> Result<(), VmError> {
    if delta > 0.0 && m.waitgroups.has_waiters(wg) {
        return Err(VmError::WaitGroupMisuse);
    }
    let count = m.heap.wg_count(wg) + delta;
    if count < 0.0 {
        return Err(VmError::NegativeWaitGroup);
    }
    m.heap.set_wg_count(wg, count);
    if count == 0.0 {
        for t in m.waitgroups.take_all(wg) {
            m.wake(t);
        }
    }
    Ok(())
}

/// Stack: wait-group, delta.
pub(crate) fn op_wg_add(m: &mut Machine) -> Result<(), VmError> {
    let d = m.peek(0)?;
    let wg = m.peek(1)?;
    expect_waitgroup(m, wg)?;
    let delta = m
        .heap
        .number(d)
        .ok_or_else(|| VmError::type_error(messages::NOT_A_NUMBER, m.heap.tag(d).name()))?;
    adjust(m, wg, delta)?;
    m.drop_n(2)?;
    let u = m.heap.undefined();
    m.push(u);
    m.regs.pc += 1;
    Ok(())
}

/// Stack: wait-group.
pub(crate) fn op_wg_done(m: &mut Machine) -> Result<(), VmError> {
    let wg = m.peek(0)?;
    expect_waitgroup(m, wg)?;
    adjust(m, wg, -1.0)?;
    m.pop()?;
    let u = m.heap.undefined();
    m.push(u);
    m.regs.pc += 1;
    Ok(())
}

/// Stack: wait-group. Blocks with the instruction rewound while the counter
/// is positive.
pub(crate) fn op_wg_wait(m: &mut Machine) -> Result<Step, VmError> {
    let wg = m.peek(0)?;
    expect_waitgroup(m, wg)?;
    if m.heap.wg_count(wg) > 0.0 {
        m.waitgroups.block(wg, m.current);
        return Ok(Step::Block);
    }
    m.pop()?;
    let u = m.heap.undefined();
    m.push(u);
    m.regs.pc += 1;
    Ok(Step::Continue)
}
