use crate::core::{Address, Tag};
use crate::errors::{VmError, messages};
use crate::vm::{Machine, Step};

pub(crate) fn op_new_chan(m: &mut Machine, capacity: usize) -> Result<(), VmError> {
    let ch = m.with_roots(|heap, roots| heap.alloc_channel(capacity, roots))?;
    m.channels.reset(ch);
    m.push(ch);
    m.regs.pc += 1;
    Ok(())
}

fn expect_channel(m: &Machine, ch: Address) -> Result<(), VmError> {
    match m.heap.tag(ch) {
        Tag::Channel => Ok(()),
        t => Err(VmError::type_error(messages::NOT_A_CHANNEL, t.name())),
    }
}

/// Booleans are one element type even though each value has its own tag.
fn element_tag(tag: Tag) -> Tag {
    match tag {
        Tag::True => Tag::False,
        t => t,
    }
}

fn check_item_type(m: &mut Machine, ch: Address, v: Address) -> Result<(), VmError> {
    let got = element_tag(m.heap.tag(v));
    match m.heap.chan_item_tag(ch) {
        None => {
            m.heap.set_chan_item_tag(ch, got);
            Ok(())
        }
        Some(expected) if expected == got => Ok(()),
        Some(expected) => Err(VmError::ChannelItemType {
            expected: expected.name().to_string(),
            got: got.name().to_string(),
        }),
    }
}

/// Stack: channel, value. A full channel parks the sender with the
/// instruction rewound. On an unbuffered channel the sender completes the
/// instruction but stays blocked until a receiver takes the value.
pub(crate) fn op_send(m: &mut Machine) -> Result<Step, VmError> {
    let v = m.peek(0)?;
    let ch = m.peek(1)?;
    expect_channel(m, ch)?;
    if m.typed_channels() {
        check_item_type(m, ch, v)?;
    }
    if m.heap.chan_is_full(ch) {
        m.channels.block_writer(ch, m.current);
        return Ok(Step::Block);
    }
    m.heap.chan_push(ch, v);
    m.drop_n(2)?;
    let u = m.heap.undefined();
    m.push(u);
    m.regs.pc += 1;
    if let Some(r) = m.channels.take_reader(ch) {
        m.wake(r);
    }
    if m.heap.chan_unbuffered(ch) {
        m.channels.park_sender(ch, m.current);
        return Ok(Step::Block);
    }
    Ok(Step::Continue)
}

/// Stack: channel. An empty channel parks the receiver with the instruction
/// rewound.
pub(crate) fn op_recv(m: &mut Machine) -> Result<Step, VmError> {
    let ch = m.peek(0)?;
    expect_channel(m, ch)?;
    if m.heap.chan_is_empty(ch) {
        m.channels.block_reader(ch, m.current);
        return Ok(Step::Block);
    }
    let v = m.heap.chan_pop(ch);
    m.pop()?;
    m.push(v);
    m.regs.pc += 1;
    if m.heap.chan_unbuffered(ch) {
        if let Some(s) = m.channels.take_sender(ch) {
            m.wake(s);
        }
    }
    if let Some(w) = m.channels.take_writer(ch) {
        m.wake(w);
    }
    Ok(Step::Continue)
}
