use gvm_ir::{BinOp, Literal, Op, Position, Program};
use gvm_runtime::{ExecResult, Runtime, RuntimeConfig, Value, VmError};

fn run(ops: Vec<Op>) -> Result<ExecResult, VmError> {
    let mut rt = Runtime::with_config(RuntimeConfig {
        seed: Some(3),
        trace: false,
        ..RuntimeConfig::default()
    });
    rt.run(&Program::new(ops))
}

fn num(n: f64) -> Op {
    Op::Ldc(Literal::Number(n))
}

#[test]
fn vm_ir_add_numbers() {
    let r = run(vec![num(2.0), num(3.0), Op::Binop(BinOp::Add), Op::Done]).unwrap();
    assert_eq!(r.value, Value::Number(5.0));
}

#[test]
fn vm_ir_println_hello() {
    let r = run(vec![
        Op::Ld(Position::new(0, 0)),
        Op::Ldc(Literal::Str("Hello".into())),
        Op::Call(1),
        Op::Done,
    ])
    .unwrap();
    assert_eq!(r.output, "Hello\n");
    assert_eq!(r.value, Value::Undefined);
}

#[test]
fn vm_ir_running_off_the_end_finishes() {
    let r = run(vec![num(4.0)]).unwrap();
    assert_eq!(r.value, Value::Number(4.0));
}

#[test]
fn vm_ir_unassigned_slot() {
    let err = run(vec![Op::EnterScope(1), Op::Ld(Position::new(1, 0)), Op::Done]).unwrap_err();
    assert_eq!(err, VmError::UnassignedAccess);
}

#[test]
fn vm_ir_position_outside_the_environment() {
    let err = run(vec![Op::Ld(Position::new(3, 0)), Op::Done]).unwrap_err();
    assert_eq!(err, VmError::InvalidPosition { frame: 3, slot: 0 });
}

#[test]
fn vm_ir_jof_needs_a_bool() {
    let err = run(vec![num(1.0), Op::Jof(3), Op::Done]).unwrap_err();
    assert!(matches!(err, VmError::Type(ref m) if m.contains("number")), "{err}");
}

#[test]
fn vm_ir_calling_a_number() {
    let err = run(vec![num(1.0), Op::Call(0), Op::Done]).unwrap_err();
    assert_eq!(err, VmError::NotCallable("number".into()));
}

#[test]
fn vm_ir_builtin_arity() {
    let err = run(vec![Op::Ld(Position::new(0, 0)), Op::Call(0), Op::Done]).unwrap_err();
    assert_eq!(err, VmError::Arity { expected: 1, got: 0 });
}

#[test]
fn vm_ir_closure_call_and_return() {
    // f(x) = x * 2; f(21)
    let r = run(vec![
        Op::Ldf { arity: 1, addr: 2 },
        Op::Goto(6),
        Op::Ld(Position::new(1, 0)),
        num(2.0),
        Op::Binop(BinOp::Mul),
        Op::Reset,
        num(21.0),
        Op::Call(1),
        Op::Done,
    ])
    .unwrap();
    assert_eq!(r.value, Value::Number(42.0));
}

#[test]
fn vm_ir_buffered_channel_round_trip() {
    let c = Position::new(1, 0);
    let r = run(vec![
        Op::EnterScope(1),
        Op::NewChan { capacity: 1 },
        Op::Assign(c),
        Op::Pop,
        Op::Ld(c),
        num(1.0),
        Op::Send,
        Op::Pop,
        Op::Ld(c),
        Op::Recv,
        Op::ExitScope,
        Op::Done,
    ])
    .unwrap();
    assert_eq!(r.value, Value::Number(1.0));
}

#[test]
fn vm_ir_receive_without_sender_deadlocks() {
    let err = run(vec![Op::NewChan { capacity: 0 }, Op::Recv, Op::Done]).unwrap_err();
    assert_eq!(err, VmError::Deadlock);
}

#[test]
fn vm_ir_channel_capacity_limit() {
    let err = run(vec![Op::NewChan { capacity: 7 }, Op::Done]).unwrap_err();
    assert_eq!(err, VmError::ChannelCapacity(7));
    assert_eq!(err.to_string(), "channel capacity 7 exceeds the maximum of 6");
}

#[test]
fn vm_ir_send_to_a_number() {
    let err = run(vec![num(1.0), num(2.0), Op::Send, Op::Done]).unwrap_err();
    assert!(err.to_string().contains("number"), "{err}");
}

#[test]
fn vm_ir_break_outside_loop() {
    let err = run(vec![Op::Break, num(1.0), Op::Done]).unwrap_err();
    assert_eq!(err, VmError::OutsideLoop);
}

#[test]
fn vm_ir_break_closes_inner_scopes() {
    // loop scope, then a body scope the break leaves early
    let r = run(vec![
        Op::EnterScope(0),
        Op::EnterScope(1),
        Op::Break,
        Op::ExitScope,
        Op::LoopMarker { cont: 0 },
        Op::ExitScope,
        num(7.0),
        Op::Done,
    ])
    .unwrap();
    assert_eq!(r.value, Value::Number(7.0));
}

#[test]
fn vm_ir_break_skips_nested_function_bodies() {
    let r = run(vec![
        Op::EnterScope(0),
        Op::Break,
        Op::Ldf { arity: 0, addr: 4 },
        Op::Goto(6),
        Op::LoopMarker { cont: 0 },
        Op::Reset,
        Op::LoopMarker { cont: 0 },
        Op::ExitScope,
        num(8.0),
        Op::Done,
    ])
    .unwrap();
    assert_eq!(r.value, Value::Number(8.0));
}

#[test]
fn vm_ir_goroutine_runs_to_go_end() {
    // go f() where f prints "x"; main spins so the goroutine gets a turn
    let r = run(vec![
        Op::Ldf { arity: 0, addr: 2 },
        Op::Goto(7),
        Op::Ld(Position::new(0, 1)),
        Op::Ldc(Literal::Str("x".into())),
        Op::Call(1),
        Op::Pop,
        Op::Reset,
        Op::Go(0),
        Op::Call(0),
        Op::GoEnd,
        Op::Pop,
        Op::EnterScope(1),
        num(0.0),
        Op::Assign(Position::new(1, 0)),
        Op::Pop,
        // 15: i < 20
        Op::Ld(Position::new(1, 0)),
        num(20.0),
        Op::Binop(BinOp::Lt),
        Op::Jof(25),
        Op::Ld(Position::new(1, 0)),
        num(1.0),
        Op::Binop(BinOp::Add),
        Op::Assign(Position::new(1, 0)),
        Op::Pop,
        Op::Goto(15),
        // 25
        Op::ExitScope,
        num(1.0),
        Op::Done,
    ])
    .unwrap();
    assert_eq!(r.output, "x");
    assert_eq!(r.value, Value::Number(1.0));
}

#[test]
fn vm_ir_waitgroup_underflow() {
    let err = run(vec![Op::NewWaitGroup, Op::WgDone, Op::Done]).unwrap_err();
    assert_eq!(err, VmError::NegativeWaitGroup);
}

#[test]
fn vm_ir_waitgroup_at_zero_does_not_block() {
    let r = run(vec![Op::NewWaitGroup, Op::WgWait, Op::Done]).unwrap();
    assert_eq!(r.value, Value::Undefined);
}
