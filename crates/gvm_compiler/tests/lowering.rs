use gvm_compiler::{CompileError, compile_program};
use gvm_ir::{BinOp, Expr, Literal, Module, Op, Position, Stmt, TypeRef};

fn compile(stmts: Vec<Stmt>) -> Result<Vec<Op>, CompileError> {
    compile_program(&Module::new(stmts)).map(|p| p.ops)
}

fn num(n: f64) -> Expr {
    Expr::Number(n)
}

#[test]
fn short_var_decl_gets_a_global_frame() {
    let ops = compile(vec![Stmt::var("x", num(3.0)), Stmt::expr(Expr::ident("x"))]).unwrap();
    assert_eq!(
        ops,
        vec![
            Op::EnterScope(1),
            Op::Ldc(Literal::Number(3.0)),
            Op::Assign(Position::new(1, 0)),
            Op::Pop,
            Op::Ld(Position::new(1, 0)),
            Op::ExitScope,
            Op::Done,
        ]
    );
}

#[test]
fn empty_program_yields_undefined() {
    let ops = compile(vec![]).unwrap();
    assert_eq!(ops, vec![Op::Ldc(Literal::Undefined), Op::Done]);
}

#[test]
fn builtins_resolve_to_frame_zero() {
    let ops = compile(vec![Stmt::expr(Expr::call(Expr::ident("println"), vec![num(1.0)]))]).unwrap();
    assert_eq!(ops[0], Op::Ld(Position::new(0, 0)));
    assert_eq!(ops[2], Op::Call(1));
}

#[test]
fn constant_reassignment_is_rejected() {
    let err = compile(vec![
        Stmt::constant("y", Expr::str("blue")),
        Stmt::expr(Expr::assign("y", Expr::str("berry"))),
    ])
    .unwrap_err();
    assert_eq!(err, CompileError::AssignToConstant("y".to_string()));
}

#[test]
fn builtins_are_not_assignable() {
    let err = compile(vec![Stmt::expr(Expr::assign("len", num(1.0)))]).unwrap_err();
    assert_eq!(err, CompileError::AssignToConstant("len".to_string()));
}

#[test]
fn undefined_identifier_is_rejected() {
    let err = compile(vec![Stmt::expr(Expr::ident("nope"))]).unwrap_err();
    assert_eq!(err, CompileError::UndefinedIdentifier("nope".to_string()));
}

#[test]
fn duplicate_declaration_in_one_block() {
    let err = compile(vec![Stmt::var("a", num(1.0)), Stmt::var("a", num(2.0))]).unwrap_err();
    assert_eq!(err, CompileError::Redeclared("a".to_string()));
}

#[test]
fn too_many_locals() {
    let stmts = (0..10).map(|i| Stmt::var(&format!("v{i}"), num(i as f64))).collect();
    let err = compile(stmts).unwrap_err();
    assert_eq!(err, CompileError::TooManyLocals { count: 10, limit: 9 });
}

#[test]
fn break_and_return_need_context() {
    assert_eq!(compile(vec![Stmt::Break]).unwrap_err(), CompileError::BreakOutsideLoop);
    assert_eq!(compile(vec![Stmt::Continue]).unwrap_err(), CompileError::ContinueOutsideLoop);
    assert_eq!(
        compile(vec![Stmt::Return(None)]).unwrap_err(),
        CompileError::ReturnOutsideFunction
    );
    // a loop outside the function does not license break inside it
    let err = compile(vec![Stmt::for_loop(
        None,
        None,
        None,
        vec![Stmt::func("f", &[], vec![Stmt::Break])],
    )])
    .unwrap_err();
    assert_eq!(err, CompileError::BreakOutsideLoop);
}

#[test]
fn function_body_is_skipped_and_returns_undefined() {
    let ops = compile(vec![Stmt::func("f", &["a"], vec![Stmt::expr(Expr::ident("a"))])]).unwrap();
    assert_eq!(
        ops,
        vec![
            Op::EnterScope(1),
            Op::Ldf { arity: 1, addr: 3 },
            Op::Goto(7),
            Op::Ld(Position::new(2, 0)),
            Op::Pop,
            Op::Ldc(Literal::Undefined),
            Op::Reset,
            Op::Assign(Position::new(1, 0)),
            Op::ExitScope,
            Op::Done,
        ]
    );
}

#[test]
fn returned_call_is_a_tail_call() {
    let ops = compile(vec![Stmt::func(
        "f",
        &["n"],
        vec![Stmt::Return(Some(Expr::call(Expr::ident("f"), vec![Expr::ident("n")])))],
    )])
    .unwrap();
    assert!(ops.contains(&Op::TailCall(1)));
    assert!(!ops.contains(&Op::Call(1)));
}

#[test]
fn for_loop_layout() {
    let ops = compile(vec![Stmt::for_loop(
        Some(Stmt::var("i", num(0.0))),
        Some(Expr::binary(BinOp::Lt, Expr::ident("i"), num(3.0))),
        Some(Expr::assign(
            "i",
            Expr::binary(BinOp::Add, Expr::ident("i"), num(1.0)),
        )),
        vec![Stmt::Continue],
    )])
    .unwrap();
    let i = Position::new(1, 0);
    assert_eq!(
        ops,
        vec![
            Op::EnterScope(1),
            Op::Ldc(Literal::Number(0.0)),
            Op::Assign(i),
            Op::Pop,
            Op::Ld(i),
            Op::Ldc(Literal::Number(3.0)),
            Op::Binop(BinOp::Lt),
            Op::Jof(16),
            Op::Continue,
            Op::Pop,
            Op::Ld(i),
            Op::Ldc(Literal::Number(1.0)),
            Op::Binop(BinOp::Add),
            Op::Assign(i),
            Op::Pop,
            Op::Goto(4),
            Op::LoopMarker { cont: 10 },
            Op::ExitScope,
            Op::Ldc(Literal::Undefined),
            Op::Done,
        ]
    );
}

#[test]
fn go_statement_emits_spawn_triple() {
    let ops = compile(vec![
        Stmt::func("f", &[], vec![]),
        Stmt::Go(Expr::call(Expr::ident("f"), vec![])),
    ])
    .unwrap();
    let at = ops.iter().position(|op| *op == Op::Go(0)).unwrap();
    assert_eq!(ops[at + 1], Op::Call(0));
    assert_eq!(ops[at + 2], Op::GoEnd);
    assert_eq!(
        compile(vec![Stmt::Go(num(1.0))]).unwrap_err(),
        CompileError::GoWithoutCall
    );
}

#[test]
fn waitgroup_methods() {
    let ops = compile(vec![
        Stmt::var_typed("wg", TypeRef::WaitGroup),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Add", vec![num(2.0)])),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Done", vec![])),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Wait", vec![])),
    ])
    .unwrap();
    assert!(ops.contains(&Op::NewWaitGroup));
    assert!(ops.contains(&Op::WgAdd));
    assert!(ops.contains(&Op::WgDone));
    assert!(ops.contains(&Op::WgWait));

    let err = compile(vec![
        Stmt::var_typed("wg", TypeRef::WaitGroup),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Add", vec![])),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        CompileError::MethodArity {
            method: "Add".to_string(),
            expected: 1,
            got: 0
        }
    );
    let err = compile(vec![
        Stmt::var_typed("wg", TypeRef::WaitGroup),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Go", vec![])),
    ])
    .unwrap_err();
    assert_eq!(err, CompileError::UnknownMethod("Go".to_string()));
}

#[test]
fn channel_ops() {
    let ops = compile(vec![
        Stmt::var("c", Expr::MakeChan(2)),
        Stmt::send(Expr::ident("c"), num(1.0)),
        Stmt::expr(Expr::recv(Expr::ident("c"))),
    ])
    .unwrap();
    assert!(ops.contains(&Op::NewChan { capacity: 2 }));
    assert!(ops.contains(&Op::Send));
    assert!(ops.contains(&Op::Recv));
}

#[test]
fn programs_survive_json() {
    let module = Module::new(vec![Stmt::var("x", num(3.0)), Stmt::expr(Expr::ident("x"))]);
    let text = serde_json::to_string(&module).unwrap();
    let back: Module = serde_json::from_str(&text).unwrap();
    assert_eq!(compile_program(&back).unwrap(), compile_program(&module).unwrap());
}
