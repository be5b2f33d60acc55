use std::io::Write;

use assert_cmd::Command;
use gvm_ir::{BinOp, Expr, Literal, Module, Op, Program, Stmt, TypeRef};
use tempfile::NamedTempFile;

fn json_file(json: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    f
}

fn program_file(ops: Vec<Op>) -> NamedTempFile {
    json_file(&serde_json::to_string(&Program::new(ops)).unwrap())
}

fn module_file(stmts: Vec<Stmt>) -> NamedTempFile {
    json_file(&serde_json::to_string(&Module::new(stmts)).unwrap())
}

fn gvm() -> Command {
    Command::cargo_bin("gvm").unwrap()
}

#[test]
fn run_prints_output_then_value() {
    let f = program_file(vec![
        Op::Ld(gvm_ir::Position::new(0, 0)),
        Op::Ldc(Literal::Str("hi".into())),
        Op::Call(1),
        Op::Pop,
        Op::Ldc(Literal::Number(2.0)),
        Op::Ldc(Literal::Number(3.0)),
        Op::Binop(BinOp::Add),
        Op::Done,
    ]);
    gvm()
        .args(["run", "seed=1"])
        .arg(f.path())
        .assert()
        .success()
        .stdout("hi\n5\n");
}

#[test]
fn exec_compiles_and_runs() {
    let f = module_file(vec![
        Stmt::var("x", Expr::Number(3.0)),
        Stmt::expr(Expr::assign("x", Expr::Number(2.0))),
        Stmt::expr(Expr::ident("x")),
    ]);
    gvm().arg("exec").arg(f.path()).assert().success().stdout("2\n");
}

#[test]
fn runtime_errors_exit_one() {
    let f = module_file(vec![
        Stmt::var_typed("wg", TypeRef::WaitGroup),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Add", vec![Expr::Number(1.0)])),
        Stmt::expr(Expr::method(Expr::ident("wg"), "Wait", vec![])),
    ]);
    let out = gvm().args(["exec", "seed=9"]).arg(f.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("RuntimeError: all goroutines are asleep - deadlock!"),
        "stderr was: {stderr}"
    );
}

#[test]
fn compile_errors_exit_one() {
    let f = module_file(vec![
        Stmt::constant("y", Expr::str("blue")),
        Stmt::expr(Expr::assign("y", Expr::str("berry"))),
    ]);
    let out = gvm().arg("compile").arg(f.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("CompileError:"));
}

#[test]
fn compile_emits_a_runnable_program() {
    let f = module_file(vec![Stmt::expr(Expr::binary(
        BinOp::Mul,
        Expr::Number(6.0),
        Expr::Number(7.0),
    ))]);
    let out = gvm().arg("compile").arg(f.path()).output().unwrap();
    assert!(out.status.success());
    let program: Program = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(program.ops.last(), Some(&Op::Done));

    let compiled = json_file(&String::from_utf8_lossy(&out.stdout));
    gvm().arg("run").arg(compiled.path()).assert().success().stdout("42\n");
}

#[test]
fn dump_lists_instructions() {
    let f = program_file(vec![Op::Ldc(Literal::Number(1.0)), Op::Done]);
    let out = gvm().arg("dump").arg(f.path()).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("LDC"), "{text}");
    assert!(lines[1].contains("DONE"), "{text}");
}

#[test]
fn usage_errors_exit_two() {
    gvm().assert().code(2);
    gvm().args(["frobnicate", "x.json"]).assert().code(2);
    gvm().args(["run", "--fast", "x.json"]).assert().code(2);
    gvm().args(["run", "/definitely/not/here.json"]).assert().code(2);
    let bad = json_file("{ not json");
    gvm().arg("run").arg(bad.path()).assert().code(2);
}
