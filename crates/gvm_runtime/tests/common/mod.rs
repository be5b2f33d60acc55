#![allow(dead_code)]

use gvm_compiler::compile_program;
use gvm_ir::{BinOp, Expr, Module, Program, Stmt};
use gvm_runtime::{Outcome, Runtime, RuntimeConfig, Value};

pub const SEED: u64 = 0x5eed;

pub fn config() -> RuntimeConfig {
    RuntimeConfig {
        seed: Some(SEED),
        trace: false,
        ..RuntimeConfig::default()
    }
}

pub fn compile(stmts: Vec<Stmt>) -> Program {
    compile_program(&Module::new(stmts)).expect("program compiles")
}

pub fn run_with(config: RuntimeConfig, stmts: Vec<Stmt>) -> Outcome {
    Runtime::with_config(config).execute(&compile(stmts))
}

pub fn run(stmts: Vec<Stmt>) -> Outcome {
    run_with(config(), stmts)
}

pub fn run_ok(stmts: Vec<Stmt>) -> Value {
    match run(stmts) {
        Outcome::Finished(v) => v,
        Outcome::Error(e) => panic!("unexpected runtime error: {e}"),
    }
}

pub fn run_err(stmts: Vec<Stmt>) -> String {
    match run(stmts) {
        Outcome::Error(e) => e,
        Outcome::Finished(v) => panic!("expected an error, got {v}"),
    }
}

pub fn num(n: f64) -> Expr {
    Expr::Number(n)
}

pub fn id(name: &str) -> Expr {
    Expr::ident(name)
}

pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(op, lhs, rhs)
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(id(name), args)
}

pub fn set(name: &str, value: Expr) -> Stmt {
    Stmt::expr(Expr::assign(name, value))
}

/// `for var i = 0; i < n; i = i + 1 { body }`
pub fn count_loop(i: &str, n: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::for_loop(
        Some(Stmt::var(i, num(0.0))),
        Some(bin(BinOp::Lt, id(i), n)),
        Some(Expr::assign(i, bin(BinOp::Add, id(i), num(1.0)))),
        body,
    )
}
