//! Flat instruction array consumed by the gvm interpreter.
//!
//! Jump targets are absolute indices into `Program::ops`. The interpreter
//! trusts the layout produced by the compiler; see the notes on `Go`,
//! `Ldf` and `LoopMarker` for the sequences it relies on.

use serde::{Deserialize, Serialize};

/// Words per heap node, header included. Frames and environments are single
/// nodes, so a scope holds at most `MAX_FRAME_SLOTS` locals and an
/// environment at most `MAX_FRAME_SLOTS` frames.
pub const NODE_SIZE: usize = 10;
pub const MAX_FRAME_SLOTS: usize = NODE_SIZE - 1;

/// A literal boxed by `Op::Ldc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    Str(String),
    Null,
    Undefined,
}

/// Lexical address of a variable: frame index within the environment
/// (outermost first) and slot index within that frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub frame: usize,
    pub slot: usize,
}

impl Position {
    pub const fn new(frame: usize, slot: usize) -> Self {
        Self { frame, slot }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Push a boxed literal.
    Ldc(Literal),
    /// Push the value at a position; unassigned slots are an error.
    Ld(Position),
    /// Store top of stack at a position without popping it.
    Assign(Position),
    /// Build a closure over the current environment. Always followed by a
    /// `Goto` that skips the function body starting at `addr`.
    Ldf { arity: usize, addr: usize },
    Call(usize),
    TailCall(usize),
    /// Return: unwind the return stack to the nearest call frame.
    Reset,
    /// Push a block frame and extend the environment by `n` unassigned slots.
    EnterScope(usize),
    ExitScope,
    Pop,
    Unop(UnOp),
    Binop(BinOp),
    /// Pop a boolean; jump to the address when it is false.
    Jof(usize),
    Goto(usize),
    /// Closes a loop. `Break` resumes at the following instruction,
    /// `Continue` at `cont`. Executing it normally does nothing.
    LoopMarker { cont: usize },
    Break,
    Continue,
    /// Spawn a goroutine from the function and `n` arguments on the stack.
    /// The compiler emits `Go(n) Call(n) GoEnd`; the new thread starts at
    /// the `Call`, the spawning thread resumes after the `GoEnd`.
    Go(usize),
    GoEnd,
    /// Capacity 0 makes an unbuffered channel.
    NewChan { capacity: usize },
    /// Stack: channel, value.
    Send,
    /// Stack: channel.
    Recv,
    NewWaitGroup,
    /// Stack: wait-group, delta.
    WgAdd,
    /// Stack: wait-group.
    WgDone,
    /// Stack: wait-group.
    WgWait,
    Done,
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Ldc(_) => "LDC",
            Op::Ld(_) => "LD",
            Op::Assign(_) => "ASSIGN",
            Op::Ldf { .. } => "LDF",
            Op::Call(_) => "CALL",
            Op::TailCall(_) => "TAIL_CALL",
            Op::Reset => "RESET",
            Op::EnterScope(_) => "ENTER_SCOPE",
            Op::ExitScope => "EXIT_SCOPE",
            Op::Pop => "POP",
            Op::Unop(_) => "UNOP",
            Op::Binop(_) => "BINOP",
            Op::Jof(_) => "JOF",
            Op::Goto(_) => "GOTO",
            Op::LoopMarker { .. } => "LOOP_MARKER",
            Op::Break => "BREAK",
            Op::Continue => "CONTINUE",
            Op::Go(_) => "GO",
            Op::GoEnd => "GO_END",
            Op::NewChan { .. } => "NEW_CHAN",
            Op::Send => "SEND",
            Op::Recv => "RECV",
            Op::NewWaitGroup => "NEW_WAITGROUP",
            Op::WgAdd => "WG_ADD",
            Op::WgDone => "WG_DONE",
            Op::WgWait => "WG_WAIT",
            Op::Done => "DONE",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// One instruction per line, prefixed with its address.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (pc, op) in self.ops.iter().enumerate() {
            let operands = match op {
                Op::Ldc(lit) => format!("{lit:?}"),
                Op::Ld(p) | Op::Assign(p) => format!("({}, {})", p.frame, p.slot),
                Op::Ldf { arity, addr } => format!("arity={arity} addr={addr}"),
                Op::Call(n) | Op::TailCall(n) | Op::Go(n) | Op::EnterScope(n) => n.to_string(),
                Op::Unop(u) => format!("{u:?}"),
                Op::Binop(b) => b.symbol().to_string(),
                Op::Jof(a) | Op::Goto(a) => a.to_string(),
                Op::LoopMarker { cont } => format!("cont={cont}"),
                Op::NewChan { capacity } => format!("capacity={capacity}"),
                _ => String::new(),
            };
            if operands.is_empty() {
                out.push_str(&format!("{pc:>4}  {}\n", op.mnemonic()));
            } else {
                out.push_str(&format!("{pc:>4}  {} {operands}\n", op.mnemonic()));
            }
        }
        out
    }
}
