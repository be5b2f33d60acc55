//! Syntax tree of the Go subset, as handed over by a parser.

use serde::{Deserialize, Serialize};

use crate::{BinOp, UnOp};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub stmts: Vec<Stmt>,
}

impl Module {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    /// `var x T = e`, `var x T` and `x := e`.
    Var(Box<VarDecl>),
    Const(Box<ConstDecl>),
    FuncDef(Box<FuncDef>),
    Return(Option<Expr>),
    If(Box<IfStmt>),
    For(Box<ForStmt>),
    Break,
    Continue,
    /// `go f(args)`; the expression must be a call.
    Go(Expr),
    /// `chan <- value`.
    Send(Box<SendStmt>),
    Block(Vec<Stmt>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Number,
    String,
    Bool,
    Chan,
    WaitGroup,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    pub init: Expr,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_body: Vec<Stmt>,
    /// `else { .. }`; an `else if` is an else body holding a single `If`.
    pub else_body: Option<Vec<Stmt>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub init: Option<Stmt>,
    pub cond: Option<Expr>,
    pub post: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SendStmt {
    pub chan: Expr,
    pub value: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Ident(String),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    /// `cond ? then : else`
    Cond(Box<CondExpr>),
    Call(Box<CallExpr>),
    /// `recv.method(args)`; only the wait-group methods exist.
    MethodCall(Box<MethodCall>),
    Assign(String, Box<Expr>),
    Func(Box<FuncLit>),
    /// `make(chan, capacity)`
    MakeChan(usize),
    /// `<-chan`
    Recv(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CondExpr {
    pub cond: Expr,
    pub then_expr: Expr,
    pub else_expr: Expr,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Expr,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub receiver: Expr,
    pub method: String,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuncLit {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn str(s: &str) -> Self {
        Expr::Str(s.to_string())
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(CallExpr { callee, args }))
    }

    pub fn method(receiver: Expr, method: &str, args: Vec<Expr>) -> Self {
        Expr::MethodCall(Box::new(MethodCall {
            receiver,
            method: method.to_string(),
            args,
        }))
    }

    pub fn assign(name: &str, value: Expr) -> Self {
        Expr::Assign(name.to_string(), Box::new(value))
    }

    pub fn recv(chan: Expr) -> Self {
        Expr::Recv(Box::new(chan))
    }
}

impl Stmt {
    pub fn var(name: &str, init: Expr) -> Self {
        Stmt::Var(Box::new(VarDecl {
            name: name.to_string(),
            ty: None,
            init: Some(init),
        }))
    }

    pub fn var_typed(name: &str, ty: TypeRef) -> Self {
        Stmt::Var(Box::new(VarDecl {
            name: name.to_string(),
            ty: Some(ty),
            init: None,
        }))
    }

    pub fn constant(name: &str, init: Expr) -> Self {
        Stmt::Const(Box::new(ConstDecl {
            name: name.to_string(),
            init,
        }))
    }

    pub fn func(name: &str, params: &[&str], body: Vec<Stmt>) -> Self {
        Stmt::FuncDef(Box::new(FuncDef {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
        }))
    }

    pub fn expr(e: Expr) -> Self {
        Stmt::Expr(e)
    }

    pub fn send(chan: Expr, value: Expr) -> Self {
        Stmt::Send(Box::new(SendStmt { chan, value }))
    }

    pub fn for_loop(init: Option<Stmt>, cond: Option<Expr>, post: Option<Expr>, body: Vec<Stmt>) -> Self {
        Stmt::For(Box::new(ForStmt { init, cond, post, body }))
    }

    pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Option<Vec<Stmt>>) -> Self {
        Stmt::If(Box::new(IfStmt {
            cond,
            then_body,
            else_body,
        }))
    }
}
