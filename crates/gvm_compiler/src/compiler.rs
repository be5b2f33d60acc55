//! Lowers the syntax tree into the flat instruction array.
//!
//! Every statement leaves exactly one value on the operand stack; statements
//! in a sequence are separated by `Pop`, so a block evaluates to the value of
//! its last statement. A block that declares names gets its own frame
//! (`EnterScope`/`ExitScope`); loops always get one so that `Break` and
//! `Continue` can find their `LoopMarker` by counting scope depth.

use gvm_ir::{
    BinOp, CondExpr, Expr, ForStmt, FuncDef, IfStmt, Literal, LogicalOp, MethodCall, Module, Op,
    Program, Stmt, TypeRef, VarDecl,
};

use crate::CompileError;
use crate::scope::{Binding, Scope, Scopes, scan};

pub fn compile_program(module: &Module) -> Result<Program, CompileError> {
    let mut c = Compiler::new();
    c.compile_block(&module.stmts)?;
    c.ops.push(Op::Done);
    Ok(Program::new(c.ops))
}

struct Compiler {
    ops: Vec<Op>,
    scopes: Scopes,
    loop_depth: usize,
    fn_depth: usize,
}

impl Compiler {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            scopes: Scopes::with_builtins(),
            loop_depth: 0,
            fn_depth: 0,
        }
    }

    #[inline]
    fn emit(&mut self, op: Op) -> usize {
        let pos = self.ops.len();
        self.ops.push(op);
        pos
    }

    #[inline]
    fn here(&self) -> usize {
        self.ops.len()
    }

    fn patch_jump(&mut self, pos: usize, target: usize) {
        match &mut self.ops[pos] {
            Op::Jof(to) | Op::Goto(to) => *to = target,
            Op::Ldf { addr, .. } => *addr = target,
            Op::LoopMarker { cont } => *cont = target,
            _ => {}
        }
    }

    fn compile_block(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        let names = scan(stmts);
        if names.is_empty() {
            return self.compile_sequence(stmts);
        }
        let scope = Scope::new(names)?;
        self.emit(Op::EnterScope(scope.len()));
        self.scopes.push(scope)?;
        self.compile_sequence(stmts)?;
        self.scopes.pop();
        self.emit(Op::ExitScope);
        Ok(())
    }

    fn compile_sequence(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        if stmts.is_empty() {
            self.emit(Op::Ldc(Literal::Undefined));
            return Ok(());
        }
        for (i, s) in stmts.iter().enumerate() {
            if i > 0 {
                self.emit(Op::Pop);
            }
            self.compile_stmt(s)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expr(e) => self.compile_expr(e),
            Stmt::Var(v) => self.compile_var(v),
            Stmt::Const(c) => {
                self.compile_expr(&c.init)?;
                self.emit_declare(&c.name)
            }
            Stmt::FuncDef(f) => self.compile_func_def(f),
            Stmt::Return(v) => self.compile_return(v.as_ref()),
            Stmt::If(s) => self.compile_if(s),
            Stmt::For(s) => self.compile_for(s),
            Stmt::Break => {
                if self.loop_depth == 0 {
                    return Err(CompileError::BreakOutsideLoop);
                }
                self.emit(Op::Break);
                Ok(())
            }
            Stmt::Continue => {
                if self.loop_depth == 0 {
                    return Err(CompileError::ContinueOutsideLoop);
                }
                self.emit(Op::Continue);
                Ok(())
            }
            Stmt::Go(e) => self.compile_go(e),
            Stmt::Send(s) => {
                self.compile_expr(&s.chan)?;
                self.compile_expr(&s.value)?;
                self.emit(Op::Send);
                Ok(())
            }
            Stmt::Block(stmts) => self.compile_block(stmts),
        }
    }

    /// Stores the top of stack into a freshly declared name. Declarations
    /// bypass the constant check that plain assignment performs.
    fn emit_declare(&mut self, name: &str) -> Result<(), CompileError> {
        let (pos, _) = self.scopes.resolve(name)?;
        self.emit(Op::Assign(pos));
        Ok(())
    }

    fn compile_var(&mut self, v: &VarDecl) -> Result<(), CompileError> {
        match (&v.init, v.ty) {
            (Some(init), _) => self.compile_expr(init)?,
            (None, Some(TypeRef::Number)) => {
                self.emit(Op::Ldc(Literal::Number(0.0)));
            }
            (None, Some(TypeRef::String)) => {
                self.emit(Op::Ldc(Literal::Str(String::new())));
            }
            (None, Some(TypeRef::Bool)) => {
                self.emit(Op::Ldc(Literal::Bool(false)));
            }
            (None, Some(TypeRef::Chan)) => {
                self.emit(Op::Ldc(Literal::Null));
            }
            (None, Some(TypeRef::WaitGroup)) => {
                self.emit(Op::NewWaitGroup);
            }
            (None, None) => {
                self.emit(Op::Ldc(Literal::Undefined));
            }
        }
        self.emit_declare(&v.name)
    }

    fn compile_func_def(&mut self, def: &FuncDef) -> Result<(), CompileError> {
        self.compile_function(&def.params, &def.body)?;
        self.emit_declare(&def.name)
    }

    /// `Ldf` over a body that the following `Goto` jumps past. The body's
    /// trailing `Pop; Ldc undefined; Reset` makes falling off the end
    /// return `undefined`.
    fn compile_function(&mut self, params: &[String], body: &[Stmt]) -> Result<(), CompileError> {
        let ldf = self.emit(Op::Ldf {
            arity: params.len(),
            addr: usize::MAX,
        });
        let skip = self.emit(Op::Goto(usize::MAX));
        let entry = self.here();
        self.patch_jump(ldf, entry);

        let frame = Scope::new(params.iter().map(|p| (p.clone(), Binding::Var)).collect())?;
        self.scopes.push(frame)?;
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.fn_depth += 1;

        let res = self.compile_block(body);

        self.fn_depth -= 1;
        self.loop_depth = saved_loops;
        self.scopes.pop();
        res?;

        self.emit(Op::Pop);
        self.emit(Op::Ldc(Literal::Undefined));
        self.emit(Op::Reset);
        let end = self.here();
        self.patch_jump(skip, end);
        Ok(())
    }

    fn compile_return(&mut self, value: Option<&Expr>) -> Result<(), CompileError> {
        if self.fn_depth == 0 {
            return Err(CompileError::ReturnOutsideFunction);
        }
        match value {
            None => {
                self.emit(Op::Ldc(Literal::Undefined));
                self.emit(Op::Reset);
            }
            Some(e) => self.compile_tail(e)?,
        }
        Ok(())
    }

    /// Compiles `e` in tail position: calls become `TailCall`, conditionals
    /// push the tail position into both arms.
    fn compile_tail(&mut self, e: &Expr) -> Result<(), CompileError> {
        match e {
            Expr::Call(c) => {
                self.compile_expr(&c.callee)?;
                for a in &c.args {
                    self.compile_expr(a)?;
                }
                self.emit(Op::TailCall(c.args.len()));
            }
            Expr::Cond(c) => {
                self.compile_expr(&c.cond)?;
                let jof = self.emit(Op::Jof(usize::MAX));
                self.compile_tail(&c.then_expr)?;
                let else_start = self.here();
                self.patch_jump(jof, else_start);
                self.compile_tail(&c.else_expr)?;
            }
            _ => {
                self.compile_expr(e)?;
                self.emit(Op::Reset);
            }
        }
        Ok(())
    }

    fn compile_if(&mut self, s: &IfStmt) -> Result<(), CompileError> {
        self.compile_expr(&s.cond)?;
        let jof = self.emit(Op::Jof(usize::MAX));
        self.compile_block(&s.then_body)?;
        let goto = self.emit(Op::Goto(usize::MAX));
        let else_start = self.here();
        self.patch_jump(jof, else_start);
        match &s.else_body {
            Some(body) => self.compile_block(body)?,
            None => {
                self.emit(Op::Ldc(Literal::Undefined));
            }
        }
        let end = self.here();
        self.patch_jump(goto, end);
        Ok(())
    }

    /// ```text
    ///         ENTER_SCOPE n
    ///         init; POP
    /// test:   cond; JOF exit
    ///         body; POP
    /// post:   post; POP
    ///         GOTO test
    /// exit:   LOOP_MARKER cont=post
    ///         EXIT_SCOPE
    ///         LDC undefined
    /// ```
    fn compile_for(&mut self, s: &ForStmt) -> Result<(), CompileError> {
        let names = s.init.as_ref().map(std::slice::from_ref).map(scan).unwrap_or_default();
        let scope = Scope::new(names)?;
        self.emit(Op::EnterScope(scope.len()));
        self.scopes.push(scope)?;

        if let Some(init) = &s.init {
            self.compile_stmt(init)?;
            self.emit(Op::Pop);
        }
        let test = self.here();
        let exit_jump = match &s.cond {
            Some(cond) => {
                self.compile_expr(cond)?;
                Some(self.emit(Op::Jof(usize::MAX)))
            }
            None => None,
        };

        self.loop_depth += 1;
        let body = self.compile_block(&s.body);
        self.loop_depth -= 1;
        body?;
        self.emit(Op::Pop);

        let post = self.here();
        if let Some(e) = &s.post {
            self.compile_expr(e)?;
            self.emit(Op::Pop);
        }
        self.emit(Op::Goto(test));
        let exit = self.emit(Op::LoopMarker { cont: usize::MAX });
        self.patch_jump(exit, post);
        if let Some(j) = exit_jump {
            self.patch_jump(j, exit);
        }

        self.scopes.pop();
        self.emit(Op::ExitScope);
        self.emit(Op::Ldc(Literal::Undefined));
        Ok(())
    }

    fn compile_go(&mut self, e: &Expr) -> Result<(), CompileError> {
        let Expr::Call(c) = e else {
            return Err(CompileError::GoWithoutCall);
        };
        self.compile_expr(&c.callee)?;
        for a in &c.args {
            self.compile_expr(a)?;
        }
        let n = c.args.len();
        self.emit(Op::Go(n));
        self.emit(Op::Call(n));
        self.emit(Op::GoEnd);
        Ok(())
    }

    fn compile_expr(&mut self, e: &Expr) -> Result<(), CompileError> {
        match e {
            Expr::Number(n) => {
                self.emit(Op::Ldc(Literal::Number(*n)));
            }
            Expr::Str(s) => {
                self.emit(Op::Ldc(Literal::Str(s.clone())));
            }
            Expr::Bool(b) => {
                self.emit(Op::Ldc(Literal::Bool(*b)));
            }
            Expr::Null => {
                self.emit(Op::Ldc(Literal::Null));
            }
            Expr::Ident(name) => {
                let (pos, _) = self.scopes.resolve(name)?;
                self.emit(Op::Ld(pos));
            }
            Expr::Unary(op, inner) => {
                self.compile_expr(inner)?;
                self.emit(Op::Unop(*op));
            }
            Expr::Binary(op, l, r) => self.compile_binary(*op, l, r)?,
            Expr::Logical(op, l, r) => self.compile_logical(*op, l, r)?,
            Expr::Cond(c) => self.compile_cond(c)?,
            Expr::Call(c) => {
                self.compile_expr(&c.callee)?;
                for a in &c.args {
                    self.compile_expr(a)?;
                }
                self.emit(Op::Call(c.args.len()));
            }
            Expr::MethodCall(m) => self.compile_method_call(m)?,
            Expr::Assign(name, value) => {
                let (pos, binding) = self.scopes.resolve(name)?;
                if !binding.reassignable() {
                    return Err(CompileError::AssignToConstant(name.clone()));
                }
                self.compile_expr(value)?;
                self.emit(Op::Assign(pos));
            }
            Expr::Func(f) => self.compile_function(&f.params, &f.body)?,
            Expr::MakeChan(capacity) => {
                self.emit(Op::NewChan {
                    capacity: *capacity,
                });
            }
            Expr::Recv(chan) => {
                self.compile_expr(chan)?;
                self.emit(Op::Recv);
            }
        }
        Ok(())
    }

    fn compile_binary(&mut self, op: BinOp, l: &Expr, r: &Expr) -> Result<(), CompileError> {
        self.compile_expr(l)?;
        self.compile_expr(r)?;
        self.emit(Op::Binop(op));
        Ok(())
    }

    /// `a && b` is `a ? b : false`, `a || b` is `a ? true : b`.
    fn compile_logical(&mut self, op: LogicalOp, l: &Expr, r: &Expr) -> Result<(), CompileError> {
        let (then_expr, else_expr) = match op {
            LogicalOp::And => (r.clone(), Expr::Bool(false)),
            LogicalOp::Or => (Expr::Bool(true), r.clone()),
        };
        self.compile_cond(&CondExpr {
            cond: l.clone(),
            then_expr,
            else_expr,
        })
    }

    fn compile_cond(&mut self, c: &CondExpr) -> Result<(), CompileError> {
        self.compile_expr(&c.cond)?;
        let jof = self.emit(Op::Jof(usize::MAX));
        self.compile_expr(&c.then_expr)?;
        let goto = self.emit(Op::Goto(usize::MAX));
        let else_start = self.here();
        self.patch_jump(jof, else_start);
        self.compile_expr(&c.else_expr)?;
        let end = self.here();
        self.patch_jump(goto, end);
        Ok(())
    }

    fn compile_method_call(&mut self, m: &MethodCall) -> Result<(), CompileError> {
        let (op, arity) = match m.method.as_str() {
            "Add" => (Op::WgAdd, 1),
            "Done" => (Op::WgDone, 0),
            "Wait" => (Op::WgWait, 0),
            other => return Err(CompileError::UnknownMethod(other.to_string())),
        };
        if m.args.len() != arity {
            return Err(CompileError::MethodArity {
                method: m.method.clone(),
                expected: arity,
                got: m.args.len(),
            });
        }
        self.compile_expr(&m.receiver)?;
        for a in &m.args {
            self.compile_expr(a)?;
        }
        self.emit(op);
        Ok(())
    }
}
