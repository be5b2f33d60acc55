use std::io::Write;

use gvm_compiler::compile_program;
use gvm_ir::{Module, Program};
use gvm_runtime::{Runtime, Value};

use crate::args::CliArgs;

fn read_input(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Read failed: {e}"))
}

pub(crate) fn read_program(path: &str) -> Result<Program, String> {
    let text = read_input(path)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid program {path}: {e}"))
}

pub(crate) fn read_module(path: &str) -> Result<Module, String> {
    let text = read_input(path)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid syntax tree {path}: {e}"))
}

/// Reads and compiles a syntax tree. Unreadable input is a usage error
/// (exit 2), a program the compiler rejects exits 1.
pub(crate) fn compile_module(path: &str) -> Program {
    let module = read_module(path).unwrap_or_else(|e| fail(&e));
    match compile_program(&module) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("CompileError: {e}");
            std::process::exit(1);
        }
    }
}

/// The single `<file>` operand, or a usage error.
pub(crate) fn input_path(args: &CliArgs) -> &str {
    if args.positional.len() != 1 {
        eprintln!("Missing <file>");
        std::process::exit(2);
    }
    args.positional[0].as_str()
}

/// Runs `program`, writes its output (also when it failed) and the final
/// value to stdout, and exits 1 on a runtime error.
pub(crate) fn execute(args: &CliArgs, program: &Program) {
    let mut rt = Runtime::with_config(args.runtime_config());
    let result = rt.run(program);

    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{}", rt.output());
    match result {
        Ok(res) => {
            if res.value != Value::Undefined {
                let _ = writeln!(stdout, "{}", res.value);
            }
        }
        Err(e) => {
            let _ = stdout.flush();
            eprintln!("RuntimeError: {e}");
            std::process::exit(1);
        }
    }
}

pub(crate) fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    std::process::exit(2);
}
