use crate::args::CliArgs;
use crate::commands::common::{compile_module, execute, input_path};

/// Compiles a syntax tree and runs it.
pub(crate) fn run(args: &CliArgs) {
    let program = compile_module(input_path(args));
    execute(args, &program);
}
