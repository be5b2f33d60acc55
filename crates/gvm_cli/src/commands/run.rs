use crate::args::CliArgs;
use crate::commands::common::{execute, fail, input_path, read_program};

pub(crate) fn run(args: &CliArgs) {
    let path = input_path(args);
    let program = read_program(path).unwrap_or_else(|e| fail(&e));
    execute(args, &program);
}
