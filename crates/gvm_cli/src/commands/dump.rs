use std::io::Write;

use crate::args::CliArgs;
use crate::commands::common::{fail, input_path, read_program};

pub(crate) fn run(args: &CliArgs) {
    let path = input_path(args);
    let program = read_program(path).unwrap_or_else(|e| fail(&e));
    let mut out = std::io::stdout().lock();
    if let Err(e) = write!(out, "{}", program.listing()) {
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            return;
        }
        fail(&format!("stdout error: {e}"));
    }
}
