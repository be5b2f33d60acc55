use crate::args::CliArgs;
use crate::commands::common::{compile_module, fail, input_path};

pub(crate) fn run(args: &CliArgs) {
    let program = compile_module(input_path(args));
    match serde_json::to_string_pretty(&program) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&e.to_string()),
    }
}
