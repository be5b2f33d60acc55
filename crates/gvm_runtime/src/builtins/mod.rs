//! Functions bound in the outermost frame of every environment.

mod common;
mod core;
mod math;

pub use self::core::{builtin_len, builtin_print, builtin_println, builtin_string};
pub use self::math::{builtin_abs, builtin_max, builtin_min};
