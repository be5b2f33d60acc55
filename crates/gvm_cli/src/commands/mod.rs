pub(crate) mod common;
pub(crate) mod compile;
pub(crate) mod dump;
pub(crate) mod exec;
pub(crate) mod run;
