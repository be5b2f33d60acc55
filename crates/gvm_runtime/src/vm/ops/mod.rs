pub(crate) mod call;
pub(crate) mod chan;
pub(crate) mod flow;
pub(crate) mod math;
pub(crate) mod sync;
