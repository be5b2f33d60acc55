use crate::core::Address;

/// Machine registers of one logical thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    /// Operand stack.
    pub os: Vec<Address>,
    pub pc: usize,
    pub env: Address,
    /// Return stack of block and call frames.
    pub rts: Vec<Address>,
}

impl Registers {
    pub fn new(env: Address) -> Self {
        Self {
            os: Vec::new(),
            pc: 0,
            env,
            rts: Vec::new(),
        }
    }

    pub(crate) fn for_each_root(&self, f: &mut dyn FnMut(Address)) {
        for &a in &self.os {
            f(a);
        }
        f(self.env);
        for &a in &self.rts {
            f(a);
        }
    }
}
