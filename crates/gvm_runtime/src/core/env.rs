//! Frames and environments.
//!
//! A frame is a node whose words are variable slots; an environment is a
//! node whose words are frames, outermost first. Extending an environment
//! copies it into a node one word larger, so environments are never shared
//! mutably and a closure's captured environment stays valid.

use gvm_ir::Position;

use super::heap::{Address, Heap, Roots, Tag};
use crate::errors::VmError;

impl Heap {
    /// A frame of `slots` unassigned variables.
    pub fn new_frame(&mut self, slots: usize, roots: &dyn Roots) -> Result<Address, VmError> {
        self.allocate(Tag::Frame, slots + 1, roots)
    }

    /// The environment with no frames.
    pub fn empty_env(&mut self, roots: &dyn Roots) -> Result<Address, VmError> {
        self.allocate(Tag::Environment, 1, roots)
    }

    pub fn frame_count(&self, env: Address) -> usize {
        self.size(env) - 1
    }

    /// `env` plus `frame` as its innermost frame. Both must be reachable
    /// from `roots` or the allocating set.
    pub fn extend_env(&mut self, env: Address, frame: Address, roots: &dyn Roots) -> Result<Address, VmError> {
        let frames = self.frame_count(env);
        let ext = self.allocate(Tag::Environment, frames + 2, roots)?;
        for i in 1..=frames {
            let f = self.child(env, i);
            self.set_child(ext, i, f);
        }
        self.set_child(ext, frames + 1, frame);
        Ok(ext)
    }

    fn slot_index(&self, env: Address, pos: Position) -> Result<(Address, usize), VmError> {
        let bad = VmError::InvalidPosition {
            frame: pos.frame,
            slot: pos.slot,
        };
        if pos.frame >= self.frame_count(env) {
            return Err(bad);
        }
        let frame = self.child(env, pos.frame + 1);
        if self.tag(frame) != Tag::Frame || pos.slot + 1 >= self.size(frame) {
            return Err(bad);
        }
        Ok((frame, pos.slot + 1))
    }

    /// The value at `pos`, which may be the unassigned singleton.
    pub fn lookup(&self, env: Address, pos: Position) -> Result<Address, VmError> {
        let (frame, i) = self.slot_index(env, pos)?;
        Ok(self.child(frame, i))
    }

    pub fn assign(&mut self, env: Address, pos: Position, value: Address) -> Result<(), VmError> {
        let (frame, i) = self.slot_index(env, pos)?;
        self.set_child(frame, i, value);
        Ok(())
    }

    /// Stores `value` into slot `slot` of a frame being filled.
    pub(crate) fn init_slot(&mut self, frame: Address, slot: usize, value: Address) {
        self.set_child(frame, slot + 1, value);
    }
}
