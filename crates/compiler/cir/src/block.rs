//! # CIR Blocks
//!
//! A block is a shareable wrapper around one closure. Many calls may name the same
//! block as their procedure; this is how merge points and shared continuations are
//! represented without duplicating the closure.
//!
//! The `calls` list of a block is only accurate right after
//! [`crate::analysis::CirBlockUpdating`] (or its scoped variant) ran. Passes that
//! add or remove block calls must run an update before anything relies on counts.

use crate::analysis::free_variables::convert_to_block;
use crate::{BlockId, CallId, CirGraph, ClosureId, NodeId, Value};

/// The role a block plays for later lowering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockRole {
    Normal,
    ExceptionDispatcher,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: NodeId,
    pub role: BlockRole,
    pub closure: ClosureId,
    /// Calls whose procedure is this block, as of the last block update
    pub calls: Vec<CallId>,
}

impl Block {
    /// Forgets the (possibly stale) call list
    pub fn reset(&mut self) {
        self.calls.clear();
    }

    pub fn add_call(&mut self, call: CallId) {
        self.calls.push(call);
    }

    pub fn number_of_calls(&self) -> usize {
        self.calls.len()
    }
}

impl CirGraph {
    /// Moves the body of `closure` into a fresh block and makes the closure call it.
    ///
    /// Before: `{cont[k] . body}`
    /// After:  `{cont[k] . B(fv..)}` with `B = {proc[fv'..] . body'}`, where `fv` are the
    /// free variables of `body` and `body'` refers to fresh copies of them. Blocks
    /// called from `body` keep referring to `fv`, which stay bound around the closure.
    ///
    /// Returns the new block and the new body call of `closure`.
    pub fn make_block_call(&mut self, closure: ClosureId, role: BlockRole) -> (BlockId, CallId) {
        let body = self.closures[closure].body;
        let (block, free_variables) = convert_to_block(self, body, role, &[]);
        let arguments = free_variables.into_iter().map(Value::Variable).collect();
        let call = self.new_call(Value::Block(block), arguments);
        self.closures[closure].body = call;
        (block, call)
    }
}
