//! # CIR Calls and Java Frame Descriptors
//!
//! A call applies a procedure value to an argument list. It is the only statement
//! form of CIR: every closure body is exactly one call.
//!
//! ## Calling convention
//!
//! Calls to methods, snippets and builtins pass the normal continuation and the
//! exception continuation as their last two arguments.

use crate::{CallId, CirGraph, FrameId, NodeId, Procedure, Value};

/// A call node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub id: NodeId,
    pub procedure: Value,
    pub arguments: Vec<Value>,
    /// Source-level state at this call site, owned by the call
    pub frame: Option<FrameId>,
    pub is_native: bool,
}

impl Call {
    /// Replaces the whole argument list
    pub fn set_arguments(&mut self, arguments: Vec<Value>) {
        self.arguments = arguments;
    }

    /// The normal continuation argument, by calling convention
    pub fn normal_continuation(&self) -> Option<Value> {
        let n = self.arguments.len();
        (n >= 2).then(|| self.arguments[n - 2])
    }

    /// The exception continuation argument, by calling convention
    pub fn exception_continuation(&self) -> Option<Value> {
        self.arguments.last().copied()
    }
}

/// Captured local and stack slots at a call site, chained through inlined callers.
///
/// The chain is owned by the call that points at its innermost element; copying a
/// call copies its chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaFrameDescriptor {
    pub parent: Option<FrameId>,
    /// Opaque identity of the method this frame belongs to
    pub method: String,
    pub bci: u32,
    pub locals: Vec<Value>,
    pub stack_slots: Vec<Value>,
}

impl JavaFrameDescriptor {
    pub fn new(method: impl Into<String>, bci: u32, locals: Vec<Value>, stack_slots: Vec<Value>) -> Self {
        Self {
            parent: None,
            method: method.into(),
            bci,
            locals,
            stack_slots,
        }
    }

    /// All slot values of this element (locals first)
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.locals.iter().chain(self.stack_slots.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.locals.iter_mut().chain(self.stack_slots.iter_mut())
    }
}

impl CirGraph {
    /// The frame descriptor elements of a chain, innermost first
    pub fn frame_chain(&self, frame: Option<FrameId>) -> Vec<FrameId> {
        let mut chain = Vec::new();
        let mut current = frame;
        while let Some(id) = current {
            chain.push(id);
            current = self.frames[id].parent;
        }
        chain
    }

    /// Deep-copies a frame descriptor chain, mapping every slot value through `map`
    pub fn copy_frame_chain(
        &mut self,
        frame: FrameId,
        mut map: impl FnMut(Value) -> Value,
    ) -> FrameId {
        let chain = self.frame_chain(Some(frame));
        let mut parent = None;
        for &element in chain.iter().rev() {
            let mut copy = self.frames[element].clone();
            copy.parent = parent;
            for value in copy.values_mut() {
                *value = map(*value);
            }
            parent = Some(self.frames.push(copy));
        }
        // The chain is never empty: it starts at `frame`.
        parent.unwrap_or(frame)
    }

    /// Returns true if the call's procedure may need source-level state at run time.
    ///
    /// Unknown procedures (variables) are assumed to need it. Local control transfers
    /// (closures, blocks) and switches never do.
    pub fn needs_java_frame_descriptor(&self, call: CallId) -> bool {
        match self.calls[call].procedure {
            Value::Variable(variable) => !self.variables[variable].is_continuation_parameter(),
            Value::Procedure(procedure) => match &self.procedures[procedure] {
                Procedure::Method { .. } | Procedure::Snippet { .. } => true,
                Procedure::Builtin { can_trap, .. } => *can_trap,
                Procedure::Switch { .. } => false,
            },
            Value::Closure(_) | Value::Block(_) | Value::Constant(_) | Value::Undefined => false,
        }
    }

    /// Drops the frame descriptor of a call whose procedure no longer needs one
    pub fn clear_java_frame_descriptor_if_not_needed(&mut self, call: CallId) {
        if self.calls[call].frame.is_some() && !self.needs_java_frame_descriptor(call) {
            log::trace!("clearing frame descriptor of call {:?}", self.calls[call].id);
            self.calls[call].frame = None;
        }
    }
}
