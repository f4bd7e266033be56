//! # CIR Closures and Continuations

use crate::{CallId, NodeId, VariableId};

/// Distinguishes plain closures from continuations.
///
/// The two share their structure; a continuation is a closure used in continuation
/// position and may later be lifted into a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClosureKind {
    Procedure,
    Continuation,
}

/// A closure: a parameter list and exactly one call as body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    pub id: NodeId,
    pub kind: ClosureKind,
    /// Pairwise distinct variables bound by this closure
    pub parameters: Vec<VariableId>,
    pub body: CallId,
}

impl Closure {
    pub const fn is_continuation(&self) -> bool {
        matches!(self.kind, ClosureKind::Continuation)
    }

    /// Replaces the whole parameter list
    pub fn set_parameters(&mut self, parameters: Vec<VariableId>) {
        debug_assert!(
            parameters
                .iter()
                .enumerate()
                .all(|(i, p)| !parameters[..i].contains(p)),
            "closure parameters must be pairwise distinct"
        );
        self.parameters = parameters;
    }

    pub fn parameter_index(&self, variable: VariableId) -> Option<usize> {
        self.parameters.iter().position(|&p| p == variable)
    }
}
