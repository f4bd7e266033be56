//! # CIR Variables and the Variable Factory
//!
//! Variables are identity-significant leaves. Their kind records the storage class
//! the front end assigned (stack slot, local slot, method parameter, continuation
//! parameter, temporary) for later lowering; inside CIR only identity matters.
//!
//! All variables are created through the factory methods on [`CirGraph`], so that
//! "the same slot" can be cloned with a fresh identity while remembering where it
//! came from.

use crate::{CirGraph, Kind, NodeId, VariableId};

/// Storage class of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// A Java local variable slot
    Local { slot: u32 },
    /// A Java operand stack slot
    Stack { slot: u32 },
    /// A parameter of the compiled method
    MethodParameter { index: u32 },
    /// The parameter receiving the normal continuation
    NormalContinuationParameter,
    /// The parameter receiving the exception continuation
    ExceptionContinuationParameter,
    /// A compiler temporary
    Temporary,
}

/// A CIR variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub id: NodeId,
    pub kind: VariableKind,
    pub value_kind: Kind,
    /// The variable this one was cloned from, if any
    pub origin: Option<VariableId>,
}

impl Variable {
    /// Returns true for normal and exception continuation parameters
    pub const fn is_continuation_parameter(&self) -> bool {
        matches!(
            self.kind,
            VariableKind::NormalContinuationParameter
                | VariableKind::ExceptionContinuationParameter
        )
    }

    /// Short name used by the printer
    pub fn prefix(&self) -> String {
        match self.kind {
            VariableKind::Local { slot } => format!("l{slot}"),
            VariableKind::Stack { slot } => format!("s{slot}"),
            VariableKind::MethodParameter { index } => format!("p{index}"),
            VariableKind::NormalContinuationParameter => "cc".to_string(),
            VariableKind::ExceptionContinuationParameter => "ce".to_string(),
            VariableKind::Temporary => "t".to_string(),
        }
    }
}

impl CirGraph {
    fn new_variable(&mut self, kind: VariableKind, value_kind: Kind) -> VariableId {
        let id = self.next_node_id();
        self.variables.push(Variable {
            id,
            kind,
            value_kind,
            origin: None,
        })
    }

    pub fn new_local_variable(&mut self, value_kind: Kind, slot: u32) -> VariableId {
        self.new_variable(VariableKind::Local { slot }, value_kind)
    }

    pub fn new_stack_variable(&mut self, value_kind: Kind, slot: u32) -> VariableId {
        self.new_variable(VariableKind::Stack { slot }, value_kind)
    }

    pub fn new_method_parameter(&mut self, value_kind: Kind, index: u32) -> VariableId {
        self.new_variable(VariableKind::MethodParameter { index }, value_kind)
    }

    pub fn new_temporary(&mut self, value_kind: Kind) -> VariableId {
        self.new_variable(VariableKind::Temporary, value_kind)
    }

    pub fn new_normal_continuation_parameter(&mut self) -> VariableId {
        self.new_variable(VariableKind::NormalContinuationParameter, Kind::Reference)
    }

    pub fn new_exception_continuation_parameter(&mut self) -> VariableId {
        self.new_variable(VariableKind::ExceptionContinuationParameter, Kind::Reference)
    }

    /// Creates a variable of the same kind as `template` with a distinct identity.
    ///
    /// Provenance is kept: the fresh variable's `origin` is the template's origin if it
    /// has one, or the template itself.
    pub fn create_fresh(&mut self, template: VariableId) -> VariableId {
        let source = &self.variables[template];
        let kind = source.kind;
        let value_kind = source.value_kind;
        let origin = source.origin.unwrap_or(template);
        let id = self.next_node_id();
        self.variables.push(Variable {
            id,
            kind,
            value_kind,
            origin: Some(origin),
        })
    }

    /// Fresh copies of a parameter list, in order
    pub fn create_fresh_all(&mut self, templates: &[VariableId]) -> Vec<VariableId> {
        templates.iter().map(|&v| self.create_fresh(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_fresh_keeps_kind_and_provenance() {
        let mut graph = CirGraph::new();
        let local = graph.new_local_variable(Kind::Int, 3);
        let fresh = graph.create_fresh(local);
        let fresher = graph.create_fresh(fresh);

        assert_ne!(local, fresh);
        assert_ne!(fresh, fresher);
        assert_eq!(graph.variable(fresh).kind, VariableKind::Local { slot: 3 });
        assert_eq!(graph.variable(fresh).value_kind, Kind::Int);
        assert_eq!(graph.variable(fresh).origin, Some(local));
        assert_eq!(graph.variable(fresher).origin, Some(local));
        assert_ne!(graph.variable(fresh).id, graph.variable(local).id);
    }

    #[test]
    fn test_continuation_parameters() {
        let mut graph = CirGraph::new();
        let cc = graph.new_normal_continuation_parameter();
        let ce = graph.new_exception_continuation_parameter();
        let t = graph.new_temporary(Kind::Long);

        assert!(graph.variable(cc).is_continuation_parameter());
        assert!(graph.variable(ce).is_continuation_parameter());
        assert!(!graph.variable(t).is_continuation_parameter());
        assert_eq!(graph.variable(ce).prefix(), "ce");
    }
}
