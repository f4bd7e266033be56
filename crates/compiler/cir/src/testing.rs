//! # Testing Utilities for CIR
//!
//! Small helpers to assemble CIR graphs by hand in unit tests.

use crate::{
    BlockId, CallId, CirGraph, ClosureId, Kind, Node, PrettyConfig, PrettyPrint, Procedure,
    ProcedureId, Value, VariableId,
};

/// A graph under construction together with the continuation parameters of the
/// method being built
pub struct TestGraph {
    pub graph: CirGraph,
    pub cc: VariableId,
    pub ce: VariableId,
}

impl TestGraph {
    pub fn new() -> Self {
        let mut graph = CirGraph::new();
        let cc = graph.new_normal_continuation_parameter();
        let ce = graph.new_exception_continuation_parameter();
        Self { graph, cc, ce }
    }

    pub fn method(&mut self, name: &str) -> ProcedureId {
        self.graph.new_procedure(Procedure::method(name))
    }

    pub fn builtin(&mut self, name: &str) -> ProcedureId {
        self.graph.new_procedure(Procedure::builtin(name))
    }

    pub fn local(&mut self, slot: u32) -> VariableId {
        self.graph.new_local_variable(Kind::Int, slot)
    }

    pub fn call(&mut self, procedure: impl Into<Value>, arguments: Vec<Value>) -> CallId {
        self.graph.new_call(procedure.into(), arguments)
    }

    pub fn cont(&mut self, parameters: Vec<VariableId>, body: CallId) -> ClosureId {
        self.graph.new_continuation(parameters, body)
    }

    pub fn closure(&mut self, parameters: Vec<VariableId>, body: CallId) -> ClosureId {
        self.graph.new_closure(parameters, body)
    }

    /// A block whose closure takes no parameters and returns through `cc`
    pub fn empty_block(&mut self) -> BlockId {
        let body = self.graph.new_call(Value::Variable(self.cc), vec![]);
        let closure = self.graph.new_closure(vec![], body);
        self.graph.new_block(closure)
    }

    /// Wraps `body` into a method closure binding `cc` and `ce`
    pub fn root_closure(&mut self, body: CallId) -> ClosureId {
        self.graph.new_closure(vec![self.cc, self.ce], body)
    }

    pub fn root(&mut self, body: CallId) -> Node {
        Node::Value(Value::Closure(self.root_closure(body)))
    }

    pub fn print(&self, node: impl Into<Node>) -> String {
        node.into().pretty_print(&self.graph, &PrettyConfig::default())
    }
}

impl Default for TestGraph {
    fn default() -> Self {
        Self::new()
    }
}
