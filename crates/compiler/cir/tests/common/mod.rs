//! Common test utilities for CIR integration tests

#![allow(dead_code)]

use cps_compiler_cir::{
    BlockId, CallId, CirGraph, ClosureId, Kind, Node, PrettyConfig, PrettyPrint, Procedure,
    ProcedureId, Value, VariableId,
};

/// A graph under construction, with the continuation parameters of the method
/// being built
pub struct Builder {
    pub graph: CirGraph,
    pub cc: VariableId,
    pub ce: VariableId,
}

impl Builder {
    pub fn new() -> Self {
        let mut graph = CirGraph::new();
        let cc = graph.new_normal_continuation_parameter();
        let ce = graph.new_exception_continuation_parameter();
        Self { graph, cc, ce }
    }

    pub fn method(&mut self, name: &str) -> ProcedureId {
        self.graph.new_procedure(Procedure::method(name))
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

    pub fn block(&mut self, parameters: Vec<VariableId>, body: CallId) -> BlockId {
        let closure = self.graph.new_closure(parameters, body);
        self.graph.new_block(closure)
    }

    /// Wraps `body` into a method closure binding `cc` and `ce`
    pub fn root(&mut self, body: CallId) -> Node {
        let closure = self.graph.new_closure(vec![self.cc, self.ce], body);
        Node::Value(Value::Closure(closure))
    }

    pub fn print(&self, node: impl Into<Node>) -> String {
        node.into().pretty_print(&self.graph, &PrettyConfig::default())
    }
}
