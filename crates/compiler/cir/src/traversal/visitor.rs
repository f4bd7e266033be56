//! Visitors over the CIR node taxonomy.
//!
//! Each callback's default delegates to the callback of the nearest more general
//! node kind, so a visitor overrides only the cases it cares about:
//!
//! ```text
//! node
//! +- call
//! +- value
//!    +- constant, undefined
//!    +- closure
//!    |  +- continuation
//!    +- block
//!    +- procedure
//!    |  +- method, snippet
//!    |  +- builtin
//!    |     +- switch
//!    +- variable
//!       +- local, stack, method parameter, temporary
//!       +- continuation parameter
//!          +- normal, exception
//! ```

use super::Node;
use crate::{
    BlockId, CallId, CirGraph, ClosureId, Constant, Procedure, ProcedureId, Value, VariableId,
    VariableKind,
};

/// Unit-returning callbacks, one per node kind
pub trait CirVisitor {
    fn visit_node(&mut self, _graph: &CirGraph, _node: Node) {}

    fn visit_call(&mut self, graph: &CirGraph, call: CallId) {
        self.visit_node(graph, Node::Call(call));
    }

    fn visit_value(&mut self, graph: &CirGraph, value: Value) {
        self.visit_node(graph, Node::Value(value));
    }

    fn visit_constant(&mut self, graph: &CirGraph, constant: Constant) {
        self.visit_value(graph, Value::Constant(constant));
    }

    fn visit_undefined(&mut self, graph: &CirGraph) {
        self.visit_value(graph, Value::Undefined);
    }

    fn visit_closure(&mut self, graph: &CirGraph, closure: ClosureId) {
        self.visit_value(graph, Value::Closure(closure));
    }

    fn visit_continuation(&mut self, graph: &CirGraph, continuation: ClosureId) {
        self.visit_closure(graph, continuation);
    }

    fn visit_block(&mut self, graph: &CirGraph, block: BlockId) {
        self.visit_value(graph, Value::Block(block));
    }

    /// Called by [`super::CirDepthFirstTraversal`] when it meets a block whose
    /// closure it has already entered (or is still inside of)
    fn revisit_block(&mut self, _graph: &CirGraph, _block: BlockId) {}

    fn visit_procedure(&mut self, graph: &CirGraph, procedure: ProcedureId) {
        self.visit_value(graph, Value::Procedure(procedure));
    }

    fn visit_method(&mut self, graph: &CirGraph, method: ProcedureId) {
        self.visit_procedure(graph, method);
    }

    fn visit_snippet(&mut self, graph: &CirGraph, snippet: ProcedureId) {
        self.visit_procedure(graph, snippet);
    }

    fn visit_builtin(&mut self, graph: &CirGraph, builtin: ProcedureId) {
        self.visit_procedure(graph, builtin);
    }

    fn visit_switch(&mut self, graph: &CirGraph, switch: ProcedureId) {
        self.visit_builtin(graph, switch);
    }

    fn visit_variable(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_value(graph, Value::Variable(variable));
    }

    fn visit_local_variable(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_variable(graph, variable);
    }

    fn visit_stack_variable(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_variable(graph, variable);
    }

    fn visit_method_parameter(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_variable(graph, variable);
    }

    fn visit_temporary(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_variable(graph, variable);
    }

    fn visit_continuation_parameter(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_variable(graph, variable);
    }

    fn visit_normal_continuation_parameter(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_continuation_parameter(graph, variable);
    }

    fn visit_exception_continuation_parameter(&mut self, graph: &CirGraph, variable: VariableId) {
        self.visit_continuation_parameter(graph, variable);
    }
}

/// Calls the most specific callback of `visitor` for `node`
pub fn dispatch_visit<V: CirVisitor + ?Sized>(visitor: &mut V, graph: &CirGraph, node: Node) {
    let value = match node {
        Node::Call(call) => return visitor.visit_call(graph, call),
        Node::Value(value) => value,
    };
    match value {
        Value::Constant(constant) => visitor.visit_constant(graph, constant),
        Value::Undefined => visitor.visit_undefined(graph),
        Value::Closure(closure) => {
            if graph.closures[closure].is_continuation() {
                visitor.visit_continuation(graph, closure)
            } else {
                visitor.visit_closure(graph, closure)
            }
        }
        Value::Block(block) => visitor.visit_block(graph, block),
        Value::Procedure(procedure) => match graph.procedures[procedure] {
            Procedure::Method { .. } => visitor.visit_method(graph, procedure),
            Procedure::Snippet { .. } => visitor.visit_snippet(graph, procedure),
            Procedure::Builtin { .. } => visitor.visit_builtin(graph, procedure),
            Procedure::Switch { .. } => visitor.visit_switch(graph, procedure),
        },
        Value::Variable(variable) => match graph.variables[variable].kind {
            VariableKind::Local { .. } => visitor.visit_local_variable(graph, variable),
            VariableKind::Stack { .. } => visitor.visit_stack_variable(graph, variable),
            VariableKind::MethodParameter { .. } => visitor.visit_method_parameter(graph, variable),
            VariableKind::Temporary => visitor.visit_temporary(graph, variable),
            VariableKind::NormalContinuationParameter => {
                visitor.visit_normal_continuation_parameter(graph, variable)
            }
            VariableKind::ExceptionContinuationParameter => {
                visitor.visit_exception_continuation_parameter(graph, variable)
            }
        },
    }
}

/// Visitor callbacks that also receive the innermost block enclosing the node
/// (`None` outside of all blocks)
pub trait CirBlockScopedVisitor {
    fn visit_node(&mut self, _graph: &CirGraph, _node: Node, _scope: Option<BlockId>) {}

    fn visit_call(&mut self, graph: &CirGraph, call: CallId, scope: Option<BlockId>) {
        self.visit_node(graph, Node::Call(call), scope);
    }

    fn visit_value(&mut self, graph: &CirGraph, value: Value, scope: Option<BlockId>) {
        self.visit_node(graph, Node::Value(value), scope);
    }

    fn visit_constant(&mut self, graph: &CirGraph, constant: Constant, scope: Option<BlockId>) {
        self.visit_value(graph, Value::Constant(constant), scope);
    }

    fn visit_undefined(&mut self, graph: &CirGraph, scope: Option<BlockId>) {
        self.visit_value(graph, Value::Undefined, scope);
    }

    fn visit_closure(&mut self, graph: &CirGraph, closure: ClosureId, scope: Option<BlockId>) {
        self.visit_value(graph, Value::Closure(closure), scope);
    }

    fn visit_continuation(
        &mut self,
        graph: &CirGraph,
        continuation: ClosureId,
        scope: Option<BlockId>,
    ) {
        self.visit_closure(graph, continuation, scope);
    }

    fn visit_block(&mut self, graph: &CirGraph, block: BlockId, scope: Option<BlockId>) {
        self.visit_value(graph, Value::Block(block), scope);
    }

    fn visit_procedure(&mut self, graph: &CirGraph, procedure: ProcedureId, scope: Option<BlockId>) {
        self.visit_value(graph, Value::Procedure(procedure), scope);
    }

    fn visit_method(&mut self, graph: &CirGraph, method: ProcedureId, scope: Option<BlockId>) {
        self.visit_procedure(graph, method, scope);
    }

    fn visit_snippet(&mut self, graph: &CirGraph, snippet: ProcedureId, scope: Option<BlockId>) {
        self.visit_procedure(graph, snippet, scope);
    }

    fn visit_builtin(&mut self, graph: &CirGraph, builtin: ProcedureId, scope: Option<BlockId>) {
        self.visit_procedure(graph, builtin, scope);
    }

    fn visit_switch(&mut self, graph: &CirGraph, switch: ProcedureId, scope: Option<BlockId>) {
        self.visit_builtin(graph, switch, scope);
    }

    fn visit_variable(&mut self, graph: &CirGraph, variable: VariableId, scope: Option<BlockId>) {
        self.visit_value(graph, Value::Variable(variable), scope);
    }

    fn visit_local_variable(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
        scope: Option<BlockId>,
    ) {
        self.visit_variable(graph, variable, scope);
    }

    fn visit_stack_variable(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
        scope: Option<BlockId>,
    ) {
        self.visit_variable(graph, variable, scope);
    }

    fn visit_method_parameter(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
        scope: Option<BlockId>,
    ) {
        self.visit_variable(graph, variable, scope);
    }

    fn visit_temporary(&mut self, graph: &CirGraph, variable: VariableId, scope: Option<BlockId>) {
        self.visit_variable(graph, variable, scope);
    }

    fn visit_continuation_parameter(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
        scope: Option<BlockId>,
    ) {
        self.visit_variable(graph, variable, scope);
    }

    fn visit_normal_continuation_parameter(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
        scope: Option<BlockId>,
    ) {
        self.visit_continuation_parameter(graph, variable, scope);
    }

    fn visit_exception_continuation_parameter(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
        scope: Option<BlockId>,
    ) {
        self.visit_continuation_parameter(graph, variable, scope);
    }
}

/// Calls the most specific callback of a block-scoped visitor for `node`
pub fn dispatch_scoped_visit<V: CirBlockScopedVisitor + ?Sized>(
    visitor: &mut V,
    graph: &CirGraph,
    node: Node,
    scope: Option<BlockId>,
) {
    let value = match node {
        Node::Call(call) => return visitor.visit_call(graph, call, scope),
        Node::Value(value) => value,
    };
    match value {
        Value::Constant(constant) => visitor.visit_constant(graph, constant, scope),
        Value::Undefined => visitor.visit_undefined(graph, scope),
        Value::Closure(closure) => {
            if graph.closures[closure].is_continuation() {
                visitor.visit_continuation(graph, closure, scope)
            } else {
                visitor.visit_closure(graph, closure, scope)
            }
        }
        Value::Block(block) => visitor.visit_block(graph, block, scope),
        Value::Procedure(procedure) => match graph.procedures[procedure] {
            Procedure::Method { .. } => visitor.visit_method(graph, procedure, scope),
            Procedure::Snippet { .. } => visitor.visit_snippet(graph, procedure, scope),
            Procedure::Builtin { .. } => visitor.visit_builtin(graph, procedure, scope),
            Procedure::Switch { .. } => visitor.visit_switch(graph, procedure, scope),
        },
        Value::Variable(variable) => match graph.variables[variable].kind {
            VariableKind::Local { .. } => visitor.visit_local_variable(graph, variable, scope),
            VariableKind::Stack { .. } => visitor.visit_stack_variable(graph, variable, scope),
            VariableKind::MethodParameter { .. } => {
                visitor.visit_method_parameter(graph, variable, scope)
            }
            VariableKind::Temporary => visitor.visit_temporary(graph, variable, scope),
            VariableKind::NormalContinuationParameter => {
                visitor.visit_normal_continuation_parameter(graph, variable, scope)
            }
            VariableKind::ExceptionContinuationParameter => {
                visitor.visit_exception_continuation_parameter(graph, variable, scope)
            }
        },
    }
}
