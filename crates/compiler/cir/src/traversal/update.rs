//! In-place rewrites that report whether anything changed.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::{children, Node};
use crate::{
    BlockId, CallId, CirGraph, ClosureId, Constant, Procedure, ProcedureId, Value, VariableId,
    VariableKind,
};

/// Mutating callbacks per node kind, each returning "did anything change".
/// The default is to change nothing.
pub trait CirUpdate {
    fn update_node(&mut self, _graph: &mut CirGraph, _node: Node) -> bool {
        false
    }

    fn update_call(&mut self, graph: &mut CirGraph, call: CallId) -> bool {
        self.update_node(graph, Node::Call(call))
    }

    fn update_value(&mut self, graph: &mut CirGraph, value: Value) -> bool {
        self.update_node(graph, Node::Value(value))
    }

    fn update_constant(&mut self, graph: &mut CirGraph, constant: Constant) -> bool {
        self.update_value(graph, Value::Constant(constant))
    }

    fn update_undefined(&mut self, graph: &mut CirGraph) -> bool {
        self.update_value(graph, Value::Undefined)
    }

    fn update_closure(&mut self, graph: &mut CirGraph, closure: ClosureId) -> bool {
        self.update_value(graph, Value::Closure(closure))
    }

    fn update_continuation(&mut self, graph: &mut CirGraph, continuation: ClosureId) -> bool {
        self.update_closure(graph, continuation)
    }

    fn update_block(&mut self, graph: &mut CirGraph, block: BlockId) -> bool {
        self.update_value(graph, Value::Block(block))
    }

    fn update_procedure(&mut self, graph: &mut CirGraph, procedure: ProcedureId) -> bool {
        self.update_value(graph, Value::Procedure(procedure))
    }

    fn update_method(&mut self, graph: &mut CirGraph, method: ProcedureId) -> bool {
        self.update_procedure(graph, method)
    }

    fn update_snippet(&mut self, graph: &mut CirGraph, snippet: ProcedureId) -> bool {
        self.update_procedure(graph, snippet)
    }

    fn update_builtin(&mut self, graph: &mut CirGraph, builtin: ProcedureId) -> bool {
        self.update_procedure(graph, builtin)
    }

    fn update_switch(&mut self, graph: &mut CirGraph, switch: ProcedureId) -> bool {
        self.update_builtin(graph, switch)
    }

    fn update_variable(&mut self, graph: &mut CirGraph, variable: VariableId) -> bool {
        self.update_value(graph, Value::Variable(variable))
    }

    fn update_local_variable(&mut self, graph: &mut CirGraph, variable: VariableId) -> bool {
        self.update_variable(graph, variable)
    }

    fn update_stack_variable(&mut self, graph: &mut CirGraph, variable: VariableId) -> bool {
        self.update_variable(graph, variable)
    }

    fn update_method_parameter(&mut self, graph: &mut CirGraph, variable: VariableId) -> bool {
        self.update_variable(graph, variable)
    }

    fn update_temporary(&mut self, graph: &mut CirGraph, variable: VariableId) -> bool {
        self.update_variable(graph, variable)
    }

    fn update_continuation_parameter(&mut self, graph: &mut CirGraph, variable: VariableId) -> bool {
        self.update_variable(graph, variable)
    }

    fn update_normal_continuation_parameter(
        &mut self,
        graph: &mut CirGraph,
        variable: VariableId,
    ) -> bool {
        self.update_continuation_parameter(graph, variable)
    }

    fn update_exception_continuation_parameter(
        &mut self,
        graph: &mut CirGraph,
        variable: VariableId,
    ) -> bool {
        self.update_continuation_parameter(graph, variable)
    }
}

/// Applies the most specific callback of `update` to `node`
pub fn dispatch_update<U: CirUpdate + ?Sized>(
    update: &mut U,
    graph: &mut CirGraph,
    node: Node,
) -> bool {
    let value = match node {
        Node::Call(call) => return update.update_call(graph, call),
        Node::Value(value) => value,
    };
    match value {
        Value::Constant(constant) => update.update_constant(graph, constant),
        Value::Undefined => update.update_undefined(graph),
        Value::Closure(closure) => {
            if graph.closures[closure].is_continuation() {
                update.update_continuation(graph, closure)
            } else {
                update.update_closure(graph, closure)
            }
        }
        Value::Block(block) => update.update_block(graph, block),
        Value::Procedure(procedure) => match graph.procedures[procedure] {
            Procedure::Method { .. } => update.update_method(graph, procedure),
            Procedure::Snippet { .. } => update.update_snippet(graph, procedure),
            Procedure::Builtin { .. } => update.update_builtin(graph, procedure),
            Procedure::Switch { .. } => update.update_switch(graph, procedure),
        },
        Value::Variable(variable) => match graph.variables[variable].kind {
            VariableKind::Local { .. } => update.update_local_variable(graph, variable),
            VariableKind::Stack { .. } => update.update_stack_variable(graph, variable),
            VariableKind::MethodParameter { .. } => update.update_method_parameter(graph, variable),
            VariableKind::Temporary => update.update_temporary(graph, variable),
            VariableKind::NormalContinuationParameter => {
                update.update_normal_continuation_parameter(graph, variable)
            }
            VariableKind::ExceptionContinuationParameter => {
                update.update_exception_continuation_parameter(graph, variable)
            }
        },
    }
}

/// Runs `update` on every node reachable from `root`; true if any callback reported a change
pub fn update<U: CirUpdate + ?Sized>(graph: &mut CirGraph, root: Node, update: &mut U) -> bool {
    run(graph, root, update, false)
}

/// Like [`update`], but never enters the closure of any block
pub fn update_outside_blocks<U: CirUpdate + ?Sized>(
    graph: &mut CirGraph,
    root: Node,
    update: &mut U,
) -> bool {
    run(graph, root, update, true)
}

fn run<U: CirUpdate + ?Sized>(
    graph: &mut CirGraph,
    root: Node,
    update: &mut U,
    outside_blocks: bool,
) -> bool {
    let mut changed = false;
    let mut to_do = VecDeque::from([root]);
    let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

    while let Some(node) = to_do.pop_front() {
        if let Node::Value(Value::Block(block)) = node {
            if !visited_blocks.insert(block) {
                continue;
            }
            changed |= dispatch_update(update, graph, node);
            if !outside_blocks {
                to_do.push_back(Node::Value(Value::Closure(graph.blocks[block].closure)));
            }
            continue;
        }
        changed |= dispatch_update(update, graph, node);
        // Children are taken after the update so that rewritten slots are followed.
        to_do.extend(children(graph, node));
    }
    changed
}
