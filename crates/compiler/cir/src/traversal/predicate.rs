//! Predicates over CIR nodes, and the searches and counts driven by them.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::{children, CirTraversal, CirVisitor, Node};
use crate::{
    BlockId, CallId, CirGraph, ClosureId, Constant, Procedure, ProcedureId, Value, VariableId,
    VariableKind,
};

/// Boolean callbacks per node kind. The default answer is `false`.
pub trait CirPredicate {
    fn evaluate_node(&mut self, _graph: &CirGraph, _node: Node) -> bool {
        false
    }

    fn evaluate_call(&mut self, graph: &CirGraph, call: CallId) -> bool {
        self.evaluate_node(graph, Node::Call(call))
    }

    fn evaluate_value(&mut self, graph: &CirGraph, value: Value) -> bool {
        self.evaluate_node(graph, Node::Value(value))
    }

    fn evaluate_constant(&mut self, graph: &CirGraph, constant: Constant) -> bool {
        self.evaluate_value(graph, Value::Constant(constant))
    }

    fn evaluate_undefined(&mut self, graph: &CirGraph) -> bool {
        self.evaluate_value(graph, Value::Undefined)
    }

    fn evaluate_closure(&mut self, graph: &CirGraph, closure: ClosureId) -> bool {
        self.evaluate_value(graph, Value::Closure(closure))
    }

    fn evaluate_continuation(&mut self, graph: &CirGraph, continuation: ClosureId) -> bool {
        self.evaluate_closure(graph, continuation)
    }

    fn evaluate_block(&mut self, graph: &CirGraph, block: BlockId) -> bool {
        self.evaluate_value(graph, Value::Block(block))
    }

    fn evaluate_procedure(&mut self, graph: &CirGraph, procedure: ProcedureId) -> bool {
        self.evaluate_value(graph, Value::Procedure(procedure))
    }

    fn evaluate_method(&mut self, graph: &CirGraph, method: ProcedureId) -> bool {
        self.evaluate_procedure(graph, method)
    }

    fn evaluate_snippet(&mut self, graph: &CirGraph, snippet: ProcedureId) -> bool {
        self.evaluate_procedure(graph, snippet)
    }

    fn evaluate_builtin(&mut self, graph: &CirGraph, builtin: ProcedureId) -> bool {
        self.evaluate_procedure(graph, builtin)
    }

    fn evaluate_switch(&mut self, graph: &CirGraph, switch: ProcedureId) -> bool {
        self.evaluate_builtin(graph, switch)
    }

    fn evaluate_variable(&mut self, graph: &CirGraph, variable: VariableId) -> bool {
        self.evaluate_value(graph, Value::Variable(variable))
    }

    fn evaluate_local_variable(&mut self, graph: &CirGraph, variable: VariableId) -> bool {
        self.evaluate_variable(graph, variable)
    }

    fn evaluate_stack_variable(&mut self, graph: &CirGraph, variable: VariableId) -> bool {
        self.evaluate_variable(graph, variable)
    }

    fn evaluate_method_parameter(&mut self, graph: &CirGraph, variable: VariableId) -> bool {
        self.evaluate_variable(graph, variable)
    }

    fn evaluate_temporary(&mut self, graph: &CirGraph, variable: VariableId) -> bool {
        self.evaluate_variable(graph, variable)
    }

    fn evaluate_continuation_parameter(&mut self, graph: &CirGraph, variable: VariableId) -> bool {
        self.evaluate_variable(graph, variable)
    }

    fn evaluate_normal_continuation_parameter(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
    ) -> bool {
        self.evaluate_continuation_parameter(graph, variable)
    }

    fn evaluate_exception_continuation_parameter(
        &mut self,
        graph: &CirGraph,
        variable: VariableId,
    ) -> bool {
        self.evaluate_continuation_parameter(graph, variable)
    }
}

/// Evaluates the most specific callback of `predicate` for `node`
pub fn dispatch_evaluate<P: CirPredicate + ?Sized>(
    predicate: &mut P,
    graph: &CirGraph,
    node: Node,
) -> bool {
    let value = match node {
        Node::Call(call) => return predicate.evaluate_call(graph, call),
        Node::Value(value) => value,
    };
    match value {
        Value::Constant(constant) => predicate.evaluate_constant(graph, constant),
        Value::Undefined => predicate.evaluate_undefined(graph),
        Value::Closure(closure) => {
            if graph.closures[closure].is_continuation() {
                predicate.evaluate_continuation(graph, closure)
            } else {
                predicate.evaluate_closure(graph, closure)
            }
        }
        Value::Block(block) => predicate.evaluate_block(graph, block),
        Value::Procedure(procedure) => match graph.procedures[procedure] {
            Procedure::Method { .. } => predicate.evaluate_method(graph, procedure),
            Procedure::Snippet { .. } => predicate.evaluate_snippet(graph, procedure),
            Procedure::Builtin { .. } => predicate.evaluate_builtin(graph, procedure),
            Procedure::Switch { .. } => predicate.evaluate_switch(graph, procedure),
        },
        Value::Variable(variable) => match graph.variables[variable].kind {
            VariableKind::Local { .. } => predicate.evaluate_local_variable(graph, variable),
            VariableKind::Stack { .. } => predicate.evaluate_stack_variable(graph, variable),
            VariableKind::MethodParameter { .. } => {
                predicate.evaluate_method_parameter(graph, variable)
            }
            VariableKind::Temporary => predicate.evaluate_temporary(graph, variable),
            VariableKind::NormalContinuationParameter => {
                predicate.evaluate_normal_continuation_parameter(graph, variable)
            }
            VariableKind::ExceptionContinuationParameter => {
                predicate.evaluate_exception_continuation_parameter(graph, variable)
            }
        },
    }
}

/// Short-circuiting search: stops at the first node satisfying the predicate
pub struct CirSearch<'g> {
    graph: &'g CirGraph,
    outside_blocks: bool,
}

impl<'g> CirSearch<'g> {
    pub const fn new(graph: &'g CirGraph) -> Self {
        Self {
            graph,
            outside_blocks: false,
        }
    }

    /// A search that never enters the closure of any block
    pub const fn outside_blocks(graph: &'g CirGraph) -> Self {
        Self {
            graph,
            outside_blocks: true,
        }
    }

    /// Returns the first node (in breadth-first order) satisfying `predicate`
    pub fn find<P: CirPredicate + ?Sized>(&self, root: Node, predicate: &mut P) -> Option<Node> {
        let graph = self.graph;
        let mut to_do = VecDeque::from([root]);
        let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

        while let Some(node) = to_do.pop_front() {
            if let Node::Value(Value::Block(block)) = node {
                if !visited_blocks.insert(block) {
                    continue;
                }
                if dispatch_evaluate(predicate, graph, node) {
                    return Some(node);
                }
                if !self.outside_blocks {
                    to_do.push_back(Node::Value(Value::Closure(graph.blocks[block].closure)));
                }
                continue;
            }
            if dispatch_evaluate(predicate, graph, node) {
                return Some(node);
            }
            to_do.extend(children(graph, node));
        }
        None
    }

    pub fn run<P: CirPredicate + ?Sized>(&self, root: Node, predicate: &mut P) -> bool {
        self.find(root, predicate).is_some()
    }

    /// Returns true if `value` occurs anywhere in the graph entered at `root`
    pub fn contains_value(&self, root: Node, value: Value) -> bool {
        self.run(root, &mut ValueOccurrence(value))
    }

    /// Returns true if some call in the graph entered at `root` calls `block`
    pub fn calls_block(&self, root: Node, block: BlockId) -> bool {
        self.run(root, &mut CallsProcedure(Value::Block(block)))
    }

    /// Returns true if some call in the graph entered at `root` calls `procedure`
    pub fn calls_procedure(&self, root: Node, procedure: ProcedureId) -> bool {
        self.run(root, &mut CallsProcedure(Value::Procedure(procedure)))
    }
}

struct ValueOccurrence(Value);

impl CirPredicate for ValueOccurrence {
    fn evaluate_value(&mut self, _graph: &CirGraph, value: Value) -> bool {
        value == self.0
    }
}

struct CallsProcedure(Value);

impl CirPredicate for CallsProcedure {
    fn evaluate_call(&mut self, graph: &CirGraph, call: CallId) -> bool {
        graph.calls[call].procedure == self.0
    }
}

/// Counts the nodes of a graph, optionally only those satisfying a predicate
pub struct CirCount;

impl CirCount {
    /// Number of nodes reachable from `root`, each block closure counted once
    pub fn nodes(graph: &CirGraph, root: Node) -> usize {
        let mut counter = Counter { count: 0 };
        CirTraversal::new(graph).run(root, &mut counter);
        counter.count
    }

    /// Number of reachable nodes satisfying `predicate`
    pub fn apply<P: CirPredicate + ?Sized>(graph: &CirGraph, root: Node, predicate: &mut P) -> usize {
        let mut counter = PredicateCounter {
            predicate,
            count: 0,
        };
        CirTraversal::new(graph).run(root, &mut counter);
        counter.count
    }
}

struct Counter {
    count: usize,
}

impl CirVisitor for Counter {
    fn visit_node(&mut self, _graph: &CirGraph, _node: Node) {
        self.count += 1;
    }
}

struct PredicateCounter<'p, P: ?Sized> {
    predicate: &'p mut P,
    count: usize,
}

impl<P: CirPredicate + ?Sized> CirVisitor for PredicateCounter<'_, P> {
    fn visit_node(&mut self, graph: &CirGraph, node: Node) {
        if dispatch_evaluate(&mut *self.predicate, graph, node) {
            self.count += 1;
        }
    }
}
