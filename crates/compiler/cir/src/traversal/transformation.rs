//! Substitution-style rewrites.
//!
//! A [`CirTransformation`] maps each node to a (possibly different) node. The
//! [`transform`] walker writes the results back into the slots they came from:
//! call procedures, call arguments, frame-descriptor slots and closure bodies.
//! Parameters are binders, not occurrences, and are never transformed.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use super::Node;
use crate::{
    BlockId, CallId, CirGraph, ClosureId, Constant, Procedure, ProcedureId, Value, VariableId,
    VariableKind,
};

/// Node-rewriting callbacks. The default for every kind is the identity.
pub trait CirTransformation {
    fn transform_call(&mut self, _graph: &mut CirGraph, call: CallId) -> CallId {
        call
    }

    fn transform_value(&mut self, _graph: &mut CirGraph, value: Value) -> Value {
        value
    }

    fn transform_constant(&mut self, graph: &mut CirGraph, constant: Constant) -> Value {
        self.transform_value(graph, Value::Constant(constant))
    }

    fn transform_undefined(&mut self, graph: &mut CirGraph) -> Value {
        self.transform_value(graph, Value::Undefined)
    }

    fn transform_closure(&mut self, graph: &mut CirGraph, closure: ClosureId) -> Value {
        self.transform_value(graph, Value::Closure(closure))
    }

    fn transform_continuation(&mut self, graph: &mut CirGraph, continuation: ClosureId) -> Value {
        self.transform_closure(graph, continuation)
    }

    fn transform_block(&mut self, graph: &mut CirGraph, block: BlockId) -> Value {
        self.transform_value(graph, Value::Block(block))
    }

    fn transform_procedure(&mut self, graph: &mut CirGraph, procedure: ProcedureId) -> Value {
        self.transform_value(graph, Value::Procedure(procedure))
    }

    fn transform_method(&mut self, graph: &mut CirGraph, method: ProcedureId) -> Value {
        self.transform_procedure(graph, method)
    }

    fn transform_snippet(&mut self, graph: &mut CirGraph, snippet: ProcedureId) -> Value {
        self.transform_procedure(graph, snippet)
    }

    fn transform_builtin(&mut self, graph: &mut CirGraph, builtin: ProcedureId) -> Value {
        self.transform_procedure(graph, builtin)
    }

    fn transform_switch(&mut self, graph: &mut CirGraph, switch: ProcedureId) -> Value {
        self.transform_builtin(graph, switch)
    }

    fn transform_variable(&mut self, graph: &mut CirGraph, variable: VariableId) -> Value {
        self.transform_value(graph, Value::Variable(variable))
    }

    fn transform_local_variable(&mut self, graph: &mut CirGraph, variable: VariableId) -> Value {
        self.transform_variable(graph, variable)
    }

    fn transform_stack_variable(&mut self, graph: &mut CirGraph, variable: VariableId) -> Value {
        self.transform_variable(graph, variable)
    }

    fn transform_method_parameter(&mut self, graph: &mut CirGraph, variable: VariableId) -> Value {
        self.transform_variable(graph, variable)
    }

    fn transform_temporary(&mut self, graph: &mut CirGraph, variable: VariableId) -> Value {
        self.transform_variable(graph, variable)
    }

    fn transform_continuation_parameter(
        &mut self,
        graph: &mut CirGraph,
        variable: VariableId,
    ) -> Value {
        self.transform_variable(graph, variable)
    }

    fn transform_normal_continuation_parameter(
        &mut self,
        graph: &mut CirGraph,
        variable: VariableId,
    ) -> Value {
        self.transform_continuation_parameter(graph, variable)
    }

    fn transform_exception_continuation_parameter(
        &mut self,
        graph: &mut CirGraph,
        variable: VariableId,
    ) -> Value {
        self.transform_continuation_parameter(graph, variable)
    }
}

/// Applies the most specific callback of `transformation` to `value`
pub fn dispatch_transform<T: CirTransformation + ?Sized>(
    transformation: &mut T,
    graph: &mut CirGraph,
    value: Value,
) -> Value {
    match value {
        Value::Constant(constant) => transformation.transform_constant(graph, constant),
        Value::Undefined => transformation.transform_undefined(graph),
        Value::Closure(closure) => {
            if graph.closures[closure].is_continuation() {
                transformation.transform_continuation(graph, closure)
            } else {
                transformation.transform_closure(graph, closure)
            }
        }
        Value::Block(block) => transformation.transform_block(graph, block),
        Value::Procedure(procedure) => match graph.procedures[procedure] {
            Procedure::Method { .. } => transformation.transform_method(graph, procedure),
            Procedure::Snippet { .. } => transformation.transform_snippet(graph, procedure),
            Procedure::Builtin { .. } => transformation.transform_builtin(graph, procedure),
            Procedure::Switch { .. } => transformation.transform_switch(graph, procedure),
        },
        Value::Variable(variable) => match graph.variables[variable].kind {
            VariableKind::Local { .. } => transformation.transform_local_variable(graph, variable),
            VariableKind::Stack { .. } => transformation.transform_stack_variable(graph, variable),
            VariableKind::MethodParameter { .. } => {
                transformation.transform_method_parameter(graph, variable)
            }
            VariableKind::Temporary => transformation.transform_temporary(graph, variable),
            VariableKind::NormalContinuationParameter => {
                transformation.transform_normal_continuation_parameter(graph, variable)
            }
            VariableKind::ExceptionContinuationParameter => {
                transformation.transform_exception_continuation_parameter(graph, variable)
            }
        },
    }
}

/// Rewrites the graph entered at `root` and returns the transformed root.
///
/// Each block's closure is rewritten once, however many calls name the block.
pub fn transform<T: CirTransformation + ?Sized>(
    graph: &mut CirGraph,
    root: Node,
    transformation: &mut T,
) -> Node {
    walk(graph, root, transformation, false)
}

/// Like [`transform`], but never enters the closure of any block: block bodies
/// may be reached from code the rewrite must not touch.
pub fn transform_outside_blocks<T: CirTransformation + ?Sized>(
    graph: &mut CirGraph,
    root: Node,
    transformation: &mut T,
) -> Node {
    walk(graph, root, transformation, true)
}

fn walk<T: CirTransformation + ?Sized>(
    graph: &mut CirGraph,
    root: Node,
    transformation: &mut T,
    outside_blocks: bool,
) -> Node {
    let mut walker = TransformationWalker {
        to_do: VecDeque::new(),
        visited_blocks: FxHashSet::default(),
        outside_blocks,
    };
    let result = match root {
        Node::Call(call) => {
            let call = transformation.transform_call(graph, call);
            walker.to_do.push_back(call);
            Node::Call(call)
        }
        Node::Value(value) => {
            let value = dispatch_transform(transformation, graph, value);
            walker.enter(graph, transformation, value);
            Node::Value(value)
        }
    };

    while let Some(call) = walker.to_do.pop_front() {
        let procedure = graph.calls[call].procedure;
        let new_procedure = dispatch_transform(transformation, graph, procedure);
        if new_procedure != procedure {
            graph.calls[call].procedure = new_procedure;
            if procedure.as_variable().is_some() {
                graph.clear_java_frame_descriptor_if_not_needed(call);
            }
        }
        walker.enter(graph, transformation, new_procedure);

        let arguments = graph.calls[call].arguments.clone();
        let mut new_arguments = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let argument = dispatch_transform(transformation, graph, argument);
            walker.enter(graph, transformation, argument);
            new_arguments.push(argument);
        }
        graph.calls[call].set_arguments(new_arguments);

        for frame in graph.frame_chain(graph.calls[call].frame) {
            let slots: Vec<Value> = graph.frames[frame].values().copied().collect();
            let slots: Vec<Value> = slots
                .into_iter()
                .map(|slot| dispatch_transform(transformation, graph, slot))
                .collect();
            let descriptor = &mut graph.frames[frame];
            for (target, slot) in descriptor.values_mut().zip(slots) {
                *target = slot;
            }
        }
    }
    result
}

struct TransformationWalker {
    to_do: VecDeque<CallId>,
    visited_blocks: FxHashSet<BlockId>,
    outside_blocks: bool,
}

impl TransformationWalker {
    /// Queues the code below a transformed value
    fn enter<T: CirTransformation + ?Sized>(
        &mut self,
        graph: &mut CirGraph,
        transformation: &mut T,
        value: Value,
    ) {
        let closure = match value {
            Value::Closure(closure) => closure,
            Value::Block(block) if !self.outside_blocks && self.visited_blocks.insert(block) => {
                graph.blocks[block].closure
            }
            _ => return,
        };
        let body = graph.closures[closure].body;
        let body = transformation.transform_call(graph, body);
        graph.closures[closure].body = body;
        self.to_do.push_back(body);
    }
}

/// Replaces variables by values, e.g. a parameter by its argument.
///
/// The walker enters whatever a slot holds after the rewrite, so substituting a
/// closure would also rewrite inside it. Callers only substitute non-closure values.
#[derive(Debug, Default)]
pub struct Substitution {
    map: FxHashMap<VariableId, Value>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(variable: VariableId, value: Value) -> Self {
        let mut substitution = Self::new();
        substitution.insert(variable, value);
        substitution
    }

    pub fn insert(&mut self, variable: VariableId, value: Value) {
        self.map.insert(variable, value);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl CirTransformation for Substitution {
    fn transform_variable(&mut self, _graph: &mut CirGraph, variable: VariableId) -> Value {
        self.map
            .get(&variable)
            .copied()
            .unwrap_or(Value::Variable(variable))
    }
}
