//! # Free Variables and Closure Conversion
//!
//! A variable occurrence is free if no enclosing closure on the path from the root
//! binds it. The walk is iterative: every queued item carries its own snapshot of
//! the binding chain, so leaving a closure needs no explicit pop.
//!
//! Continuation parameters have a vacuous scope and are never reported. In
//! particular the free variables of a bare continuation-parameter reference are
//! the empty set.

use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use crate::traversal::{call_values, transform_outside_blocks, Node, Substitution};
use crate::{BlockId, BlockRole, CallId, CirGraph, ClosureId, Value, VariableId};

/// One link of the chain of variables bound on the current path
struct Binding {
    variable: VariableId,
    parent: Scope,
}

type Scope = Option<Rc<Binding>>;

fn bind(scope: &Scope, parameters: &[VariableId]) -> Scope {
    parameters.iter().fold(scope.clone(), |parent, &variable| {
        Some(Rc::new(Binding { variable, parent }))
    })
}

fn is_bound(scope: &Scope, variable: VariableId) -> bool {
    let mut current = scope.as_deref();
    while let Some(binding) = current {
        if binding.variable == variable {
            return true;
        }
        current = binding.parent.as_deref();
    }
    false
}

/// Variables occurring free in the graph entered at `root`, in discovery order
pub fn find_free_variables(graph: &CirGraph, root: Node) -> IndexSet<VariableId> {
    let mut free = IndexSet::new();
    let mut to_do: VecDeque<(Node, Scope)> = VecDeque::from([(root, None)]);
    let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

    while let Some((node, scope)) = to_do.pop_front() {
        match node {
            Node::Call(call) => {
                to_do.extend(
                    call_values(graph, call)
                        .into_iter()
                        .map(|value| (Node::Value(value), scope.clone())),
                );
            }
            Node::Value(Value::Variable(variable)) => {
                if !graph.variables[variable].is_continuation_parameter()
                    && !is_bound(&scope, variable)
                {
                    free.insert(variable);
                }
            }
            Node::Value(Value::Closure(closure)) => {
                let closure = &graph.closures[closure];
                let inner = bind(&scope, &closure.parameters);
                to_do.push_back((Node::Call(closure.body), inner));
            }
            Node::Value(Value::Block(block)) => {
                if visited_blocks.insert(block) {
                    let closure = graph.blocks[block].closure;
                    to_do.push_back((Node::Value(Value::Closure(closure)), scope));
                }
            }
            Node::Value(_) => {}
        }
    }
    free
}

/// Makes `closure` self-contained: its parameter list becomes exactly the free
/// variables of its body, in discovery order.
pub fn apply_closure_conversion(graph: &mut CirGraph, closure: ClosureId) {
    let body = graph.closures[closure].body;
    let free: Vec<VariableId> = find_free_variables(graph, Node::Call(body))
        .into_iter()
        .collect();
    graph.closures[closure].set_parameters(free);
}

/// Moves `body` into a fresh block.
///
/// `reused` are variables whose binder goes away with the move, such as the
/// parameters of a continuation that is being replaced. The block binds them
/// itself, unchanged, as its leading parameters. Every other free variable of
/// `body` gets a fresh parameter, and `body` is renamed to use it outside of
/// blocks. Blocks reached from `body` are not renamed: they may also be called
/// from elsewhere, and the originals stay bound at every one of their calls.
///
/// Returns the block and the free variables bound by fresh parameters. Calling
/// the block with values for `reused` followed by those variables is equivalent
/// to executing `body` in place.
pub fn convert_to_block(
    graph: &mut CirGraph,
    body: CallId,
    role: BlockRole,
    reused: &[VariableId],
) -> (BlockId, Vec<VariableId>) {
    let free: Vec<VariableId> = find_free_variables(graph, Node::Call(body))
        .into_iter()
        .filter(|variable| !reused.contains(variable))
        .collect();
    let fresh = graph.create_fresh_all(&free);

    let mut renaming = Substitution::new();
    for (&variable, &parameter) in free.iter().zip(&fresh) {
        renaming.insert(variable, Value::Variable(parameter));
    }
    if !renaming.is_empty() {
        transform_outside_blocks(graph, Node::Call(body), &mut renaming);
    }

    let parameters = reused.iter().copied().chain(fresh).collect();
    let closure = graph.new_closure(parameters, body);
    let block = graph.new_block_with_role(closure, role);
    log::trace!(
        "converted call {:?} into block {:?} over {} free variables",
        graph.calls[body].id,
        graph.blocks[block].id,
        free.len()
    );
    (block, free)
}
