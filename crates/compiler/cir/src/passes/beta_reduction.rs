//! # Beta-Reduction
//!
//! Substitutes the parameters of a closure by actual arguments, rewriting the
//! closure's body in place.
//!
//! ```text
//! {proc[x y] . f(x y 3)} (1 2)   =>   f(1 2 3)
//! ```
//!
//! Continuation arguments need care: substituting the same continuation at two
//! places would duplicate its (possibly side-effecting) body. Instead, every
//! occurrence receives a fresh clone of the continuation whose body is filled in
//! afterwards. A continuation used once gets its original body back; one used
//! several times has its body moved into a block that binds the continuation's
//! parameters, and every clone calls that block with its own parameters.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use super::replication::{BlockSharing, CirReplication};
use crate::analysis::convert_to_block;
use crate::traversal::{transform, Node, Substitution};
use crate::{
    BlockId, BlockRole, CallId, CirError, CirGraph, CirResult, ClosureId, Value, VariableId,
    VariableKind,
};

pub struct BetaReduction;

impl BetaReduction {
    /// Replaces every occurrence of `parameter` in the graph entered at `call` by
    /// `argument`, which must not be a closure. Returns `call`.
    pub fn apply_single(
        graph: &mut CirGraph,
        parameter: VariableId,
        argument: Value,
        call: CallId,
    ) -> CallId {
        debug_assert!(
            argument.as_closure().is_none(),
            "single beta-reduction substitutes plain values only"
        );
        let mut substitution = Substitution::single(parameter, argument);
        transform(graph, Node::Call(call), &mut substitution);
        call
    }

    /// Applies `closure` to `arguments` and returns its rewritten body.
    ///
    /// The closure takes either exactly one parameter per argument, or two more:
    /// a trailing normal and exception continuation parameter that stay bound by
    /// the surrounding code.
    pub fn apply_multiple(
        graph: &mut CirGraph,
        closure: ClosureId,
        arguments: &[Value],
    ) -> CirResult<CallId> {
        let parameters = graph.closures[closure].parameters.clone();
        check_arity(graph, &parameters, arguments)?;

        let mut substitution = MultipleSubstitution {
            arguments: parameters.iter().copied().zip(arguments.iter().copied()).collect(),
            clones: IndexMap::new(),
            closure_uses: FxHashMap::default(),
        };
        let body = graph.closures[closure].body;
        substitution.run(graph, body);
        update_continuations(graph, substitution.clones);
        Ok(body)
    }
}

fn check_arity(graph: &CirGraph, parameters: &[VariableId], arguments: &[Value]) -> CirResult<()> {
    let mismatch = || CirError::ArityMismatch {
        parameters: parameters.len(),
        arguments: arguments.len(),
    };
    if parameters.len() == arguments.len() {
        return Ok(());
    }
    if parameters.len() != arguments.len() + 2 {
        return Err(mismatch());
    }
    let trailing = &parameters[arguments.len()..];
    let kinds = (
        graph.variables[trailing[0]].kind,
        graph.variables[trailing[1]].kind,
    );
    if kinds
        == (
            VariableKind::NormalContinuationParameter,
            VariableKind::ExceptionContinuationParameter,
        )
    {
        Ok(())
    } else {
        Err(mismatch())
    }
}

/// The substitution walk of [`BetaReduction::apply_multiple`]
struct MultipleSubstitution {
    arguments: FxHashMap<VariableId, Value>,
    /// Original continuation argument -> the clones substituted for it
    clones: IndexMap<ClosureId, Vec<ClosureId>>,
    /// Occurrences of non-continuation closure arguments seen so far
    closure_uses: FxHashMap<ClosureId, usize>,
}

impl MultipleSubstitution {
    fn run(&mut self, graph: &mut CirGraph, body: CallId) {
        let mut to_do = VecDeque::from([body]);
        let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

        while let Some(call) = to_do.pop_front() {
            let procedure = graph.calls[call].procedure;
            match self.occurrence(graph, procedure) {
                Some(replacement) => {
                    graph.calls[call].procedure = replacement;
                    graph.clear_java_frame_descriptor_if_not_needed(call);
                }
                None => enter(graph, procedure, &mut to_do, &mut visited_blocks),
            }

            let arguments = graph.calls[call].arguments.clone();
            let mut substituted = Vec::with_capacity(arguments.len());
            for argument in arguments {
                match self.occurrence(graph, argument) {
                    Some(replacement) => substituted.push(replacement),
                    None => {
                        enter(graph, argument, &mut to_do, &mut visited_blocks);
                        substituted.push(argument);
                    }
                }
            }
            graph.calls[call].set_arguments(substituted);

            for frame in graph.frame_chain(graph.calls[call].frame) {
                for slot in graph.frames[frame].values_mut() {
                    if let Value::Variable(variable) = *slot {
                        if let Some(&argument) = self.arguments.get(&variable) {
                            // Closures never live in frame descriptors
                            *slot = if argument.as_closure().is_some() {
                                Value::Undefined
                            } else {
                                argument
                            };
                        }
                    }
                }
            }
        }
    }

    /// The value to put in place of `value`, if it is a substituted parameter
    fn occurrence(&mut self, graph: &mut CirGraph, value: Value) -> Option<Value> {
        let Value::Variable(variable) = value else {
            return None;
        };
        let argument = *self.arguments.get(&variable)?;
        let Value::Closure(closure) = argument else {
            return Some(argument);
        };
        if graph.closures[closure].is_continuation() {
            let parameters = graph.closures[closure].parameters.clone();
            let fresh = graph.create_fresh_all(&parameters);
            // The body is filled in by `update_continuations`
            let placeholder = graph.new_call(Value::Undefined, Vec::new());
            let clone = graph.new_continuation(fresh, placeholder);
            self.clones.entry(closure).or_default().push(clone);
            return Some(Value::Closure(clone));
        }
        let uses = self.closure_uses.entry(closure).or_insert(0);
        *uses += 1;
        if *uses == 1 {
            Some(argument)
        } else {
            let replica = CirReplication::replicate(graph, closure, BlockSharing::Share);
            Some(Value::Closure(replica))
        }
    }
}

/// Queues the code below a value that stays in place
fn enter(
    graph: &CirGraph,
    value: Value,
    to_do: &mut VecDeque<CallId>,
    visited_blocks: &mut FxHashSet<BlockId>,
) {
    match value {
        Value::Closure(closure) => to_do.push_back(graph.closures[closure].body),
        Value::Block(block) if visited_blocks.insert(block) => {
            to_do.push_back(graph.closures[graph.blocks[block].closure].body);
        }
        _ => {}
    }
}

/// Gives every continuation clone its body: the original body for a single use,
/// a call to a shared block otherwise
fn update_continuations(graph: &mut CirGraph, clones: IndexMap<ClosureId, Vec<ClosureId>>) {
    for (original, clones) in clones {
        let parameters = graph.closures[original].parameters.clone();
        let body = graph.closures[original].body;

        if let [clone] = clones[..] {
            graph.closures[clone].set_parameters(parameters);
            graph.closures[clone].body = body;
            continue;
        }

        // The original continuation disappears, so the block takes over its parameters
        let (block, free) = convert_to_block(graph, body, BlockRole::Normal, &parameters);
        log::trace!(
            "sharing continuation {:?} between {} uses through block {:?}",
            graph.closures[original].id,
            clones.len(),
            graph.blocks[block].id
        );
        for clone in clones {
            let own = graph.closures[clone].parameters.clone();
            let arguments = own
                .into_iter()
                .chain(free.iter().copied())
                .map(Value::Variable)
                .collect();
            let call = graph.new_call(Value::Block(block), arguments);
            graph.closures[clone].body = call;
        }
    }
}
