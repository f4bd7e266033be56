//! # Graph Replication
//!
//! Deep copy of a closure with fresh variables. Closures are never shared in CIR,
//! so whenever the same closure value would end up in two places one of them gets
//! a replica.
//!
//! Copies are made iteratively: a copied closure first receives a placeholder
//! body call, which is overwritten once the original body has been processed.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::{BlockId, Call, CallId, CirGraph, ClosureId, Value, VariableId};

/// What to do with blocks reached from the replicated closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSharing {
    /// Keep referring to the original blocks
    Share,
    /// Copy every reached block once; calls to the same block keep sharing the copy
    Copy,
}

pub struct CirReplication;

impl CirReplication {
    /// Returns a copy of `closure` whose parameters (and the parameters of every
    /// nested closure) are fresh. Variables free in `closure` are kept.
    pub fn replicate(graph: &mut CirGraph, closure: ClosureId, sharing: BlockSharing) -> ClosureId {
        let mut replicator = Replicator {
            sharing,
            variables: FxHashMap::default(),
            blocks: FxHashMap::default(),
            to_do: VecDeque::new(),
        };
        let copy = replicator.copy_closure(graph, closure);
        while let Some((source, target)) = replicator.to_do.pop_front() {
            replicator.copy_call(graph, source, target);
        }
        log::trace!(
            "replicated closure {:?} as {:?}",
            graph.closures[closure].id,
            graph.closures[copy].id
        );
        copy
    }
}

struct Replicator {
    sharing: BlockSharing,
    variables: FxHashMap<VariableId, VariableId>,
    blocks: FxHashMap<BlockId, BlockId>,
    /// (original call, placeholder to overwrite)
    to_do: VecDeque<(CallId, CallId)>,
}

impl Replicator {
    fn copy_closure(&mut self, graph: &mut CirGraph, closure: ClosureId) -> ClosureId {
        let original = &graph.closures[closure];
        let kind = original.kind;
        let body = original.body;
        let parameters = original.parameters.clone();

        let fresh = graph.create_fresh_all(&parameters);
        self.variables.extend(parameters.into_iter().zip(fresh.iter().copied()));

        let placeholder = graph.new_call(Value::Undefined, Vec::new());
        self.to_do.push_back((body, placeholder));
        graph.new_closure_of_kind(kind, fresh, placeholder)
    }

    fn copy_value(&mut self, graph: &mut CirGraph, value: Value) -> Value {
        match value {
            Value::Variable(variable) => {
                Value::Variable(self.variables.get(&variable).copied().unwrap_or(variable))
            }
            Value::Closure(closure) => Value::Closure(self.copy_closure(graph, closure)),
            Value::Block(block) if self.sharing == BlockSharing::Copy => {
                if let Some(&copy) = self.blocks.get(&block) {
                    return Value::Block(copy);
                }
                let role = graph.blocks[block].role;
                let original = graph.blocks[block].closure;
                // Registered before its closure is copied: the closure may call the block.
                let placeholder = graph.new_call(Value::Undefined, Vec::new());
                let stand_in = graph.new_closure(Vec::new(), placeholder);
                let copy = graph.new_block_with_role(stand_in, role);
                self.blocks.insert(block, copy);
                let closure = self.copy_closure(graph, original);
                graph.blocks[copy].closure = closure;
                Value::Block(copy)
            }
            other => other,
        }
    }

    fn copy_call(&mut self, graph: &mut CirGraph, source: CallId, target: CallId) {
        let original = graph.calls[source].clone();
        let procedure = self.copy_value(graph, original.procedure);
        let arguments = original
            .arguments
            .iter()
            .map(|&argument| self.copy_value(graph, argument))
            .collect();
        let variables = &self.variables;
        let frame = original.frame.map(|frame| {
            graph.copy_frame_chain(frame, |slot| match slot {
                Value::Variable(v) => Value::Variable(variables.get(&v).copied().unwrap_or(v)),
                other => other,
            })
        });
        graph.calls[target] = Call {
            id: graph.calls[target].id,
            procedure,
            arguments,
            frame,
            is_native: original.is_native,
        };
    }
}
