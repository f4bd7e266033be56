//! # Switch Encapsulation
//!
//! Turns every inline closure target of a switch into a call of a block, so that
//! switch targets can later be shared and merged instead of being duplicated.
//!
//! ```text
//! switch(tag m {cont[] . body} default)
//! =>
//! switch(tag m {cont[] . B(fv..)} default)    B = {proc[fv'..] . body'}
//! ```
//!
//! The walk stops at a switch: its arguments are not walked as ordinary values.
//! Each block created for a target is entered afterwards as a step of its own,
//! which is how switches nested in a target get encapsulated.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::traversal::{call_values, Node};
use crate::{
    BlockId, BlockRole, CallId, CirGraph, CirOptimizer, ClosureId, TransformationKind, Value,
};

pub struct CirSwitchEncapsulation;

impl CirSwitchEncapsulation {
    /// Encapsulates all switch targets below `root`; true if a block was created
    pub fn apply(optimizer: &mut CirOptimizer, graph: &mut CirGraph, root: Node) -> bool {
        let mut changed = false;
        let mut to_do: VecDeque<CallId> = VecDeque::new();
        let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

        match root {
            Node::Call(call) => to_do.push_back(call),
            Node::Value(value) => enter(graph, value, &mut to_do, &mut visited_blocks),
        }

        while let Some(call) = to_do.pop_front() {
            let first_target = match graph.calls[call].procedure {
                Value::Procedure(procedure) => graph.procedures[procedure].first_switch_target(),
                _ => None,
            };
            let Some(first_target) = first_target else {
                for value in call_values(graph, call) {
                    enter(graph, value, &mut to_do, &mut visited_blocks);
                }
                continue;
            };

            let targets: Vec<Value> = graph.calls[call]
                .arguments
                .iter()
                .skip(first_target)
                .copied()
                .collect();
            for target in targets {
                let Value::Closure(closure) = target else {
                    continue;
                };
                if !is_encapsulated(graph, closure) {
                    let node = Node::Value(target);
                    optimizer.notify_before_transformation(
                        graph,
                        node,
                        TransformationKind::SwitchEncapsulation,
                    );
                    let (block, _) = graph.make_block_call(closure, BlockRole::Normal);
                    log::debug!(
                        "encapsulated switch target {:?} into block {:?}",
                        graph.closures[closure].id,
                        graph.blocks[block].id
                    );
                    optimizer.notify_after_transformation(
                        graph,
                        node,
                        TransformationKind::SwitchEncapsulation,
                    );
                    changed = true;
                }
                let body = graph.closures[closure].body;
                if let Value::Block(block) = graph.calls[body].procedure {
                    enter(graph, Value::Block(block), &mut to_do, &mut visited_blocks);
                }
            }
        }
        changed
    }
}

/// A target whose body already calls a block
fn is_encapsulated(graph: &CirGraph, closure: ClosureId) -> bool {
    let body = graph.closures[closure].body;
    matches!(graph.calls[body].procedure, Value::Block(_))
}

fn enter(
    graph: &CirGraph,
    value: Value,
    to_do: &mut VecDeque<CallId>,
    visited_blocks: &mut FxHashSet<BlockId>,
) {
    let closure = match value {
        Value::Closure(closure) => closure,
        Value::Block(block) if visited_blocks.insert(block) => graph.blocks[block].closure,
        _ => return,
    };
    to_do.push_back(graph.closures[closure].body);
}
