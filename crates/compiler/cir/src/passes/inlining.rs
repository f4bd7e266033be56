//! # Inlining
//!
//! Replaces calls to blocks and methods by a beta-reduced copy of the target's
//! body, as decided by the optimizer's [`crate::InliningPolicy`].
//!
//! After every single inlining the block call lists of the whole graph are
//! recomputed: inlining may drop the last call of a block or bring in new block
//! calls, and the next decision relies on accurate counts. A call site is
//! inlined repeatedly until the policy declines, then the walk moves on to the
//! calls below it.
//!
//! The body of a switch target is never inlined into: after switch
//! encapsulation it is a block call, and undoing that would only make the next
//! encapsulation redo it.

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::beta_reduction::BetaReduction;
use super::replication::{BlockSharing, CirReplication};
use crate::analysis::CirBlockUpdating;
use crate::traversal::{call_values, CirTraversal, CirVisitor, Node};
use crate::{
    BlockId, CallId, CirError, CirGraph, CirOptimizer, CirResult, ClosureId, FrameId,
    InlineTarget, Procedure, ProcedureId, TransformationKind, Value,
};

/// Methods already inlined on the path to a call site. A method is never
/// inlined into its own inlined body, which bounds mutual recursion.
struct InlinedMethod {
    method: ProcedureId,
    parent: History,
}

type History = Option<Rc<InlinedMethod>>;

fn was_inlined(history: &History, method: ProcedureId) -> bool {
    let mut current = history.as_deref();
    while let Some(entry) = current {
        if entry.method == method {
            return true;
        }
        current = entry.parent.as_deref();
    }
    false
}

pub struct CirInlining;

impl CirInlining {
    /// Inlines everything the policy accepts below `root`; true if anything changed
    pub fn apply(optimizer: &mut CirOptimizer, graph: &mut CirGraph, root: Node) -> CirResult<bool> {
        CirBlockUpdating::apply(graph, root);

        let mut changed = false;
        let mut to_do: VecDeque<(Node, History)> = VecDeque::from([(root, None)]);
        let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();
        // Bodies of switch targets keep calling their blocks
        let mut encapsulated: FxHashSet<CallId> = FxHashSet::default();

        while let Some((node, mut history)) = to_do.pop_front() {
            let call = match node {
                Node::Call(call) => call,
                Node::Value(value) => {
                    enter(graph, value, &history, &mut to_do, &mut visited_blocks);
                    continue;
                }
            };

            while let Some(target) = inline_target(graph, call) {
                if encapsulated.contains(&call) {
                    break;
                }
                if let InlineTarget::Method(method) = target {
                    if was_inlined(&history, method) {
                        break;
                    }
                }
                let arguments = graph.calls[call].arguments.clone();
                if !optimizer.is_inlineable(graph, target, &arguments) {
                    break;
                }

                let node = Node::Call(call);
                optimizer.notify_before_transformation(graph, node, TransformationKind::Inlining);
                let inlined = match target {
                    InlineTarget::Block(block) => inline_block(graph, block, &arguments)?,
                    InlineTarget::Method(method) => {
                        let frame = graph.calls[call].frame;
                        history = Some(Rc::new(InlinedMethod {
                            method,
                            parent: history,
                        }));
                        inline_method(graph, method, &arguments, frame)?
                    }
                };
                log::debug!("inlined {target:?} at call {:?}", graph.calls[call].id);
                graph.assign_call(call, inlined);
                CirBlockUpdating::apply(graph, root);
                optimizer.notify_after_transformation(graph, node, TransformationKind::Inlining);
                changed = true;
            }

            encapsulated.extend(switch_target_bodies(graph, call));
            for value in call_values(graph, call) {
                enter(graph, value, &history, &mut to_do, &mut visited_blocks);
            }
        }
        Ok(changed)
    }
}

/// Queues the call below a closure, or below a block's closure once
fn enter(
    graph: &CirGraph,
    value: Value,
    history: &History,
    to_do: &mut VecDeque<(Node, History)>,
    visited_blocks: &mut FxHashSet<BlockId>,
) {
    let closure = match value {
        Value::Closure(closure) => closure,
        Value::Block(block) if visited_blocks.insert(block) => graph.blocks[block].closure,
        _ => return,
    };
    to_do.push_back((Node::Call(graph.closures[closure].body), history.clone()));
}

fn inline_target(graph: &CirGraph, call: CallId) -> Option<InlineTarget> {
    match graph.calls[call].procedure {
        Value::Block(block) => Some(InlineTarget::Block(block)),
        Value::Procedure(procedure) => match graph.procedures[procedure] {
            Procedure::Method { body: Some(_), .. } => Some(InlineTarget::Method(procedure)),
            _ => None,
        },
        _ => None,
    }
}

/// The bodies of the closure targets of a switch call
fn switch_target_bodies(graph: &CirGraph, call: CallId) -> Vec<CallId> {
    let Value::Procedure(procedure) = graph.calls[call].procedure else {
        return Vec::new();
    };
    let Some(first_target) = graph.procedures[procedure].first_switch_target() else {
        return Vec::new();
    };
    graph.calls[call]
        .arguments
        .iter()
        .skip(first_target)
        .filter_map(|target| target.as_closure())
        .map(|closure| graph.closures[closure].body)
        .collect()
}

/// A beta-reduced copy of the block's closure. Blocks below it stay shared.
fn inline_block(graph: &mut CirGraph, block: BlockId, arguments: &[Value]) -> CirResult<CallId> {
    let closure = graph.blocks[block].closure;
    let copy = CirReplication::replicate(graph, closure, BlockSharing::Share);
    BetaReduction::apply_multiple(graph, copy, arguments)
}

/// A beta-reduced copy of the method's body with blocks of its own. Frame
/// descriptors of the copy are nested below the caller's chain.
fn inline_method(
    graph: &mut CirGraph,
    method: ProcedureId,
    arguments: &[Value],
    caller_frame: Option<FrameId>,
) -> CirResult<CallId> {
    let Procedure::Method { body: Some(body), .. } = graph.procedures[method] else {
        return Err(CirError::NotAClosure(graph.procedures[method].name()));
    };
    let copy = CirReplication::replicate(graph, body, BlockSharing::Copy);
    if let Some(caller_frame) = caller_frame {
        nest_frames(graph, copy, caller_frame);
    }
    BetaReduction::apply_multiple(graph, copy, arguments)
}

#[derive(Default)]
struct CallCollector(Vec<CallId>);

impl CirVisitor for CallCollector {
    fn visit_call(&mut self, _graph: &CirGraph, call: CallId) {
        self.0.push(call);
    }
}

fn nest_frames(graph: &mut CirGraph, closure: ClosureId, caller_frame: FrameId) {
    let mut calls = CallCollector::default();
    CirTraversal::new(graph).run(Node::Value(Value::Closure(closure)), &mut calls);
    for call in calls.0 {
        let Some(&outermost) = graph.frame_chain(graph.calls[call].frame).last() else {
            continue;
        };
        let parent = graph.copy_frame_chain(caller_frame, |slot| slot);
        graph.frames[outermost].parent = Some(parent);
    }
}
