//! # Graph Traversal
//!
//! Every walk over a CIR graph is iterative: an explicit worklist replaces
//! recursion, so long call chains cannot overflow the stack and back-references
//! through blocks cannot loop forever.
//!
//! Sharing is special-cased to blocks only. A block's closure is entered exactly
//! once per walk, no matter how many calls name the block. Every other node is
//! visited each time it is reached.
//!
//! The frameworks built on top of this module are:
//! - [`CirVisitor`] / [`CirTraversal`]: callbacks per node kind, breadth-first
//! - [`CirBlockScopedVisitor`] / [`CirBlockScopedTraversal`]: same, plus the enclosing block
//! - [`CirPredicate`] / [`CirSearch`]: short-circuiting search
//! - [`CirTransformation`] / [`transform`], [`transform_outside_blocks`]: substitution-style rewrites
//! - [`CirUpdate`] / [`update`]: in-place rewrites reporting change
//! - [`CirDepthFirstTraversal`]: post-order walk distinguishing block revisits

pub mod depth_first;
pub mod predicate;
pub mod transformation;
pub mod update;
pub mod visitor;

pub use depth_first::CirDepthFirstTraversal;
pub use predicate::{CirCount, CirPredicate, CirSearch};
pub use transformation::{transform, transform_outside_blocks, CirTransformation, Substitution};
pub use update::{update, update_outside_blocks, CirUpdate};
pub use visitor::{dispatch_scoped_visit, dispatch_visit, CirBlockScopedVisitor, CirVisitor};

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{BlockId, CallId, CirGraph, Value};

/// Any node of the graph: a call or a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Call(CallId),
    Value(Value),
}

impl From<CallId> for Node {
    fn from(call: CallId) -> Self {
        Self::Call(call)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

pub(crate) type Children = SmallVec<[Node; 8]>;

/// The values a call refers to: procedure, arguments, then frame descriptor slots
/// (innermost frame first).
pub fn call_values(graph: &CirGraph, call: CallId) -> SmallVec<[Value; 8]> {
    let call = &graph.calls[call];
    let mut values: SmallVec<[Value; 8]> = SmallVec::new();
    values.push(call.procedure);
    values.extend(call.arguments.iter().copied());
    for frame in graph.frame_chain(call.frame) {
        values.extend(graph.frames[frame].values().copied());
    }
    values
}

/// Children of a node, excluding the closure of a block.
///
/// Blocks are handled by the walkers because entering them is subject to the
/// visited-set and the outside-blocks restriction.
pub(crate) fn children(graph: &CirGraph, node: Node) -> Children {
    let mut children = Children::new();
    match node {
        Node::Call(call) => {
            children.extend(call_values(graph, call).into_iter().map(Node::Value));
        }
        Node::Value(Value::Closure(closure)) => {
            let closure = &graph.closures[closure];
            children.extend(
                closure
                    .parameters
                    .iter()
                    .map(|&p| Node::Value(Value::Variable(p))),
            );
            children.push(Node::Call(closure.body));
        }
        Node::Value(_) => {}
    }
    children
}

/// Breadth-first worklist traversal notifying a [`CirVisitor`] for every node
pub struct CirTraversal<'g> {
    graph: &'g CirGraph,
    outside_blocks: bool,
}

impl<'g> CirTraversal<'g> {
    pub const fn new(graph: &'g CirGraph) -> Self {
        Self {
            graph,
            outside_blocks: false,
        }
    }

    /// A traversal that never enters the closure of any block
    pub const fn outside_blocks(graph: &'g CirGraph) -> Self {
        Self {
            graph,
            outside_blocks: true,
        }
    }

    pub fn run<V: CirVisitor + ?Sized>(&self, root: Node, visitor: &mut V) {
        let graph = self.graph;
        let mut to_do = VecDeque::from([root]);
        let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

        while let Some(node) = to_do.pop_front() {
            if let Node::Value(Value::Block(block)) = node {
                if !visited_blocks.insert(block) {
                    continue;
                }
                dispatch_visit(visitor, graph, node);
                if !self.outside_blocks {
                    to_do.push_back(Node::Value(Value::Closure(graph.blocks[block].closure)));
                }
                continue;
            }
            dispatch_visit(visitor, graph, node);
            to_do.extend(children(graph, node));
        }
    }
}

/// Breadth-first traversal that tells the visitor which block (if any) lexically
/// encloses each node
pub struct CirBlockScopedTraversal<'g> {
    graph: &'g CirGraph,
}

impl<'g> CirBlockScopedTraversal<'g> {
    pub const fn new(graph: &'g CirGraph) -> Self {
        Self { graph }
    }

    pub fn run<V: CirBlockScopedVisitor + ?Sized>(&self, root: Node, visitor: &mut V) {
        let graph = self.graph;
        let mut to_do: VecDeque<(Node, Option<BlockId>)> = VecDeque::from([(root, None)]);
        let mut visited_blocks: FxHashSet<BlockId> = FxHashSet::default();

        while let Some((node, scope)) = to_do.pop_front() {
            if let Node::Value(Value::Block(block)) = node {
                if !visited_blocks.insert(block) {
                    continue;
                }
                dispatch_scoped_visit(visitor, graph, node, scope);
                let closure = graph.blocks[block].closure;
                to_do.push_back((Node::Value(Value::Closure(closure)), Some(block)));
                continue;
            }
            dispatch_scoped_visit(visitor, graph, node, scope);
            to_do.extend(children(graph, node).into_iter().map(|child| (child, scope)));
        }
    }
}

#[cfg(test)]
#[path = "traversal_tests.rs"]
mod tests;
