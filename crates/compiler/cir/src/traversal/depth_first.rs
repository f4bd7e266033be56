//! Genuinely depth-first, post-order traversal.
//!
//! A node is reported to the visitor only after all of its children were. A block's
//! closure is expanded on the first encounter only; every later encounter of the
//! block (including one from inside its own closure) is reported through
//! [`CirVisitor::revisit_block`] instead. Fact-propagation analyses use the revisit
//! notifications to know where a fixpoint iteration is required.

use rustc_hash::FxHashSet;

use super::{children, dispatch_visit, CirVisitor, Node};
use crate::{BlockId, CirGraph, Value};

pub struct CirDepthFirstTraversal<'g> {
    graph: &'g CirGraph,
}

enum Step {
    Expand(Node),
    Visit(Node),
}

impl<'g> CirDepthFirstTraversal<'g> {
    pub const fn new(graph: &'g CirGraph) -> Self {
        Self { graph }
    }

    pub fn run<V: CirVisitor + ?Sized>(&self, root: Node, visitor: &mut V) {
        let graph = self.graph;
        let mut stack = vec![Step::Expand(root)];
        let mut expanded_blocks: FxHashSet<BlockId> = FxHashSet::default();

        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Visit(node) => {
                    dispatch_visit(visitor, graph, node);
                    continue;
                }
                Step::Expand(node) => node,
            };

            stack.push(Step::Visit(node));
            if let Node::Value(Value::Block(block)) = node {
                if !expanded_blocks.insert(block) {
                    stack.pop();
                    visitor.revisit_block(graph, block);
                    continue;
                }
                let closure = graph.blocks[block].closure;
                stack.push(Step::Expand(Node::Value(Value::Closure(closure))));
                continue;
            }
            // Reversed so that the first child is expanded first.
            for child in children(graph, node).into_iter().rev() {
                stack.push(Step::Expand(child));
            }
        }
    }
}
