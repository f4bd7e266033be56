//! # Exception Flow
//!
//! Decides which parts of a method body can transfer control to the method's
//! exception continuation. A call raises if it:
//! - calls the exception continuation parameter directly,
//! - calls something that may trap while passing that parameter as its exception
//!   continuation,
//! - calls a closure or block that raises, or passes a raising continuation.
//!
//! Facts are computed bottom-up with a depth-first post-order walk. A block met
//! again while its own closure is still being expanded (a loop through blocks)
//! contributes the fact of the previous round; rounds repeat until no block fact
//! changes. Facts only ever go from "does not raise" to "raises", so this
//! terminates.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::traversal::{CirDepthFirstTraversal, CirVisitor, Node};
use crate::{BlockId, CallId, CirGraph, ClosureId, Value, VariableId, VariableKind};

/// Exception-flow facts of one method body
#[derive(Debug, Clone, Default)]
pub struct ExceptionFlow {
    /// Blocks whose closure can reach the exception continuation
    pub raising_blocks: FxHashSet<BlockId>,
    pub may_raise: bool,
    /// Number of walks needed to reach the fixpoint
    pub rounds: usize,
}

impl ExceptionFlow {
    /// Analyzes the method body `closure`, whose exception continuation is its
    /// exception continuation parameter
    pub fn analyze(graph: &CirGraph, closure: ClosureId) -> Self {
        let handler = graph.closures[closure]
            .parameters
            .iter()
            .copied()
            .find(|&p| graph.variables[p].kind == VariableKind::ExceptionContinuationParameter);

        let mut raising_blocks: FxHashSet<BlockId> = FxHashSet::default();
        let mut rounds = 0;
        loop {
            rounds += 1;
            let mut propagation = Propagation {
                handler,
                previous: &raising_blocks,
                calls: FxHashMap::default(),
                closures: FxHashMap::default(),
                blocks: FxHashSet::default(),
            };
            CirDepthFirstTraversal::new(graph)
                .run(Node::Value(Value::Closure(closure)), &mut propagation);

            let may_raise = propagation.closure_raises(closure);
            let blocks = propagation.blocks;
            if blocks == raising_blocks {
                log::trace!(
                    "exception flow of closure {:?} stable after {rounds} rounds",
                    graph.closures[closure].id
                );
                return Self {
                    raising_blocks,
                    may_raise,
                    rounds,
                };
            }
            raising_blocks = blocks;
        }
    }
}

/// Returns true if the method body `closure` can reach its exception continuation
pub fn may_raise(graph: &CirGraph, closure: ClosureId) -> bool {
    ExceptionFlow::analyze(graph, closure).may_raise
}

struct Propagation<'a> {
    handler: Option<VariableId>,
    /// Block facts of the previous round, used for back references
    previous: &'a FxHashSet<BlockId>,
    calls: FxHashMap<CallId, bool>,
    closures: FxHashMap<ClosureId, bool>,
    blocks: FxHashSet<BlockId>,
}

impl Propagation<'_> {
    fn closure_raises(&self, closure: ClosureId) -> bool {
        self.closures.get(&closure).copied().unwrap_or(false)
    }

    fn block_raises(&self, block: BlockId) -> bool {
        self.blocks.contains(&block) || self.previous.contains(&block)
    }

    fn value_raises(&self, value: Value) -> bool {
        match value {
            Value::Closure(closure) => self.closure_raises(closure),
            Value::Block(block) => self.block_raises(block),
            _ => false,
        }
    }

    fn is_handler(&self, value: Value) -> bool {
        matches!((self.handler, value), (Some(h), Value::Variable(v)) if h == v)
    }
}

impl CirVisitor for Propagation<'_> {
    fn visit_call(&mut self, graph: &CirGraph, call: CallId) {
        let c = &graph.calls[call];
        let throws = self.is_handler(c.procedure);
        let delegates = graph.needs_java_frame_descriptor(call)
            && c.exception_continuation().is_some_and(|ce| self.is_handler(ce));
        let raises = throws
            || delegates
            || self.value_raises(c.procedure)
            || c.arguments.iter().any(|&a| self.value_raises(a));
        self.calls.insert(call, raises);
    }

    fn visit_closure(&mut self, graph: &CirGraph, closure: ClosureId) {
        let body = graph.closures[closure].body;
        let raises = self.calls.get(&body).copied().unwrap_or(false);
        self.closures.insert(closure, raises);
    }

    fn visit_block(&mut self, graph: &CirGraph, block: BlockId) {
        if self.closure_raises(graph.blocks[block].closure) {
            self.blocks.insert(block);
        }
    }
}
