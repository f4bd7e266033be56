//! # Block Call Bookkeeping
//!
//! Recomputes the `calls` list of every block reachable from a root. The walk
//! first collects, then writes: a block may be discovered before or after calls
//! naming it, so the lists are only rebuilt once the whole graph has been seen.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::traversal::{
    CirBlockScopedTraversal, CirBlockScopedVisitor, CirTraversal, CirVisitor, Node,
};
use crate::{BlockId, CallId, CirGraph, Value};

/// Rebuilds block call lists; the plain variant used between passes
pub struct CirBlockUpdating;

impl CirBlockUpdating {
    /// Resets every block reachable from `root` and re-adds each reachable call
    /// naming it. Returns the blocks in discovery order.
    pub fn apply(graph: &mut CirGraph, root: Node) -> Vec<BlockId> {
        let mut collector = BlockCallCollector::default();
        CirTraversal::new(graph).run(root, &mut collector);
        write_back(graph, &collector.blocks, &collector.calls);
        collector.blocks
    }
}

/// Result of a scoped block update
#[derive(Debug, Clone, Default)]
pub struct ScopedBlockUpdate {
    pub blocks: Vec<BlockId>,
    /// Innermost enclosing block of every call that lies inside some block
    pub enclosing: FxHashMap<CallId, BlockId>,
}

/// Rebuilds block call lists and records which block lexically encloses each call
pub struct CirScopedBlockUpdating;

impl CirScopedBlockUpdating {
    pub fn apply(graph: &mut CirGraph, root: Node) -> ScopedBlockUpdate {
        let mut collector = ScopedBlockCallCollector::default();
        CirBlockScopedTraversal::new(graph).run(root, &mut collector);
        write_back(graph, &collector.blocks, &collector.calls);
        ScopedBlockUpdate {
            blocks: collector.blocks,
            enclosing: collector.enclosing,
        }
    }
}

fn write_back(graph: &mut CirGraph, blocks: &[BlockId], calls: &IndexMap<CallId, BlockId>) {
    for &block in blocks {
        graph.blocks[block].reset();
    }
    for (&call, &block) in calls {
        graph.blocks[block].add_call(call);
    }
}

#[derive(Default)]
struct BlockCallCollector {
    blocks: Vec<BlockId>,
    calls: IndexMap<CallId, BlockId>,
}

impl CirVisitor for BlockCallCollector {
    fn visit_block(&mut self, _graph: &CirGraph, block: BlockId) {
        self.blocks.push(block);
    }

    fn visit_call(&mut self, graph: &CirGraph, call: CallId) {
        if let Value::Block(block) = graph.calls[call].procedure {
            self.calls.insert(call, block);
        }
    }
}

#[derive(Default)]
struct ScopedBlockCallCollector {
    blocks: Vec<BlockId>,
    calls: IndexMap<CallId, BlockId>,
    enclosing: FxHashMap<CallId, BlockId>,
}

impl CirBlockScopedVisitor for ScopedBlockCallCollector {
    fn visit_block(&mut self, _graph: &CirGraph, block: BlockId, _scope: Option<BlockId>) {
        self.blocks.push(block);
    }

    fn visit_call(&mut self, graph: &CirGraph, call: CallId, scope: Option<BlockId>) {
        if let Value::Block(block) = graph.calls[call].procedure {
            self.calls.insert(call, block);
        }
        if let Some(scope) = scope {
            self.enclosing.insert(call, scope);
        }
    }
}
