//! # Frame-Descriptor Clipping
//!
//! Frame descriptors keep values alive for deoptimization. When a variable is
//! obsolete at some point of the graph, every frame slot referring to it is
//! clipped to `undefined`. Block bodies are left alone: they are reached from
//! other places where the variable may still be meaningful.

use rustc_hash::FxHashSet;

use crate::traversal::{update_outside_blocks, CirUpdate, Node};
use crate::{CallId, CirGraph, CirOptimizer, TransformationKind, Value, VariableId};

pub struct CirFrameDescriptorClipping;

impl CirFrameDescriptorClipping {
    /// Clips slots naming any of `obsolete` below `root`; true if a slot changed.
    ///
    /// The caller decides what is obsolete, typically from source-level liveness.
    pub fn apply(
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
        obsolete: &FxHashSet<VariableId>,
    ) -> bool {
        if obsolete.is_empty() {
            return false;
        }
        optimizer.notify_before_transformation(
            graph,
            root,
            TransformationKind::FrameDescriptorClipping,
        );
        let mut clipping = Clipping { obsolete };
        let changed = update_outside_blocks(graph, root, &mut clipping);
        optimizer.notify_after_transformation(
            graph,
            root,
            TransformationKind::FrameDescriptorClipping,
        );
        changed
    }
}

struct Clipping<'a> {
    obsolete: &'a FxHashSet<VariableId>,
}

impl CirUpdate for Clipping<'_> {
    fn update_call(&mut self, graph: &mut CirGraph, call: CallId) -> bool {
        let mut changed = false;
        for frame in graph.frame_chain(graph.calls[call].frame) {
            for slot in graph.frames[frame].values_mut() {
                if let Value::Variable(variable) = *slot {
                    if self.obsolete.contains(&variable) {
                        *slot = Value::Undefined;
                        changed = true;
                    }
                }
            }
        }
        if changed {
            log::trace!("clipped frame descriptor of call {:?}", graph.calls[call].id);
        }
        changed
    }
}
