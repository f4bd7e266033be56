//! # Block-Parameter Merging
//!
//! Blocks are merge points and their parameters play the role of phi nodes. If
//! two argument positions hold the same value at every call of a block, the later
//! parameter is redundant: its occurrences are renamed to the earlier parameter
//! and the position is dropped from the closure and from every call.
//!
//! ```text
//! B = {proc[a b] . f(a b)}      B(v v) ... B(v v)
//! =>
//! B = {proc[a] . f(a a)}        B(v) ... B(v)
//! ```
//!
//! Requires accurate block call lists.

use super::beta_reduction::BetaReduction;
use crate::traversal::Node;
use crate::{BlockId, CirGraph, CirOptimizer, TransformationKind, Value};

pub struct CirBlockParameterMerging;

impl CirBlockParameterMerging {
    /// Merges parameters of each of `blocks` until no mergeable pair is left.
    /// Returns true if any block changed.
    pub fn apply(
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
        blocks: &[BlockId],
    ) -> bool {
        let mut merged_any = false;
        for &block in blocks {
            while let Some((survivor, removed)) = find_mergeable_pair(graph, block) {
                // Calls of the block change too, so observers get the whole graph
                optimizer.notify_before_transformation(
                    graph,
                    root,
                    TransformationKind::BlockParameterMerging,
                );
                merge(graph, block, survivor, removed);
                optimizer.notify_after_transformation(
                    graph,
                    root,
                    TransformationKind::BlockParameterMerging,
                );
                merged_any = true;
            }
        }
        merged_any
    }
}

/// The first pair of positions `(i, j)`, `i < j`, whose arguments agree at every
/// call of `block`
fn find_mergeable_pair(graph: &CirGraph, block: BlockId) -> Option<(usize, usize)> {
    let calls = &graph.blocks[block].calls;
    let closure = &graph.closures[graph.blocks[block].closure];
    let arity = closure.parameters.len();
    let first = calls.first()?;
    if calls
        .iter()
        .any(|&call| graph.calls[call].arguments.len() != arity)
    {
        log::trace!(
            "block {:?} has calls of unexpected arity, not merging",
            graph.blocks[block].id
        );
        return None;
    }

    let arguments = &graph.calls[*first].arguments;
    for i in 0..arity {
        for j in i + 1..arity {
            if arguments[i] != arguments[j] {
                continue;
            }
            let everywhere = calls.iter().all(|&call| {
                let arguments = &graph.calls[call].arguments;
                arguments[i] == arguments[j]
            });
            if everywhere {
                return Some((i, j));
            }
        }
    }
    None
}

fn merge(graph: &mut CirGraph, block: BlockId, survivor: usize, removed: usize) {
    let closure = graph.blocks[block].closure;
    let mut parameters = graph.closures[closure].parameters.clone();
    let kept = parameters[survivor];
    let dropped = parameters.remove(removed);
    log::debug!(
        "merging parameter {removed} into {survivor} of block {:?}",
        graph.blocks[block].id
    );

    let body = graph.closures[closure].body;
    BetaReduction::apply_single(graph, dropped, Value::Variable(kept), body);
    graph.closures[closure].set_parameters(parameters);

    for call in graph.blocks[block].calls.clone() {
        let mut arguments = graph.calls[call].arguments.clone();
        arguments.remove(removed);
        graph.calls[call].set_arguments(arguments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CirBlockUpdating;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::testing::TestGraph;
    use crate::{CallId, CirTraceObserver};

    /// `B = {proc[a b c] . f(a b c cc ce)}` called as `B(first..)` and, from a
    /// continuation, `B(second..)`
    fn two_calls(
        first: impl Fn(&TestGraph) -> Vec<Value>,
        second: impl Fn(&TestGraph) -> Vec<Value>,
        arity: usize,
    ) -> (TestGraph, BlockId, CallId, CallId, Node) {
        let mut t = TestGraph::new();
        let f = t.method("f");
        let parameters: Vec<_> = (0..arity).map(|i| t.local(i as u32)).collect();
        let mut arguments: Vec<Value> = parameters.iter().map(|&p| p.into()).collect();
        arguments.extend::<[Value; 2]>([t.cc.into(), t.ce.into()]);
        let body = t.call(f, arguments);
        let closure = t.closure(parameters, body);
        let block = t.graph.new_block(closure);

        let second_arguments = second(&t);
        let second_call = t.call(block, second_arguments);
        let k = t.cont(vec![], second_call);
        let mut first_arguments = first(&t);
        first_arguments.push(k.into());
        let first_call = t.call(block, first_arguments);
        let root = t.root(first_call);
        CirBlockUpdating::apply(&mut t.graph, root);
        (t, block, first_call, second_call, root)
    }

    #[test]
    fn test_merges_when_all_calls_agree() {
        let v = Value::int(1);
        let (mut t, block, first, second, root) =
            two_calls(|_| vec![v, v], |_| vec![v, v, v], 3);
        // The continuation argument makes the first call's arity 3 as well
        let Value::Closure(k) = t.graph.call(first).arguments[2] else {
            panic!("expected the continuation");
        };
        assert!(t.graph.closure(k).is_continuation());

        let mut optimizer = CirOptimizer::default();
        let changed = CirBlockParameterMerging::apply(&mut optimizer, &mut t.graph, root, &[block]);
        // Positions 0 and 1 agree everywhere; 2 holds the continuation in one call
        assert!(changed);
        let closure = t.graph.block(block).closure;
        assert_eq!(t.graph.closure(closure).parameters.len(), 2);
        assert_eq!(t.graph.call(first).arguments.len(), 2);
        assert_eq!(t.graph.call(second).arguments, vec![v, v]);
        assert_eq!(t.print(Value::Closure(closure)), "{proc[l0 l2] . f(l0 l0 l2 cc ce)}");
        assert_eq!(t.graph.validate(root), Ok(()));
    }

    #[test]
    fn test_disagreeing_call_prevents_merge() {
        let (v, w) = (Value::int(1), Value::int(2));
        let (mut t, block, _, second, root) =
            two_calls(|_| vec![v, v], |_| vec![v, w, v], 3);

        let mut optimizer = CirOptimizer::default();
        let changed = CirBlockParameterMerging::apply(&mut optimizer, &mut t.graph, root, &[block]);
        assert!(!changed);
        assert_eq!(t.graph.call(second).arguments.len(), 3);
    }

    #[test]
    fn test_merging_repeats_until_stable() {
        // B(v v v) twice collapses to a single parameter
        let mut t = TestGraph::new();
        let f = t.method("f");
        let a = t.local(0);
        let b = t.local(1);
        let c = t.local(2);
        let body = t.call(f, vec![a.into(), b.into(), c.into(), t.cc.into(), t.ce.into()]);
        let closure = t.closure(vec![a, b, c], body);
        let block = t.graph.new_block(closure);
        let v = Value::int(9);
        let second = t.call(block, vec![v, v, v]);
        let k = t.cont(vec![], second);
        let g = t.method("g");
        let entry = t.call(block, vec![v, v, v]);
        let k2 = t.cont(vec![], entry);
        let top = t.call(g, vec![k2.into(), k.into()]);
        let root = t.root(top);
        let blocks = CirBlockUpdating::apply(&mut t.graph, root);

        let mut optimizer = CirOptimizer::default();
        assert!(CirBlockParameterMerging::apply(&mut optimizer, &mut t.graph, root, &blocks));
        assert_eq!(t.graph.closure(closure).parameters, vec![a]);
        assert_eq!(t.graph.call(second).arguments, vec![v]);
        assert_eq!(t.graph.call(entry).arguments, vec![v]);
        assert_eq!(t.print(body), "f(l0 l0 l0 cc ce)");
    }

    #[derive(Default, Clone)]
    struct ObservedNodes(Rc<RefCell<Vec<Node>>>);

    impl CirTraceObserver for ObservedNodes {
        fn before_transformation(&mut self, _: &CirGraph, node: Node, _: TransformationKind) {
            self.0.borrow_mut().push(node);
        }
    }

    #[test]
    fn test_observer_is_notified_with_root() {
        let v = Value::int(1);
        let (mut t, block, _, _, root) = two_calls(|_| vec![v, v], |_| vec![v, v, v], 3);
        let observed = ObservedNodes::default();

        let mut optimizer = CirOptimizer::default().with_observer(observed.clone());
        assert!(CirBlockParameterMerging::apply(&mut optimizer, &mut t.graph, root, &[block]));
        assert_eq!(*observed.0.borrow(), vec![root]);
    }
}
