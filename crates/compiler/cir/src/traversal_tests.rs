//! Tests for the traversal frameworks.

use super::*;
use crate::testing::TestGraph;
use crate::{ClosureId, JavaFrameDescriptor, Kind, ProcedureId, VariableId};

/// Records every call body and every block visit
#[derive(Default)]
struct Recorder {
    calls: Vec<CallId>,
    blocks: Vec<BlockId>,
    revisits: Vec<BlockId>,
    exception_parameters: usize,
    variables: usize,
}

impl CirVisitor for Recorder {
    fn visit_call(&mut self, _graph: &CirGraph, call: CallId) {
        self.calls.push(call);
    }

    fn visit_block(&mut self, _graph: &CirGraph, block: BlockId) {
        self.blocks.push(block);
    }

    fn revisit_block(&mut self, _graph: &CirGraph, block: BlockId) {
        self.revisits.push(block);
    }

    fn visit_exception_continuation_parameter(&mut self, graph: &CirGraph, variable: VariableId) {
        self.exception_parameters += 1;
        self.visit_continuation_parameter(graph, variable);
    }

    fn visit_variable(&mut self, _graph: &CirGraph, _variable: VariableId) {
        self.variables += 1;
    }
}

/// `B(k1)` where `k1 = {cont[] . B(k2)}`, `k2 = {cont[] . B()}` and
/// `B = {proc[] . f(cc ce)}`
fn block_called_three_times(t: &mut TestGraph) -> (BlockId, CallId, Node) {
    let f = t.method("f");
    let block_body = t.call(f, vec![t.cc.into(), t.ce.into()]);
    let block_closure = t.closure(vec![], block_body);
    let block = t.graph.new_block(block_closure);

    let third = t.call(block, vec![]);
    let k2 = t.cont(vec![], third);
    let second = t.call(block, vec![k2.into()]);
    let k1 = t.cont(vec![], second);
    let first = t.call(block, vec![k1.into()]);
    let root = t.root(first);
    (block, block_body, root)
}

#[test]
fn test_block_closure_visited_once() {
    let mut t = TestGraph::new();
    let (block, block_body, root) = block_called_three_times(&mut t);

    let mut recorder = Recorder::default();
    CirTraversal::new(&t.graph).run(root, &mut recorder);

    assert_eq!(recorder.blocks, vec![block]);
    assert_eq!(recorder.calls.iter().filter(|&&c| c == block_body).count(), 1);
    // first, second, third and the block body
    assert_eq!(recorder.calls.len(), 4);
}

#[test]
fn test_visitor_defaults_delegate_to_general_kinds() {
    let mut t = TestGraph::new();
    let (_, _, root) = block_called_three_times(&mut t);

    let mut recorder = Recorder::default();
    CirTraversal::new(&t.graph).run(root, &mut recorder);

    // cc and ce as root parameters, cc and ce as arguments of f
    assert_eq!(recorder.exception_parameters, 2);
    assert_eq!(recorder.variables, 4);
}

#[test]
fn test_traversal_terminates_on_block_cycle() {
    // B = {proc[] . B()}: the block calls itself
    let mut t = TestGraph::new();
    let placeholder = t.call(Value::Undefined, vec![]);
    let closure = t.closure(vec![], placeholder);
    let block = t.graph.new_block(closure);
    let recursive = t.call(block, vec![]);
    t.graph.closure_mut(closure).body = recursive;
    let entry = t.call(block, vec![]);
    let root = t.root(entry);

    let mut recorder = Recorder::default();
    CirTraversal::new(&t.graph).run(root, &mut recorder);
    assert_eq!(recorder.blocks, vec![block]);
    assert_eq!(recorder.calls, vec![entry, recursive]);

    assert!(CirSearch::new(&t.graph).calls_block(root, block));
    assert_eq!(CirCount::nodes(&t.graph, root), 7);
}

#[test]
fn test_outside_blocks_never_enters_block_closures() {
    let mut t = TestGraph::new();
    let (block, block_body, root) = block_called_three_times(&mut t);

    let mut recorder = Recorder::default();
    CirTraversal::outside_blocks(&t.graph).run(root, &mut recorder);
    assert_eq!(recorder.blocks, vec![block]);
    assert!(!recorder.calls.contains(&block_body));

    let f_call = Node::Call(block_body);
    let mut finder = FindCall(block_body);
    assert_eq!(CirSearch::new(&t.graph).find(root, &mut finder), Some(f_call));
    assert_eq!(CirSearch::outside_blocks(&t.graph).find(root, &mut finder), None);
}

struct FindCall(CallId);

impl CirPredicate for FindCall {
    fn evaluate_call(&mut self, _graph: &CirGraph, call: CallId) -> bool {
        call == self.0
    }
}

#[derive(Default)]
struct ScopeRecorder {
    scopes: Vec<(CallId, Option<BlockId>)>,
}

impl CirBlockScopedVisitor for ScopeRecorder {
    fn visit_call(&mut self, _graph: &CirGraph, call: CallId, scope: Option<BlockId>) {
        self.scopes.push((call, scope));
    }
}

#[test]
fn test_block_scoped_traversal_reports_enclosing_block() {
    let mut t = TestGraph::new();
    let (block, block_body, root) = block_called_three_times(&mut t);
    let Node::Value(Value::Closure(root_closure)) = root else {
        panic!("root is a closure");
    };
    let first = t.graph.closure(root_closure).body;

    let mut recorder = ScopeRecorder::default();
    CirBlockScopedTraversal::new(&t.graph).run(root, &mut recorder);

    assert!(recorder.scopes.contains(&(first, None)));
    assert!(recorder.scopes.contains(&(block_body, Some(block))));
}

#[test]
fn test_depth_first_is_post_order_with_revisits() {
    let mut t = TestGraph::new();
    let (block, block_body, root) = block_called_three_times(&mut t);
    let Node::Value(Value::Closure(root_closure)) = root else {
        panic!("root is a closure");
    };
    let first = t.graph.closure(root_closure).body;

    let mut recorder = Recorder::default();
    CirDepthFirstTraversal::new(&t.graph).run(root, &mut recorder);

    assert_eq!(recorder.blocks, vec![block]);
    assert_eq!(recorder.revisits, vec![block, block]);
    // The block body is finished before the first call naming the block, and the
    // outermost call is reported last.
    let position = |call| recorder.calls.iter().position(|&c| c == call);
    assert!(position(block_body) < position(first));
    assert_eq!(recorder.calls.last(), Some(&first));
}

#[test]
fn test_substitution_rewrites_arguments_and_frames() {
    let mut t = TestGraph::new();
    let f = t.method("f");
    let x = t.local(0);
    let frame = t
        .graph
        .new_frame(JavaFrameDescriptor::new("m", 3, vec![x.into()], vec![x.into()]));
    let body = t.call(f, vec![x.into(), Value::int(3), t.cc.into(), t.ce.into()]);
    t.graph.call_mut(body).frame = Some(frame);

    let mut substitution = Substitution::single(x, Value::int(1));
    let result = transform(&mut t.graph, Node::Call(body), &mut substitution);

    assert_eq!(result, Node::Call(body));
    assert_eq!(t.print(body), "f(1 3 cc ce)");
    assert_eq!(t.graph.frame(frame).locals, vec![Value::int(1)]);
    assert_eq!(t.graph.frame(frame).stack_slots, vec![Value::int(1)]);
}

#[test]
fn test_substituting_procedure_variable_clears_frame() {
    let mut t = TestGraph::new();
    let k = t.graph.new_temporary(Kind::Reference);
    let frame = t.graph.new_frame(JavaFrameDescriptor::new("m", 0, vec![], vec![]));
    let body = t.call(k, vec![Value::int(2)]);
    t.graph.call_mut(body).frame = Some(frame);
    let block = t.empty_block();

    let mut substitution = Substitution::single(k, Value::Block(block));
    transform(&mut t.graph, Node::Call(body), &mut substitution);

    assert_eq!(t.graph.call(body).procedure, Value::Block(block));
    assert_eq!(t.graph.call(body).frame, None);
}

#[test]
fn test_transform_enters_each_block_once() {
    struct CountingTransformation {
        transformed: Vec<CallId>,
    }

    impl CirTransformation for CountingTransformation {
        fn transform_call(&mut self, _graph: &mut CirGraph, call: CallId) -> CallId {
            self.transformed.push(call);
            call
        }
    }

    let mut t = TestGraph::new();
    let (_, block_body, root) = block_called_three_times(&mut t);
    let mut counting = CountingTransformation {
        transformed: Vec::new(),
    };
    transform(&mut t.graph, root, &mut counting);

    assert_eq!(
        counting.transformed.iter().filter(|&&c| c == block_body).count(),
        1
    );
}

struct RenameMethod {
    from: ProcedureId,
    to: ProcedureId,
}

impl CirUpdate for RenameMethod {
    fn update_call(&mut self, graph: &mut CirGraph, call: CallId) -> bool {
        if graph.calls[call].procedure == Value::Procedure(self.from) {
            graph.calls[call].procedure = Value::Procedure(self.to);
            return true;
        }
        false
    }
}

#[test]
fn test_update_reports_change() {
    let mut t = TestGraph::new();
    let (_, block_body, root) = block_called_three_times(&mut t);
    let Value::Procedure(f) = t.graph.call(block_body).procedure else {
        panic!("block body calls a method");
    };
    let g = t.method("g");

    let mut rename = RenameMethod { from: f, to: g };
    assert!(!update_outside_blocks(&mut t.graph, root, &mut rename));
    assert!(update(&mut t.graph, root, &mut rename));
    assert_eq!(t.graph.call(block_body).procedure, Value::Procedure(g));
    assert!(!update(&mut t.graph, root, &mut rename));
}

#[test]
fn test_count_with_predicate() {
    struct IsContinuation;

    impl CirPredicate for IsContinuation {
        fn evaluate_continuation(&mut self, _graph: &CirGraph, _continuation: ClosureId) -> bool {
            true
        }
    }

    let mut t = TestGraph::new();
    let (_, _, root) = block_called_three_times(&mut t);
    assert_eq!(CirCount::apply(&t.graph, root, &mut IsContinuation), 2);
    assert!(CirSearch::new(&t.graph).contains_value(root, Value::Variable(t.ce)));
    assert!(!CirSearch::new(&t.graph).contains_value(root, Value::int(42)));
}
