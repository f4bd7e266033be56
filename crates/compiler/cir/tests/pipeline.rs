//! Running the standard pass pipeline on small method bodies

mod common;

use common::Builder;
use cps_compiler_cir::analysis::{may_raise, ExceptionFlow};
use cps_compiler_cir::{
    CirOptimizer, ClosureId, Comparison, Kind, Node, OptimizerConfig, PassManager, Procedure,
    ProcedureId, Value,
};

/// `callee = {proc[p cc' ce'] . switch(p 1 {cont[] . cc'(p)} {cont[] . <otherwise>})}`
/// where the default target returns 0, or throws 0 when `throws`
fn switching_callee(b: &mut Builder, throws: bool) -> ProcedureId {
    let callee = b.method("callee");
    let switch = b.graph.new_procedure(Procedure::switch(Comparison::Equal, 1));
    let p = b.graph.new_method_parameter(Kind::Int, 0);
    let cc = b.graph.new_normal_continuation_parameter();
    let ce = b.graph.new_exception_continuation_parameter();

    let on_match = b.call(cc, vec![p.into()]);
    let on_match = b.cont(vec![], on_match);
    let otherwise = b.call(if throws { ce } else { cc }, vec![Value::int(0)]);
    let otherwise = b.cont(vec![], otherwise);
    let body = b.call(
        switch,
        vec![p.into(), Value::int(1), on_match.into(), otherwise.into()],
    );
    let closure = b.closure(vec![p, cc, ce], body);
    b.graph.set_method_body(callee, closure);
    callee
}

fn root_closure(root: Node) -> ClosureId {
    match root {
        Node::Value(Value::Closure(closure)) => closure,
        other => panic!("expected a closure root, got {other:?}"),
    }
}

#[test]
fn test_inlined_switch_gets_encapsulated() {
    let mut b = Builder::new();
    let callee = switching_callee(&mut b, false);
    let site = b.call(callee, vec![Value::int(4), b.cc.into(), b.ce.into()]);
    let root = b.root(site);

    let mut optimizer = CirOptimizer::default();
    let mut manager = PassManager::standard_pipeline();
    assert_eq!(manager.run(&mut optimizer, &mut b.graph, root), Ok(true));

    assert_eq!(
        b.print(site),
        "switchEqual/1(4 1 {cont[] . B()} {cont[] . B()})"
    );
    assert_eq!(b.graph.validate(root), Ok(()));
    assert!(!may_raise(&b.graph, root_closure(root)));

    // A second run finds nothing left to do
    assert_eq!(manager.run(&mut optimizer, &mut b.graph, root), Ok(false));
}

#[test]
fn test_throwing_target_is_found_after_inlining() {
    let mut b = Builder::new();
    let callee = switching_callee(&mut b, true);
    let site = b.call(callee, vec![Value::int(4), b.cc.into(), b.ce.into()]);
    let root = b.root(site);

    // Before inlining the call passes the handler to a method
    assert!(may_raise(&b.graph, root_closure(root)));

    let mut optimizer = CirOptimizer::default();
    PassManager::standard_pipeline()
        .run(&mut optimizer, &mut b.graph, root)
        .unwrap();

    let flow = ExceptionFlow::analyze(&b.graph, root_closure(root));
    assert!(flow.may_raise);
    assert_eq!(flow.raising_blocks.len(), 1);
}

#[test]
fn test_pipeline_without_inlining_keeps_the_call() {
    let mut b = Builder::new();
    let callee = switching_callee(&mut b, false);
    let site = b.call(callee, vec![Value::int(4), b.cc.into(), b.ce.into()]);
    let root = b.root(site);

    let mut optimizer =
        CirOptimizer::new(OptimizerConfig::default().with_inline_methods(false));
    let mut manager = PassManager::standard_pipeline();
    assert_eq!(manager.run(&mut optimizer, &mut b.graph, root), Ok(false));
    assert_eq!(b.print(site), "callee(4 cc ce)");
}
