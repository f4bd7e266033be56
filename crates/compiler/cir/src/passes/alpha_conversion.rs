//! # Alpha-Conversion
//!
//! Gives every closure parameter a fresh identity and rewrites all occurrences,
//! so that afterwards no variable is bound by more than one closure.
//!
//! The walk is iterative. Every queued item carries the renaming chain in effect
//! at its position; entering a closure extends the chain with `(old, fresh)` pairs
//! for its parameters. A block's closure is renamed once per run, under the chain
//! of the first call that reaches it.

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::traversal::Node;
use crate::{BlockId, CallId, CirError, CirGraph, CirResult, ClosureId, Value, VariableId};

/// One `(from, to)` link of the renaming chain
struct VariableRenaming {
    from: VariableId,
    to: VariableId,
    parent: Renaming,
}

type Renaming = Option<Rc<VariableRenaming>>;

fn lookup(renaming: &Renaming, variable: VariableId) -> Option<VariableId> {
    let mut current = renaming.as_deref();
    while let Some(link) = current {
        if link.from == variable {
            return Some(link.to);
        }
        current = link.parent.as_deref();
    }
    None
}

pub struct AlphaConversion;

impl AlphaConversion {
    /// Renames every binding reachable from `root`.
    ///
    /// A variable occurrence with no enclosing binder is an internal error: it
    /// means an earlier pass broke scoping.
    pub fn apply(graph: &mut CirGraph, root: Node) -> CirResult<()> {
        let mut walker = Walker {
            to_do: VecDeque::new(),
            visited_blocks: FxHashSet::default(),
        };
        match root {
            Node::Call(call) => walker.to_do.push_back((call, None)),
            Node::Value(value) => {
                walker.rename(graph, value, &None)?;
                walker.enter(graph, value, &None);
            }
        }

        while let Some((call, renaming)) = walker.to_do.pop_front() {
            let procedure = walker.rename(graph, graph.calls[call].procedure, &renaming)?;
            graph.calls[call].procedure = procedure;
            walker.enter(graph, procedure, &renaming);

            let arguments = graph.calls[call].arguments.clone();
            let mut renamed = Vec::with_capacity(arguments.len());
            for argument in arguments {
                let argument = walker.rename(graph, argument, &renaming)?;
                walker.enter(graph, argument, &renaming);
                renamed.push(argument);
            }
            graph.calls[call].set_arguments(renamed);

            for frame in graph.frame_chain(graph.calls[call].frame) {
                let slots: Vec<Value> = graph.frames[frame].values().copied().collect();
                let mut renamed = Vec::with_capacity(slots.len());
                for slot in slots {
                    renamed.push(walker.rename(graph, slot, &renaming)?);
                }
                for (target, slot) in graph.frames[frame].values_mut().zip(renamed) {
                    *target = slot;
                }
            }
        }
        Ok(())
    }
}

struct Walker {
    to_do: VecDeque<(CallId, Renaming)>,
    visited_blocks: FxHashSet<BlockId>,
}

impl Walker {
    /// Resolves a variable occurrence; other values are returned unchanged
    fn rename(&self, graph: &CirGraph, value: Value, renaming: &Renaming) -> CirResult<Value> {
        let Value::Variable(variable) = value else {
            return Ok(value);
        };
        match lookup(renaming, variable) {
            Some(fresh) => Ok(Value::Variable(fresh)),
            None => {
                let v = &graph.variables[variable];
                log::error!("alpha-conversion found unbound variable {} ({:?})", v.prefix(), v.id);
                Err(CirError::UnboundVariable {
                    variable,
                    name: v.prefix(),
                })
            }
        }
    }

    /// Binds fresh parameters for a closure (or a block's closure, once) and
    /// queues its body
    fn enter(&mut self, graph: &mut CirGraph, value: Value, renaming: &Renaming) {
        let closure = match value {
            Value::Closure(closure) => closure,
            Value::Block(block) if self.visited_blocks.insert(block) => graph.blocks[block].closure,
            _ => return,
        };
        let inner = bind_fresh(graph, closure, renaming);
        self.to_do.push_back((graph.closures[closure].body, inner));
    }
}

fn bind_fresh(graph: &mut CirGraph, closure: ClosureId, renaming: &Renaming) -> Renaming {
    let parameters = graph.closures[closure].parameters.clone();
    let fresh = graph.create_fresh_all(&parameters);
    let mut chain = renaming.clone();
    for (&from, &to) in parameters.iter().zip(&fresh) {
        chain = Some(Rc::new(VariableRenaming {
            from,
            to,
            parent: chain,
        }));
    }
    graph.closures[closure].set_parameters(fresh);
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestGraph;
    use crate::traversal::{CirTraversal, CirVisitor};
    use crate::{JavaFrameDescriptor, Kind};
    use proptest::prelude::*;

    #[test]
    fn test_rebinds_parameters_and_occurrences() {
        let mut t = TestGraph::new();
        let f = t.method("f");
        let x = t.local(0);
        let frame = t
            .graph
            .new_frame(JavaFrameDescriptor::new("m", 0, vec![x.into()], vec![]));
        let call = t.call(f, vec![x.into(), t.cc.into(), t.ce.into()]);
        t.graph.call_mut(call).frame = Some(frame);
        let inner = t.closure(vec![x], call);
        let apply = t.call(inner, vec![Value::int(5)]);
        let root = t.root(apply);
        let printed = t.print(root);

        AlphaConversion::apply(&mut t.graph, root).unwrap();

        let new_x = t.graph.closure(inner).parameters[0];
        assert_ne!(new_x, x);
        assert_eq!(t.graph.variable(new_x).origin, Some(x));
        assert_eq!(t.graph.call(call).arguments[0], Value::Variable(new_x));
        assert_eq!(t.graph.frame(frame).locals, vec![Value::Variable(new_x)]);
        // Renaming never changes the printed shape
        assert_eq!(t.print(root), printed);
        assert_eq!(t.graph.validate(root), Ok(()));
    }

    #[test]
    fn test_shadowing_resolves_to_innermost_binder() {
        // {proc[x] . {proc[x] . f(x)}(x)} with both binders the same variable
        let mut t = TestGraph::new();
        let f = t.method("f");
        let x = t.local(0);
        let innermost = t.call(f, vec![x.into()]);
        let inner = t.closure(vec![x], innermost);
        let middle = t.call(inner, vec![x.into()]);
        let outer = t.closure(vec![x], middle);
        let root = Node::Value(Value::Closure(outer));

        AlphaConversion::apply(&mut t.graph, root).unwrap();

        let outer_x = t.graph.closure(outer).parameters[0];
        let inner_x = t.graph.closure(inner).parameters[0];
        assert_ne!(outer_x, inner_x);
        assert_eq!(t.graph.call(middle).arguments, vec![Value::Variable(outer_x)]);
        assert_eq!(t.graph.call(innermost).arguments, vec![Value::Variable(inner_x)]);
        assert_eq!(t.graph.validate(root), Ok(()));
    }

    #[test]
    fn test_unbound_variable_is_an_error() {
        let mut t = TestGraph::new();
        let f = t.method("f");
        let stray = t.local(9);
        let call = t.call(f, vec![stray.into(), t.cc.into(), t.ce.into()]);
        let root = t.root(call);

        let result = AlphaConversion::apply(&mut t.graph, root);
        assert!(matches!(
            result,
            Err(CirError::UnboundVariable { variable, .. }) if variable == stray
        ));
    }

    #[test]
    fn test_shared_block_renamed_once() {
        let mut t = TestGraph::new();
        let k = t.graph.new_temporary(Kind::Reference);
        let body = t.call(k, vec![]);
        let closure = t.closure(vec![k], body);
        let block = t.graph.new_block(closure);
        let second = t.call(block, vec![t.cc.into()]);
        let cont = t.cont(vec![], second);
        let first = t.call(block, vec![cont.into()]);
        let root = t.root(first);

        AlphaConversion::apply(&mut t.graph, root).unwrap();

        let renamed = t.graph.closure(closure).parameters[0];
        assert_eq!(t.graph.variable(renamed).origin, Some(k));
        assert_eq!(t.graph.call(body).procedure, Value::Variable(renamed));
    }

    /// Collects every closure parameter of a graph
    #[derive(Default)]
    struct Binders(Vec<VariableId>);

    impl CirVisitor for Binders {
        fn visit_closure(&mut self, graph: &CirGraph, closure: ClosureId) {
            self.0.extend(graph.closures[closure].parameters.iter().copied());
        }
    }

    /// A chain of `depth` nested closures all binding the same variable, each
    /// applied to a previously bound one
    fn nested(depth: usize, picks: &[usize]) -> (TestGraph, Node) {
        let mut t = TestGraph::new();
        let f = t.method("f");
        let shared = t.local(0);
        let mut call = t.call(f, vec![shared.into(), t.cc.into(), t.ce.into()]);
        for level in 0..depth {
            let pick = picks.get(level).copied().unwrap_or(0) % 2;
            let argument = if pick == 0 { Value::int(level as i64) } else { shared.into() };
            let closure = t.closure(vec![shared], call);
            call = t.call(closure, vec![argument]);
        }
        let outer = t.closure(vec![shared], call);
        let call = t.call(outer, vec![Value::int(-1)]);
        let root = t.root(call);
        (t, root)
    }

    proptest! {
        #[test]
        fn test_binders_are_unique_after_conversion(
            depth in 0usize..12,
            picks in proptest::collection::vec(0usize..2, 12),
        ) {
            let (mut t, root) = nested(depth, &picks);
            let before = t.print(root);

            AlphaConversion::apply(&mut t.graph, root).unwrap();

            let mut binders = Binders::default();
            CirTraversal::new(&t.graph).run(root, &mut binders);
            let unique: FxHashSet<VariableId> = binders.0.iter().copied().collect();
            prop_assert_eq!(unique.len(), binders.0.len());
            prop_assert_eq!(t.print(root), before);
            prop_assert_eq!(t.graph.validate(root), Ok(()));
        }
    }
}
