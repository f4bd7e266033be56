//! # Diagnostic Printing
//!
//! Renders CIR in the textual notation used throughout the docs and tests:
//!
//! ```text
//! {proc[x y cc ce] . f(x y 3 cc ce)}
//! {cont[t] . cc(t)}
//! ```
//!
//! Blocks are printed by name only; their closures can be printed separately.
//! Nesting deeper than [`PrettyConfig::max_depth`] is elided as `...`.

use crate::traversal::Node;
use crate::{CallId, CirGraph, Value};

/// Printer configuration
#[derive(Debug, Clone)]
pub struct PrettyConfig {
    pub max_depth: usize,
    /// Append `#<node id>` to variables and blocks
    pub show_ids: bool,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            show_ids: false,
        }
    }
}

impl PrettyConfig {
    pub const fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }
}

/// Trait for pretty-printing CIR constructs
pub trait PrettyPrint {
    fn pretty_print(&self, graph: &CirGraph, config: &PrettyConfig) -> String;
}

impl PrettyPrint for Node {
    fn pretty_print(&self, graph: &CirGraph, config: &PrettyConfig) -> String {
        let mut out = String::new();
        let printer = Printer { graph, config };
        match *self {
            Node::Call(call) => printer.call(&mut out, call, 0),
            Node::Value(value) => printer.value(&mut out, value, 0),
        }
        out
    }
}

impl PrettyPrint for Value {
    fn pretty_print(&self, graph: &CirGraph, config: &PrettyConfig) -> String {
        Node::Value(*self).pretty_print(graph, config)
    }
}

impl PrettyPrint for CallId {
    fn pretty_print(&self, graph: &CirGraph, config: &PrettyConfig) -> String {
        Node::Call(*self).pretty_print(graph, config)
    }
}

struct Printer<'a> {
    graph: &'a CirGraph,
    config: &'a PrettyConfig,
}

impl Printer<'_> {
    fn call(&self, out: &mut String, call: CallId, depth: usize) {
        if depth > self.config.max_depth {
            out.push_str("...");
            return;
        }
        let call = &self.graph.calls[call];
        self.value(out, call.procedure, depth + 1);
        out.push('(');
        for (i, argument) in call.arguments.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            self.value(out, *argument, depth + 1);
        }
        out.push(')');
    }

    fn value(&self, out: &mut String, value: Value, depth: usize) {
        match value {
            Value::Constant(constant) => out.push_str(&constant.to_string()),
            Value::Undefined => out.push_str("undefined"),
            Value::Procedure(procedure) => out.push_str(&self.graph.procedures[procedure].name()),
            Value::Variable(variable) => {
                let v = &self.graph.variables[variable];
                out.push_str(&v.prefix());
                if self.config.show_ids {
                    out.push_str(&format!("#{}", v.id.raw()));
                }
            }
            Value::Block(block) => {
                out.push('B');
                if self.config.show_ids {
                    out.push_str(&format!("#{}", self.graph.blocks[block].id.raw()));
                }
            }
            Value::Closure(closure) => {
                if depth > self.config.max_depth {
                    out.push_str("...");
                    return;
                }
                let closure = &self.graph.closures[closure];
                out.push_str(if closure.is_continuation() {
                    "{cont["
                } else {
                    "{proc["
                });
                for (i, &parameter) in closure.parameters.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.value(out, Value::Variable(parameter), depth + 1);
                }
                out.push_str("] . ");
                self.call(out, closure.body, depth + 1);
                out.push('}');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestGraph;

    #[test]
    fn test_print_closure() {
        let mut t = TestGraph::new();
        let x = t.local(0);
        let f = t.method("f");
        let body = t.call(f, vec![x.into(), Value::int(3), t.cc.into(), t.ce.into()]);
        let closure = t.closure(vec![x], body);
        insta::assert_snapshot!(t.print(Value::Closure(closure)), @"{proc[l0] . f(l0 3 cc ce)}");
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut t = TestGraph::new();
        let mut body = t.call(t.cc, vec![]);
        for _ in 0..10 {
            let cont = t.cont(vec![], body);
            body = t.call(t.cc, vec![Value::Closure(cont)]);
        }
        let config = PrettyConfig {
            max_depth: 4,
            show_ids: false,
        };
        let printed = body.pretty_print(&t.graph, &config);
        assert!(printed.contains("..."));
        assert!(printed.starts_with("cc({cont[] . cc("));
    }

    const WITH_IDS: PrettyConfig = PrettyConfig {
        max_depth: 8,
        show_ids: false,
    }
    .with_ids();

    #[test]
    fn test_print_with_ids() {
        let mut t = TestGraph::new();
        let body = t.call(t.cc, vec![Value::int(1)]);
        let id = t.graph.variable(t.cc).id.raw();
        assert_eq!(body.pretty_print(&t.graph, &WITH_IDS), format!("cc#{id}(1)"));
    }
}
