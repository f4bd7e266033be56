//! # CIR Optimizer Context
//!
//! The optimizer is the context every pass runs in: it carries the configuration,
//! the inlining policy consulted by [`crate::CirInlining`], and an optional trace
//! observer notified around each transformation.

use crate::traversal::{CirCount, CirSearch, Node};
use crate::{BlockId, CirGraph, ProcedureId, Procedure, Value};

/// Optimizer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Largest method body (in nodes) the default policy inlines
    pub max_inline_size: usize,
    pub inline_blocks: bool,
    pub inline_methods: bool,
    pub merge_block_parameters: bool,
    pub encapsulate_switches: bool,
    /// Upper bound on pass-manager rounds
    pub max_iterations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_inline_size: 64,
            inline_blocks: true,
            inline_methods: true,
            merge_block_parameters: true,
            encapsulate_switches: true,
            max_iterations: 16,
        }
    }
}

impl OptimizerConfig {
    pub const fn with_max_inline_size(mut self, max_inline_size: usize) -> Self {
        self.max_inline_size = max_inline_size;
        self
    }

    pub const fn with_inline_blocks(mut self, inline_blocks: bool) -> Self {
        self.inline_blocks = inline_blocks;
        self
    }

    pub const fn with_inline_methods(mut self, inline_methods: bool) -> Self {
        self.inline_methods = inline_methods;
        self
    }

    pub const fn with_merge_block_parameters(mut self, merge: bool) -> Self {
        self.merge_block_parameters = merge;
        self
    }

    pub const fn with_encapsulate_switches(mut self, encapsulate: bool) -> Self {
        self.encapsulate_switches = encapsulate;
        self
    }

    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// The transformations reported to a [`CirTraceObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformationKind {
    AlphaConversion,
    BetaReduction,
    Inlining,
    BlockParameterMerging,
    SwitchEncapsulation,
    FrameDescriptorClipping,
}

/// Observer notified around transformations. Must not change the graph.
pub trait CirTraceObserver {
    fn before_transformation(&mut self, _graph: &CirGraph, _node: Node, _kind: TransformationKind) {}

    fn after_transformation(&mut self, _graph: &CirGraph, _node: Node, _kind: TransformationKind) {}
}

/// What an inlining decision is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineTarget {
    Block(BlockId),
    Method(ProcedureId),
}

/// Decides whether a call to a block or method is inlined
pub trait InliningPolicy {
    fn is_inlineable(
        &self,
        optimizer: &CirOptimizer,
        graph: &CirGraph,
        target: InlineTarget,
        arguments: &[Value],
    ) -> bool;
}

/// Inlines blocks with a single call and small methods, never a target that calls
/// itself.
///
/// Relies on block call lists being up to date.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInliningPolicy;

impl InliningPolicy for DefaultInliningPolicy {
    fn is_inlineable(
        &self,
        optimizer: &CirOptimizer,
        graph: &CirGraph,
        target: InlineTarget,
        _arguments: &[Value],
    ) -> bool {
        let config = optimizer.config();
        match target {
            InlineTarget::Block(block) => {
                if !config.inline_blocks || graph.blocks[block].number_of_calls() != 1 {
                    return false;
                }
                let closure = Node::Value(Value::Closure(graph.blocks[block].closure));
                !CirSearch::new(graph).calls_block(closure, block)
            }
            InlineTarget::Method(method) => {
                let Procedure::Method {
                    body: Some(body), ..
                } = graph.procedures[method]
                else {
                    return false;
                };
                if !config.inline_methods {
                    return false;
                }
                let body = Node::Value(Value::Closure(body));
                CirCount::nodes(graph, body) <= config.max_inline_size
                    && !CirSearch::new(graph).calls_procedure(body, method)
            }
        }
    }
}

/// Context shared by all CIR passes of one compilation
pub struct CirOptimizer {
    config: OptimizerConfig,
    policy: Box<dyn InliningPolicy>,
    observer: Option<Box<dyn CirTraceObserver>>,
}

impl Default for CirOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl CirOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            policy: Box::new(DefaultInliningPolicy),
            observer: None,
        }
    }

    pub fn with_policy(mut self, policy: impl InliningPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_observer(mut self, observer: impl CirTraceObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn inlining_policy(&self) -> &dyn InliningPolicy {
        self.policy.as_ref()
    }

    /// Asks the inlining policy about `target` called with `arguments`
    pub fn is_inlineable(&self, graph: &CirGraph, target: InlineTarget, arguments: &[Value]) -> bool {
        self.inlining_policy()
            .is_inlineable(self, graph, target, arguments)
    }

    pub fn notify_before_transformation(
        &mut self,
        graph: &CirGraph,
        node: Node,
        kind: TransformationKind,
    ) {
        if let Some(observer) = &mut self.observer {
            observer.before_transformation(graph, node, kind);
        }
    }

    pub fn notify_after_transformation(
        &mut self,
        graph: &CirGraph,
        node: Node,
        kind: TransformationKind,
    ) {
        if let Some(observer) = &mut self.observer {
            observer.after_transformation(graph, node, kind);
        }
    }
}
