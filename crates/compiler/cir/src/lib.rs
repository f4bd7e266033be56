//! # CPS Intermediate Representation (CIR)
//!
//! This crate defines the continuation-passing-style intermediate representation of
//! the method compiler, together with the structural transformations that operate on
//! it. A CIR program is a graph of calls, closures, continuations and blocks.
//!
//! ## Design Principles
//!
//! 1. **Calls are the only statements**: every closure body is exactly one call, and
//!    control transfer happens by calling a continuation.
//! 2. **Blocks are the only sharing**: a block wraps one closure and may be the
//!    procedure of many calls. Closures are never shared unless replicated.
//! 3. **Unique bindings**: after alpha-conversion every variable is bound by exactly
//!    one closure.
//! 4. **No recursion over the graph**: every walk uses an explicit worklist, so deep
//!    call chains and back-references through blocks are safe.
//!
//! ## Architecture
//!
//! ```text
//! CirGraph (arena)
//! variables:  IndexVec<VariableId, Variable>
//! calls:      IndexVec<CallId, Call>
//! closures:   IndexVec<ClosureId, Closure>
//! blocks:     IndexVec<BlockId, Block>
//! procedures: IndexVec<ProcedureId, Procedure>
//! frames:     IndexVec<FrameId, JavaFrameDescriptor>
//!
//! Call    = procedure: Value, arguments: Vec<Value>, frame: Option<FrameId>
//! Closure = parameters: Vec<VariableId>, body: CallId
//! Block   = closure: ClosureId, calls: Vec<CallId>
//! ```
//!
//! ## Error Handling
//!
//! Errors in this layer are compiler-internal invariant violations. They are
//! reported as [`CirError`] and abort the compilation of the current method.

#![allow(clippy::option_if_let_else)]

pub use block::{Block, BlockRole};
pub use call::{Call, JavaFrameDescriptor};
pub use closure::{Closure, ClosureKind};
pub use error::{CirError, CirResult};
pub use graph::CirGraph;
pub use optimizer::{
    CirOptimizer, CirTraceObserver, DefaultInliningPolicy, InlineTarget, InliningPolicy,
    OptimizerConfig, TransformationKind,
};
pub use passes::{
    AlphaConversion, BetaReduction, BlockParameterMergingPass, BlockSharing,
    CirBlockParameterMerging, CirFrameDescriptorClipping, CirInlining, CirPass, CirReplication,
    CirSwitchEncapsulation, InliningPass, PassManager, SwitchEncapsulationPass,
};
pub use pretty::{PrettyConfig, PrettyPrint};
pub use procedure::{Comparison, Procedure};
pub use traversal::Node;
pub use value::{Constant, Kind, Value};
pub use variable::{Variable, VariableKind};

pub mod analysis;
pub mod block;
pub mod call;
pub mod closure;
pub mod error;
pub mod graph;
pub mod optimizer;
pub mod passes;
pub mod pretty;
pub mod procedure;
pub mod traversal;
pub mod value;
pub mod variable;

#[cfg(test)]
pub mod testing;

// --- Core Identifiers ---

index_vec::define_index_type! {
    /// Debugging identifier handed out to every node by its graph
    pub struct NodeId = u32;
}

index_vec::define_index_type! {
    /// Handle of a variable within a CIR graph
    pub struct VariableId = usize;
}

index_vec::define_index_type! {
    /// Handle of a call within a CIR graph
    pub struct CallId = usize;
}

index_vec::define_index_type! {
    /// Handle of a closure (or continuation) within a CIR graph
    pub struct ClosureId = usize;
}

index_vec::define_index_type! {
    /// Handle of a block within a CIR graph
    pub struct BlockId = usize;
}

index_vec::define_index_type! {
    /// Handle of a procedure (method, snippet, builtin or switch)
    pub struct ProcedureId = usize;
}

index_vec::define_index_type! {
    /// Handle of a Java frame descriptor
    pub struct FrameId = usize;
}
