//! # The CIR Graph Arena
//!
//! All nodes of a compilation unit live in one [`CirGraph`]. Nodes refer to each
//! other through typed handles; sharing a block between calls means storing the
//! same [`BlockId`] in several calls. Mutation in place is "look up by handle,
//! change the slot". Nothing is ever removed: unreachable nodes are simply dead.

use index_vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::traversal::{CirTraversal, CirVisitor, Node};
use crate::{
    Block, BlockId, BlockRole, Call, CallId, CirError, CirResult, Closure, ClosureId,
    ClosureKind, FrameId, JavaFrameDescriptor, NodeId, Procedure, ProcedureId, Value, Variable,
    VariableId,
};

/// Arena owning every node of a CIR program
#[derive(Debug, Clone, Default)]
pub struct CirGraph {
    pub variables: IndexVec<VariableId, Variable>,
    pub calls: IndexVec<CallId, Call>,
    pub closures: IndexVec<ClosureId, Closure>,
    pub blocks: IndexVec<BlockId, Block>,
    pub procedures: IndexVec<ProcedureId, Procedure>,
    pub frames: IndexVec<FrameId, JavaFrameDescriptor>,
    next_node_id: u32,
}

impl CirGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next debugging identifier
    pub(crate) fn next_node_id(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    // --- Construction ---

    pub fn new_call(&mut self, procedure: Value, arguments: Vec<Value>) -> CallId {
        let id = self.next_node_id();
        self.calls.push(Call {
            id,
            procedure,
            arguments,
            frame: None,
            is_native: false,
        })
    }

    pub fn new_closure(&mut self, parameters: Vec<VariableId>, body: CallId) -> ClosureId {
        self.new_closure_of_kind(ClosureKind::Procedure, parameters, body)
    }

    pub fn new_continuation(&mut self, parameters: Vec<VariableId>, body: CallId) -> ClosureId {
        self.new_closure_of_kind(ClosureKind::Continuation, parameters, body)
    }

    pub fn new_closure_of_kind(
        &mut self,
        kind: ClosureKind,
        parameters: Vec<VariableId>,
        body: CallId,
    ) -> ClosureId {
        let id = self.next_node_id();
        let mut closure = Closure {
            id,
            kind,
            parameters: Vec::new(),
            body,
        };
        closure.set_parameters(parameters);
        self.closures.push(closure)
    }

    pub fn new_block(&mut self, closure: ClosureId) -> BlockId {
        self.new_block_with_role(closure, BlockRole::Normal)
    }

    pub fn new_block_with_role(&mut self, closure: ClosureId, role: BlockRole) -> BlockId {
        let id = self.next_node_id();
        self.blocks.push(Block {
            id,
            role,
            closure,
            calls: Vec::new(),
        })
    }

    pub fn new_procedure(&mut self, procedure: Procedure) -> ProcedureId {
        self.procedures.push(procedure)
    }

    pub fn new_frame(&mut self, frame: JavaFrameDescriptor) -> FrameId {
        self.frames.push(frame)
    }

    /// Attaches a CIR body to a method procedure
    pub fn set_method_body(&mut self, method: ProcedureId, closure: ClosureId) {
        if let Procedure::Method { body, .. } = &mut self.procedures[method] {
            *body = Some(closure);
        }
    }

    // --- Access ---

    pub fn call(&self, id: CallId) -> &Call {
        &self.calls[id]
    }

    pub fn call_mut(&mut self, id: CallId) -> &mut Call {
        &mut self.calls[id]
    }

    pub fn closure(&self, id: ClosureId) -> &Closure {
        &self.closures[id]
    }

    pub fn closure_mut(&mut self, id: ClosureId) -> &mut Closure {
        &mut self.closures[id]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id]
    }

    pub fn procedure(&self, id: ProcedureId) -> &Procedure {
        &self.procedures[id]
    }

    pub fn frame(&self, id: FrameId) -> &JavaFrameDescriptor {
        &self.frames[id]
    }

    pub fn frame_mut(&mut self, id: FrameId) -> &mut JavaFrameDescriptor {
        &mut self.frames[id]
    }

    /// The debugging identifier of a node, if the node carries one
    pub fn node_id(&self, node: Node) -> Option<NodeId> {
        match node {
            Node::Call(call) => Some(self.calls[call].id),
            Node::Value(Value::Closure(closure)) => Some(self.closures[closure].id),
            Node::Value(Value::Block(block)) => Some(self.blocks[block].id),
            Node::Value(Value::Variable(variable)) => Some(self.variables[variable].id),
            Node::Value(_) => None,
        }
    }

    /// Returns true if `value` is a closure of continuation kind
    pub fn is_continuation(&self, value: Value) -> bool {
        matches!(value, Value::Closure(c) if self.closures[c].is_continuation())
    }

    /// Overwrites `target` with a copy of `source`, keeping the identity of `target`.
    ///
    /// Used when a call is replaced by another in place (e.g. after inlining).
    pub fn assign_call(&mut self, target: CallId, source: CallId) {
        let id = self.calls[target].id;
        let mut call = self.calls[source].clone();
        call.id = id;
        self.calls[target] = call;
    }

    // --- Validation ---

    /// Checks the structural invariants of the graph reachable from `root`:
    /// closure parameters are pairwise distinct, no variable is bound by two
    /// closures, and every block's call list matches the calls that name it.
    pub fn validate(&self, root: Node) -> CirResult<()> {
        let mut checker = InvariantChecker::default();
        CirTraversal::new(self).run(root, &mut checker);

        if let Some(message) = checker.errors.into_iter().next() {
            return Err(CirError::InvalidGraph(message));
        }

        for (block, calls) in &checker.block_calls {
            let recorded: FxHashSet<CallId> = self.blocks[*block].calls.iter().copied().collect();
            if recorded.len() != self.blocks[*block].calls.len() || &recorded != calls {
                return Err(CirError::InvalidGraph(format!(
                    "block {:?} records {} calls but {} calls name it",
                    self.blocks[*block].id,
                    self.blocks[*block].calls.len(),
                    calls.len()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct InvariantChecker {
    bound: FxHashSet<VariableId>,
    block_calls: FxHashMap<BlockId, FxHashSet<CallId>>,
    errors: Vec<String>,
}

impl CirVisitor for InvariantChecker {
    fn visit_call(&mut self, graph: &CirGraph, call: CallId) {
        if let Value::Block(block) = graph.calls[call].procedure {
            self.block_calls.entry(block).or_default().insert(call);
        }
    }

    fn visit_closure(&mut self, graph: &CirGraph, closure: ClosureId) {
        for &parameter in &graph.closures[closure].parameters {
            if !self.bound.insert(parameter) {
                self.errors.push(format!(
                    "variable {:?} is bound more than once (closure {:?})",
                    graph.variables[parameter].id, graph.closures[closure].id
                ));
            }
        }
    }

    fn visit_block(&mut self, _graph: &CirGraph, block: BlockId) {
        self.block_calls.entry(block).or_default();
    }
}
