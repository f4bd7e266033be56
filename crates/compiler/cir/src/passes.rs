//! # CIR Transformation Passes
//!
//! This module implements the structural transformations applied to a CIR graph
//! and the [`PassManager`] that drives them to a fixpoint.
//!
//! Alpha-conversion runs once, up front. The other passes then run in rounds;
//! every pass that reports a change is followed by a block update so that the
//! next pass sees accurate block call lists. A round in which no pass changes the
//! graph ends the run.
//!
//! Frame-descriptor clipping is not part of any pipeline: only the caller knows
//! which values are obsolete.

pub mod alpha_conversion;
pub mod beta_reduction;
pub mod block_parameter_merging;
pub mod frame_clipping;
pub mod inlining;
pub mod replication;
pub mod switch_encapsulation;

pub use alpha_conversion::AlphaConversion;
pub use beta_reduction::BetaReduction;
pub use block_parameter_merging::CirBlockParameterMerging;
pub use frame_clipping::CirFrameDescriptorClipping;
pub use inlining::CirInlining;
pub use replication::{BlockSharing, CirReplication};
pub use switch_encapsulation::CirSwitchEncapsulation;

use crate::analysis::CirBlockUpdating;
use crate::traversal::Node;
use crate::{CirGraph, CirOptimizer, CirResult, TransformationKind};

/// A trait for CIR transformation passes
pub trait CirPass {
    /// Apply this pass to the graph below `root`
    /// Returns true if the graph was modified
    fn run(
        &mut self,
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
    ) -> CirResult<bool>;

    /// Get the name of this pass for debugging
    fn name(&self) -> &'static str;
}

/// Block and method inlining, as far as the optimizer's policy allows
#[derive(Debug, Default)]
pub struct InliningPass;

impl InliningPass {
    pub const fn new() -> Self {
        Self
    }
}

impl CirPass for InliningPass {
    fn run(
        &mut self,
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
    ) -> CirResult<bool> {
        let config = optimizer.config();
        if !config.inline_blocks && !config.inline_methods {
            return Ok(false);
        }
        CirInlining::apply(optimizer, graph, root)
    }

    fn name(&self) -> &'static str {
        "Inlining"
    }
}

/// Merges redundant parameters of every block reachable from the root
#[derive(Debug, Default)]
pub struct BlockParameterMergingPass;

impl BlockParameterMergingPass {
    pub const fn new() -> Self {
        Self
    }
}

impl CirPass for BlockParameterMergingPass {
    fn run(
        &mut self,
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
    ) -> CirResult<bool> {
        if !optimizer.config().merge_block_parameters {
            return Ok(false);
        }
        let blocks = CirBlockUpdating::apply(graph, root);
        Ok(CirBlockParameterMerging::apply(
            optimizer, graph, root, &blocks,
        ))
    }

    fn name(&self) -> &'static str {
        "BlockParameterMerging"
    }
}

#[derive(Debug, Default)]
pub struct SwitchEncapsulationPass;

impl SwitchEncapsulationPass {
    pub const fn new() -> Self {
        Self
    }
}

impl CirPass for SwitchEncapsulationPass {
    fn run(
        &mut self,
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
    ) -> CirResult<bool> {
        if !optimizer.config().encapsulate_switches {
            return Ok(false);
        }
        Ok(CirSwitchEncapsulation::apply(optimizer, graph, root))
    }

    fn name(&self) -> &'static str {
        "SwitchEncapsulation"
    }
}

/// A pass manager that runs CIR passes to a fixpoint
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn CirPass>>,
}

impl PassManager {
    /// Create a new pass manager
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Add a pass to the manager
    pub fn add_pass<P: CirPass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Create the standard pipeline
    pub fn standard_pipeline() -> Self {
        Self::new()
            .add_pass(SwitchEncapsulationPass::new())
            .add_pass(InliningPass::new())
            .add_pass(BlockParameterMergingPass::new())
    }

    /// Alpha-converts the graph below `root`, then runs all passes until none of
    /// them changes the graph or `max_iterations` rounds have run.
    /// Returns true if any pass modified the graph.
    pub fn run(
        &mut self,
        optimizer: &mut CirOptimizer,
        graph: &mut CirGraph,
        root: Node,
    ) -> CirResult<bool> {
        optimizer.notify_before_transformation(graph, root, TransformationKind::AlphaConversion);
        if let Err(error) = AlphaConversion::apply(graph, root) {
            log::error!("alpha-conversion failed: {error}");
            return Err(error);
        }
        optimizer.notify_after_transformation(graph, root, TransformationKind::AlphaConversion);
        CirBlockUpdating::apply(graph, root);

        let mut modified = false;
        let max_iterations = optimizer.config().max_iterations;
        for round in 0..max_iterations {
            let mut round_modified = false;
            for pass in &mut self.passes {
                let changed = match pass.run(optimizer, graph, root) {
                    Ok(changed) => changed,
                    Err(error) => {
                        log::error!("pass '{}' failed: {error}", pass.name());
                        return Err(error);
                    }
                };
                if changed {
                    log::debug!("pass '{}' modified the graph in round {round}", pass.name());
                    CirBlockUpdating::apply(graph, root);
                    round_modified = true;
                }
            }
            if !round_modified {
                log::trace!("fixpoint reached after {} rounds", round + 1);
                return Ok(modified);
            }
            modified = true;
        }
        log::debug!("stopped after {max_iterations} rounds without reaching a fixpoint");
        Ok(modified)
    }
}

#[cfg(test)]
#[path = "passes_tests.rs"]
mod tests;
