//! # Analysis Module
//!
//! Analyses over CIR graphs: free variables and closure conversion, block call
//! bookkeeping, and exception-flow propagation over blocks.

pub mod block_updating;
pub mod exception_flow;
pub mod free_variables;


pub use block_updating::{CirBlockUpdating, CirScopedBlockUpdating, ScopedBlockUpdate};
pub use exception_flow::{may_raise, ExceptionFlow};
pub use free_variables::{apply_closure_conversion, convert_to_block, find_free_variables};
