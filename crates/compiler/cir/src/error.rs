//! Errors raised by CIR transformations.
//!
//! Every variant is a compiler-internal invariant violation: malformed input is
//! rejected by the front end long before CIR exists. Callers abort the compilation
//! of the current method when they see one.

use thiserror::Error;

use crate::VariableId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CirError {
    /// A variable occurrence with no enclosing binder
    #[error("unbound variable {name} ({variable:?})")]
    UnboundVariable { variable: VariableId, name: String },

    /// A closure applied to the wrong number of arguments
    #[error("arity mismatch: {parameters} parameters applied to {arguments} arguments")]
    ArityMismatch { parameters: usize, arguments: usize },

    /// A value used where a closure was required
    #[error("expected a closure, found {0}")]
    NotAClosure(String),

    /// A structural invariant of the graph does not hold
    #[error("invalid CIR graph: {0}")]
    InvalidGraph(String),
}

/// Result type for CIR operations
pub type CirResult<T> = Result<T, CirError>;
