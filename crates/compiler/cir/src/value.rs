//! # CIR Values
//!
//! Anything that can appear as the procedure or as an argument of a call.
//! Node values are handles into the owning [`crate::CirGraph`], so comparing two
//! values compares node identity, never structure.

use crate::{BlockId, ClosureId, ProcedureId, VariableId};

/// Represents any value usable in a call: constants, variables, closures, blocks,
/// procedures and the undefined value.
///
/// # Design Notes
///
/// - The type is `Copy`: handles are cheap and the graph owns the nodes
/// - Equality is reference identity for nodes, value equality for constants
/// - `Undefined` marks clipped frame-descriptor slots and absent continuations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A compile-time constant
    Constant(Constant),

    /// A reference to a variable bound by some enclosing closure
    Variable(VariableId),

    /// An inline closure or continuation
    Closure(ClosureId),

    /// A shared block
    Block(BlockId),

    /// A method, snippet, builtin or switch
    Procedure(ProcedureId),

    /// The undefined value
    Undefined,
}

/// The value kind of a constant or a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Int,
    Long,
    Float,
    Double,
    Word,
    Reference,
    Void,
}

/// Constant values embedded directly in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i64),
    Long(i64),
    Boolean(bool),
    Word(u64),
    Null,
}

impl Constant {
    /// Returns the value kind of this constant
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Int(_) | Self::Boolean(_) => Kind::Int,
            Self::Long(_) => Kind::Long,
            Self::Word(_) => Kind::Word,
            Self::Null => Kind::Reference,
        }
    }
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}L"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Word(value) => write!(f, "{value:#x}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl Value {
    /// Creates an int constant
    pub const fn int(value: i64) -> Self {
        Self::Constant(Constant::Int(value))
    }

    /// Creates a boolean constant
    pub const fn boolean(value: bool) -> Self {
        Self::Constant(Constant::Boolean(value))
    }

    /// Returns true if this value is a constant
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Returns true if this value is the undefined value
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the variable handle if this is a variable
    pub const fn as_variable(&self) -> Option<VariableId> {
        match self {
            Self::Variable(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the closure handle if this is a closure
    pub const fn as_closure(&self) -> Option<ClosureId> {
        match self {
            Self::Closure(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the block handle if this is a block
    pub const fn as_block(&self) -> Option<BlockId> {
        match self {
            Self::Block(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the procedure handle if this is a procedure
    pub const fn as_procedure(&self) -> Option<ProcedureId> {
        match self {
            Self::Procedure(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<VariableId> for Value {
    fn from(id: VariableId) -> Self {
        Self::Variable(id)
    }
}

impl From<ClosureId> for Value {
    fn from(id: ClosureId) -> Self {
        Self::Closure(id)
    }
}

impl From<BlockId> for Value {
    fn from(id: BlockId) -> Self {
        Self::Block(id)
    }
}

impl From<ProcedureId> for Value {
    fn from(id: ProcedureId) -> Self {
        Self::Procedure(id)
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Self {
        Self::Constant(constant)
    }
}
