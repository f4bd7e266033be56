//! # CIR Procedures
//!
//! Procedures are the non-closure callees: compiled methods, snippets, builtins and
//! the switch operator. Method bodies live in the same graph so that inlining can
//! replicate them.

use crate::ClosureId;

/// How a switch compares its tag against its match values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    GreaterEqual,
}

/// A callable procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Procedure {
    /// A Java method, with its CIR body when one has been built
    Method {
        name: String,
        body: Option<ClosureId>,
    },
    /// A snippet: a method-like helper of the runtime
    Snippet { name: String },
    /// A builtin operation
    Builtin { name: String, can_trap: bool },
    /// A multi-way branch over `matches` values.
    ///
    /// Arguments are `[tag, match_1..match_n, target_1..target_n, default]`: the first
    /// half are values, the second half the corresponding continuations.
    Switch { comparison: Comparison, matches: usize },
}

impl Procedure {
    pub fn method(name: impl Into<String>) -> Self {
        Self::Method {
            name: name.into(),
            body: None,
        }
    }

    pub fn snippet(name: impl Into<String>) -> Self {
        Self::Snippet { name: name.into() }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::Builtin {
            name: name.into(),
            can_trap: false,
        }
    }

    pub const fn switch(comparison: Comparison, matches: usize) -> Self {
        Self::Switch {
            comparison,
            matches,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Method { name, .. } | Self::Snippet { name } | Self::Builtin { name, .. } => {
                name.clone()
            }
            Self::Switch {
                comparison,
                matches,
            } => format!("switch{comparison:?}/{matches}"),
        }
    }

    pub const fn is_switch(&self) -> bool {
        matches!(self, Self::Switch { .. })
    }

    /// Index of the first continuation argument of a switch call
    pub const fn first_switch_target(&self) -> Option<usize> {
        match self {
            Self::Switch { matches, .. } => Some(1 + *matches),
            _ => None,
        }
    }
}
