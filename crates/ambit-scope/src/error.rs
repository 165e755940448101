//! Analysis failures surfaced to callers.
//!
//! Only caller-input problems live here. Internal invariant breaches
//! (operating with no open scope, resolving against an unclosed scope)
//! panic instead: once they fire, the scope tree's consistency guarantees
//! are gone and continuing would hand back garbage.

/// An error aborting [`analyze`](crate::analyze).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    /// The traversal met a node shape outside the known set while the
    /// fallback policy was [`Fallback::None`](ambit_estree::Fallback).
    UnknownNodeType { type_name: String },
    /// An `ImportDeclaration` appeared outside an ES2015 module.
    ImportOutsideModule,
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzeError::UnknownNodeType { type_name } => {
                write!(f, "unknown node type {type_name:?}")
            }
            AnalyzeError::ImportOutsideModule => {
                write!(
                    f,
                    "ImportDeclaration should appear when the mode is ES6 and in the module context"
                )
            }
        }
    }
}

impl std::error::Error for AnalyzeError {}
