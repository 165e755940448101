//! ESTree-shaped AST storage for the ambit scope analyzer.
//!
//! This crate provides the tree representation the analyzer consumes:
//! - `NodeKind` / `Node` - the node taxonomy and thin node records
//! - `AstArena` - pooled node storage addressed by `NodeIndex` handles
//! - the default child-visitor-key table and per-node child lookup
//! - ESTree JSON ingestion (`from_estree`)
//!
//! The arena does not parse source text. Trees are either loaded from the
//! JSON a JavaScript parser emitted, or built directly against the `add_*`
//! methods.

pub mod arena;
pub mod estree;
pub mod keys;
pub mod node;
pub mod span;

pub use arena::AstArena;
pub use estree::{EstreeError, from_estree};
pub use keys::{Fallback, NodeSlot, VisitorKeyMap, visitor_keys};
pub use node::{
    ChildValue, DeclarationKind, LiteralValue, Node, NodeIndex, NodeKind, NodeList, PropertyKind,
    SourceType,
};
pub use span::Span;
