//! Lexical scope analysis for ECMAScript ASTs.
//!
//! Given a parsed tree in an [`AstArena`](ambit_estree::AstArena), a single
//! depth-first pass builds the scope tree, creates one [`Variable`] per
//! binding, and resolves every identifier occurrence to the variable it
//! refers to (or records it as unresolved). Drive it with [`analyze`]:
//!
//! ```
//! use ambit_estree::from_estree;
//! use ambit_scope::{Options, analyze};
//!
//! let source = serde_json::json!({
//!     "type": "Program",
//!     "body": [{
//!         "type": "VariableDeclaration",
//!         "kind": "var",
//!         "declarations": [{
//!             "type": "VariableDeclarator",
//!             "id": {"type": "Identifier", "name": "answer"},
//!             "init": {"type": "Literal", "value": 42}
//!         }]
//!     }]
//! });
//! let (arena, root) = from_estree(&source).unwrap();
//! let manager = analyze(&arena, root, &Options::default()).unwrap();
//!
//! let global = manager.global_scope().unwrap();
//! let var = manager.scope(global).variables[0];
//! assert_eq!(manager.variable(var).name, "answer");
//! ```
//!
//! Ownership follows the arena discipline: the [`ScopeManager`] owns every
//! scope, variable, and reference for the lifetime of one analysis, and all
//! cross-links between them are plain ids ([`ScopeId`], [`VariableId`],
//! [`ReferenceId`]).

pub mod analyze;
pub mod definition;
pub mod error;
pub mod manager;
pub mod pattern;
pub mod reference;
pub mod referencer;
pub mod scope;
pub mod variable;

pub use ambit_estree as estree;

pub use analyze::{Options, analyze};
pub use definition::{Definition, DefinitionKind, DefinitionType};
pub use error::AnalyzeError;
pub use manager::ScopeManager;
pub use reference::{ImplicitGlobalCandidate, Reference, ReferenceFlags, ReferenceId};
pub use scope::{ImplicitGlobals, Scope, ScopeId, ScopeType};
pub use variable::{Variable, VariableId};
