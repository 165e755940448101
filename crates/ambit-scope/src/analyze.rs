//! Analysis options and the driver entry point.

use ambit_estree::{AstArena, Fallback, NodeIndex, SourceType, VisitorKeyMap};

use crate::error::AnalyzeError;
use crate::manager::ScopeManager;
use crate::referencer::Referencer;

/// Configuration for one analysis run.
#[derive(Debug)]
pub struct Options {
    /// `script` or `module`. Module implies strict mode and enables
    /// import/export handling.
    pub source_type: SourceType,
    /// ECMAScript version under analysis. Both edition numbers (`5`,
    /// `6`) and years (`2015`+) are accepted; versions below 6 disable
    /// block/switch scoping and `let`/`const`/class semantics.
    pub ecma_version: u32,
    /// Treat all code as strict (once the version supports strict mode),
    /// regardless of directives.
    pub implied_strict: bool,
    /// Model a CommonJS-style wrapper: an extra function scope directly
    /// inside the global scope, whose body is the whole program.
    pub global_return: bool,
    /// Per-type child-key overrides for the traversal.
    pub child_visitor_keys: Option<VisitorKeyMap>,
    /// Policy for node shapes outside the known set.
    pub fallback: Fallback,
}

impl Options {
    /// The defaults: script source, ES2018, iterate-unknown-nodes.
    pub fn new() -> Options {
        Options {
            source_type: SourceType::Script,
            ecma_version: 2018,
            implied_strict: false,
            global_return: false,
            child_visitor_keys: None,
            fallback: Fallback::Iteration,
        }
    }
}

impl Default for Options {
    fn default() -> Options {
        Options::new()
    }
}

/// Analyze a parsed tree and return the finished scope manager.
///
/// The root is expected to be the `Program` node the parser produced;
/// the tree is treated as immutable and exclusively owned by this call.
#[tracing::instrument(level = "debug", skip_all)]
pub fn analyze(
    arena: &AstArena,
    root: NodeIndex,
    options: &Options,
) -> Result<ScopeManager, AnalyzeError> {
    let manager = ScopeManager::new(options);
    let mut referencer = Referencer::new(arena, manager, options);
    referencer.visit(root)?;
    let manager = referencer.into_manager();
    assert!(
        manager.current_scope.is_none(),
        "current scope should be null after analysis"
    );
    Ok(manager)
}
