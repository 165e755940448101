//! Scopes, strictness, and the resolution-closing algorithm.
//!
//! A scope is open from creation until the walker leaves its subtree.
//! While open it accumulates references in `left`; closing consumes that
//! list exactly once with the strategy its kind selects (static lookup,
//! `with` tainting, or the global hybrid), then `left` becomes `None`
//! permanently.

use ambit_estree::{AstArena, DeclarationKind, LiteralValue, NodeIndex, NodeKind};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::definition::{Definition, DefinitionKind};
use crate::manager::ScopeManager;
use crate::reference::{ImplicitGlobalCandidate, Reference, ReferenceFlags, ReferenceId};
use crate::variable::{Variable, VariableId};

/// Handle to a [`Scope`] owned by the [`ScopeManager`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of lexical region a scope models.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeType {
    Global,
    Module,
    Function,
    FunctionExpressionName,
    Block,
    Switch,
    For,
    Catch,
    Class,
    With,
}

impl ScopeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeType::Global => "global",
            ScopeType::Module => "module",
            ScopeType::Function => "function",
            ScopeType::FunctionExpressionName => "function-expression-name",
            ScopeType::Block => "block",
            ScopeType::Switch => "switch",
            ScopeType::For => "for",
            ScopeType::Catch => "catch",
            ScopeType::Class => "class",
            ScopeType::With => "with",
        }
    }

    /// Whether this kind is a unit `var` declarations hoist to.
    pub fn is_variable_scope(self) -> bool {
        matches!(self, ScopeType::Global | ScopeType::Function | ScopeType::Module)
    }
}

/// The implicit-global side table of the global scope: bindings created
/// by sloppy-mode assignment to undeclared names, kept apart from the
/// declared variables, plus the final snapshot of the references that
/// were still unresolved when the global scope closed.
#[derive(Debug, Default)]
pub struct ImplicitGlobals {
    pub set: FxHashMap<String, VariableId>,
    pub variables: Vec<VariableId>,
    pub left: Vec<ReferenceId>,
}

/// Kind-specific scope payload. Only the global scope carries state of
/// its own.
#[derive(Debug)]
pub enum ScopeKind {
    Global(ImplicitGlobals),
    Module,
    Function,
    FunctionExpressionName,
    Block,
    Switch,
    For,
    Catch,
    Class,
    With,
}

impl ScopeKind {
    pub fn scope_type(&self) -> ScopeType {
        match self {
            ScopeKind::Global(_) => ScopeType::Global,
            ScopeKind::Module => ScopeType::Module,
            ScopeKind::Function => ScopeType::Function,
            ScopeKind::FunctionExpressionName => ScopeType::FunctionExpressionName,
            ScopeKind::Block => ScopeType::Block,
            ScopeKind::Switch => ScopeType::Switch,
            ScopeKind::For => ScopeType::For,
            ScopeKind::Catch => ScopeType::Catch,
            ScopeKind::Class => ScopeType::Class,
            ScopeKind::With => ScopeType::With,
        }
    }
}

/// One lexical region of the analyzed program.
#[derive(Debug)]
pub struct Scope {
    pub(crate) kind: ScopeKind,
    /// The AST node that opened the scope.
    pub block: NodeIndex,
    /// Parent scope; `None` only for the global scope.
    pub upper: Option<ScopeId>,
    pub child_scopes: Vec<ScopeId>,
    /// Variables declared in this scope, in insertion order.
    pub variables: Vec<VariableId>,
    /// Name table over `variables`.
    pub set: FxHashMap<String, VariableId>,
    /// Every reference whose occurrence lies in this scope, in
    /// visitation order.
    pub references: Vec<ReferenceId>,
    /// References that escaped this scope unresolved.
    pub through: Vec<ReferenceId>,
    /// References collected but not yet resolved; consumed when the
    /// scope closes and `None` from then on.
    pub(crate) left: Option<Vec<ReferenceId>>,
    /// Whether strict-mode rules are in effect here.
    pub is_strict: bool,
    /// Whether names here cannot be statically proven to resolve
    /// (global and `with` scopes).
    pub dynamic: bool,
    /// Nearest self-or-ancestor global/function/module scope.
    pub variable_scope: ScopeId,
    /// Names whose resolution was observed through a dynamic scope.
    pub taints: FxHashMap<String, bool>,
}

impl Scope {
    pub fn scope_type(&self) -> ScopeType {
        self.kind.scope_type()
    }

    /// The implicit-global table; `Some` only on the global scope.
    pub fn implicit(&self) -> Option<&ImplicitGlobals> {
        match &self.kind {
            ScopeKind::Global(implicit) => Some(implicit),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.left.is_none()
    }

    pub fn is_static(&self) -> bool {
        !self.dynamic
    }
}

/// Scan a directive prologue for `"use strict"`. The raw source text is
/// compared when the parser kept it, so escaped spellings like
/// `"use\x20strict"` do not count.
fn has_strict_directive(arena: &AstArena, statements: &[NodeIndex]) -> bool {
    for &statement in statements {
        let Some(stmt) =
            arena.get(statement).and_then(|node| arena.get_expression_statement(node))
        else {
            break;
        };
        let Some(literal) = arena.get_literal_at(stmt.expression) else {
            break;
        };
        let LiteralValue::String(value) = &literal.value else {
            break;
        };
        if let Some(raw) = &literal.raw {
            if raw == "\"use strict\"" || raw == "'use strict'" {
                return true;
            }
        } else if value == "use strict" {
            return true;
        }
    }
    false
}

fn directive_body<'a>(arena: &'a AstArena, block: NodeIndex) -> Option<&'a [NodeIndex]> {
    match arena.kind(block)? {
        NodeKind::Program => arena.get_program_at(block).map(|p| p.body.nodes.as_slice()),
        NodeKind::BlockStatement => arena
            .get(block)
            .and_then(|node| arena.get_list(node))
            .map(|list| list.elements.nodes.as_slice()),
        _ => None,
    }
}

/// Compute strictness at scope construction. Strictness propagates
/// downward once true; class and module bodies and method bodies are
/// strict regardless of directives.
pub(crate) fn is_strict_scope(
    arena: &AstArena,
    upper_is_strict: bool,
    scope_type: ScopeType,
    block: NodeIndex,
    is_method_definition: bool,
) -> bool {
    if upper_is_strict {
        return true;
    }
    if is_method_definition {
        return true;
    }
    match scope_type {
        ScopeType::Class | ScopeType::Module => true,
        ScopeType::Block | ScopeType::Switch => false,
        ScopeType::Function => {
            let body = match arena.kind(block) {
                Some(NodeKind::ArrowFunctionExpression) => {
                    match arena.get_function_at(block) {
                        Some(func)
                            if arena.kind(func.body) == Some(NodeKind::BlockStatement) =>
                        {
                            func.body
                        }
                        _ => return false,
                    }
                }
                // A global-return wrapper function sits directly on the
                // Program node.
                Some(NodeKind::Program) => block,
                _ => match arena.get_function_at(block) {
                    Some(func) => func.body,
                    None => return false,
                },
            };
            directive_body(arena, body).is_some_and(|stmts| has_strict_directive(arena, stmts))
        }
        ScopeType::Global => {
            directive_body(arena, block).is_some_and(|stmts| has_strict_directive(arena, stmts))
        }
        _ => false,
    }
}

/// Whether a definition pins its name to static resolution even on the
/// otherwise dynamic global scope (`let`/`const`/`class`, not `var`).
fn should_be_statically(def: &Definition) -> bool {
    match def.kind {
        DefinitionKind::ClassName { .. } => true,
        DefinitionKind::Variable { kind, .. } => kind != DeclarationKind::Var,
        _ => false,
    }
}

// Registration and closing mutate several scopes and variables at once,
// so they live on the manager and address everything by id.
impl ScopeManager {
    /// Register a definition for `ident` in `scope`. Repeated
    /// definitions of one name accumulate into one variable. No-op for
    /// anything but an identifier node.
    pub(crate) fn define(
        &mut self,
        scope: ScopeId,
        ident: NodeIndex,
        def: Definition,
        arena: &AstArena,
    ) {
        if arena.kind(ident) != Some(NodeKind::Identifier) {
            return;
        }
        let Some(name) = arena.identifier_name(ident) else {
            return;
        };
        let name = name.to_string();
        debug!(name = %name, scope = self.scope(scope).scope_type().as_str(), "define");
        self.define_generic(scope, &name, ident, Some(def));
    }

    pub(crate) fn define_generic(
        &mut self,
        scope: ScopeId,
        name: &str,
        ident: NodeIndex,
        def: Option<Definition>,
    ) -> VariableId {
        let variable = match self.scope(scope).set.get(name) {
            Some(&existing) => existing,
            None => {
                let id = self.alloc_variable(Variable::new(name, scope));
                let entry = self.scope_mut(scope);
                entry.set.insert(name.to_string(), id);
                entry.variables.push(id);
                id
            }
        };
        self.attach_definition(variable, ident, def);
        variable
    }

    /// Like `define`, but targeting the global scope's implicit table.
    pub(crate) fn define_implicit(
        &mut self,
        scope: ScopeId,
        ident: NodeIndex,
        def: Definition,
        arena: &AstArena,
    ) {
        if arena.kind(ident) != Some(NodeKind::Identifier) {
            return;
        }
        let Some(name) = arena.identifier_name(ident) else {
            return;
        };
        let name = name.to_string();
        let existing = match self.scope(scope).implicit() {
            Some(implicit) => implicit.set.get(&name).copied(),
            None => return,
        };
        let variable = match existing {
            Some(id) => id,
            None => {
                let id = self.alloc_variable(Variable::new(&name, scope));
                let ScopeKind::Global(implicit) = &mut self.scope_mut(scope).kind else {
                    unreachable!("implicit definitions only target the global scope");
                };
                implicit.set.insert(name, id);
                implicit.variables.push(id);
                id
            }
        };
        self.attach_definition(variable, ident, Some(def));
    }

    fn attach_definition(&mut self, variable: VariableId, ident: NodeIndex, def: Option<Definition>) {
        if let Some(def) = def {
            let node = def.node();
            let parent = def.parent();
            self.add_declared_variable(node, variable);
            if parent.is_some() {
                self.add_declared_variable(parent, variable);
            }
            self.variable_mut(variable).defs.push(def);
        }
        if ident.is_some() {
            self.variable_mut(variable).identifiers.push(ident);
        }
    }

    /// Record an identifier occurrence in `scope`. Guarded: silently
    /// no-ops for holes and non-identifier nodes, and never registers
    /// `super`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_reference(
        &mut self,
        scope: ScopeId,
        ident: NodeIndex,
        flags: ReferenceFlags,
        write_expr: NodeIndex,
        maybe_implicit_global: Option<ImplicitGlobalCandidate>,
        partial: bool,
        init: bool,
        arena: &AstArena,
    ) {
        if ident.is_none() || arena.kind(ident) != Some(NodeKind::Identifier) {
            return;
        }
        // `super` is structurally significant but never a variable name.
        if arena.identifier_name(ident) == Some("super") {
            return;
        }
        let is_write = flags.contains(ReferenceFlags::WRITE);
        let id = self.alloc_reference(Reference {
            identifier: ident,
            from: scope,
            flags,
            write_expr: if is_write { write_expr } else { NodeIndex::NONE },
            partial: is_write && partial,
            init: is_write && init,
            resolved: None,
            tainted: false,
            maybe_implicit_global,
        });
        let entry = self.scope_mut(scope);
        entry.references.push(id);
        if let Some(left) = entry.left.as_mut() {
            left.push(id);
        }
    }

    /// Close `scope`: resolve or delegate every pending reference, then
    /// seal the scope. Returns the parent to restore as current.
    pub(crate) fn close_scope(&mut self, scope: ScopeId, arena: &AstArena) -> Option<ScopeId> {
        let left = self
            .scope_mut(scope)
            .left
            .take()
            .unwrap_or_else(|| panic!("scope is already closed"));
        debug!(
            scope = self.scope(scope).scope_type().as_str(),
            pending = left.len(),
            "close"
        );
        match self.scope(scope).scope_type() {
            ScopeType::Global => self.close_global_scope(scope, left, arena),
            // A `with` body is unknowable statically: taint everything
            // and let outer scopes try, conservatively.
            ScopeType::With => {
                for reference in left {
                    self.reference_mut(reference).tainted = true;
                    self.delegate_to_upper_scope(scope, reference);
                }
            }
            _ => {
                for reference in left {
                    self.static_close_ref(scope, reference, arena);
                }
            }
        }
        self.scope(scope).upper
    }

    fn close_global_scope(&mut self, scope: ScopeId, left: Vec<ReferenceId>, arena: &AstArena) {
        // Writes to names nothing declared become implicit globals.
        let mut implicit = Vec::new();
        for &reference in &left {
            let record = self.reference(reference);
            if let Some(candidate) = record.maybe_implicit_global.clone()
                && arena
                    .identifier_name(record.identifier)
                    .is_some_and(|name| !self.scope(scope).set.contains_key(name))
            {
                implicit.push(candidate);
            }
        }
        for info in implicit {
            let def = Definition {
                name: info.pattern,
                kind: DefinitionKind::ImplicitGlobalVariable { node: info.node },
            };
            self.define_implicit(scope, info.pattern, def, arena);
        }

        if let ScopeKind::Global(table) = &mut self.scope_mut(scope).kind {
            table.left = left.clone();
        }

        // let/const/class names resolve statically even at global scope;
        // everything else stays dynamic.
        for reference in left {
            if self.should_statically_close_for_global(scope, reference, arena) {
                self.static_close_ref(scope, reference, arena);
            } else {
                self.dynamic_close_ref(scope, reference);
            }
        }
    }

    fn should_statically_close_for_global(
        &self,
        scope: ScopeId,
        reference: ReferenceId,
        arena: &AstArena,
    ) -> bool {
        let Some(name) = arena.identifier_name(self.reference(reference).identifier) else {
            return false;
        };
        let Some(&variable) = self.scope(scope).set.get(name) else {
            return false;
        };
        let defs = &self.variable(variable).defs;
        !defs.is_empty() && defs.iter().all(should_be_statically)
    }

    fn static_close_ref(&mut self, scope: ScopeId, reference: ReferenceId, arena: &AstArena) {
        if !self.resolve_ref(scope, reference, arena) {
            self.delegate_to_upper_scope(scope, reference);
        }
    }

    fn dynamic_close_ref(&mut self, scope: ScopeId, reference: ReferenceId) {
        let mut current = Some(scope);
        while let Some(id) = current {
            self.scope_mut(id).through.push(reference);
            current = self.scope(id).upper;
        }
    }

    fn resolve_ref(&mut self, scope: ScopeId, reference: ReferenceId, arena: &AstArena) -> bool {
        let ident = self.reference(reference).identifier;
        let Some(name) = arena.identifier_name(ident) else {
            return false;
        };
        let Some(&variable) = self.scope(scope).set.get(name) else {
            return false;
        };
        if !self.is_valid_resolution(scope, reference, variable, arena) {
            return false;
        }

        let from = self.reference(reference).from;
        let tainted = self.reference(reference).tainted;
        let same_variable_scope =
            self.scope(from).variable_scope == self.scope(scope).variable_scope;

        let record = self.variable_mut(variable);
        record.references.push(reference);
        record.stack = record.stack && same_variable_scope;
        if tainted {
            record.tainted = true;
            let name = record.name.clone();
            self.scope_mut(scope).taints.insert(name, true);
        }
        self.reference_mut(reference).resolved = Some(variable);
        true
    }

    /// References in a parameter list must not resolve to a variable
    /// whose every definition lies inside the function body: default
    /// parameter expressions see outer bindings, never later
    /// body-declared shadows of the same name.
    fn is_valid_resolution(
        &self,
        scope: ScopeId,
        reference: ReferenceId,
        variable: VariableId,
        arena: &AstArena,
    ) -> bool {
        if self.scope(scope).scope_type() != ScopeType::Function {
            return true;
        }
        let block = self.scope(scope).block;
        // The global-return wrapper wraps the whole Program; everything
        // is "body" there.
        if arena.kind(block) == Some(NodeKind::Program) {
            return true;
        }
        let Some(func) = arena.get_function_at(block) else {
            return true;
        };
        if func.body.is_none() {
            return true;
        }
        let Some(body_start) = arena.span(func.body).map(|span| span.lo) else {
            return true;
        };

        let record = self.variable(variable);
        let ref_pos = arena
            .span(self.reference(reference).identifier)
            .map(|span| span.lo)
            .unwrap_or(u32::MAX);
        !(record.scope == scope
            && ref_pos < body_start
            && record.defs.iter().all(|def| {
                arena.span(def.name).map(|span| span.lo).unwrap_or(0) >= body_start
            }))
    }

    fn delegate_to_upper_scope(&mut self, scope: ScopeId, reference: ReferenceId) {
        let upper = self.scope(scope).upper;
        if let Some(upper) = upper
            && let Some(left) = self.scope_mut(upper).left.as_mut()
        {
            left.push(reference);
        }
        self.scope_mut(scope).through.push(reference);
    }
}
