//! The scope manager: arena owner, scope stack, and post-analysis queries.

use ambit_estree::{AstArena, NodeIndex, NodeKind, SourceType};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::analyze::Options;
use crate::definition::{Definition, DefinitionKind};
use crate::reference::{Reference, ReferenceId};
use crate::scope::{
    ImplicitGlobals, Scope, ScopeId, ScopeKind, ScopeType, is_strict_scope,
};
use crate::variable::{Variable, VariableId};

/// Owner of every scope, variable, and reference one analysis produced,
/// plus the node-keyed indices consumers query afterwards.
///
/// During the walk the manager also tracks the single open "current"
/// scope; scopes are pushed and popped in strict LIFO order, so one
/// pointer suffices.
#[derive(Debug)]
pub struct ScopeManager {
    pub(crate) scopes: Vec<Scope>,
    pub(crate) variables: Vec<Variable>,
    pub(crate) references: Vec<Reference>,
    global_scope: Option<ScopeId>,
    pub(crate) current_scope: Option<ScopeId>,
    node_to_scope: FxHashMap<NodeIndex, SmallVec<[ScopeId; 1]>>,
    declared_variables: FxHashMap<NodeIndex, Vec<VariableId>>,

    source_type: SourceType,
    ecma_version: u32,
    implied_strict: bool,
    global_return: bool,
}

impl ScopeManager {
    pub fn new(options: &Options) -> ScopeManager {
        ScopeManager {
            scopes: Vec::new(),
            variables: Vec::new(),
            references: Vec::new(),
            global_scope: None,
            current_scope: None,
            node_to_scope: FxHashMap::default(),
            declared_variables: FxHashMap::default(),
            source_type: options.source_type,
            ecma_version: normalize_ecma_version(options.ecma_version),
            implied_strict: options.implied_strict,
            global_return: options.global_return,
        }
    }

    // Accessors. Ids are only minted by this manager, so out-of-range
    // lookups are programmer errors and panic via slice indexing.

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    #[inline]
    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    #[inline]
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    #[inline]
    pub(crate) fn variable_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.variables[id.index()]
    }

    #[inline]
    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id.index()]
    }

    #[inline]
    pub(crate) fn reference_mut(&mut self, id: ReferenceId) -> &mut Reference {
        &mut self.references[id.index()]
    }

    /// All scopes in creation (depth-first) order. `scopes()[i]` is
    /// `ScopeId(i)`.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = ScopeId> + '_ {
        (0..self.scopes.len() as u32).map(ScopeId)
    }

    /// Every variable of the analysis (declared and implicit), in
    /// creation order. `variables()[i]` is `VariableId(i)`.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Every reference of the analysis, in creation order.
    /// `references()[i]` is `ReferenceId(i)`.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn global_scope(&self) -> Option<ScopeId> {
        self.global_scope
    }

    pub(crate) fn alloc_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    pub(crate) fn alloc_reference(&mut self, reference: Reference) -> ReferenceId {
        let id = ReferenceId(self.references.len() as u32);
        self.references.push(reference);
        id
    }

    pub(crate) fn add_declared_variable(&mut self, node: NodeIndex, variable: VariableId) {
        let entry = self.declared_variables.entry(node).or_default();
        if !entry.contains(&variable) {
            entry.push(variable);
        }
    }

    // Option predicates.

    pub fn is_module(&self) -> bool {
        self.source_type == SourceType::Module
    }

    pub fn is_es6(&self) -> bool {
        self.ecma_version >= 6
    }

    pub fn is_strict_mode_supported(&self) -> bool {
        self.ecma_version >= 5
    }

    pub fn is_implied_strict(&self) -> bool {
        self.implied_strict && self.is_strict_mode_supported()
    }

    pub fn is_global_return(&self) -> bool {
        self.global_return
    }

    // Scope nesting. One method per scope kind; each installs the new
    // scope as current. All but the global nesting require an open
    // current scope.

    pub(crate) fn nest_global_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::Global(ImplicitGlobals::default()), block, false, arena)
    }

    pub(crate) fn nest_module_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::Module, block, false, arena)
    }

    pub(crate) fn nest_function_scope(
        &mut self,
        block: NodeIndex,
        is_method_definition: bool,
        arena: &AstArena,
    ) -> ScopeId {
        let id = self.nest_scope(ScopeKind::Function, block, is_method_definition, arena);
        // Arrows never materialize an `arguments` object.
        if arena.kind(block) != Some(NodeKind::ArrowFunctionExpression) {
            self.define_generic(id, "arguments", NodeIndex::NONE, None);
            self.scope_mut(id).taints.insert("arguments".to_string(), true);
        }
        id
    }

    /// The intermediate scope a named function expression gets, binding
    /// only its own name so recursive self-reference works without the
    /// name leaking outward.
    pub(crate) fn nest_function_expression_name_scope(
        &mut self,
        block: NodeIndex,
        arena: &AstArena,
    ) -> ScopeId {
        let id = self.nest_scope(ScopeKind::FunctionExpressionName, block, false, arena);
        if let Some(func) = arena.get_function_at(block)
            && func.id.is_some()
        {
            let def = Definition {
                name: func.id,
                kind: DefinitionKind::FunctionName { function: block },
            };
            self.define(id, func.id, def, arena);
        }
        id
    }

    pub(crate) fn nest_block_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::Block, block, false, arena)
    }

    pub(crate) fn nest_switch_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::Switch, block, false, arena)
    }

    pub(crate) fn nest_for_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::For, block, false, arena)
    }

    pub(crate) fn nest_catch_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::Catch, block, false, arena)
    }

    pub(crate) fn nest_class_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::Class, block, false, arena)
    }

    pub(crate) fn nest_with_scope(&mut self, block: NodeIndex, arena: &AstArena) -> ScopeId {
        self.nest_scope(ScopeKind::With, block, false, arena)
    }

    fn nest_scope(
        &mut self,
        kind: ScopeKind,
        block: NodeIndex,
        is_method_definition: bool,
        arena: &AstArena,
    ) -> ScopeId {
        let scope_type = kind.scope_type();
        if scope_type == ScopeType::Global {
            assert!(self.current_scope.is_none(), "global scope must be the outermost scope");
        } else {
            assert!(self.current_scope.is_some(), "nested scope requires an open current scope");
        }

        let id = ScopeId(self.scopes.len() as u32);
        let upper = self.current_scope;
        let upper_is_strict = upper.is_some_and(|up| self.scope(up).is_strict);
        let is_strict =
            is_strict_scope(arena, upper_is_strict, scope_type, block, is_method_definition);
        let variable_scope = if scope_type.is_variable_scope() {
            id
        } else {
            self.scope(upper.expect("non-variable scope below global")).variable_scope
        };

        debug!(
            scope = scope_type.as_str(),
            block = block.0,
            strict = is_strict,
            "nest scope"
        );
        self.scopes.push(Scope {
            kind,
            block,
            upper,
            child_scopes: Vec::new(),
            variables: Vec::new(),
            set: FxHashMap::default(),
            references: Vec::new(),
            through: Vec::new(),
            left: Some(Vec::new()),
            is_strict,
            dynamic: matches!(scope_type, ScopeType::Global | ScopeType::With),
            variable_scope,
            taints: FxHashMap::default(),
        });

        if let Some(upper) = upper {
            self.scope_mut(upper).child_scopes.push(id);
        }
        self.node_to_scope.entry(block).or_default().push(id);
        if scope_type == ScopeType::Global {
            self.global_scope = Some(id);
        }
        self.current_scope = Some(id);
        id
    }

    // Post-analysis queries.

    /// The scope `node` opened, if any. When several scopes share the
    /// node (a named function expression, a global-return wrapper), the
    /// outermost wins unless `inner` is set, and function-expression-name
    /// scopes are skipped: callers almost always want the real function
    /// scope.
    pub fn acquire(&self, node: NodeIndex, inner: bool) -> Option<ScopeId> {
        let scopes = self.node_to_scope.get(&node)?;
        if scopes.is_empty() {
            return None;
        }
        if scopes.len() == 1 {
            return Some(scopes[0]);
        }
        let wanted = |id: &&ScopeId| {
            self.scope(**id).scope_type() != ScopeType::FunctionExpressionName
        };
        if inner {
            scopes.iter().rev().find(wanted).copied()
        } else {
            scopes.iter().find(wanted).copied()
        }
    }

    /// Every scope `node` opened, in creation order.
    pub fn acquire_all(&self, node: NodeIndex) -> Option<&[ScopeId]> {
        self.node_to_scope.get(&node).map(|scopes| scopes.as_slice())
    }

    /// Variables declared by exactly this node: the node is some
    /// definition's own node or its enclosing statement (so a
    /// `VariableDeclaration` reports the variables of all its
    /// declarators).
    pub fn get_declared_variables(&self, node: NodeIndex) -> &[VariableId] {
        self.declared_variables.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether `name` is declared in `scope` or escapes through it
    /// unresolved.
    pub fn is_used_name(&self, scope: ScopeId, name: &str, arena: &AstArena) -> bool {
        if self.scope(scope).set.contains_key(name) {
            return true;
        }
        self.scope(scope).through.iter().any(|&reference| {
            arena.identifier_name(self.reference(reference).identifier) == Some(name)
        })
    }

    /// Find the reference record of one identifier occurrence in a
    /// closed scope.
    pub fn resolve_reference(&self, scope: ScopeId, ident: NodeIndex) -> Option<ReferenceId> {
        assert!(self.scope(scope).is_closed(), "scope should be closed");
        self.scope(scope)
            .references
            .iter()
            .copied()
            .find(|&reference| self.reference(reference).identifier == ident)
    }
}

/// Year-style ECMA versions (2015+) normalize to edition numbers, so `6`
/// and `2015` mean the same thing.
fn normalize_ecma_version(version: u32) -> u32 {
    if version >= 2015 { version - 2009 } else { version }
}
