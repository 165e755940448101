//! The tree-walking referencer.
//!
//! One depth-first pass over the AST: scopes open at their defining
//! nodes, every binding-introducing construct registers definitions,
//! every identifier use becomes a reference, and each scope closes (and
//! resolves) as soon as the walker leaves its subtree. Parents close
//! after all of their children, since closing delegates unresolved
//! references onto the parent's still-open pending list.

use ambit_estree::{
    AstArena, DeclarationKind, Fallback, NodeIndex, NodeKind, VisitorKeyMap, visitor_keys,
};
use tracing::debug;

use crate::analyze::Options;
use crate::definition::{Definition, DefinitionKind};
use crate::error::AnalyzeError;
use crate::manager::ScopeManager;
use crate::pattern::{PatternInfo, PatternVisitor, is_pattern};
use crate::reference::{ImplicitGlobalCandidate, ReferenceFlags};
use crate::scope::ScopeId;

type Result<T = ()> = std::result::Result<T, AnalyzeError>;

/// Child-traversal configuration: the caller's key overrides plus the
/// policy for unknown node shapes. Copied freely; it only holds borrows
/// of the analysis options.
#[derive(Copy, Clone)]
pub(crate) struct Walker<'opt> {
    child_visitor_keys: Option<&'opt VisitorKeyMap>,
    fallback: Option<&'opt Fallback>,
}

impl<'opt> Walker<'opt> {
    pub fn new(options: &'opt Options) -> Walker<'opt> {
        Walker {
            child_visitor_keys: options.child_visitor_keys.as_ref(),
            fallback: Some(&options.fallback),
        }
    }

    /// A walker with default keys and the iterate-everything fallback.
    #[cfg(test)]
    pub fn root() -> Walker<'static> {
        Walker { child_visitor_keys: None, fallback: None }
    }

    fn collect_keys(
        arena: &AstArena,
        index: NodeIndex,
        keys: impl IntoIterator<Item = impl AsRef<str>>,
        out: &mut Vec<NodeIndex>,
    ) {
        for key in keys {
            if let Some(slot) = arena.field(index, key.as_ref()) {
                slot.collect_into(out);
            }
        }
    }

    /// Resolve the children to visit for `index`, honoring key overrides
    /// first, then the default table, then the fallback policy.
    pub fn children(
        &self,
        arena: &AstArena,
        index: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) -> Result {
        let Some(node) = arena.get(index) else {
            return Ok(());
        };
        let type_name = arena.type_name(index).unwrap_or("Unknown");
        if let Some(map) = self.child_visitor_keys
            && let Some(keys) = map.get(type_name)
        {
            Self::collect_keys(arena, index, keys, out);
            return Ok(());
        }
        if node.kind != NodeKind::Unknown {
            Self::collect_keys(arena, index, visitor_keys(node.kind), out);
            return Ok(());
        }
        match self.fallback {
            None | Some(Fallback::Iteration) => {
                Self::collect_keys(arena, index, arena.fallback_keys(index), out);
                Ok(())
            }
            Some(Fallback::Custom(selector)) => {
                Self::collect_keys(arena, index, selector(arena, index), out);
                Ok(())
            }
            Some(Fallback::None) => {
                Err(AnalyzeError::UnknownNodeType { type_name: type_name.to_string() })
            }
        }
    }
}

/// Walks the AST once, driving the scope manager.
pub(crate) struct Referencer<'ast, 'opt> {
    arena: &'ast AstArena,
    manager: ScopeManager,
    walker: Walker<'opt>,
    is_inner_method_definition: bool,
}

impl<'ast, 'opt> Referencer<'ast, 'opt> {
    pub fn new(
        arena: &'ast AstArena,
        manager: ScopeManager,
        options: &'opt Options,
    ) -> Referencer<'ast, 'opt> {
        Referencer {
            arena,
            manager,
            walker: Walker::new(options),
            is_inner_method_definition: false,
        }
    }

    pub fn into_manager(self) -> ScopeManager {
        self.manager
    }

    fn current(&self) -> ScopeId {
        self.manager.current_scope.expect("no open scope")
    }

    /// Close every scope keyed to `node` (a Program can carry global,
    /// wrapper-function, and module scopes at once), innermost first.
    fn close(&mut self, node: NodeIndex) {
        while let Some(current) = self.manager.current_scope {
            if self.manager.scope(current).block != node {
                break;
            }
            self.manager.current_scope = self.manager.close_scope(current, self.arena);
        }
    }

    pub fn visit(&mut self, index: NodeIndex) -> Result {
        if index.is_none() {
            return Ok(());
        }
        let Some(kind) = self.arena.kind(index) else {
            return Ok(());
        };
        match kind {
            NodeKind::Program => self.visit_program(index),
            NodeKind::Identifier => {
                let scope = self.current();
                self.manager.add_reference(
                    scope,
                    index,
                    ReferenceFlags::READ,
                    NodeIndex::NONE,
                    None,
                    false,
                    false,
                    self.arena,
                );
                Ok(())
            }
            NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::ArrowFunctionExpression => self.visit_function(index),
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => self.visit_class(index),
            NodeKind::Property | NodeKind::MethodDefinition => self.visit_property(index),
            NodeKind::BlockStatement => self.visit_block(index),
            NodeKind::SwitchStatement => self.visit_switch(index),
            NodeKind::ForStatement => self.visit_for(index),
            NodeKind::ForInStatement | NodeKind::ForOfStatement => self.visit_for_in_of(index),
            NodeKind::VariableDeclaration => self.visit_variable_declaration(index),
            NodeKind::AssignmentExpression => self.visit_assignment(index),
            NodeKind::UpdateExpression => self.visit_update(index),
            NodeKind::MemberExpression => self.visit_member(index),
            NodeKind::CatchClause => self.visit_catch_clause(index),
            NodeKind::WithStatement => self.visit_with(index),
            NodeKind::LabeledStatement => {
                // The label itself is not a variable reference.
                let body = self
                    .arena
                    .get(index)
                    .and_then(|n| self.arena.get_labeled(n))
                    .map(|data| data.body)
                    .unwrap_or(NodeIndex::NONE);
                self.visit(body)
            }
            // Jump labels are names, not variables.
            NodeKind::BreakStatement | NodeKind::ContinueStatement => Ok(()),
            NodeKind::ImportDeclaration => self.visit_import_declaration(index),
            NodeKind::ExportNamedDeclaration => self.visit_export_declaration(index),
            NodeKind::ExportSpecifier => {
                let local = self
                    .arena
                    .get(index)
                    .and_then(|n| self.arena.get_export_specifier(n))
                    .map(|data| data.local)
                    .unwrap_or(NodeIndex::NONE);
                self.visit(local)
            }
            // `new.target` and friends bind no names.
            NodeKind::MetaProperty => Ok(()),
            _ => self.visit_children(index),
        }
    }

    pub fn visit_children(&mut self, index: NodeIndex) -> Result {
        let mut children = Vec::new();
        self.walker.children(self.arena, index, &mut children)?;
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Run the pattern walk over `node`, then (optionally) traverse the
    /// collected right-hand nodes as ordinary expressions.
    fn visit_pattern<F>(
        &mut self,
        node: NodeIndex,
        process_right_hand_nodes: bool,
        mut callback: F,
    ) -> Result
    where
        F: FnMut(&mut Self, NodeIndex, PatternInfo<'_>),
    {
        let mut visitor = PatternVisitor::new(self.arena, self.walker, node);
        visitor.visit(node, &mut |ident, info| callback(self, ident, info))?;
        if process_right_hand_nodes {
            for right in std::mem::take(&mut visitor.right_hand_nodes) {
                self.visit(right)?;
            }
        }
        Ok(())
    }

    /// Each default-value assignment on the path to a pattern leaf is a
    /// synthetic write of the default expression into the leaf.
    fn referencing_default_value(
        &mut self,
        pattern: NodeIndex,
        assignments: &[NodeIndex],
        maybe_implicit_global: Option<&ImplicitGlobalCandidate>,
        init: bool,
    ) {
        for &assignment in assignments {
            let Some(expr) =
                self.arena.get(assignment).and_then(|n| self.arena.get_binary_expr(n))
            else {
                continue;
            };
            let scope = self.current();
            self.manager.add_reference(
                scope,
                pattern,
                ReferenceFlags::WRITE,
                expr.right,
                maybe_implicit_global.cloned(),
                pattern != expr.left,
                init,
                self.arena,
            );
        }
    }

    fn implicit_global_candidate(
        &self,
        pattern: NodeIndex,
        node: NodeIndex,
    ) -> Option<ImplicitGlobalCandidate> {
        if self.manager.scope(self.current()).is_strict {
            None
        } else {
            Some(ImplicitGlobalCandidate { pattern, node })
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn visit_program(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        self.manager.nest_global_scope(index, arena);

        if self.manager.is_global_return() {
            // A CommonJS-style wrapper: the program body behaves like a
            // function body, and global strictness is moot.
            let global = self.current();
            self.manager.scope_mut(global).is_strict = false;
            self.manager.nest_function_scope(index, false, arena);
        }

        if self.manager.is_es6() && self.manager.is_module() {
            self.manager.nest_module_scope(index, arena);
        }

        if self.manager.is_implied_strict() {
            let current = self.current();
            self.manager.scope_mut(current).is_strict = true;
        }

        self.visit_children(index)?;
        self.close(index);
        Ok(())
    }

    fn visit_function(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let kind = arena.kind(index).expect("function node");
        let Some(func) = arena.get_function_at(index) else {
            return Ok(());
        };
        debug!(kind = ?kind, "visit function");

        // A declaration's name hoists into the enclosing scope. A named
        // expression instead gets its own name scope, visible only
        // inside.
        if kind == NodeKind::FunctionDeclaration && func.id.is_some() {
            let scope = self.current();
            let def = Definition {
                name: func.id,
                kind: DefinitionKind::FunctionName { function: index },
            };
            self.manager.define(scope, func.id, def, arena);
        }
        if kind == NodeKind::FunctionExpression && func.id.is_some() {
            self.manager.nest_function_expression_name_scope(index, arena);
        }

        self.manager.nest_function_scope(index, self.is_inner_method_definition, arena);

        for (position, &param) in func.params.nodes.iter().enumerate() {
            self.visit_pattern(param, true, |this, pattern, info| {
                let scope = this.current();
                let def = Definition {
                    name: pattern,
                    kind: DefinitionKind::Parameter {
                        function: index,
                        index: position,
                        rest: info.rest,
                    },
                };
                this.manager.define(scope, pattern, def, arena);
                this.referencing_default_value(pattern, info.assignments, None, true);
            })?;
        }

        if func.body.is_some() {
            if arena.kind(func.body) == Some(NodeKind::BlockStatement) {
                // The function scope already covers the body; a bare
                // block scope here would be redundant.
                self.visit_children(func.body)?;
            } else {
                self.visit(func.body)?;
            }
        }

        self.close(index);
        Ok(())
    }

    fn visit_class(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let kind = arena.kind(index).expect("class node");
        let Some(class) = arena.get(index).and_then(|n| arena.get_class(n)) else {
            return Ok(());
        };

        if kind == NodeKind::ClassDeclaration && class.id.is_some() {
            let scope = self.current();
            let def =
                Definition { name: class.id, kind: DefinitionKind::ClassName { class: index } };
            self.manager.define(scope, class.id, def, arena);
        }

        // The superclass expression evaluates in the enclosing scope.
        self.visit(class.super_class)?;

        self.manager.nest_class_scope(index, arena);

        // The class name is also visible to its own members.
        if class.id.is_some() {
            let scope = self.current();
            let def =
                Definition { name: class.id, kind: DefinitionKind::ClassName { class: index } };
            self.manager.define(scope, class.id, def, arena);
        }
        self.visit(class.body)?;

        self.close(index);
        Ok(())
    }

    fn visit_property(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let kind = arena.kind(index);
        let Some(property) = arena.get(index).and_then(|n| arena.get_property(n)) else {
            return Ok(());
        };
        if property.computed {
            self.visit(property.key)?;
        }
        let is_method_definition = kind == Some(NodeKind::MethodDefinition);
        let previous = self.is_inner_method_definition;
        if is_method_definition {
            self.is_inner_method_definition = true;
        }
        self.visit(property.value)?;
        if is_method_definition {
            self.is_inner_method_definition = previous;
        }
        Ok(())
    }

    fn visit_block(&mut self, index: NodeIndex) -> Result {
        if self.manager.is_es6() {
            self.manager.nest_block_scope(index, self.arena);
        }
        self.visit_children(index)?;
        self.close(index);
        Ok(())
    }

    fn visit_switch(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(switch) = arena.get(index).and_then(|n| arena.get_switch(n)) else {
            return Ok(());
        };
        self.visit(switch.discriminant)?;
        if self.manager.is_es6() {
            self.manager.nest_switch_scope(index, arena);
        }
        for &case in &switch.cases.nodes {
            self.visit(case)?;
        }
        self.close(index);
        Ok(())
    }

    fn visit_for(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(stmt) = arena.get(index).and_then(|n| arena.get_for_statement(n)) else {
            return Ok(());
        };
        // One static scope for the whole loop. Per-iteration environments
        // are a runtime notion this analysis deliberately collapses.
        if stmt.init.is_some()
            && let Some(init) = arena.get_variable_declaration_at(stmt.init)
            && init.kind != DeclarationKind::Var
        {
            self.manager.nest_for_scope(index, arena);
        }
        self.visit_children(index)?;
        self.close(index);
        Ok(())
    }

    fn visit_for_in_of(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(stmt) = arena.get(index).and_then(|n| arena.get_for_in_of(n)) else {
            return Ok(());
        };

        if let Some(decl) = arena.get_variable_declaration_at(stmt.left) {
            if decl.kind != DeclarationKind::Var {
                self.manager.nest_for_scope(index, arena);
            }
            self.visit(stmt.left)?;
            let pattern_root = decl
                .declarations
                .nodes
                .first()
                .and_then(|&declarator| arena.get_variable_declarator_at(declarator))
                .map(|d| d.id)
                .unwrap_or(NodeIndex::NONE);
            self.visit_pattern(pattern_root, false, |this, pattern, _info| {
                let scope = this.current();
                this.manager.add_reference(
                    scope,
                    pattern,
                    ReferenceFlags::WRITE,
                    stmt.right,
                    None,
                    true,
                    true,
                    arena,
                );
            })?;
        } else {
            self.visit_pattern(stmt.left, true, |this, pattern, info| {
                let candidate = this.implicit_global_candidate(pattern, index);
                this.referencing_default_value(pattern, info.assignments, candidate.as_ref(), false);
                let scope = this.current();
                this.manager.add_reference(
                    scope,
                    pattern,
                    ReferenceFlags::WRITE,
                    stmt.right,
                    candidate,
                    pattern != stmt.left,
                    false,
                    arena,
                );
            })?;
        }
        self.visit(stmt.right)?;
        self.visit(stmt.body)?;
        self.close(index);
        Ok(())
    }

    fn visit_variable_declaration(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(decl) = arena.get_variable_declaration_at(index) else {
            return Ok(());
        };
        // `var` hoists to the nearest variable scope; `let`/`const` bind
        // in the current lexical scope.
        let target = if decl.kind == DeclarationKind::Var {
            self.manager.scope(self.current()).variable_scope
        } else {
            self.current()
        };

        for (position, &declarator) in decl.declarations.nodes.iter().enumerate() {
            let Some(d) = arena.get_variable_declarator_at(declarator) else {
                continue;
            };
            self.visit_pattern(d.id, true, |this, pattern, info| {
                let def = Definition {
                    name: pattern,
                    kind: DefinitionKind::Variable {
                        declarator,
                        declaration: index,
                        index: position,
                        kind: decl.kind,
                    },
                };
                this.manager.define(target, pattern, def, arena);
                this.referencing_default_value(pattern, info.assignments, None, true);
                if d.init.is_some() {
                    let scope = this.current();
                    this.manager.add_reference(
                        scope,
                        pattern,
                        ReferenceFlags::WRITE,
                        d.init,
                        None,
                        !info.top_level,
                        true,
                        arena,
                    );
                }
            })?;
            if d.init.is_some() {
                self.visit(d.init)?;
            }
        }
        Ok(())
    }

    fn visit_assignment(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(expr) = arena.get(index).and_then(|n| arena.get_binary_expr(n)) else {
            return Ok(());
        };
        if is_pattern(arena, expr.left) {
            if expr.operator == "=" {
                self.visit_pattern(expr.left, true, |this, pattern, info| {
                    let candidate = this.implicit_global_candidate(pattern, index);
                    this.referencing_default_value(
                        pattern,
                        info.assignments,
                        candidate.as_ref(),
                        false,
                    );
                    let scope = this.current();
                    this.manager.add_reference(
                        scope,
                        pattern,
                        ReferenceFlags::WRITE,
                        expr.right,
                        candidate,
                        pattern != expr.left,
                        false,
                        arena,
                    );
                })?;
            } else {
                // Compound operators read before they write.
                let scope = self.current();
                self.manager.add_reference(
                    scope,
                    expr.left,
                    ReferenceFlags::RW,
                    expr.right,
                    None,
                    false,
                    false,
                    arena,
                );
            }
        } else {
            self.visit(expr.left)?;
        }
        self.visit(expr.right)?;
        Ok(())
    }

    fn visit_update(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(expr) = arena.get(index).and_then(|n| arena.get_unary_expr(n)) else {
            return Ok(());
        };
        if is_pattern(arena, expr.argument) {
            let scope = self.current();
            self.manager.add_reference(
                scope,
                expr.argument,
                ReferenceFlags::RW,
                NodeIndex::NONE,
                None,
                false,
                false,
                arena,
            );
            Ok(())
        } else {
            self.visit_children(index)
        }
    }

    fn visit_member(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(member) = arena.get(index).and_then(|n| arena.get_member_expr(n)) else {
            return Ok(());
        };
        self.visit(member.object)?;
        // Dotted property names are never variable references.
        if member.computed {
            self.visit(member.property)?;
        }
        Ok(())
    }

    fn visit_catch_clause(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        self.manager.nest_catch_scope(index, arena);
        let Some(clause) = arena.get(index).and_then(|n| arena.get_catch_clause(n)) else {
            return Ok(());
        };
        if clause.param.is_some() {
            let param = clause.param;
            self.visit_pattern(param, true, |this, pattern, info| {
                let scope = this.current();
                let def =
                    Definition { name: param, kind: DefinitionKind::CatchClause { clause: index } };
                this.manager.define(scope, pattern, def, arena);
                this.referencing_default_value(pattern, info.assignments, None, true);
            })?;
        }
        self.visit(clause.body)?;
        self.close(index);
        Ok(())
    }

    fn visit_with(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(stmt) = arena.get(index).and_then(|n| arena.get_with(n)) else {
            return Ok(());
        };
        // The object expression still evaluates in the enclosing scope.
        self.visit(stmt.object)?;
        self.manager.nest_with_scope(index, arena);
        self.visit(stmt.body)?;
        self.close(index);
        Ok(())
    }

    fn visit_import_declaration(&mut self, index: NodeIndex) -> Result {
        if !(self.manager.is_es6() && self.manager.is_module()) {
            return Err(AnalyzeError::ImportOutsideModule);
        }
        let arena = self.arena;
        let Some(import) = arena.get(index).and_then(|n| arena.get_import_declaration(n)) else {
            return Ok(());
        };
        // The remote module's bindings are opaque: only the local names
        // are defined, and the source is not traversed.
        for &specifier in &import.specifiers.nodes {
            let Some(data) = arena.get(specifier).and_then(|n| arena.get_import_specifier(n))
            else {
                continue;
            };
            self.visit_pattern(data.local, false, |this, pattern, _info| {
                let scope = this.current();
                let def = Definition {
                    name: pattern,
                    kind: DefinitionKind::ImportBinding { specifier, declaration: index },
                };
                this.manager.define(scope, pattern, def, arena);
            })?;
        }
        Ok(())
    }

    fn visit_export_declaration(&mut self, index: NodeIndex) -> Result {
        let arena = self.arena;
        let Some(export) = arena.get(index).and_then(|n| arena.get_export_declaration(n)) else {
            return Ok(());
        };
        // Re-exports from another module touch no local names.
        if export.source.is_some() {
            return Ok(());
        }
        if export.declaration.is_some() {
            return self.visit(export.declaration);
        }
        self.visit_children(index)
    }
}
