//! Pooled node storage and the typed accessor surface.
//!
//! The arena follows the thin-node/side-pool layout: `nodes` holds kind,
//! span, and a pool index; the per-family pools hold the payloads. All
//! `get_*` accessors are kind-guarded and return `None` for a mismatched
//! node rather than panicking.

use crate::node::*;
use crate::span::Span;

#[derive(Debug, Default)]
pub struct AstArena {
    nodes: Vec<Node>,

    identifiers: Vec<IdentifierData>,
    literals: Vec<LiteralData>,
    programs: Vec<ProgramData>,
    functions: Vec<FunctionData>,
    classes: Vec<ClassData>,
    properties: Vec<PropertyData>,
    variable_declarations: Vec<VariableDeclarationData>,
    variable_declarators: Vec<VariableDeclaratorData>,
    binary_exprs: Vec<BinaryExprData>,
    unary_exprs: Vec<UnaryExprData>,
    expr_statements: Vec<ExpressionStatementData>,
    argumented: Vec<ArgumentData>,
    yields: Vec<YieldData>,
    members: Vec<MemberExprData>,
    calls: Vec<CallExprData>,
    conditionals: Vec<ConditionalData>,
    lists: Vec<ListData>,
    templates: Vec<TemplateData>,
    tagged_templates: Vec<TaggedTemplateData>,
    for_statements: Vec<ForStatementData>,
    while_statements: Vec<WhileData>,
    for_in_of: Vec<ForInOfData>,
    switches: Vec<SwitchData>,
    switch_cases: Vec<SwitchCaseData>,
    try_statements: Vec<TryData>,
    catch_clauses: Vec<CatchClauseData>,
    with_statements: Vec<WithData>,
    labeled: Vec<LabeledData>,
    jumps: Vec<JumpData>,
    meta_properties: Vec<MetaPropertyData>,
    import_declarations: Vec<ImportDeclarationData>,
    import_specifiers: Vec<ImportSpecifierData>,
    export_specifiers: Vec<ExportSpecifierData>,
    export_declarations: Vec<ExportData>,
    unknowns: Vec<UnknownData>,
}

macro_rules! add_method {
    ($add:ident, $get:ident, $pool:ident, $data:ty, $($kind:pat_param)|+) => {
        pub fn $add(&mut self, kind: NodeKind, span: Span, data: $data) -> NodeIndex {
            debug_assert!(matches!(kind, $($kind)|+), "wrong kind for pool");
            let data_index = self.$pool.len() as u32;
            self.$pool.push(data);
            self.push_node(Node::with_data(kind, span, data_index))
        }

        #[inline]
        pub fn $get(&self, node: &Node) -> Option<&$data> {
            if matches!(node.kind, $($kind)|+) && node.data != Node::NO_DATA {
                self.$pool.get(node.data as usize)
            } else {
                None
            }
        }
    };
}

impl AstArena {
    pub fn new() -> AstArena {
        AstArena::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_node(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    /// Get a thin node by handle.
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Get a mutable thin node by handle.
    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<NodeKind> {
        self.get(index).map(|n| n.kind)
    }

    #[inline]
    pub fn span(&self, index: NodeIndex) -> Option<Span> {
        self.get(index).map(|n| n.span)
    }

    /// The ESTree `type` tag of a node, including the original tag of
    /// unknown shapes.
    pub fn type_name(&self, index: NodeIndex) -> Option<&str> {
        let node = self.get(index)?;
        if node.kind == NodeKind::Unknown {
            self.get_unknown(node).map(|u| u.type_name.as_str())
        } else {
            Some(node.kind.name())
        }
    }

    /// Resolve an identifier node's text. `None` for anything that is not
    /// an `Identifier`.
    pub fn identifier_name(&self, index: NodeIndex) -> Option<&str> {
        let node = self.get(index)?;
        self.get_identifier(node).map(|data| data.name.as_str())
    }

    // Token-like kinds with no payload: `ThisExpression`, `Super`,
    // `EmptyStatement`, `DebuggerStatement`, `TemplateElement`.
    pub fn add_token(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        self.push_node(Node::new(kind, span))
    }

    add_method!(add_identifier, get_identifier, identifiers, IdentifierData,
        NodeKind::Identifier);
    add_method!(add_literal, get_literal, literals, LiteralData,
        NodeKind::Literal);
    add_method!(add_program, get_program, programs, ProgramData,
        NodeKind::Program);
    add_method!(add_function, get_function, functions, FunctionData,
        NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::ArrowFunctionExpression);
    add_method!(add_class, get_class, classes, ClassData,
        NodeKind::ClassDeclaration | NodeKind::ClassExpression);
    add_method!(add_property, get_property, properties, PropertyData,
        NodeKind::Property | NodeKind::MethodDefinition);
    add_method!(add_variable_declaration, get_variable_declaration,
        variable_declarations, VariableDeclarationData,
        NodeKind::VariableDeclaration);
    add_method!(add_variable_declarator, get_variable_declarator,
        variable_declarators, VariableDeclaratorData,
        NodeKind::VariableDeclarator);
    add_method!(add_binary_expr, get_binary_expr, binary_exprs, BinaryExprData,
        NodeKind::BinaryExpression
            | NodeKind::LogicalExpression
            | NodeKind::AssignmentExpression
            | NodeKind::AssignmentPattern);
    add_method!(add_unary_expr, get_unary_expr, unary_exprs, UnaryExprData,
        NodeKind::UnaryExpression | NodeKind::UpdateExpression);
    add_method!(add_expression_statement, get_expression_statement,
        expr_statements, ExpressionStatementData,
        NodeKind::ExpressionStatement);
    add_method!(add_argument, get_argument, argumented, ArgumentData,
        NodeKind::ReturnStatement
            | NodeKind::ThrowStatement
            | NodeKind::AwaitExpression
            | NodeKind::SpreadElement
            | NodeKind::RestElement);
    add_method!(add_yield, get_yield, yields, YieldData,
        NodeKind::YieldExpression);
    add_method!(add_member_expr, get_member_expr, members, MemberExprData,
        NodeKind::MemberExpression);
    add_method!(add_call_expr, get_call_expr, calls, CallExprData,
        NodeKind::CallExpression | NodeKind::NewExpression);
    add_method!(add_conditional, get_conditional, conditionals, ConditionalData,
        NodeKind::ConditionalExpression | NodeKind::IfStatement);
    add_method!(add_list, get_list, lists, ListData,
        NodeKind::ArrayExpression
            | NodeKind::ObjectExpression
            | NodeKind::ArrayPattern
            | NodeKind::ObjectPattern
            | NodeKind::SequenceExpression
            | NodeKind::BlockStatement
            | NodeKind::ClassBody);
    add_method!(add_template, get_template, templates, TemplateData,
        NodeKind::TemplateLiteral);
    add_method!(add_tagged_template, get_tagged_template, tagged_templates,
        TaggedTemplateData, NodeKind::TaggedTemplateExpression);
    add_method!(add_for_statement, get_for_statement, for_statements,
        ForStatementData, NodeKind::ForStatement);
    add_method!(add_while, get_while, while_statements, WhileData,
        NodeKind::WhileStatement | NodeKind::DoWhileStatement);
    add_method!(add_for_in_of, get_for_in_of, for_in_of, ForInOfData,
        NodeKind::ForInStatement | NodeKind::ForOfStatement);
    add_method!(add_switch, get_switch, switches, SwitchData,
        NodeKind::SwitchStatement);
    add_method!(add_switch_case, get_switch_case, switch_cases, SwitchCaseData,
        NodeKind::SwitchCase);
    add_method!(add_try, get_try, try_statements, TryData,
        NodeKind::TryStatement);
    add_method!(add_catch_clause, get_catch_clause, catch_clauses,
        CatchClauseData, NodeKind::CatchClause);
    add_method!(add_with, get_with, with_statements, WithData,
        NodeKind::WithStatement);
    add_method!(add_labeled, get_labeled, labeled, LabeledData,
        NodeKind::LabeledStatement);
    add_method!(add_jump, get_jump, jumps, JumpData,
        NodeKind::BreakStatement | NodeKind::ContinueStatement);
    add_method!(add_meta_property, get_meta_property, meta_properties,
        MetaPropertyData, NodeKind::MetaProperty);
    add_method!(add_import_declaration, get_import_declaration,
        import_declarations, ImportDeclarationData,
        NodeKind::ImportDeclaration);
    add_method!(add_import_specifier, get_import_specifier, import_specifiers,
        ImportSpecifierData,
        NodeKind::ImportSpecifier
            | NodeKind::ImportDefaultSpecifier
            | NodeKind::ImportNamespaceSpecifier);
    add_method!(add_export_specifier, get_export_specifier, export_specifiers,
        ExportSpecifierData, NodeKind::ExportSpecifier);
    add_method!(add_export_declaration, get_export_declaration,
        export_declarations, ExportData,
        NodeKind::ExportNamedDeclaration
            | NodeKind::ExportDefaultDeclaration
            | NodeKind::ExportAllDeclaration);
    add_method!(add_unknown, get_unknown, unknowns, UnknownData,
        NodeKind::Unknown);

    // `_at` conveniences for the handful of payloads the analyzer reads
    // straight off a handle.

    pub fn get_function_at(&self, index: NodeIndex) -> Option<&FunctionData> {
        self.get(index).and_then(|n| self.get_function(n))
    }

    pub fn get_variable_declaration_at(
        &self,
        index: NodeIndex,
    ) -> Option<&VariableDeclarationData> {
        self.get(index).and_then(|n| self.get_variable_declaration(n))
    }

    pub fn get_variable_declarator_at(
        &self,
        index: NodeIndex,
    ) -> Option<&VariableDeclaratorData> {
        self.get(index).and_then(|n| self.get_variable_declarator(n))
    }

    pub fn get_literal_at(&self, index: NodeIndex) -> Option<&LiteralData> {
        self.get(index).and_then(|n| self.get_literal(n))
    }

    pub fn get_program_at(&self, index: NodeIndex) -> Option<&ProgramData> {
        self.get(index).and_then(|n| self.get_program(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_kind_guarded() {
        let mut arena = AstArena::new();
        let id = arena.add_identifier(
            NodeKind::Identifier,
            Span::new(0, 1),
            IdentifierData { name: "x".to_string() },
        );
        let node = arena.get(id).unwrap();
        assert_eq!(arena.identifier_name(id), Some("x"));
        assert!(arena.get_literal(node).is_none());
        assert!(arena.get_function(node).is_none());
    }

    #[test]
    fn none_handle_resolves_to_nothing() {
        let arena = AstArena::new();
        assert!(arena.get(NodeIndex::NONE).is_none());
        assert!(arena.kind(NodeIndex::NONE).is_none());
        assert!(arena.identifier_name(NodeIndex::NONE).is_none());
    }

    #[test]
    fn block_statements_live_in_the_list_pool() {
        let mut arena = AstArena::new();
        let id = arena.add_identifier(
            NodeKind::Identifier,
            Span::new(1, 2),
            IdentifierData { name: "a".to_string() },
        );
        let stmt = arena.add_expression_statement(
            NodeKind::ExpressionStatement,
            Span::new(1, 2),
            ExpressionStatementData { expression: id },
        );
        let body = arena.add_list(
            NodeKind::BlockStatement,
            Span::new(0, 3),
            ListData { elements: NodeList::from_vec(vec![stmt]) },
        );

        let node = arena.get(body).unwrap();
        assert_eq!(arena.get_list(node).unwrap().elements.nodes, vec![stmt]);

        let mut children = Vec::new();
        arena.field(body, "body").unwrap().collect_into(&mut children);
        assert_eq!(children, vec![stmt]);
    }

    #[test]
    fn type_name_prefers_original_tag_for_unknown_nodes() {
        let mut arena = AstArena::new();
        let unk = arena.add_unknown(
            NodeKind::Unknown,
            Span::default(),
            UnknownData { type_name: "TSTypeAliasDeclaration".to_string(), edges: vec![] },
        );
        assert_eq!(arena.type_name(unk), Some("TSTypeAliasDeclaration"));
    }
}
