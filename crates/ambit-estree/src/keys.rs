//! Child-visitor keys and per-node child lookup.
//!
//! Traversal is driven by field-name tables: every known kind has a
//! default key list (the estraverse table for the shapes we model), a
//! caller-supplied override map can replace the list for any type tag,
//! and unknown shapes fall back to the configured [`Fallback`] policy.

use rustc_hash::FxHashMap;

use crate::arena::AstArena;
use crate::node::{ChildValue, NodeIndex, NodeKind};

/// Override map from ESTree type tags to child key lists. An entry
/// replaces the default key list for that tag and can introduce keys for
/// tags outside the known set.
pub type VisitorKeyMap = FxHashMap<String, Vec<String>>;

/// Policy for nodes whose type tag has no key list: refuse, iterate every
/// child edge the node declares, or ask a caller-supplied selector.
pub enum Fallback {
    /// Unknown node shapes abort the traversal.
    None,
    /// Visit every child-bearing field in declaration order.
    Iteration,
    /// Ask the selector for the field names to visit.
    Custom(Box<dyn Fn(&AstArena, NodeIndex) -> Vec<String>>),
}

impl Default for Fallback {
    fn default() -> Fallback {
        Fallback::Iteration
    }
}

impl std::fmt::Debug for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::None => f.write_str("Fallback::None"),
            Fallback::Iteration => f.write_str("Fallback::Iteration"),
            Fallback::Custom(_) => f.write_str("Fallback::Custom(..)"),
        }
    }
}

/// One resolved child edge of a node.
#[derive(Clone, Copy, Debug)]
pub enum NodeSlot<'a> {
    Node(NodeIndex),
    List(&'a [NodeIndex]),
}

impl NodeSlot<'_> {
    /// Append the edge's handles to `out`, skipping holes.
    pub fn collect_into(&self, out: &mut Vec<NodeIndex>) {
        match self {
            NodeSlot::Node(idx) => {
                if idx.is_some() {
                    out.push(*idx);
                }
            }
            NodeSlot::List(nodes) => {
                out.extend(nodes.iter().copied().filter(|n| n.is_some()));
            }
        }
    }
}

/// Default child keys for a known kind, in visitation order.
pub fn visitor_keys(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::Program => &["body"],
        NodeKind::Identifier
        | NodeKind::Literal
        | NodeKind::TemplateElement
        | NodeKind::EmptyStatement
        | NodeKind::DebuggerStatement
        | NodeKind::ThisExpression
        | NodeKind::Super => &[],
        NodeKind::ExpressionStatement => &["expression"],
        NodeKind::BlockStatement => &["body"],
        NodeKind::WithStatement => &["object", "body"],
        NodeKind::ReturnStatement | NodeKind::ThrowStatement => &["argument"],
        NodeKind::LabeledStatement => &["label", "body"],
        NodeKind::BreakStatement | NodeKind::ContinueStatement => &["label"],
        NodeKind::IfStatement => &["test", "consequent", "alternate"],
        NodeKind::SwitchStatement => &["discriminant", "cases"],
        NodeKind::SwitchCase => &["test", "consequent"],
        NodeKind::TryStatement => &["block", "handler", "finalizer"],
        NodeKind::CatchClause => &["param", "body"],
        NodeKind::WhileStatement => &["test", "body"],
        NodeKind::DoWhileStatement => &["body", "test"],
        NodeKind::ForStatement => &["init", "test", "update", "body"],
        NodeKind::ForInStatement | NodeKind::ForOfStatement => &["left", "right", "body"],
        NodeKind::VariableDeclaration => &["declarations"],
        NodeKind::VariableDeclarator => &["id", "init"],
        NodeKind::FunctionDeclaration
        | NodeKind::FunctionExpression
        | NodeKind::ArrowFunctionExpression => &["id", "params", "body"],
        NodeKind::ClassDeclaration | NodeKind::ClassExpression => &["id", "superClass", "body"],
        NodeKind::ClassBody => &["body"],
        NodeKind::MethodDefinition | NodeKind::Property => &["key", "value"],
        NodeKind::ArrayExpression | NodeKind::ArrayPattern => &["elements"],
        NodeKind::ObjectExpression | NodeKind::ObjectPattern => &["properties"],
        NodeKind::YieldExpression | NodeKind::AwaitExpression => &["argument"],
        NodeKind::SpreadElement | NodeKind::RestElement => &["argument"],
        NodeKind::UnaryExpression | NodeKind::UpdateExpression => &["argument"],
        NodeKind::BinaryExpression
        | NodeKind::LogicalExpression
        | NodeKind::AssignmentExpression
        | NodeKind::AssignmentPattern => &["left", "right"],
        NodeKind::MemberExpression => &["object", "property"],
        NodeKind::ConditionalExpression => &["test", "consequent", "alternate"],
        NodeKind::CallExpression | NodeKind::NewExpression => &["callee", "arguments"],
        NodeKind::SequenceExpression => &["expressions"],
        NodeKind::TemplateLiteral => &["quasis", "expressions"],
        NodeKind::TaggedTemplateExpression => &["tag", "quasi"],
        NodeKind::MetaProperty => &["meta", "property"],
        NodeKind::ImportDeclaration => &["specifiers", "source"],
        NodeKind::ImportSpecifier => &["imported", "local"],
        NodeKind::ImportDefaultSpecifier | NodeKind::ImportNamespaceSpecifier => &["local"],
        NodeKind::ExportNamedDeclaration => &["declaration", "specifiers", "source"],
        NodeKind::ExportDefaultDeclaration => &["declaration"],
        NodeKind::ExportAllDeclaration => &["source"],
        NodeKind::ExportSpecifier => &["local", "exported"],
        NodeKind::Unknown => &[],
    }
}

impl AstArena {
    /// Resolve one named child edge of a node. Unknown nodes resolve
    /// against their stored edges; known nodes against their payload.
    pub fn field(&self, index: NodeIndex, name: &str) -> Option<NodeSlot<'_>> {
        let node = self.get(index)?;
        match node.kind {
            NodeKind::Unknown => {
                let unknown = self.get_unknown(node)?;
                unknown.edges.iter().find(|(key, _)| key == name).map(|(_, value)| match value {
                    ChildValue::Node(idx) => NodeSlot::Node(*idx),
                    ChildValue::List(list) => NodeSlot::List(&list.nodes),
                })
            }
            NodeKind::Program => {
                let data = self.get_program(node)?;
                match name {
                    "body" => Some(NodeSlot::List(&data.body.nodes)),
                    _ => None,
                }
            }
            NodeKind::ExpressionStatement => {
                let data = self.get_expression_statement(node)?;
                match name {
                    "expression" => Some(NodeSlot::Node(data.expression)),
                    _ => None,
                }
            }
            NodeKind::BlockStatement | NodeKind::ClassBody => {
                let data = self.get_list(node)?;
                match name {
                    "body" => Some(NodeSlot::List(&data.elements.nodes)),
                    _ => None,
                }
            }
            NodeKind::WithStatement => {
                let data = self.get_with(node)?;
                match name {
                    "object" => Some(NodeSlot::Node(data.object)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::ReturnStatement
            | NodeKind::ThrowStatement
            | NodeKind::AwaitExpression
            | NodeKind::SpreadElement
            | NodeKind::RestElement => {
                let data = self.get_argument(node)?;
                match name {
                    "argument" => Some(NodeSlot::Node(data.argument)),
                    _ => None,
                }
            }
            NodeKind::YieldExpression => {
                let data = self.get_yield(node)?;
                match name {
                    "argument" => Some(NodeSlot::Node(data.argument)),
                    _ => None,
                }
            }
            NodeKind::LabeledStatement => {
                let data = self.get_labeled(node)?;
                match name {
                    "label" => Some(NodeSlot::Node(data.label)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::BreakStatement | NodeKind::ContinueStatement => {
                let data = self.get_jump(node)?;
                match name {
                    "label" => Some(NodeSlot::Node(data.label)),
                    _ => None,
                }
            }
            NodeKind::IfStatement | NodeKind::ConditionalExpression => {
                let data = self.get_conditional(node)?;
                match name {
                    "test" => Some(NodeSlot::Node(data.test)),
                    "consequent" => Some(NodeSlot::Node(data.consequent)),
                    "alternate" => Some(NodeSlot::Node(data.alternate)),
                    _ => None,
                }
            }
            NodeKind::SwitchStatement => {
                let data = self.get_switch(node)?;
                match name {
                    "discriminant" => Some(NodeSlot::Node(data.discriminant)),
                    "cases" => Some(NodeSlot::List(&data.cases.nodes)),
                    _ => None,
                }
            }
            NodeKind::SwitchCase => {
                let data = self.get_switch_case(node)?;
                match name {
                    "test" => Some(NodeSlot::Node(data.test)),
                    "consequent" => Some(NodeSlot::List(&data.consequent.nodes)),
                    _ => None,
                }
            }
            NodeKind::TryStatement => {
                let data = self.get_try(node)?;
                match name {
                    "block" => Some(NodeSlot::Node(data.block)),
                    "handler" => Some(NodeSlot::Node(data.handler)),
                    "finalizer" => Some(NodeSlot::Node(data.finalizer)),
                    _ => None,
                }
            }
            NodeKind::CatchClause => {
                let data = self.get_catch_clause(node)?;
                match name {
                    "param" => Some(NodeSlot::Node(data.param)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::WhileStatement | NodeKind::DoWhileStatement => {
                let data = self.get_while(node)?;
                match name {
                    "test" => Some(NodeSlot::Node(data.test)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::ForStatement => {
                let data = self.get_for_statement(node)?;
                match name {
                    "init" => Some(NodeSlot::Node(data.init)),
                    "test" => Some(NodeSlot::Node(data.test)),
                    "update" => Some(NodeSlot::Node(data.update)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::ForInStatement | NodeKind::ForOfStatement => {
                let data = self.get_for_in_of(node)?;
                match name {
                    "left" => Some(NodeSlot::Node(data.left)),
                    "right" => Some(NodeSlot::Node(data.right)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::VariableDeclaration => {
                let data = self.get_variable_declaration(node)?;
                match name {
                    "declarations" => Some(NodeSlot::List(&data.declarations.nodes)),
                    _ => None,
                }
            }
            NodeKind::VariableDeclarator => {
                let data = self.get_variable_declarator(node)?;
                match name {
                    "id" => Some(NodeSlot::Node(data.id)),
                    "init" => Some(NodeSlot::Node(data.init)),
                    _ => None,
                }
            }
            NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::ArrowFunctionExpression => {
                let data = self.get_function(node)?;
                match name {
                    "id" => Some(NodeSlot::Node(data.id)),
                    "params" => Some(NodeSlot::List(&data.params.nodes)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => {
                let data = self.get_class(node)?;
                match name {
                    "id" => Some(NodeSlot::Node(data.id)),
                    "superClass" => Some(NodeSlot::Node(data.super_class)),
                    "body" => Some(NodeSlot::Node(data.body)),
                    _ => None,
                }
            }
            NodeKind::MethodDefinition | NodeKind::Property => {
                let data = self.get_property(node)?;
                match name {
                    "key" => Some(NodeSlot::Node(data.key)),
                    "value" => Some(NodeSlot::Node(data.value)),
                    _ => None,
                }
            }
            NodeKind::ArrayExpression
            | NodeKind::ArrayPattern => {
                let data = self.get_list(node)?;
                match name {
                    "elements" => Some(NodeSlot::List(&data.elements.nodes)),
                    _ => None,
                }
            }
            NodeKind::ObjectExpression | NodeKind::ObjectPattern => {
                let data = self.get_list(node)?;
                match name {
                    "properties" => Some(NodeSlot::List(&data.elements.nodes)),
                    _ => None,
                }
            }
            NodeKind::SequenceExpression => {
                let data = self.get_list(node)?;
                match name {
                    "expressions" => Some(NodeSlot::List(&data.elements.nodes)),
                    _ => None,
                }
            }
            NodeKind::UnaryExpression | NodeKind::UpdateExpression => {
                let data = self.get_unary_expr(node)?;
                match name {
                    "argument" => Some(NodeSlot::Node(data.argument)),
                    _ => None,
                }
            }
            NodeKind::BinaryExpression
            | NodeKind::LogicalExpression
            | NodeKind::AssignmentExpression
            | NodeKind::AssignmentPattern => {
                let data = self.get_binary_expr(node)?;
                match name {
                    "left" => Some(NodeSlot::Node(data.left)),
                    "right" => Some(NodeSlot::Node(data.right)),
                    _ => None,
                }
            }
            NodeKind::MemberExpression => {
                let data = self.get_member_expr(node)?;
                match name {
                    "object" => Some(NodeSlot::Node(data.object)),
                    "property" => Some(NodeSlot::Node(data.property)),
                    _ => None,
                }
            }
            NodeKind::CallExpression | NodeKind::NewExpression => {
                let data = self.get_call_expr(node)?;
                match name {
                    "callee" => Some(NodeSlot::Node(data.callee)),
                    "arguments" => Some(NodeSlot::List(&data.arguments.nodes)),
                    _ => None,
                }
            }
            NodeKind::TemplateLiteral => {
                let data = self.get_template(node)?;
                match name {
                    "quasis" => Some(NodeSlot::List(&data.quasis.nodes)),
                    "expressions" => Some(NodeSlot::List(&data.expressions.nodes)),
                    _ => None,
                }
            }
            NodeKind::TaggedTemplateExpression => {
                let data = self.get_tagged_template(node)?;
                match name {
                    "tag" => Some(NodeSlot::Node(data.tag)),
                    "quasi" => Some(NodeSlot::Node(data.quasi)),
                    _ => None,
                }
            }
            NodeKind::MetaProperty => {
                let data = self.get_meta_property(node)?;
                match name {
                    "meta" => Some(NodeSlot::Node(data.meta)),
                    "property" => Some(NodeSlot::Node(data.property)),
                    _ => None,
                }
            }
            NodeKind::ImportDeclaration => {
                let data = self.get_import_declaration(node)?;
                match name {
                    "specifiers" => Some(NodeSlot::List(&data.specifiers.nodes)),
                    "source" => Some(NodeSlot::Node(data.source)),
                    _ => None,
                }
            }
            NodeKind::ImportSpecifier
            | NodeKind::ImportDefaultSpecifier
            | NodeKind::ImportNamespaceSpecifier => {
                let data = self.get_import_specifier(node)?;
                match name {
                    "local" => Some(NodeSlot::Node(data.local)),
                    "imported" => Some(NodeSlot::Node(data.imported)),
                    _ => None,
                }
            }
            NodeKind::ExportSpecifier => {
                let data = self.get_export_specifier(node)?;
                match name {
                    "local" => Some(NodeSlot::Node(data.local)),
                    "exported" => Some(NodeSlot::Node(data.exported)),
                    _ => None,
                }
            }
            NodeKind::ExportNamedDeclaration
            | NodeKind::ExportDefaultDeclaration
            | NodeKind::ExportAllDeclaration => {
                let data = self.get_export_declaration(node)?;
                match name {
                    "declaration" => Some(NodeSlot::Node(data.declaration)),
                    "specifiers" => Some(NodeSlot::List(&data.specifiers.nodes)),
                    "source" => Some(NodeSlot::Node(data.source)),
                    _ => None,
                }
            }
            NodeKind::Identifier
            | NodeKind::Literal
            | NodeKind::TemplateElement
            | NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::ThisExpression
            | NodeKind::Super => None,
        }
    }

    /// Every child-bearing field name a node declares, in order. This is
    /// the input of the `Fallback::Iteration` policy.
    pub fn fallback_keys(&self, index: NodeIndex) -> Vec<String> {
        let Some(node) = self.get(index) else {
            return Vec::new();
        };
        if node.kind == NodeKind::Unknown {
            self.get_unknown(node)
                .map(|u| u.edges.iter().map(|(key, _)| key.clone()).collect())
                .unwrap_or_default()
        } else {
            visitor_keys(node.kind).iter().map(|k| (*k).to_string()).collect()
        }
    }
}

/// Build an unknown-node edge list literal, used by tests and by callers
/// assembling extension nodes by hand.
pub fn edge(name: &str, value: ChildValue) -> (String, ChildValue) {
    (name.to_string(), value)
}
