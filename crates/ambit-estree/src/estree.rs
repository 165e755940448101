//! ESTree JSON ingestion.
//!
//! `from_estree` loads the JSON a JavaScript parser emitted into an
//! [`AstArena`]. Explicit `range`/`start`+`end` positions are honored;
//! otherwise nodes get synthetic monotone pre-order spans, which keeps
//! relative source order intact (the function parameter/body boundary in
//! particular). Unknown `type` tags become [`NodeKind::Unknown`] nodes
//! carrying their child edges in source field order.

use serde_json::{Map, Value};
use tracing::debug;

use crate::arena::AstArena;
use crate::node::*;
use crate::span::Span;

/// Malformed ESTree input. Unknown node *types* are not an error (they
/// load as [`NodeKind::Unknown`]); structurally broken nodes are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EstreeError {
    ExpectedObject,
    MissingType,
    ExpectedString { type_name: String, field: &'static str },
    UnknownDeclarationKind { kind: String },
    UnknownSourceType { value: String },
    UnknownPropertyKind { kind: String },
}

impl std::fmt::Display for EstreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstreeError::ExpectedObject => write!(f, "expected a node object"),
            EstreeError::MissingType => write!(f, "node object has no \"type\" tag"),
            EstreeError::ExpectedString { type_name, field } => {
                write!(f, "{type_name}.{field} must be a string")
            }
            EstreeError::UnknownDeclarationKind { kind } => {
                write!(f, "unknown declaration kind {kind:?}")
            }
            EstreeError::UnknownSourceType { value } => {
                write!(f, "unknown sourceType {value:?}")
            }
            EstreeError::UnknownPropertyKind { kind } => {
                write!(f, "unknown property kind {kind:?}")
            }
        }
    }
}

impl std::error::Error for EstreeError {}

/// Load an ESTree JSON tree into a fresh arena. Returns the arena and
/// the handle of the root node.
pub fn from_estree(value: &Value) -> Result<(AstArena, NodeIndex), EstreeError> {
    let mut loader = Loader { arena: AstArena::new(), cursor: 0 };
    let root = loader.load(value)?;
    Ok((loader.arena, root))
}

struct Loader {
    arena: AstArena,
    cursor: u32,
}

fn explicit_span(obj: &Map<String, Value>) -> Option<Span> {
    if let Some(range) = obj.get("range").and_then(Value::as_array)
        && range.len() == 2
        && let (Some(lo), Some(hi)) = (range[0].as_u64(), range[1].as_u64())
    {
        return Some(Span::new(lo as u32, hi as u32));
    }
    if let (Some(lo), Some(hi)) = (
        obj.get("start").and_then(Value::as_u64),
        obj.get("end").and_then(Value::as_u64),
    ) {
        return Some(Span::new(lo as u32, hi as u32));
    }
    None
}

fn is_node_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.get("type").is_some_and(|t| t.is_string()))
}

impl Loader {
    fn bump(&mut self) -> u32 {
        let pos = self.cursor;
        self.cursor += 1;
        pos
    }

    fn load(&mut self, value: &Value) -> Result<NodeIndex, EstreeError> {
        let obj = value.as_object().ok_or(EstreeError::ExpectedObject)?;
        let type_tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EstreeError::MissingType)?;

        let explicit = explicit_span(obj);
        let lo = match explicit {
            Some(span) => span.lo,
            None => self.bump(),
        };

        let index = match NodeKind::from_name(type_tag) {
            Some(kind) => self.load_known(kind, obj)?,
            None => self.load_unknown(type_tag, obj)?,
        };

        let hi = match explicit {
            Some(span) => span.hi,
            None => self.bump(),
        };
        if let Some(node) = self.arena.get_mut(index) {
            node.span = Span::new(lo, hi);
        }
        Ok(index)
    }

    /// Optional single child; `null` or a missing field is `NONE`.
    fn child(&mut self, obj: &Map<String, Value>, name: &str) -> Result<NodeIndex, EstreeError> {
        match obj.get(name) {
            None | Some(Value::Null) => Ok(NodeIndex::NONE),
            Some(value) => self.load(value),
        }
    }

    /// Child list; `null` elements stay as holes, a missing field is an
    /// empty list.
    fn child_list(&mut self, obj: &Map<String, Value>, name: &str) -> Result<NodeList, EstreeError> {
        let mut list = NodeList::new();
        if let Some(Value::Array(items)) = obj.get(name) {
            list.nodes.reserve(items.len());
            for item in items {
                if item.is_null() {
                    list.nodes.push(NodeIndex::NONE);
                } else {
                    list.nodes.push(self.load(item)?);
                }
            }
        }
        Ok(list)
    }

    fn required_str<'v>(
        &self,
        obj: &'v Map<String, Value>,
        kind: NodeKind,
        field: &'static str,
    ) -> Result<&'v str, EstreeError> {
        obj.get(field).and_then(Value::as_str).ok_or_else(|| EstreeError::ExpectedString {
            type_name: kind.name().to_string(),
            field,
        })
    }

    fn bool_field(&self, obj: &Map<String, Value>, field: &str) -> bool {
        obj.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    fn load_known(
        &mut self,
        kind: NodeKind,
        obj: &Map<String, Value>,
    ) -> Result<NodeIndex, EstreeError> {
        let span = Span::default();
        let index = match kind {
            NodeKind::Program => {
                let source_type = match obj.get("sourceType").and_then(Value::as_str) {
                    None | Some("script") => SourceType::Script,
                    Some("module") => SourceType::Module,
                    Some(other) => {
                        return Err(EstreeError::UnknownSourceType { value: other.to_string() });
                    }
                };
                let body = self.child_list(obj, "body")?;
                self.arena.add_program(kind, span, ProgramData { source_type, body })
            }
            NodeKind::Identifier => {
                let name = self.required_str(obj, kind, "name")?.to_string();
                self.arena.add_identifier(kind, span, IdentifierData { name })
            }
            NodeKind::Literal => {
                let value = if let Some(regex) = obj.get("regex").and_then(Value::as_object) {
                    LiteralValue::Regex {
                        pattern: regex
                            .get("pattern")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        flags: regex
                            .get("flags")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    }
                } else {
                    match obj.get("value") {
                        None | Some(Value::Null) => LiteralValue::Null,
                        Some(Value::Bool(b)) => LiteralValue::Boolean(*b),
                        Some(Value::Number(n)) => {
                            LiteralValue::Number(n.as_f64().unwrap_or(f64::NAN))
                        }
                        Some(Value::String(s)) => LiteralValue::String(s.clone()),
                        // Arrays/objects in a literal value slot are parser
                        // extensions; keep the node, drop the value.
                        Some(_) => LiteralValue::Null,
                    }
                };
                let raw = obj.get("raw").and_then(Value::as_str).map(str::to_string);
                self.arena.add_literal(kind, span, LiteralData { value, raw })
            }
            NodeKind::TemplateElement
            | NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::ThisExpression
            | NodeKind::Super => self.arena.add_token(kind, span),
            NodeKind::ExpressionStatement => {
                let expression = self.child(obj, "expression")?;
                self.arena.add_expression_statement(
                    kind,
                    span,
                    ExpressionStatementData { expression },
                )
            }
            NodeKind::BlockStatement | NodeKind::ClassBody => {
                let elements = self.child_list(obj, "body")?;
                self.arena.add_list(kind, span, ListData { elements })
            }
            NodeKind::WithStatement => {
                let object = self.child(obj, "object")?;
                let body = self.child(obj, "body")?;
                self.arena.add_with(kind, span, WithData { object, body })
            }
            NodeKind::ReturnStatement
            | NodeKind::ThrowStatement
            | NodeKind::AwaitExpression
            | NodeKind::SpreadElement
            | NodeKind::RestElement => {
                let argument = self.child(obj, "argument")?;
                self.arena.add_argument(kind, span, ArgumentData { argument })
            }
            NodeKind::YieldExpression => {
                let argument = self.child(obj, "argument")?;
                let delegate = self.bool_field(obj, "delegate");
                self.arena.add_yield(kind, span, YieldData { argument, delegate })
            }
            NodeKind::LabeledStatement => {
                let label = self.child(obj, "label")?;
                let body = self.child(obj, "body")?;
                self.arena.add_labeled(kind, span, LabeledData { label, body })
            }
            NodeKind::BreakStatement | NodeKind::ContinueStatement => {
                let label = self.child(obj, "label")?;
                self.arena.add_jump(kind, span, JumpData { label })
            }
            NodeKind::IfStatement | NodeKind::ConditionalExpression => {
                let test = self.child(obj, "test")?;
                let consequent = self.child(obj, "consequent")?;
                let alternate = self.child(obj, "alternate")?;
                self.arena.add_conditional(
                    kind,
                    span,
                    ConditionalData { test, consequent, alternate },
                )
            }
            NodeKind::SwitchStatement => {
                let discriminant = self.child(obj, "discriminant")?;
                let cases = self.child_list(obj, "cases")?;
                self.arena.add_switch(kind, span, SwitchData { discriminant, cases })
            }
            NodeKind::SwitchCase => {
                let test = self.child(obj, "test")?;
                let consequent = self.child_list(obj, "consequent")?;
                self.arena.add_switch_case(kind, span, SwitchCaseData { test, consequent })
            }
            NodeKind::TryStatement => {
                let block = self.child(obj, "block")?;
                let handler = self.child(obj, "handler")?;
                let finalizer = self.child(obj, "finalizer")?;
                self.arena.add_try(kind, span, TryData { block, handler, finalizer })
            }
            NodeKind::CatchClause => {
                let param = self.child(obj, "param")?;
                let body = self.child(obj, "body")?;
                self.arena.add_catch_clause(kind, span, CatchClauseData { param, body })
            }
            NodeKind::WhileStatement | NodeKind::DoWhileStatement => {
                let test = self.child(obj, "test")?;
                let body = self.child(obj, "body")?;
                self.arena.add_while(kind, span, WhileData { test, body })
            }
            NodeKind::ForStatement => {
                let init = self.child(obj, "init")?;
                let test = self.child(obj, "test")?;
                let update = self.child(obj, "update")?;
                let body = self.child(obj, "body")?;
                self.arena.add_for_statement(kind, span, ForStatementData { init, test, update, body })
            }
            NodeKind::ForInStatement | NodeKind::ForOfStatement => {
                let left = self.child(obj, "left")?;
                let right = self.child(obj, "right")?;
                let body = self.child(obj, "body")?;
                self.arena.add_for_in_of(kind, span, ForInOfData { left, right, body })
            }
            NodeKind::VariableDeclaration => {
                let kind_str = self.required_str(obj, kind, "kind")?;
                let decl_kind = DeclarationKind::from_str(kind_str).ok_or_else(|| {
                    EstreeError::UnknownDeclarationKind { kind: kind_str.to_string() }
                })?;
                let declarations = self.child_list(obj, "declarations")?;
                self.arena.add_variable_declaration(
                    kind,
                    span,
                    VariableDeclarationData { kind: decl_kind, declarations },
                )
            }
            NodeKind::VariableDeclarator => {
                let id = self.child(obj, "id")?;
                let init = self.child(obj, "init")?;
                self.arena.add_variable_declarator(kind, span, VariableDeclaratorData { id, init })
            }
            NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::ArrowFunctionExpression => {
                let id = self.child(obj, "id")?;
                let params = self.child_list(obj, "params")?;
                let body = self.child(obj, "body")?;
                let generator = self.bool_field(obj, "generator");
                let is_async = self.bool_field(obj, "async");
                self.arena.add_function(
                    kind,
                    span,
                    FunctionData { id, params, body, generator, is_async },
                )
            }
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => {
                let id = self.child(obj, "id")?;
                let super_class = self.child(obj, "superClass")?;
                let body = self.child(obj, "body")?;
                self.arena.add_class(kind, span, ClassData { id, super_class, body })
            }
            NodeKind::MethodDefinition | NodeKind::Property => {
                let key = self.child(obj, "key")?;
                let value = self.child(obj, "value")?;
                let default_kind =
                    if kind == NodeKind::MethodDefinition { "method" } else { "init" };
                let kind_str =
                    obj.get("kind").and_then(Value::as_str).unwrap_or(default_kind);
                let prop_kind = PropertyKind::from_str(kind_str).ok_or_else(|| {
                    EstreeError::UnknownPropertyKind { kind: kind_str.to_string() }
                })?;
                let computed = self.bool_field(obj, "computed");
                let shorthand = self.bool_field(obj, "shorthand");
                let is_static = self.bool_field(obj, "static");
                self.arena.add_property(
                    kind,
                    span,
                    PropertyData { key, value, kind: prop_kind, computed, shorthand, is_static },
                )
            }
            NodeKind::ArrayExpression | NodeKind::ArrayPattern => {
                let elements = self.child_list(obj, "elements")?;
                self.arena.add_list(kind, span, ListData { elements })
            }
            NodeKind::ObjectExpression | NodeKind::ObjectPattern => {
                let elements = self.child_list(obj, "properties")?;
                self.arena.add_list(kind, span, ListData { elements })
            }
            NodeKind::SequenceExpression => {
                let elements = self.child_list(obj, "expressions")?;
                self.arena.add_list(kind, span, ListData { elements })
            }
            NodeKind::UnaryExpression | NodeKind::UpdateExpression => {
                let operator = self.required_str(obj, kind, "operator")?.to_string();
                let prefix = obj.get("prefix").and_then(Value::as_bool).unwrap_or(true);
                let argument = self.child(obj, "argument")?;
                self.arena.add_unary_expr(kind, span, UnaryExprData { operator, prefix, argument })
            }
            NodeKind::BinaryExpression
            | NodeKind::LogicalExpression
            | NodeKind::AssignmentExpression => {
                let operator = self.required_str(obj, kind, "operator")?.to_string();
                let left = self.child(obj, "left")?;
                let right = self.child(obj, "right")?;
                self.arena.add_binary_expr(kind, span, BinaryExprData { operator, left, right })
            }
            NodeKind::AssignmentPattern => {
                let left = self.child(obj, "left")?;
                let right = self.child(obj, "right")?;
                self.arena.add_binary_expr(
                    kind,
                    span,
                    BinaryExprData { operator: "=".to_string(), left, right },
                )
            }
            NodeKind::MemberExpression => {
                let object = self.child(obj, "object")?;
                let property = self.child(obj, "property")?;
                let computed = self.bool_field(obj, "computed");
                self.arena.add_member_expr(kind, span, MemberExprData { object, property, computed })
            }
            NodeKind::CallExpression | NodeKind::NewExpression => {
                let callee = self.child(obj, "callee")?;
                let arguments = self.child_list(obj, "arguments")?;
                self.arena.add_call_expr(kind, span, CallExprData { callee, arguments })
            }
            NodeKind::TemplateLiteral => {
                let quasis = self.child_list(obj, "quasis")?;
                let expressions = self.child_list(obj, "expressions")?;
                self.arena.add_template(kind, span, TemplateData { quasis, expressions })
            }
            NodeKind::TaggedTemplateExpression => {
                let tag = self.child(obj, "tag")?;
                let quasi = self.child(obj, "quasi")?;
                self.arena.add_tagged_template(kind, span, TaggedTemplateData { tag, quasi })
            }
            NodeKind::MetaProperty => {
                let meta = self.child(obj, "meta")?;
                let property = self.child(obj, "property")?;
                self.arena.add_meta_property(kind, span, MetaPropertyData { meta, property })
            }
            NodeKind::ImportDeclaration => {
                let specifiers = self.child_list(obj, "specifiers")?;
                let source = self.child(obj, "source")?;
                self.arena.add_import_declaration(
                    kind,
                    span,
                    ImportDeclarationData { specifiers, source },
                )
            }
            NodeKind::ImportSpecifier
            | NodeKind::ImportDefaultSpecifier
            | NodeKind::ImportNamespaceSpecifier => {
                let local = self.child(obj, "local")?;
                let imported = self.child(obj, "imported")?;
                self.arena.add_import_specifier(kind, span, ImportSpecifierData { local, imported })
            }
            NodeKind::ExportSpecifier => {
                let local = self.child(obj, "local")?;
                let exported = self.child(obj, "exported")?;
                self.arena.add_export_specifier(kind, span, ExportSpecifierData { local, exported })
            }
            NodeKind::ExportNamedDeclaration
            | NodeKind::ExportDefaultDeclaration
            | NodeKind::ExportAllDeclaration => {
                let declaration = self.child(obj, "declaration")?;
                let specifiers = self.child_list(obj, "specifiers")?;
                let source = self.child(obj, "source")?;
                self.arena.add_export_declaration(
                    kind,
                    span,
                    ExportData { declaration, specifiers, source },
                )
            }
            NodeKind::Unknown => unreachable!("unknown kinds load through load_unknown"),
        };
        Ok(index)
    }

    fn load_unknown(
        &mut self,
        type_tag: &str,
        obj: &Map<String, Value>,
    ) -> Result<NodeIndex, EstreeError> {
        debug!(type_tag, "loading node outside the known ESTree set");
        let mut edges = Vec::new();
        for (key, value) in obj {
            if matches!(key.as_str(), "type" | "start" | "end" | "range" | "loc") {
                continue;
            }
            match value {
                value if is_node_object(value) => {
                    edges.push((key.clone(), ChildValue::Node(self.load(value)?)));
                }
                Value::Array(items) if items.iter().any(is_node_object) => {
                    let mut list = NodeList::new();
                    for item in items {
                        if is_node_object(item) {
                            list.nodes.push(self.load(item)?);
                        }
                    }
                    edges.push((key.clone(), ChildValue::List(list)));
                }
                _ => {}
            }
        }
        Ok(self.arena.add_unknown(
            NodeKind::Unknown,
            Span::default(),
            UnknownData { type_name: type_tag.to_string(), edges },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_a_minimal_program() {
        let (arena, root) = from_estree(&json!({
            "type": "Program",
            "body": [
                {"type": "ExpressionStatement", "expression": {"type": "Identifier", "name": "a"}}
            ]
        }))
        .unwrap();
        let program = arena.get_program_at(root).unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.source_type, SourceType::Script);
    }

    #[test]
    fn synthetic_spans_nest_children_inside_parents() {
        let (arena, root) = from_estree(&json!({
            "type": "FunctionDeclaration",
            "id": {"type": "Identifier", "name": "f"},
            "params": [{"type": "Identifier", "name": "a"}],
            "body": {"type": "BlockStatement", "body": [
                {"type": "ExpressionStatement", "expression": {"type": "Identifier", "name": "a"}}
            ]}
        }))
        .unwrap();
        let func = arena.get_function_at(root).unwrap();
        let param_span = arena.span(func.params.nodes[0]).unwrap();
        let body_span = arena.span(func.body).unwrap();
        let root_span = arena.span(root).unwrap();
        assert!(param_span.lo < body_span.lo, "params precede the body");
        assert!(root_span.lo < param_span.lo && body_span.hi < root_span.hi);
    }

    #[test]
    fn explicit_ranges_win_over_synthetic_positions() {
        let (arena, root) = from_estree(&json!({
            "type": "Identifier", "name": "x", "range": [10, 11]
        }))
        .unwrap();
        assert_eq!(arena.span(root).unwrap(), Span::new(10, 11));
    }

    #[test]
    fn unknown_types_keep_their_child_edges_in_order() {
        let (arena, root) = from_estree(&json!({
            "type": "TSAsExpression",
            "expression": {"type": "Identifier", "name": "v"},
            "typeAnnotation": {"type": "TSAnyKeyword"}
        }))
        .unwrap();
        assert_eq!(arena.kind(root), Some(NodeKind::Unknown));
        assert_eq!(arena.type_name(root), Some("TSAsExpression"));
        assert_eq!(
            arena.fallback_keys(root),
            vec!["expression".to_string(), "typeAnnotation".to_string()]
        );
    }

    #[test]
    fn array_holes_stay_holes() {
        let (arena, root) = from_estree(&json!({
            "type": "ArrayPattern",
            "elements": [null, {"type": "Identifier", "name": "b"}]
        }))
        .unwrap();
        let node = arena.get(root).unwrap();
        let list = arena.get_list(node).unwrap();
        assert!(list.elements.nodes[0].is_none());
        assert!(list.elements.nodes[1].is_some());
    }

    #[test]
    fn missing_identifier_name_is_an_error() {
        let err = from_estree(&json!({"type": "Identifier"})).unwrap_err();
        assert_eq!(
            err,
            EstreeError::ExpectedString { type_name: "Identifier".to_string(), field: "name" }
        );
    }

    #[test]
    fn bad_declaration_kind_is_an_error() {
        let err = from_estree(&json!({
            "type": "VariableDeclaration", "kind": "letconst", "declarations": []
        }))
        .unwrap_err();
        assert_eq!(err, EstreeError::UnknownDeclarationKind { kind: "letconst".to_string() });
    }
}
