//! Shared fixture builders and assertion helpers for the analyzer tests.
//!
//! Fixtures are ESTree JSON (what a JavaScript parser would emit),
//! assembled with small builder functions so tests read close to the
//! source they model.

#![allow(dead_code)]

use ambit_scope::estree::{AstArena, NodeIndex, SourceType, from_estree};
use ambit_scope::{Options, ReferenceId, ScopeId, ScopeManager, VariableId, analyze};
use serde_json::{Value, json};

pub struct Analysis {
    pub arena: AstArena,
    pub manager: ScopeManager,
    pub root: NodeIndex,
}

pub fn run(program: Value) -> Analysis {
    let source_type = match program.get("sourceType").and_then(Value::as_str) {
        Some("module") => SourceType::Module,
        _ => SourceType::Script,
    };
    run_with(program, &Options { source_type, ..Options::default() })
}

pub fn run_with(program: Value, options: &Options) -> Analysis {
    let (arena, root) = from_estree(&program).expect("fixture should be valid ESTree");
    let manager = analyze(&arena, root, options).expect("analysis should succeed");
    Analysis { arena, manager, root }
}

impl Analysis {
    pub fn global(&self) -> ScopeId {
        self.manager.global_scope().expect("analysis produced a global scope")
    }

    pub fn child(&self, scope: ScopeId, index: usize) -> ScopeId {
        self.manager.scope(scope).child_scopes[index]
    }

    /// Names of the variables declared in `scope`, in insertion order.
    pub fn variable_names(&self, scope: ScopeId) -> Vec<&str> {
        self.manager.scope(scope).variables.iter().map(|&v| self.manager.variable(v).name.as_str()).collect()
    }

    /// Identifier texts of the references recorded in `scope`, in
    /// visitation order.
    pub fn reference_names(&self, scope: ScopeId) -> Vec<&str> {
        self.manager
            .scope(scope)
            .references
            .iter()
            .map(|&r| {
                self.arena
                    .identifier_name(self.manager.reference(r).identifier)
                    .expect("reference points at an identifier")
            })
            .collect()
    }

    /// Identifier texts of the references that escaped `scope`.
    pub fn through_names(&self, scope: ScopeId) -> Vec<&str> {
        self.manager
            .scope(scope)
            .through
            .iter()
            .map(|&r| {
                self.arena
                    .identifier_name(self.manager.reference(r).identifier)
                    .expect("reference points at an identifier")
            })
            .collect()
    }

    pub fn variable(&self, scope: ScopeId, name: &str) -> VariableId {
        *self
            .manager
            .scope(scope)
            .set
            .get(name)
            .unwrap_or_else(|| panic!("variable {name:?} should exist in scope"))
    }

    pub fn reference(&self, scope: ScopeId, index: usize) -> ReferenceId {
        self.manager.scope(scope).references[index]
    }

    /// The statement node at `program.body[index]`.
    pub fn stmt(&self, index: usize) -> NodeIndex {
        self.arena
            .get_program_at(self.root)
            .expect("root is a Program")
            .body
            .nodes[index]
    }
}

// ESTree fixture builders.

pub fn program(body: Value) -> Value {
    json!({"type": "Program", "sourceType": "script", "body": body})
}

pub fn module(body: Value) -> Value {
    json!({"type": "Program", "sourceType": "module", "body": body})
}

pub fn ident(name: &str) -> Value {
    json!({"type": "Identifier", "name": name})
}

pub fn lit(value: Value) -> Value {
    json!({"type": "Literal", "value": value})
}

pub fn str_lit(value: &str) -> Value {
    json!({"type": "Literal", "value": value})
}

pub fn expr_stmt(expression: Value) -> Value {
    json!({"type": "ExpressionStatement", "expression": expression})
}

pub fn directive(text: &str) -> Value {
    expr_stmt(json!({"type": "Literal", "value": text, "raw": format!("'{text}'")}))
}

pub fn block(body: Value) -> Value {
    json!({"type": "BlockStatement", "body": body})
}

pub fn var_decl(kind: &str, declarations: Value) -> Value {
    json!({"type": "VariableDeclaration", "kind": kind, "declarations": declarations})
}

pub fn declarator(id: Value) -> Value {
    json!({"type": "VariableDeclarator", "id": id, "init": null})
}

pub fn declarator_init(id: Value, init: Value) -> Value {
    json!({"type": "VariableDeclarator", "id": id, "init": init})
}

/// `kind name = init;` with a single plain declarator.
pub fn simple_decl(kind: &str, name: &str, init: Value) -> Value {
    var_decl(kind, json!([declarator_init(ident(name), init)]))
}

pub fn assign(operator: &str, left: Value, right: Value) -> Value {
    json!({"type": "AssignmentExpression", "operator": operator, "left": left, "right": right})
}

pub fn call(callee: Value, arguments: Value) -> Value {
    json!({"type": "CallExpression", "callee": callee, "arguments": arguments})
}

pub fn member(object: Value, property: Value, computed: bool) -> Value {
    json!({"type": "MemberExpression", "object": object, "property": property, "computed": computed})
}

pub fn ret(argument: Value) -> Value {
    json!({"type": "ReturnStatement", "argument": argument})
}

pub fn func_decl(name: &str, params: Value, body: Value) -> Value {
    json!({
        "type": "FunctionDeclaration",
        "id": ident(name),
        "params": params,
        "body": block(body),
        "generator": false,
        "async": false
    })
}

pub fn func_expr(name: Option<&str>, params: Value, body: Value) -> Value {
    json!({
        "type": "FunctionExpression",
        "id": name.map(ident),
        "params": params,
        "body": block(body),
        "generator": false,
        "async": false
    })
}

pub fn arrow(params: Value, body: Value) -> Value {
    json!({
        "type": "ArrowFunctionExpression",
        "id": null,
        "params": params,
        "body": body,
        "generator": false,
        "async": false
    })
}

pub fn obj_pattern(properties: Value) -> Value {
    json!({"type": "ObjectPattern", "properties": properties})
}

pub fn arr_pattern(elements: Value) -> Value {
    json!({"type": "ArrayPattern", "elements": elements})
}

pub fn prop(key: Value, value: Value) -> Value {
    json!({
        "type": "Property", "kind": "init", "computed": false, "shorthand": false,
        "key": key, "value": value
    })
}

pub fn shorthand_prop(name: &str) -> Value {
    json!({
        "type": "Property", "kind": "init", "computed": false, "shorthand": true,
        "key": ident(name), "value": ident(name)
    })
}

pub fn computed_prop(key: Value, value: Value) -> Value {
    json!({
        "type": "Property", "kind": "init", "computed": true, "shorthand": false,
        "key": key, "value": value
    })
}

pub fn assign_pattern(left: Value, right: Value) -> Value {
    json!({"type": "AssignmentPattern", "left": left, "right": right})
}

pub fn rest(argument: Value) -> Value {
    json!({"type": "RestElement", "argument": argument})
}
