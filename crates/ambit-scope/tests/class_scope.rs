//! Class scopes: name visibility, superclasses, and methods.

mod common;

use ambit_scope::{DefinitionType, ScopeType};
use common::*;
use serde_json::json;

fn method(name: &str, params: serde_json::Value, body: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "MethodDefinition",
        "kind": "method",
        "computed": false,
        "static": false,
        "key": ident(name),
        "value": func_expr(None, params, body)
    })
}

fn class_decl(name: &str, super_class: serde_json::Value, body: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "ClassDeclaration",
        "id": ident(name),
        "superClass": super_class,
        "body": {"type": "ClassBody", "body": body}
    })
}

#[test]
fn class_declaration_names_both_scopes() {
    let a = run(program(json!([class_decl("C", json!(null), json!([]))])));
    let g = a.global();
    let class = a.child(g, 0);

    assert_eq!(a.manager.scope(class).scope_type(), ScopeType::Class);
    assert!(a.manager.scope(class).is_strict, "class bodies are always strict");

    // The name is visible outside (for recursion patterns) and inside
    // (to the members), as two distinct variables.
    assert_eq!(a.variable_names(g), ["C"]);
    assert_eq!(a.variable_names(class), ["C"]);
    assert_ne!(a.variable(g, "C"), a.variable(class, "C"));
    let outer = a.manager.variable(a.variable(g, "C"));
    assert_eq!(outer.defs[0].definition_type(), DefinitionType::ClassName);
}

#[test]
fn class_expression_name_stays_inside() {
    let a = run(program(json!([expr_stmt(json!({
        "type": "ClassExpression",
        "id": ident("Named"),
        "superClass": null,
        "body": {"type": "ClassBody", "body": []}
    }))])));
    let g = a.global();
    assert!(a.variable_names(g).is_empty());
    assert_eq!(a.variable_names(a.child(g, 0)), ["Named"]);
}

#[test]
fn superclass_expression_evaluates_in_the_enclosing_scope() {
    let a = run(program(json!([
        class_decl("Base", json!(null), json!([])),
        class_decl("Derived", ident("Base"), json!([])),
    ])));
    let g = a.global();

    // The `Base` read sits on the global scope, not the class scope.
    assert_eq!(a.reference_names(g), ["Base"]);
    let read = a.manager.reference(a.reference(g, 0));
    assert_eq!(read.resolved, Some(a.variable(g, "Base")));
    let derived = a.child(g, 1);
    assert!(a.reference_names(derived).is_empty());
}

#[test]
fn methods_get_strict_function_scopes() {
    let a = run(program(json!([class_decl(
        "C",
        json!(null),
        json!([method("m", json!([ident("p")]), json!([ret(ident("p"))]))])
    )])));
    let g = a.global();
    let class = a.child(g, 0);
    let function = a.child(class, 0);

    assert_eq!(a.manager.scope(function).scope_type(), ScopeType::Function);
    assert!(a.manager.scope(function).is_strict);
    assert_eq!(a.variable_names(function), ["arguments", "p"]);
}

#[test]
fn computed_method_keys_are_read_in_the_class_scope() {
    let a = run(program(json!([class_decl(
        "C",
        json!(null),
        json!([{
            "type": "MethodDefinition",
            "kind": "method",
            "computed": true,
            "static": false,
            "key": ident("keyName"),
            "value": func_expr(None, json!([]), json!([]))
        }])
    )])));
    let class = a.child(a.global(), 0);
    assert_eq!(a.reference_names(class), ["keyName"]);
}

#[test]
fn method_names_are_not_references() {
    let a = run(program(json!([class_decl(
        "C",
        json!(null),
        json!([method("m", json!([]), json!([]))])
    )])));
    let class = a.child(a.global(), 0);
    assert!(a.reference_names(class).is_empty());
}
