//! `with` statements: dynamic scopes and tainted resolution.

mod common;

use ambit_scope::ScopeType;
use common::*;
use serde_json::json;

fn with_stmt(object: serde_json::Value, body: serde_json::Value) -> serde_json::Value {
    json!({"type": "WithStatement", "object": object, "body": body})
}

#[test]
fn references_inside_with_are_tainted_and_escape() {
    let a = run(program(json!([func_decl(
        "f",
        json!([]),
        json!([with_stmt(ident("obj"), block(json!([expr_stmt(ident("x"))])))])
    )])));
    let g = a.global();
    let function = a.child(g, 0);
    let with = a.child(function, 0);
    assert_eq!(a.manager.scope(with).scope_type(), ScopeType::With);
    assert!(a.manager.scope(with).dynamic);
    assert!(!a.manager.scope(with).is_static());

    // The occurrence itself sits in the body's block scope.
    let body = a.child(with, 0);
    assert_eq!(a.reference_names(body), ["x"]);

    // `x` is tainted and appears in `through` at every level up to and
    // including global, never resolving.
    let x = a.reference(body, 0);
    assert!(a.manager.reference(x).tainted);
    assert!(a.manager.reference(x).resolved.is_none());
    assert!(a.manager.is_used_name(g, "x", &a.arena));
    assert!(!a.manager.is_used_name(g, "y", &a.arena));
    for scope in [body, with, function, g] {
        assert!(a.through_names(scope).contains(&"x"), "x escapes {:?}", a.manager.scope(scope).scope_type());
    }
}

#[test]
fn with_object_expression_evaluates_outside_the_with_scope() {
    let a = run(program(json!([with_stmt(ident("obj"), block(json!([])))])));
    let g = a.global();
    assert_eq!(a.reference_names(g), ["obj"]);
    let with = a.child(g, 0);
    assert!(a.reference_names(with).is_empty());
}

#[test]
fn outer_bindings_still_resolve_through_with_but_tainted() {
    let a = run(program(json!([func_decl(
        "f",
        json!([]),
        json!([
            simple_decl("var", "x", lit(json!(1))),
            with_stmt(ident("obj"), block(json!([expr_stmt(ident("x"))]))),
        ])
    )])));
    let function = a.child(a.global(), 0);
    let with = a.child(function, 0);
    let body = a.child(with, 0);

    let x_ref = a.reference(body, 0);
    let x_var = a.variable(function, "x");
    assert_eq!(a.manager.reference(x_ref).resolved, Some(x_var));
    assert!(a.manager.reference(x_ref).tainted);
    assert!(a.manager.variable(x_var).tainted);
    assert_eq!(a.manager.scope(function).taints.get("x"), Some(&true));

    // It still counts as escaping the with scope itself.
    assert_eq!(a.through_names(with), ["x"]);
}

#[test]
fn body_block_inside_with_nests_below_the_with_scope() {
    let a = run(program(json!([with_stmt(
        ident("obj"),
        block(json!([simple_decl("let", "y", lit(json!(1)))]))
    )])));
    let g = a.global();
    let with = a.child(g, 0);
    let body = a.child(with, 0);
    assert_eq!(a.manager.scope(body).scope_type(), ScopeType::Block);
    assert_eq!(a.variable_names(body), ["y"]);
}
