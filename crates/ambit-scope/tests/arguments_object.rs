//! The automatic `arguments` binding of ordinary functions.

mod common;

use ambit_scope::ScopeType;
use common::*;
use serde_json::json;

#[test]
fn arguments_is_materialized_and_resolvable() {
    let a = run(program(json!([expr_stmt(call(
        func_expr(None, json!([]), json!([expr_stmt(ident("arguments"))])),
        json!([])
    ))])));
    let g = a.global();
    assert_eq!(a.manager.scopes().len(), 2);
    assert!(a.variable_names(g).is_empty());
    assert!(a.reference_names(g).is_empty());

    let function = a.child(g, 0);
    assert_eq!(a.manager.scope(function).scope_type(), ScopeType::Function);
    assert_eq!(a.variable_names(function), ["arguments"]);
    assert_eq!(a.reference_names(function), ["arguments"]);

    let reference = a.manager.reference(a.reference(function, 0));
    assert_eq!(reference.resolved, Some(a.variable(function, "arguments")));

    // Pre-tainted so shadowing and use are observable without special
    // cases downstream.
    assert_eq!(a.manager.scope(function).taints.get("arguments"), Some(&true));
}

#[test]
fn arguments_has_no_defining_occurrence() {
    let a = run(program(json!([func_decl("f", json!([]), json!([]))])));
    let function = a.child(a.global(), 0);
    let arguments = a.manager.variable(a.variable(function, "arguments"));
    assert!(arguments.defs.is_empty());
    assert!(arguments.identifiers.is_empty());
}

#[test]
fn a_parameter_named_arguments_shadows_into_the_same_variable() {
    let a = run(program(json!([func_decl("f", json!([ident("arguments")]), json!([]))])));
    let function = a.child(a.global(), 0);
    assert_eq!(a.variable_names(function), ["arguments"]);
    let arguments = a.manager.variable(a.variable(function, "arguments"));
    assert_eq!(arguments.defs.len(), 1, "the parameter definition lands on the automatic variable");
}

#[test]
fn arrows_never_materialize_arguments() {
    let a = run(program(json!([expr_stmt(arrow(
        json!([]),
        block(json!([expr_stmt(ident("arguments"))]))
    ))])));
    let g = a.global();
    let function = a.child(g, 0);
    assert!(a.variable_names(function).is_empty());

    // The use escapes all the way out instead.
    assert_eq!(a.through_names(function), ["arguments"]);
    assert_eq!(a.through_names(g), ["arguments"]);
}
