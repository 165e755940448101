//! Implicit globals: sloppy-mode assignment to undeclared names.

mod common;

use ambit_scope::DefinitionType;
use common::*;
use serde_json::json;

#[test]
fn undeclared_assignment_synthesizes_an_implicit_global() {
    let a = run(program(json!([expr_stmt(assign("=", ident("x"), lit(json!(1))))])));
    let g = a.global();

    // Not a declared variable.
    assert!(a.variable_names(g).is_empty());

    let implicit = a.manager.scope(g).implicit().unwrap();
    let names: Vec<_> =
        implicit.variables.iter().map(|&v| a.manager.variable(v).name.as_str()).collect();
    assert_eq!(names, ["x"]);

    let record = a.manager.variable(implicit.variables[0]);
    assert_eq!(record.defs.len(), 1);
    assert_eq!(record.defs[0].definition_type(), DefinitionType::ImplicitGlobalVariable);

    // The write itself stays unresolved and escapes the global scope.
    let reference = a.manager.reference(a.reference(g, 0));
    assert!(reference.resolved.is_none());
    assert_eq!(a.through_names(g), ["x"]);
}

#[test]
fn repeated_assignments_synthesize_one_variable() {
    let a = run(program(json!([
        expr_stmt(assign("=", ident("x"), lit(json!(1)))),
        expr_stmt(assign("=", ident("x"), lit(json!(2)))),
    ])));
    let implicit = a.manager.scope(a.global()).implicit().unwrap();
    assert_eq!(implicit.variables.len(), 1);
    assert_eq!(implicit.left.len(), 2);
}

#[test]
fn declared_names_never_become_implicit() {
    let a = run(program(json!([
        simple_decl("var", "x", lit(json!(20))),
        expr_stmt(assign("=", ident("x"), lit(json!(300)))),
    ])));
    let g = a.global();
    assert_eq!(a.variable_names(g), ["x"]);
    assert!(a.manager.scope(g).implicit().unwrap().variables.is_empty());
}

#[test]
fn strict_mode_suppresses_implicit_globals() {
    let a = run(program(json!([
        directive("use strict"),
        expr_stmt(assign("=", ident("x"), lit(json!(1)))),
    ])));
    let g = a.global();
    assert!(a.manager.scope(g).is_strict);
    assert!(a.manager.scope(g).implicit().unwrap().variables.is_empty());
    // The reference still escapes as an ordinary unresolved name.
    assert_eq!(a.through_names(g), ["x"]);
}

#[test]
fn assignment_inside_a_function_leaks_to_global() {
    let a = run(program(json!([func_decl(
        "outer",
        json!([]),
        json!([expr_stmt(assign("=", ident("x"), lit(json!(20))))])
    )])));
    let g = a.global();
    let function = a.child(g, 0);

    assert_eq!(a.variable_names(g), ["outer"]);
    assert_eq!(a.variable_names(function), ["arguments"]);

    let implicit = a.manager.scope(g).implicit().unwrap();
    let names: Vec<_> =
        implicit.variables.iter().map(|&v| a.manager.variable(v).name.as_str()).collect();
    assert_eq!(names, ["x"]);
}

#[test]
fn intervening_var_stops_the_leak() {
    let a = run(program(json!([func_decl(
        "outer",
        json!([]),
        json!([
            func_decl("inner", json!([]), json!([expr_stmt(assign("=", ident("x"), lit(json!(20))))])),
            var_decl("var", json!([declarator(ident("x"))])),
        ])
    )])));
    let g = a.global();
    let outer = a.child(g, 0);

    assert_eq!(a.variable_names(outer), ["arguments", "inner", "x"]);
    assert!(a.manager.scope(g).implicit().unwrap().variables.is_empty());

    // The inner write resolved to outer's var.
    let x = a.variable(outer, "x");
    assert_eq!(a.manager.variable(x).references.len(), 1);
}

#[test]
fn for_in_head_leaks_like_an_assignment() {
    let a = run(program(json!([func_decl(
        "outer",
        json!([]),
        json!([{
            "type": "ForInStatement",
            "left": ident("x"),
            "right": ident("y"),
            "body": block(json!([]))
        }])
    )])));
    let g = a.global();
    let implicit = a.manager.scope(g).implicit().unwrap();
    let names: Vec<_> =
        implicit.variables.iter().map(|&v| a.manager.variable(v).name.as_str()).collect();
    assert_eq!(names, ["x"]);
}
