//! Module scopes, imports, and exports.

mod common;

use ambit_scope::{AnalyzeError, DefinitionType, Options, ScopeType, analyze};
use ambit_scope::estree::from_estree;
use common::*;
use serde_json::json;

fn import_decl(specifiers: serde_json::Value, source: &str) -> serde_json::Value {
    json!({"type": "ImportDeclaration", "specifiers": specifiers, "source": str_lit(source)})
}

fn named_specifier(imported: &str, local: &str) -> serde_json::Value {
    json!({"type": "ImportSpecifier", "imported": ident(imported), "local": ident(local)})
}

#[test]
fn module_programs_get_a_strict_module_scope() {
    let a = run(module(json!([simple_decl("let", "x", lit(json!(1)))])));
    let g = a.global();
    let module_scope = a.child(g, 0);

    assert_eq!(a.manager.scope(module_scope).scope_type(), ScopeType::Module);
    assert!(a.manager.scope(module_scope).is_strict);
    assert_eq!(a.variable_names(module_scope), ["x"]);
    assert!(a.variable_names(g).is_empty());
}

#[test]
fn import_forms_define_local_bindings() {
    let a = run(module(json!([
        import_decl(json!([{"type": "ImportDefaultSpecifier", "local": ident("dflt")}]), "m"),
        import_decl(json!([{"type": "ImportNamespaceSpecifier", "local": ident("ns")}]), "m"),
        import_decl(json!([named_specifier("orig", "renamed"), named_specifier("same", "same")]), "m"),
    ])));
    let module_scope = a.child(a.global(), 0);

    assert_eq!(a.variable_names(module_scope), ["dflt", "ns", "renamed", "same"]);
    for name in ["dflt", "ns", "renamed", "same"] {
        let variable = a.manager.variable(a.variable(module_scope, name));
        assert_eq!(variable.defs[0].definition_type(), DefinitionType::ImportBinding);
    }

    // Imported names and module sources are opaque: no references at all.
    assert!(a.reference_names(module_scope).is_empty());

    // The declaration statement reports its bindings.
    assert_eq!(a.manager.get_declared_variables(a.stmt(2)).len(), 2);
}

#[test]
fn import_outside_a_module_is_an_error() {
    let source = program(json!([import_decl(
        json!([{"type": "ImportDefaultSpecifier", "local": ident("x")}]),
        "m"
    )]));
    let (arena, root) = from_estree(&source).unwrap();
    let err = analyze(&arena, root, &Options::default()).unwrap_err();
    assert_eq!(err, AnalyzeError::ImportOutsideModule);
}

#[test]
fn local_exports_read_the_local_binding() {
    let a = run(module(json!([
        simple_decl("let", "x", lit(json!(1))),
        {
            "type": "ExportNamedDeclaration",
            "declaration": null,
            "specifiers": [{"type": "ExportSpecifier", "local": ident("x"), "exported": ident("y")}],
            "source": null
        }
    ])));
    let module_scope = a.child(a.global(), 0);

    // One write (the init), one read (the export).
    assert_eq!(a.reference_names(module_scope), ["x", "x"]);
    let export_read = a.manager.reference(a.reference(module_scope, 1));
    assert!(export_read.is_read_only());
    assert_eq!(export_read.resolved, Some(a.variable(module_scope, "x")));
}

#[test]
fn reexports_from_another_module_touch_nothing() {
    let a = run(module(json!([{
        "type": "ExportNamedDeclaration",
        "declaration": null,
        "specifiers": [{"type": "ExportSpecifier", "local": ident("x"), "exported": ident("x")}],
        "source": str_lit("other")
    }])));
    let module_scope = a.child(a.global(), 0);
    assert!(a.reference_names(module_scope).is_empty());
    assert!(a.through_names(module_scope).is_empty());
}

#[test]
fn exported_declarations_are_ordinary_declarations() {
    let a = run(module(json!([{
        "type": "ExportNamedDeclaration",
        "declaration": func_decl("f", json!([]), json!([])),
        "specifiers": [],
        "source": null
    }])));
    let module_scope = a.child(a.global(), 0);
    assert_eq!(a.variable_names(module_scope), ["f"]);
}

#[test]
fn export_default_expression_is_visited() {
    let a = run(module(json!([
        simple_decl("const", "x", lit(json!(1))),
        {"type": "ExportDefaultDeclaration", "declaration": ident("x")}
    ])));
    let module_scope = a.child(a.global(), 0);
    // init write + default-export read
    assert_eq!(a.reference_names(module_scope), ["x", "x"]);
    let read = a.manager.reference(a.reference(module_scope, 1));
    assert_eq!(read.resolved, Some(a.variable(module_scope, "x")));
}

#[test]
fn export_all_touches_nothing() {
    let a = run(module(json!([{
        "type": "ExportAllDeclaration", "declaration": null, "specifiers": [], "source": str_lit("m")
    }])));
    let module_scope = a.child(a.global(), 0);
    assert!(a.reference_names(module_scope).is_empty());
}
