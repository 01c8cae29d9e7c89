use schema_ast::errors::DiagnosticKind;

use crate::utils::{compile_single, item, reference, structure};

fn nested(inner: &str) -> Vec<schema_ast::raw::RawStatement> {
    vec![
        structure(1, "Outer", vec![], vec![structure(2, inner, vec![], vec![])]),
        item(3, "value", reference(3, 9, "Outer.Inner")),
    ]
}

#[test]
fn test_public_nested_type_is_accessible() {
    assert!(compile_single(nested("Inner")).is_ok());
}

#[test]
fn test_protected_nested_type_is_rejected() {
    let error = compile_single(nested("_Inner")).unwrap_err();
    assert!(matches!(
        error.kind(),
        DiagnosticKind::ProtectedTypeNotAccessible { name } if name == "Inner"
    ));
}

#[test]
fn test_private_nested_type_is_rejected() {
    let error = compile_single(nested("__Inner")).unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::PrivateTypeNotAccessible { .. }));
}

#[test]
fn test_first_segment_ignores_visibility() {
    let root = compile_single(vec![
        structure(1, "_Hidden", vec![], vec![]),
        item(2, "value", reference(2, 9, "Hidden")),
    ]);
    assert!(root.is_ok());
}

#[test]
fn test_nested_types_resolve_from_inner_scopes() {
    let root = compile_single(vec![structure(
        1,
        "Outer",
        vec![],
        vec![
            structure(2, "Inner", vec![], vec![]),
            structure(
                3,
                "Sibling",
                vec![],
                vec![item(4, "inner", reference(4, 9, "Inner"))],
            ),
        ],
    )]);
    assert!(root.is_ok());
}

#[test]
fn test_unknown_segment() {
    let error = compile_single(vec![
        structure(1, "Outer", vec![], vec![]),
        item(2, "value", reference(2, 9, "Outer.Missing")),
    ])
    .unwrap_err();
    assert!(matches!(
        error.kind(),
        DiagnosticKind::UnknownType { name } if name == "Missing"
    ));
    assert_eq!(error.primary_range().begin().line(), 2);
}
