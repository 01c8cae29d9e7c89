use std::path::Path;

use schema_ast::{errors::DiagnosticKind, types::TypeKind};

use crate::utils::{
    FixtureGrammar, compile_fixtures, compile_single, item, item_type, reference, structure,
    tuple, variant, with_cardinality,
};

#[test]
fn test_element_reference_copies_the_field_type() {
    let root = compile_single(vec![
        structure(
            1,
            "Point",
            vec![],
            vec![item(2, "x", with_cardinality(reference(2, 8, "Integer"), Some(0), Some(1)))],
        ),
        item(3, "column", reference(3, 12, "Point.x")),
    ])
    .unwrap();
    let column = item_type(&root, 1);
    assert!(matches!(column.kind, TypeKind::Fundamental(_)));
    assert_eq!(column.range.begin().line(), 3);
    assert!(column.cardinality.is_single());
}

#[test]
fn test_element_reference_to_unknown_field() {
    let error = compile_single(vec![
        structure(1, "Point", vec![], vec![]),
        item(2, "column", reference(2, 12, "Point.z")),
    ])
    .unwrap_err();
    assert!(matches!(
        error.kind(),
        DiagnosticKind::UnknownType { name } if name == "z"
    ));
}

#[test]
fn test_global_reference_searches_other_files() {
    let grammar = FixtureGrammar::default()
        .with("ws/main.schema", vec![item(1, "shared", reference(1, 10, "::Shared"))])
        .with("ws/local.schema", vec![item(1, "shared", reference(1, 10, "Shared"))])
        .with("ws/defs.schema", vec![structure(1, "Shared", vec![], vec![])]);
    let lowered = compile_fixtures(&grammar);
    assert!(lowered.root("ws", "main.schema").is_some());
    assert!(matches!(
        lowered
            .errors()
            .get(Path::new("ws/local.schema"))
            .map(|error| error.kind()),
        Some(DiagnosticKind::UnknownType { .. })
    ));
}

#[test]
fn test_ambiguous_global_reference() {
    let grammar = FixtureGrammar::default()
        .with("ws/main.schema", vec![item(1, "shared", reference(1, 10, "::Shared"))])
        .with("ws/one.schema", vec![structure(1, "Shared", vec![], vec![])])
        .with("ws/two.schema", vec![structure(1, "Shared", vec![], vec![])]);
    let lowered = compile_fixtures(&grammar);
    let error = &lowered.errors()[Path::new("ws/main.schema")];
    assert!(matches!(error.kind(), DiagnosticKind::AmbiguousTypeReference { .. }));
    let files: Vec<&Path> = error.ranges()[1..]
        .iter()
        .map(|range| range.file().as_ref())
        .collect();
    assert_eq!(files, [Path::new("ws/one.schema"), Path::new("ws/two.schema")]);
}

#[test]
fn test_local_definition_wins_over_global() {
    let root = compile_single(vec![
        structure(1, "Shared", vec![], vec![]),
        item(2, "shared", reference(2, 10, "::Shared")),
    ])
    .unwrap();
    assert!(item_type(&root, 1).as_structure().is_some());
}

#[test]
fn test_base_type_combinations() {
    assert!(
        compile_single(vec![
            structure(1, "A", vec![], vec![]),
            structure(2, "B", vec![], vec![]),
            structure(3, "Both", vec![reference(3, 8, "A"), reference(3, 12, "B")], vec![]),
            structure(4, "Wrapped", vec![reference(4, 11, "Integer")], vec![]),
        ])
        .is_ok()
    );

    let error = compile_single(vec![
        structure(1, "A", vec![], vec![]),
        structure(2, "Mixed", vec![reference(2, 8, "A"), reference(2, 12, "Integer")], vec![]),
    ])
    .unwrap_err();
    assert!(matches!(
        error.kind(),
        DiagnosticKind::InvalidBaseTypeCombination { name } if name == "Mixed"
    ));

    let error = compile_single(vec![structure(
        1,
        "Numbers",
        vec![reference(1, 8, "Integer"), reference(1, 18, "Number")],
        vec![],
    )])
    .unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::InvalidBaseTypeCombination { .. }));
}

#[test]
fn test_variant_alias_inside_variant_is_rejected() {
    let error = compile_single(vec![
        item(1, "Choice", variant(1, 10, vec![reference(1, 11, "Integer"), reference(1, 21, "String")])),
        item(2, "Renamed", reference(2, 11, "Choice")),
        item(3, "value", variant(3, 9, vec![reference(3, 10, "Renamed"), reference(3, 20, "Boolean")])),
    ])
    .unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::NestedVariantNotSupported));
    assert_eq!(error.primary_range().begin().line(), 3);
    assert_eq!(error.primary_range().begin().column(), 10);
}

#[test]
fn test_tuple_alias_inside_variant_is_accepted() {
    let root = compile_single(vec![
        item(1, "Pair", tuple(1, 8, vec![reference(1, 9, "Integer"), reference(1, 19, "String")])),
        item(2, "value", variant(2, 9, vec![reference(2, 10, "Pair"), reference(2, 20, "Boolean")])),
    ])
    .unwrap();
    assert!(matches!(item_type(&root, 1).kind, TypeKind::Variant(ref members) if members.len() == 2));
}
