use std::sync::Arc;

use schema_ast::{
    errors::DiagnosticKind,
    fundamental::FundamentalType,
    raw::RawExpressionKind,
    statements::{ItemStatement, StructureStatement},
    types::TypeKind,
    visitor::{VisitControl, Visitor, walk_root},
};

use crate::utils::{
    FixtureGrammar, compile_fixtures, compile_single, item, metadata_item, reference, structure,
    structure_with_metadata,
};

#[derive(Default)]
struct Census<'ast> {
    structures: Vec<&'ast Arc<StructureStatement>>,
    items: Vec<&'ast Arc<ItemStatement>>,
}

impl<'ast> Visitor<'ast> for Census<'ast> {
    fn on_structure(&mut self, structure: &'ast Arc<StructureStatement>) -> VisitControl {
        self.structures.push(structure);
        VisitControl::Continue
    }

    fn on_item(&mut self, item: &'ast Arc<ItemStatement>) -> VisitControl {
        self.items.push(item);
        VisitControl::Continue
    }
}

#[test]
fn test_simple_structure_lowers_cleanly() {
    let grammar = FixtureGrammar::default().with(
        "ws/point.schema",
        vec![structure(
            1,
            "Point",
            vec![],
            vec![
                item(2, "x", reference(2, 8, "Integer")),
                item(3, "y", reference(3, 8, "Integer")),
            ],
        )],
    );
    let lowered = compile_fixtures(&grammar);
    assert!(lowered.errors().is_empty());

    let root = lowered.root("ws", "point.schema").unwrap();
    let mut census = Census::default();
    let _ = walk_root(&mut census, root);
    assert_eq!(census.structures.len(), 1);
    assert_eq!(census.structures[0].name.name(), "Point");
    assert_eq!(census.items.len(), 2);
    for field in &census.items {
        assert!(matches!(
            field.ty.kind,
            TypeKind::Fundamental(FundamentalType::Integer(_))
        ));
    }
}

#[test]
fn test_mutually_based_structures_report_a_cycle() {
    let error = compile_single(vec![
        structure(1, "A", vec![reference(1, 5, "B")], vec![]),
        structure(2, "B", vec![reference(2, 5, "A")], vec![]),
    ])
    .unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::CircularTypeReference { .. }));
    assert_eq!(error.ranges().len(), 2);
}

#[test]
fn test_duplicate_metadata_points_at_first_occurrence() {
    let error = compile_single(vec![structure_with_metadata(
        1,
        "Foo",
        vec![
            metadata_item(1, 7, "a", RawExpressionKind::Integer(1)),
            metadata_item(1, 13, "a", RawExpressionKind::Integer(2)),
        ],
        vec![],
    )])
    .unwrap_err();
    assert!(matches!(
        error.kind(),
        DiagnosticKind::DuplicateMetadataItem { name } if name == "a"
    ));
    assert_eq!(error.primary_range().begin().column(), 7);
}

#[test]
fn test_failures_do_not_stop_other_files() {
    let grammar = FixtureGrammar::default()
        .with("ws/good.schema", vec![structure(1, "Good", vec![], vec![])])
        .with("ws/bad.schema", vec![item(1, "value", reference(1, 9, "Missing"))]);
    let lowered = compile_fixtures(&grammar);
    assert!(lowered.root("ws", "good.schema").is_some());
    assert!(lowered.root("ws", "bad.schema").is_none());
    assert_eq!(lowered.errors().len(), 1);
    assert!(!lowered.is_success());
}
