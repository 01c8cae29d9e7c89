use std::{path::Path, sync::Arc};

use schema_ast::{
    cardinality::Cardinality,
    errors::DiagnosticKind,
    expression::{Expression, ExpressionKind, IntegerLiteral},
    identifier::Identifier,
    metadata::{Metadata, MetadataItem},
    position::Range,
};

fn range(column: u32) -> Range {
    Range::from_coordinates(Arc::from(Path::new("c.schema")), (1, column), (1, column + 1)).unwrap()
}

fn literal(column: u32, value: i64) -> Option<IntegerLiteral> {
    Some(IntegerLiteral::new(range(column), value))
}

fn classifications(cardinality: &Cardinality) -> [bool; 5] {
    [
        cardinality.is_single(),
        cardinality.is_optional(),
        cardinality.is_zero_or_more(),
        cardinality.is_one_or_more(),
        cardinality.is_collection(),
    ]
}

fn metadata() -> Metadata {
    Metadata::create(
        range(30),
        [MetadataItem {
            range: range(30),
            name: Identifier::parse(range(30), "description").unwrap(),
            value: Expression::new(range(34), ExpressionKind::String("ids".to_string())),
        }],
    )
    .unwrap()
}

#[test]
fn test_classifications_are_exclusive_and_exhaustive() {
    // Every `min <= max` pair is accepted except `[0, 0]`, which admits no element.
    let empty = Cardinality::create(range(1), literal(2, 0), literal(5, 0), None).unwrap_err();
    assert!(matches!(empty.kind(), DiagnosticKind::InvalidCardinality { .. }));

    for min in 0..4 {
        for max in (min.max(1)..6).map(Some).chain([None]) {
            let cardinality =
                Cardinality::create(range(1), literal(2, min), max.and_then(|m| literal(5, m)), None)
                    .unwrap();
            let set = classifications(&cardinality)
                .iter()
                .filter(|flag| **flag)
                .count();
            let single_like = cardinality.is_single() || cardinality.is_optional();
            assert!(
                set >= 1,
                "[{min}, {max:?}] must have a classification"
            );
            assert!(
                single_like != cardinality.is_collection(),
                "[{min}, {max:?}] is either single-like or a collection"
            );
            assert!(!(cardinality.is_single() && cardinality.is_optional()));
        }
    }
}

#[test]
fn test_max_below_min_references_max() {
    let error = Cardinality::create(range(1), literal(2, 3), literal(7, 2), None).unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::InvalidCardinality { .. }));
    assert_eq!(error.primary_range(), &range(7));
}

#[test]
fn test_negative_bound_is_rejected() {
    let error = Cardinality::create(range(1), literal(2, -1), None, None).unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::InvalidCardinality { .. }));
}

#[test]
fn test_metadata_on_single_element_fails() {
    let error = Cardinality::create(range(1), None, None, Some(metadata())).unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::MetadataOnSingleElement));

    let collection = Cardinality::create(range(1), literal(2, 0), None, Some(metadata())).unwrap();
    assert_eq!(collection.metadata().map(Metadata::len), Some(1));
}

#[test]
fn test_display_suffixes() {
    let render = |min: Option<i64>, max: Option<i64>| {
        Cardinality::create(
            range(1),
            min.and_then(|m| literal(2, m)),
            max.and_then(|m| literal(5, m)),
            None,
        )
        .unwrap()
        .to_string()
    };
    assert_eq!(render(None, None), "");
    assert_eq!(render(Some(0), Some(1)), "?");
    assert_eq!(render(Some(0), None), "*");
    assert_eq!(render(Some(1), None), "+");
    assert_eq!(render(Some(3), Some(3)), "[3]");
    assert_eq!(render(Some(2), Some(5)), "[2, 5]");
    assert_eq!(render(Some(2), None), "[2+]");
}
