use std::{path::Path, sync::Arc};

use schema_ast::{
    errors::DiagnosticKind,
    identifier::{Identifier, Visibility},
    position::Range,
};

fn range() -> Range {
    Range::from_coordinates(Arc::from(Path::new("id.schema")), (1, 1), (1, 10)).unwrap()
}

#[test]
fn test_identifier_classification() {
    let ty = Identifier::parse(range(), "Foo").unwrap();
    assert!(ty.is_type());
    assert!(!ty.is_expression());

    let value = Identifier::parse(range(), "foo").unwrap();
    assert!(value.is_expression());
    assert!(!value.is_type());
}

#[test]
fn test_classification_is_idempotent() {
    let first = Identifier::parse(range(), "_Foo").unwrap();
    let second = Identifier::parse(range(), first.value()).unwrap();
    assert_eq!(first.is_type(), second.is_type());
    assert_eq!(first.visibility(), second.visibility());
    assert_eq!(first.name(), second.name());
}

#[test]
fn test_invalid_identifiers() {
    for text in ["_", "", "9abc", "@@"] {
        let error = Identifier::parse(range(), text).unwrap_err();
        assert!(
            matches!(error.kind(), DiagnosticKind::InvalidIdentifier { .. }),
            "{text:?} should be rejected"
        );
    }
}

#[test]
fn test_visibility_markers() {
    let cases = [
        ("Point", Visibility::Public),
        ("_Point", Visibility::Protected),
        ("@point", Visibility::Protected),
        ("__Point", Visibility::Private),
        ("$&point", Visibility::Private),
    ];
    for (text, visibility) in cases {
        let identifier = Identifier::parse(range(), text).unwrap();
        assert_eq!(identifier.visibility(), visibility, "{text}");
        assert_eq!(identifier.value(), text);
    }
    assert_eq!(Identifier::parse(range(), "__Point").unwrap().name(), "Point");
}
