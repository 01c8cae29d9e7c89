use schema_ast::errors::DiagnosticKind;

use crate::utils::{compile_single, item, reference, structure};

#[test]
fn test_structure_lists_itself_as_base() {
    let error = compile_single(vec![structure(1, "Foo", vec![reference(1, 8, "Foo")], vec![])])
        .unwrap_err();
    assert!(matches!(
        error.kind(),
        DiagnosticKind::CircularTypeReference { name } if name == "Foo"
    ));
    assert_eq!(error.ranges().len(), 1);
}

#[test]
fn test_transitive_base_cycles() {
    for depth in 2..=5_u32 {
        let names: Vec<String> = (0..depth).map(|index| format!("S{index}")).collect();
        let statements = (0..depth)
            .map(|index| {
                let base = &names[((index + 1) % depth) as usize];
                structure(index + 1, &names[index as usize], vec![reference(index + 1, 8, base)], vec![])
            })
            .collect();
        let error = compile_single(statements).unwrap_err();
        assert!(
            matches!(error.kind(), DiagnosticKind::CircularTypeReference { .. }),
            "depth {depth}"
        );
        assert_eq!(error.ranges().len(), depth as usize, "depth {depth}");
    }
}

#[test]
fn test_mutual_aliases_report_two_ranges() {
    let error = compile_single(vec![
        item(1, "A", reference(1, 5, "B")),
        item(2, "B", reference(2, 5, "A")),
    ])
    .unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::CircularTypeReference { .. }));
    assert_eq!(error.ranges().len(), 2);
    let rendered = error.to_string();
    assert!(rendered.starts_with("a cycle was detected while resolving `A`\n\n    - "));
    assert_eq!(rendered.matches("\n    - ").count(), 2);
}

#[test]
fn test_cycle_through_tuple_member() {
    let error = compile_single(vec![
        item(
            1,
            "Pair",
            crate::utils::tuple(1, 8, vec![reference(1, 9, "Integer"), reference(1, 18, "Pair")]),
        ),
    ])
    .unwrap_err();
    assert!(matches!(error.kind(), DiagnosticKind::CircularTypeReference { .. }));
}

#[test]
fn test_self_referencing_fields_are_not_cycles() {
    let root = compile_single(vec![structure(
        1,
        "Node",
        vec![],
        vec![item(
            2,
            "next",
            crate::utils::with_cardinality(reference(2, 8, "Node"), Some(0), Some(1)),
        )],
    )]);
    assert!(root.is_ok());
}
