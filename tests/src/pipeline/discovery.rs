use std::fs;

use schema::{Workspace, compile};
use schema_ast::errors::DiagnosticKind;

use crate::utils::{FixtureGrammar, include, init_tracing, item, reference, single_threaded, structure};

#[test]
fn test_included_files_outside_the_workspace_are_discovered() {
    init_tracing();
    let directory = tempfile::tempdir().unwrap();
    let main = directory.path().join("main.schema");
    let library = directory.path().join("library.schema");
    fs::write(&library, "Shared {}").unwrap();

    let grammar = FixtureGrammar::default()
        .with(
            &main,
            vec![
                include(1, "library.schema", &[("Shared", None)]),
                item(2, "shared", reference(2, 10, "Shared")),
            ],
        )
        .with(&library, vec![structure(1, "Shared", vec![], vec![])]);
    let workspace = Workspace::new().with_file(directory.path(), "main.schema", "");

    let lowered = compile(&grammar, &workspace, &single_threaded()).unwrap();
    assert!(lowered.is_success(), "{:?}", lowered.errors());
    assert!(lowered.root(directory.path(), "main.schema").is_some());
    assert!(lowered.root(directory.path(), "library.schema").is_some());
    assert_eq!(lowered.structure_count(), 1);
}

#[test]
fn test_missing_include_is_not_discovered() {
    init_tracing();
    let directory = tempfile::tempdir().unwrap();
    let main = directory.path().join("main.schema");
    let grammar = FixtureGrammar::default()
        .with(&main, vec![include(1, "absent.schema", &[])]);
    let workspace = Workspace::new().with_file(directory.path(), "main.schema", "");

    let lowered = compile(&grammar, &workspace, &single_threaded()).unwrap();
    assert_eq!(lowered.errors().len(), 1);
    assert!(lowered.errors().contains_key(&main));
}

#[test]
fn test_unreadable_discovered_file_fails_on_its_own() {
    init_tracing();
    let directory = tempfile::tempdir().unwrap();
    let main = directory.path().join("main.schema");
    let library = directory.path().join("library.schema");
    let other = directory.path().join("other.schema");
    fs::write(&library, [0xff, 0xfe, 0xfd]).unwrap();

    let grammar = FixtureGrammar::default()
        .with(&main, vec![include(1, "library.schema", &[])])
        .with(&other, vec![structure(1, "Other", vec![], vec![])])
        .with(&library, vec![structure(1, "Shared", vec![], vec![])]);
    let workspace = Workspace::new()
        .with_file(directory.path(), "main.schema", "")
        .with_file(directory.path(), "other.schema", "");

    let lowered = compile(&grammar, &workspace, &single_threaded()).unwrap();
    assert!(lowered.root(directory.path(), "other.schema").is_some());
    assert!(matches!(
        lowered.errors().get(&library).map(|error| error.kind()),
        Some(DiagnosticKind::UnreadableContent { .. })
    ));
    assert!(matches!(
        lowered.errors().get(&main).map(|error| error.kind()),
        Some(DiagnosticKind::IncludedFileFailed { .. })
    ));
}
