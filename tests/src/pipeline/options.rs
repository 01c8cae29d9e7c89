use std::path::Path;

use anyhow::anyhow;
use schema::{ExecutionOptions, SchemaError, SourceContent, Workspace, compile, lower, parse};
use schema_ast::errors::DiagnosticKind;

use crate::utils::{FixtureGrammar, SYNTAX_ERROR, init_tracing, item, reference, single_threaded};

fn one_broken_file() -> FixtureGrammar {
    FixtureGrammar::default().with("ws/main.schema", vec![item(1, "x", reference(1, 5, "Nowhere"))])
}

#[test]
fn test_single_failure_is_raised_by_default() {
    init_tracing();
    let grammar = one_broken_file();
    let options = ExecutionOptions::default().with_single_threaded(true);
    let error = compile(&grammar, &grammar.workspace(), &options).unwrap_err();
    let diagnostic = error.as_diagnostic().unwrap();
    assert!(matches!(diagnostic.kind(), DiagnosticKind::UnknownType { .. }));
}

#[test]
fn test_single_failure_is_kept_when_not_raising() {
    init_tracing();
    let grammar = one_broken_file();
    let lowered = compile(&grammar, &grammar.workspace(), &single_threaded()).unwrap();
    assert_eq!(lowered.errors().len(), 1);
    assert!(lowered.errors().contains_key(Path::new("ws/main.schema")));
}

#[test]
fn test_two_failures_are_never_raised() {
    init_tracing();
    let grammar = one_broken_file()
        .with("ws/other.schema", vec![item(1, "y", reference(1, 5, "Nowhere"))]);
    let options = ExecutionOptions::default()
        .with_single_threaded(true)
        .with_quiet(true);
    let lowered = compile(&grammar, &grammar.workspace(), &options).unwrap();
    assert_eq!(lowered.errors().len(), 2);
}

#[test]
fn test_zero_threads_is_an_infrastructure_error() {
    let grammar = one_broken_file();
    let options = ExecutionOptions::default().with_max_num_threads(Some(0));
    let error = compile(&grammar, &grammar.workspace(), &options).unwrap_err();
    assert!(matches!(error, SchemaError::Infrastructure(_)));
    assert!(error.to_string().contains("max_num_threads"));
}

#[test]
fn test_lazy_content() {
    init_tracing();
    let grammar = FixtureGrammar::default()
        .with("ws/lazy.schema", vec![item(1, "x", reference(1, 5, "Integer"))]);

    let workspace = Workspace::new().with_file(
        "ws",
        "lazy.schema",
        SourceContent::lazy(|| Ok("x: Integer".to_string())),
    );
    let lowered = compile(&grammar, &workspace, &single_threaded()).unwrap();
    assert!(lowered.root("ws", "lazy.schema").is_some());
}

#[test]
fn test_unreadable_content_fails_only_its_file() {
    init_tracing();
    let grammar = FixtureGrammar::default()
        .with("ws/good.schema", vec![item(1, "x", reference(1, 5, "Integer"))])
        .with("ws/lazy.schema", vec![item(1, "y", reference(1, 5, "Integer"))]);
    let workspace = Workspace::new()
        .with_file("ws", "good.schema", "")
        .with_file(
            "ws",
            "lazy.schema",
            SourceContent::lazy(|| Err(anyhow!("storage offline"))),
        );

    let lowered = compile(&grammar, &workspace, &single_threaded()).unwrap();
    assert!(lowered.root("ws", "good.schema").is_some());
    assert_eq!(lowered.errors().len(), 1);
    let error = &lowered.errors()[Path::new("ws/lazy.schema")];
    assert!(matches!(
        error.kind(),
        DiagnosticKind::UnreadableContent { reason, .. } if reason.contains("storage offline")
    ));
    assert_eq!(error.primary_range().begin().line(), 1);

    let options = ExecutionOptions::default().with_single_threaded(true);
    let error = compile(&grammar, &workspace, &options).unwrap_err();
    assert!(matches!(
        error.as_diagnostic().map(|diagnostic| diagnostic.kind()),
        Some(DiagnosticKind::UnreadableContent { .. })
    ));
}

#[test]
fn test_stages_can_run_separately() {
    init_tracing();
    let grammar = FixtureGrammar::default()
        .with("ws/good.schema", vec![item(1, "x", reference(1, 5, "Integer"))])
        .with("ws/bad.schema", vec![]);
    let workspace = Workspace::new()
        .with_file("ws", "good.schema", "")
        .with_file("ws", "bad.schema", SYNTAX_ERROR);

    let parsed = parse(&grammar, &workspace, &single_threaded()).unwrap();
    assert_eq!(parsed.len(), 2);
    let failures: Vec<&Path> = parsed.failures().map(|(path, _)| path).collect();
    assert_eq!(failures, [Path::new("ws/bad.schema")]);

    let table = schema_lowering::SymbolTable::build(parsed.files());
    assert_eq!(table.file_count(), 2);
    assert!(table.root_scope(0).is_none());
    assert!(table.root_scope(1).is_some());

    let lowered = lower(&parsed, &single_threaded()).unwrap();
    assert!(lowered.root("ws", "good.schema").is_some());
    assert!(matches!(
        lowered.errors()[Path::new("ws/bad.schema")].kind(),
        DiagnosticKind::Grammar { .. }
    ));
}
