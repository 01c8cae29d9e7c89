use std::{
    path::{Path, PathBuf},
    sync::{Arc, Once},
};

use rustc_hash::FxHashMap;
use schema::{ExecutionOptions, LoweredWorkspace, SchemaError, Workspace, compile};
use schema_ast::{
    errors::{Diagnostic, DiagnosticKind},
    position::Range,
    raw::{
        Grammar, RawCardinality, RawExpression, RawExpressionKind, RawIdentifier, RawIncludeItem,
        RawMetadata, RawMetadataItem, RawSpan, RawStatement, RawStatementKind, RawType,
        RawTypeKind,
    },
    statements::{RootStatement, Statement},
    types::Type,
};

/// Content that makes [`FixtureGrammar`] report a syntax error.
pub(crate) const SYNTAX_ERROR: &str = "<syntax error>";

pub(crate) fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Grammar stand-in that hands out prepared raw statements by path.
#[derive(Default)]
pub(crate) struct FixtureGrammar {
    files: FxHashMap<PathBuf, Vec<RawStatement>>,
}

impl FixtureGrammar {
    pub(crate) fn with(mut self, path: impl Into<PathBuf>, statements: Vec<RawStatement>) -> Self {
        self.files.insert(path.into(), statements);
        self
    }

    /// A workspace listing every fixture with placeholder content.
    pub(crate) fn workspace(&self) -> Workspace {
        let mut workspace = Workspace::new();
        for path in self.files.keys() {
            let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let file = path.file_name().map(PathBuf::from).unwrap_or_default();
            workspace.add_file(directory, file, "");
        }
        workspace
    }
}

impl Grammar for FixtureGrammar {
    fn parse(&self, path: &Path, content: &str) -> Result<Vec<RawStatement>, Diagnostic> {
        let syntax_error = |message: &str| {
            Diagnostic::new(
                DiagnosticKind::Grammar {
                    message: message.to_string(),
                },
                Range::file_start(Arc::from(path)),
            )
        };
        if content == SYNTAX_ERROR {
            return Err(syntax_error("unexpected token"));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| syntax_error("no fixture for this file"))
    }
}

pub(crate) fn single_threaded() -> ExecutionOptions {
    ExecutionOptions::default()
        .with_single_threaded(true)
        .with_raise_if_single_exception(false)
}

/// Compiles every fixture of `grammar` on the calling thread and keeps
/// per-file failures in the result.
pub(crate) fn compile_fixtures(grammar: &FixtureGrammar) -> LoweredWorkspace {
    init_tracing();
    match compile(grammar, &grammar.workspace(), &single_threaded()) {
        Ok(lowered) => lowered,
        Err(error) => panic!("pipeline failed: {error}"),
    }
}

/// Compiles a single fixture file and returns its root or its diagnostic.
pub(crate) fn compile_single(statements: Vec<RawStatement>) -> Result<Arc<RootStatement>, Diagnostic> {
    init_tracing();
    let grammar = FixtureGrammar::default().with("ws/main.schema", statements);
    let options = ExecutionOptions::default().with_single_threaded(true);
    match compile(&grammar, &grammar.workspace(), &options) {
        Ok(lowered) => Ok(lowered
            .root("ws", "main.schema")
            .cloned()
            .unwrap_or_else(|| panic!("missing root"))),
        Err(SchemaError::Diagnostic(diagnostic)) => Err(diagnostic),
        Err(error) => panic!("pipeline failed: {error}"),
    }
}

pub(crate) fn item_type(root: &RootStatement, index: usize) -> &Type {
    match &root.statements[index] {
        Statement::Item(item) => &item.ty,
        other => panic!("expected an item, found {other:?}"),
    }
}

// Raw tree constructors. Spans use explicit `(line, column)` coordinates so
// diagnostics can be checked against them.

pub(crate) fn span(line: u32, column: u32) -> RawSpan {
    RawSpan::new((line, column), (line, column + 8))
}

pub(crate) fn ident(line: u32, column: u32, text: &str) -> RawIdentifier {
    RawIdentifier {
        span: span(line, column),
        text: text.to_string(),
    }
}

/// `Name`, `Outer.Inner`, `::Global` or `Structure.field` (a trailing
/// lowercase segment makes an element reference).
pub(crate) fn reference(line: u32, column: u32, path: &str) -> RawType {
    let (is_global, path) = match path.strip_prefix("::") {
        Some(rest) => (true, rest),
        None => (false, path),
    };
    let segments: Vec<RawIdentifier> = path
        .split('.')
        .map(|segment| ident(line, column, segment))
        .collect();
    let is_element_reference = segments.len() > 1
        && segments
            .last()
            .is_some_and(|last| last.text.starts_with(|c: char| c.is_ascii_lowercase()));
    RawType {
        span: span(line, column),
        kind: RawTypeKind::Reference {
            segments,
            is_global,
            is_element_reference,
        },
        cardinality: None,
        metadata: None,
    }
}

pub(crate) fn tuple(line: u32, column: u32, members: Vec<RawType>) -> RawType {
    RawType {
        span: span(line, column),
        kind: RawTypeKind::Tuple(members),
        cardinality: None,
        metadata: None,
    }
}

pub(crate) fn variant(line: u32, column: u32, members: Vec<RawType>) -> RawType {
    RawType {
        span: span(line, column),
        kind: RawTypeKind::Variant(members),
        cardinality: None,
        metadata: None,
    }
}

pub(crate) fn with_cardinality(mut ty: RawType, min: Option<i64>, max: Option<i64>) -> RawType {
    let (line, column) = ty.span.end;
    ty.cardinality = Some(RawCardinality {
        span: span(line, column),
        min: min.map(|min| (span(line, column + 1), min)),
        max: max.map(|max| (span(line, column + 3), max)),
        metadata: None,
    });
    ty
}

pub(crate) fn with_metadata(mut ty: RawType, items: Vec<RawMetadataItem>) -> RawType {
    let (line, column) = ty.span.end;
    ty.metadata = Some(RawMetadata {
        span: span(line, column),
        items,
    });
    ty
}

pub(crate) fn metadata_item(
    line: u32,
    column: u32,
    name: &str,
    value: RawExpressionKind,
) -> RawMetadataItem {
    RawMetadataItem {
        span: span(line, column),
        name: ident(line, column, name),
        value: RawExpression {
            span: span(line, column + 4),
            kind: value,
        },
    }
}

pub(crate) fn item(line: u32, name: &str, ty: RawType) -> RawStatement {
    RawStatement {
        span: span(line, 1),
        kind: RawStatementKind::Item {
            name: ident(line, 1, name),
            ty,
        },
    }
}

pub(crate) fn structure(
    line: u32,
    name: &str,
    bases: Vec<RawType>,
    children: Vec<RawStatement>,
) -> RawStatement {
    RawStatement {
        span: span(line, 1),
        kind: RawStatementKind::Structure {
            name: ident(line, 1, name),
            bases,
            metadata: None,
            children,
        },
    }
}

pub(crate) fn structure_with_metadata(
    line: u32,
    name: &str,
    metadata: Vec<RawMetadataItem>,
    children: Vec<RawStatement>,
) -> RawStatement {
    RawStatement {
        span: span(line, 1),
        kind: RawStatementKind::Structure {
            name: ident(line, 1, name),
            bases: vec![],
            metadata: Some(RawMetadata {
                span: span(line, 5),
                items: metadata,
            }),
            children,
        },
    }
}

/// `include "filename"` with the listed elements, or every public type when
/// `items` is empty. `("Point", Some("Location"))` renames on import.
pub(crate) fn include(line: u32, filename: &str, items: &[(&str, Option<&str>)]) -> RawStatement {
    RawStatement {
        span: span(line, 1),
        kind: RawStatementKind::Include {
            filename: (span(line, 9), filename.to_string()),
            items: items
                .iter()
                .enumerate()
                .map(|(index, (element, reference))| {
                    let column = 20 + u32::try_from(index).unwrap_or(0) * 10;
                    RawIncludeItem {
                        span: span(line, column),
                        element: ident(line, column, element),
                        reference: reference.map(|reference| ident(line, column + 5, reference)),
                    }
                })
                .collect(),
        },
    }
}
