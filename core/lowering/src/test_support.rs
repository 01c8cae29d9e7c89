//! Raw statement constructors for unit tests.

use std::{path::Path, sync::Arc};

use schema_ast::{
    builder::build_root,
    raw::{
        RawIdentifier, RawIncludeItem, RawSpan, RawStatement, RawStatementKind, RawType,
        RawTypeKind,
    },
};

use crate::symbol_table::ParsedFile;

/// A span covering `line`; `column` tells references on the same line apart.
pub fn span(line: u32, column: u32) -> RawSpan {
    RawSpan::new((line, column), (line, column + 10))
}

pub fn ident(line: u32, column: u32, text: &str) -> RawIdentifier {
    RawIdentifier {
        span: span(line, column),
        text: text.to_string(),
    }
}

/// A reference such as `Point`, `Outer.Inner` or `::Shared`. A trailing
/// lowercase segment makes it an element reference.
pub fn reference(line: u32, column: u32, path: &str) -> RawType {
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

pub fn variant(line: u32, column: u32, members: Vec<RawType>) -> RawType {
    RawType {
        span: span(line, column),
        kind: RawTypeKind::Variant(members),
        cardinality: None,
        metadata: None,
    }
}

pub fn item(line: u32, name: &str, ty: RawType) -> RawStatement {
    RawStatement {
        span: span(line, 1),
        kind: RawStatementKind::Item {
            name: ident(line, 1, name),
            ty,
        },
    }
}

pub fn structure(
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

pub fn include(line: u32, filename: &str, items: &[&str]) -> RawStatement {
    RawStatement {
        span: span(line, 1),
        kind: RawStatementKind::Include {
            filename: (span(line, 1), filename.to_string()),
            items: items
                .iter()
                .map(|item| RawIncludeItem {
                    span: span(line, 1),
                    element: ident(line, 1, item),
                    reference: None,
                })
                .collect(),
        },
    }
}

pub fn parsed(ordinal: u32, path: &str, statements: Vec<RawStatement>) -> ParsedFile {
    let path: Arc<Path> = Arc::from(Path::new(path));
    ParsedFile {
        root: build_root(path.clone(), ordinal, statements).map(Arc::new),
        path,
    }
}
