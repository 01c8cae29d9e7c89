//! Raw parse trees handed over by the grammar engine.
//!
//! The grammar itself lives outside this crate. It produces, per file, a
//! list of untyped [`RawStatement`]s with `(line, column)` spans; the
//! builder turns them into validated statements.

use std::path::Path;

use crate::errors::Diagnostic;

/// A `(line, column)` span as reported by the grammar engine. Coordinates
/// are validated when the span is converted into a [`crate::position::Range`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RawSpan {
    pub begin: (u32, u32),
    pub end: (u32, u32),
}

impl RawSpan {
    #[must_use]
    pub fn new(begin: (u32, u32), end: (u32, u32)) -> Self {
        Self { begin, end }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RawIdentifier {
    pub span: RawSpan,
    pub text: String,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RawExpressionKind {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Tuple(Vec<RawExpression>),
    List(Vec<RawExpression>),
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawExpression {
    pub span: RawSpan,
    pub kind: RawExpressionKind,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawMetadataItem {
    pub span: RawSpan,
    pub name: RawIdentifier,
    pub value: RawExpression,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawMetadata {
    pub span: RawSpan,
    pub items: Vec<RawMetadataItem>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawCardinality {
    pub span: RawSpan,
    pub min: Option<(RawSpan, i64)>,
    pub max: Option<(RawSpan, i64)>,
    pub metadata: Option<RawMetadata>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RawTypeKind {
    /// `Name`, `Outer.Inner`, `::Global` or `Structure.field`.
    Reference {
        segments: Vec<RawIdentifier>,
        is_global: bool,
        is_element_reference: bool,
    },
    Tuple(Vec<RawType>),
    Variant(Vec<RawType>),
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawType {
    pub span: RawSpan,
    pub kind: RawTypeKind,
    pub cardinality: Option<RawCardinality>,
    pub metadata: Option<RawMetadata>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawKeywordArgument {
    pub span: RawSpan,
    pub name: RawIdentifier,
    pub value: RawExpression,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawIncludeItem {
    pub span: RawSpan,
    pub element: RawIdentifier,
    pub reference: Option<RawIdentifier>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RawStatementKind {
    Item {
        name: RawIdentifier,
        ty: RawType,
    },
    Structure {
        name: RawIdentifier,
        bases: Vec<RawType>,
        metadata: Option<RawMetadata>,
        children: Vec<RawStatement>,
    },
    Extension {
        name: RawIdentifier,
        positional_args: Vec<RawExpression>,
        keyword_args: Vec<RawKeywordArgument>,
    },
    Include {
        filename: (RawSpan, String),
        items: Vec<RawIncludeItem>,
    },
    /// Only valid as the implicit top level; rejected when nested.
    Root { statements: Vec<RawStatement> },
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawStatement {
    pub span: RawSpan,
    pub kind: RawStatementKind,
}

/// The external grammar engine.
///
/// Implementations must be callable from several worker threads at once
/// unless the pipeline runs single-threaded.
pub trait Grammar: Sync {
    /// Parses the content of one file.
    ///
    /// # Errors
    ///
    /// Returns a diagnostic for syntax errors.
    fn parse(&self, path: &Path, content: &str) -> Result<Vec<RawStatement>, Diagnostic>;
}

impl<F> Grammar for F
where
    F: Fn(&Path, &str) -> Result<Vec<RawStatement>, Diagnostic> + Sync,
{
    fn parse(&self, path: &Path, content: &str) -> Result<Vec<RawStatement>, Diagnostic> {
        self(path, content)
    }
}
