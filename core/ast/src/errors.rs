//! Diagnostics.
//!
//! Every failure the compiler reports is a [`Diagnostic`]: a [`DiagnosticKind`]
//! plus one or more source ranges. The first range is the most specific one;
//! ranges appended while a diagnostic travels outwards (alias chains, include
//! chains) follow it.

use core::fmt;
use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use thiserror::Error;

use crate::position::Range;

#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
pub enum DiagnosticKind {
    // Syntactic validity
    #[error("`{value}` is not a valid identifier")]
    InvalidIdentifier { value: String },

    #[error("`{name}` is not a valid type name")]
    ExpectedTypeName { name: String },

    #[error("`{name}` is a reserved fundamental type name")]
    ReservedTypeName { name: String },

    #[error("invalid cardinality [{min}, {}]", max.map_or_else(|| "*".to_string(), |m| m.to_string()))]
    InvalidCardinality { min: i64, max: Option<i64> },

    #[error("metadata cannot be associated with single elements")]
    MetadataOnSingleElement,

    #[error("the metadata item `{name}` was already provided")]
    DuplicateMetadataItem { name: String },

    #[error("the keyword argument `{name}` was already provided")]
    DuplicateKeywordArgument { name: String },

    #[error("{kind} types must contain at least one element type")]
    EmptyTupleOrVariant { kind: &'static str },

    #[error("nested variant types are not supported")]
    NestedVariantNotSupported,

    #[error("root statements cannot be nested")]
    NestedRootStatement,

    #[error("include statements are only valid at the root of a file")]
    InvalidIncludePlacement,

    #[error("invalid `{constraint}` constraint for `{type_name}`: {reason}")]
    InvalidConstraint {
        type_name: &'static str,
        constraint: String,
        reason: String,
    },

    #[error("`{name}` is already defined in this scope")]
    DuplicateName { name: String },

    #[error("{message}")]
    Grammar { message: String },

    #[error("the content of `{}` could not be read: {reason}", path.display())]
    UnreadableContent { path: PathBuf, reason: String },

    // Resolution
    #[error("the type `{name}` was not found")]
    UnknownType { name: String },

    #[error("the type `{name}` is private and not accessible")]
    PrivateTypeNotAccessible { name: String },

    #[error("the type `{name}` is protected and not accessible")]
    ProtectedTypeNotAccessible { name: String },

    #[error("a cycle was detected while resolving `{name}`")]
    CircularTypeReference { name: String },

    #[error("the base types of `{name}` must be a single fundamental or structure type, or only structure types")]
    InvalidBaseTypeCombination { name: String },

    #[error("the included file `{}` does not exist", path.display())]
    IncludeFileNotFound { path: PathBuf },

    #[error("the included file `{}` could not be processed", path.display())]
    IncludedFileFailed { path: PathBuf },

    #[error("the included element `{name}` is not public")]
    ImportedElementNotPublic { name: String },

    #[error("the included element `{name}` is not a type")]
    ImportedElementNotAType { name: String },

    #[error("the type `{name}` is ambiguous")]
    AmbiguousTypeReference { name: String },

    #[error("`{}` is not part of the symbol table", path.display())]
    FileNotInSymbolTable { path: PathBuf },

    // Conversion
    #[error("{expected} was expected, found {found}")]
    InvalidExpressionKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is less than {min}")]
    ValueTooSmall { value: String, min: String },

    #[error("{value} is greater than {max}")]
    ValueTooLarge { value: String, max: String },

    #[error("{value} does not fit in {bits} bits")]
    ValueOutOfBits { value: String, bits: u8 },

    #[error("{length} characters were found, at least {min_length} are required")]
    StringTooShort { length: usize, min_length: usize },

    #[error("{length} characters were found, at most {max_length} are allowed")]
    StringTooLong { length: usize, max_length: usize },

    #[error("`{value}` does not match the pattern `{pattern}`")]
    PatternMismatch { value: String, pattern: String },

    #[error("`{value}` is not a valid {type_name}: {reason}")]
    InvalidValue {
        type_name: &'static str,
        value: String,
        reason: String,
    },

    #[error("`{}` does not exist", path.display())]
    PathNotFound { path: PathBuf },

    #[error("not enough tuple values were provided: expected {expected}, found {found}")]
    NotEnoughTupleValues { expected: usize, found: usize },

    #[error("too many tuple values were provided: expected {expected}, found {found}")]
    TooManyTupleValues { expected: usize, found: usize },

    #[error("the value does not match any alternative of `{type_name}`")]
    NoVariantAlternativeMatched { type_name: String },

    #[error("{found} values were provided, but the cardinality is {expected}")]
    CardinalityMismatch { expected: String, found: usize },

    #[error("values of `{type_name}` cannot be created from literals")]
    UnsupportedExpression { type_name: String },
}

/// A diagnostic message anchored at one or more source ranges.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[must_use = "diagnostics must not be silently ignored"]
pub struct Diagnostic {
    kind: DiagnosticKind,
    ranges: Vec<Range>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, range: Range) -> Self {
        Self {
            kind,
            ranges: vec![range],
        }
    }

    /// Creates a diagnostic anchored at `first` and followed by `rest`.
    pub fn with_chain(
        kind: DiagnosticKind,
        first: Range,
        rest: impl IntoIterator<Item = Range>,
    ) -> Self {
        let mut ranges = vec![first];
        ranges.extend(rest);
        Self { kind, ranges }
    }

    /// Appends an outer context range.
    pub fn with_context(mut self, range: Range) -> Self {
        self.ranges.push(range);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    #[must_use]
    pub fn primary_range(&self) -> &Range {
        &self.ranges[0]
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.ranges.as_slice() {
            [range] => write!(f, "{} ({range})", self.kind),
            ranges => {
                writeln!(f, "{}", self.kind)?;
                for range in ranges {
                    write!(f, "\n    - {range}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Diagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
