use core::fmt;
use std::fmt::{Display, Formatter};

use crate::{element_impl, position::Range};

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub enum ExpressionKind {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Tuple(Vec<Expression>),
    List(Vec<Expression>),
}

/// A literal value as written in the source.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct Expression {
    pub range: Range,
    pub kind: ExpressionKind,
}

element_impl!(Expression, IntegerLiteral);

impl Expression {
    #[must_use]
    pub fn new(range: Range, kind: ExpressionKind) -> Self {
        Self { range, kind }
    }

    /// Article-qualified name of the literal kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ExpressionKind::Boolean(_) => "a boolean",
            ExpressionKind::Integer(_) => "an integer",
            ExpressionKind::Number(_) => "a number",
            ExpressionKind::String(_) => "a string",
            ExpressionKind::Tuple(_) => "a tuple",
            ExpressionKind::List(_) => "a list",
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self.kind {
            ExpressionKind::Integer(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::String(value) => Some(value),
            _ => None,
        }
    }
}

pub(crate) fn write_quoted(f: &mut Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in value.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

pub(crate) fn write_sequence<T: Display>(
    f: &mut Formatter<'_>,
    open: &str,
    close: &str,
    values: &[T],
) -> fmt::Result {
    write!(f, "{open}")?;
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value}")?;
    }
    write!(f, "{close}")
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Boolean(value) => write!(f, "{value}"),
            ExpressionKind::Integer(value) => write!(f, "{value}"),
            ExpressionKind::Number(value) => write!(f, "{value}"),
            ExpressionKind::String(value) => write_quoted(f, value),
            ExpressionKind::Tuple(values) => write_sequence(f, "(", ")", values),
            ExpressionKind::List(values) => write_sequence(f, "[", "]", values),
        }
    }
}

/// An integer literal with its own range, used for cardinality bounds.
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize)]
pub struct IntegerLiteral {
    pub range: Range,
    pub value: i64,
}

impl IntegerLiteral {
    #[must_use]
    pub fn new(range: Range, value: i64) -> Self {
        Self { range, value }
    }
}

impl Display for IntegerLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
