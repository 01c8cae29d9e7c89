//! Repetition ranges.

use core::fmt;
use std::fmt::{Display, Formatter};

use crate::{
    element_impl,
    errors::{Diagnostic, DiagnosticKind},
    expression::IntegerLiteral,
    metadata::Metadata,
    position::Range,
};

/// A validated `[min, max]` repetition range; `max == None` is unbounded.
///
/// Every cardinality is exactly one of single (`[1, 1]`), optional
/// (`[0, 1]`) or collection (upper bound above one, or unbounded).
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct Cardinality {
    pub range: Range,
    min: IntegerLiteral,
    max: Option<IntegerLiteral>,
    metadata: Option<Metadata>,
}

element_impl!(Cardinality);

impl Cardinality {
    /// Builds a cardinality from optional bounds.
    ///
    /// Both bounds omitted means `[1, 1]`, an omitted `min` is 0 and an
    /// omitted `max` is unbounded.
    ///
    /// # Errors
    ///
    /// - `InvalidCardinality` for a negative bound, a zero upper bound or
    ///   `max < min`, anchored at the offending bound
    /// - `MetadataOnSingleElement` when non-empty metadata is attached to `[1, 1]`
    pub fn create(
        range: Range,
        min: Option<IntegerLiteral>,
        max: Option<IntegerLiteral>,
        metadata: Option<Metadata>,
    ) -> Result<Self, Diagnostic> {
        let (min, max) = match (min, max) {
            (None, None) => (
                IntegerLiteral::new(range.clone(), 1),
                Some(IntegerLiteral::new(range.clone(), 1)),
            ),
            (None, Some(max)) => (IntegerLiteral::new(range.clone(), 0), Some(max)),
            (Some(min), max) => (min, max),
        };

        let invalid = |at: &IntegerLiteral| {
            Diagnostic::new(
                DiagnosticKind::InvalidCardinality {
                    min: min.value,
                    max: max.as_ref().map(|m| m.value),
                },
                at.range.clone(),
            )
        };
        if min.value < 0 {
            return Err(invalid(&min));
        }
        if let Some(max_literal) = &max
            && (max_literal.value < min.value || max_literal.value == 0)
        {
            return Err(invalid(max_literal));
        }

        let metadata = metadata.and_then(Metadata::non_empty);
        let cardinality = Self {
            range,
            min,
            max,
            metadata,
        };
        if cardinality.is_single()
            && let Some(metadata) = &cardinality.metadata
        {
            return Err(Diagnostic::new(
                DiagnosticKind::MetadataOnSingleElement,
                metadata.range.clone(),
            ));
        }
        Ok(cardinality)
    }

    /// The implicit `[1, 1]` cardinality, anchored at the element it is
    /// created for.
    pub fn default_at(range: Range) -> Self {
        Self {
            min: IntegerLiteral::new(range.clone(), 1),
            max: Some(IntegerLiteral::new(range.clone(), 1)),
            range,
            metadata: None,
        }
    }

    #[must_use]
    pub fn min(&self) -> &IntegerLiteral {
        &self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<&IntegerLiteral> {
        self.max.as_ref()
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    fn bounds(&self) -> (i64, Option<i64>) {
        (self.min.value, self.max.as_ref().map(|m| m.value))
    }

    #[must_use]
    pub fn is_single(&self) -> bool {
        self.bounds() == (1, Some(1))
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.bounds() == (0, Some(1))
    }

    #[must_use]
    pub fn is_zero_or_more(&self) -> bool {
        self.bounds() == (0, None)
    }

    #[must_use]
    pub fn is_one_or_more(&self) -> bool {
        self.bounds() == (1, None)
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.max.as_ref().is_none_or(|max| max.value > 1)
    }

    /// Returns `true` if `count` values satisfy the bounds.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        count >= self.min.value && self.max.as_ref().is_none_or(|max| count <= max.value)
    }

    /// Bounds rendered as `[min, max]`, with `*` for an unbounded maximum.
    #[must_use]
    pub fn bounds_text(&self) -> String {
        match &self.max {
            Some(max) => format!("[{}, {}]", self.min, max),
            None => format!("[{}, *]", self.min),
        }
    }
}

/// Renders the suffix used in type names: nothing for single elements,
/// `?`, `*`, `+`, `[n]` or `[min, max]` otherwise.
impl Display for Cardinality {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            (1, Some(1)) => Ok(()),
            (0, Some(1)) => write!(f, "?"),
            (0, None) => write!(f, "*"),
            (1, None) => write!(f, "+"),
            (min, Some(max)) if min == max => write!(f, "[{min}]"),
            (min, Some(max)) => write!(f, "[{min}, {max}]"),
            (min, None) => write!(f, "[{min}+]"),
        }
    }
}
