//! Identifiers and visibility.
//!
//! A raw identifier may start with a run of marker characters (`_`, `@`, `$`,
//! `&`). The number of markers encodes the visibility and the first letter
//! after them decides whether the identifier names a type (uppercase) or a
//! value (lowercase).

use core::fmt;
use std::fmt::{Display, Formatter};

use crate::{
    element_impl,
    errors::{Diagnostic, DiagnosticKind},
    position::Range,
};

const MARKERS: [char; 4] = ['_', '@', '$', '&'];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, serde::Serialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    fn from_marker_count(count: usize) -> Self {
        match count {
            0 => Visibility::Public,
            1 => Visibility::Protected,
            _ => Visibility::Private,
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize)]
pub struct Identifier {
    pub range: Range,
    value: String,
    /// Byte offset of the first character after the marker run.
    #[serde(skip)]
    name_start: usize,
    visibility: Visibility,
}

element_impl!(Identifier);

impl Identifier {
    /// Parses a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if no ASCII letter follows the marker run.
    pub fn parse(range: Range, value: &str) -> Result<Self, Diagnostic> {
        let name_start = value
            .char_indices()
            .find(|(_, c)| !MARKERS.contains(c))
            .map_or(value.len(), |(index, _)| index);
        let starts_with_letter = value[name_start..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter {
            return Err(Diagnostic::new(
                DiagnosticKind::InvalidIdentifier {
                    value: value.to_string(),
                },
                range,
            ));
        }
        Ok(Self {
            range,
            value: value.to_string(),
            name_start,
            visibility: Visibility::from_marker_count(value[..name_start].chars().count()),
        })
    }

    /// Creates an identifier with an explicit visibility, used for names the
    /// compiler derives rather than reads from source.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if `name` does not start with an ASCII letter.
    pub fn with_visibility(
        range: Range,
        name: &str,
        visibility: Visibility,
    ) -> Result<Self, Diagnostic> {
        let mut identifier = Self::parse(range, name)?;
        identifier.value = identifier.name().to_string();
        identifier.name_start = 0;
        identifier.visibility = visibility;
        Ok(identifier)
    }

    /// The identifier text as written, including visibility markers.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The identifier text without visibility markers; used for lookups.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.value[self.name_start..]
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn is_type(&self) -> bool {
        self.name()
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
    }

    #[must_use]
    pub fn is_expression(&self) -> bool {
        !self.is_type()
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
