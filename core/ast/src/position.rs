//! Source coordinates.
//!
//! A [`Location`] is a one-based `(line, column)` pair and a [`Range`] is a
//! file plus an ordered pair of locations. Both are immutable once built and
//! the constructors reject values that break their invariants.

use core::fmt;
use std::{
    fmt::{Display, Formatter},
    path::Path,
    sync::Arc,
};

use thiserror::Error;

/// Errors raised when a position value breaks its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum PositionError {
    #[error("line must be >= 1, found {line}")]
    InvalidLine { line: u32 },

    #[error("column must be >= 1, found {column}")]
    InvalidColumn { column: u32 },

    #[error("range end {end} precedes range begin {begin}")]
    EndBeforeBegin { begin: Location, end: Location },
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize)]
pub struct Location {
    line: u32,
    column: u32,
}

impl Location {
    /// Creates a location, both coordinates are one-based.
    ///
    /// # Errors
    ///
    /// Returns an error if `line` or `column` is zero.
    pub fn new(line: u32, column: u32) -> Result<Self, PositionError> {
        if line == 0 {
            return Err(PositionError::InvalidLine { line });
        }
        if column == 0 {
            return Err(PositionError::InvalidColumn { column });
        }
        Ok(Self { line, column })
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.line, self.column)
    }
}

/// A span of source text inside one file.
///
/// Ranges order by `(file, begin, end)`, which is the field order below.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize)]
pub struct Range {
    file: Arc<Path>,
    begin: Location,
    end: Location,
}

impl Range {
    /// # Errors
    ///
    /// Returns an error if `end` precedes `begin`.
    pub fn new(file: Arc<Path>, begin: Location, end: Location) -> Result<Self, PositionError> {
        if end < begin {
            return Err(PositionError::EndBeforeBegin { begin, end });
        }
        Ok(Self { file, begin, end })
    }

    /// Convenience constructor from raw coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is zero or the end precedes the begin.
    pub fn from_coordinates(
        file: Arc<Path>,
        begin: (u32, u32),
        end: (u32, u32),
    ) -> Result<Self, PositionError> {
        Self::new(
            file,
            Location::new(begin.0, begin.1)?,
            Location::new(end.0, end.1)?,
        )
    }

    /// The empty range at `[1, 1]`, used when a file has nothing better to
    /// point at.
    #[must_use]
    pub fn file_start(file: Arc<Path>) -> Self {
        let start = Location { line: 1, column: 1 };
        Self {
            file,
            begin: start,
            end: start,
        }
    }

    #[must_use]
    pub fn file(&self) -> &Arc<Path> {
        &self.file
    }

    #[must_use]
    pub fn begin(&self) -> Location {
        self.begin
    }

    #[must_use]
    pub fn end(&self) -> Location {
        self.end
    }

    /// Returns `true` if `other` lies entirely inside this range.
    #[must_use]
    pub fn contains(&self, other: &Range) -> bool {
        self.file == other.file && self.begin <= other.begin && other.end <= self.end
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} <{} -> {}>",
            self.file.display(),
            self.begin,
            self.end
        )
    }
}
