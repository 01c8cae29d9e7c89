//! Base element definitions.
//!
//! Every node of the model implements [`Element`] and therefore owns a
//! [`Range`]. Statements and types additionally implement [`Node`], which
//! gives them an identity that survives lowering.

use core::fmt;
use std::fmt::{Display, Formatter};

use crate::position::Range;

/// Identity of a statement or type node.
///
/// `file` is the ordinal of the source file in the workspace listing and
/// `local` is allocated sequentially while that file is built, starting at 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize)]
pub struct ElementId {
    pub file: u32,
    pub local: u32,
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.local)
    }
}

/// Allocates [`ElementId`]s for one file.
///
/// Allocation is sequential, so building the same file twice yields the
/// same ids no matter which thread does the work.
#[derive(Debug, Clone)]
pub struct ElementIds {
    file: u32,
    next: u32,
}

impl ElementIds {
    #[must_use]
    pub fn new(file: u32) -> Self {
        Self { file, next: 1 }
    }

    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId {
            file: self.file,
            local: self.next,
        };
        self.next += 1;
        id
    }
}

pub trait Element {
    fn range(&self) -> &Range;
}

pub trait Node: Element {
    fn id(&self) -> ElementId;
}

#[macro_export]
macro_rules! element_impl {
    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::element::Element for $name {
                fn range(&self) -> &$crate::position::Range {
                    &self.range
                }
            }
        )+
    };
}

#[macro_export]
macro_rules! node_impl {
    ($($name:ty),+ $(,)?) => {
        $(
            $crate::element_impl!($name);

            impl $crate::element::Node for $name {
                fn id(&self) -> $crate::element::ElementId {
                    self.id
                }
            }
        )+
    };
}
