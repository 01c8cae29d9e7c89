//! Metadata blocks.
//!
//! A metadata block is an ordered set of `name: value` items. Items are
//! keyed by the identifier name, so `a` and `_a` collide.

use indexmap::{IndexMap, map::Entry};

use crate::{
    element_impl,
    errors::{Diagnostic, DiagnosticKind},
    expression::Expression,
    identifier::Identifier,
    position::Range,
};

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct MetadataItem {
    pub range: Range,
    pub name: Identifier,
    pub value: Expression,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct Metadata {
    pub range: Range,
    items: IndexMap<String, MetadataItem>,
}

element_impl!(MetadataItem, Metadata);

impl Metadata {
    /// Compacts `items` into a block, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMetadataItem` anchored at the first item with a
    /// repeated name; the duplicate's range follows it.
    pub fn create(
        range: Range,
        items: impl IntoIterator<Item = MetadataItem>,
    ) -> Result<Self, Diagnostic> {
        let mut map = IndexMap::new();
        for item in items {
            match map.entry(item.name.name().to_string()) {
                Entry::Occupied(first) => {
                    let first: &MetadataItem = first.get();
                    return Err(Diagnostic::with_chain(
                        DiagnosticKind::DuplicateMetadataItem {
                            name: item.name.name().to_string(),
                        },
                        first.name.range.clone(),
                        [item.name.range],
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(item);
                }
            }
        }
        Ok(Self { range, items: map })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetadataItem> {
        self.items.get(name)
    }

    /// Removes and returns the item called `name`, keeping the order of
    /// the remaining items.
    pub fn take(&mut self, name: &str) -> Option<MetadataItem> {
        self.items.shift_remove(name)
    }

    pub fn items(&self) -> impl Iterator<Item = &MetadataItem> {
        self.items.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops the block entirely once every item was consumed.
    #[must_use]
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}
