//! The merged result of a pipeline run.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use rustc_hash::FxHashMap;
use schema_ast::{
    element::ElementId,
    errors::Diagnostic,
    statements::{RootStatement, StructureStatement},
    types::{StructureRef, Type},
    visitor::{ElementRef, VisitControl, Visitor, walk_root},
};
use serde::Serialize;

/// Lowered roots keyed by workspace directory then file, next to the
/// diagnostics of the files that failed.
///
/// Every lowered structure is also indexed by id, so the
/// [`StructureRef`] handles found in types resolve without a tree walk.
#[derive(Debug, Default, Serialize)]
pub struct LoweredWorkspace {
    roots: BTreeMap<PathBuf, BTreeMap<PathBuf, Arc<RootStatement>>>,
    errors: BTreeMap<PathBuf, Diagnostic>,
    #[serde(skip)]
    structures: FxHashMap<ElementId, Arc<StructureStatement>>,
}

impl LoweredWorkspace {
    pub(crate) fn insert_root(&mut self, directory: PathBuf, file: PathBuf, root: RootStatement) {
        let root = Arc::new(root);
        let _ = walk_root(
            &mut StructureCollector {
                structures: &mut self.structures,
            },
            &root,
        );
        self.roots.entry(directory).or_default().insert(file, root);
    }

    pub(crate) fn insert_error(&mut self, path: PathBuf, diagnostic: Diagnostic) {
        self.errors.insert(path, diagnostic);
    }

    pub(crate) fn take_single_error(&mut self) -> Option<Diagnostic> {
        if self.errors.len() == 1 {
            self.errors.pop_first().map(|(_, diagnostic)| diagnostic)
        } else {
            None
        }
    }

    #[must_use]
    pub fn roots(&self) -> &BTreeMap<PathBuf, BTreeMap<PathBuf, Arc<RootStatement>>> {
        &self.roots
    }

    #[must_use]
    pub fn root(&self, directory: impl AsRef<Path>, file: impl AsRef<Path>) -> Option<&Arc<RootStatement>> {
        self.roots.get(directory.as_ref())?.get(file.as_ref())
    }

    /// Lowered roots in directory then file order.
    pub fn iter_roots(&self) -> impl Iterator<Item = &Arc<RootStatement>> {
        self.roots.values().flat_map(BTreeMap::values)
    }

    /// Diagnostics keyed by the full path of the failed file.
    #[must_use]
    pub fn errors(&self) -> &BTreeMap<PathBuf, Diagnostic> {
        &self.errors
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn structure(&self, reference: &StructureRef) -> Option<&Arc<StructureStatement>> {
        self.structures.get(&reference.id)
    }

    #[must_use]
    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }
}

/// Indexes every structure statement of a root, nested ones included.
struct StructureCollector<'a> {
    structures: &'a mut FxHashMap<ElementId, Arc<StructureStatement>>,
}

impl<'ast> Visitor<'ast> for StructureCollector<'_> {
    fn on_element_details(&mut self, _element: ElementRef<'ast>) -> VisitControl {
        VisitControl::SkipDetails
    }

    fn on_structure(&mut self, structure: &'ast Arc<StructureStatement>) -> VisitControl {
        self.structures.insert(structure.id, structure.clone());
        VisitControl::Continue
    }

    fn on_type(&mut self, _ty: &'ast Type) -> VisitControl {
        VisitControl::SkipChildren
    }
}
