//! Workspace symbol table.
//!
//! The table is an arena of scopes and symbols built once from every parsed
//! file before lowering starts and read-only afterwards. It supports:
//!
//! - One root scope per file and one body scope per structure
//! - Structure and alias symbols keyed by name within their scope
//! - Field lookup for element references (`Point.x`)
//! - Include bindings on root scopes, validated eagerly
//! - Lookup of public top-level types across files for global references
//!
//! Symbols and scopes are addressed by index. Structure references in the
//! lowered tree carry statement ids, which the table maps back to symbols.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use rustc_hash::FxHashMap;
use schema_ast::{
    element::ElementId,
    errors::{Diagnostic, DiagnosticKind},
    identifier::{Identifier, Visibility},
    position::Range,
    statements::{IncludeStatement, ItemStatement, RootStatement, Statement, StructureStatement},
    types::ParseType,
};
use tracing::trace;

pub type FileId = u32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SymbolId(u32);

/// The parse stage output of one file.
///
/// The file at index `i` of the slice handed to the table must have been
/// built with ordinal `i`.
#[derive(Clone, Debug)]
pub struct ParsedFile {
    pub path: Arc<Path>,
    pub root: Result<Arc<RootStatement<ParseType>>, Diagnostic>,
}

#[derive(Clone, Debug)]
pub enum SymbolKind {
    Structure {
        statement: Arc<StructureStatement<ParseType>>,
        body: ScopeId,
    },
    Alias {
        statement: Arc<ItemStatement<ParseType>>,
    },
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Identifier,
    pub file: FileId,
    /// The scope the symbol is defined in, where its bases or aliased type
    /// are resolved.
    pub scope: ScopeId,
    pub kind: SymbolKind,
}

impl Symbol {
    #[must_use]
    pub fn statement_id(&self) -> ElementId {
        match &self.kind {
            SymbolKind::Structure { statement, .. } => statement.id,
            SymbolKind::Alias { statement } => statement.id,
        }
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.name.visibility() == Visibility::Public
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    types: FxHashMap<String, SymbolId>,
    fields: FxHashMap<String, Arc<ItemStatement<ParseType>>>,
    /// Include bindings; only populated on root scopes.
    imports: FxHashMap<String, Import>,
}

/// A name bound by an include, with the range that bound it.
#[derive(Debug)]
struct Import {
    symbol: SymbolId,
    range: Range,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            types: FxHashMap::default(),
            fields: FxHashMap::default(),
            imports: FxHashMap::default(),
        }
    }
}

#[derive(Debug)]
struct FileEntry {
    path: Arc<Path>,
    root: Option<ScopeId>,
    failure: Option<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    files: Vec<FileEntry>,
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    by_path: FxHashMap<PathBuf, FileId>,
    by_statement: FxHashMap<ElementId, SymbolId>,
    include_errors: FxHashMap<FileId, Diagnostic>,
}

impl SymbolTable {
    /// Declares every scope and symbol of `files`, then binds includes.
    #[must_use]
    pub fn build(files: &[ParsedFile]) -> Self {
        let mut table = SymbolTable::default();
        for (index, file) in files.iter().enumerate() {
            let file_id = FileId::try_from(index).unwrap_or(FileId::MAX);
            table.by_path.insert(file.path.to_path_buf(), file_id);
            let (root, failure) = match &file.root {
                Ok(root) => {
                    let scope = table.add_scope(None);
                    table.declare(file_id, scope, &root.statements);
                    (Some(scope), None)
                }
                Err(diagnostic) => (None, Some(diagnostic.clone())),
            };
            table.files.push(FileEntry {
                path: file.path.clone(),
                root,
                failure,
            });
        }
        for (index, file) in files.iter().enumerate() {
            let Ok(root) = &file.root else {
                continue;
            };
            let file_id = FileId::try_from(index).unwrap_or(FileId::MAX);
            for include in root.includes() {
                if let Err(diagnostic) = table.bind_include(file_id, include) {
                    table.include_errors.entry(file_id).or_insert(diagnostic);
                    break;
                }
            }
        }
        trace!(
            files = table.files.len(),
            scopes = table.scopes.len(),
            symbols = table.symbols.len(),
            "symbol table built"
        );
        table
    }

    fn add_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope::new(parent));
        id
    }

    fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX));
        self.by_statement.insert(symbol.statement_id(), id);
        self.scopes[symbol.scope.0 as usize]
            .types
            .insert(symbol.name.name().to_string(), id);
        self.symbols.push(symbol);
        id
    }

    fn declare(&mut self, file: FileId, scope: ScopeId, statements: &[Statement<ParseType>]) {
        for statement in statements {
            match statement {
                Statement::Structure(structure) => {
                    let body = self.add_scope(Some(scope));
                    self.add_symbol(Symbol {
                        name: structure.name.clone(),
                        file,
                        scope,
                        kind: SymbolKind::Structure {
                            statement: structure.clone(),
                            body,
                        },
                    });
                    self.declare(file, body, &structure.children);
                }
                Statement::Item(item) if item.is_alias() => {
                    self.add_symbol(Symbol {
                        name: item.name.clone(),
                        file,
                        scope,
                        kind: SymbolKind::Alias {
                            statement: item.clone(),
                        },
                    });
                }
                Statement::Item(item) => {
                    self.scopes[scope.0 as usize]
                        .fields
                        .insert(item.name.name().to_string(), item.clone());
                }
                Statement::Extension(_) | Statement::Include(_) => {}
            }
        }
    }

    fn bind_include(&mut self, file: FileId, include: &IncludeStatement) -> Result<(), Diagnostic> {
        let target_path = include.target_path();
        let Some(&target) = self.by_path.get(&target_path) else {
            return Err(Diagnostic::new(
                DiagnosticKind::IncludeFileNotFound { path: target_path },
                include.filename_range.clone(),
            ));
        };
        let entry = &self.files[target as usize];
        let Some(target_root) = entry.root else {
            let mut diagnostic = Diagnostic::new(
                DiagnosticKind::IncludedFileFailed { path: target_path },
                include.filename_range.clone(),
            );
            if let Some(failure) = &entry.failure {
                diagnostic = diagnostic.with_context(failure.primary_range().clone());
            }
            return Err(diagnostic);
        };

        let mut bindings = Vec::new();
        if include.is_star() {
            let scope = &self.scopes[target_root.0 as usize];
            let mut public: Vec<(&String, &SymbolId)> = scope
                .types
                .iter()
                .filter(|(_, symbol)| self.symbols[symbol.0 as usize].is_public())
                .collect();
            public.sort_by(|a, b| a.0.cmp(b.0));
            bindings.extend(
                public
                    .into_iter()
                    .map(|(name, symbol)| (name.clone(), *symbol, include.filename_range.clone())),
            );
        }
        for item in &include.items {
            let scope = &self.scopes[target_root.0 as usize];
            let name = item.element.name();
            let Some(&symbol) = scope.types.get(name) else {
                let kind = if item.element.is_expression() || scope.fields.contains_key(name) {
                    DiagnosticKind::ImportedElementNotAType {
                        name: name.to_string(),
                    }
                } else {
                    DiagnosticKind::UnknownType {
                        name: name.to_string(),
                    }
                };
                return Err(Diagnostic::new(kind, item.element.range.clone()));
            };
            if !self.symbols[symbol.0 as usize].is_public() {
                return Err(Diagnostic::new(
                    DiagnosticKind::ImportedElementNotPublic {
                        name: name.to_string(),
                    },
                    item.element.range.clone(),
                ));
            }
            bindings.push((
                item.reference.name().to_string(),
                symbol,
                item.reference.range.clone(),
            ));
        }

        let Some(root) = self.files[file as usize].root else {
            return Ok(());
        };
        for (name, symbol, range) in bindings {
            if let Some(first) = self.first_binding(root, &name, symbol) {
                return Err(Diagnostic::with_chain(
                    DiagnosticKind::DuplicateName { name },
                    first,
                    [range],
                ));
            }
            self.scopes[root.0 as usize]
                .imports
                .entry(name)
                .or_insert(Import { symbol, range });
        }
        Ok(())
    }

    /// The range of an earlier definition or include binding of `name` in
    /// `root` that names something other than `symbol`.
    fn first_binding(&self, root: ScopeId, name: &str, symbol: SymbolId) -> Option<Range> {
        let scope = &self.scopes[root.0 as usize];
        if let Some(&local) = scope.types.get(name) {
            return (local != symbol).then(|| self.symbols[local.0 as usize].name.range.clone());
        }
        scope
            .imports
            .get(name)
            .filter(|import| import.symbol != symbol)
            .map(|import| import.range.clone())
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn file_path(&self, file: FileId) -> Option<&Arc<Path>> {
        self.files.get(file as usize).map(|entry| &entry.path)
    }

    #[must_use]
    pub fn root_scope(&self, file: FileId) -> Option<ScopeId> {
        self.files.get(file as usize).and_then(|entry| entry.root)
    }

    /// The first include failure of `file`, if any.
    #[must_use]
    pub fn include_error(&self, file: FileId) -> Option<&Diagnostic> {
        self.include_errors.get(&file)
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    /// The symbol defined by the statement with `id`.
    #[must_use]
    pub fn symbol_of(&self, id: ElementId) -> Option<SymbolId> {
        self.by_statement.get(&id).copied()
    }

    /// Looks `name` up from `scope` outwards. Root scopes also consult
    /// their include bindings, which never clash with their own definitions.
    #[must_use]
    pub fn lookup_type(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0 as usize];
            if let Some(symbol) = scope.types.get(name) {
                return Some(*symbol);
            }
            if scope.parent.is_none()
                && let Some(import) = scope.imports.get(name)
            {
                return Some(import.symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// A type defined directly inside `structure`.
    #[must_use]
    pub fn member_type(&self, structure: SymbolId, name: &str) -> Option<SymbolId> {
        match &self.symbol(structure).kind {
            SymbolKind::Structure { body, .. } => {
                self.scopes[body.0 as usize].types.get(name).copied()
            }
            SymbolKind::Alias { .. } => None,
        }
    }

    /// A field defined directly inside `structure`, with the scope its type
    /// is resolved in.
    #[must_use]
    pub fn member_field(
        &self,
        structure: SymbolId,
        name: &str,
    ) -> Option<(&Arc<ItemStatement<ParseType>>, ScopeId)> {
        match &self.symbol(structure).kind {
            SymbolKind::Structure { body, .. } => self.scopes[body.0 as usize]
                .fields
                .get(name)
                .map(|field| (field, *body)),
            SymbolKind::Alias { .. } => None,
        }
    }

    /// Public top-level types called `name` in every file except `exclude`,
    /// in file order.
    #[must_use]
    pub fn global_candidates(&self, exclude: FileId, name: &str) -> Vec<SymbolId> {
        self.files
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != exclude as usize)
            .filter_map(|(_, entry)| entry.root)
            .filter_map(|root| self.scopes[root.0 as usize].types.get(name).copied())
            .filter(|symbol| self.symbol(*symbol).is_public())
            .collect()
    }
}
