//! Lowering of parse-generation roots.
//!
//! Each file is lowered independently against the shared, read-only
//! [`SymbolTable`]. Lowering a file:
//!
//! 1. Fails with the file's parse or include diagnostic, if any
//! 2. Resolves every identifier placeholder to a structure reference, an
//!    alias type or, for element references, a copy of the field's type
//! 3. Checks alias and element reference chains for cycles
//! 4. Validates structure bases and checks base chains for cycles
//!
//! Cycle checks keep a stack of `(statement id, reference range)` frames.
//! When a statement is entered twice, the diagnostic carries the range of
//! the repeated reference followed by the ranges of the frames in between,
//! innermost first.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use schema_ast::{
    element::ElementId,
    errors::{Diagnostic, DiagnosticKind},
    identifier::{Identifier, Visibility},
    position::Range,
    statements::{ItemStatement, RootStatement, Statement, StructureStatement},
    types::{
        AliasType, IdentifierReference, ParseType, ParseTypeKind, StructureRef, Type, TypeKind,
        check_members,
    },
};
use tracing::{debug, instrument, trace};

use crate::symbol_table::{FileId, ParsedFile, ScopeId, SymbolId, SymbolKind, SymbolTable};

/// Lowers every file of `files`, in parallel on the current rayon pool when
/// `parallel` is set. The result has one entry per file, in the same order.
#[instrument(skip_all, fields(files = files.len(), parallel))]
pub fn lower_files(
    table: &SymbolTable,
    files: &[ParsedFile],
    parallel: bool,
) -> Vec<Result<RootStatement, Diagnostic>> {
    let lower = |(index, file): (usize, &ParsedFile)| {
        let file_id = FileId::try_from(index).unwrap_or(FileId::MAX);
        let result = lower_file(table, file_id, file);
        match &result {
            Ok(_) => debug!(file = %file.path.display(), "lowered file"),
            Err(diagnostic) => debug!(file = %file.path.display(), %diagnostic, "lowering failed"),
        }
        result
    };
    if parallel {
        files.par_iter().enumerate().map(lower).collect()
    } else {
        files.iter().enumerate().map(lower).collect()
    }
}

/// Lowers one file.
///
/// # Errors
///
/// Returns the file's parse diagnostic, its first include failure, or the
/// first resolution failure met while lowering its statements.
pub fn lower_file(
    table: &SymbolTable,
    file: FileId,
    parsed: &ParsedFile,
) -> Result<RootStatement, Diagnostic> {
    let root = parsed.root.as_ref().map_err(Clone::clone)?;
    if let Some(diagnostic) = table.include_error(file) {
        return Err(diagnostic.clone());
    }
    let scope = table.root_scope(file).ok_or_else(|| {
        Diagnostic::new(
            DiagnosticKind::FileNotInSymbolTable {
                path: parsed.path.to_path_buf(),
            },
            root.range.clone(),
        )
    })?;
    Lowerer::new(table, file).lower_root(root, scope)
}

/// What a reference resolved to.
enum Target<'t> {
    Symbol(SymbolId),
    Field(&'t Arc<ItemStatement<ParseType>>, ScopeId),
}

/// Per-file lowering state. Never shared between workers.
pub struct Lowerer<'t> {
    table: &'t SymbolTable,
    file: FileId,
    stack: Vec<(ElementId, Range)>,
    aliases: FxHashMap<SymbolId, Type>,
    base_stack: Vec<(ElementId, Range)>,
    acyclic: FxHashSet<SymbolId>,
}

impl<'t> Lowerer<'t> {
    #[must_use]
    pub fn new(table: &'t SymbolTable, file: FileId) -> Self {
        Self {
            table,
            file,
            stack: Vec::new(),
            aliases: FxHashMap::default(),
            base_stack: Vec::new(),
            acyclic: FxHashSet::default(),
        }
    }

    /// # Errors
    ///
    /// Returns the first resolution failure.
    pub fn lower_root(
        &mut self,
        root: &RootStatement<ParseType>,
        scope: ScopeId,
    ) -> Result<RootStatement, Diagnostic> {
        Ok(RootStatement {
            range: root.range.clone(),
            statements: self.lower_statements(&root.statements, scope)?,
        })
    }

    fn lower_statements(
        &mut self,
        statements: &[Statement<ParseType>],
        scope: ScopeId,
    ) -> Result<Vec<Statement>, Diagnostic> {
        statements
            .iter()
            .map(|statement| self.lower_statement(statement, scope))
            .collect()
    }

    fn lower_statement(
        &mut self,
        statement: &Statement<ParseType>,
        scope: ScopeId,
    ) -> Result<Statement, Diagnostic> {
        match statement {
            Statement::Item(item) => {
                let ty = match self.table.symbol_of(item.id) {
                    Some(symbol) if item.is_alias() => {
                        self.alias_definition(symbol, item.name.range.clone())?
                    }
                    _ => self.lower_type(&item.ty, scope)?,
                };
                Ok(Statement::Item(Arc::new(ItemStatement {
                    id: item.id,
                    range: item.range.clone(),
                    name: item.name.clone(),
                    ty,
                })))
            }
            Statement::Structure(structure) => {
                let symbol = self
                    .table
                    .symbol_of(structure.id)
                    .ok_or_else(|| unknown(&structure.name))?;
                let SymbolKind::Structure { body, .. } = self.table.symbol(symbol).kind else {
                    return Err(unknown(&structure.name));
                };
                let bases = structure
                    .bases
                    .iter()
                    .map(|base| self.lower_type(base, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                check_base_combination(&structure.name, &bases)?;
                self.check_base_cycles(symbol, structure.name.range.clone())?;
                Ok(Statement::Structure(Arc::new(StructureStatement {
                    id: structure.id,
                    range: structure.range.clone(),
                    name: structure.name.clone(),
                    bases,
                    metadata: structure.metadata.clone(),
                    children: self.lower_statements(&structure.children, body)?,
                })))
            }
            Statement::Extension(extension) => Ok(Statement::Extension(extension.clone())),
            Statement::Include(include) => Ok(Statement::Include(include.clone())),
        }
    }

    fn lower_type(&mut self, ty: &ParseType, scope: ScopeId) -> Result<Type, Diagnostic> {
        let table = self.table;
        let kind = match &ty.kind {
            ParseTypeKind::Fundamental(fundamental) => TypeKind::Fundamental(fundamental.clone()),
            ParseTypeKind::Tuple(members) => TypeKind::Tuple(self.lower_members(members, scope)?),
            ParseTypeKind::Variant(members) => {
                let members = self.lower_members(members, scope)?;
                check_members(&ty.range, true, &members, resolves_to_variant)?;
                TypeKind::Variant(members)
            }
            ParseTypeKind::Identifier(reference) => {
                match self.resolve_reference(reference, &ty.range, scope)? {
                    Target::Symbol(symbol) => {
                        match &table.symbol(symbol).kind {
                            SymbolKind::Structure { statement, .. } => {
                                TypeKind::Structure(StructureRef {
                                    id: statement.id,
                                    name: statement.name.clone(),
                                })
                            }
                            SymbolKind::Alias { statement } => {
                                let name = statement.name.clone();
                                let aliased = self.alias_definition(symbol, ty.range.clone())?;
                                TypeKind::Alias(AliasType {
                                    name,
                                    aliased: Box::new(aliased),
                                })
                            }
                        }
                    }
                    Target::Field(field, field_scope) => {
                        return self.field_type(field, field_scope, ty);
                    }
                }
            }
        };
        Ok(Type {
            id: ty.id,
            range: ty.range.clone(),
            cardinality: ty.cardinality.clone(),
            metadata: ty.metadata.clone(),
            kind,
        })
    }

    fn lower_members(
        &mut self,
        members: &[ParseType],
        scope: ScopeId,
    ) -> Result<Vec<Type>, Diagnostic> {
        members
            .iter()
            .map(|member| self.lower_type(member, scope))
            .collect()
    }

    /// The lowered type an alias stands for, lowered in its defining scope.
    fn alias_definition(&mut self, symbol: SymbolId, via: Range) -> Result<Type, Diagnostic> {
        if let Some(ty) = self.aliases.get(&symbol) {
            return Ok(ty.clone());
        }
        let table = self.table;
        let symbol_info = table.symbol(symbol);
        let SymbolKind::Alias { statement } = &symbol_info.kind else {
            return Err(unknown(&symbol_info.name));
        };
        enter(&mut self.stack, statement.id, &statement.name, via.clone())?;
        let result = self.lower_type(&statement.ty, symbol_info.scope);
        self.stack.pop();
        let ty = result.map_err(|diagnostic| in_context(diagnostic, via))?;
        trace!(alias = %statement.name, "alias lowered");
        self.aliases.insert(symbol, ty.clone());
        Ok(ty)
    }

    /// A copy of the field's lowered type carrying the reference's identity,
    /// range, cardinality and metadata.
    fn field_type(
        &mut self,
        field: &Arc<ItemStatement<ParseType>>,
        scope: ScopeId,
        reference: &ParseType,
    ) -> Result<Type, Diagnostic> {
        enter(&mut self.stack, field.id, &field.name, reference.range.clone())?;
        let result = self.lower_type(&field.ty, scope);
        self.stack.pop();
        let lowered = result.map_err(|diagnostic| in_context(diagnostic, reference.range.clone()))?;
        let mut ty = lowered.clone_with(
            Some(reference.range.clone()),
            Some(reference.cardinality.clone()),
            reference.metadata.clone(),
        );
        ty.id = reference.id;
        Ok(ty)
    }

    fn resolve_reference(
        &self,
        reference: &IdentifierReference,
        range: &Range,
        scope: ScopeId,
    ) -> Result<Target<'t>, Diagnostic> {
        let table = self.table;
        let Some((first, rest)) = reference.segments.split_first() else {
            return Err(Diagnostic::new(
                DiagnosticKind::UnknownType {
                    name: reference.to_string(),
                },
                range.clone(),
            ));
        };
        let mut current = self.resolve_first(first, scope, reference.is_global)?;
        for (index, segment) in rest.iter().enumerate() {
            if !matches!(table.symbol(current).kind, SymbolKind::Structure { .. }) {
                return Err(unknown(segment));
            }
            if reference.is_element_reference && index + 1 == rest.len() {
                let (field, field_scope) = table
                    .member_field(current, segment.name())
                    .ok_or_else(|| unknown(segment))?;
                check_accessible(&field.name, segment)?;
                return Ok(Target::Field(field, field_scope));
            }
            let next = table
                .member_type(current, segment.name())
                .ok_or_else(|| unknown(segment))?;
            check_accessible(&table.symbol(next).name, segment)?;
            current = next;
        }
        Ok(Target::Symbol(current))
    }

    fn resolve_first(
        &self,
        first: &Identifier,
        scope: ScopeId,
        is_global: bool,
    ) -> Result<SymbolId, Diagnostic> {
        if let Some(symbol) = self.table.lookup_type(scope, first.name()) {
            return Ok(symbol);
        }
        if is_global {
            match self.table.global_candidates(self.file, first.name()).as_slice() {
                [] => {}
                [symbol] => return Ok(*symbol),
                candidates => {
                    return Err(Diagnostic::with_chain(
                        DiagnosticKind::AmbiguousTypeReference {
                            name: first.name().to_string(),
                        },
                        first.range.clone(),
                        candidates
                            .iter()
                            .map(|candidate| self.table.symbol(*candidate).name.range.clone()),
                    ));
                }
            }
        }
        Err(unknown(first))
    }

    /// Walks the base chain of `structure` depth first.
    fn check_base_cycles(&mut self, structure: SymbolId, via: Range) -> Result<(), Diagnostic> {
        if self.acyclic.contains(&structure) {
            return Ok(());
        }
        let table = self.table;
        let symbol = table.symbol(structure);
        let SymbolKind::Structure { statement, .. } = &symbol.kind else {
            return Ok(());
        };
        enter(&mut self.base_stack, statement.id, &statement.name, via)?;
        let result = self.check_bases_of(statement, symbol.scope);
        self.base_stack.pop();
        result?;
        self.acyclic.insert(structure);
        Ok(())
    }

    fn check_bases_of(
        &mut self,
        statement: &StructureStatement<ParseType>,
        scope: ScopeId,
    ) -> Result<(), Diagnostic> {
        for base in &statement.bases {
            let lowered = self.lower_type(base, scope)?;
            let Some(structure) = lowered.as_structure() else {
                continue;
            };
            if let Some(target) = self.table.symbol_of(structure.id) {
                self.check_base_cycles(target, base.range.clone())?;
            }
        }
        Ok(())
    }
}

/// Pushes a frame, failing when `id` is already on the stack.
fn enter(
    stack: &mut Vec<(ElementId, Range)>,
    id: ElementId,
    name: &Identifier,
    via: Range,
) -> Result<(), Diagnostic> {
    if let Some(position) = stack.iter().position(|(seen, _)| *seen == id) {
        return Err(Diagnostic::with_chain(
            DiagnosticKind::CircularTypeReference {
                name: name.name().to_string(),
            },
            via,
            stack[position + 1..].iter().rev().map(|(_, range)| range.clone()),
        ));
    }
    stack.push((id, via));
    Ok(())
}

fn in_context(diagnostic: Diagnostic, range: Range) -> Diagnostic {
    match diagnostic.kind() {
        DiagnosticKind::CircularTypeReference { .. } => diagnostic,
        _ if diagnostic.ranges().contains(&range) => diagnostic,
        _ => diagnostic.with_context(range),
    }
}

/// Aliases are transparent, so a member naming a variant alias is as nested
/// as a literal one.
fn resolves_to_variant(kind: &TypeKind) -> bool {
    match kind {
        TypeKind::Alias(alias) => matches!(alias.aliased.resolve().ty.kind, TypeKind::Variant(_)),
        kind => matches!(kind, TypeKind::Variant(_)),
    }
}

fn unknown(identifier: &Identifier) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::UnknownType {
            name: identifier.name().to_string(),
        },
        identifier.range.clone(),
    )
}

/// Non-first segments must name public definitions.
fn check_accessible(definition: &Identifier, segment: &Identifier) -> Result<(), Diagnostic> {
    let kind = match definition.visibility() {
        Visibility::Public => return Ok(()),
        Visibility::Protected => DiagnosticKind::ProtectedTypeNotAccessible {
            name: segment.name().to_string(),
        },
        Visibility::Private => DiagnosticKind::PrivateTypeNotAccessible {
            name: segment.name().to_string(),
        },
    };
    Err(Diagnostic::new(kind, segment.range.clone()))
}

/// A structure derives from nothing, from one fundamental or structure
/// type, or from structures only.
fn check_base_combination(name: &Identifier, bases: &[Type]) -> Result<(), Diagnostic> {
    let resolved: Vec<&Type> = bases.iter().map(|base| base.resolve().ty).collect();
    let valid = match resolved.as_slice() {
        [] => true,
        [single] => matches!(single.kind, TypeKind::Fundamental(_) | TypeKind::Structure(_)),
        many => many.iter().all(|base| matches!(base.kind, TypeKind::Structure(_))),
    };
    if valid {
        return Ok(());
    }
    Err(Diagnostic::with_chain(
        DiagnosticKind::InvalidBaseTypeCombination {
            name: name.name().to_string(),
        },
        name.range.clone(),
        bases.iter().map(|base| base.range.clone()),
    ))
}
