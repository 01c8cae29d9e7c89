//! Parse stage builder that converts raw parse trees into the parse generation.
//!
//! The `Builder` processes the [`RawStatement`]s the grammar engine produced
//! for one file and constructs a `RootStatement<ParseType>`. It handles:
//!
//! - Converting raw spans into validated [`Range`]s
//! - Assigning sequential [`ElementId`]s to statements and types
//! - Validating identifiers, cardinalities and metadata blocks
//! - Turning reserved names into fundamental types and consuming their
//!   constraint items
//! - Rejecting misplaced includes, nested roots and duplicate names
//!
//! Named references that need cross-file knowledge stay placeholders
//! ([`ParseTypeKind::Identifier`]) until lowering.
//!
//! # Node ID Assignment
//!
//! Ids are allocated in pre-order from a per-file counter starting at 1, so
//! building the same file always yields the same ids, on any thread.
//!
//! # Error Handling
//!
//! Construction fails fast: the first invalid node aborts the file with a
//! single [`Diagnostic`].

use std::{path::Path, sync::Arc};

use rustc_hash::FxHashMap;

use crate::{
    cardinality::Cardinality,
    element::{ElementId, ElementIds},
    errors::{Diagnostic, DiagnosticKind},
    expression::{Expression, ExpressionKind, IntegerLiteral},
    fundamental::{FundamentalType, is_reserved_type_name},
    identifier::Identifier,
    metadata::{Metadata, MetadataItem},
    position::Range,
    raw::{
        RawCardinality, RawExpression, RawExpressionKind, RawIdentifier, RawMetadata, RawSpan,
        RawStatement, RawStatementKind, RawType, RawTypeKind,
    },
    statements::{
        ExtensionStatement, IncludeItem, IncludeStatement, ItemStatement, KeywordArgument,
        RootStatement, Statement, StructureStatement,
    },
    types::{IdentifierReference, ParseType, ParseTypeKind, TypeNode, check_members},
};

pub struct Builder {
    file: Arc<Path>,
    ids: ElementIds,
}

impl Builder {
    /// Creates a builder for `file`, the `ordinal`-th file of the workspace.
    #[must_use]
    pub fn new(file: Arc<Path>, ordinal: u32) -> Self {
        Self {
            file,
            ids: ElementIds::new(ordinal),
        }
    }

    /// Builds the root of the file.
    ///
    /// # Errors
    ///
    /// Returns the first syntactic violation found.
    pub fn build_root(
        mut self,
        statements: Vec<RawStatement>,
    ) -> Result<RootStatement<ParseType>, Diagnostic> {
        let end = statements
            .iter()
            .map(|statement| statement.span.end)
            .max()
            .unwrap_or((1, 1));
        let range = self.range(RawSpan::new((1, 1), end))?;
        let statements = self.build_statements(statements, true)?;
        Ok(RootStatement { range, statements })
    }

    fn build_statements(
        &mut self,
        raw: Vec<RawStatement>,
        at_root: bool,
    ) -> Result<Vec<Statement<ParseType>>, Diagnostic> {
        let mut statements = Vec::with_capacity(raw.len());
        for statement in raw {
            statements.push(self.build_statement(statement, at_root)?);
        }
        check_unique_names(&statements)?;
        Ok(statements)
    }

    fn build_statement(
        &mut self,
        raw: RawStatement,
        at_root: bool,
    ) -> Result<Statement<ParseType>, Diagnostic> {
        let id = self.ids.next_id();
        let range = self.range(raw.span)?;
        let statement = match raw.kind {
            RawStatementKind::Item { name, ty } => {
                Statement::Item(Arc::new(self.build_item(id, range, name, ty)?))
            }
            RawStatementKind::Structure {
                name,
                bases,
                metadata,
                children,
            } => Statement::Structure(Arc::new(
                self.build_structure(id, range, name, bases, metadata, children)?,
            )),
            RawStatementKind::Extension {
                name,
                positional_args,
                keyword_args,
            } => {
                let name = self.build_identifier(name)?;
                let positional_args = positional_args
                    .into_iter()
                    .map(|arg| self.build_expression(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let keyword_args = keyword_args
                    .into_iter()
                    .map(|arg| {
                        Ok(KeywordArgument {
                            range: self.range(arg.span)?,
                            name: self.build_identifier(arg.name)?,
                            value: self.build_expression(arg.value)?,
                        })
                    })
                    .collect::<Result<Vec<_>, Diagnostic>>()?;
                Statement::Extension(Arc::new(ExtensionStatement::new(
                    id,
                    range,
                    name,
                    positional_args,
                    keyword_args,
                )?))
            }
            RawStatementKind::Include { filename, items } => {
                if !at_root {
                    return Err(Diagnostic::new(DiagnosticKind::InvalidIncludePlacement, range));
                }
                let filename_range = self.range(filename.0)?;
                let items = items
                    .into_iter()
                    .map(|item| {
                        let reference = item
                            .reference
                            .map(|reference| self.build_identifier(reference))
                            .transpose()?;
                        IncludeItem::new(
                            self.range(item.span)?,
                            self.build_identifier(item.element)?,
                            reference,
                        )
                    })
                    .collect::<Result<Vec<_>, Diagnostic>>()?;
                Statement::Include(Arc::new(IncludeStatement {
                    id,
                    range,
                    filename: filename.1,
                    filename_range,
                    items,
                }))
            }
            RawStatementKind::Root { .. } => {
                return Err(Diagnostic::new(DiagnosticKind::NestedRootStatement, range));
            }
        };
        Ok(statement)
    }

    fn build_item(
        &mut self,
        id: ElementId,
        range: Range,
        name: RawIdentifier,
        ty: RawType,
    ) -> Result<ItemStatement<ParseType>, Diagnostic> {
        let name = self.build_identifier(name)?;
        if name.is_type() {
            check_not_reserved(&name)?;
        }
        let ty = self.build_type(ty)?;
        Ok(ItemStatement { id, range, name, ty })
    }

    fn build_structure(
        &mut self,
        id: ElementId,
        range: Range,
        name: RawIdentifier,
        bases: Vec<RawType>,
        metadata: Option<RawMetadata>,
        children: Vec<RawStatement>,
    ) -> Result<StructureStatement<ParseType>, Diagnostic> {
        let name = self.build_identifier(name)?;
        if !name.is_type() {
            return Err(Diagnostic::new(
                DiagnosticKind::ExpectedTypeName {
                    name: name.value().to_string(),
                },
                name.range,
            ));
        }
        check_not_reserved(&name)?;
        let bases = bases
            .into_iter()
            .map(|base| self.build_type(base))
            .collect::<Result<Vec<_>, _>>()?;
        let metadata = self.build_optional_metadata(metadata)?;
        let children = self.build_statements(children, false)?;
        Ok(StructureStatement {
            id,
            range,
            name,
            bases,
            metadata,
            children,
        })
    }

    fn build_type(&mut self, raw: RawType) -> Result<ParseType, Diagnostic> {
        let id = self.ids.next_id();
        let range = self.range(raw.span)?;
        let cardinality = match raw.cardinality {
            Some(cardinality) => self.build_cardinality(cardinality)?,
            None => Cardinality::default_at(range.clone()),
        };
        let mut metadata = self.build_optional_metadata(raw.metadata)?;
        let kind = match raw.kind {
            RawTypeKind::Reference {
                segments,
                is_global,
                is_element_reference,
            } => {
                let segments = segments
                    .into_iter()
                    .map(|segment| self.build_identifier(segment))
                    .collect::<Result<Vec<_>, _>>()?;
                self.build_reference(&range, segments, is_global, is_element_reference, &mut metadata)?
            }
            RawTypeKind::Tuple(members) => {
                let members = self.build_types(members)?;
                check_members(&range, false, &members, is_parse_variant)?;
                ParseTypeKind::Tuple(members)
            }
            RawTypeKind::Variant(members) => {
                let members = self.build_types(members)?;
                check_members(&range, true, &members, is_parse_variant)?;
                ParseTypeKind::Variant(members)
            }
        };
        Ok(TypeNode {
            id,
            range,
            cardinality,
            metadata: metadata.and_then(Metadata::non_empty),
            kind,
        })
    }

    fn build_types(&mut self, raw: Vec<RawType>) -> Result<Vec<ParseType>, Diagnostic> {
        raw.into_iter().map(|ty| self.build_type(ty)).collect()
    }

    fn build_reference(
        &self,
        range: &Range,
        segments: Vec<Identifier>,
        is_global: bool,
        is_element_reference: bool,
        metadata: &mut Option<Metadata>,
    ) -> Result<ParseTypeKind, Diagnostic> {
        let Some((last, leading)) = segments.split_last() else {
            return Err(Diagnostic::new(
                DiagnosticKind::Grammar {
                    message: "empty type reference".to_string(),
                },
                range.clone(),
            ));
        };
        let expected_type = |identifier: &Identifier| {
            Diagnostic::new(
                DiagnosticKind::ExpectedTypeName {
                    name: identifier.value().to_string(),
                },
                identifier.range.clone(),
            )
        };
        if let Some(segment) = leading.iter().find(|segment| !segment.is_type()) {
            return Err(expected_type(segment));
        }
        if is_element_reference {
            if leading.is_empty() {
                return Err(expected_type(last));
            }
        } else if !last.is_type() {
            return Err(expected_type(last));
        }

        if leading.is_empty()
            && !is_global
            && !is_element_reference
            && let Some(fundamental) = FundamentalType::from_constraints(last.value(), metadata)?
        {
            return Ok(ParseTypeKind::Fundamental(fundamental));
        }
        Ok(ParseTypeKind::Identifier(IdentifierReference {
            segments,
            is_global,
            is_element_reference,
        }))
    }

    fn build_cardinality(&mut self, raw: RawCardinality) -> Result<Cardinality, Diagnostic> {
        let range = self.range(raw.span)?;
        let min = raw
            .min
            .map(|(span, value)| Ok::<_, Diagnostic>(IntegerLiteral::new(self.range(span)?, value)))
            .transpose()?;
        let max = raw
            .max
            .map(|(span, value)| Ok::<_, Diagnostic>(IntegerLiteral::new(self.range(span)?, value)))
            .transpose()?;
        let metadata = self.build_optional_metadata(raw.metadata)?;
        Cardinality::create(range, min, max, metadata)
    }

    fn build_optional_metadata(
        &mut self,
        raw: Option<RawMetadata>,
    ) -> Result<Option<Metadata>, Diagnostic> {
        raw.map(|metadata| self.build_metadata(metadata)).transpose()
    }

    fn build_metadata(&mut self, raw: RawMetadata) -> Result<Metadata, Diagnostic> {
        let range = self.range(raw.span)?;
        let items = raw
            .items
            .into_iter()
            .map(|item| {
                Ok(MetadataItem {
                    range: self.range(item.span)?,
                    name: self.build_identifier(item.name)?,
                    value: self.build_expression(item.value)?,
                })
            })
            .collect::<Result<Vec<_>, Diagnostic>>()?;
        Metadata::create(range, items)
    }

    fn build_expression(&self, raw: RawExpression) -> Result<Expression, Diagnostic> {
        let range = self.range(raw.span)?;
        let kind = match raw.kind {
            RawExpressionKind::Boolean(value) => ExpressionKind::Boolean(value),
            RawExpressionKind::Integer(value) => ExpressionKind::Integer(value),
            RawExpressionKind::Number(value) => ExpressionKind::Number(value),
            RawExpressionKind::String(value) => ExpressionKind::String(value),
            RawExpressionKind::Tuple(values) => ExpressionKind::Tuple(self.build_expressions(values)?),
            RawExpressionKind::List(values) => ExpressionKind::List(self.build_expressions(values)?),
        };
        Ok(Expression::new(range, kind))
    }

    fn build_expressions(&self, raw: Vec<RawExpression>) -> Result<Vec<Expression>, Diagnostic> {
        raw.into_iter()
            .map(|value| self.build_expression(value))
            .collect()
    }

    fn build_identifier(&self, raw: RawIdentifier) -> Result<Identifier, Diagnostic> {
        Identifier::parse(self.range(raw.span)?, &raw.text)
    }

    fn range(&self, span: RawSpan) -> Result<Range, Diagnostic> {
        Range::from_coordinates(self.file.clone(), span.begin, span.end).map_err(|err| {
            Diagnostic::new(
                DiagnosticKind::Grammar {
                    message: err.to_string(),
                },
                Range::file_start(self.file.clone()),
            )
        })
    }
}

/// Convenience wrapper around [`Builder`].
///
/// # Errors
///
/// Returns the first syntactic violation found.
pub fn build_root(
    file: Arc<Path>,
    ordinal: u32,
    statements: Vec<RawStatement>,
) -> Result<RootStatement<ParseType>, Diagnostic> {
    Builder::new(file, ordinal).build_root(statements)
}

fn is_parse_variant(kind: &ParseTypeKind) -> bool {
    matches!(kind, ParseTypeKind::Variant(_))
}

fn check_not_reserved(name: &Identifier) -> Result<(), Diagnostic> {
    if is_reserved_type_name(name.name()) {
        return Err(Diagnostic::new(
            DiagnosticKind::ReservedTypeName {
                name: name.name().to_string(),
            },
            name.range.clone(),
        ));
    }
    Ok(())
}

/// Structures, aliases, fields and include references share one namespace
/// per scope.
fn check_unique_names(statements: &[Statement<ParseType>]) -> Result<(), Diagnostic> {
    let mut seen: FxHashMap<&str, &Identifier> = FxHashMap::default();
    let names = statements.iter().flat_map(|statement| match statement {
        Statement::Include(include) => include.items.iter().map(|item| &item.reference).collect(),
        statement => statement.defined_name().into_iter().collect::<Vec<_>>(),
    });
    for name in names {
        if let Some(first) = seen.insert(name.name(), name) {
            return Err(Diagnostic::with_chain(
                DiagnosticKind::DuplicateName {
                    name: name.name().to_string(),
                },
                first.range.clone(),
                [name.range.clone()],
            ));
        }
    }
    Ok(())
}
