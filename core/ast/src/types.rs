//! The type hierarchy.
//!
//! Types come in two generations that share [`TypeNode`]:
//!
//! - [`ParseType`] is built per file in the parse stage. References to named
//!   types are still placeholders ([`ParseTypeKind::Identifier`]).
//! - [`Type`] is produced by lowering. Named references are either a
//!   [`StructureRef`] handle or an [`AliasType`] owning its target.
//!
//! Only [`Type`] exposes [`Type::clone_with`], [`Type::resolve`] and
//! [`Type::parse_expression`]; placeholders have to be lowered first.

use core::fmt;
use std::fmt::{Display, Formatter};

use crate::{
    cardinality::Cardinality,
    element::{Element, ElementId, Node},
    errors::{Diagnostic, DiagnosticKind},
    expression::{Expression, ExpressionKind},
    fundamental::FundamentalType,
    identifier::Identifier,
    metadata::Metadata,
    position::Range,
    values::Value,
};

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct TypeNode<K> {
    pub id: ElementId,
    pub range: Range,
    pub cardinality: Cardinality,
    pub metadata: Option<Metadata>,
    pub kind: K,
}

impl<K> Element for TypeNode<K> {
    fn range(&self) -> &Range {
        &self.range
    }
}

impl<K> Node for TypeNode<K> {
    fn id(&self) -> ElementId {
        self.id
    }
}

pub type Type = TypeNode<TypeKind>;
pub type ParseType = TypeNode<ParseTypeKind>;

/// Non-owning reference to a lowered `StructureStatement`.
///
/// `id` is the id of the structure statement; the workspace registry maps it
/// back to the statement.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize)]
pub struct StructureRef {
    pub id: ElementId,
    pub name: Identifier,
}

/// A named alias owning the lowered type it stands for.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct AliasType {
    pub name: Identifier,
    pub aliased: Box<Type>,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub enum TypeKind {
    Fundamental(FundamentalType),
    Structure(StructureRef),
    Tuple(Vec<Type>),
    Variant(Vec<Type>),
    Alias(AliasType),
}

/// A dotted reference to a named type, as written.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct IdentifierReference {
    pub segments: Vec<Identifier>,
    /// Also search the public top-level types of every other file.
    pub is_global: bool,
    /// The last segment names a value item of the preceding structure.
    pub is_element_reference: bool,
}

impl Display for IdentifierReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_global {
            write!(f, "::")?;
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub enum ParseTypeKind {
    Fundamental(FundamentalType),
    Identifier(IdentifierReference),
    Tuple(Vec<ParseType>),
    Variant(Vec<ParseType>),
}

/// Checks the members of a tuple or variant: at least one member, and no
/// variant directly inside a variant.
///
/// # Errors
///
/// Returns `EmptyTupleOrVariant` anchored at the enclosing type, or
/// `NestedVariantNotSupported` anchored at the nested member.
pub fn check_members<K>(
    range: &Range,
    is_variant: bool,
    members: &[TypeNode<K>],
    member_is_variant: impl Fn(&K) -> bool,
) -> Result<(), Diagnostic> {
    if members.is_empty() {
        return Err(Diagnostic::new(
            DiagnosticKind::EmptyTupleOrVariant {
                kind: if is_variant { "variant" } else { "tuple" },
            },
            range.clone(),
        ));
    }
    if is_variant && let Some(nested) = members.iter().find(|m| member_is_variant(&m.kind)) {
        return Err(Diagnostic::new(
            DiagnosticKind::NestedVariantNotSupported,
            nested.range.clone(),
        ));
    }
    Ok(())
}

/// The concrete type behind an alias chain.
#[derive(Debug)]
pub struct ResolvedType<'a> {
    pub ty: &'a Type,
    /// One range per alias traversed, outermost first.
    pub ranges: Vec<Range>,
}

impl Type {
    /// Copies this type, overriding the range, cardinality or metadata.
    #[must_use]
    pub fn clone_with(
        &self,
        range: Option<Range>,
        cardinality: Option<Cardinality>,
        metadata: Option<Metadata>,
    ) -> Type {
        Type {
            id: self.id,
            range: range.unwrap_or_else(|| self.range.clone()),
            cardinality: cardinality.unwrap_or_else(|| self.cardinality.clone()),
            metadata: metadata.or_else(|| self.metadata.clone()),
            kind: self.kind.clone(),
        }
    }

    /// Follows alias chains to the first non-alias type. Lowering rejects
    /// alias cycles, so this always terminates.
    #[must_use]
    pub fn resolve(&self) -> ResolvedType<'_> {
        let mut ty = self;
        let mut ranges = Vec::new();
        while let TypeKind::Alias(alias) = &ty.kind {
            ranges.push(ty.range.clone());
            ty = &alias.aliased;
        }
        ResolvedType { ty, ranges }
    }

    /// The referenced structure, looking through aliases.
    #[must_use]
    pub fn as_structure(&self) -> Option<&StructureRef> {
        match &self.resolve().ty.kind {
            TypeKind::Structure(structure) => Some(structure),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_fundamental(&self) -> bool {
        matches!(self.resolve().ty.kind, TypeKind::Fundamental(_))
    }

    /// Name of the type without its cardinality suffix.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.kind {
            TypeKind::Fundamental(fundamental) => fundamental.name().to_string(),
            TypeKind::Structure(structure) => structure.name.name().to_string(),
            TypeKind::Alias(alias) => alias.name.name().to_string(),
            TypeKind::Tuple(members) => join_members(members, ", "),
            TypeKind::Variant(members) => join_members(members, " | "),
        }
    }

    /// Converts a literal into a native value.
    ///
    /// Collections expect a list whose length satisfies the cardinality;
    /// tuples expect a tuple of matching arity; variants accept the first
    /// alternative that parses.
    ///
    /// # Errors
    ///
    /// Returns a conversion diagnostic anchored at the offending expression.
    pub fn parse_expression(&self, expression: &Expression) -> Result<Value, Diagnostic> {
        if !self.cardinality.is_collection() {
            return self.parse_element(expression);
        }
        let ExpressionKind::List(values) = &expression.kind else {
            return Err(Diagnostic::new(
                DiagnosticKind::InvalidExpressionKind {
                    expected: "a list",
                    found: expression.kind_name(),
                },
                expression.range.clone(),
            ));
        };
        if !self.cardinality.accepts(values.len()) {
            return Err(Diagnostic::new(
                DiagnosticKind::CardinalityMismatch {
                    expected: self.cardinality.bounds_text(),
                    found: values.len(),
                },
                expression.range.clone(),
            ));
        }
        values
            .iter()
            .map(|value| self.parse_element(value))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn parse_element(&self, expression: &Expression) -> Result<Value, Diagnostic> {
        match &self.kind {
            TypeKind::Fundamental(fundamental) => fundamental.parse(expression),
            TypeKind::Alias(alias) => alias.aliased.parse_expression(expression),
            TypeKind::Structure(structure) => Err(Diagnostic::new(
                DiagnosticKind::UnsupportedExpression {
                    type_name: structure.name.name().to_string(),
                },
                expression.range.clone(),
            )),
            TypeKind::Tuple(members) => {
                let ExpressionKind::Tuple(values) = &expression.kind else {
                    return Err(Diagnostic::new(
                        DiagnosticKind::InvalidExpressionKind {
                            expected: "a tuple",
                            found: expression.kind_name(),
                        },
                        expression.range.clone(),
                    ));
                };
                let arity = |kind| Err(Diagnostic::new(kind, expression.range.clone()));
                if values.len() < members.len() {
                    return arity(DiagnosticKind::NotEnoughTupleValues {
                        expected: members.len(),
                        found: values.len(),
                    });
                }
                if values.len() > members.len() {
                    return arity(DiagnosticKind::TooManyTupleValues {
                        expected: members.len(),
                        found: values.len(),
                    });
                }
                members
                    .iter()
                    .zip(values)
                    .map(|(member, value)| member.parse_expression(value))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Tuple)
            }
            TypeKind::Variant(alternatives) => alternatives
                .iter()
                .find_map(|alternative| alternative.parse_expression(expression).ok())
                .ok_or_else(|| {
                    Diagnostic::new(
                        DiagnosticKind::NoVariantAlternativeMatched {
                            type_name: self.display_name(),
                        },
                        expression.range.clone(),
                    )
                }),
        }
    }
}

impl ParseType {
    /// Name of the placeholder without its cardinality suffix.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.kind {
            ParseTypeKind::Fundamental(fundamental) => fundamental.name().to_string(),
            ParseTypeKind::Identifier(reference) => reference.to_string(),
            ParseTypeKind::Tuple(members) => join_members(members, ", "),
            ParseTypeKind::Variant(members) => join_members(members, " | "),
        }
    }
}

fn join_members<T: Display>(members: &[T], separator: &str) -> String {
    let members: Vec<String> = members.iter().map(ToString::to_string).collect();
    format!("({})", members.join(separator))
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.display_name(), self.cardinality)
    }
}

impl Display for ParseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.display_name(), self.cardinality)
    }
}
