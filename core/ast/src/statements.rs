//! The statement hierarchy.
//!
//! Statements are generic over the type generation they carry: the parse
//! stage builds `Statement<ParseType>`, lowering produces `Statement<Type>`.
//! A root is a separate type and never appears among statements.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::{IndexMap, map::Entry};

use crate::{
    element::{Element, ElementId, Node},
    element_impl,
    errors::{Diagnostic, DiagnosticKind},
    expression::Expression,
    identifier::{Identifier, Visibility},
    metadata::Metadata,
    node_impl,
    position::Range,
    types::Type,
};

/// A field (value name) or an alias definition (type name).
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct ItemStatement<T = Type> {
    pub id: ElementId,
    pub range: Range,
    pub name: Identifier,
    pub ty: T,
}

impl<T> ItemStatement<T> {
    #[must_use]
    pub fn is_alias(&self) -> bool {
        self.name.is_type()
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct StructureStatement<T = Type> {
    pub id: ElementId,
    pub range: Range,
    pub name: Identifier,
    pub bases: Vec<T>,
    pub metadata: Option<Metadata>,
    pub children: Vec<Statement<T>>,
}

impl<T> StructureStatement<T> {
    /// Fields of this structure, in declaration order.
    pub fn items(&self) -> impl Iterator<Item = &Arc<ItemStatement<T>>> {
        self.children.iter().filter_map(|child| match child {
            Statement::Item(item) if !item.is_alias() => Some(item),
            _ => None,
        })
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct KeywordArgument {
    pub range: Range,
    pub name: Identifier,
    pub value: Expression,
}

/// A plugin or annotation invocation such as `@validate(1, strict: true)`.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct ExtensionStatement {
    pub id: ElementId,
    pub range: Range,
    pub name: Identifier,
    pub positional_args: Vec<Expression>,
    keyword_args: IndexMap<String, KeywordArgument>,
}

impl ExtensionStatement {
    /// # Errors
    ///
    /// Returns `DuplicateKeywordArgument` anchored at the first argument
    /// with a repeated name.
    pub fn new(
        id: ElementId,
        range: Range,
        name: Identifier,
        positional_args: Vec<Expression>,
        keyword_args: impl IntoIterator<Item = KeywordArgument>,
    ) -> Result<Self, Diagnostic> {
        let mut map = IndexMap::new();
        for argument in keyword_args {
            match map.entry(argument.name.name().to_string()) {
                Entry::Occupied(first) => {
                    let first: &KeywordArgument = first.get();
                    return Err(Diagnostic::with_chain(
                        DiagnosticKind::DuplicateKeywordArgument {
                            name: argument.name.name().to_string(),
                        },
                        first.name.range.clone(),
                        [argument.name.range],
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(argument);
                }
            }
        }
        Ok(Self {
            id,
            range,
            name,
            positional_args,
            keyword_args: map,
        })
    }

    pub fn keyword_args(&self) -> impl Iterator<Item = &KeywordArgument> {
        self.keyword_args.values()
    }

    #[must_use]
    pub fn keyword_arg(&self, name: &str) -> Option<&KeywordArgument> {
        self.keyword_args.get(name)
    }
}

/// One imported element and the name it is known by in the including file.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct IncludeItem {
    pub range: Range,
    pub element: Identifier,
    pub reference: Identifier,
}

impl IncludeItem {
    /// Without an explicit reference the element is imported under its own
    /// name with private visibility.
    ///
    /// # Errors
    ///
    /// Propagates identifier validation failures of the derived reference.
    pub fn new(
        range: Range,
        element: Identifier,
        reference: Option<Identifier>,
    ) -> Result<Self, Diagnostic> {
        let reference = match reference {
            Some(reference) => reference,
            None => Identifier::with_visibility(
                element.range.clone(),
                element.name(),
                Visibility::Private,
            )?,
        };
        Ok(Self {
            range,
            element,
            reference,
        })
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct IncludeStatement {
    pub id: ElementId,
    pub range: Range,
    pub filename: String,
    pub filename_range: Range,
    /// Empty means every public top-level type of the target.
    pub items: Vec<IncludeItem>,
}

impl IncludeStatement {
    /// The included file, relative to the directory of the including file.
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        include_target(self.range.file(), &self.filename)
    }

    #[must_use]
    pub fn is_star(&self) -> bool {
        self.items.is_empty()
    }
}

#[must_use]
pub fn include_target(including_file: &Path, filename: &str) -> PathBuf {
    including_file
        .parent()
        .map_or_else(|| PathBuf::from(filename), |dir| dir.join(filename))
}

#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub enum Statement<T = Type> {
    Item(Arc<ItemStatement<T>>),
    Structure(Arc<StructureStatement<T>>),
    Extension(Arc<ExtensionStatement>),
    Include(Arc<IncludeStatement>),
}

impl<T> Statement<T> {
    #[must_use]
    pub fn id(&self) -> ElementId {
        match self {
            Statement::Item(item) => item.id,
            Statement::Structure(structure) => structure.id,
            Statement::Extension(extension) => extension.id,
            Statement::Include(include) => include.id,
        }
    }

    /// The name this statement defines in its scope, if any.
    #[must_use]
    pub fn defined_name(&self) -> Option<&Identifier> {
        match self {
            Statement::Item(item) => Some(&item.name),
            Statement::Structure(structure) => Some(&structure.name),
            Statement::Extension(_) | Statement::Include(_) => None,
        }
    }
}

impl<T> Element for Statement<T> {
    fn range(&self) -> &Range {
        match self {
            Statement::Item(item) => &item.range,
            Statement::Structure(structure) => &structure.range,
            Statement::Extension(extension) => &extension.range,
            Statement::Include(include) => &include.range,
        }
    }
}

/// All statements of one file.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct RootStatement<T = Type> {
    pub range: Range,
    pub statements: Vec<Statement<T>>,
}

impl<T> RootStatement<T> {
    #[must_use]
    pub fn file(&self) -> &Arc<Path> {
        self.range.file()
    }

    pub fn includes(&self) -> impl Iterator<Item = &Arc<IncludeStatement>> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Include(include) => Some(include),
            _ => None,
        })
    }
}

impl<T> Element for ItemStatement<T> {
    fn range(&self) -> &Range {
        &self.range
    }
}

impl<T> Node for ItemStatement<T> {
    fn id(&self) -> ElementId {
        self.id
    }
}

impl<T> Element for StructureStatement<T> {
    fn range(&self) -> &Range {
        &self.range
    }
}

impl<T> Node for StructureStatement<T> {
    fn id(&self) -> ElementId {
        self.id
    }
}

impl<T> Element for RootStatement<T> {
    fn range(&self) -> &Range {
        &self.range
    }
}

node_impl!(ExtensionStatement, IncludeStatement);
element_impl!(KeywordArgument, IncludeItem);
