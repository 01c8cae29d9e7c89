//! Depth-first traversal of lowered trees.
//!
//! A walk visits one element at a time in three steps:
//!
//! 1. [`Visitor::on_element`] wraps the whole visit; [`Visitor::exit_element`]
//!    closes it.
//! 2. [`Visitor::on_element_details`] wraps the emission of the element's
//!    scalar attributes as `(name, value)` pairs through [`Visitor::on_detail`].
//! 3. [`Visitor::on_element_children`] wraps the walk over the owned children,
//!    in declaration order.
//!
//! Every hook returns a [`VisitControl`]. `SkipDetails` and `SkipChildren`
//! prune the matching step of the current element only; `Stop` ends the
//! whole walk and is reported to the caller as [`ControlFlow::Break`].
//!
//! Structure references are emitted as a [`DetailValue::Reference`] handle
//! and never descended into, so self-referencing structures terminate.

use core::fmt;
use std::{
    fmt::{Display, Formatter},
    ops::ControlFlow,
    path::Path,
    sync::Arc,
};

use crate::{
    cardinality::Cardinality,
    element::Element,
    expression::{Expression, ExpressionKind},
    fundamental::FundamentalType,
    identifier::{Identifier, Visibility},
    metadata::{Metadata, MetadataItem},
    position::Range,
    statements::{
        ExtensionStatement, IncludeItem, IncludeStatement, ItemStatement, KeywordArgument,
        RootStatement, Statement, StructureStatement,
    },
    types::{StructureRef, Type, TypeKind},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VisitControl {
    Continue,
    SkipDetails,
    SkipChildren,
    Stop,
}

#[derive(Clone, Copy, Debug)]
pub enum ElementRef<'ast> {
    Root(&'ast RootStatement),
    Item(&'ast Arc<ItemStatement>),
    Structure(&'ast Arc<StructureStatement>),
    Extension(&'ast Arc<ExtensionStatement>),
    Include(&'ast Arc<IncludeStatement>),
    IncludeItem(&'ast IncludeItem),
    Type(&'ast Type),
    Cardinality(&'ast Cardinality),
    Metadata(&'ast Metadata),
    MetadataItem(&'ast MetadataItem),
    KeywordArgument(&'ast KeywordArgument),
    Expression(&'ast Expression),
}

impl<'ast> ElementRef<'ast> {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ElementRef::Root(_) => "Root",
            ElementRef::Item(_) => "Item",
            ElementRef::Structure(_) => "Structure",
            ElementRef::Extension(_) => "Extension",
            ElementRef::Include(_) => "Include",
            ElementRef::IncludeItem(_) => "IncludeItem",
            ElementRef::Type(_) => "Type",
            ElementRef::Cardinality(_) => "Cardinality",
            ElementRef::Metadata(_) => "Metadata",
            ElementRef::MetadataItem(_) => "MetadataItem",
            ElementRef::KeywordArgument(_) => "KeywordArgument",
            ElementRef::Expression(_) => "Expression",
        }
    }

    #[must_use]
    pub fn range(&self) -> &'ast Range {
        match *self {
            ElementRef::Root(root) => root.range(),
            ElementRef::Item(item) => &item.range,
            ElementRef::Structure(structure) => &structure.range,
            ElementRef::Extension(extension) => &extension.range,
            ElementRef::Include(include) => &include.range,
            ElementRef::IncludeItem(item) => &item.range,
            ElementRef::Type(ty) => &ty.range,
            ElementRef::Cardinality(cardinality) => &cardinality.range,
            ElementRef::Metadata(metadata) => &metadata.range,
            ElementRef::MetadataItem(item) => &item.range,
            ElementRef::KeywordArgument(argument) => &argument.range,
            ElementRef::Expression(expression) => &expression.range,
        }
    }

    fn details(self) -> Vec<(&'static str, DetailValue<'ast>)> {
        match self {
            ElementRef::Root(root) => vec![("file", DetailValue::Path(root.file()))],
            ElementRef::Item(item) => vec![
                ("name", DetailValue::Identifier(&item.name)),
                ("visibility", DetailValue::Visibility(item.name.visibility())),
            ],
            ElementRef::Structure(structure) => vec![
                ("name", DetailValue::Identifier(&structure.name)),
                (
                    "visibility",
                    DetailValue::Visibility(structure.name.visibility()),
                ),
            ],
            ElementRef::Extension(extension) => {
                vec![("name", DetailValue::Identifier(&extension.name))]
            }
            ElementRef::Include(include) => vec![("filename", DetailValue::Text(&include.filename))],
            ElementRef::IncludeItem(item) => vec![
                ("element", DetailValue::Identifier(&item.element)),
                ("reference", DetailValue::Identifier(&item.reference)),
            ],
            ElementRef::Type(ty) => match &ty.kind {
                TypeKind::Fundamental(fundamental) => {
                    vec![("fundamental", DetailValue::Fundamental(fundamental))]
                }
                TypeKind::Structure(structure) => {
                    vec![("reference", DetailValue::Reference(structure))]
                }
                TypeKind::Tuple(_) => vec![("kind", DetailValue::Text("tuple"))],
                TypeKind::Variant(_) => vec![("kind", DetailValue::Text("variant"))],
                TypeKind::Alias(alias) => vec![("alias", DetailValue::Identifier(&alias.name))],
            },
            ElementRef::Cardinality(cardinality) => vec![
                ("min", DetailValue::Integer(cardinality.min().value)),
                (
                    "max",
                    cardinality
                        .max()
                        .map_or(DetailValue::Unbounded, |max| DetailValue::Integer(max.value)),
                ),
            ],
            ElementRef::Metadata(_) => Vec::new(),
            ElementRef::MetadataItem(item) => vec![("name", DetailValue::Identifier(&item.name))],
            ElementRef::KeywordArgument(argument) => {
                vec![("name", DetailValue::Identifier(&argument.name))]
            }
            ElementRef::Expression(expression) => match &expression.kind {
                ExpressionKind::Tuple(_) => vec![("kind", DetailValue::Text("tuple"))],
                ExpressionKind::List(_) => vec![("kind", DetailValue::Text("list"))],
                _ => vec![("value", DetailValue::Literal(expression))],
            },
        }
    }

    fn children(self) -> Vec<ElementRef<'ast>> {
        match self {
            ElementRef::Root(root) => root.statements.iter().map(ElementRef::from).collect(),
            ElementRef::Item(item) => vec![ElementRef::Type(&item.ty)],
            ElementRef::Structure(structure) => structure
                .bases
                .iter()
                .map(ElementRef::Type)
                .chain(structure.metadata.iter().map(ElementRef::Metadata))
                .chain(structure.children.iter().map(ElementRef::from))
                .collect(),
            ElementRef::Extension(extension) => extension
                .positional_args
                .iter()
                .map(ElementRef::Expression)
                .chain(extension.keyword_args().map(ElementRef::KeywordArgument))
                .collect(),
            ElementRef::Include(include) => include.items.iter().map(ElementRef::IncludeItem).collect(),
            ElementRef::IncludeItem(_) => Vec::new(),
            ElementRef::Type(ty) => {
                let mut children = vec![ElementRef::Cardinality(&ty.cardinality)];
                children.extend(ty.metadata.iter().map(ElementRef::Metadata));
                match &ty.kind {
                    TypeKind::Tuple(members) | TypeKind::Variant(members) => {
                        children.extend(members.iter().map(ElementRef::Type));
                    }
                    TypeKind::Alias(alias) => children.push(ElementRef::Type(&alias.aliased)),
                    TypeKind::Fundamental(_) | TypeKind::Structure(_) => {}
                }
                children
            }
            ElementRef::Cardinality(cardinality) => {
                cardinality.metadata().map(ElementRef::Metadata).into_iter().collect()
            }
            ElementRef::Metadata(metadata) => metadata.items().map(ElementRef::MetadataItem).collect(),
            ElementRef::MetadataItem(item) => vec![ElementRef::Expression(&item.value)],
            ElementRef::KeywordArgument(argument) => vec![ElementRef::Expression(&argument.value)],
            ElementRef::Expression(expression) => match &expression.kind {
                ExpressionKind::Tuple(values) | ExpressionKind::List(values) => {
                    values.iter().map(ElementRef::Expression).collect()
                }
                _ => Vec::new(),
            },
        }
    }
}

impl<'ast> From<&'ast Statement> for ElementRef<'ast> {
    fn from(statement: &'ast Statement) -> Self {
        match statement {
            Statement::Item(item) => ElementRef::Item(item),
            Statement::Structure(structure) => ElementRef::Structure(structure),
            Statement::Extension(extension) => ElementRef::Extension(extension),
            Statement::Include(include) => ElementRef::Include(include),
        }
    }
}

/// A scalar attribute of an element.
#[derive(Clone, Copy, Debug)]
pub enum DetailValue<'ast> {
    Identifier(&'ast Identifier),
    Visibility(Visibility),
    Text(&'ast str),
    Integer(i64),
    Unbounded,
    Fundamental(&'ast FundamentalType),
    /// Non-owning; the referenced structure is not walked.
    Reference(&'ast StructureRef),
    Literal(&'ast Expression),
    Path(&'ast Path),
}

impl Display for DetailValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Identifier(identifier) => write!(f, "{identifier}"),
            DetailValue::Visibility(visibility) => write!(f, "{visibility}"),
            DetailValue::Text(text) => write!(f, "{text}"),
            DetailValue::Integer(value) => write!(f, "{value}"),
            DetailValue::Unbounded => write!(f, "*"),
            DetailValue::Fundamental(fundamental) => write!(f, "{}", fundamental.name()),
            DetailValue::Reference(structure) => write!(f, "{}", structure.name.name()),
            DetailValue::Literal(expression) => write!(f, "{expression}"),
            DetailValue::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read-only tree visitor.
///
/// [`Visitor::on_element`] dispatches to the element-specific `on_*` hook by
/// default, so most visitors only override the hooks for the elements they
/// care about.
pub trait Visitor<'ast> {
    fn on_element(&mut self, element: ElementRef<'ast>) -> VisitControl {
        match element {
            ElementRef::Root(root) => self.on_root(root),
            ElementRef::Item(item) => self.on_item(item),
            ElementRef::Structure(structure) => self.on_structure(structure),
            ElementRef::Extension(extension) => self.on_extension(extension),
            ElementRef::Include(include) => self.on_include(include),
            ElementRef::IncludeItem(item) => self.on_include_item(item),
            ElementRef::Type(ty) => self.on_type(ty),
            ElementRef::Cardinality(cardinality) => self.on_cardinality(cardinality),
            ElementRef::Metadata(metadata) => self.on_metadata(metadata),
            ElementRef::MetadataItem(item) => self.on_metadata_item(item),
            ElementRef::KeywordArgument(argument) => self.on_keyword_argument(argument),
            ElementRef::Expression(expression) => self.on_expression(expression),
        }
    }

    fn exit_element(&mut self, _element: ElementRef<'ast>) {}

    fn on_element_details(&mut self, _element: ElementRef<'ast>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_detail(&mut self, _name: &'static str, _value: DetailValue<'ast>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_element_children(&mut self, _element: ElementRef<'ast>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_root(&mut self, _root: &'ast RootStatement) -> VisitControl {
        VisitControl::Continue
    }

    fn on_item(&mut self, _item: &'ast Arc<ItemStatement>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_structure(&mut self, _structure: &'ast Arc<StructureStatement>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_extension(&mut self, _extension: &'ast Arc<ExtensionStatement>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_include(&mut self, _include: &'ast Arc<IncludeStatement>) -> VisitControl {
        VisitControl::Continue
    }

    fn on_include_item(&mut self, _item: &'ast IncludeItem) -> VisitControl {
        VisitControl::Continue
    }

    fn on_type(&mut self, _ty: &'ast Type) -> VisitControl {
        VisitControl::Continue
    }

    fn on_cardinality(&mut self, _cardinality: &'ast Cardinality) -> VisitControl {
        VisitControl::Continue
    }

    fn on_metadata(&mut self, _metadata: &'ast Metadata) -> VisitControl {
        VisitControl::Continue
    }

    fn on_metadata_item(&mut self, _item: &'ast MetadataItem) -> VisitControl {
        VisitControl::Continue
    }

    fn on_keyword_argument(&mut self, _argument: &'ast KeywordArgument) -> VisitControl {
        VisitControl::Continue
    }

    fn on_expression(&mut self, _expression: &'ast Expression) -> VisitControl {
        VisitControl::Continue
    }
}

pub fn walk_root<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    root: &'ast RootStatement,
) -> ControlFlow<()> {
    walk(visitor, ElementRef::Root(root))
}

pub fn walk<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    element: ElementRef<'ast>,
) -> ControlFlow<()> {
    let control = visitor.on_element(element);
    if control == VisitControl::Stop {
        return ControlFlow::Break(());
    }
    let result = walk_steps(visitor, element, control);
    visitor.exit_element(element);
    result
}

fn walk_steps<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    element: ElementRef<'ast>,
    control: VisitControl,
) -> ControlFlow<()> {
    let mut skip_children = control == VisitControl::SkipChildren;

    if control != VisitControl::SkipDetails {
        match visitor.on_element_details(element) {
            VisitControl::Stop => return ControlFlow::Break(()),
            VisitControl::SkipDetails => {}
            VisitControl::SkipChildren => {
                skip_children = true;
                emit_details(visitor, element, &mut skip_children)?;
            }
            VisitControl::Continue => emit_details(visitor, element, &mut skip_children)?,
        }
    }

    if skip_children {
        return ControlFlow::Continue(());
    }
    match visitor.on_element_children(element) {
        VisitControl::Stop => ControlFlow::Break(()),
        VisitControl::SkipChildren => ControlFlow::Continue(()),
        VisitControl::Continue | VisitControl::SkipDetails => {
            for child in element.children() {
                walk(visitor, child)?;
            }
            ControlFlow::Continue(())
        }
    }
}

fn emit_details<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    element: ElementRef<'ast>,
    skip_children: &mut bool,
) -> ControlFlow<()> {
    for (name, value) in element.details() {
        match visitor.on_detail(name, value) {
            VisitControl::Stop => return ControlFlow::Break(()),
            VisitControl::SkipDetails => break,
            VisitControl::SkipChildren => *skip_children = true,
            VisitControl::Continue => {}
        }
    }
    ControlFlow::Continue(())
}
