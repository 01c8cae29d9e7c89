#![warn(clippy::pedantic)]
//! Element, type and statement model of the schema compiler.
//!
//! The crate covers everything that can be decided within a single file:
//!
//! - Source positions and structured [`errors::Diagnostic`]s
//! - Identifiers, cardinalities, metadata blocks and literal expressions
//! - The [`types`] and [`statements`] hierarchies, in a parse generation
//!   (placeholders for named references) and a lowered generation
//! - The [`builder`] that turns raw grammar output into the parse generation
//! - The [`visitor`] traversal protocol and the [`printer::TreePrinter`]
//!
//! Cross-file resolution lives in the lowering crate.

pub mod builder;
pub mod cardinality;
pub mod element;
pub mod errors;
pub mod expression;
pub mod fundamental;
pub mod identifier;
pub mod metadata;
pub mod position;
pub mod printer;
pub mod raw;
pub mod statements;
pub mod types;
pub mod values;
pub mod visitor;
