#![warn(clippy::pedantic)]
//! Cross-file resolution for the schema compiler.
//!
//! The [`symbol_table`] is built once from every parsed file; [`lowering`]
//! then turns each parse-generation root into a lowered root, replacing
//! identifier placeholders with structure references, alias types and
//! element reference copies. Files are lowered independently and may run
//! on a rayon pool.

pub mod lowering;
pub mod symbol_table;

#[cfg(test)]
pub(crate) mod test_support;

pub use lowering::{Lowerer, lower_file, lower_files};
pub use symbol_table::{FileId, ParsedFile, SymbolTable};
