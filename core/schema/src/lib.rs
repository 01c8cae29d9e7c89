#![warn(clippy::pedantic)]
//! Core orchestration crate for the schema compiler.
//!
//! The crate drives a workspace of schema files through the pipeline:
//!
//! ```text
//! workspace → Stage A: grammar + builder → Stage B: symbol table + lowering → Stage C: merge
//! ```
//!
//! The grammar engine is an external collaborator implementing
//! [`schema_ast::raw::Grammar`]. Everything after it is provided here and in
//! the `schema-ast` and `schema-lowering` crates.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use schema::{ExecutionOptions, Workspace, compile};
//! use schema_ast::raw::Grammar;
//!
//! fn run(grammar: &dyn Grammar) -> Result<(), schema::SchemaError> {
//!     let workspace = Workspace::new().with_file("models", "point.schema", "Point -> pass");
//!     let lowered = compile(grammar, &workspace, &ExecutionOptions::default())?;
//!     for (path, diagnostic) in lowered.errors() {
//!         eprintln!("{}: {diagnostic}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Diagnostics are collected per file: a failing file never stops its
//! siblings, and the result maps each failed path to its [`Diagnostic`].
//! With [`ExecutionOptions::raise_if_single_exception`] (the default) a
//! run where exactly one file failed returns that diagnostic as
//! [`SchemaError::Diagnostic`] instead. Content that cannot be read fails
//! its own file like any other diagnostic. Only failures of the run itself,
//! such as a worker pool that cannot be built, are
//! [`SchemaError::Infrastructure`].
//!
//! ## Threading
//!
//! Stage A and Stage B run on a dedicated rayon pool sized by
//! [`ExecutionOptions::max_num_threads`], or on the calling thread when
//! [`ExecutionOptions::single_threaded`] is set. Both modes produce the same
//! graph: element ids are allocated per file from ordinals assigned before
//! any work is dispatched.
//!
//! [`Diagnostic`]: schema_ast::errors::Diagnostic

pub mod errors;
pub mod lowered;
pub mod options;
pub mod pipeline;
pub mod workspace;

pub use errors::SchemaError;
pub use lowered::LoweredWorkspace;
pub use options::ExecutionOptions;
pub use pipeline::{ParsedWorkspace, compile, lower, parse};
pub use workspace::{SourceContent, Workspace};
