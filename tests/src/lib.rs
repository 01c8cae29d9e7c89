//! End-to-end and cross-crate tests for the schema compiler.

#[cfg(test)]
mod ast;
#[cfg(test)]
mod utils;
