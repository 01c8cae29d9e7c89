use schema_ast::errors::Diagnostic;
use thiserror::Error;

/// Failure of a whole pipeline run.
///
/// Per-file diagnostics normally travel inside [`crate::LoweredWorkspace`];
/// a `Diagnostic` here is the single failure raised directly when
/// `raise_if_single_exception` is set.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Diagnostic(Diagnostic),

    #[error("infrastructure failure: {0:#}")]
    Infrastructure(#[from] anyhow::Error),
}

impl SchemaError {
    #[must_use]
    pub fn as_diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            SchemaError::Diagnostic(diagnostic) => Some(diagnostic),
            SchemaError::Infrastructure(_) => None,
        }
    }
}

impl From<Diagnostic> for SchemaError {
    fn from(diagnostic: Diagnostic) -> Self {
        SchemaError::Diagnostic(diagnostic)
    }
}
