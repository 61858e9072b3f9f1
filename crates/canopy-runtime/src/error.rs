use canopy_compiler::{ArtifactError, CompileError};

/// Errors from building a [`crate::Language`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("invalid grammar artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("failed to read grammar artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build lexer: {0}")]
    Lexer(String),
}

/// Errors returned by parsing. Syntax errors are never reported here; they
/// live in the tree as `ERROR` and `MISSING` nodes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("parse cancelled")]
    Cancelled,

    #[error("invalid edit: {0}")]
    InvalidEdit(String),
}
