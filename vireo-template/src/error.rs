use thiserror::Error;

use crate::source::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("template syntax error: {0}")]
    Syntax(String),
    #[error("expected exactly one root element, found {0}")]
    RootCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("template root must be an element or text node, found {kind:?}")]
    UnsupportedRoot { kind: SourceKind },
}

/// Failure while resolving placeholders. Aborts the render cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("cannot resolve `{path}`: nothing at `{segment}`")]
    UnresolvedPath { path: String, segment: String },
    #[error("placeholder has an empty path")]
    EmptyPlaceholder,
}
