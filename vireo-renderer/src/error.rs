use thiserror::Error;
use vireo_dom::NodeId;
use vireo_template::{BindError, CompileError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The node to replace has no parent to insert the replacement into.
    #[error("node {0} is not attached to a parent")]
    Detached(NodeId),
    /// A previously rendered node was never materialized.
    #[error("previous tree has a node without a surface handle")]
    MissingHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("mount target `{0}` not found")]
    TargetNotFound(String),
    #[error("instance is already mounted")]
    AlreadyMounted,
    #[error("instance is not mounted")]
    NotMounted,
    #[error("`{0}` is not a data property of this instance")]
    UnknownProperty(String),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}
