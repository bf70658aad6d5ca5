//! Reconciliation errors.
//!
//! Structural errors (a path or native node that should exist but doesn't)
//! abort the current tick. Recoverable situations, like a render returning
//! nothing or a duplicate unmount, never reach this type.

use crate::native::NativeId;
use crate::types::EntityId;
use crate::vdom::Path;

/// Errors raised while mounting, updating or tearing down a render root.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("path {path} does not exist in the current tree of entity {entity}")]
    PathNotFound { entity: EntityId, path: Path },

    #[error("state of entity {0} was changed while it was rendering")]
    StateChangeDuringRender(EntityId),

    #[error("entity {0} is not live in this render root")]
    EntityNotFound(EntityId),

    #[error("native node for {path} has no child at index {index}")]
    NativeChildMissing { path: Path, index: usize },

    #[error("native node {0:?} has no parent to be replaced in")]
    Detached(NativeId),

    #[error("native node {0:?} is missing or of the wrong kind")]
    NotAnElement(NativeId),

    #[error("render root has been removed")]
    RootRemoved,

    #[error(transparent)]
    Native(#[from] indextree::NodeError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ReconcileError>;
