//! Native output - The document the reconciler patches.
//!
//! - [`Document`] - arena of native elements and text nodes with a patch log
//! - [`Patch`] - one recorded mutation
//! - [`ElementPool`] - recycled elements keyed by tag

mod document;
mod html;
mod patch;
mod pool;

pub use document::{Document, NativeElement, NativeNode, NodeOwner};
pub use patch::{Patch, Property};
pub use pool::ElementPool;

/// Index of a node in a [`Document`].
pub type NativeId = indextree::NodeId;
