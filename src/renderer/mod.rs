//! Renderer - Turning virtual trees into native mutations.
//!
//! - [`lifecycle`] - entity creation, mount/unmount hook sequencing, node
//!   removal and replacement with shared-root propagation
//! - [`diff`] - positional diff of two trees of one entity

pub mod diff;
pub mod lifecycle;
