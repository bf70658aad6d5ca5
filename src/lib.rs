//! # spark-dom
//!
//! Component reconciliation engine for Rust.
//!
//! ## Architecture
//!
//! Components render immutable virtual trees. Each live component instance is
//! an *entity* in a per-root arena; entities refer to each other and to the
//! native output only by id. When an entity's state or props change, the
//! scheduler re-renders it, diffs the new tree against the previous one by
//! position, and patches the native document in the same pass.
//!
//! ```text
//! Component::render → Tree → diff → Document (patch log)
//!        ▲                              │
//!   set_state / set_props        delegated events
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core values (Props, State, AttrValue, EntityId)
//! - [`vdom`] - Virtual nodes, builders, paths and trees
//! - [`component`] - The component contract
//! - [`engine`] - Entities, registry, update queue
//! - [`native`] - Native document, patches, element pool
//! - [`renderer`] - Diff and lifecycle sequencing
//! - [`events`] - Event delegation
//! - [`pipeline`] - Scheduler and mount API

pub mod component;
pub mod engine;
pub mod error;
pub mod events;
pub mod native;
pub mod pipeline;
pub mod renderer;
pub mod types;
pub mod vdom;

// Re-export commonly used items
pub use types::*;

pub use error::{ReconcileError, Result};

pub use component::{Component, ComponentType};

pub use vdom::{
    component, component_of, element, placeholder, text, ComponentNode, ElementNode,
    EventHandler, NodeKind, Path, Tree, VirtualNode, PLACEHOLDER_TAG,
};

pub use engine::{Callback, Updater};

pub use native::{Document, NativeId, NativeNode, NodeOwner, Patch, Property};

pub use events::{Event, DELEGATED_EVENTS};

pub use pipeline::{mount, mount_component, mount_into, MountHandle, RenderOptions};
