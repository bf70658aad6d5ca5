//! Render Pipeline
//!
//! Connects external changes to native output.
//!
//! # Pipeline Architecture
//!
//! ```text
//! set_state / set_props → UpdateQueue → tick → reconcile → diff → Document
//! ```
//!
//! ## Data Flow
//!
//! 1. **queue** - changes accumulate per entity, nothing renders yet
//! 2. **tick** - one top-down walk reconciles every entity with pending work
//! 3. **diff** - each re-render is diffed against the previous tree and
//!    patched into the document on the spot
//! 4. **callbacks** - completion callbacks fire once the pass is done
//!
//! In immediate mode step 2 runs synchronously after every change.

pub mod mount;
pub mod scheduler;

pub use mount::{mount, mount_component, mount_into, MountHandle, RenderOptions, RootContext};
