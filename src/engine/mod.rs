//! Reconciliation engine - Entities and the state they carry between renders.
//!
//! - Entity: a live component instance with state, props, tree and children
//! - Registry: id → entity table for one render root
//! - Updater: per-entity handle that queues state changes
//!
//! # Architecture
//!
//! Entities reference each other and the native document only by id:
//!
//! ```text
//! Entity 1 (App)      native_root=n3  children={0.1: 2}
//! Entity 2 (Counter)  native_root=n7  children={}
//! ```
//!
//! Pending changes live in a separate [`UpdateQueue`], so handlers can queue
//! work while the registry is borrowed by a running tick.

mod entity;
mod registry;
mod updater;

pub use entity::*;
pub use registry::*;
pub use updater::*;
