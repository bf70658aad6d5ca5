//! Component contract.
//!
//! A component is user logic that turns state and props into a virtual tree.
//! Everything beyond [`Component::render`] is an optional lifecycle hook with
//! a no-op default, so a component implements only what it needs.
//!
//! # Example
//!
//! ```
//! use spark_dom::{element, Component, Props, State, VirtualNode};
//!
//! #[derive(Default)]
//! struct Greeting;
//!
//! impl Component for Greeting {
//!     fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
//!         let name = props.get("name").and_then(|v| v.as_str()).unwrap_or("world");
//!         Some(element("p").child(format!("Hello {name}")).into())
//!     }
//! }
//! ```
//!
//! # Hook order
//!
//! - mount: `before_mount` (parent, then children), native insertion,
//!   `after_mount` (parent, then children)
//! - update: `should_update`, `before_update`, render, diff, `after_update`
//! - unmount: `before_unmount`, native removal, children unmount,
//!   `after_unmount`

use std::any::{type_name, TypeId};
use std::fmt;

use crate::engine::Updater;
use crate::types::{Props, State};
use crate::vdom::VirtualNode;

// =============================================================================
// Component Trait
// =============================================================================

/// User-supplied component logic.
///
/// Every hook receives an [`Updater`] bound to the component's own entity.
/// It can be cloned and kept, for example to feed external data into
/// `set_state` after `after_mount`.
pub trait Component: 'static {
    /// Describe the output for the given state and props.
    ///
    /// Returning `None` renders an inert placeholder element.
    fn render(&self, state: &State, props: &Props) -> Option<VirtualNode>;

    /// State the entity starts with.
    fn initial_state(&self) -> State {
        State::new()
    }

    /// Decide whether a pending change needs a re-render.
    ///
    /// Defaults to re-rendering only when state or props actually differ.
    fn should_update(
        &self,
        state: &State,
        props: &Props,
        next_state: &State,
        next_props: &Props,
    ) -> bool {
        state != next_state || props != next_props
    }

    /// Runs before the re-render. `set_state` here merges into `next_state`.
    fn before_update(
        &mut self,
        _updater: &Updater,
        _state: &State,
        _props: &Props,
        _next_state: &State,
        _next_props: &Props,
    ) {
    }

    /// Runs after the native output has been patched.
    fn after_update(
        &mut self,
        _updater: &Updater,
        _state: &State,
        _props: &Props,
        _prev_state: &State,
        _prev_props: &Props,
    ) {
    }

    fn before_mount(&mut self, _updater: &Updater, _state: &State, _props: &Props) {}

    fn after_mount(&mut self, _updater: &Updater, _state: &State, _props: &Props) {}

    fn before_unmount(&mut self, _updater: &Updater, _state: &State, _props: &Props) {}

    fn after_unmount(&mut self, _updater: &Updater, _state: &State, _props: &Props) {}
}

// =============================================================================
// Component Type
// =============================================================================

/// Identity and constructor of a component definition.
///
/// Two component references are "the same component" iff their Rust types
/// match. The differ never morphs one type into another.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    create: fn() -> Box<dyn Component>,
}

impl ComponentType {
    pub fn of<C: Component + Default>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
            create: create::<C>,
        }
    }

    /// Instantiate a fresh component object.
    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.create)()
    }

    /// Type name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn create<C: Component + Default>() -> Box<dyn Component> {
    Box::new(C::default())
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

// =============================================================================
// Tests
// =============================================================================
