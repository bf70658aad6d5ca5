//! Virtual Node Model - Immutable descriptions of render output.
//!
//! A component's `render` returns a [`VirtualNode`]: a text leaf, a tagged
//! element with attributes, event bindings and children, or a reference to
//! another component with its props.
//!
//! # Example
//!
//! ```
//! use spark_dom::{element, text, VirtualNode};
//!
//! let node: VirtualNode = element("div")
//!     .attr("id", "root")
//!     .attr("hidden", false)
//!     .child(element("span").child("hello"))
//!     .child(text(" world"))
//!     .into();
//! ```

mod tree;

pub use tree::*;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::component::{Component, ComponentType};
use crate::engine::Updater;
use crate::events::Event;
use crate::types::{AttrValue, Props, State};

// =============================================================================
// Callback Types
// =============================================================================

/// Event handler bound on an element.
///
/// Receives the event plus the owning entity's state and props as they are at
/// dispatch time, and an [`Updater`] for the owning entity.
pub type EventHandler = Rc<dyn Fn(&Event, &State, &Props, &Updater)>;

/// Tag rendered in place of a component that returned nothing.
pub const PLACEHOLDER_TAG: &str = "noscript";

// =============================================================================
// Nodes
// =============================================================================

/// Kind discriminant, used to detect wholesale replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Element,
    Component,
}

/// A node of the virtual tree.
#[derive(Clone)]
pub enum VirtualNode {
    Text(String),
    Element(ElementNode),
    Component(ComponentNode),
}

impl VirtualNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Text(_) => NodeKind::Text,
            Self::Element(_) => NodeKind::Element,
            Self::Component(_) => NodeKind::Component,
        }
    }
}

impl fmt::Debug for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(data) => f.debug_tuple("Text").field(data).finish(),
            Self::Element(el) => el.fmt(f),
            Self::Component(c) => c.fmt(f),
        }
    }
}

/// A tagged element.
#[derive(Clone, Default)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: BTreeMap<String, AttrValue>,
    pub events: BTreeMap<String, EventHandler>,
    pub children: Vec<VirtualNode>,
}

impl ElementNode {
    /// Set an attribute. `value` and `innerHTML` are applied as native
    /// properties rather than attributes.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Bind a handler for a delegated event type (`"click"`, `"input"`, ...).
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Event, &State, &Props, &Updater) + 'static,
    {
        self.events.insert(event.into(), Rc::new(handler));
        self
    }

    /// Append one child.
    pub fn child(mut self, child: impl Into<VirtualNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VirtualNode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl fmt::Debug for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

/// A reference to a component, realized as a child entity.
#[derive(Clone)]
pub struct ComponentNode {
    pub component_type: ComponentType,
    pub props: Props,
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &self.component_type.name())
            .field("props", &self.props)
            .finish()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ElementNode> for VirtualNode {
    fn from(el: ElementNode) -> Self {
        Self::Element(el)
    }
}

impl From<ComponentNode> for VirtualNode {
    fn from(c: ComponentNode) -> Self {
        Self::Component(c)
    }
}

impl From<&str> for VirtualNode {
    fn from(data: &str) -> Self {
        Self::Text(data.to_string())
    }
}

impl From<String> for VirtualNode {
    fn from(data: String) -> Self {
        Self::Text(data)
    }
}

impl From<&String> for VirtualNode {
    fn from(data: &String) -> Self {
        Self::Text(data.clone())
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Start building an element.
pub fn element(tag: impl Into<String>) -> ElementNode {
    ElementNode {
        tag: tag.into(),
        ..ElementNode::default()
    }
}

/// A text leaf.
pub fn text(data: impl Into<String>) -> VirtualNode {
    VirtualNode::Text(data.into())
}

/// A reference to component `C` with the given props.
pub fn component<C: Component + Default>(props: Props) -> VirtualNode {
    component_of(ComponentType::of::<C>(), props)
}

/// A reference to an already-resolved component type.
pub fn component_of(component_type: ComponentType, props: Props) -> VirtualNode {
    VirtualNode::Component(ComponentNode {
        component_type,
        props,
    })
}

/// The inert node substituted when a render produces nothing.
pub fn placeholder() -> VirtualNode {
    element(PLACEHOLDER_TAG).into()
}
