//! Native mutation log.
//!
//! Every mutation the [`Document`](super::Document) performs is appended to
//! its patch log in application order. Hosts that mirror the document
//! elsewhere drain the log after each tick and replay it.
//!
//! Invariants:
//! - Patches are recorded in the order they were applied.
//! - `node`/`parent`/`child` ids refer to nodes that existed when the patch
//!   was recorded.
//! - A replacement is a `RemoveChild` followed by an `InsertChild` at the
//!   same index of the same parent.

use super::NativeId;

/// Native property targeted by [`Patch::SetProperty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// The live `value` of form controls.
    Value,
    /// Raw markup that replaces the element's rendered children.
    InnerHtml,
}

impl Property {
    /// Map an attribute name to the property it is special-cased to.
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "value" => Some(Self::Value),
            "innerHTML" => Some(Self::InnerHtml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::InnerHtml => "innerHTML",
        }
    }
}

/// One applied native mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    CreateElement { node: NativeId, tag: String },
    CreateText { node: NativeId, text: String },
    SetAttribute { node: NativeId, name: String, value: String },
    RemoveAttribute { node: NativeId, name: String },
    SetProperty { node: NativeId, property: Property, value: Option<String> },
    SetText { node: NativeId, text: String },
    InsertChild { parent: NativeId, index: usize, child: NativeId },
    RemoveChild { parent: NativeId, index: usize, child: NativeId },
}

impl Patch {
    /// Every node id this patch touches.
    pub fn targets(&self) -> Vec<NativeId> {
        match self {
            Self::CreateElement { node, .. }
            | Self::CreateText { node, .. }
            | Self::SetAttribute { node, .. }
            | Self::RemoveAttribute { node, .. }
            | Self::SetProperty { node, .. }
            | Self::SetText { node, .. } => vec![*node],
            Self::InsertChild { parent, child, .. } | Self::RemoveChild { parent, child, .. } => {
                vec![*parent, *child]
            }
        }
    }

    /// True for patches that change tree shape rather than node content.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::InsertChild { .. } | Self::RemoveChild { .. })
    }
}
