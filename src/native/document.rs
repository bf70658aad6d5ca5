//! Native document - The live output medium.
//!
//! An arena of native nodes (indextree), owned by a single render root.
//! Entities never hold pointers into it, only [`NativeId`] indices, so a node
//! shared by a parent and child entity is just the same index stored twice.
//!
//! Every mutation goes through a method here and is recorded in the patch log.

use indextree::Arena;
use smallvec::SmallVec;
use tracing::trace;

use super::patch::{Patch, Property};
use super::NativeId;
use crate::error::{ReconcileError, Result};
use crate::types::EntityId;
use crate::vdom::Path;

// =============================================================================
// Node Types
// =============================================================================

/// Which entity and tree position produced a native element.
///
/// Recorded on every element at creation; the event delegator resolves
/// handlers through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOwner {
    pub entity: EntityId,
    pub path: Path,
}

/// Element data.
#[derive(Debug, Clone, Default)]
pub struct NativeElement {
    pub tag: String,
    pub attributes: SmallVec<[(String, String); 4]>,
    pub value: Option<String>,
    pub inner_html: Option<String>,
    pub owner: Option<NodeOwner>,
}

impl NativeElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A node in the native arena.
#[derive(Debug, Clone)]
pub enum NativeNode {
    /// The document root. Containers hang below it.
    Root,
    Element(NativeElement),
    Text(String),
}

// =============================================================================
// Document
// =============================================================================

/// The native node table of one render root.
#[derive(Debug)]
pub struct Document {
    arena: Arena<NativeNode>,
    root: NativeId,
    patches: Vec<Patch>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NativeNode::Root);
        Self {
            arena,
            root,
            patches: Vec::new(),
        }
    }

    /// The document root node.
    pub fn root(&self) -> NativeId {
        self.root
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NativeId {
        let node = self.arena.new_node(NativeNode::Element(NativeElement {
            tag: tag.to_string(),
            ..NativeElement::default()
        }));
        self.record(Patch::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    pub fn create_text(&mut self, text: &str) -> NativeId {
        let node = self.arena.new_node(NativeNode::Text(text.to_string()));
        self.record(Patch::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Node data, `None` if the id was released.
    pub fn node(&self, id: NativeId) -> Option<&NativeNode> {
        let node = self.arena.get(id)?;
        (!node.is_removed()).then(|| node.get())
    }

    pub fn element(&self, id: NativeId) -> Option<&NativeElement> {
        match self.node(id)? {
            NativeNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NativeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attribute(&self, id: NativeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn attributes(&self, id: NativeId) -> &[(String, String)] {
        self.element(id)
            .map(|el| el.attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn value(&self, id: NativeId) -> Option<&str> {
        self.element(id)?.value.as_deref()
    }

    pub fn inner_html_property(&self, id: NativeId) -> Option<&str> {
        self.element(id)?.inner_html.as_deref()
    }

    pub fn text(&self, id: NativeId) -> Option<&str> {
        match self.node(id)? {
            NativeNode::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn owner(&self, id: NativeId) -> Option<&NodeOwner> {
        self.element(id)?.owner.as_ref()
    }

    pub fn parent(&self, id: NativeId) -> Option<NativeId> {
        self.node(id)?;
        self.arena.get(id)?.parent()
    }

    pub fn children(&self, id: NativeId) -> Vec<NativeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.children(&self.arena).collect()
    }

    pub fn child_at(&self, id: NativeId, index: usize) -> Option<NativeId> {
        self.node(id)?;
        id.children(&self.arena).nth(index)
    }

    /// Position of `id` among its siblings.
    pub fn index_of(&self, id: NativeId) -> Option<usize> {
        let parent = self.parent(id)?;
        parent.children(&self.arena).position(|child| child == id)
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NativeId) -> Vec<NativeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.descendants(&self.arena).collect()
    }

    /// True if `id` hangs (transitively) below the document root.
    pub fn is_attached(&self, id: NativeId) -> bool {
        self.node(id).is_some() && id.ancestors(&self.arena).any(|ancestor| ancestor == self.root)
    }

    /// First attached element whose attribute `name` equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NativeId> {
        self.root
            .descendants(&self.arena)
            .find(|&id| self.attribute(id, name) == Some(value))
    }

    /// All attached elements with the given tag, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NativeId> {
        self.root
            .descendants(&self.arena)
            .filter(|&id| self.tag(id) == Some(tag))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Attributes & Properties
    // -------------------------------------------------------------------------

    /// Set an attribute. `value` and `innerHTML` are routed to properties.
    pub fn set_attribute(&mut self, id: NativeId, name: &str, value: &str) -> Result<()> {
        if let Some(property) = Property::from_attribute(name) {
            return self.set_property(id, property, Some(value.to_string()));
        }
        let el = self.element_mut(id)?;
        match el.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => el.attributes.push((name.to_string(), value.to_string())),
        }
        self.record(Patch::SetAttribute {
            node: id,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NativeId, name: &str) -> Result<()> {
        if let Some(property) = Property::from_attribute(name) {
            return self.set_property(id, property, None);
        }
        let el = self.element_mut(id)?;
        el.attributes.retain(|(key, _)| key != name);
        self.record(Patch::RemoveAttribute {
            node: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn set_property(
        &mut self,
        id: NativeId,
        property: Property,
        value: Option<String>,
    ) -> Result<()> {
        let el = self.element_mut(id)?;
        match property {
            Property::Value => el.value = value.clone(),
            Property::InnerHtml => el.inner_html = value.clone(),
        }
        self.record(Patch::SetProperty {
            node: id,
            property,
            value,
        });
        Ok(())
    }

    /// Tag an element with the entity and path that produced it.
    pub fn set_owner(&mut self, id: NativeId, owner: NodeOwner) -> Result<()> {
        self.element_mut(id)?.owner = Some(owner);
        Ok(())
    }

    /// Drop the owner tag, so events raised on the node no longer resolve.
    pub fn clear_owner(&mut self, id: NativeId) {
        if let Ok(el) = self.element_mut(id) {
            el.owner = None;
        }
    }

    /// Strip every attribute and property so a pooled element can be reused.
    pub fn reset_element(&mut self, id: NativeId) -> Result<()> {
        let names: Vec<String> = self
            .attributes(id)
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            self.remove_attribute(id, &name)?;
        }
        let el = self.element_mut(id)?;
        let had_value = el.value.take().is_some();
        let had_html = el.inner_html.take().is_some();
        el.owner = None;
        if had_value {
            self.record(Patch::SetProperty { node: id, property: Property::Value, value: None });
        }
        if had_html {
            self.record(Patch::SetProperty { node: id, property: Property::InnerHtml, value: None });
        }
        for child in self.children(id) {
            self.detach(child);
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: NativeId, text: &str) -> Result<()> {
        match self.arena.get_mut(id) {
            Some(node) if !node.is_removed() => match node.get_mut() {
                NativeNode::Text(existing) => *existing = text.to_string(),
                _ => return Err(ReconcileError::NotAnElement(id)),
            },
            _ => return Err(ReconcileError::NotAnElement(id)),
        }
        self.record(Patch::SetText {
            node: id,
            text: text.to_string(),
        });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NativeId, child: NativeId) -> Result<()> {
        parent.checked_append(child, &mut self.arena)?;
        let index = self.index_of(child).unwrap_or_default();
        self.record(Patch::InsertChild { parent, index, child });
        Ok(())
    }

    /// Insert `child` so it ends up at `index`; appends past the end.
    pub fn insert_child(&mut self, parent: NativeId, index: usize, child: NativeId) -> Result<()> {
        match self.child_at(parent, index) {
            Some(sibling) => {
                sibling.checked_insert_before(child, &mut self.arena)?;
                self.record(Patch::InsertChild { parent, index, child });
                Ok(())
            }
            None => self.append_child(parent, child),
        }
    }

    /// Detach `id` from its parent, keeping its subtree intact.
    ///
    /// Returns the former parent and index, or `None` if it was not attached
    /// (a no-op, so shared nodes can be detached by several owners).
    pub fn detach(&mut self, id: NativeId) -> Option<(NativeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        id.detach(&mut self.arena);
        self.record(Patch::RemoveChild {
            parent,
            index,
            child: id,
        });
        Some((parent, index))
    }

    /// Detach without recording. Only for nodes already out of the document.
    pub(crate) fn detach_silently(&mut self, id: NativeId) {
        id.detach(&mut self.arena);
    }

    /// Free a node and its subtree. The ids become invalid.
    pub fn release(&mut self, id: NativeId) {
        if self.node(id).is_some() {
            id.remove_subtree(&mut self.arena);
        }
    }

    // -------------------------------------------------------------------------
    // Patch Log
    // -------------------------------------------------------------------------

    /// Patches recorded since the last [`take_patches`](Self::take_patches).
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Drain the patch log.
    pub fn take_patches(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.patches)
    }

    fn record(&mut self, patch: Patch) {
        trace!(?patch, "native mutation");
        self.patches.push(patch);
    }

    fn element_mut(&mut self, id: NativeId) -> Result<&mut NativeElement> {
        match self.arena.get_mut(id) {
            Some(node) if !node.is_removed() => match node.get_mut() {
                NativeNode::Element(el) => Ok(el),
                _ => Err(ReconcileError::NotAnElement(id)),
            },
            _ => Err(ReconcileError::NotAnElement(id)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
