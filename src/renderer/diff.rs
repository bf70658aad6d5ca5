//! Differ - Positional tree diff applied straight to the document.
//!
//! Compares an entity's previous and next tree node by node and patches the
//! native output as it goes. There is no intermediate patch list; the
//! document records what was applied.
//!
//! Rules per position:
//! - text vs text: rewrite the text if it changed
//! - element vs element with the same tag: diff attributes, then children
//! - component vs component of the same type: hand the new props to the
//!   child entity, which decides for itself whether to re-render
//! - anything else: replace wholesale
//!
//! Children pair up by index. Trailing extra children are removed from the
//! end backwards, extra next children are appended.

use tracing::trace;

use crate::error::{ReconcileError, Result};
use crate::native::NativeId;
use crate::pipeline::RootContext;
use crate::types::EntityId;
use crate::vdom::{ElementNode, Path, Tree, VirtualNode};

impl RootContext {
    /// Diff `entity`'s current tree against `next`, patch the document, and
    /// make `next` the current tree.
    pub(crate) fn diff_entity(&mut self, entity: EntityId, next: Tree) -> Result<()> {
        let (prev_root, native_root) = {
            let current = self.registry.get(entity)?;
            let native_root = current
                .native_root
                .ok_or(ReconcileError::EntityNotFound(entity))?;
            (current.tree.shared_root(), native_root)
        };
        let next_root = next.shared_root();

        let mut mounted = Vec::new();
        self.diff_node(
            entity,
            &prev_root,
            &next_root,
            &Path::root(),
            native_root,
            &mut mounted,
        )?;

        let current = self.registry.get_mut(entity)?;
        current.tree = next;
        self.events.rebind(entity, &current.tree);
        self.finish_mount(mounted)
    }

    /// Diff one position. Returns the native node now standing there.
    fn diff_node(
        &mut self,
        owner: EntityId,
        prev: &VirtualNode,
        next: &VirtualNode,
        path: &Path,
        native: NativeId,
        mounted: &mut Vec<EntityId>,
    ) -> Result<NativeId> {
        match (prev, next) {
            (VirtualNode::Text(before), VirtualNode::Text(after)) => {
                if before != after {
                    self.document.set_text(native, after)?;
                }
                Ok(native)
            }
            (VirtualNode::Element(before), VirtualNode::Element(after))
                if before.tag == after.tag =>
            {
                self.diff_attributes(native, before, after)?;
                self.diff_children(owner, before, after, path, native, mounted)?;
                Ok(native)
            }
            (VirtualNode::Component(before), VirtualNode::Component(after))
                if before.component_type == after.component_type =>
            {
                let child = *self
                    .registry
                    .get(owner)?
                    .children
                    .get(path)
                    .ok_or_else(|| ReconcileError::PathNotFound {
                        entity: owner,
                        path: path.clone(),
                    })?;
                trace!(entity = %owner, %path, %child, "props passed down");
                self.queue
                    .borrow_mut()
                    .push_props_replacement(child, after.props.clone(), None);
                Ok(native)
            }
            _ => {
                trace!(entity = %owner, %path, "node replaced");
                self.replace_element(owner, path, native, next, mounted)
            }
        }
    }

    fn diff_attributes(
        &mut self,
        native: NativeId,
        prev: &ElementNode,
        next: &ElementNode,
    ) -> Result<()> {
        for (name, value) in &next.attributes {
            let after = value.to_native();
            let before = prev.attributes.get(name).and_then(|v| v.to_native());
            if after == before {
                continue;
            }
            match after {
                Some(after) => self.document.set_attribute(native, name, &after)?,
                None => self.document.remove_attribute(native, name)?,
            }
        }
        for (name, value) in &prev.attributes {
            if !next.attributes.contains_key(name) && value.to_native().is_some() {
                self.document.remove_attribute(native, name)?;
            }
        }
        Ok(())
    }

    fn diff_children(
        &mut self,
        owner: EntityId,
        prev: &ElementNode,
        next: &ElementNode,
        path: &Path,
        native: NativeId,
        mounted: &mut Vec<EntityId>,
    ) -> Result<()> {
        for (i, (before, after)) in prev.children.iter().zip(&next.children).enumerate() {
            let node = self.native_child(native, path, i)?;
            self.diff_node(owner, before, after, &path.child(i), node, mounted)?;
        }

        for i in (next.children.len()..prev.children.len()).rev() {
            let node = self.native_child(native, path, i)?;
            self.remove_element(owner, &path.child(i), node)?;
        }

        for (i, after) in next.children.iter().enumerate().skip(prev.children.len()) {
            let node = self.create_native(owner, after, &path.child(i), mounted)?;
            self.document.append_child(native, node)?;
        }
        Ok(())
    }

    fn native_child(&self, native: NativeId, path: &Path, index: usize) -> Result<NativeId> {
        self.document
            .child_at(native, index)
            .ok_or_else(|| ReconcileError::NativeChildMissing {
                path: path.clone(),
                index,
            })
    }
}
