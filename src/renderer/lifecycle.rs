//! Entity lifecycle - Creation, realization and teardown.
//!
//! Mount:
//! 1. instantiate, `before_mount`, render
//! 2. realize the tree as native nodes, recursing into nested components
//! 3. (caller) splice the native root into place
//! 4. `after_mount`, parent before children
//!
//! Unmount:
//! 1. `before_unmount`
//! 2. detach the native root, if it is still in the document
//! 3. unmount children
//! 4. `after_unmount`, unbind events, drop queued work, release the record
//! 5. recycle the detached native subtree

use tracing::debug;

use crate::component::{Component, ComponentType};
use crate::engine::{Entity, EntityFlags, Phase, Updater};
use crate::error::{ReconcileError, Result};
use crate::native::{NativeId, NodeOwner};
use crate::pipeline::RootContext;
use crate::types::{EntityId, Props, State};
use crate::vdom::{Path, Tree, VirtualNode};

impl RootContext {
    /// Updater bound to `entity`, sharing this root's queue.
    pub(crate) fn updater(&self, entity: EntityId) -> Updater {
        Updater::new(entity, self.queue.clone())
    }

    /// Run `render` with the entity in the rendering phase.
    pub(crate) fn render_component(
        &self,
        entity: EntityId,
        component: &dyn Component,
        state: &State,
        props: &Props,
    ) -> Tree {
        self.queue.borrow_mut().set_phase(entity, Phase::Rendering);
        let rendered = component.render(state, props);
        self.queue.borrow_mut().set_phase(entity, Phase::Idle);
        Tree::from_render(rendered)
    }

    // =========================================================================
    // Mount
    // =========================================================================

    /// Create an entity and realize its output, detached.
    ///
    /// Every entity created along the way (this one first, then nested ones
    /// in tree order) is appended to `mounted`; pass that to
    /// [`finish_mount`](Self::finish_mount) once the output is in place.
    pub(crate) fn create_entity(
        &mut self,
        component_type: ComponentType,
        props: Props,
        parent: Option<EntityId>,
        mounted: &mut Vec<EntityId>,
    ) -> Result<EntityId> {
        let id = EntityId::next();
        self.queue.borrow_mut().register(id);
        let updater = self.updater(id);

        let mut component = component_type.instantiate();
        let state = component.initial_state();
        component.before_mount(&updater, &state, &props);
        let tree = self.render_component(id, component.as_ref(), &state, &props);
        let root_node = tree.shared_root();

        self.registry.insert(Entity::new(
            id,
            component_type,
            component,
            state,
            props,
            tree,
            parent,
        ));
        mounted.push(id);
        debug!(entity = %id, kind = component_type.name(), "entity created");

        let native = self.create_native(id, &root_node, &Path::root(), mounted)?;
        let entity = self.registry.get_mut(id)?;
        entity.native_root = Some(native);
        self.events.rebind(id, &entity.tree);
        Ok(id)
    }

    /// Build native nodes for `node`, owned by `owner` at `path`.
    pub(crate) fn create_native(
        &mut self,
        owner: EntityId,
        node: &VirtualNode,
        path: &Path,
        mounted: &mut Vec<EntityId>,
    ) -> Result<NativeId> {
        match node {
            VirtualNode::Text(data) => Ok(self.document.create_text(data)),
            VirtualNode::Element(el) => {
                let id = if self.options.pooling {
                    self.pool.acquire(&mut self.document, &el.tag)?
                } else {
                    self.document.create_element(&el.tag)
                };
                self.document.set_owner(
                    id,
                    NodeOwner {
                        entity: owner,
                        path: path.clone(),
                    },
                )?;
                for (name, value) in &el.attributes {
                    if let Some(value) = value.to_native() {
                        self.document.set_attribute(id, name, &value)?;
                    }
                }
                for (i, child) in el.children.iter().enumerate() {
                    let child_id = self.create_native(owner, child, &path.child(i), mounted)?;
                    self.document.append_child(id, child_id)?;
                }
                Ok(id)
            }
            VirtualNode::Component(c) => {
                let child =
                    self.create_entity(c.component_type, c.props.clone(), Some(owner), mounted)?;
                self.registry
                    .get_mut(owner)?
                    .children
                    .insert(path.clone(), child);
                self.registry
                    .get(child)?
                    .native_root
                    .ok_or(ReconcileError::EntityNotFound(child))
            }
        }
    }

    /// Fire `after_mount` for freshly created entities, in creation order.
    pub(crate) fn finish_mount(&mut self, mounted: Vec<EntityId>) -> Result<()> {
        for id in mounted {
            let updater = self.updater(id);
            // A hook of an earlier entity may have torn this one down already.
            let Ok(entity) = self.registry.get_mut(id) else {
                continue;
            };
            entity
                .component
                .after_mount(&updater, &entity.state, &entity.props);
            entity.flags.insert(EntityFlags::MOUNTED);
        }
        Ok(())
    }

    // =========================================================================
    // Unmount
    // =========================================================================

    /// Tear down an entity and everything it rendered.
    ///
    /// Unknown or already unmounting entities are ignored.
    pub(crate) fn unmount_entity(&mut self, id: EntityId) -> Result<()> {
        let updater = self.updater(id);
        let Ok(entity) = self.registry.get_mut(id) else {
            return Ok(());
        };
        if entity.flags.contains(EntityFlags::UNMOUNTING) {
            return Ok(());
        }
        entity.flags.insert(EntityFlags::UNMOUNTING);
        entity
            .component
            .before_unmount(&updater, &entity.state, &entity.props);

        let children: Vec<EntityId> = entity.children.values().copied().collect();
        // Entities sharing a root node reach here with it already detached.
        let detached = entity
            .native_root
            .filter(|&node| self.document.is_attached(node))
            .filter(|&node| self.document.detach(node).is_some());

        for child in children {
            self.unmount_entity(child)?;
        }

        let entity = self.registry.get_mut(id)?;
        entity
            .component
            .after_unmount(&updater, &entity.state, &entity.props);
        self.events.unbind(id);
        self.queue.borrow_mut().forget(id);
        self.registry.release(id);
        debug!(entity = %id, "entity unmounted");

        if let Some(node) = detached {
            self.recycle(node);
        }
        Ok(())
    }

    /// Hand a detached native subtree to the pool, or free it.
    pub(crate) fn recycle(&mut self, node: NativeId) {
        if self.options.pooling {
            self.pool.recycle(&mut self.document, node);
        } else {
            self.document.release(node);
        }
    }

    // =========================================================================
    // Structural Removal & Replacement
    // =========================================================================

    /// Remove the native node at `path` of `owner`'s tree, unmounting the
    /// component rendered there or every component nested inside it.
    pub(crate) fn remove_element(
        &mut self,
        owner: EntityId,
        path: &Path,
        node: NativeId,
    ) -> Result<()> {
        let entity = self.registry.get(owner)?;
        if let Some(&child) = entity.children.get(path) {
            return self.unmount_entity(child);
        }
        let nested = entity.children_within(path);
        self.document.detach(node);
        for (_, child) in nested {
            self.unmount_entity(child)?;
        }
        self.recycle(node);
        Ok(())
    }

    /// Replace the native node at `path` with a freshly realized `next`.
    ///
    /// The new node takes the old one's index under the same parent, and every
    /// entity whose root was the old node is pointed at the new one.
    pub(crate) fn replace_element(
        &mut self,
        owner: EntityId,
        path: &Path,
        old: NativeId,
        next: &VirtualNode,
        mounted: &mut Vec<EntityId>,
    ) -> Result<NativeId> {
        let parent = self
            .document
            .parent(old)
            .ok_or(ReconcileError::Detached(old))?;
        let index = self
            .document
            .index_of(old)
            .ok_or(ReconcileError::Detached(old))?;

        // Entities sharing `old` as their root, captured before `old` can be
        // recycled and handed out again by the new branch.
        let sharers: Vec<EntityId> = self
            .registry
            .iter()
            .filter(|entity| entity.native_root == Some(old))
            .map(|entity| entity.id)
            .collect();

        // Clear out the old branch before creating the new one, so component
        // paths never clash.
        self.remove_element(owner, path, old)?;
        let new = self.create_native(owner, next, path, mounted)?;
        self.document.insert_child(parent, index, new)?;

        for id in sharers {
            if let Ok(entity) = self.registry.get_mut(id) {
                entity.native_root = Some(new);
            }
        }
        Ok(new)
    }
}
