//! Mount API - Render roots and their lifecycle.
//!
//! This module provides the entry point for mounting a component tree into a
//! native document. The returned [`MountHandle`] drives the scheduler and
//! feeds props and events in from the host.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use spark_dom::{element, mount, object, Component, Props, RenderOptions, State, VirtualNode};
//!
//! #[derive(Default)]
//! struct Label;
//!
//! impl Component for Label {
//!     fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
//!         let text = props.get("text").and_then(|v| v.as_str()).unwrap_or_default();
//!         Some(element("span").child(text).into())
//!     }
//! }
//!
//! let handle = mount::<Label>(object(json!({ "text": "one" })), RenderOptions::default())?;
//! assert_eq!(handle.html(), "<span>one</span>");
//!
//! handle.set_props(object(json!({ "text": "two" })))?;
//! handle.tick()?;
//! assert_eq!(handle.html(), "<span>two</span>");
//!
//! handle.remove();
//! # Ok::<(), spark_dom::ReconcileError>(())
//! ```

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::scheduler;
use crate::component::{Component, ComponentType};
use crate::engine::{EntityRegistry, UpdateQueue, Updater};
use crate::error::{ReconcileError, Result};
use crate::events::{Event, HandlerTable};
use crate::native::{Document, ElementPool, NativeId, Patch};
use crate::types::{EntityId, Props, State};
use crate::vdom::Path;

// =============================================================================
// Render Options
// =============================================================================

/// Per-root configuration.
///
/// Deserializable with every field optional, so hosts can load it from their
/// own config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Flush synchronously on every change instead of waiting for `tick`.
    pub immediate: bool,
    /// Recycle removed elements by tag.
    pub pooling: bool,
    /// Max parked elements per tag.
    pub pool_limit: usize,
    /// Max back-to-back passes one flush runs.
    pub max_immediate_passes: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            immediate: false,
            pooling: true,
            pool_limit: 64,
            max_immediate_passes: 16,
        }
    }
}

impl RenderOptions {
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn pooling(mut self, pooling: bool) -> Self {
        self.pooling = pooling;
        self
    }

    pub fn pool_limit(mut self, limit: usize) -> Self {
        self.pool_limit = limit;
        self
    }

    pub fn max_immediate_passes(mut self, passes: usize) -> Self {
        self.max_immediate_passes = passes;
        self
    }
}

// =============================================================================
// Root Context
// =============================================================================

/// Everything one render root owns: the document, entities, queued work,
/// handler table and element pool.
#[derive(Debug)]
pub struct RootContext {
    pub(crate) document: Document,
    pub(crate) container: NativeId,
    pub(crate) registry: EntityRegistry,
    pub(crate) queue: Rc<RefCell<UpdateQueue>>,
    pub(crate) events: HandlerTable,
    pub(crate) pool: ElementPool,
    pub(crate) options: RenderOptions,
    pub(crate) root: Option<EntityId>,
    pub(crate) removed: bool,
}

impl RootContext {
    fn new(document: Document, container: NativeId, options: RenderOptions) -> Self {
        Self {
            document,
            container,
            registry: EntityRegistry::new(),
            queue: Rc::new(RefCell::new(UpdateQueue::new())),
            events: HandlerTable::new(),
            pool: ElementPool::new(options.pool_limit),
            options,
            root: None,
            removed: false,
        }
    }
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`] and [`mount_into`].
///
/// Dropping the handle drops the render root without running unmount hooks;
/// call [`remove`](Self::remove) for an orderly teardown.
pub struct MountHandle {
    root: Rc<RefCell<RootContext>>,
}

impl MountHandle {
    // -------------------------------------------------------------------------
    // Props
    // -------------------------------------------------------------------------

    /// Shallow-merge `delta` into the root entity's props.
    pub fn set_props(&self, delta: Props) -> Result<()> {
        self.push_props(delta, false, None)
    }

    pub fn set_props_with<F>(&self, delta: Props, done: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        self.push_props(delta, false, Some(Box::new(done)))
    }

    /// Replace the root entity's props wholesale.
    pub fn replace_props(&self, props: Props) -> Result<()> {
        self.push_props(props, true, None)
    }

    pub fn replace_props_with<F>(&self, props: Props, done: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        self.push_props(props, true, Some(Box::new(done)))
    }

    fn push_props(
        &self,
        props: Props,
        replace: bool,
        done: Option<Box<dyn FnOnce()>>,
    ) -> Result<()> {
        let immediate = {
            let ctx = self.root.borrow();
            let root = ctx.root.filter(|_| !ctx.removed).ok_or(ReconcileError::RootRemoved)?;
            let mut queue = ctx.queue.borrow_mut();
            if replace {
                queue.push_props_replacement(root, props, done);
            } else {
                queue.push_props_delta(root, props, done);
            }
            ctx.options.immediate
        };
        if immediate {
            self.flush()?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// True if changes are waiting for a tick.
    pub fn needs_tick(&self) -> bool {
        let ctx = self.root.borrow();
        !ctx.removed && ctx.queue.borrow().is_dirty()
    }

    /// Run one reconciliation pass, then fire its completion callbacks.
    ///
    /// Call this from the host's per-frame callback. Returns whether any
    /// entity had pending changes.
    pub fn tick(&self) -> Result<bool> {
        let (dirty, callbacks) = {
            let mut ctx = self.root.borrow_mut();
            let dirty = !ctx.removed && ctx.queue.borrow().is_dirty();
            if !dirty {
                return Ok(false);
            }
            (dirty, ctx.tick()?)
        };
        for callback in callbacks {
            callback();
        }
        Ok(dirty)
    }

    /// Tick until nothing is pending. Returns the number of passes.
    pub fn flush(&self) -> Result<usize> {
        scheduler::flush(&self.root)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Deliver a native event through the delegated handler table.
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&self, mut event: Event) -> Result<bool> {
        let (entity, node, handler, state, props, updater, immediate) = {
            let ctx = self.root.borrow();
            if ctx.removed {
                return Ok(false);
            }
            let Some((entity, node, handler)) = ctx.events.resolve(&ctx.document, &event) else {
                return Ok(false);
            };
            let owner = ctx.registry.get(entity)?;
            (
                entity,
                node,
                handler,
                owner.state.clone(),
                owner.props.clone(),
                ctx.updater(entity),
                ctx.options.immediate,
            )
        };
        debug!(%entity, event = %event.event_type, "event dispatched");
        event.delegate_target = Some(node);
        handler(&event, &state, &props, &updater);
        if immediate {
            self.flush()?;
        }
        Ok(true)
    }

    /// Stop delivering events. Handlers stay bound.
    pub fn pause_events(&self) {
        self.root.borrow_mut().events.pause();
    }

    pub fn resume_events(&self) {
        let mut ctx = self.root.borrow_mut();
        if !ctx.removed {
            ctx.events.resume();
        }
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Unmount the whole tree and release the root's resources.
    ///
    /// Pending work is dropped and no further tick does anything. Calling it
    /// again is a no-op.
    pub fn remove(&self) {
        let mut ctx = self.root.borrow_mut();
        if ctx.removed {
            return;
        }
        ctx.removed = true;
        if let Some(root) = ctx.root.take() {
            if let Err(err) = ctx.unmount_entity(root) {
                error!(%err, "unmount failed");
            }
        }
        ctx.events.clear();
        ctx.queue.borrow_mut().clear();
        let RootContext { pool, document, .. } = &mut *ctx;
        pool.clear(document);
        debug!("render root removed");
    }

    pub fn is_removed(&self) -> bool {
        self.root.borrow().removed
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// The native document. Do not hold the guard across `tick` or `dispatch`.
    pub fn document(&self) -> Ref<'_, Document> {
        Ref::map(self.root.borrow(), |ctx| &ctx.document)
    }

    /// The container the tree is mounted into.
    pub fn container(&self) -> NativeId {
        self.root.borrow().container
    }

    /// Markup of the container's contents.
    pub fn html(&self) -> String {
        let ctx = self.root.borrow();
        ctx.document.inner_html(ctx.container)
    }

    /// Drain the document's patch log.
    pub fn take_patches(&self) -> Vec<Patch> {
        self.root.borrow_mut().document.take_patches()
    }

    pub fn root_entity(&self) -> Option<EntityId> {
        self.root.borrow().root
    }

    pub fn entity_native_root(&self, entity: EntityId) -> Option<NativeId> {
        self.root.borrow().registry.get(entity).ok()?.native_root
    }

    /// Child entities of `entity` with the paths they were rendered at.
    pub fn entity_children(&self, entity: EntityId) -> Vec<(Path, EntityId)> {
        self.root
            .borrow()
            .registry
            .get(entity)
            .map(|e| e.children.iter().map(|(p, id)| (p.clone(), *id)).collect())
            .unwrap_or_default()
    }

    pub fn entity_state(&self, entity: EntityId) -> Option<State> {
        Some(self.root.borrow().registry.get(entity).ok()?.state.clone())
    }

    pub fn entity_props(&self, entity: EntityId) -> Option<Props> {
        Some(self.root.borrow().registry.get(entity).ok()?.props.clone())
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.root.borrow().registry.len()
    }

    /// Updater for any live entity, for hosts feeding external data in.
    pub fn updater(&self, entity: EntityId) -> Option<Updater> {
        let ctx = self.root.borrow();
        ctx.registry
            .contains(entity)
            .then(|| ctx.updater(entity))
    }
}

// =============================================================================
// Mount Functions
// =============================================================================

/// Mount component `C` into a fresh document with a `body` container.
pub fn mount<C: Component + Default>(props: Props, options: RenderOptions) -> Result<MountHandle> {
    mount_component(ComponentType::of::<C>(), props, options)
}

/// Like [`mount`], for an already-resolved component type.
pub fn mount_component(
    component_type: ComponentType,
    props: Props,
    options: RenderOptions,
) -> Result<MountHandle> {
    let mut document = Document::new();
    let body = document.create_element("body");
    let root = document.root();
    document.append_child(root, body)?;
    document.take_patches();
    mount_into(document, body, component_type, props, options)
}

/// Mount into `container`, an element of an existing document.
///
/// Mount order: `before_mount` (parent, then children), insertion into the
/// container, `after_mount` (parent, then children).
pub fn mount_into(
    document: Document,
    container: NativeId,
    component_type: ComponentType,
    props: Props,
    options: RenderOptions,
) -> Result<MountHandle> {
    let immediate = options.immediate;
    let root = Rc::new(RefCell::new(RootContext::new(document, container, options)));

    if immediate {
        let weak = Rc::downgrade(&root);
        root.borrow()
            .queue
            .borrow_mut()
            .set_schedule_hook(Rc::new(move || {
                let Some(root) = weak.upgrade() else { return };
                if let Err(err) = scheduler::flush(&root) {
                    error!(%err, "immediate flush failed");
                }
            }));
    }

    {
        let mut ctx = root.borrow_mut();
        let mut mounted = Vec::new();
        let entity = ctx.create_entity(component_type, props, None, &mut mounted)?;
        let native = ctx
            .registry
            .get(entity)?
            .native_root
            .ok_or(ReconcileError::EntityNotFound(entity))?;
        ctx.document.append_child(container, native)?;
        ctx.root = Some(entity);
        ctx.events.resume();
        ctx.finish_mount(mounted)?;
        debug!(%entity, kind = component_type.name(), "render root mounted");
    }

    let handle = MountHandle { root };
    if immediate {
        handle.flush()?;
    }
    Ok(handle)
}

// =============================================================================
// Tests
// =============================================================================
