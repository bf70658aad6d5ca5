//! Scheduler - Batched reconciliation passes.
//!
//! `set_state`/`set_props` only queue. A tick walks the entity tree top-down
//! once and reconciles every entity with pending changes:
//!
//! ```text
//! pending? ── no ──────────────────────────────────────────┐
//!    │ yes                                                  │
//! should_update? ── no ── commit state/props ───────────────┤
//!    │ yes                                                  │
//! before_update → commit → render → diff → after_update     │
//!                                                           ▼
//!                                          recurse into child entities
//! ```
//!
//! Completion callbacks are collected during the pass and fired once it has
//! finished, after the root borrow has been released.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use super::RootContext;
use crate::engine::{Callback, PendingChange, Phase};
use crate::error::Result;
use crate::types::EntityId;
use crate::vdom::Tree;

impl RootContext {
    /// Run one reconciliation pass over the whole entity tree.
    ///
    /// Returns the completion callbacks of every change applied. A removed
    /// root does nothing.
    pub(crate) fn tick(&mut self) -> Result<Vec<Callback>> {
        let mut callbacks = Vec::new();
        let Some(root) = self.root.filter(|_| !self.removed) else {
            return Ok(callbacks);
        };
        self.queue.borrow_mut().clear_tick_request();

        let mut reconciled = 0;
        if let Err(err) = self.reconcile(root, &mut callbacks, &mut reconciled) {
            error!(%err, "tick aborted");
            return Err(err);
        }
        debug!(reconciled, callbacks = callbacks.len(), "tick complete");
        Ok(callbacks)
    }

    /// Apply pending changes of `entity`, then visit its children.
    pub(crate) fn reconcile(
        &mut self,
        entity: EntityId,
        callbacks: &mut Vec<Callback>,
        reconciled: &mut usize,
    ) -> Result<()> {
        let pending = self.queue.borrow_mut().take_pending(entity);
        if let Some(change) = pending {
            self.update_entity(entity, change, callbacks)?;
            *reconciled += 1;
        }

        // Children as they stand after this entity's own diff.
        for child in self.registry.child_ids(entity) {
            if self.registry.contains(child) {
                self.reconcile(child, callbacks, reconciled)?;
            }
        }
        Ok(())
    }

    fn update_entity(
        &mut self,
        id: EntityId,
        change: PendingChange,
        callbacks: &mut Vec<Callback>,
    ) -> Result<()> {
        let updater = self.updater(id);
        let entity = self.registry.get_mut(id)?;
        let mut next_state = change.next_state(&entity.state);
        let next_props = change.next_props(&entity.props);

        let should_update =
            entity
                .component
                .should_update(&entity.state, &entity.props, &next_state, &next_props);
        if !should_update {
            trace!(entity = %id, "update skipped");
            entity.state = next_state;
            entity.props = next_props;
            callbacks.extend(change.callbacks);
            return Ok(());
        }

        self.queue.borrow_mut().set_phase(id, Phase::BeforeUpdate);
        entity.component.before_update(
            &updater,
            &entity.state,
            &entity.props,
            &next_state,
            &next_props,
        );
        let late = {
            let mut queue = self.queue.borrow_mut();
            queue.set_phase(id, Phase::Idle);
            queue.take_late(id)
        };
        if let Some(late) = late {
            next_state = late.next_state(&next_state);
            callbacks.extend(late.callbacks);
        }

        let prev_state = mem::replace(&mut entity.state, next_state);
        let prev_props = mem::replace(&mut entity.props, next_props);

        // The rendering phase spans render and diff.
        self.queue.borrow_mut().set_phase(id, Phase::Rendering);
        let rendered = entity.component.render(&entity.state, &entity.props);
        let next_tree = Tree::from_render(rendered);
        let diffed = self.diff_entity(id, next_tree);
        self.queue.borrow_mut().set_phase(id, Phase::Idle);
        diffed?;

        let entity = self.registry.get_mut(id)?;
        entity.component.after_update(
            &updater,
            &entity.state,
            &entity.props,
            &prev_state,
            &prev_props,
        );
        callbacks.extend(change.callbacks);
        trace!(entity = %id, "entity updated");
        Ok(())
    }
}

// =============================================================================
// Flush
// =============================================================================

/// Tick until nothing is pending, firing callbacks between passes.
///
/// Returns the number of passes run. Does nothing if the root is already
/// inside a tick; that tick's caller picks the work up.
pub(crate) fn flush(root: &Rc<RefCell<RootContext>>) -> Result<usize> {
    let mut passes = 0;
    loop {
        let callbacks = {
            let Ok(mut ctx) = root.try_borrow_mut() else {
                return Ok(passes);
            };
            if ctx.removed || !ctx.queue.borrow().is_dirty() {
                return Ok(passes);
            }
            if passes >= ctx.options.max_immediate_passes {
                warn!(passes, "flush gave up with changes still pending");
                return Ok(passes);
            }
            passes += 1;
            ctx.tick()?
        };
        for callback in callbacks {
            callback();
        }
    }
}
