//! Update Queue - Pending changes, lifecycle phases and callbacks.
//!
//! Lives in its own `Rc<RefCell<_>>` next to the render root, so component
//! hooks and event handlers can queue changes through an [`Updater`] while
//! the root itself is mutably borrowed by a tick.
//!
//! Per entity the queue tracks:
//! - a pending state delta (always shallow-merged)
//! - a pending props replacement and a pending props delta
//! - completion callbacks
//! - the lifecycle phase, which decides what `set_state` is allowed to do

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::error::{ReconcileError, Result};
use crate::types::{merge, EntityId, Props, State};

/// Completion callback fired after the tick that applied its change.
pub type Callback = Box<dyn FnOnce()>;

/// Hook the queue calls when something becomes pending.
pub(crate) type ScheduleHook = Rc<dyn Fn()>;

// =============================================================================
// Phase
// =============================================================================

/// Where an entity currently is in its update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// `before_update` is running. State changes join the running update.
    BeforeUpdate,
    /// `render` is running. State changes are rejected.
    Rendering,
}

// =============================================================================
// Pending Change
// =============================================================================

/// Accumulated, not yet applied changes for one entity.
#[derive(Default)]
pub struct PendingChange {
    pub state: Option<State>,
    pub props_replacement: Option<Props>,
    pub props_delta: Option<Props>,
    pub callbacks: Vec<Callback>,
}

impl PendingChange {
    /// State the entity would have after applying this change.
    pub fn next_state(&self, current: &State) -> State {
        match &self.state {
            Some(delta) => merge(current, delta),
            None => current.clone(),
        }
    }

    /// Props the entity would have after applying this change.
    pub fn next_props(&self, current: &Props) -> Props {
        let base = self.props_replacement.as_ref().unwrap_or(current);
        match &self.props_delta {
            Some(delta) => merge(base, delta),
            None => base.clone(),
        }
    }

    fn merge_state(&mut self, delta: State) {
        match &mut self.state {
            Some(existing) => existing.extend(delta),
            None => self.state = Some(delta),
        }
    }
}

impl fmt::Debug for PendingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingChange")
            .field("state", &self.state)
            .field("props_replacement", &self.props_replacement)
            .field("props_delta", &self.props_delta)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

// =============================================================================
// Update Queue
// =============================================================================

#[derive(Default)]
pub struct UpdateQueue {
    live: HashSet<EntityId>,
    pending: HashMap<EntityId, PendingChange>,
    /// Changes made from `before_update`, folded into the running update.
    late: HashMap<EntityId, PendingChange>,
    phases: HashMap<EntityId, Phase>,
    schedule: Option<ScheduleHook>,
    tick_requested: bool,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_schedule_hook(&mut self, hook: ScheduleHook) {
        self.schedule = Some(hook);
    }

    pub(crate) fn schedule_hook(&self) -> Option<ScheduleHook> {
        self.schedule.clone()
    }

    pub fn register(&mut self, entity: EntityId) {
        self.live.insert(entity);
    }

    /// Drop everything queued for an entity that is going away.
    pub fn forget(&mut self, entity: EntityId) {
        self.live.remove(&entity);
        self.pending.remove(&entity);
        self.late.remove(&entity);
        self.phases.remove(&entity);
    }

    /// Drop all queued work. Entities stay live.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.late.clear();
        self.tick_requested = false;
    }

    pub fn is_live(&self, entity: EntityId) -> bool {
        self.live.contains(&entity)
    }

    pub fn phase(&self, entity: EntityId) -> Phase {
        self.phases.get(&entity).copied().unwrap_or_default()
    }

    pub fn set_phase(&mut self, entity: EntityId, phase: Phase) {
        if phase == Phase::Idle {
            self.phases.remove(&entity);
        } else {
            self.phases.insert(entity, phase);
        }
    }

    /// True if any entity has a pending change.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn has_pending(&self, entity: EntityId) -> bool {
        self.pending.contains_key(&entity)
    }

    /// A tick has been requested and not yet run.
    pub fn tick_requested(&self) -> bool {
        self.tick_requested
    }

    pub(crate) fn clear_tick_request(&mut self) {
        self.tick_requested = false;
    }

    // -------------------------------------------------------------------------
    // Queueing
    // -------------------------------------------------------------------------

    /// Queue a shallow state merge.
    ///
    /// Returns `true` if the change was queued for a later update, `false` if
    /// it was folded into the running update or dropped.
    pub fn push_state(
        &mut self,
        entity: EntityId,
        delta: State,
        callback: Option<Callback>,
    ) -> Result<bool> {
        if !self.is_live(entity) {
            warn!(%entity, "state change for unmounted entity ignored");
            return Ok(false);
        }
        match self.phase(entity) {
            Phase::Rendering => Err(ReconcileError::StateChangeDuringRender(entity)),
            Phase::BeforeUpdate => {
                let late = self.late.entry(entity).or_default();
                late.merge_state(delta);
                late.callbacks.extend(callback);
                trace!(%entity, "state change joined running update");
                Ok(false)
            }
            Phase::Idle => {
                let pending = self.pending.entry(entity).or_default();
                pending.merge_state(delta);
                pending.callbacks.extend(callback);
                self.tick_requested = true;
                trace!(%entity, "state change queued");
                Ok(true)
            }
        }
    }

    /// Queue a wholesale props replacement. Discards any earlier delta.
    pub fn push_props_replacement(
        &mut self,
        entity: EntityId,
        props: Props,
        callback: Option<Callback>,
    ) -> bool {
        if !self.is_live(entity) {
            warn!(%entity, "props replacement for unmounted entity ignored");
            return false;
        }
        let pending = self.pending.entry(entity).or_default();
        pending.props_replacement = Some(props);
        pending.props_delta = None;
        pending.callbacks.extend(callback);
        self.tick_requested = true;
        true
    }

    /// Queue a shallow props merge on top of whatever is already pending.
    pub fn push_props_delta(
        &mut self,
        entity: EntityId,
        delta: Props,
        callback: Option<Callback>,
    ) -> bool {
        if !self.is_live(entity) {
            warn!(%entity, "props change for unmounted entity ignored");
            return false;
        }
        let pending = self.pending.entry(entity).or_default();
        match &mut pending.props_delta {
            Some(existing) => existing.extend(delta),
            None => pending.props_delta = Some(delta),
        }
        pending.callbacks.extend(callback);
        self.tick_requested = true;
        true
    }

    /// Take the pending change of an entity, if any.
    pub fn take_pending(&mut self, entity: EntityId) -> Option<PendingChange> {
        self.pending.remove(&entity)
    }

    /// Take changes made during `before_update`.
    pub fn take_late(&mut self, entity: EntityId) -> Option<PendingChange> {
        self.late.remove(&entity)
    }
}

impl fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("live", &self.live.len())
            .field("pending", &self.pending)
            .field("phases", &self.phases)
            .field("tick_requested", &self.tick_requested)
            .finish()
    }
}

// =============================================================================
// Updater
// =============================================================================

/// Handle through which a component changes its own state.
///
/// Cheap to clone. Once the entity unmounts every call becomes a no-op.
#[derive(Clone)]
pub struct Updater {
    entity: EntityId,
    queue: Rc<RefCell<UpdateQueue>>,
}

impl Updater {
    pub(crate) fn new(entity: EntityId, queue: Rc<RefCell<UpdateQueue>>) -> Self {
        Self { entity, queue }
    }

    /// The entity this updater is bound to.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// True while the entity is mounted.
    pub fn is_live(&self) -> bool {
        self.queue.borrow().is_live(self.entity)
    }

    /// Shallow-merge `delta` into the entity's state.
    ///
    /// Fails with [`ReconcileError::StateChangeDuringRender`] when called from
    /// `render`.
    pub fn set_state(&self, delta: State) -> Result<()> {
        self.push(delta, None)
    }

    /// Like [`set_state`](Self::set_state), running `callback` once the
    /// change has been applied.
    pub fn set_state_with<F>(&self, delta: State, callback: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        self.push(delta, Some(Box::new(callback)))
    }

    fn push(&self, delta: State, callback: Option<Callback>) -> Result<()> {
        let (queued, hook) = {
            let mut queue = self.queue.borrow_mut();
            let queued = queue.push_state(self.entity, delta, callback)?;
            (queued, queue.schedule_hook())
        };
        if queued {
            if let Some(hook) = hook {
                hook();
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater").field("entity", &self.entity).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
