//! Event Delegation - One listener per render root.
//!
//! Handlers are never attached to native elements. Each render keeps a table
//! keyed by `[entity][path][event type]`, and an event raised on a native
//! node is resolved by walking up from the target through ancestors owned by
//! the same entity until a handler is found.
//!
//! Only the event types in [`DELEGATED_EVENTS`] are listened for.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, trace};

use crate::native::{Document, NativeId, NativeNode};
use crate::types::EntityId;
use crate::vdom::{EventHandler, Path, Tree, VirtualNode};

/// Event types the root listens for.
pub const DELEGATED_EVENTS: &[&str] = &[
    "blur",
    "change",
    "click",
    "contextmenu",
    "copy",
    "cut",
    "dblclick",
    "drag",
    "dragend",
    "dragenter",
    "dragexit",
    "dragleave",
    "dragover",
    "dragstart",
    "drop",
    "focus",
    "input",
    "keydown",
    "keyup",
    "mousedown",
    "mousemove",
    "mouseout",
    "mouseover",
    "mouseup",
    "paste",
    "scroll",
    "submit",
    "touchcancel",
    "touchend",
    "touchmove",
    "touchstart",
    "wheel",
];

pub fn is_delegated(event_type: &str) -> bool {
    DELEGATED_EVENTS.contains(&event_type)
}

// =============================================================================
// Event
// =============================================================================

/// A native event raised on a node of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    /// Node the event was raised on.
    pub target: NativeId,
    /// Node whose handler is running. Set during dispatch.
    pub delegate_target: Option<NativeId>,
    /// Host-supplied payload (key codes, input text, ...).
    pub detail: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: NativeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            delegate_target: None,
            detail: Value::Null,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

// =============================================================================
// Handler Table
// =============================================================================

type PathHandlers = HashMap<Path, HashMap<String, EventHandler>>;

/// Delegated handlers of one render root.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<EntityId, PathHandlers>,
    listening: bool,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, entity: EntityId, path: Path, event_type: &str, handler: EventHandler) {
        self.handlers
            .entry(entity)
            .or_default()
            .entry(path)
            .or_default()
            .insert(event_type.to_string(), handler);
    }

    /// Drop every handler of an entity.
    pub fn unbind(&mut self, entity: EntityId) {
        self.handlers.remove(&entity);
    }

    /// Replace an entity's handlers with those bound in `tree`.
    pub fn rebind(&mut self, entity: EntityId, tree: &Tree) {
        self.unbind(entity);
        let mut count = 0;
        tree.walk(|path, node| {
            if let VirtualNode::Element(el) = node {
                for (event_type, handler) in &el.events {
                    if !is_delegated(event_type) {
                        debug!(%entity, %path, event = %event_type, "handler for non-delegated event never fires");
                    }
                    self.bind(entity, path.clone(), event_type, handler.clone());
                    count += 1;
                }
            }
        });
        if count > 0 {
            trace!(%entity, count, "handlers bound");
        }
    }

    pub fn lookup(&self, entity: EntityId, path: &Path, event_type: &str) -> Option<EventHandler> {
        self.handlers.get(&entity)?.get(path)?.get(event_type).cloned()
    }

    /// Number of bound handlers of an entity.
    pub fn count(&self, entity: EntityId) -> usize {
        self.handlers
            .get(&entity)
            .map_or(0, |paths| paths.values().map(HashMap::len).sum())
    }

    /// Start listening.
    pub fn resume(&mut self) {
        self.listening = true;
    }

    /// Stop listening. Bound handlers are kept.
    pub fn pause(&mut self) {
        self.listening = false;
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Stop listening and drop everything.
    pub fn clear(&mut self) {
        self.handlers.clear();
        self.pause();
    }

    /// Find the handler an event resolves to.
    ///
    /// Starts at the target (its parent for text nodes) and walks up while
    /// the ancestors belong to the target's entity. Returns the owning
    /// entity, the node whose handler matched and the handler.
    pub fn resolve(
        &self,
        doc: &Document,
        event: &Event,
    ) -> Option<(EntityId, NativeId, EventHandler)> {
        if !self.listening || !is_delegated(&event.event_type) {
            return None;
        }
        let mut current = match doc.node(event.target)? {
            NativeNode::Text(_) => doc.parent(event.target)?,
            _ => event.target,
        };
        let entity = doc.owner(current)?.entity;
        while let Some(owner) = doc.owner(current).filter(|owner| owner.entity == entity) {
            if let Some(handler) = self.lookup(entity, &owner.path, &event.event_type) {
                return Some((entity, current, handler));
            }
            current = doc.parent(current)?;
        }
        None
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("entities", &self.handlers.len())
            .field("listening", &self.listening)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Updater;
    use crate::native::NodeOwner;
    use crate::types::{Props, State};
    use crate::vdom::element;
    use std::rc::Rc;

    fn handler() -> EventHandler {
        Rc::new(|_: &Event, _: &State, _: &Props, _: &Updater| {})
    }

    /// div(0) > span(0.0) > "x", all owned by one entity.
    fn setup() -> (Document, HandlerTable, EntityId, NativeId, NativeId, NativeId) {
        let mut doc = Document::new();
        let entity = EntityId::next();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        let text = doc.create_text("x");
        doc.append_child(doc.root(), div).unwrap();
        doc.append_child(div, span).unwrap();
        doc.append_child(span, text).unwrap();
        doc.set_owner(div, NodeOwner { entity, path: Path::root() }).unwrap();
        doc.set_owner(span, NodeOwner { entity, path: Path::root().child(0) }).unwrap();
        let mut table = HandlerTable::new();
        table.resume();
        (doc, table, entity, div, span, text)
    }

    #[test]
    fn test_resolve_walks_up_to_handler() {
        let (doc, mut table, entity, div, _, text) = setup();
        table.bind(entity, Path::root(), "click", handler());

        let (owner, node, _) = table.resolve(&doc, &Event::new("click", text)).unwrap();
        assert_eq!(owner, entity);
        assert_eq!(node, div);
    }

    #[test]
    fn test_resolve_stops_at_entity_boundary() {
        let (mut doc, mut table, entity, div, span, _) = setup();
        let other = EntityId::next();
        doc.set_owner(span, NodeOwner { entity: other, path: Path::root() }).unwrap();
        table.bind(entity, Path::root(), "click", handler());

        assert!(table.resolve(&doc, &Event::new("click", span)).is_none());
        assert!(table.resolve(&doc, &Event::new("click", div)).is_some());
    }

    #[test]
    fn test_paused_or_unknown_events_do_not_resolve() {
        let (doc, mut table, entity, div, _, _) = setup();
        table.bind(entity, Path::root(), "click", handler());
        table.bind(entity, Path::root(), "custom", handler());

        assert!(table.resolve(&doc, &Event::new("custom", div)).is_none());
        table.pause();
        assert!(table.resolve(&doc, &Event::new("click", div)).is_none());
    }

    #[test]
    fn test_rebind_replaces_handlers() {
        let mut table = HandlerTable::new();
        let entity = EntityId::next();
        let first = Tree::new(
            element("div")
                .on("click", |_, _, _, _| {})
                .child(element("input").on("input", |_, _, _, _| {}))
                .into(),
        );
        table.rebind(entity, &first);
        assert_eq!(table.count(entity), 2);
        assert!(table.lookup(entity, &Path::root().child(0), "input").is_some());

        let second = Tree::new(element("div").on("click", |_, _, _, _| {}).into());
        table.rebind(entity, &second);
        assert_eq!(table.count(entity), 1);

        table.unbind(entity);
        assert_eq!(table.count(entity), 0);
    }
}
