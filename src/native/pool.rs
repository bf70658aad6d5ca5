//! Element pool - Recycled native elements keyed by tag.
//!
//! Removed element subtrees are broken up and their elements parked here so
//! later creations of the same tag can skip allocation. Text nodes are never
//! pooled. Elements are stripped of attributes, properties and children when
//! handed back out.

use std::collections::HashMap;

use tracing::trace;

use super::{Document, NativeId};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ElementPool {
    free: HashMap<String, Vec<NativeId>>,
    limit: usize,
}

impl ElementPool {
    /// A pool holding at most `limit` elements per tag.
    pub fn new(limit: usize) -> Self {
        Self {
            free: HashMap::new(),
            limit,
        }
    }

    /// Number of parked elements for `tag`.
    pub fn available(&self, tag: &str) -> usize {
        self.free.get(tag).map_or(0, Vec::len)
    }

    /// Total parked elements.
    pub fn len(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create an element, reusing a parked one of the same tag if possible.
    pub fn acquire(&mut self, doc: &mut Document, tag: &str) -> Result<NativeId> {
        if let Some(id) = self.free.get_mut(tag).and_then(Vec::pop) {
            doc.reset_element(id)?;
            trace!(?id, tag, "reused pooled element");
            return Ok(id);
        }
        Ok(doc.create_element(tag))
    }

    /// Break up a detached subtree and park its elements.
    ///
    /// The caller must have detached `node` already. Elements beyond the
    /// per-tag limit and all text nodes are released.
    pub fn recycle(&mut self, doc: &mut Document, node: NativeId) {
        // Leaves first, so every node is childless when parked.
        for id in doc.descendants(node).into_iter().rev() {
            doc.detach_silently(id);
            let Some(tag) = doc.tag(id).map(str::to_string) else {
                doc.release(id);
                continue;
            };
            let slot = self.free.entry(tag).or_default();
            if slot.len() < self.limit && !slot.contains(&id) {
                doc.clear_owner(id);
                slot.push(id);
            } else {
                doc.release(id);
            }
        }
    }

    /// Release every parked element.
    pub fn clear(&mut self, doc: &mut Document) {
        for (_, ids) in self.free.drain() {
            for id in ids {
                doc.release(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NodeOwner;
    use crate::types::EntityId;
    use crate::vdom::Path;

    fn setup() -> (Document, ElementPool, NativeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let body = doc.create_element("body");
        doc.append_child(root, body).unwrap();
        (doc, ElementPool::new(2), body)
    }

    #[test]
    fn test_recycle_parks_elements_and_drops_text() {
        let (mut doc, mut pool, body) = setup();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        let label = doc.create_text("label");
        doc.append_child(body, div).unwrap();
        doc.append_child(div, span).unwrap();
        doc.append_child(span, label).unwrap();

        doc.detach(div);
        pool.recycle(&mut doc, div);

        assert_eq!(pool.available("div"), 1);
        assert_eq!(pool.available("span"), 1);
        assert!(doc.node(label).is_none());
        assert!(doc.children(span).is_empty());
        assert!(doc.parent(span).is_none());
    }

    #[test]
    fn test_parked_elements_lose_their_owner() {
        let (mut doc, mut pool, body) = setup();
        let button = doc.create_element("button");
        let owner = NodeOwner {
            entity: EntityId::next(),
            path: Path::root(),
        };
        doc.set_owner(button, owner.clone()).unwrap();
        doc.append_child(body, button).unwrap();
        assert_eq!(doc.owner(button), Some(&owner));

        doc.detach(button);
        pool.recycle(&mut doc, button);
        assert_eq!(pool.available("button"), 1);
        assert_eq!(doc.owner(button), None);
    }

    #[test]
    fn test_acquire_strips_reused_element() {
        let (mut doc, mut pool, body) = setup();
        let input = doc.create_element("input");
        doc.set_attribute(input, "type", "text").unwrap();
        doc.set_attribute(input, "value", "old").unwrap();
        doc.append_child(body, input).unwrap();
        doc.detach(input);
        pool.recycle(&mut doc, input);

        let reused = pool.acquire(&mut doc, "input").unwrap();
        assert_eq!(reused, input);
        assert!(doc.attributes(reused).is_empty());
        assert_eq!(doc.value(reused), None);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_limit_per_tag() {
        let (mut doc, mut pool, _) = setup();
        let ul = doc.create_element("ul");
        for _ in 0..4 {
            let li = doc.create_element("li");
            doc.append_child(ul, li).unwrap();
        }
        pool.recycle(&mut doc, ul);
        assert_eq!(pool.available("li"), 2);
        assert_eq!(pool.available("ul"), 1);

        pool.clear(&mut doc);
        assert!(pool.is_empty());
        assert!(doc.node(ul).is_none());
    }

    #[test]
    fn test_acquire_without_pooled_creates() {
        let (mut doc, mut pool, _) = setup();
        doc.take_patches();
        let p = pool.acquire(&mut doc, "p").unwrap();
        assert_eq!(doc.tag(p), Some("p"));
        assert_eq!(doc.patches().len(), 1);
    }
}
