//! Reconciliation scenarios: diffing, batching, props and state semantics.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{json, Value};
use spark_dom::{
    component, element, mount, object, Component, Patch, Props, ReconcileError, RenderOptions,
    State, Updater, VirtualNode,
};

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static RENDER_ERRORS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn log(entry: impl Into<String>) {
    LOG.with(|l| l.borrow_mut().push(entry.into()));
}

fn take_log() -> Vec<String> {
    LOG.with(|l| std::mem::take(&mut *l.borrow_mut()))
}

fn str_of<'a>(map: &'a Props, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or_default()
}

// =============================================================================
// Components
// =============================================================================

#[derive(Default)]
struct Label;

impl Component for Label {
    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        let text = format!("{}{}", str_of(props, "a"), str_of(props, "b"));
        Some(element("span").child(text).into())
    }
}

/// div with attributes taken from `props.attrs`.
#[derive(Default)]
struct Attrs;

impl Component for Attrs {
    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        let mut el = element("div");
        if let Some(attrs) = props.get("attrs").and_then(Value::as_object) {
            for (name, value) in attrs {
                el = match value {
                    Value::Bool(flag) => el.attr(name, *flag),
                    Value::String(s) => el.attr(name, s),
                    other => el.attr(name, other.to_string()),
                };
            }
        }
        Some(el.into())
    }
}

/// div > p > span > text
#[derive(Default)]
struct Deep;

impl Component for Deep {
    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        Some(
            element("div")
                .attr("class", "outer")
                .child(element("p").child(element("span").child(str_of(props, "text"))))
                .into(),
        )
    }
}

#[derive(Default)]
struct List;

impl Component for List {
    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        let el = element("div").child(element("span").attr("id", "foo"));
        let el = match props.get("i").and_then(Value::as_i64) {
            Some(1) => el
                .child(element("span").attr("id", "bar"))
                .child(element("span").attr("id", "baz")),
            _ => el,
        };
        Some(el.into())
    }
}

#[derive(Default)]
struct Counter;

impl Component for Counter {
    fn initial_state(&self) -> State {
        object(json!({ "count": 0 }))
    }

    fn render(&self, state: &State, _props: &Props) -> Option<VirtualNode> {
        log("render");
        Some(element("b").child(state["count"].to_string()).into())
    }

    fn before_update(
        &mut self,
        _updater: &Updater,
        _state: &State,
        _props: &Props,
        _next_state: &State,
        _next_props: &Props,
    ) {
        log("before_update");
    }

    fn after_update(
        &mut self,
        _updater: &Updater,
        _state: &State,
        _props: &Props,
        prev_state: &State,
        _prev_props: &Props,
    ) {
        log(format!("after_update from {}", prev_state["count"]));
    }
}

/// Stamps `seen` from `before_update`.
#[derive(Default)]
struct Stamper;

impl Component for Stamper {
    fn render(&self, state: &State, _props: &Props) -> Option<VirtualNode> {
        let seen = state.get("seen").cloned().unwrap_or(Value::Null);
        Some(element("i").child(seen.to_string()).into())
    }

    fn before_update(
        &mut self,
        updater: &Updater,
        _state: &State,
        _props: &Props,
        next_state: &State,
        _next_props: &Props,
    ) {
        let count = next_state.get("count").cloned().unwrap_or(Value::Null);
        updater
            .set_state(object(json!({ "seen": count })))
            .expect("before_update may set state");
    }
}

/// Tries to set state from inside `render`.
#[derive(Default)]
struct Rogue {
    updater: Option<Updater>,
}

impl Component for Rogue {
    fn before_mount(&mut self, updater: &Updater, _state: &State, _props: &Props) {
        self.updater = Some(updater.clone());
    }

    fn render(&self, _state: &State, _props: &Props) -> Option<VirtualNode> {
        if let Some(updater) = &self.updater {
            if let Err(err) = updater.set_state(object(json!({ "x": 1 }))) {
                RENDER_ERRORS.with(|e| e.borrow_mut().push(format!("{err:?}")));
            }
        }
        Some(element("div").into())
    }
}

#[derive(Default)]
struct Empty;

impl Component for Empty {
    fn render(&self, _state: &State, _props: &Props) -> Option<VirtualNode> {
        None
    }
}

/// Never re-renders itself, but renders a Counter child.
#[derive(Default)]
struct Frozen;

impl Component for Frozen {
    fn should_update(&self, _: &State, _: &Props, _: &State, _: &Props) -> bool {
        false
    }

    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        Some(
            element("section")
                .attr("title", str_of(props, "title"))
                .child(component::<Counter>(Props::new()))
                .into(),
        )
    }
}

#[derive(Default)]
struct Form;

impl Component for Form {
    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        Some(
            element("form")
                .child(
                    element("input")
                        .attr("type", "text")
                        .attr("value", str_of(props, "value"))
                        .attr("disabled", props.get("disabled").and_then(Value::as_bool).unwrap_or(false)),
                )
                .child(element("div").attr("innerHTML", str_of(props, "html")))
                .into(),
        )
    }
}

/// div > [span#first, "mid" or em("mid"), span#last]
#[derive(Default)]
struct Mixed;

impl Component for Mixed {
    fn render(&self, _state: &State, props: &Props) -> Option<VirtualNode> {
        let middle: VirtualNode = if props.get("em").and_then(Value::as_bool).unwrap_or(false) {
            element("em").child("mid").into()
        } else {
            "mid".into()
        };
        Some(
            element("div")
                .child(element("span").attr("id", "first"))
                .child(middle)
                .child(element("span").attr("id", "last"))
                .into(),
        )
    }
}

fn attribute_map(handle: &spark_dom::MountHandle, node: spark_dom::NativeId) -> BTreeMap<String, String> {
    handle.document().attributes(node).iter().cloned().collect()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_mount_renders_into_container() {
    let handle = mount::<Label>(object(json!({ "a": "one" })), RenderOptions::default()).unwrap();
    assert_eq!(handle.html(), "<span>one</span>");
    let root = handle.root_entity().unwrap();
    let native = handle.entity_native_root(root).unwrap();
    assert_eq!(handle.document().parent(native), Some(handle.container()));
}

#[test]
fn test_noop_update_mutates_nothing_but_calls_back() {
    let handle = mount::<Label>(object(json!({ "a": "one" })), RenderOptions::default()).unwrap();
    handle.take_patches();

    let done = Rc::new(Cell::new(false));
    let done_clone = Rc::clone(&done);
    handle
        .set_props_with(object(json!({ "a": "one" })), move || done_clone.set(true))
        .unwrap();
    assert!(!done.get());

    assert!(handle.tick().unwrap());
    assert!(done.get());
    assert!(handle.take_patches().is_empty());
}

#[test]
fn test_attributes_match_next_render_exactly() {
    let handle = mount::<Attrs>(
        object(json!({ "attrs": { "a": "1", "b": "2", "flag": true, "off": false } })),
        RenderOptions::default(),
    )
    .unwrap();
    let div = handle.entity_native_root(handle.root_entity().unwrap()).unwrap();
    assert_eq!(
        attribute_map(&handle, div),
        BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("flag".to_string(), String::new()),
        ])
    );

    handle
        .replace_props(object(json!({ "attrs": { "b": "3", "c": "4", "flag": false, "off": true } })))
        .unwrap();
    handle.tick().unwrap();
    assert_eq!(
        attribute_map(&handle, div),
        BTreeMap::from([
            ("b".to_string(), "3".to_string()),
            ("c".to_string(), "4".to_string()),
            ("off".to_string(), String::new()),
        ])
    );
}

#[test]
fn test_leaf_text_change_only_sets_text() {
    let handle = mount::<Deep>(object(json!({ "text": "a" })), RenderOptions::default()).unwrap();
    handle.take_patches();

    handle.set_props(object(json!({ "text": "b" }))).unwrap();
    handle.tick().unwrap();

    let patches = handle.take_patches();
    assert_eq!(patches.len(), 1);
    assert!(matches!(&patches[0], Patch::SetText { text, .. } if text == "b"));
    assert_eq!(handle.html(), "<div class=\"outer\"><p><span>b</span></p></div>");
}

#[test]
fn test_trailing_children_removed_and_first_kept() {
    let handle = mount::<List>(object(json!({ "i": 1 })), RenderOptions::default()).unwrap();
    let foo = handle.document().find_by_attribute("id", "foo").unwrap();
    handle.take_patches();

    handle.set_props(object(json!({ "i": 2 }))).unwrap();
    handle.tick().unwrap();

    let doc = handle.document();
    assert_eq!(doc.find_by_attribute("id", "foo"), Some(foo));
    assert!(doc.is_attached(foo));
    assert_eq!(doc.find_by_attribute("id", "bar"), None);
    assert_eq!(doc.find_by_attribute("id", "baz"), None);
    drop(doc);

    let patches = handle.take_patches();
    assert!(patches.iter().all(|p| !p.targets().contains(&foo)));
    assert_eq!(patches.iter().filter(|p| matches!(p, Patch::RemoveChild { .. })).count(), 2);
    assert_eq!(handle.html(), "<div><span id=\"foo\"></span></div>");
}

#[test]
fn test_growing_list_appends() {
    let handle = mount::<List>(object(json!({ "i": 2 })), RenderOptions::default()).unwrap();
    handle.take_patches();

    handle.set_props(object(json!({ "i": 1 }))).unwrap();
    handle.tick().unwrap();

    let inserts: Vec<usize> = handle
        .take_patches()
        .iter()
        .filter_map(|p| match p {
            Patch::InsertChild { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(inserts, vec![1, 2]);
    assert_eq!(
        handle.html(),
        "<div><span id=\"foo\"></span><span id=\"bar\"></span><span id=\"baz\"></span></div>"
    );
}

#[test]
fn test_state_changes_coalesce_into_one_update() {
    take_log();
    let handle = mount::<Counter>(Props::new(), RenderOptions::default()).unwrap();
    let root = handle.root_entity().unwrap();
    let updater = handle.updater(root).unwrap();
    assert_eq!(take_log(), vec!["render"]);

    updater.set_state(object(json!({ "count": 1, "a": true }))).unwrap();
    updater.set_state(object(json!({ "count": 2 }))).unwrap();
    assert!(take_log().is_empty());

    handle.tick().unwrap();
    assert_eq!(take_log(), vec!["before_update", "render", "after_update from 0"]);
    assert_eq!(
        Value::Object(handle.entity_state(root).unwrap()),
        json!({ "count": 2, "a": true })
    );
    assert_eq!(handle.html(), "<b>2</b>");
    assert!(!handle.needs_tick());
}

#[test]
fn test_state_set_in_before_update_joins_update() {
    let handle = mount::<Stamper>(Props::new(), RenderOptions::default()).unwrap();
    let root = handle.root_entity().unwrap();
    handle
        .updater(root)
        .unwrap()
        .set_state(object(json!({ "count": 7 })))
        .unwrap();

    handle.tick().unwrap();
    assert_eq!(handle.entity_state(root).unwrap()["seen"], 7);
    assert_eq!(handle.html(), "<i>7</i>");
    assert!(!handle.needs_tick());
}

#[test]
fn test_state_set_during_render_fails() {
    RENDER_ERRORS.with(|e| e.borrow_mut().clear());
    let handle = mount::<Rogue>(Props::new(), RenderOptions::default()).unwrap();
    let errors = RENDER_ERRORS.with(|e| e.borrow().clone());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("StateChangeDuringRender"));
    assert!(!handle.needs_tick());
}

#[test]
fn test_empty_render_uses_placeholder() {
    let handle = mount::<Empty>(Props::new(), RenderOptions::default()).unwrap();
    assert_eq!(handle.html(), "<noscript></noscript>");
}

#[test]
fn test_dirty_child_updates_under_frozen_parent() {
    take_log();
    let handle = mount::<Frozen>(object(json!({ "title": "t" })), RenderOptions::default()).unwrap();
    let root = handle.root_entity().unwrap();
    let (_, child) = handle.entity_children(root)[0].clone();

    handle.set_props(object(json!({ "title": "ignored" }))).unwrap();
    handle
        .updater(child)
        .unwrap()
        .set_state(object(json!({ "count": 5 })))
        .unwrap();
    take_log();
    handle.tick().unwrap();

    // Parent skipped its render but still committed the new props.
    assert_eq!(handle.entity_props(root).unwrap()["title"], "ignored");
    assert_eq!(handle.html(), "<section title=\"t\"><b>5</b></section>");
    assert_eq!(take_log(), vec!["before_update", "render", "after_update from 0"]);
}

#[test]
fn test_set_props_merges_and_replace_props_replaces() {
    let handle =
        mount::<Label>(object(json!({ "a": "x", "b": "y" })), RenderOptions::default()).unwrap();

    handle.set_props(object(json!({ "b": "z" }))).unwrap();
    handle.tick().unwrap();
    assert_eq!(handle.html(), "<span>xz</span>");

    handle.replace_props(object(json!({ "a": "q" }))).unwrap();
    handle.tick().unwrap();
    assert_eq!(handle.html(), "<span>q</span>");

    // Replacement then merge compose in call order.
    handle.replace_props(object(json!({ "a": "1" }))).unwrap();
    handle.set_props(object(json!({ "b": "2" }))).unwrap();
    handle.tick().unwrap();
    assert_eq!(handle.html(), "<span>12</span>");
}

#[test]
fn test_value_and_inner_html_are_properties() {
    let handle = mount::<Form>(
        object(json!({ "value": "Bob", "html": "<b>hi</b>" })),
        RenderOptions::default(),
    )
    .unwrap();
    let input = handle.document().find_by_tag("input")[0];
    {
        let doc = handle.document();
        assert_eq!(doc.value(input), Some("Bob"));
        assert_eq!(doc.attribute(input, "value"), None);
        assert_eq!(doc.attribute(input, "type"), Some("text"));
    }
    assert_eq!(
        handle.html(),
        "<form><input type=\"text\"><div><b>hi</b></div></form>"
    );

    handle
        .set_props(object(json!({ "value": "Alice", "disabled": true })))
        .unwrap();
    handle.tick().unwrap();
    let doc = handle.document();
    assert_eq!(doc.value(input), Some("Alice"));
    assert_eq!(doc.attribute(input, "disabled"), Some(""));
}

#[test]
fn test_callbacks_fire_once_per_applied_change() {
    let handle = mount::<Counter>(Props::new(), RenderOptions::default()).unwrap();
    let updater = handle.updater(handle.root_entity().unwrap()).unwrap();
    let calls = Rc::new(Cell::new(0));

    for n in 1..=2 {
        let calls = Rc::clone(&calls);
        updater
            .set_state_with(object(json!({ "count": n })), move || calls.set(calls.get() + 1))
            .unwrap();
    }
    handle.tick().unwrap();
    assert_eq!(calls.get(), 2);

    assert!(!handle.tick().unwrap());
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_immediate_mode_flushes_synchronously() {
    let handle = mount::<Label>(
        object(json!({ "a": "one" })),
        RenderOptions::default().immediate(true),
    )
    .unwrap();

    handle.set_props(object(json!({ "a": "two" }))).unwrap();
    assert_eq!(handle.html(), "<span>two</span>");
    assert!(!handle.needs_tick());
}

#[test]
fn test_immediate_mode_flushes_updater_changes() {
    take_log();
    let handle = mount::<Counter>(Props::new(), RenderOptions::default().immediate(true)).unwrap();
    let updater = handle.updater(handle.root_entity().unwrap()).unwrap();

    updater.set_state(object(json!({ "count": 3 }))).unwrap();
    assert_eq!(handle.html(), "<b>3</b>");
}

#[test]
fn test_props_after_remove_fail() {
    let handle = mount::<Label>(Props::new(), RenderOptions::default()).unwrap();
    handle.remove();
    assert!(matches!(
        handle.set_props(object(json!({ "a": "x" }))),
        Err(ReconcileError::RootRemoved)
    ));
}

#[test]
fn test_kind_change_in_the_middle_keeps_sibling_order() {
    let handle = mount::<Mixed>(Props::new(), RenderOptions::default()).unwrap();
    let (div, first, last) = {
        let doc = handle.document();
        let first = doc.find_by_attribute("id", "first").unwrap();
        let last = doc.find_by_attribute("id", "last").unwrap();
        (doc.parent(first).unwrap(), first, last)
    };
    handle.take_patches();

    handle.set_props(object(json!({ "em": true }))).unwrap();
    handle.tick().unwrap();
    assert_eq!(
        handle.html(),
        "<div><span id=\"first\"></span><em>mid</em><span id=\"last\"></span></div>"
    );
    let structural: Vec<(bool, usize)> = handle
        .take_patches()
        .iter()
        .filter_map(|p| match p {
            Patch::RemoveChild { parent, index, .. } if *parent == div => Some((false, *index)),
            Patch::InsertChild { parent, index, .. } if *parent == div => Some((true, *index)),
            _ => None,
        })
        .collect();
    assert_eq!(structural, vec![(false, 1), (true, 1)]);

    handle.set_props(object(json!({ "em": false }))).unwrap();
    handle.tick().unwrap();
    assert_eq!(
        handle.html(),
        "<div><span id=\"first\"></span>mid<span id=\"last\"></span></div>"
    );
    let doc = handle.document();
    let children = doc.children(div);
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], first);
    assert_eq!(children[2], last);
    assert_eq!(doc.text(children[1]), Some("mid"));
}
