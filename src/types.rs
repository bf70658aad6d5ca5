//! Core types for spark-dom.
//!
//! These types define the foundation that everything builds on.
//! They flow from component render output through the differ and into the
//! native document.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

// =============================================================================
// Props & State
// =============================================================================

/// Component properties. Shallow-merged or replaced between renders.
pub type Props = Map<String, Value>;

/// Component state. Always shallow-merged.
pub type State = Map<String, Value>;

/// Shallow-merge `delta` into a copy of `base`. Keys in `delta` win.
pub fn merge(base: &Map<String, Value>, delta: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in delta {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Convert a JSON value into an object map.
///
/// Non-object values yield an empty map, so `object(json!(null))` is a valid
/// "no props" argument.
///
/// ```
/// use serde_json::json;
/// let props = spark_dom::object(json!({ "text": "one" }));
/// assert_eq!(props["text"], "one");
/// ```
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// Value of an element attribute in the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    /// `true` renders as a present, empty attribute. `false` means absent.
    Bool(bool),
}

impl AttrValue {
    /// The string the native element should carry, or `None` if the
    /// attribute must not be present at all.
    pub fn to_native(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Bool(true) => Some(String::new()),
            Self::Bool(false) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Str(value.to_string())
    }
}

// =============================================================================
// Entity Identity
// =============================================================================

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a live entity.
///
/// Ids come from a global counter and are never handed out twice, so a stale
/// [`Updater`](crate::Updater) can never address a different entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate the next id.
    pub(crate) fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Base 32, the way entity ids have always been printed.
        let mut n = self.0;
        let mut digits = Vec::new();
        loop {
            let d = (n % 32) as u32;
            digits.push(char::from_digit(d, 32).unwrap_or('0'));
            n /= 32;
            if n == 0 {
                break;
            }
        }
        let s: String = digits.into_iter().rev().collect();
        f.write_str(&s)
    }
}

// =============================================================================
// Tests
// =============================================================================
